//! REST API Gateway with routes, integrations and a stage deployment

use crate::iam::RoleKind;
use crate::provider::{AwsProvider, require};
use stratoform_cloud::{
    Failures, Instruction, Output, Properties, ResourceOptions, ResourceRef, Result, Stack,
    logical_name,
};
use stratoform_config::{Integration, KeyValue};

const REST_API: &str = "aws:apigateway:RestApi";
const AUTHORIZER: &str = "aws:apigateway:Authorizer";
const RESOURCE: &str = "aws:apigateway:Resource";
const METHOD: &str = "aws:apigateway:Method";
const METHOD_RESPONSE: &str = "aws:apigateway:MethodResponse";
const INTEGRATION: &str = "aws:apigateway:Integration";
const INTEGRATION_RESPONSE: &str = "aws:apigateway:IntegrationResponse";
const DEPLOYMENT: &str = "aws:apigateway:Deployment";

const COGNITO_AUTH: &str = "COGNITO_USER_POOLS";
const FIREHOSE_ACTION: &str = "firehose:action";

fn key_values(pairs: &[KeyValue]) -> Properties {
    pairs.iter().map(|kv| (&kv.key, &kv.val)).collect()
}

impl AwsProvider {
    pub(crate) fn register_rest_api(&mut self, stack: &mut Stack) -> Result<()> {
        let gateway = &self.config.api_gateway;

        let rest_api = stack.register(
            REST_API,
            &logical_name(&gateway.name),
            Properties::new().with("name", &gateway.name),
            ResourceOptions::new(),
        )?;
        self.rest_api = Some(rest_api.clone());

        if let Some(user_pool) = self.user_pool.clone() {
            let authorizer = &self.config.authorizer;
            let handle = stack.register(
                AUTHORIZER,
                &logical_name(&authorizer.name),
                Properties::new()
                    .with("restApi", rest_api.id())
                    .with("name", &authorizer.name)
                    .with("providerArns", Output::list([user_pool.attr("arn")]))
                    .with("type", &authorizer.kind),
                ResourceOptions::depends_on([&rest_api, &user_pool]),
            )?;
            self.authorizer = Some(handle);
        }

        let mut failures = Failures::new();
        let mut deployment_deps = vec![rest_api.clone()];

        for route in &gateway.routes {
            let resource = stack.register(
                RESOURCE,
                &logical_name(&route.name),
                Properties::new()
                    .with("restApi", rest_api.id())
                    .with("parentId", rest_api.attr("rootResourceId"))
                    .with("pathPart", &route.name),
                ResourceOptions::depends_on([&rest_api]),
            );
            let Some(resource) = failures.capture(&route.name, resource) else {
                continue;
            };

            for integration in &route.integrations {
                let item = format!("{}/{}", route.name, integration.name);
                let registered =
                    self.register_integration(stack, &rest_api, &resource, integration);
                if let Some(handles) = failures.capture(item, registered) {
                    deployment_deps.extend(handles);
                }
            }
        }

        let deployment = stack.register(
            DEPLOYMENT,
            &format!("deploymentResource{}", gateway.deployment_id),
            Properties::new()
                .with("restApi", rest_api.id())
                .with("stageName", &gateway.stage),
            ResourceOptions::depends_on(&deployment_deps),
        )?;
        stack.export("apiGatewayUrl", deployment.attr("invokeUrl"));

        tracing::info!(
            api = %gateway.name,
            routes = gateway.routes.len(),
            failed = failures.len(),
            "API Gateway registered"
        );
        failures.into_result()
    }

    /// Method, method response, integration and integration response of one
    /// integration; returns the handles the deployment waits for
    fn register_integration(
        &self,
        stack: &mut Stack,
        rest_api: &ResourceRef,
        resource: &ResourceRef,
        integration: &Integration,
    ) -> Result<Vec<ResourceRef>> {
        let instruction = Instruction::CreateApiGateway;
        let method_conf = &integration.method;

        let mut method_props = Properties::new()
            .with("restApi", rest_api.id())
            .with("resourceId", resource.id())
            .with("httpMethod", &method_conf.kind)
            .with("authorization", &method_conf.auth);
        let mut method_deps = vec![rest_api.clone(), resource.clone()];
        if method_conf.auth == COGNITO_AUTH {
            let authorizer = require(
                &self.authorizer,
                instruction,
                "a Cognito user pool (createIdentityManagement)",
            )?;
            method_props.set("authorizerId", authorizer.id());
            method_deps.push(authorizer);
        }
        let method = stack.register(
            METHOD,
            &logical_name(&method_conf.name),
            method_props,
            ResourceOptions::depends_on(&method_deps),
        )?;

        let response_params: Properties = method_conf
            .response
            .response_params
            .iter()
            .map(|kf| (&kf.key, kf.val))
            .collect();
        let method_response = stack.register(
            METHOD_RESPONSE,
            &logical_name(&format!("response_{}", method_conf.name)),
            Properties::new()
                .with("restApi", rest_api.id())
                .with("resourceId", resource.id())
                .with("httpMethod", method.attr("httpMethod"))
                .with("statusCode", &method_conf.response.status_code)
                .with_opt(
                    "responseParameters",
                    (!response_params.is_empty()).then_some(response_params),
                ),
            ResourceOptions::depends_on([rest_api, resource]),
        )?;

        let mut integration_props = Properties::new()
            .with("restApi", rest_api.id())
            .with("resourceId", resource.id())
            .with("httpMethod", method.attr("httpMethod"))
            .with("type", &integration.kind)
            .with("integrationHttpMethod", &integration.http_method)
            .with("uri", &integration.uri);
        if let Some(role) = self.roles.get(&RoleKind::ApiGateway) {
            integration_props.set("credentials", role.attr("arn"));
        }
        if !integration.req_params.is_empty() {
            integration_props.set("requestParameters", key_values(&integration.req_params));
        }
        if !integration.req_template.is_empty() {
            integration_props.set("requestTemplates", key_values(&integration.req_template));
        }

        let mut integration_deps = Vec::new();
        if integration.uri.contains(FIREHOSE_ACTION) {
            integration_deps.push(require(
                &self.stream,
                instruction,
                "a Firehose delivery stream (createStream)",
            )?);
        }
        let integration_handle = stack.register(
            INTEGRATION,
            &logical_name(&integration.name),
            integration_props,
            ResourceOptions::depends_on(&integration_deps),
        )?;

        let mut response_props = Properties::new()
            .with("restApi", rest_api.id())
            .with("resourceId", resource.id())
            .with("httpMethod", method_response.attr("httpMethod"))
            .with("statusCode", method_response.attr("statusCode"));
        if !integration.res_template.is_empty() {
            response_props.set("responseTemplates", key_values(&integration.res_template));
        }
        if !integration.res_params.is_empty() {
            response_props.set("responseParameters", key_values(&integration.res_params));
        }
        let integration_response = stack.register(
            INTEGRATION_RESPONSE,
            &logical_name(&format!("integration_{}_response", method_conf.name)),
            response_props,
            ResourceOptions::depends_on([&integration_handle]),
        )?;

        tracing::debug!(
            integration = %integration.name,
            method = %method_conf.kind,
            "API Gateway integration registered"
        );
        Ok(vec![method, integration_handle, integration_response])
    }
}
