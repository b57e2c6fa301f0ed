//! API Gateway in front of the Cloud Function
//!
//! The OpenAPI document is generated and written first; the API, its config
//! and the gateway are only registered once the document exists.

use crate::openapi::{OpenApiSpec, SPEC_PATH};
use crate::provider::GcpProvider;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use stratoform_cloud::{Output, Properties, ResourceOptions, Result, Stack, logical_name};

const API: &str = "gcp:apigateway:Api";
const API_CONFIG: &str = "gcp:apigateway:ApiConfig";
const GATEWAY: &str = "gcp:apigateway:Gateway";

impl GcpProvider {
    pub(crate) fn register_api_gateway(&mut self, stack: &mut Stack) -> Result<()> {
        let gateway = &self.config.api_gateway;

        let backend_project = self
            .config
            .iam
            .service_acc
            .as_ref()
            .map(|sa| sa.project.as_str())
            .filter(|p| !p.is_empty())
            .unwrap_or(&self.project);
        let spec = OpenApiSpec::from_config(&self.config, backend_project);
        let (written, document) = spec.write(&self.workdir)?;
        tracing::debug!(path = %written.display(), bytes = document.len(), "Gateway document ready");

        let api = stack.register(
            API,
            &logical_name(&gateway.name),
            Properties::new().with("apiId", &gateway.name),
            ResourceOptions::depends_on(&self.function),
        )?;

        let document_path = if gateway.open_api_spec.is_empty() {
            SPEC_PATH
        } else {
            gateway.open_api_spec.as_str()
        };
        let config_id = format!("{}-config", gateway.name);
        let api_config = stack.register(
            API_CONFIG,
            &logical_name(&config_id),
            Properties::new()
                .with("api", api.attr("apiId"))
                .with("apiConfigId", &config_id)
                .with(
                    "openapiDocuments",
                    Output::list([Properties::new().with(
                        "document",
                        Properties::new()
                            .with("path", document_path)
                            .with("contents", STANDARD.encode(&document)),
                    )]),
                ),
            ResourceOptions::depends_on([&api]),
        )?;

        let gateway_id = format!("{}-gw", gateway.name);
        let gw = stack.register(
            GATEWAY,
            &logical_name(&gateway_id),
            Properties::new()
                .with("apiConfig", api_config.id())
                .with("gatewayId", &gateway_id)
                .with_non_empty("region", &gateway.region),
            ResourceOptions::depends_on([&api_config]),
        )?;

        stack.export(
            "apiGatewayUrl",
            Output::concat([Output::string("https://"), gw.attr("defaultHostname")]),
        );
        tracing::info!(gateway = %gateway_id, "API Gateway registered");

        self.api = Some(api);
        self.gateway = Some(gw);
        Ok(())
    }
}
