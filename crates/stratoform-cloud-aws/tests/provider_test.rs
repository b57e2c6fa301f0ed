//! AWS provider registration tests

use serde_json::json;
use stratoform_cloud::{CloudError, CloudProvider, Instruction, Program, Stack};
use stratoform_cloud_aws::{AwsProvider, RoleKind};
use stratoform_config::{Config, StackSettings};

const ASSUME_POLICY: &str = r#"
{
    "Version": "2012-10-17",
    "Statement": [
        {
            "Sid": "",
            "Effect": "Allow",
            "Principal": {
                "Service": ["apigateway.amazonaws.com", "firehose.amazonaws.com"]
            },
            "Action": "sts:AssumeRole"
        }
    ]
}
"#;

const PROJECT_ROOT: &str = "/work/game";

const PIPELINE: &str = r#"
cloud: aws
template:
  name: data-pipeline
  instructions: [configureIAM, createStorage, createStream, createFunction, createApiGateway]
iam:
  roles:
    - name: api_gateway_kinesis_proxy
      assume_policy: "{}"
    - name: kinesis_firehose_delivery
      assume_policy: "{}"
      inline_policy: '{"Statement": []}'
    - name: lambda_firehose_writer
      assume_policy: "{}"
    - name: audit_role
storage:
  name: test-bucket
  force_destroy: true
stream:
  name: events
  destination: s3
  s3Config:
    buffering_size: 64
    buffering_interval: 60
    partition_enabled: true
    s3_prefix: "game_name=!{partitionKeyFromQuery:game_name}/"
function:
  name: producer
  auth: NONE
  build:
    runtime: go1.x
    handler: main
    source:
      zip: ./functions/aws/producer
      output_path: ./dist/producer.zip
api_gateway:
  name: events-api
  stage: dev
  deployment_id: 2
  routes:
    - name: event
      integrations:
        - name: put-record
          type: AWS
          http_method: POST
          uri: arn:aws:apigateway:eu-central-1:firehose:action/PutRecord
          method:
            name: post-event
            type: POST
            auth: NONE
            response:
              status_code: "200"
              response_params:
                - key: method.response.header.Access-Control-Allow-Origin
                  val: true
          req_template:
            - key: application/json
              val: '{"DeliveryStreamName": "events"}'
"#;

fn provider(yaml: &str) -> AwsProvider {
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    let settings = StackSettings::from_values("demo", "test", [("config:path", "config")])
        .with_secret("config:userpass");
    AwsProvider::new(settings, config, PROJECT_ROOT)
}

fn run(provider: &mut AwsProvider, stack: &mut Stack, instructions: &[Instruction]) {
    for instruction in instructions {
        provider.run(*instruction, stack).unwrap();
    }
}

#[test]
fn test_create_storage() {
    let mut provider = provider("storage:\n  name: test-bucket\n");
    let mut stack = Stack::new("demo", "test");

    provider.create_storage(&mut stack).unwrap();

    let bucket = stack.resource("test-bucket").unwrap();
    assert_eq!(bucket.token, "aws:s3:Bucket");
    assert_eq!(bucket.properties.get("bucket"), Some(&json!("test-bucket")));
    assert_eq!(bucket.properties.get("forceDestroy"), Some(&json!(false)));
    assert_eq!(provider.bucket().unwrap().name(), "test-bucket");
}

#[test]
fn test_create_storage_with_dotted_name() {
    let mut provider = provider("storage:\n  name: logs.example.com\n");
    let mut stack = Stack::new("demo", "test");

    provider.create_storage(&mut stack).unwrap();

    let bucket = stack.resource("logs-example-com").unwrap();
    assert_eq!(bucket.properties.get("bucket"), Some(&json!("logs.example.com")));
    assert_eq!(
        provider.bucket().unwrap().attr("arn").as_value(),
        &json!("${logs-example-com.arn}")
    );
}

#[test]
fn test_configure_iam_keeps_policy_literal() {
    let config = Config {
        iam: stratoform_config::Iam {
            roles: vec![stratoform_config::Role {
                name: "api_gateway_kinesis_proxy_policy_pulumi-s3-lambda".to_string(),
                assume_policy: ASSUME_POLICY.to_string(),
                ..Default::default()
            }],
            ..Default::default()
        },
        ..Default::default()
    };
    let mut provider = AwsProvider::new(
        StackSettings::from_values("demo", "test", [("a", "b")]),
        config,
        PROJECT_ROOT,
    );
    let mut stack = Stack::new("demo", "test");

    provider.configure_iam(&mut stack).unwrap();

    let role = stack
        .resource("api_gateway_kinesis_proxy_policy_pulumi-s3-lambda")
        .unwrap();
    assert_eq!(role.properties.get("assumeRolePolicy"), Some(&json!(ASSUME_POLICY)));
    assert_eq!(
        provider.role(RoleKind::ApiGateway).unwrap().name(),
        "api_gateway_kinesis_proxy_policy_pulumi-s3-lambda"
    );
}

#[test]
fn test_role_classification() {
    let mut provider = provider(PIPELINE);
    let mut stack = Stack::new("demo", "test");

    provider.configure_iam(&mut stack).unwrap();

    assert_eq!(
        provider.role(RoleKind::ApiGateway).unwrap().name(),
        "api_gateway_kinesis_proxy"
    );
    assert_eq!(
        provider.role(RoleKind::Firehose).unwrap().name(),
        "kinesis_firehose_delivery"
    );
    assert_eq!(
        provider.role(RoleKind::LambdaFirehose).unwrap().name(),
        "lambda_firehose_writer"
    );
    assert!(provider.role(RoleKind::Redshift).is_none());
    // Unclassified roles are still created
    assert!(stack.resource("audit_role").is_some());
    assert_eq!(
        stack
            .resource("kinesis_firehose_delivery")
            .unwrap()
            .properties
            .pointer("inlinePolicies/0/name"),
        Some(&json!("kinesis_firehose_delivery-inline-role"))
    );
}

#[test]
fn test_configure_iam_aggregates_failures() {
    let yaml = r#"
iam:
  roles:
    - name: kinesis_firehose_a
    - name: bad name
    - name: kinesis_firehose_a
    - name: redshift_service_role
"#;
    let mut provider = provider(yaml);
    let mut stack = Stack::new("demo", "test");

    let err = provider.configure_iam(&mut stack).unwrap_err();
    match err {
        CloudError::Partial(failures) => {
            assert_eq!(failures.len(), 2);
            let items: Vec<&str> = failures.iter().map(|f| f.item.as_str()).collect();
            assert_eq!(items, vec!["bad name", "kinesis_firehose_a"]);
        }
        other => panic!("expected partial failure, got {:?}", other),
    }
    // The loop continued past the failures
    assert!(provider.role(RoleKind::Redshift).is_some());
    assert_eq!(stack.resources().len(), 2);
}

#[test]
fn test_partitioned_s3_stream() {
    let mut provider = provider(PIPELINE);
    let mut stack = Stack::new("demo", "test");
    run(
        &mut provider,
        &mut stack,
        &[Instruction::ConfigureIam, Instruction::CreateStorage, Instruction::CreateStream],
    );

    let stream = stack.resource("events").unwrap();
    assert_eq!(stream.depends_on, vec!["test-bucket".to_string()]);
    assert_eq!(stream.properties.get("destination"), Some(&json!("extended_s3")));

    let conf = |path: &str| stream.properties.pointer(&format!("extendedS3Configuration/{}", path));
    assert_eq!(conf("roleArn"), Some(&json!("${kinesis_firehose_delivery.arn}")));
    assert_eq!(conf("bucketArn"), Some(&json!("${test-bucket.arn}")));
    assert_eq!(conf("bufferingSize"), Some(&json!(64)));
    assert_eq!(conf("cloudwatchLoggingOptions/logStreamName"), Some(&json!("events-stream")));
    assert_eq!(
        conf("errorOutputPrefix"),
        Some(&json!(
            "errors/year=!{timestamp:yyyy}/month=!{timestamp:MM}/day=!{timestamp:dd}/hour=!{timestamp:HH}/!{firehose:error-output-type}/"
        ))
    );
    assert_eq!(conf("dynamicPartitioningConfiguration/enabled"), Some(&json!(true)));

    let processors = conf("processingConfiguration/processors").unwrap();
    assert_eq!(
        processors,
        &json!([
            {
                "type": "RecordDeAggregation",
                "parameters": [{"parameterName": "SubRecordType", "parameterValue": "JSON"}]
            },
            {"type": "AppendDelimiterToRecord"},
            {
                "type": "MetadataExtraction",
                "parameters": [
                    {"parameterName": "JsonParsingEngine", "parameterValue": "JQ-1.6"},
                    {"parameterName": "MetadataExtractionQuery", "parameterValue": "{game_name:.game_name}"}
                ]
            }
        ])
    );
}

#[test]
fn test_unpartitioned_stream_has_no_processors() {
    let yaml = PIPELINE.replace("partition_enabled: true", "partition_enabled: false");
    let mut provider = provider(&yaml);
    let mut stack = Stack::new("demo", "test");
    run(
        &mut provider,
        &mut stack,
        &[Instruction::ConfigureIam, Instruction::CreateStorage, Instruction::CreateStream],
    );

    let stream = stack.resource("events").unwrap();
    assert!(stream.properties.pointer("extendedS3Configuration/processingConfiguration").is_none());
    assert!(stream.properties.pointer("extendedS3Configuration/prefix").is_none());
}

#[test]
fn test_stream_before_storage_is_missing_dependency() {
    let mut provider = provider(PIPELINE);
    let mut stack = Stack::new("demo", "test");
    provider.configure_iam(&mut stack).unwrap();

    let err = provider.create_stream(&mut stack).unwrap_err();
    assert!(matches!(
        err,
        CloudError::MissingDependency { instruction: Instruction::CreateStream, ref requires }
            if requires.contains("createStorage")
    ));
    assert!(stack.resource("events").is_none());
}

#[test]
fn test_unknown_stream_destination() {
    let yaml = PIPELINE.replace("destination: s3", "destination: elasticsearch");
    let mut provider = provider(&yaml);
    let mut stack = Stack::new("demo", "test");

    let err = provider.create_stream(&mut stack).unwrap_err();
    assert!(matches!(err, CloudError::InvalidConfig(msg) if msg.contains("elasticsearch")));
}

#[test]
fn test_redshift_pipeline() {
    let yaml = r#"
iam:
  roles:
    - name: kinesis_firehose_role
    - name: redshift_service_role
storage:
  name: staging
dwh:
  redshift:
    identifier: events-cluster
    db_name: events
    master_user: admin
    master_pass: Secret123
    node_type: dc2.large
    number_of_nodes: 1
    cluster_type: single-node
    skip_snapshot: true
    sql: CREATE TABLE events (game_name varchar(64));
stream:
  name: to-redshift
  destination: redshift
  redshift_conf:
    username: admin
    password: Secret123
    data_table_name: events
    copy_options: json 'auto'
"#;
    let mut provider = provider(yaml);
    let mut stack = Stack::new("demo", "test");
    run(
        &mut provider,
        &mut stack,
        &[
            Instruction::ConfigureIam,
            Instruction::CreateStorage,
            Instruction::CreateDwh,
            Instruction::CreateStream,
        ],
    );

    let cluster = stack.resource("events-cluster").unwrap();
    assert_eq!(cluster.properties.get("iamRoles"), Some(&json!(["${redshift_service_role.arn}"])));
    assert_eq!(cluster.properties.get("numberOfNodes"), Some(&json!(1)));

    let statement = stack.resource("statement").unwrap();
    assert_eq!(statement.depends_on, vec!["events-cluster".to_string()]);

    let stream = stack.resource("to-redshift").unwrap();
    assert_eq!(stream.properties.get("destination"), Some(&json!("redshift")));
    assert_eq!(
        stream.properties.pointer("redshiftConfiguration/clusterJdbcurl"),
        Some(&json!("jdbc:redshift://${events-cluster.endpoint}/${events-cluster.databaseName}"))
    );
    assert_eq!(
        stream.properties.pointer("redshiftConfiguration/s3Configuration/bufferingSize"),
        Some(&json!(10))
    );
    assert_eq!(
        stream
            .properties
            .pointer("redshiftConfiguration/cloudwatchLoggingOptions/logGroupName"),
        Some(&json!("to-redshift-kinesis-loggroup"))
    );
}

#[test]
fn test_dwh_without_redshift_role() {
    let mut provider = provider("dwh:\n  redshift:\n    identifier: c1\n");
    let mut stack = Stack::new("demo", "test");

    let err = provider.create_dwh(&mut stack).unwrap_err();
    assert!(matches!(err, CloudError::MissingDependency { instruction: Instruction::CreateDwh, .. }));
}

#[test]
fn test_full_pipeline_with_function_and_gateway() {
    let mut provider = provider(PIPELINE);
    let mut stack = Stack::new("demo", "test");
    run(
        &mut provider,
        &mut stack,
        &[
            Instruction::ConfigureIam,
            Instruction::CreateStorage,
            Instruction::CreateStream,
            Instruction::CreateFunction,
            Instruction::CreateApiGateway,
        ],
    );

    let function = stack.resource("producer").unwrap();
    assert_eq!(
        function.properties.pointer("environment/variables/firehose_name"),
        Some(&json!("${events.name}"))
    );
    assert_eq!(
        function.properties.get("code"),
        Some(&json!({"fn::fileArchive": "/work/game/dist/producer.zip"}))
    );
    // The engine runs from the program directory, so build paths are anchored
    // to the project root
    let archive = stack.invokes().iter().find(|i| i.name == "producer-archive").unwrap();
    assert_eq!(
        archive.arguments.get("sourceDir"),
        Some(&json!("/work/game/functions/aws/producer"))
    );
    assert_eq!(
        archive.arguments.get("outputPath"),
        Some(&json!("/work/game/dist/producer.zip"))
    );
    assert_eq!(
        function.properties.get("sourceCodeHash"),
        Some(&json!("${producer-archive.outputBase64sha256}"))
    );
    let url = stack.resource("producer-url").unwrap();
    assert_eq!(url.properties.pointer("cors/allowOrigins"), Some(&json!(["*"])));
    assert_eq!(url.properties.pointer("cors/allowCredentials"), Some(&json!(true)));
    assert!(stack.output("lambda_function_url").is_some());

    let integration = stack.resource("put-record").unwrap();
    assert_eq!(integration.depends_on, vec!["events".to_string()]);
    assert_eq!(
        integration.properties.get("credentials"),
        Some(&json!("${api_gateway_kinesis_proxy.arn}"))
    );
    assert_eq!(
        integration.properties.get("requestTemplates"),
        Some(&json!({"application/json": "{\"DeliveryStreamName\": \"events\"}"}))
    );
    assert!(stack.resource("response_post-event").is_some());
    assert!(stack.resource("integration_post-event_response").is_some());
    assert!(provider.authorizer().is_none());

    let deployment = stack.resource("deploymentResource2").unwrap();
    assert_eq!(deployment.properties.get("stageName"), Some(&json!("dev")));
    assert!(deployment.depends_on.contains(&"put-record".to_string()));
    assert!(deployment.depends_on.contains(&"events-api".to_string()));
    assert_eq!(
        stack.output("apiGatewayUrl").unwrap().as_value(),
        &json!("${deploymentResource2.invokeUrl}")
    );
}

#[test]
fn test_gateway_aggregates_integration_failures() {
    let yaml = PIPELINE.replace(
        "auth: NONE\n            response",
        "auth: COGNITO_USER_POOLS\n            response",
    );
    let mut provider = provider(&yaml);
    let mut stack = Stack::new("demo", "test");
    run(
        &mut provider,
        &mut stack,
        &[Instruction::ConfigureIam, Instruction::CreateStorage, Instruction::CreateStream],
    );

    let err = provider.create_api_gateway(&mut stack).unwrap_err();
    match err {
        CloudError::Partial(failures) => {
            assert_eq!(failures.len(), 1);
            let failure = failures.iter().next().unwrap();
            assert_eq!(failure.item, "event/put-record");
            assert!(matches!(failure.error, CloudError::MissingDependency { .. }));
        }
        other => panic!("expected partial failure, got {:?}", other),
    }
    // The stage deployment is still registered for what succeeded
    assert!(stack.resource("deploymentResource2").is_some());
}

#[test]
fn test_identity_management() {
    let yaml = r#"
authorizer:
  name: cognito-authorizer
  type: COGNITO_USER_POOLS
  user_pool:
    name: players
    user:
      username: tester
      email: tester@example.com
    user_domain:
      name: players-login
    user_client:
      name: players-app
      allowed_scopes: [openid, email]
      allowed_flows: [code]
      ex_auth_flows: [ALLOW_USER_PASSWORD_AUTH]
      callback_urls: [https://example.com/callback]
api_gateway:
  name: players-api
  stage: dev
"#;
    let mut provider = provider(yaml);
    let mut stack = Stack::new("demo", "test");
    provider.create_identity_management(&mut stack).unwrap();

    let user = stack.resource("user").unwrap();
    assert_eq!(user.properties.get("password"), Some(&json!("${config:userpass}")));
    assert_eq!(stack.config_decls()[0].key, "config:userpass");
    assert!(stack.config_decls()[0].secret);

    // The program declares the secret under the key the stack settings use
    let program = Program::from_stack(&stack).unwrap();
    let config = &program.document()["config"];
    assert_eq!(config["config:userpass"]["secret"], serde_yaml::Value::from(true));
    assert!(config.get("userpass").is_none());

    let client = stack.resource("players-app").unwrap();
    assert_eq!(client.properties.get("generateSecret"), Some(&json!(true)));
    assert_eq!(client.properties.get("explicitAuthFlows"), Some(&json!(["ALLOW_USER_PASSWORD_AUTH"])));

    let managed = stack.resource("managed").unwrap();
    assert_eq!(managed.properties.get("supportedIdentityProviders"), Some(&json!(["COGNITO"])));
    assert_eq!(managed.properties.get("namePattern"), Some(&json!("players-app")));

    assert_eq!(
        stack.output("CognitoUserPoolClientId").unwrap().as_value(),
        &json!("${players-app.id}")
    );
    assert_eq!(
        stack.output("CognitoUserPoolDomain").unwrap().as_value(),
        &json!("${players-login.domain}")
    );

    // A gateway built afterwards gets an authorizer on the pool
    provider.create_api_gateway(&mut stack).unwrap();
    let authorizer = stack.resource("cognito-authorizer").unwrap();
    assert_eq!(authorizer.properties.get("providerArns"), Some(&json!(["${players.arn}"])));
}

#[test]
fn test_identity_management_omits_empty_client_lists() {
    let yaml = r#"
authorizer:
  user_pool:
    name: players
    user:
      username: tester
    user_domain:
      name: players-login
    user_client:
      name: players-app
      ex_auth_flows: [ALLOW_USER_PASSWORD_AUTH]
"#;
    let mut provider = provider(yaml);
    let mut stack = Stack::new("demo", "test");
    provider.create_identity_management(&mut stack).unwrap();

    for name in ["players-app", "managed"] {
        let client = stack.resource(name).unwrap();
        assert!(client.properties.get("allowedOauthScopes").is_none());
        assert!(client.properties.get("allowedOauthFlows").is_none());
        assert!(client.properties.get("callbackUrls").is_none());
        assert_eq!(
            client.properties.get("explicitAuthFlows"),
            Some(&json!(["ALLOW_USER_PASSWORD_AUTH"]))
        );
    }
    let user = stack.resource("user").unwrap();
    assert!(user.properties.get("attributes").is_none());
}

#[test]
fn test_identity_management_requires_secret() {
    let config: Config = serde_yaml::from_str("authorizer:\n  user_pool:\n    name: players\n").unwrap();
    let settings = StackSettings::from_values("demo", "test", [("config:path", "config")]);
    let mut provider = AwsProvider::new(settings, config, PROJECT_ROOT);
    let mut stack = Stack::new("demo", "test");

    let err = provider.create_identity_management(&mut stack).unwrap_err();
    assert!(matches!(err, CloudError::MissingSetting(msg) if msg.contains("config:userpass")));
    assert!(stack.resources().is_empty());
}

#[test]
fn test_vpc_is_a_no_op() {
    let mut provider = provider(PIPELINE);
    let mut stack = Stack::new("demo", "test");
    assert!(provider.supports(Instruction::CreateVpc));
    provider.create_vpc(&mut stack).unwrap();
    assert!(stack.is_empty());
}
