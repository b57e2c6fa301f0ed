//! Typed configuration model
//!
//! Mirrors the template YAML one section per struct. Every field is optional in
//! the document: unknown keys are ignored and missing keys keep their default.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root of a template configuration document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub env: String,
    /// Provider name (`aws`, `gcp`, `azure`)
    pub cloud: String,
    pub template: Template,
    pub iam: Iam,
    pub storage: Storage,
    pub stream: Stream,
    pub dwh: Dwh,
    pub api_gateway: ApiGateway,
    pub function: Function,
    pub authorizer: Authorizer,
    pub idp: Idp,
}

/// Template metadata and the ordered instruction list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Template {
    pub name: String,
    pub instructions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Iam {
    pub service_acc: Option<ServiceAccount>,
    pub roles: Vec<Role>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceAccount {
    pub account_id: String,
    pub display_name: String,
    pub project: String,
    pub location: String,
    pub role: String,
    pub members: Vec<String>,
}

/// A role (AWS) or a member binding (GCP)
///
/// AWS reads `name`, `assume_policy`, `inline_policy` and
/// `force_detach_policies`. GCP reads `name`, `role`, `type` and `member`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Role {
    pub name: String,
    pub role: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub member: String,
    pub force_detach_policies: bool,
    pub assume_policy: String,
    pub inline_policy: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Storage {
    pub name: String,
    pub location: String,
    pub bucket: Bucket,
    pub force_destroy: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bucket {
    pub name: String,
    pub object: BucketObject,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BucketObject {
    pub path: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stream {
    pub name: String,
    /// `s3` / `redshift` on AWS, `cloudstorage` / `bigquery` on GCP
    pub destination: String,
    pub pubsub_conf: PubSubConf,
    #[serde(rename = "s3Config", alias = "s3config", alias = "s3_config")]
    pub s3_conf: S3Conf,
    pub redshift_conf: RedshiftConf,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct S3Conf {
    pub buffering_size: u32,
    pub buffering_interval: u32,
    pub partition_enabled: bool,
    pub s3_prefix: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedshiftConf {
    pub username: String,
    pub password: String,
    pub copy_options: String,
    pub data_table_name: String,
    pub data_table_columns: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PubSubConf {
    pub topic: Topic,
    pub subscription: Subscription,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Topic {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Subscription {
    pub name: String,
    pub cloud_storage_conf: CloudStorageConf,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudStorageConf {
    pub name: String,
    pub duration: String,
    pub file_prefix: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dwh {
    #[serde(rename = "bq")]
    pub big_query: BigQuery,
    pub redshift: Redshift,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BigQuery {
    pub dataset: String,
    pub table_id: String,
    #[serde(rename = "delete_protection")]
    pub deletion_protection: bool,
    pub schema: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Redshift {
    pub identifier: String,
    pub db_name: String,
    pub master_user: String,
    pub master_pass: String,
    pub node_type: String,
    pub number_of_nodes: u32,
    pub cluster_type: String,
    pub skip_snapshot: bool,
    pub sql: String,
    pub public_access: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiGateway {
    pub name: String,
    pub stage: String,
    pub deployment_id: u32,
    pub region: String,
    pub routes: Vec<Route>,
    pub open_api_spec: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Route {
    pub name: String,
    pub integrations: Vec<Integration>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Integration {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub http_method: String,
    pub uri: String,
    pub method: Method,
    pub res_params: Vec<KeyValue>,
    pub req_params: Vec<KeyValue>,
    pub req_template: Vec<KeyValue>,
    pub res_template: Vec<KeyValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Method {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub auth: String,
    pub response: MethodResponse,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MethodResponse {
    pub status_code: String,
    pub response_params: Vec<KeyFlag>,
}

/// A `key`/`val` pair with a string value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyValue {
    pub key: String,
    pub val: String,
}

/// A `key`/`val` pair with a boolean value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyFlag {
    pub key: String,
    pub val: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Function {
    pub name: String,
    pub auth: String,
    pub region: String,
    pub build: Build,
    pub trigger: Option<Trigger>,
    pub service_conf: ServiceConf,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Build {
    pub runtime: String,
    pub handler: String,
    pub entry_point: String,
    pub docker_repo: String,
    pub source: Option<Source>,
    pub envs: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Source {
    pub storage: Storage,
    pub zip: String,
    pub output_path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Trigger {
    pub event_type: String,
    pub region: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConf {
    pub max_instance: u32,
    pub available_mem: String,
    pub timeout: u32,
    pub ingress: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Authorizer {
    pub user_pool: UserPool,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserPool {
    pub name: String,
    pub user: User,
    pub user_client: UserClient,
    pub user_domain: UserDomain,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub email: String,
    pub username: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserClient {
    pub name: String,
    pub allowed_scopes: Vec<String>,
    pub allowed_flows: Vec<String>,
    #[serde(rename = "ex_auth_flows")]
    pub explicit_auth_flows: Vec<String>,
    pub callback_urls: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserDomain {
    pub name: String,
}

/// External identity provider settings (OAuth client used as the gateway audience)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Idp {
    pub enabled: bool,
    pub idp_id: String,
    pub support_email: String,
    pub display_name: String,
    pub client_id: String,
    pub client_secret: String,
}
