//! OpenAPI 2.0 document for API Gateway
//!
//! The gateway fronts the Cloud Function at `/event` and validates Google ID
//! tokens issued for the configured OAuth client.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use stratoform_cloud::{CloudError, Result};
use stratoform_config::Config;

/// Location of the generated document, relative to the working directory
pub const SPEC_PATH: &str = "api/gcp/api.yaml";

/// Security scheme name shared by the definition and the operation
const SECURITY_SCHEME: &str = "google_id_token";

const GOOGLE_ISSUER: &str = "https://accounts.google.com";
const GOOGLE_JWKS_URI: &str = "https://www.googleapis.com/oauth2/v3/certs";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenApiSpec {
    pub swagger: String,
    pub info: Info,
    #[serde(rename = "securityDefinitions")]
    pub security_definitions: BTreeMap<String, SecurityScheme>,
    pub schemes: Vec<String>,
    pub produces: Vec<String>,
    pub paths: Paths,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Info {
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityScheme {
    #[serde(rename = "authorizationUrl")]
    pub authorization_url: String,
    pub flow: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "x-google-issuer")]
    pub issuer: String,
    #[serde(rename = "x-google-jwks_uri")]
    pub jwks_uri: String,
    #[serde(rename = "x-google-audiences")]
    pub audiences: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paths {
    #[serde(rename = "/event")]
    pub event: PathItem,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathItem {
    pub post: Operation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub summary: String,
    #[serde(rename = "operationId")]
    pub operation_id: String,
    #[serde(rename = "x-google-backend")]
    pub backend: Backend,
    pub security: Vec<BTreeMap<String, Vec<String>>>,
    pub responses: BTreeMap<String, Response>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backend {
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub description: String,
}

impl OpenApiSpec {
    /// Build the document for `config`; `project` hosts the function
    pub fn from_config(config: &Config, project: &str) -> Self {
        let gateway = &config.api_gateway;
        let function = &config.function;

        let scheme = SecurityScheme {
            authorization_url: String::new(),
            flow: "implicit".to_string(),
            kind: "oauth2".to_string(),
            issuer: GOOGLE_ISSUER.to_string(),
            jwks_uri: GOOGLE_JWKS_URI.to_string(),
            audiences: config.idp.client_id.clone(),
        };

        let operation = Operation {
            summary: String::new(),
            operation_id: format!("{}-op", gateway.name),
            backend: Backend {
                address: format!(
                    "https://{}-{}.cloudfunctions.net/{}",
                    function.region, project, function.name
                ),
            },
            security: vec![BTreeMap::from([(SECURITY_SCHEME.to_string(), Vec::new())])],
            responses: BTreeMap::from([(
                "200".to_string(),
                Response {
                    description: "OK".to_string(),
                },
            )]),
        };

        Self {
            swagger: "2.0".to_string(),
            info: Info {
                title: gateway.name.clone(),
                description: String::new(),
                version: "1.0.0".to_string(),
            },
            security_definitions: BTreeMap::from([(SECURITY_SCHEME.to_string(), scheme)]),
            schemes: vec!["https".to_string()],
            produces: vec!["application/json".to_string()],
            paths: Paths {
                event: PathItem { post: operation },
            },
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Write the document to `<workdir>/api/gcp/api.yaml`
    ///
    /// Returns the written path and the document bytes.
    pub fn write(&self, workdir: &Path) -> Result<(PathBuf, Vec<u8>)> {
        let path = workdir.join(SPEC_PATH);
        let content = self.to_yaml()?.into_bytes();
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| {
                CloudError::InvalidConfig(format!("cannot create {}: {}", dir.display(), e))
            })?;
        }
        std::fs::write(&path, &content)?;
        tracing::info!(path = %path.display(), "OpenAPI spec written");
        Ok((path, content))
    }
}
