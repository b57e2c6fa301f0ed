//! Pulumi YAML program rendering
//!
//! A rendered program is the hand-off point to the engine:
//!
//! ```yaml
//! name: data-pipeline
//! runtime: yaml
//! config:
//!   config:userpass:
//!     type: String
//!     secret: true
//! variables:
//!   project-lookup:
//!     fn::invoke:
//!       function: gcp:organizations:getProject
//!       arguments: {}
//! resources:
//!   test-bucket:
//!     type: aws:s3:Bucket
//!     properties:
//!       bucket: test-bucket
//!     options:
//!       dependsOn:
//!         - ${some-role}
//! outputs:
//!   lambda_function_url: ${fn-url.functionUrl}
//! ```

use crate::error::Result;
use crate::output::Output;
use crate::stack::Stack;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};
use tokio::fs;

/// File name the engine expects for a project
pub const PROGRAM_FILE: &str = "Pulumi.yaml";

/// One entry of the program's `resources` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub token: String,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub properties: serde_json::Map<String, serde_json::Value>,
    #[serde(default, rename = "dependsOn", skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

/// A stack rendered as a Pulumi YAML program
#[derive(Debug, Clone)]
pub struct Program {
    document: Mapping,
    resources: Vec<ResourceEntry>,
}

impl Program {
    /// Render `stack`; resources keep their registration order
    pub fn from_stack(stack: &Stack) -> Result<Self> {
        let mut document = Mapping::new();
        document.insert("name".into(), stack.project().into());
        document.insert("runtime".into(), "yaml".into());

        if !stack.config_decls().is_empty() {
            let mut config = Mapping::new();
            for decl in stack.config_decls() {
                let mut entry = Mapping::new();
                entry.insert("type".into(), "String".into());
                if decl.secret {
                    entry.insert("secret".into(), true.into());
                }
                config.insert(decl.key.as_str().into(), Value::Mapping(entry));
            }
            document.insert("config".into(), Value::Mapping(config));
        }

        if !stack.invokes().is_empty() {
            let mut variables = Mapping::new();
            for invoke in stack.invokes() {
                let mut call = Mapping::new();
                call.insert("function".into(), invoke.function.as_str().into());
                call.insert("arguments".into(), serde_yaml::to_value(&invoke.arguments)?);

                let mut variable = Mapping::new();
                variable.insert("fn::invoke".into(), Value::Mapping(call));
                variables.insert(invoke.name.as_str().into(), Value::Mapping(variable));
            }
            document.insert("variables".into(), Value::Mapping(variables));
        }

        let entries: Vec<ResourceEntry> = stack
            .resources()
            .iter()
            .map(|resource| ResourceEntry {
                name: resource.name.clone(),
                token: resource.token.clone(),
                properties: resource.properties.as_map().clone(),
                depends_on: resource.depends_on.clone(),
            })
            .collect();

        let mut resources = Mapping::new();
        for resource in &entries {
            let mut entry = Mapping::new();
            entry.insert("type".into(), resource.token.as_str().into());
            if !resource.properties.is_empty() {
                entry.insert("properties".into(), serde_yaml::to_value(&resource.properties)?);
            }
            if !resource.depends_on.is_empty() {
                let deps: Vec<Value> = resource
                    .depends_on
                    .iter()
                    .map(|dep| serde_yaml::to_value(Output::reference(dep, None)))
                    .collect::<std::result::Result<_, _>>()?;
                let mut options = Mapping::new();
                options.insert("dependsOn".into(), Value::Sequence(deps));
                entry.insert("options".into(), Value::Mapping(options));
            }
            resources.insert(resource.name.as_str().into(), Value::Mapping(entry));
        }
        document.insert("resources".into(), Value::Mapping(resources));

        if !stack.outputs().is_empty() {
            let mut outputs = Mapping::new();
            for (name, value) in stack.outputs() {
                outputs.insert(name.as_str().into(), serde_yaml::to_value(value)?);
            }
            document.insert("outputs".into(), Value::Mapping(outputs));
        }

        tracing::debug!(
            resources = stack.resources().len(),
            variables = stack.invokes().len(),
            outputs = stack.outputs().len(),
            "Rendered program"
        );

        Ok(Self {
            document,
            resources: entries,
        })
    }

    pub fn document(&self) -> &Mapping {
        &self.document
    }

    /// Resource entries in registration order
    pub fn resources(&self) -> &[ResourceEntry] {
        &self.resources
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.document)?)
    }

    /// Write `Pulumi.yaml` into `dir`, creating it if needed
    pub async fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir).await?;
        let path = dir.join(PROGRAM_FILE);
        fs::write(&path, self.to_yaml()?).await?;
        tracing::info!(path = %path.display(), "Program written");
        Ok(path)
    }
}
