//! Stack settings (`Pulumi.<stack>.yaml`)
//!
//! The orchestration engine keeps per-stack settings in its own file. The
//! template only needs a handful of namespaced keys from it:
//!
//! - `config:path`: template config name, relative to the project directory
//! - `config:userpass`: secret password for the provisioned identity-pool user
//! - `gcp:project`, `gcp:region`: GCP placement

use crate::error::{ConfigError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Key holding the template config path
pub const CONFIG_PATH_KEY: &str = "config:path";

const PROJECT_FILE: &str = "Pulumi.yaml";
const DEFAULT_PROJECT_NAME: &str = "stratoform";

#[derive(Debug, Default, Deserialize)]
struct StackFile {
    #[serde(default)]
    config: BTreeMap<String, serde_yaml::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct ProjectFile {
    #[serde(default)]
    name: Option<String>,
}

/// Settings of one stack
#[derive(Debug, Clone)]
pub struct StackSettings {
    project: String,
    stack: String,
    path: PathBuf,
    values: BTreeMap<String, serde_yaml::Value>,
}

impl StackSettings {
    /// Stack settings file name for `stack`
    pub fn file_name(stack: &str) -> String {
        format!("Pulumi.{}.yaml", stack)
    }

    /// Load `Pulumi.<stack>.yaml` from `project_dir`
    pub fn load(project_dir: &Path, stack: &str) -> Result<Self> {
        let path = project_dir.join(Self::file_name(stack));
        if !path.is_file() {
            return Err(ConfigError::StackSettingsNotFound(path));
        }

        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
            path: path.clone(),
            message: e.to_string(),
        })?;
        let file: StackFile = if content.trim().is_empty() {
            StackFile::default()
        } else {
            serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
                path: path.clone(),
                source,
            })?
        };

        let project = read_project_name(project_dir)?;
        debug!(
            project = %project,
            stack,
            keys = file.config.len(),
            "Loaded stack settings"
        );

        Ok(Self {
            project,
            stack: stack.to_string(),
            path,
            values: file.config,
        })
    }

    /// Build settings in memory
    pub fn from_values<I, K, V>(project: &str, stack: &str, values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            project: project.to_string(),
            stack: stack.to_string(),
            path: PathBuf::from(Self::file_name(stack)),
            values: values
                .into_iter()
                .map(|(k, v)| (k.into(), serde_yaml::Value::String(v.into())))
                .collect(),
        }
    }

    /// Mark `key` as a secret value (`{secure: ...}`)
    pub fn with_secret(mut self, key: &str) -> Self {
        let mut secure = serde_yaml::Mapping::new();
        secure.insert("secure".into(), "v1:encrypted".into());
        self.values
            .insert(key.to_string(), serde_yaml::Value::Mapping(secure));
        self
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn stack(&self) -> &str {
        &self.stack
    }

    /// Path of the settings file this was loaded from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Plain value of `key`; `None` when absent
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        match self.values.get(key) {
            None | Some(serde_yaml::Value::Null) => Ok(None),
            Some(serde_yaml::Value::String(s)) => Ok(Some(s.clone())),
            Some(serde_yaml::Value::Number(n)) => Ok(Some(n.to_string())),
            Some(serde_yaml::Value::Bool(b)) => Ok(Some(b.to_string())),
            Some(serde_yaml::Value::Mapping(m)) if m.contains_key("secure") => {
                Err(ConfigError::InvalidSetting {
                    key: key.to_string(),
                    message: "value is encrypted and can only be referenced as a secret"
                        .to_string(),
                })
            }
            Some(_) => Err(ConfigError::InvalidSetting {
                key: key.to_string(),
                message: "expected a scalar value".to_string(),
            }),
        }
    }

    /// Plain value of `key`; missing is an error
    pub fn require(&self, key: &str) -> Result<String> {
        self.get(key)?
            .ok_or_else(|| ConfigError::MissingSetting(key.to_string()))
    }

    /// Check that secret `key` is set and return the key, namespace included
    ///
    /// The value itself is never read: the rendered program refers to it by
    /// its full key and the engine decrypts it.
    pub fn require_secret<'a>(&self, key: &'a str) -> Result<&'a str> {
        if !self.values.contains_key(key) {
            return Err(ConfigError::MissingSetting(key.to_string()));
        }
        Ok(key)
    }

    /// Template config path from `config:path`
    pub fn config_path(&self) -> Result<String> {
        self.require(CONFIG_PATH_KEY)
    }
}

fn read_project_name(project_dir: &Path) -> Result<String> {
    let path = project_dir.join(PROJECT_FILE);
    if !path.is_file() {
        return Ok(DEFAULT_PROJECT_NAME.to_string());
    }
    let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
        path: path.clone(),
        message: e.to_string(),
    })?;
    let file: ProjectFile =
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml { path, source })?;
    Ok(file
        .name
        .unwrap_or_else(|| DEFAULT_PROJECT_NAME.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const STACK_FILE: &str = r#"
encryptionsalt: v1:abc
config:
  config:path: configs/aws
  config:userpass:
    secure: AAABAGZpbGxlcg==
  gcp:project: demo-project
  gcp:region: europe-west1
  aws:region: eu-central-1
  config:replicas: 3
"#;

    #[test]
    fn test_load_stack_settings() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("Pulumi.dev.yaml"), STACK_FILE).unwrap();
        fs::write(temp_dir.path().join("Pulumi.yaml"), "name: data-pipeline\nruntime: go\n")
            .unwrap();

        let settings = StackSettings::load(temp_dir.path(), "dev").unwrap();
        assert_eq!(settings.project(), "data-pipeline");
        assert_eq!(settings.stack(), "dev");
        assert_eq!(settings.config_path().unwrap(), "configs/aws");
        assert_eq!(settings.require("gcp:region").unwrap(), "europe-west1");
        assert_eq!(settings.require("config:replicas").unwrap(), "3");
    }

    #[test]
    fn test_secret_values() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("Pulumi.dev.yaml"), STACK_FILE).unwrap();

        let settings = StackSettings::load(temp_dir.path(), "dev").unwrap();
        assert_eq!(settings.project(), "stratoform");
        assert_eq!(settings.require_secret("config:userpass").unwrap(), "config:userpass");
        assert!(matches!(
            settings.require("config:userpass"),
            Err(ConfigError::InvalidSetting { .. })
        ));
        assert!(matches!(
            settings.require_secret("config:missing"),
            Err(ConfigError::MissingSetting(_))
        ));
    }

    #[test]
    fn test_missing_stack_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let result = StackSettings::load(temp_dir.path(), "prod");
        assert!(matches!(result, Err(ConfigError::StackSettingsNotFound(_))));
    }

    #[test]
    fn test_in_memory_settings() {
        let settings = StackSettings::from_values("demo", "test", [("gcp:project", "p1")])
            .with_secret("config:userpass");
        assert_eq!(settings.require("gcp:project").unwrap(), "p1");
        assert!(settings.get("gcp:region").unwrap().is_none());
        assert!(matches!(
            settings.require("gcp:region"),
            Err(ConfigError::MissingSetting(_))
        ));
        assert_eq!(settings.require_secret("config:userpass").unwrap(), "config:userpass");
    }
}
