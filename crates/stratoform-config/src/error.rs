use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file not found: {name} (searched in {dir})")]
    ConfigNotFound { name: String, dir: PathBuf },

    #[error("stack settings file not found: {0}")]
    StackSettingsNotFound(PathBuf),

    #[error("missing required setting: {0}")]
    MissingSetting(String),

    #[error("setting {key} has an unexpected shape: {message}")]
    InvalidSetting { key: String, message: String },

    #[error("failed to read {path}: {message}")]
    IoError { path: PathBuf, message: String },

    #[error("invalid YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
