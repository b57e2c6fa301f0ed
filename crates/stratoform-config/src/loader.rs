//! Template configuration loader

use crate::error::{ConfigError, Result};
use crate::model::Config;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Extensions tried, in order, for an extension-less config name
const CONFIG_EXTENSIONS: [&str; 2] = ["yaml", "yml"];

/// Find the template file named by `name` under `base_dir`
///
/// An extension-less name is looked up as:
/// 1. `<name>.yaml`
/// 2. `<name>.yml`
/// 3. `<name>` (YAML content without an extension)
///
/// A name that already carries an extension is used as-is.
pub fn find_config_file(base_dir: &Path, name: &str) -> Result<PathBuf> {
    let direct = base_dir.join(name);
    let has_extension = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| CONFIG_EXTENSIONS.contains(&e));

    if has_extension {
        if direct.is_file() {
            return Ok(direct);
        }
    } else {
        for ext in CONFIG_EXTENSIONS {
            let candidate = base_dir.join(format!("{}.{}", name, ext));
            if candidate.is_file() {
                return Ok(candidate);
            }
        }
        if direct.is_file() {
            return Ok(direct);
        }
    }

    Err(ConfigError::ConfigNotFound {
        name: name.to_string(),
        dir: base_dir.to_path_buf(),
    })
}

/// Load and parse a template configuration
#[instrument(skip(base_dir), fields(base_dir = %base_dir.display()))]
pub fn load_config(base_dir: &Path, name: &str) -> Result<Config> {
    let path = find_config_file(base_dir, name)?;
    debug!(file = %path.display(), "Reading template config");
    let config = parse_config_file(&path)?;
    info!(
        cloud = %config.cloud,
        instructions = config.template.instructions.len(),
        "Template config loaded"
    );
    Ok(config)
}

/// Parse a template configuration from an exact path
pub fn parse_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    parse_config_str(&content, path)
}

/// Parse a template configuration from a string; `origin` is used for errors
pub fn parse_config_str(content: &str, origin: &Path) -> Result<Config> {
    // An empty document is a valid, empty config
    if content.trim().is_empty() {
        return Ok(Config::default());
    }
    serde_yaml::from_str(content).map_err(|source| ConfigError::Yaml {
        path: origin.to_path_buf(),
        source,
    })
}
