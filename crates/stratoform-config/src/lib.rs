//! Stratoform configuration
//!
//! Typed model of the template YAML, its loader, and the reader for the
//! orchestration engine's stack settings file.
//!
//! ```ignore
//! use stratoform_config::{StackSettings, load_config};
//!
//! let settings = StackSettings::load(project_dir, "dev")?;
//! let config = load_config(project_dir, &settings.config_path()?)?;
//! ```

pub mod error;
pub mod loader;
pub mod model;
pub mod settings;

pub use error::{ConfigError, Result};
pub use loader::{find_config_file, load_config, parse_config_file, parse_config_str};
pub use model::*;
pub use settings::{CONFIG_PATH_KEY, StackSettings};
