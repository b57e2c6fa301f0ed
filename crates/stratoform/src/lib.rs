//! Stratoform
//!
//! Reads a template YAML, selects the AWS or GCP provider it names and runs
//! its instruction list to build the resource graph handed to the engine.
//!
//! ```ignore
//! use stratoform::{BuildOptions, Project};
//!
//! let project = Project::load(project_dir, "dev")?;
//! let (stack, report) = project.build(BuildOptions::default())?;
//! report.into_result()?;
//! ```

pub mod dispatcher;
pub mod error;
pub mod project;
pub mod provider;

pub use dispatcher::{BuildOptions, BuildReport, Dispatcher, InstructionFailure};
pub use error::{Error, Result};
pub use project::Project;
pub use provider::ActiveProvider;
