//! Cloud provider error types

use crate::provider::Instruction;
use thiserror::Error;

/// Cloud provider errors
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    #[error("Provider is declared but not implemented: {0}")]
    ProviderNotImplemented(String),

    #[error("Unknown instruction: {0}")]
    UnknownInstruction(String),

    #[error("{instruction} is not supported on {provider}")]
    Unsupported {
        provider: String,
        instruction: Instruction,
    },

    #[error("{instruction} requires {requires}; run it earlier in the instruction list")]
    MissingDependency {
        instruction: Instruction,
        requires: String,
    },

    #[error("Resource already exists: {0}")]
    ResourceAlreadyExists(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Missing setting: {0}")]
    MissingSetting(String),

    #[error("{} of the requested resources failed:\n{}", .0.len(), .0)]
    Partial(Failures),

    #[error("Command execution failed: {0}")]
    CommandFailed(String),

    #[error("State file error: {0}")]
    StateError(String),

    #[error("Lock acquisition failed: {0}")]
    LockError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, CloudError>;

/// One failed item inside a multi-resource operation
#[derive(Debug)]
pub struct ItemFailure {
    /// Item name (role, route/integration, ...)
    pub item: String,
    pub error: CloudError,
}

/// Failures collected while an operation continued past individual items
#[derive(Debug, Default)]
pub struct Failures(Vec<ItemFailure>);

impl Failures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: impl Into<String>, error: CloudError) {
        self.0.push(ItemFailure {
            item: item.into(),
            error,
        });
    }

    /// Record the error of `result`, if any, and pass the success value through
    pub fn capture<T>(&mut self, item: impl Into<String>, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                let item = item.into();
                tracing::error!(item = %item, error = %error, "Resource registration failed");
                self.push(item, error);
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ItemFailure> {
        self.0.iter()
    }

    /// `Ok(())` when nothing failed, `CloudError::Partial` otherwise
    pub fn into_result(self) -> Result<()> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(CloudError::Partial(self))
        }
    }
}

impl std::fmt::Display for Failures {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, failure) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "  - {}: {}", failure.item, failure.error)?;
        }
        Ok(())
    }
}
