//! pulumi CLI wrapper
//!
//! Runs the engine against a rendered program directory.

use crate::error::{CloudError, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

const DEFAULT_BINARY: &str = "pulumi";

/// pulumi CLI wrapper
pub struct Pulumi {
    binary: String,
    workdir: PathBuf,
    stack: String,
}

impl Pulumi {
    /// `workdir` is the directory holding the rendered `Pulumi.yaml`
    pub fn new(workdir: impl AsRef<Path>, stack: impl Into<String>) -> Self {
        Self {
            binary: DEFAULT_BINARY.to_string(),
            workdir: workdir.as_ref().to_path_buf(),
            stack: stack.into(),
        }
    }

    /// Use another executable in place of `pulumi`
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn stack(&self) -> &str {
        &self.stack
    }

    /// Check that the engine is installed; returns its version
    pub async fn check_installed(&self) -> Result<String> {
        let output = Command::new(&self.binary)
            .arg("version")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                CloudError::CommandFailed(format!("{} is not available: {}", self.binary, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CloudError::CommandFailed(stderr.to_string()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Run a pulumi command in the program directory and return stdout
    async fn run_command(&self, args: &[&str]) -> Result<String> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(args);
        cmd.arg("--stack").arg(&self.stack);
        cmd.arg("--non-interactive");
        cmd.current_dir(&self.workdir);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::debug!(
            "Running: {} {} --stack {} (in {})",
            self.binary,
            args.join(" "),
            self.stack,
            self.workdir.display()
        );

        let output = cmd.output().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CloudError::CommandFailed(format!(
                "{} {}: {}",
                self.binary,
                args.join(" "),
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Select the stack, creating it when it does not exist yet
    pub async fn select_stack(&self) -> Result<()> {
        self.run_command(&["stack", "select", "--create"]).await?;
        Ok(())
    }

    /// Show the engine's preview
    pub async fn preview(&self) -> Result<String> {
        self.run_command(&["preview"]).await
    }

    /// Apply the program
    pub async fn up(&self) -> Result<String> {
        self.run_command(&["up", "--yes", "--skip-preview"]).await
    }

    /// Destroy every resource of the stack
    pub async fn destroy(&self) -> Result<String> {
        self.run_command(&["destroy", "--yes", "--skip-preview"]).await
    }

    /// Stack outputs as JSON values
    pub async fn outputs(&self) -> Result<BTreeMap<String, serde_json::Value>> {
        let output = self.run_command(&["stack", "output", "--json"]).await?;
        parse_outputs(&output)
    }
}

fn parse_outputs(output: &str) -> Result<BTreeMap<String, serde_json::Value>> {
    if output.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    Ok(serde_json::from_str(output)?)
}
