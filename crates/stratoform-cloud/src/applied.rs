//! Record of the last successful apply
//!
//! Each stack has a working directory `.stratoform/<stack>/` holding the
//! rendered program (`program/`), what the engine last applied
//! (`applied.json`) and, while `up` or `destroy` runs, `apply.lock`.

use crate::error::{CloudError, Result};
use crate::program::{Program, ResourceEntry};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

const WORK_DIR: &str = ".stratoform";
const PROGRAM_DIR: &str = "program";
const APPLIED_FILE: &str = "applied.json";
const LOCK_FILE: &str = "apply.lock";

/// A lock older than this was left by a run that died
const STALE_LOCK_HOURS: i64 = 1;

/// Resources and outputs of the program the engine last applied
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppliedStack {
    /// `None` until the first successful `up`
    pub applied_at: Option<DateTime<Utc>>,

    /// Program resource entries, in program order
    #[serde(default)]
    pub resources: Vec<ResourceEntry>,

    /// Stack outputs as reported by `pulumi stack output`
    #[serde(default)]
    pub outputs: BTreeMap<String, serde_json::Value>,
}

impl AppliedStack {
    /// Record a successful apply of `program`
    pub fn new(program: &Program, outputs: BTreeMap<String, serde_json::Value>) -> Self {
        Self {
            applied_at: Some(Utc::now()),
            resources: program.resources().to_vec(),
            outputs,
        }
    }

    pub fn resource(&self, name: &str) -> Option<&ResourceEntry> {
        self.resources.iter().find(|r| r.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.applied_at.is_none()
    }
}

/// Working directory of one stack
#[derive(Debug, Clone)]
pub struct StackDir {
    dir: PathBuf,
    stack: String,
}

impl StackDir {
    pub fn new(project_root: &Path, stack: &str) -> Self {
        Self {
            dir: project_root.join(WORK_DIR).join(stack),
            stack: stack.to_string(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Directory the rendered program is written to and the engine runs in
    pub fn program_dir(&self) -> PathBuf {
        self.dir.join(PROGRAM_DIR)
    }

    pub fn applied_path(&self) -> PathBuf {
        self.dir.join(APPLIED_FILE)
    }

    /// Last applied record; empty when the stack was never applied
    pub async fn load(&self) -> Result<AppliedStack> {
        let path = self.applied_path();
        match fs::read_to_string(&path).await {
            Ok(content) => serde_json::from_str(&content)
                .map_err(|e| CloudError::StateError(format!("{}: {}", path.display(), e))),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(stack = %self.stack, "No applied record");
                Ok(AppliedStack::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Replace the record through a temporary file and a rename
    pub async fn save(&self, applied: &AppliedStack) -> Result<()> {
        fs::create_dir_all(&self.dir).await?;
        let path = self.applied_path();
        let partial = self.dir.join(format!("{}.partial", APPLIED_FILE));
        fs::write(&partial, serde_json::to_vec_pretty(applied)?).await?;
        fs::rename(&partial, &path).await?;
        tracing::debug!(
            path = %path.display(),
            resources = applied.resources.len(),
            outputs = applied.outputs.len(),
            "Applied record saved"
        );
        Ok(())
    }

    /// Drop the record once the stack is destroyed
    pub async fn forget(&self) -> Result<()> {
        match fs::remove_file(self.applied_path()).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Take the apply lock of the stack
    ///
    /// Fails with [`CloudError::LockError`] while another live run holds it.
    pub async fn lock(&self) -> Result<ApplyLock> {
        fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(LOCK_FILE);

        if let Some(owner) = read_owner(&path).await? {
            if Utc::now().signed_duration_since(owner.since).num_hours() < STALE_LOCK_HOURS {
                return Err(CloudError::LockError(format!(
                    "stack {} is being applied by pid {} since {}",
                    self.stack, owner.pid, owner.since
                )));
            }
            tracing::warn!(pid = owner.pid, since = %owner.since, "Removing stale apply lock");
            fs::remove_file(&path).await?;
        }

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => {
                    CloudError::LockError(format!("stack {} is being applied", self.stack))
                }
                _ => CloudError::from(e),
            })?;
        let owner = LockOwner {
            pid: std::process::id(),
            since: Utc::now(),
        };
        file.write_all(&serde_json::to_vec(&owner)?).await?;
        file.flush().await?;

        tracing::debug!(stack = %self.stack, "Apply lock taken");
        Ok(ApplyLock {
            path,
            released: false,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct LockOwner {
    pid: u32,
    since: DateTime<Utc>,
}

async fn read_owner(path: &Path) -> Result<Option<LockOwner>> {
    match fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Held while the engine changes the stack; the file goes away on release or drop
pub struct ApplyLock {
    path: PathBuf,
    released: bool,
}

impl ApplyLock {
    pub async fn release(mut self) -> Result<()> {
        self.released = true;
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for ApplyLock {
    fn drop(&mut self) {
        if !self.released {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}
