//! GCP provider implementation

use std::path::{Path, PathBuf};
use stratoform_cloud::{
    CloudError, CloudProvider, Instruction, Properties, ResourceOptions, ResourceRef, Result, Stack,
    logical_name,
};
use stratoform_config::{Config, StackSettings};

pub(crate) const BUCKET: &str = "gcp:storage:Bucket";

const PROJECT_KEY: &str = "gcp:project";
const REGION_KEY: &str = "gcp:region";

/// GCP provider
pub struct GcpProvider {
    pub(crate) project: String,
    pub(crate) region: String,
    pub(crate) workdir: PathBuf,
    pub(crate) config: Config,
    pub(crate) project_lookup: Option<ResourceRef>,
    pub(crate) bucket: Option<ResourceRef>,
    pub(crate) dataset: Option<ResourceRef>,
    pub(crate) table: Option<ResourceRef>,
    pub(crate) topic: Option<ResourceRef>,
    pub(crate) subscription: Option<ResourceRef>,
    pub(crate) service_account: Option<ResourceRef>,
    pub(crate) source_bucket: Option<ResourceRef>,
    pub(crate) source_object: Option<ResourceRef>,
    pub(crate) function: Option<ResourceRef>,
    pub(crate) api: Option<ResourceRef>,
    pub(crate) gateway: Option<ResourceRef>,
}

impl GcpProvider {
    /// `workdir` receives generated artifacts such as the OpenAPI document
    pub fn new(settings: &StackSettings, config: Config, workdir: impl Into<PathBuf>) -> Result<Self> {
        let require = |key: &str| {
            settings
                .require(key)
                .map_err(|e| CloudError::MissingSetting(e.to_string()))
        };
        let project = require(PROJECT_KEY)?;
        let region = require(REGION_KEY)?;
        tracing::debug!(project = %project, region = %region, "GCP placement");

        Ok(Self {
            project,
            region,
            workdir: workdir.into(),
            config,
            project_lookup: None,
            bucket: None,
            dataset: None,
            table: None,
            topic: None,
            subscription: None,
            service_account: None,
            source_bucket: None,
            source_object: None,
            function: None,
            api: None,
            gateway: None,
        })
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn bucket(&self) -> Option<&ResourceRef> {
        self.bucket.as_ref()
    }

    pub fn table(&self) -> Option<&ResourceRef> {
        self.table.as_ref()
    }

    pub fn topic(&self) -> Option<&ResourceRef> {
        self.topic.as_ref()
    }

    pub fn function(&self) -> Option<&ResourceRef> {
        self.function.as_ref()
    }

    pub fn service_account(&self) -> Option<&ResourceRef> {
        self.service_account.as_ref()
    }

    pub fn gateway(&self) -> Option<&ResourceRef> {
        self.gateway.as_ref()
    }
}

/// Clone a handle or fail with a dependency error
pub(crate) fn require(
    handle: &Option<ResourceRef>,
    instruction: Instruction,
    requires: &str,
) -> Result<ResourceRef> {
    handle.clone().ok_or_else(|| CloudError::MissingDependency {
        instruction,
        requires: requires.to_string(),
    })
}

impl CloudProvider for GcpProvider {
    fn name(&self) -> &str {
        "gcp"
    }

    fn display_name(&self) -> &str {
        "Google Cloud"
    }

    fn supports(&self, instruction: Instruction) -> bool {
        !matches!(instruction, Instruction::CreateIdentityManagement)
    }

    fn configure_iam(&mut self, stack: &mut Stack) -> Result<()> {
        self.register_members(stack)
    }

    fn create_storage(&mut self, stack: &mut Stack) -> Result<()> {
        let storage = &self.config.storage;
        let bucket = stack.register(
            BUCKET,
            &logical_name(&storage.name),
            Properties::new()
                .with("name", &storage.name)
                .with("location", &self.region)
                .with("forceDestroy", storage.force_destroy)
                .with("uniformBucketLevelAccess", true),
            ResourceOptions::new(),
        )?;
        tracing::info!(bucket = %storage.name, "Cloud Storage bucket registered");
        self.bucket = Some(bucket);
        Ok(())
    }

    fn create_dwh(&mut self, stack: &mut Stack) -> Result<()> {
        self.register_bigquery(stack)
    }

    fn create_stream(&mut self, stack: &mut Stack) -> Result<()> {
        self.register_pubsub(stack)
    }

    fn create_api_gateway(&mut self, stack: &mut Stack) -> Result<()> {
        self.register_api_gateway(stack)
    }

    fn create_vpc(&mut self, _stack: &mut Stack) -> Result<()> {
        tracing::debug!("createVpc has no resources on gcp");
        Ok(())
    }

    fn create_function(&mut self, stack: &mut Stack) -> Result<()> {
        self.register_function(stack)
    }

    fn create_identity_management(&mut self, _stack: &mut Stack) -> Result<()> {
        Err(CloudError::Unsupported {
            provider: self.name().to_string(),
            instruction: Instruction::CreateIdentityManagement,
        })
    }
}
