//! AWS provider implementation

use crate::iam::RoleKind;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use stratoform_cloud::{
    CloudError, CloudProvider, Instruction, Properties, ResourceOptions, ResourceRef, Result, Stack,
    logical_name,
};
use stratoform_config::{Config, StackSettings};

pub(crate) const BUCKET: &str = "aws:s3:Bucket";

/// AWS provider
///
/// Handles of created resources are kept so that later instructions can
/// reference them; an instruction that needs a handle that was never created
/// fails with [`CloudError::MissingDependency`].
pub struct AwsProvider {
    pub(crate) settings: StackSettings,
    pub(crate) config: Config,
    pub(crate) root: PathBuf,
    pub(crate) roles: HashMap<RoleKind, ResourceRef>,
    pub(crate) bucket: Option<ResourceRef>,
    pub(crate) stream: Option<ResourceRef>,
    pub(crate) cluster: Option<ResourceRef>,
    pub(crate) statement: Option<ResourceRef>,
    pub(crate) rest_api: Option<ResourceRef>,
    pub(crate) user_pool: Option<ResourceRef>,
    pub(crate) authorizer: Option<ResourceRef>,
}

impl AwsProvider {
    /// `root` is the project directory template paths are relative to
    pub fn new(settings: StackSettings, config: Config, root: impl Into<PathBuf>) -> Self {
        Self {
            settings,
            config,
            root: root.into(),
            roles: HashMap::new(),
            bucket: None,
            stream: None,
            cluster: None,
            statement: None,
            rest_api: None,
            user_pool: None,
            authorizer: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Role registered for `kind`, if any
    pub fn role(&self, kind: RoleKind) -> Option<&ResourceRef> {
        self.roles.get(&kind)
    }

    pub fn bucket(&self) -> Option<&ResourceRef> {
        self.bucket.as_ref()
    }

    pub fn stream(&self) -> Option<&ResourceRef> {
        self.stream.as_ref()
    }

    pub fn cluster(&self) -> Option<&ResourceRef> {
        self.cluster.as_ref()
    }

    pub fn statement(&self) -> Option<&ResourceRef> {
        self.statement.as_ref()
    }

    pub fn rest_api(&self) -> Option<&ResourceRef> {
        self.rest_api.as_ref()
    }

    pub fn user_pool(&self) -> Option<&ResourceRef> {
        self.user_pool.as_ref()
    }

    pub fn authorizer(&self) -> Option<&ResourceRef> {
        self.authorizer.as_ref()
    }

    /// Role handle for `kind` or a dependency error for `instruction`
    pub(crate) fn require_role(
        &self,
        kind: RoleKind,
        instruction: Instruction,
    ) -> Result<ResourceRef> {
        self.roles
            .get(&kind)
            .cloned()
            .ok_or_else(|| CloudError::MissingDependency {
                instruction,
                requires: kind.requirement(),
            })
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

impl CloudProvider for AwsProvider {
    fn name(&self) -> &str {
        "aws"
    }

    fn display_name(&self) -> &str {
        "Amazon Web Services"
    }

    fn supports(&self, _instruction: Instruction) -> bool {
        true
    }

    fn configure_iam(&mut self, stack: &mut Stack) -> Result<()> {
        self.register_roles(stack)
    }

    fn create_storage(&mut self, stack: &mut Stack) -> Result<()> {
        let storage = &self.config.storage;
        let bucket = stack.register(
            BUCKET,
            &logical_name(&storage.name),
            Properties::new()
                .with("bucket", &storage.name)
                .with("forceDestroy", storage.force_destroy),
            ResourceOptions::new(),
        )?;
        tracing::info!(bucket = %storage.name, "S3 bucket registered");
        self.bucket = Some(bucket);
        Ok(())
    }

    fn create_dwh(&mut self, stack: &mut Stack) -> Result<()> {
        self.register_redshift(stack)
    }

    fn create_stream(&mut self, stack: &mut Stack) -> Result<()> {
        self.register_firehose(stack)
    }

    fn create_api_gateway(&mut self, stack: &mut Stack) -> Result<()> {
        self.register_rest_api(stack)
    }

    fn create_vpc(&mut self, _stack: &mut Stack) -> Result<()> {
        tracing::debug!("createVpc has no resources on aws");
        Ok(())
    }

    fn create_function(&mut self, stack: &mut Stack) -> Result<()> {
        self.register_lambda(stack)
    }

    fn create_identity_management(&mut self, stack: &mut Stack) -> Result<()> {
        self.register_user_pool(stack)
    }
}
