//! Provider selection

use std::path::Path;
use stratoform_cloud::{CloudError, CloudKind, CloudProvider, Instruction, Result, Stack};
use stratoform_cloud_aws::AwsProvider;
use stratoform_cloud_gcp::GcpProvider;
use stratoform_config::{Config, StackSettings};

/// The provider a template runs against
pub enum ActiveProvider {
    Aws(AwsProvider),
    Gcp(GcpProvider),
}

impl ActiveProvider {
    /// Build the provider for `kind`
    ///
    /// `workdir` is the project root: template paths resolve against it and
    /// generated artifacts (the GCP OpenAPI document) land in it.
    pub fn initialize(
        kind: CloudKind,
        settings: &StackSettings,
        config: Config,
        workdir: &Path,
    ) -> Result<Self> {
        let provider = match kind {
            CloudKind::Aws => ActiveProvider::Aws(AwsProvider::new(settings.clone(), config, workdir)),
            CloudKind::Gcp => ActiveProvider::Gcp(GcpProvider::new(settings, config, workdir)?),
            CloudKind::Azure => {
                return Err(CloudError::ProviderNotImplemented(kind.to_string()));
            }
        };
        tracing::info!(provider = %provider.display_name(), "Provider initialized");
        Ok(provider)
    }

    /// Select the provider named by the template's `cloud` key
    pub fn from_config(settings: &StackSettings, config: Config, workdir: &Path) -> Result<Self> {
        let kind: CloudKind = config.cloud.parse()?;
        Self::initialize(kind, settings, config, workdir)
    }

    pub fn kind(&self) -> CloudKind {
        match self {
            ActiveProvider::Aws(_) => CloudKind::Aws,
            ActiveProvider::Gcp(_) => CloudKind::Gcp,
        }
    }

    fn inner(&self) -> &dyn CloudProvider {
        match self {
            ActiveProvider::Aws(p) => p,
            ActiveProvider::Gcp(p) => p,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn CloudProvider {
        match self {
            ActiveProvider::Aws(p) => p,
            ActiveProvider::Gcp(p) => p,
        }
    }
}

impl CloudProvider for ActiveProvider {
    fn name(&self) -> &str {
        self.inner().name()
    }

    fn display_name(&self) -> &str {
        self.inner().display_name()
    }

    fn supports(&self, instruction: Instruction) -> bool {
        self.inner().supports(instruction)
    }

    fn configure_iam(&mut self, stack: &mut Stack) -> Result<()> {
        self.inner_mut().configure_iam(stack)
    }

    fn create_storage(&mut self, stack: &mut Stack) -> Result<()> {
        self.inner_mut().create_storage(stack)
    }

    fn create_dwh(&mut self, stack: &mut Stack) -> Result<()> {
        self.inner_mut().create_dwh(stack)
    }

    fn create_stream(&mut self, stack: &mut Stack) -> Result<()> {
        self.inner_mut().create_stream(stack)
    }

    fn create_api_gateway(&mut self, stack: &mut Stack) -> Result<()> {
        self.inner_mut().create_api_gateway(stack)
    }

    fn create_vpc(&mut self, stack: &mut Stack) -> Result<()> {
        self.inner_mut().create_vpc(stack)
    }

    fn create_function(&mut self, stack: &mut Stack) -> Result<()> {
        self.inner_mut().create_function(stack)
    }

    fn create_identity_management(&mut self, stack: &mut Stack) -> Result<()> {
        self.inner_mut().create_identity_management(stack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> StackSettings {
        StackSettings::from_values(
            "demo",
            "dev",
            [("gcp:project", "demo-project"), ("gcp:region", "europe-west1")],
        )
    }

    fn config(cloud: &str) -> Config {
        Config {
            cloud: cloud.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_select_aws_and_gcp() {
        let dir = Path::new(".");
        let aws = ActiveProvider::from_config(&settings(), config("aws"), dir).unwrap();
        assert_eq!(aws.kind(), CloudKind::Aws);
        assert_eq!(aws.name(), "aws");

        let gcp = ActiveProvider::from_config(&settings(), config("gcp"), dir).unwrap();
        assert_eq!(gcp.kind(), CloudKind::Gcp);
        assert_eq!(gcp.name(), "gcp");
        assert!(!gcp.supports(Instruction::CreateIdentityManagement));
    }

    #[test]
    fn test_unknown_and_unimplemented_providers() {
        let dir = Path::new(".");
        assert!(matches!(
            ActiveProvider::from_config(&settings(), config("oracle"), dir),
            Err(CloudError::ProviderNotFound(name)) if name == "oracle"
        ));
        assert!(matches!(
            ActiveProvider::from_config(&settings(), config("Aws"), dir),
            Err(CloudError::ProviderNotFound(_))
        ));
        assert!(matches!(
            ActiveProvider::from_config(&settings(), config("azure"), dir),
            Err(CloudError::ProviderNotImplemented(name)) if name == "azure"
        ));
    }

    #[test]
    fn test_gcp_requires_placement_settings() {
        let settings = StackSettings::from_values("demo", "dev", [("config:path", "config")]);
        assert!(matches!(
            ActiveProvider::initialize(CloudKind::Gcp, &settings, Config::default(), Path::new(".")),
            Err(CloudError::MissingSetting(_))
        ));
    }
}
