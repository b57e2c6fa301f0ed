//! Cloud provider capability trait and the instruction vocabulary

use crate::error::{CloudError, Result};
use crate::stack::Stack;
use std::str::FromStr;

/// Providers a template can name in its `cloud` key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloudKind {
    Aws,
    Gcp,
    /// Reserved; no implementation exists
    Azure,
}

impl CloudKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CloudKind::Aws => "aws",
            CloudKind::Gcp => "gcp",
            CloudKind::Azure => "azure",
        }
    }
}

impl FromStr for CloudKind {
    type Err = CloudError;

    /// Case-sensitive
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "aws" => Ok(CloudKind::Aws),
            "gcp" => Ok(CloudKind::Gcp),
            "azure" => Ok(CloudKind::Azure),
            other => Err(CloudError::ProviderNotFound(other.to_string())),
        }
    }
}

impl std::fmt::Display for CloudKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step of a template's instruction list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instruction {
    ConfigureIam,
    CreateVpc,
    CreateApiGateway,
    CreateStorage,
    CreateDwh,
    CreateStream,
    CreateFunction,
    CreateIdentityManagement,
}

impl Instruction {
    pub const ALL: [Instruction; 8] = [
        Instruction::ConfigureIam,
        Instruction::CreateVpc,
        Instruction::CreateApiGateway,
        Instruction::CreateStorage,
        Instruction::CreateDwh,
        Instruction::CreateStream,
        Instruction::CreateFunction,
        Instruction::CreateIdentityManagement,
    ];

    /// Name as written in the template
    pub fn as_str(&self) -> &'static str {
        match self {
            Instruction::ConfigureIam => "configureIAM",
            Instruction::CreateVpc => "createVpc",
            Instruction::CreateApiGateway => "createApiGateway",
            Instruction::CreateStorage => "createStorage",
            Instruction::CreateDwh => "createDWH",
            Instruction::CreateStream => "createStream",
            Instruction::CreateFunction => "createFunction",
            Instruction::CreateIdentityManagement => "createIdentityManagement",
        }
    }

    /// Resolve a whole instruction list; the first unknown name fails it
    pub fn parse_list<S: AsRef<str>>(names: &[S]) -> Result<Vec<Instruction>> {
        names.iter().map(|n| n.as_ref().parse()).collect()
    }
}

impl FromStr for Instruction {
    type Err = CloudError;

    /// Case-sensitive
    fn from_str(s: &str) -> Result<Self> {
        Instruction::ALL
            .into_iter()
            .find(|i| i.as_str() == s)
            .ok_or_else(|| CloudError::UnknownInstruction(s.to_string()))
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cloud provider capability trait
///
/// Each method translates one configuration section into resource
/// registrations on the stack. Handles of created resources stay inside the
/// provider so later capabilities can wire dependency edges to them.
pub trait CloudProvider {
    /// Returns the provider name (e.g., "aws", "gcp")
    fn name(&self) -> &str;

    /// Returns the provider display name for UI
    fn display_name(&self) -> &str;

    /// Whether `instruction` is meaningful on this provider
    fn supports(&self, instruction: Instruction) -> bool;

    fn configure_iam(&mut self, stack: &mut Stack) -> Result<()>;

    fn create_storage(&mut self, stack: &mut Stack) -> Result<()>;

    fn create_dwh(&mut self, stack: &mut Stack) -> Result<()>;

    fn create_stream(&mut self, stack: &mut Stack) -> Result<()>;

    fn create_api_gateway(&mut self, stack: &mut Stack) -> Result<()>;

    fn create_vpc(&mut self, stack: &mut Stack) -> Result<()>;

    fn create_function(&mut self, stack: &mut Stack) -> Result<()>;

    fn create_identity_management(&mut self, stack: &mut Stack) -> Result<()>;

    /// Run the capability behind `instruction`
    fn run(&mut self, instruction: Instruction, stack: &mut Stack) -> Result<()> {
        match instruction {
            Instruction::ConfigureIam => self.configure_iam(stack),
            Instruction::CreateVpc => self.create_vpc(stack),
            Instruction::CreateApiGateway => self.create_api_gateway(stack),
            Instruction::CreateStorage => self.create_storage(stack),
            Instruction::CreateDwh => self.create_dwh(stack),
            Instruction::CreateStream => self.create_stream(stack),
            Instruction::CreateFunction => self.create_function(stack),
            Instruction::CreateIdentityManagement => self.create_identity_management(stack),
        }
    }
}
