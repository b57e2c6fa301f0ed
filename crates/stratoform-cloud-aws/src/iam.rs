//! IAM roles

use crate::provider::AwsProvider;
use stratoform_cloud::{Failures, Output, Properties, ResourceOptions, Result, Stack, logical_name};
use stratoform_config::Role;

pub(crate) const ROLE: &str = "aws:iam:Role";

/// Role slots later capabilities look up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoleKind {
    /// API Gateway integration credentials
    ApiGateway,
    /// Firehose delivery role
    Firehose,
    /// Role attached to the Redshift cluster
    Redshift,
    /// Lambda execution role writing to Firehose
    LambdaFirehose,
}

impl RoleKind {
    /// Classify a role by its lower-cased name prefix
    pub fn classify(role_name: &str) -> Option<RoleKind> {
        let name = role_name.to_lowercase();
        if name.starts_with("api_gateway") {
            Some(RoleKind::ApiGateway)
        } else if name.starts_with("kinesis_firehose") {
            Some(RoleKind::Firehose)
        } else if name.starts_with("redshift_service") {
            Some(RoleKind::Redshift)
        } else if name.starts_with("lambda_firehose") {
            Some(RoleKind::LambdaFirehose)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RoleKind::ApiGateway => "apigateway",
            RoleKind::Firehose => "firehose",
            RoleKind::Redshift => "redshift",
            RoleKind::LambdaFirehose => "lambdafirehose",
        }
    }

    /// Naming hint used in dependency errors
    pub(crate) fn requirement(&self) -> String {
        let prefix = match self {
            RoleKind::ApiGateway => "api_gateway",
            RoleKind::Firehose => "kinesis_firehose",
            RoleKind::Redshift => "redshift_service",
            RoleKind::LambdaFirehose => "lambda_firehose",
        };
        format!("an IAM role named {}* (configureIAM)", prefix)
    }
}

impl std::fmt::Display for RoleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn role_properties(role: &Role) -> Properties {
    let mut props = Properties::new()
        .with("name", &role.name)
        .with("forceDetachPolicies", role.force_detach_policies)
        .with_non_empty("assumeRolePolicy", &role.assume_policy);

    if !role.inline_policy.is_empty() {
        props.set(
            "inlinePolicies",
            Output::list([Properties::new()
                .with("name", format!("{}-inline-role", role.name))
                .with("policy", &role.inline_policy)]),
        );
    }
    props
}

impl AwsProvider {
    pub(crate) fn register_roles(&mut self, stack: &mut Stack) -> Result<()> {
        let mut failures = Failures::new();

        for role in &self.config.iam.roles {
            let registered = stack.register(
                ROLE,
                &logical_name(&role.name),
                role_properties(role),
                ResourceOptions::new(),
            );
            let Some(handle) = failures.capture(&role.name, registered) else {
                continue;
            };

            match RoleKind::classify(&role.name) {
                Some(kind) => {
                    tracing::debug!(role = %role.name, kind = %kind, "Classified IAM role");
                    self.roles.insert(kind, handle);
                }
                None => tracing::debug!(role = %role.name, "IAM role left unclassified"),
            }
        }

        tracing::info!(
            roles = self.config.iam.roles.len(),
            failed = failures.len(),
            "IAM roles registered"
        );
        failures.into_result()
    }
}
