//! IAM members and function-scoped role bindings

use crate::provider::{GcpProvider, require};
use stratoform_cloud::{
    CloudError, Failures, Instruction, Output, Properties, ResourceOptions, ResourceRef, Result,
    Stack, logical_name,
};
use stratoform_config::Role;

const GET_PROJECT: &str = "gcp:organizations:getProject";
const PROJECT_LOOKUP: &str = "gcp-project";
const BUCKET_IAM_MEMBER: &str = "gcp:storage:BucketIAMMember";
const PROJECT_IAM_MEMBER: &str = "gcp:projects:IAMMember";
const FUNCTION_IAM_MEMBER: &str = "gcp:cloudfunctionsv2:FunctionIamMember";
const TOPIC_IAM_MEMBER: &str = "gcp:pubsub:TopicIAMMember";
const CLOUDRUN_IAM_BINDING: &str = "gcp:cloudrun:IamBinding";

/// Role `type` tags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    /// Bucket member, created by configureIAM
    Bucket,
    /// Project member, created by configureIAM
    Project,
    /// Cloud Functions v2 member, created with the function
    CloudFunction,
    /// Topic member, created with the function
    PubSub,
    /// Cloud Run binding, created with the function
    CloudRun,
}

impl MemberKind {
    pub fn parse(tag: &str) -> Option<MemberKind> {
        match tag {
            "bucketmember" => Some(MemberKind::Bucket),
            "projectmember" => Some(MemberKind::Project),
            "cloudfuncv2member" => Some(MemberKind::CloudFunction),
            "pubsubmember" => Some(MemberKind::PubSub),
            "cloudrunbinding" => Some(MemberKind::CloudRun),
            _ => None,
        }
    }

    fn function_scoped(&self) -> bool {
        matches!(
            self,
            MemberKind::CloudFunction | MemberKind::PubSub | MemberKind::CloudRun
        )
    }
}

/// Fill the first `%v`, `%d` or `%s` of `template` with `value`
pub(crate) fn fill_member(template: &str, value: Output) -> Output {
    let verb = ["%v", "%d", "%s"]
        .iter()
        .filter_map(|verb| template.find(verb))
        .min();
    match verb {
        Some(at) => Output::concat([
            Output::string(&template[..at]),
            value,
            Output::string(&template[at + 2..]),
        ]),
        None => Output::string(template),
    }
}

fn service_account_member(account: &ResourceRef) -> Output {
    Output::concat([Output::string("serviceAccount:"), account.attr("email")])
}

impl GcpProvider {
    pub(crate) fn register_members(&mut self, stack: &mut Stack) -> Result<()> {
        let project_id = self
            .config
            .iam
            .service_acc
            .as_ref()
            .map(|sa| sa.project.clone())
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| self.project.clone());

        let lookup = stack.invoke(
            PROJECT_LOOKUP,
            GET_PROJECT,
            Properties::new().with("projectId", &project_id),
        )?;
        self.project_lookup = Some(lookup.clone());

        let mut failures = Failures::new();
        for role in &self.config.iam.roles {
            let Some(kind) = MemberKind::parse(&role.kind) else {
                tracing::warn!(role = %role.name, kind = %role.kind, "Skipping role with unknown type");
                continue;
            };
            let registered = match kind {
                MemberKind::Bucket => self.register_bucket_member(stack, role, &lookup),
                MemberKind::Project => stack
                    .register(
                        PROJECT_IAM_MEMBER,
                        &logical_name(&role.name),
                        Properties::new()
                            .with("project", lookup.attr("projectId"))
                            .with("role", &role.role)
                            .with("member", fill_member(&role.member, lookup.attr("number"))),
                        ResourceOptions::new(),
                    )
                    .map(|_| ()),
                _ => continue,
            };
            failures.capture(&role.name, registered);
        }

        tracing::info!(
            project = %project_id,
            roles = self.config.iam.roles.len(),
            failed = failures.len(),
            "IAM members registered"
        );
        failures.into_result()
    }

    fn register_bucket_member(
        &self,
        stack: &mut Stack,
        role: &Role,
        lookup: &ResourceRef,
    ) -> Result<()> {
        let bucket = require(
            &self.bucket,
            Instruction::ConfigureIam,
            "a Cloud Storage bucket (createStorage)",
        )?;
        stack.register(
            BUCKET_IAM_MEMBER,
            &logical_name(&role.name),
            Properties::new()
                .with("bucket", bucket.attr("name"))
                .with("role", &role.role)
                .with("member", fill_member(&role.member, lookup.attr("number"))),
            ResourceOptions::depends_on([&bucket]),
        )?;
        Ok(())
    }

    /// Bindings that target the function, its topic or its Cloud Run service
    pub(crate) fn register_function_bindings(
        &self,
        stack: &mut Stack,
        function: &ResourceRef,
    ) -> Result<()> {
        let mut failures = Failures::new();
        for role in &self.config.iam.roles {
            let Some(kind) = MemberKind::parse(&role.kind).filter(|k| k.function_scoped()) else {
                continue;
            };
            let registered = self.register_function_binding(stack, role, kind, function);
            failures.capture(&role.name, registered);
        }
        failures.into_result()
    }

    fn register_function_binding(
        &self,
        stack: &mut Stack,
        role: &Role,
        kind: MemberKind,
        function: &ResourceRef,
    ) -> Result<ResourceRef> {
        let instruction = Instruction::CreateFunction;
        let account = require(
            &self.service_account,
            instruction,
            "iam.service_acc for the function service account",
        )?;
        let member = service_account_member(&account);

        match kind {
            MemberKind::CloudFunction => stack.register(
                FUNCTION_IAM_MEMBER,
                &logical_name(&role.name),
                Properties::new()
                    .with("project", &self.project)
                    .with("location", &self.region)
                    .with("cloudFunction", &self.config.function.name)
                    .with("role", &role.role)
                    .with("member", member),
                ResourceOptions::depends_on([function]),
            ),
            MemberKind::PubSub => {
                let topic = require(&self.topic, instruction, "a Pub/Sub topic (createStream)")?;
                stack.register(
                    TOPIC_IAM_MEMBER,
                    &logical_name(&role.name),
                    Properties::new()
                        .with("project", &self.project)
                        .with("topic", topic.attr("name"))
                        .with("role", &role.role)
                        .with("member", member),
                    ResourceOptions::depends_on([&topic]),
                )
            }
            MemberKind::CloudRun => stack.register(
                CLOUDRUN_IAM_BINDING,
                &logical_name(&role.name),
                Properties::new()
                    .with("project", &self.project)
                    .with("service", &self.config.function.name)
                    .with("location", &self.region)
                    .with("role", &role.role)
                    .with("members", Output::list([member])),
                ResourceOptions::depends_on([function]),
            ),
            MemberKind::Bucket | MemberKind::Project => Err(CloudError::InvalidConfig(format!(
                "{} is not a function-scoped role",
                role.name
            ))),
        }
    }
}
