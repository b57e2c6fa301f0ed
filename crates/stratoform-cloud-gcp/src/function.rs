//! Cloud Functions (2nd gen)
//!
//! Registers the optional service account and source bucket, the function
//! itself and the role bindings scoped to it. The function URL is exported as
//! `function_url`.

use crate::provider::{BUCKET, GcpProvider, require};
use stratoform_cloud::{
    Failures, Instruction, Output, Properties, ResourceOptions, ResourceRef, Result, Stack,
    logical_name, project_path,
};
use stratoform_config::Source;

const SERVICE_ACCOUNT: &str = "gcp:serviceaccount:Account";
const BUCKET_OBJECT: &str = "gcp:storage:BucketObject";
const FUNCTION: &str = "gcp:cloudfunctionsv2:Function";
const RETRY_POLICY: &str = "RETRY_POLICY_RETRY";

/// Template whose functions are triggered by the stream topic
const DATA_PIPELINE: &str = "data-pipeline";

impl GcpProvider {
    pub(crate) fn register_function(&mut self, stack: &mut Stack) -> Result<()> {
        let mut failures = Failures::new();

        if let Some(sa) = &self.config.iam.service_acc {
            let account = stack.register(
                SERVICE_ACCOUNT,
                &logical_name(&sa.account_id),
                Properties::new()
                    .with("accountId", &sa.account_id)
                    .with_non_empty("displayName", &sa.display_name)
                    .with_non_empty("project", &sa.project)
                    .with("createIgnoreAlreadyExists", true),
                ResourceOptions::new(),
            );
            self.service_account = failures.capture(&sa.account_id, account);
        }

        if let Some(source) = self.config.function.build.source.clone() {
            let registered = self.register_source(stack, &source);
            if let Some((bucket, object)) = failures.capture(&source.storage.bucket.name, registered)
            {
                self.source_bucket = Some(bucket);
                self.source_object = Some(object);
            }
        }

        let registered = self.function_resource(stack);
        let Some(function) = failures.capture(&self.config.function.name, registered) else {
            return failures.into_result();
        };
        self.function = Some(function.clone());

        if let Err(err) = self.register_function_bindings(stack, &function) {
            failures.push(&self.config.function.name, err);
        }

        stack.export("function_url", function.attr("url"));
        tracing::info!(function = %self.config.function.name, "Cloud Function registered");
        failures.into_result()
    }

    fn register_source(&self, stack: &mut Stack, source: &Source) -> Result<(ResourceRef, ResourceRef)> {
        let bucket_conf = &source.storage.bucket;
        let bucket = stack.register(
            BUCKET,
            &logical_name(&bucket_conf.name),
            Properties::new()
                .with("name", &bucket_conf.name)
                .with("location", &self.region)
                .with("uniformBucketLevelAccess", true)
                .with("forceDestroy", source.storage.force_destroy),
            ResourceOptions::new(),
        )?;

        let object = stack.register(
            BUCKET_OBJECT,
            &logical_name(&bucket_conf.object.name),
            Properties::new()
                .with("name", &bucket_conf.object.name)
                .with("bucket", bucket.attr("name"))
                .with(
                    "source",
                    Output::file_asset(project_path(&self.workdir, &bucket_conf.object.path)),
                ),
            ResourceOptions::depends_on([&bucket]),
        )?;

        Ok((bucket, object))
    }

    fn function_resource(&self, stack: &mut Stack) -> Result<ResourceRef> {
        let function = &self.config.function;
        let build = &function.build;

        let mut build_config = Properties::new()
            .with("runtime", &build.runtime)
            .with("entryPoint", &build.entry_point)
            .with_non_empty("dockerRepository", &build.docker_repo);
        if let (Some(bucket), Some(object)) = (&self.source_bucket, &self.source_object) {
            build_config.set(
                "source",
                Properties::new().with(
                    "storageSource",
                    Properties::new()
                        .with("bucket", bucket.attr("name"))
                        .with("object", object.attr("name")),
                ),
            );
        }

        let mut environment = Properties::new()
            .with("PROJECT_ID", &self.project)
            .with("TOPIC_ID", &self.config.stream.pubsub_conf.topic.name);
        for (key, value) in &build.envs {
            environment.set(key, value);
        }

        let service = &function.service_conf;
        let service_config = Properties::new()
            .with("maxInstanceCount", service.max_instance)
            .with("availableMemory", &service.available_mem)
            .with("timeoutSeconds", service.timeout)
            .with_opt(
                "serviceAccountEmail",
                self.service_account.as_ref().map(|sa| sa.attr("email")),
            )
            .with("environmentVariables", environment)
            .with_non_empty("ingressSettings", &service.ingress);

        let mut props = Properties::new()
            .with("name", &function.name)
            .with("location", &self.region)
            .with("project", &self.project)
            .with("buildConfig", build_config)
            .with("serviceConfig", service_config);

        if let Some(trigger) = &function.trigger {
            let mut event_trigger = Properties::new()
                .with("eventType", &trigger.event_type)
                .with("retryPolicy", RETRY_POLICY)
                .with_non_empty("triggerRegion", &trigger.region);
            if self.config.template.name == DATA_PIPELINE {
                let topic = require(
                    &self.topic,
                    Instruction::CreateFunction,
                    "a Pub/Sub topic (createStream) for the function trigger",
                )?;
                event_trigger.set("pubsubTopic", topic.id());
            }
            props.set("eventTrigger", event_trigger);
        }

        let deps: Vec<&ResourceRef> = [&self.service_account, &self.source_bucket, &self.source_object]
            .into_iter()
            .flatten()
            .collect();

        stack.register(
            FUNCTION,
            &logical_name(&function.name),
            props,
            ResourceOptions::depends_on(deps),
        )
    }
}
