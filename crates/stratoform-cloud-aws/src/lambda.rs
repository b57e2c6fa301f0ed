//! Lambda function with a public function URL

use crate::iam::RoleKind;
use crate::provider::{AwsProvider, require};
use stratoform_cloud::{
    CloudError, Instruction, Output, Properties, ResourceOptions, Result, Stack, logical_name,
    project_path,
};

const FUNCTION: &str = "aws:lambda:Function";
const FUNCTION_URL: &str = "aws:lambda:FunctionUrl";
const ARCHIVE_FILE: &str = "archive:getFile";

impl AwsProvider {
    pub(crate) fn register_lambda(&mut self, stack: &mut Stack) -> Result<()> {
        let instruction = Instruction::CreateFunction;
        let stream = require(&self.stream, instruction, "a Firehose delivery stream (createStream)")?;
        let role = self.require_role(RoleKind::LambdaFirehose, instruction)?;

        let function = &self.config.function;
        let source = function.build.source.as_ref().ok_or_else(|| {
            CloudError::InvalidConfig("function.build.source is required on aws".to_string())
        })?;

        let source_dir = project_path(&self.root, &source.zip);
        let output_path = project_path(&self.root, &source.output_path);

        // Hash of the packaged sources, so code changes are picked up
        let archive = stack.invoke(
            &logical_name(&format!("{}-archive", function.name)),
            ARCHIVE_FILE,
            Properties::new()
                .with("type", "zip")
                .with("sourceDir", &source_dir)
                .with("outputPath", &output_path),
        )?;

        let mut variables: Properties = function.build.envs.iter().collect();
        variables.set("firehose_name", stream.attr("name"));

        let lambda = stack.register(
            FUNCTION,
            &logical_name(&function.name),
            Properties::new()
                .with("code", Output::file_archive(&output_path))
                .with("name", &function.name)
                .with("role", role.attr("arn"))
                .with("handler", &function.build.handler)
                .with("runtime", &function.build.runtime)
                .with("sourceCodeHash", archive.attr("outputBase64sha256"))
                .with("environment", Properties::new().with("variables", variables)),
            ResourceOptions::depends_on([&stream]),
        )?;

        let url = stack.register(
            FUNCTION_URL,
            &logical_name(&format!("{}-url", function.name)),
            Properties::new()
                .with("functionName", &function.name)
                .with("authorizationType", &function.auth)
                .with(
                    "cors",
                    Properties::new()
                        .with("allowCredentials", true)
                        .with("allowOrigins", Output::strings(["*"]))
                        .with("allowMethods", Output::strings(["*"])),
                ),
            ResourceOptions::depends_on([&lambda]),
        )?;
        stack.export("lambda_function_url", url.attr("functionUrl"));

        tracing::info!(function = %function.name, "Lambda function registered");
        Ok(())
    }
}
