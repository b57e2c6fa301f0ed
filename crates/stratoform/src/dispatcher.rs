//! Instruction dispatch
//!
//! Runs a template's instruction list against one provider, in declared
//! order. The whole list is resolved before anything runs, so a typo in the
//! last instruction leaves the stack untouched.

use stratoform_cloud::{CloudError, CloudProvider, Failures, Instruction, Result, Stack};

/// How the build reacts to a failed instruction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Keep running after a failed instruction instead of skipping the rest
    pub keep_going: bool,
}

/// Failure of one instruction
#[derive(Debug)]
pub struct InstructionFailure {
    pub instruction: Instruction,
    pub error: CloudError,
}

/// Outcome of a build
#[derive(Debug, Default)]
pub struct BuildReport {
    pub succeeded: Vec<Instruction>,
    pub failed: Vec<InstructionFailure>,
    /// Not run because an earlier instruction failed
    pub skipped: Vec<Instruction>,
}

impl BuildReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// `Ok(())` on success, otherwise the failures keyed by instruction name
    pub fn into_result(self) -> Result<()> {
        let mut failures = Failures::new();
        for failure in self.failed {
            failures.push(failure.instruction.as_str(), failure.error);
        }
        failures.into_result()
    }
}

/// Drives one provider through an instruction list
pub struct Dispatcher<P> {
    provider: P,
    instructions: Vec<String>,
    options: BuildOptions,
}

impl<P: CloudProvider> Dispatcher<P> {
    pub fn new(provider: P, instructions: Vec<String>, options: BuildOptions) -> Self {
        Self {
            provider,
            instructions,
            options,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn into_provider(self) -> P {
        self.provider
    }

    /// Register every instruction's resources on `stack`
    ///
    /// Only an unknown instruction name is returned as `Err`; per-instruction
    /// failures are collected in the report.
    pub fn build(&mut self, stack: &mut Stack) -> Result<BuildReport> {
        let instructions = Instruction::parse_list(&self.instructions)?;
        let mut report = BuildReport::default();

        tracing::info!(
            provider = %self.provider.name(),
            instructions = instructions.len(),
            keep_going = self.options.keep_going,
            "Starting build"
        );

        let mut remaining = instructions.into_iter();
        while let Some(instruction) = remaining.next() {
            if !self.provider.supports(instruction) {
                tracing::warn!(%instruction, provider = %self.provider.name(), "Instruction not supported");
                report.failed.push(InstructionFailure {
                    instruction,
                    error: CloudError::Unsupported {
                        provider: self.provider.name().to_string(),
                        instruction,
                    },
                });
                continue;
            }

            match self.provider.run(instruction, stack) {
                Ok(()) => {
                    tracing::info!(%instruction, "Instruction completed");
                    report.succeeded.push(instruction);
                }
                Err(error) => {
                    tracing::error!(%instruction, error = %error, "Instruction failed");
                    report.failed.push(InstructionFailure { instruction, error });
                    if !self.options.keep_going {
                        report.skipped.extend(remaining.by_ref());
                        break;
                    }
                }
            }
        }

        if !report.skipped.is_empty() {
            tracing::warn!(skipped = report.skipped.len(), "Build halted after a failure");
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratoform_cloud::{Properties, ResourceOptions};

    /// Registers one resource per call and fails the instructions it is told to
    struct Recorder {
        fail: Vec<Instruction>,
        calls: Vec<Instruction>,
    }

    impl Recorder {
        fn new(fail: &[Instruction]) -> Self {
            Self {
                fail: fail.to_vec(),
                calls: Vec::new(),
            }
        }

        fn step(&mut self, instruction: Instruction, stack: &mut Stack) -> Result<()> {
            self.calls.push(instruction);
            if self.fail.contains(&instruction) {
                return Err(CloudError::InvalidConfig(format!("{} broke", instruction)));
            }
            stack.register(
                "test:index:Step",
                instruction.as_str(),
                Properties::new(),
                ResourceOptions::new(),
            )?;
            Ok(())
        }
    }

    impl CloudProvider for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn display_name(&self) -> &str {
            "Recorder"
        }

        fn supports(&self, instruction: Instruction) -> bool {
            instruction != Instruction::CreateVpc
        }

        fn configure_iam(&mut self, stack: &mut Stack) -> Result<()> {
            self.step(Instruction::ConfigureIam, stack)
        }

        fn create_storage(&mut self, stack: &mut Stack) -> Result<()> {
            self.step(Instruction::CreateStorage, stack)
        }

        fn create_dwh(&mut self, stack: &mut Stack) -> Result<()> {
            self.step(Instruction::CreateDwh, stack)
        }

        fn create_stream(&mut self, stack: &mut Stack) -> Result<()> {
            self.step(Instruction::CreateStream, stack)
        }

        fn create_api_gateway(&mut self, stack: &mut Stack) -> Result<()> {
            self.step(Instruction::CreateApiGateway, stack)
        }

        fn create_vpc(&mut self, stack: &mut Stack) -> Result<()> {
            self.step(Instruction::CreateVpc, stack)
        }

        fn create_function(&mut self, stack: &mut Stack) -> Result<()> {
            self.step(Instruction::CreateFunction, stack)
        }

        fn create_identity_management(&mut self, stack: &mut Stack) -> Result<()> {
            self.step(Instruction::CreateIdentityManagement, stack)
        }
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_runs_in_declared_order() {
        let mut dispatcher = Dispatcher::new(
            Recorder::new(&[]),
            names(&["createStorage", "configureIAM", "createStream"]),
            BuildOptions::default(),
        );
        let mut stack = Stack::new("demo", "dev");

        let report = dispatcher.build(&mut stack).unwrap();
        assert!(report.is_success());
        assert_eq!(
            dispatcher.provider().calls,
            vec![
                Instruction::CreateStorage,
                Instruction::ConfigureIam,
                Instruction::CreateStream
            ]
        );
        assert_eq!(stack.resources().len(), 3);
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn test_unknown_instruction_fails_before_registration() {
        let mut dispatcher = Dispatcher::new(
            Recorder::new(&[]),
            names(&["createStorage", "createQueue"]),
            BuildOptions::default(),
        );
        let mut stack = Stack::new("demo", "dev");

        let err = dispatcher.build(&mut stack).unwrap_err();
        assert!(matches!(err, CloudError::UnknownInstruction(name) if name == "createQueue"));
        assert!(dispatcher.provider().calls.is_empty());
        assert!(stack.is_empty());
    }

    #[test]
    fn test_instruction_names_are_case_sensitive() {
        let mut dispatcher = Dispatcher::new(
            Recorder::new(&[]),
            names(&["createstorage"]),
            BuildOptions::default(),
        );
        let mut stack = Stack::new("demo", "dev");
        assert!(matches!(
            dispatcher.build(&mut stack),
            Err(CloudError::UnknownInstruction(_))
        ));
    }

    #[test]
    fn test_fail_fast_skips_the_rest() {
        let mut dispatcher = Dispatcher::new(
            Recorder::new(&[Instruction::CreateStream]),
            names(&["createStorage", "createStream", "createFunction", "createApiGateway"]),
            BuildOptions::default(),
        );
        let mut stack = Stack::new("demo", "dev");

        let report = dispatcher.build(&mut stack).unwrap();
        assert_eq!(report.succeeded, vec![Instruction::CreateStorage]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].instruction, Instruction::CreateStream);
        assert_eq!(
            report.skipped,
            vec![Instruction::CreateFunction, Instruction::CreateApiGateway]
        );
        assert_eq!(stack.resources().len(), 1);
    }

    #[test]
    fn test_keep_going_runs_everything() {
        let mut dispatcher = Dispatcher::new(
            Recorder::new(&[Instruction::CreateStream]),
            names(&["createStorage", "createStream", "createFunction"]),
            BuildOptions { keep_going: true },
        );
        let mut stack = Stack::new("demo", "dev");

        let report = dispatcher.build(&mut stack).unwrap();
        assert_eq!(
            report.succeeded,
            vec![Instruction::CreateStorage, Instruction::CreateFunction]
        );
        assert!(report.skipped.is_empty());

        let err = report.into_result().unwrap_err();
        let CloudError::Partial(failures) = err else {
            panic!("expected a partial failure");
        };
        let items: Vec<&str> = failures.iter().map(|f| f.item.as_str()).collect();
        assert_eq!(items, vec!["createStream"]);
    }

    #[test]
    fn test_unsupported_is_reported_without_running() {
        let mut dispatcher = Dispatcher::new(
            Recorder::new(&[]),
            names(&["createVpc", "createStorage"]),
            BuildOptions::default(),
        );
        let mut stack = Stack::new("demo", "dev");

        let report = dispatcher.build(&mut stack).unwrap();
        assert_eq!(report.succeeded, vec![Instruction::CreateStorage]);
        assert!(matches!(
            report.failed[0].error,
            CloudError::Unsupported { instruction: Instruction::CreateVpc, .. }
        ));
        assert_eq!(dispatcher.provider().calls, vec![Instruction::CreateStorage]);
    }
}
