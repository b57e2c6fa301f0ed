//! Project loading
//!
//! A project directory holds the engine's stack settings
//! (`Pulumi.<stack>.yaml`) and the template YAML they point to through
//! `config:path`.

use crate::dispatcher::{BuildOptions, BuildReport, Dispatcher};
use crate::error::Result;
use crate::provider::ActiveProvider;
use std::path::{Path, PathBuf};
use stratoform_cloud::{CloudError, Stack, StackDir};
use stratoform_config::{Config, StackSettings, load_config};

/// Settings and template of one stack
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
    settings: StackSettings,
    config: Config,
}

impl Project {
    /// Load the settings of `stack` and the template they name
    ///
    /// The root is made absolute: the engine runs from the program directory
    /// and template paths are resolved against it.
    pub fn load(root: &Path, stack: &str) -> Result<Self> {
        let settings = StackSettings::load(root, stack)?;
        let config_path = settings.config_path()?;
        let config = load_config(root, &config_path)?;
        let root = std::path::absolute(root).map_err(CloudError::from)?;
        Ok(Self {
            root,
            settings,
            config,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn settings(&self) -> &StackSettings {
        &self.settings
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Working directory of the stack under `.stratoform/`
    pub fn stack_dir(&self) -> StackDir {
        StackDir::new(&self.root, self.settings.stack())
    }

    /// Empty resource graph named after the project and stack
    pub fn new_stack(&self) -> Stack {
        Stack::new(self.settings.project(), self.settings.stack())
    }

    /// Select the provider and register the template's resources
    pub fn build(&self, options: BuildOptions) -> Result<(Stack, BuildReport)> {
        let provider = ActiveProvider::from_config(&self.settings, self.config.clone(), &self.root)?;
        let mut dispatcher =
            Dispatcher::new(provider, self.config.template.instructions.clone(), options);
        let mut stack = self.new_stack();
        let report = dispatcher.build(&mut stack)?;
        Ok((stack, report))
    }
}
