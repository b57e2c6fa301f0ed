pub mod destroy;
pub mod outputs;
pub mod preview;
pub mod render;
pub mod up;
pub mod validate;

use anyhow::Context as _;
use colored::Colorize;
use std::path::PathBuf;
use stratoform::{BuildOptions, BuildReport, Project};
use stratoform_cloud::Stack;

/// Options shared by every subcommand
pub struct Context {
    pub project_dir: PathBuf,
    pub stack: String,
    pub options: BuildOptions,
}

impl Context {
    pub fn load_project(&self) -> anyhow::Result<Project> {
        Project::load(&self.project_dir, &self.stack).with_context(|| {
            format!(
                "cannot load stack {} from {}",
                self.stack,
                self.project_dir.display()
            )
        })
    }
}

/// Load the project and build its stack; any failed instruction is an error
pub fn build(ctx: &Context) -> anyhow::Result<(Project, Stack)> {
    let project = ctx.load_project()?;
    let config = project.config();
    println!(
        "Template: {} ({} on {})",
        config.template.name.cyan(),
        ctx.stack.cyan(),
        config.cloud.cyan()
    );

    let (stack, report) = project.build(ctx.options)?;
    print_report(&report);
    report
        .into_result()
        .context("the template did not build cleanly")?;
    Ok((project, stack))
}

pub fn print_report(report: &BuildReport) {
    for instruction in &report.succeeded {
        println!("  {} {}", "✓".green(), instruction);
    }
    for failure in &report.failed {
        println!("  {} {}: {}", "✗".red(), failure.instruction, failure.error);
    }
    for instruction in &report.skipped {
        println!("  {} {} (skipped)", "-".dimmed(), instruction);
    }
}
