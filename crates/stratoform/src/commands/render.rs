use super::Context;
use anyhow::Context as _;
use colored::Colorize;
use std::path::PathBuf;
use stratoform_cloud::{Program, Stack};
use stratoform_config::StackSettings;

/// A program written to disk, ready for the engine
pub struct Rendered {
    pub stack: Stack,
    pub program: Program,
    pub program_dir: PathBuf,
}

/// Build the stack and write the program plus a copy of the stack settings
pub async fn render(ctx: &Context) -> anyhow::Result<Rendered> {
    let (project, stack) = super::build(ctx)?;
    let program_dir = project.stack_dir().program_dir();

    let program = Program::from_stack(&stack)?;
    let path = program
        .write_to(&program_dir)
        .await
        .with_context(|| format!("cannot write program to {}", program_dir.display()))?;

    let settings_copy = program_dir.join(StackSettings::file_name(&ctx.stack));
    tokio::fs::copy(project.settings().path(), &settings_copy)
        .await
        .with_context(|| {
            format!(
                "cannot copy {} to {}",
                project.settings().path().display(),
                settings_copy.display()
            )
        })?;

    tracing::info!(program = %path.display(), "Program rendered");
    Ok(Rendered {
        stack,
        program,
        program_dir,
    })
}

pub async fn handle(ctx: &Context) -> anyhow::Result<()> {
    let rendered = render(ctx).await?;
    println!();
    println!(
        "{} {} resources rendered to {}",
        "✓".green(),
        rendered.stack.resources().len(),
        rendered.program_dir.display().to_string().cyan()
    );
    Ok(())
}
