use super::Context;
use colored::Colorize;
use stratoform_cloud::{AppliedStack, Pulumi};

pub async fn handle(ctx: &Context) -> anyhow::Result<()> {
    let project = ctx.load_project()?;
    let stack_dir = project.stack_dir();
    let lock = stack_dir.lock().await?;

    let rendered = super::render::render(ctx).await?;

    let pulumi = Pulumi::new(&rendered.program_dir, &ctx.stack);
    let version = pulumi.check_installed().await?;
    println!();
    println!("{} {}", "Applying with pulumi".blue(), version.trim());

    pulumi.select_stack().await?;
    let log = pulumi.up().await?;
    print!("{}", log);

    let applied = AppliedStack::new(&rendered.program, pulumi.outputs().await?);
    stack_dir.save(&applied).await?;
    lock.release().await?;

    println!();
    println!("{}", "✓ Stack is up to date".green().bold());
    super::outputs::print_outputs(&applied.outputs);
    Ok(())
}
