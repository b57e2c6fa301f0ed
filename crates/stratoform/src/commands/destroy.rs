use super::Context;
use colored::Colorize;
use stratoform_cloud::{PROGRAM_FILE, Pulumi};

pub async fn handle(ctx: &Context, yes: bool) -> anyhow::Result<()> {
    if !yes {
        anyhow::bail!(
            "destroy removes every resource of stack {}; pass --yes to confirm",
            ctx.stack
        );
    }

    let project = ctx.load_project()?;
    let stack_dir = project.stack_dir();
    let program_dir = stack_dir.program_dir();
    if !program_dir.join(PROGRAM_FILE).is_file() {
        anyhow::bail!(
            "no rendered program for stack {}; run `strato render` first",
            ctx.stack
        );
    }

    let lock = stack_dir.lock().await?;
    println!("{}", format!("Destroying stack {}...", ctx.stack).yellow());

    let pulumi = Pulumi::new(&program_dir, &ctx.stack);
    pulumi.check_installed().await?;
    let log = pulumi.destroy().await?;
    print!("{}", log);

    stack_dir.forget().await?;
    lock.release().await?;

    println!();
    println!("{}", "✓ Stack destroyed".green().bold());
    Ok(())
}
