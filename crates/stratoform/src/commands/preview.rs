use super::Context;
use colored::Colorize;
use stratoform_cloud::{ChangeKind, Plan, Program};

pub async fn handle(ctx: &Context) -> anyhow::Result<()> {
    let (project, stack) = super::build(ctx)?;
    let program = Program::from_stack(&stack)?;
    let applied = project.stack_dir().load().await?;
    let plan = Plan::between(&program, &applied);

    println!();
    if !plan.has_changes() {
        println!("{}", "No changes. The last apply matches the template.".green());
        return Ok(());
    }

    for change in plan.changes() {
        let line = format!("{} ({})", change.name, change.token);
        let fields = change.fields.join(", ");
        match change.kind {
            ChangeKind::Create => println!("  {} {}", "+".green(), line),
            ChangeKind::Update => println!("  {} {} {}", "~".yellow(), line, fields.dimmed()),
            ChangeKind::Replace => println!("  {} {}", "+-".magenta(), line),
            ChangeKind::Delete => println!("  {} {}", "-".red(), line),
            ChangeKind::Same => {}
        }
    }

    println!();
    println!("{}", plan.summary().to_string().bold());
    Ok(())
}
