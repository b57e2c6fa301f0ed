use super::Context;
use colored::Colorize;
use std::collections::BTreeMap;
use stratoform_cloud::Pulumi;

pub async fn handle(ctx: &Context, live: bool) -> anyhow::Result<()> {
    let project = ctx.load_project()?;
    let stack_dir = project.stack_dir();

    let outputs = if live {
        Pulumi::new(stack_dir.program_dir(), &ctx.stack)
            .outputs()
            .await?
    } else {
        stack_dir.load().await?.outputs
    };

    if outputs.is_empty() {
        println!("{}", "No outputs recorded for this stack.".yellow());
        return Ok(());
    }
    print_outputs(&outputs);
    Ok(())
}

pub fn print_outputs(outputs: &BTreeMap<String, serde_json::Value>) {
    for (name, value) in outputs {
        let value = match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        println!("  {}: {}", name.cyan(), value);
    }
}
