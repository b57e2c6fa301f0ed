use super::Context;
use colored::Colorize;
use std::collections::BTreeMap;

pub fn handle(ctx: &Context) -> anyhow::Result<()> {
    println!("{}", "Validating template...".blue());
    let (_, stack) = super::build(ctx)?;

    let mut by_type: BTreeMap<&str, usize> = BTreeMap::new();
    for resource in stack.resources() {
        *by_type.entry(resource.token.as_str()).or_default() += 1;
    }

    println!();
    println!("{}", "✓ Template is valid".green().bold());
    println!("  Resources: {}", stack.resources().len());
    for (token, count) in &by_type {
        println!("    - {} x{}", token.cyan(), count);
    }
    if !stack.outputs().is_empty() {
        println!("  Outputs:");
        for name in stack.outputs().keys() {
            println!("    - {}", name.cyan());
        }
    }
    Ok(())
}
