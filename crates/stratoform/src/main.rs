mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use stratoform::BuildOptions;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "strato")]
#[command(about = "Cloud data-pipeline templates for AWS and GCP, applied with Pulumi", long_about = None)]
struct Cli {
    /// Project directory holding Pulumi.<stack>.yaml
    #[arg(short = 'C', long, global = true, default_value = ".")]
    project_dir: PathBuf,

    /// Stack name
    #[arg(short, long, global = true, env = "STRATO_STACK", default_value = "dev")]
    stack: String,

    /// Run every instruction even after one fails
    #[arg(long, global = true)]
    keep_going: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the template and register its resources without touching the cloud
    Validate,
    /// Write the Pulumi program for the stack
    Render,
    /// Show what would change against the last apply
    Preview,
    /// Render the program and apply it with pulumi
    Up,
    /// Destroy every resource of the stack
    Destroy {
        /// Confirm destruction
        #[arg(short, long)]
        yes: bool,
    },
    /// Show the stack outputs
    Outputs {
        /// Ask pulumi instead of reading the last applied record
        #[arg(long)]
        live: bool,
    },
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let ctx = commands::Context {
        project_dir: cli.project_dir,
        stack: cli.stack,
        options: BuildOptions {
            keep_going: cli.keep_going,
        },
    };

    match cli.command {
        Commands::Validate => commands::validate::handle(&ctx)?,
        Commands::Render => commands::render::handle(&ctx).await?,
        Commands::Preview => commands::preview::handle(&ctx).await?,
        Commands::Up => commands::up::handle(&ctx).await?,
        Commands::Destroy { yes } => commands::destroy::handle(&ctx, yes).await?,
        Commands::Outputs { live } => commands::outputs::handle(&ctx, live).await?,
        Commands::Version => {
            println!("stratoform {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
