//! Operator CLI for moving registry aliases.

mod rotation;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gateway_core::{build_config, resolve_alias_to_version_uri, MlflowRegistry};
use tracing::info;

const SERVICE_NAME: &str = "registry-admin";

#[derive(Parser)]
#[command(name = "registry-admin")]
#[command(about = "Rotate and inspect model registry aliases")]
struct Cli {
    /// Registry base address (overrides MLFLOW_TRACKING_URI)
    #[arg(long, global = true)]
    tracking_uri: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Move @dev to @prod, @prod to @backup and @backup to @dev
    Promote {
        #[arg(long, default_value = "Project_Model")]
        model: String,
    },
    /// Swap @prod and @backup
    Revert {
        #[arg(long, default_value = "Project_Model")]
        model: String,
    },
    /// Remove an alias from the model
    Unset {
        #[arg(long, default_value = "Project_Model")]
        model: String,
        #[arg(long)]
        alias: String,
    },
    /// Print the versioned URI an alias resolves to through version search
    Resolve {
        #[arg(long, default_value = "Project_Model")]
        model: String,
        #[arg(long, default_value = "prod")]
        alias: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = build_config(SERVICE_NAME)?;
    if cli.tracking_uri.is_some() {
        config.mlflow_tracking_uri = cli.tracking_uri.clone();
    }
    let level = config.log_level.clone().unwrap_or_else(|| "warn".into());
    gateway_core::init_tracing(SERVICE_NAME, &level)?;
    let registry = MlflowRegistry::new(config.into_shared());

    match cli.command {
        Command::Promote { model } => {
            let moves = rotation::promote(&registry, &model).await
                .with_context(|| format!("promotion of {model} failed; not all aliases exist"))?;
            println!("Promotion complete for {model}:");
            for mv in moves { println!("  {mv}"); }
        }
        Command::Revert { model } => {
            let moves = rotation::revert(&registry, &model).await
                .with_context(|| format!("revert of {model} failed"))?;
            println!("Revert complete for {model}:");
            for mv in moves { println!("  {mv}"); }
        }
        Command::Unset { model, alias } => {
            let version = rotation::unset(&registry, &model, &alias).await
                .with_context(|| format!("could not remove @{alias} from {model}"))?;
            println!("Removed @{alias} from {model} (was version {version})");
        }
        Command::Resolve { model, alias } => {
            let uri = resolve_alias_to_version_uri(&registry, &model, &alias).await?;
            info!(%model, %alias, %uri, "resolved");
            println!("{uri}");
        }
    }
    gateway_core::shutdown_tracer();
    Ok(())
}
