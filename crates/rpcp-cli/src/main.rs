//! rpcp-cli entry point.
//!
//! Thin clap wrapper: parses arguments, delegates to `commands::*`, and
//! prints their output. No control-plane logic lives here — every command
//! either computes a pure local result (`config-hash`) or calls the running
//! `rpcp-daemon`'s HTTP API (`status`, `emergency activate|resume`).

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "rpcp")]
#[command(about = "Risk & Position Control Plane operator CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute layered config hash + print canonical JSON.
    ConfigHash {
        /// Paths in merge order (base -> env -> engine -> risk -> stress...)
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Print the daemon's current status snapshot.
    Status,

    /// Emergency kill switch.
    Emergency {
        #[command(subcommand)]
        cmd: EmergencyCmd,
    },
}

#[derive(Subcommand)]
enum EmergencyCmd {
    /// Manually trip the emergency flag, halting every write path except
    /// emergency-stop plan execution.
    Activate {
        /// The RiskAlert that triggered this, if any.
        #[arg(long)]
        alert_id: Option<String>,
    },

    /// Clear the emergency flag. Requires --confirm "RESUME TRADING".
    Resume {
        #[arg(long)]
        confirm: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::ConfigHash { paths } => commands::config_hash::run(&paths)?,
        Commands::Status => commands::status::run().await?,
        Commands::Emergency { cmd } => match cmd {
            EmergencyCmd::Activate { alert_id } => commands::emergency::activate(alert_id).await?,
            EmergencyCmd::Resume { confirm } => commands::emergency::resume(confirm).await?,
        },
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}
