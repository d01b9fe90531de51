//! vpsops - operate and audit the two-host deployment
//!
//! Direct-command CLI: health dashboard, verification suite, stack and
//! backup management, agent passthrough. Connection parameters come from
//! a KEY=VALUE config file resolved once at startup.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing::error;

mod commands;
mod config;
mod ui;

use commands::App;
use config::Config;
use vpsops_core::RemoteExecutor;

#[derive(Parser, Debug)]
#[command(author, version, about = "Operate and audit the two-host deployment", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the KEY=VALUE configuration file
    #[arg(short, long, default_value = config::DEFAULT_CONFIG_FILE, env = "VPSOPS_CONFIG")]
    config: PathBuf,

    /// Log each remote command as it runs
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Health dashboard across both targets
    Status,

    /// Run the full verification suite (exit 1 if any check fails)
    Verify,

    /// Manage the gateway stack on the primary target
    Gateway {
        #[command(subcommand)]
        command: commands::gateway::GatewayCommand,
    },

    /// Manage the observability stack on the secondary target
    Monitoring {
        #[command(subcommand)]
        command: commands::monitoring::MonitoringCommand,
    },

    /// Infrastructure checks across the targets
    Infra {
        /// Which targets to address
        #[arg(short, long, value_enum, default_value = "both")]
        scope: config::TargetScope,

        #[command(subcommand)]
        command: commands::infra::InfraCommand,
    },

    /// OTEL diagnostics for the gateway agent
    Otel {
        #[command(subcommand)]
        command: commands::otel::OtelCommand,
    },

    /// Backup operations on the primary target
    Backups {
        #[command(subcommand)]
        command: commands::backups::BackupsCommand,
    },

    /// Run an agent CLI command inside the gateway container
    Agent {
        /// Allocate a PTY for interactive agent commands
        #[arg(short, long)]
        interactive: bool,

        /// Arguments passed through to the agent CLI
        #[arg(trailing_var_arg = true, required = true)]
        args: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };

    let app = App {
        executor: RemoteExecutor::new(cli.verbose),
        config,
    };

    let result = match cli.command {
        Commands::Status => commands::status::run(&app).await,
        Commands::Verify => match commands::verify::run(&app).await {
            Ok(true) => Ok(()),
            Ok(false) => process::exit(1),
            Err(e) => Err(e),
        },
        Commands::Gateway { command } => commands::gateway::run(&app, command).await,
        Commands::Monitoring { command } => commands::monitoring::run(&app, command).await,
        Commands::Infra { scope, command } => commands::infra::run(&app, scope, command).await,
        Commands::Otel { command } => commands::otel::run(&app, command).await,
        Commands::Backups { command } => commands::backups::run(&app, command).await,
        Commands::Agent { interactive, args } => commands::agent::run(&app, args, interactive).await,
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}
