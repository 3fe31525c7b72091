//! rexec CLI
//!
//! Runs shell commands on a single remote device over SSH:
//! - `exec` connects, runs each command and prints its output
//! - `config` manages the defaults file

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rexec::commands::{self, ExecArgs};
use rexec::output::print_error;
use rexec_core::config::{self, SessionConfig};

#[derive(Parser)]
#[command(name = "rexec")]
#[command(author, version, about = "Run shell commands on a remote device over SSH")]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run commands on a remote device and print their output
    Exec(ExecArgs),

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
    /// Print the effective configuration
    Show,
    /// Print the configuration file path
    Path,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    if let Err(e) = run(cli).await {
        print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| level.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Exec(args) => {
            let base = load_session_config(cli.config.as_deref())?;
            let session_config = args.apply(base);
            tracing::debug!("Effective config: {:?}", session_config);
            commands::exec_command(session_config, &args.commands, args.save).await
        }
        Commands::Config { action } => match action {
            ConfigAction::Init { force } => commands::config_init(cli.config.as_deref(), force),
            ConfigAction::Show => commands::config_show(cli.config.as_deref()),
            ConfigAction::Path => commands::config_path(cli.config.as_deref()),
        },
    }
}

/// Load the config file; a missing default file just means defaults
fn load_session_config(explicit: Option<&std::path::Path>) -> Result<SessionConfig> {
    let path = commands::resolve_config_path(explicit);

    if explicit.is_none() && !path.exists() {
        return Ok(SessionConfig::default());
    }

    config::load_config(&path)
        .with_context(|| format!("Failed to load config file: {}", path.display()))
}
