//! `sacl` entry point.
//!
//! Thin: loads `.env.local`, installs tracing on stderr, parses arguments,
//! and dispatches to `commands`. Every command prints JSON on stdout.

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "sacl")]
#[command(about = "Load-balancer access-control list reconciler", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> backend -> overrides)
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Print the action that would converge the state file to the manifest.
    /// Makes no remote calls.
    Plan {
        /// Desired-state manifest (YAML)
        #[arg(long)]
        desired: String,

        /// State file (JSON); absent means nothing has been created yet
        #[arg(long)]
        state: String,
    },

    /// Refresh, plan, and converge the remote ACL to the manifest
    Apply {
        /// Layered config paths in merge order
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        #[arg(long)]
        desired: String,

        #[arg(long)]
        state: String,
    },

    /// Re-read the tracked ACL; purges the record if it vanished remotely
    Refresh {
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        #[arg(long)]
        state: String,
    },

    /// Adopt an existing remote ACL by id into an empty state file
    Import {
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        /// Remote ACL id
        #[arg(long)]
        id: String,

        #[arg(long)]
        state: String,
    },

    /// Delete the tracked ACL (retries transient failures, then confirms)
    Destroy {
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        #[arg(long)]
        state: String,
    },

    /// Print the state file
    Show {
        #[arg(long)]
        state: String,
    },
}

fn main() -> Result<()> {
    // Silent if the file does not exist.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::ConfigHash { paths } => commands::config_hash(&paths),
        Commands::Plan { desired, state } => commands::converge::plan(&desired, &state),
        Commands::Apply {
            config_paths,
            desired,
            state,
        } => commands::converge::apply(&config_paths, &desired, &state),
        Commands::Refresh {
            config_paths,
            state,
        } => commands::lifecycle::refresh(&config_paths, &state),
        Commands::Import {
            config_paths,
            id,
            state,
        } => commands::lifecycle::import(&config_paths, &id, &state),
        Commands::Destroy {
            config_paths,
            state,
        } => commands::lifecycle::destroy(&config_paths, &state),
        Commands::Show { state } => commands::lifecycle::show(&state),
    }
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}
