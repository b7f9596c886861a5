//! CLI command definitions for the `campuschat` binary.
//!
//! `serve` runs the HTTP API. The remaining commands are operator tools that
//! act on the same database the server uses.

pub mod admin;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

use campuschat_infra::config::DEFAULT_CONFIG_FILE;

/// Passwordless campus chat server.
#[derive(Parser)]
#[command(name = "campuschat", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    /// Path to the TOML configuration file.
    #[arg(long, global = true, env = "CAMPUSCHAT_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server.
    Serve {
        /// Interface to bind (overrides `server.host`).
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides `server.port`).
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Log an account out of every device.
    #[command(name = "revoke-sessions")]
    RevokeSessions {
        /// Email address of the account.
        email: String,
    },

    /// Delete expired verification challenges.
    #[command(name = "purge-challenges")]
    PurgeChallenges,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

impl Cli {
    /// Default tracing directive for the chosen verbosity.
    pub fn log_directive(&self) -> &'static str {
        match self.verbose {
            0 if self.quiet => "error",
            0 => "info,campuschat=info",
            1 => "debug,hyper=info,sqlx=warn",
            _ => "trace",
        }
    }
}
