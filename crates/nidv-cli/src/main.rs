//! # nidv CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use nidv_cli::credential::{
    run_issue, run_list, run_reveal, run_set_active, CredentialIdArgs, IssueArgs, ListArgs,
};
use nidv_cli::keygen::run_keygen;
use nidv_cli::StoreOptions;

/// National ID validator credential administration.
#[derive(Parser, Debug)]
#[command(name = "nidv", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(flatten)]
    store: StoreOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Issue a new API credential and print its secret once.
    Issue(IssueArgs),

    /// List credentials with masked previews.
    List(ListArgs),

    /// Re-enable a credential.
    Activate(CredentialIdArgs),

    /// Disable a credential. It then authenticates as if it did not exist.
    Deactivate(CredentialIdArgs),

    /// Decrypt and print a credential's secret (requires the audit key).
    Reveal(CredentialIdArgs),

    /// Generate a base64 AES-256 key for NIDV_AUDIT_KEY.
    Keygen,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(store = ?cli.store, "nidv CLI starting");

    let result = match &cli.command {
        Commands::Issue(args) => run_issue(&cli.store, args),
        Commands::List(args) => run_list(&cli.store, args),
        Commands::Activate(args) => run_set_active(&cli.store, args, true),
        Commands::Deactivate(args) => run_set_active(&cli.store, args, false),
        Commands::Reveal(args) => run_reveal(&cli.store, args),
        Commands::Keygen => run_keygen(),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}
