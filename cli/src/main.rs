//! Altair CLI binary
//!
//! Command-line front end for launching processes through the Altair core.

#![allow(unused_crate_dependencies)]

use altair_core::config::load_batch_from_toml_path;
use altair_core::registry::LaunchRegistry;
use altair_core::{run_sync, Launcher};
use clap::{Parser, Subcommand};
use cli::{format_exit, format_exit_json, propagated_exit_code, CliError};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "altair")]
#[command(about = "Launch commands and track their exits")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a command synchronously and propagate its exit code
    Run {
        /// Program to run
        command: String,
        /// Arguments passed verbatim to the program
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Launch a command asynchronously and wait for its exit notification
    Watch {
        /// Program to launch
        command: String,
        /// Arguments passed verbatim to the program
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
        /// Print the exit as JSON instead of plain text
        #[arg(long)]
        json: bool,
    },
    /// Run every command from a TOML batch file in order
    Batch {
        /// Path to the batch file
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> cli::Result<()> {
    let cli = Cli::parse();

    altair_core::utils::init_tracing(&cli.log_level)?;

    match cli.command {
        Commands::Run { command, args } => run_command(command, args).await,
        Commands::Watch {
            command,
            args,
            json,
        } => watch_command(command, args, json).await,
        Commands::Batch { file } => batch_command(file).await,
    }
}

async fn run_command(command: String, args: Vec<String>) -> cli::Result<()> {
    let mut argv = vec![command];
    argv.extend(args);

    // run_sync blocks for the child's full lifetime, so keep it off the
    // runtime workers
    let exit = tokio::task::spawn_blocking(move || run_sync(&argv))
        .await
        .map_err(|e| CliError::CommandFailed(format!("sync runner panicked: {}", e)))??;
    println!("{}", format_exit(&exit));
    if exit.is_failure() {
        std::process::exit(propagated_exit_code(&exit));
    }
    Ok(())
}

async fn watch_command(command: String, args: Vec<String>, json: bool) -> cli::Result<()> {
    let registry = Arc::new(LaunchRegistry::new());
    let launcher = Launcher::unix(registry);

    let mut argv = vec![command];
    argv.extend(args);

    let (tx, rx) = oneshot::channel();
    let tag = launcher
        .launch(&argv, move |exit| {
            let _ = tx.send(exit);
        })
        .await?;
    info!("Launched with tag {}", tag);

    let exit = rx
        .await
        .map_err(|_| CliError::CommandFailed("exit notification never delivered".to_string()))?;

    if json {
        println!("{}", format_exit_json(&exit)?);
    } else {
        println!("{}", format_exit(&exit));
    }
    if exit.is_failure() {
        std::process::exit(propagated_exit_code(&exit));
    }
    Ok(())
}

async fn batch_command(file: PathBuf) -> cli::Result<()> {
    let batch = load_batch_from_toml_path(&file)?;
    let total = batch.commands.len();

    let failures = tokio::task::spawn_blocking(move || {
        let mut failures = 0usize;
        for spec in &batch.commands {
            match run_sync(&spec.argv()) {
                Ok(exit) => {
                    println!("{} => {}", spec.command, format_exit(&exit));
                    if exit.is_failure() {
                        failures += 1;
                    }
                }
                Err(e) => {
                    error!("{} failed to start: {}", spec.command, e);
                    failures += 1;
                }
            }
        }
        failures
    })
    .await
    .map_err(|e| CliError::CommandFailed(format!("batch runner panicked: {}", e)))?;

    println!("{} commands, {} failed", total, failures);
    if failures > 0 {
        return Err(CliError::CommandFailed(format!(
            "{} of {} commands failed",
            failures, total
        )));
    }
    Ok(())
}
