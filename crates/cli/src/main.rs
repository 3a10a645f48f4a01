// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! looper - a job submitter for sample-oriented pipelines

mod commands;
mod config;
mod exit_error;
mod table;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{check, clean, destroy, run};

#[derive(Parser)]
#[command(
    name = "looper",
    version,
    about = "A pipeline submission engine that parses sample inputs and submits pipelines for each sample"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run or submit sample-level pipelines
    Run(run::RunArgs),
    /// Resubmit sample-level pipelines for failed or waiting samples
    Rerun(run::RunArgs),
    /// Run or submit project-level pipelines
    Runp(run::RunArgs),
    /// Check the run status of sample pipelines
    Check(check::CheckArgs),
    /// Run clean scripts of already-processed jobs
    Clean(clean::CleanArgs),
    /// Remove output files of the project
    Destroy(destroy::DestroyArgs),
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    init_logging();
    if let Err(e) = dispatch().await {
        let code = e
            .downcast_ref::<exit_error::ExitError>()
            .map_or(1, |c| c.code);
        let msg = format_error(&e);
        if !msg.is_empty() {
            tracing::error!("{}", msg);
        }
        std::process::exit(code);
    }
}

async fn dispatch() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => run::execute_samples(args, false).await,
        Commands::Rerun(args) => run::execute_samples(args, true).await,
        Commands::Runp(args) => run::execute_project(args).await,
        Commands::Check(args) => check::execute(args),
        Commands::Clean(args) => clean::execute(args),
        Commands::Destroy(args) => destroy::execute(args),
    }
}

fn init_logging() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn format_error(e: &anyhow::Error) -> String {
    let mut msg = e.to_string();
    for cause in e.chain().skip(1) {
        msg.push_str(&format!(": {}", cause));
    }
    msg
}
