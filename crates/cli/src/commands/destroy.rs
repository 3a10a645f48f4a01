// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `looper destroy`: remove result folders for selected samples.

use crate::commands::{query_yes_no, ProjectArgs, SelectionArgs};
use crate::config::{load_project, ProjectOverrides};
use anyhow::{Context, Result};
use clap::Args;

#[derive(Debug, Args)]
pub struct DestroyArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Only list what would be removed
    #[arg(short = 'd', long = "dry-run")]
    pub dry_run: bool,

    /// Destroy without confirmation
    #[arg(long = "force-yes")]
    pub force_yes: bool,
}

pub fn execute(args: DestroyArgs) -> Result<()> {
    let project = load_project(
        &args.project.looper_config,
        ProjectOverrides {
            output_dir: args.project.output_dir.clone(),
            ..Default::default()
        },
    )?;
    let selector = args.selection.to_selector();
    let selected = selector.select(project.samples())?;

    tracing::info!("Removing results:");
    let folders: Vec<_> = selected
        .iter()
        .map(|s| looper_core::sample_folder(project.results_folder(), s.name()))
        .collect();
    for folder in &folders {
        tracing::info!("  {}", folder.display());
    }

    if args.dry_run {
        tracing::info!("Dry run. No files destroyed.");
        return Ok(());
    }
    if !args.force_yes
        && !query_yes_no(
            "Are you sure you want to permanently delete all pipeline results for this project?",
        )?
    {
        tracing::info!("Destroy action aborted by user.");
        return Ok(());
    }

    for folder in &folders {
        if folder.exists() {
            std::fs::remove_dir_all(folder)
                .with_context(|| format!("failed to remove {}", folder.display()))?;
        }
    }
    tracing::info!("Destroy complete.");
    Ok(())
}
