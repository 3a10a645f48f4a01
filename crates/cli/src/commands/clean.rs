// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `looper clean`: run cleanup scripts left in sample results folders.

use crate::commands::{query_yes_no, ProjectArgs, SelectionArgs};
use crate::config::{load_project, ProjectOverrides};
use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Debug, Args)]
pub struct CleanArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Only list the cleanup scripts, do not execute them
    #[arg(short = 'd', long = "dry-run")]
    pub dry_run: bool,

    /// Clean without confirmation
    #[arg(long = "force-yes")]
    pub force_yes: bool,
}

fn cleanup_scripts(folder: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(folder) else {
        return Vec::new();
    };
    let mut scripts: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with("_cleanup.sh"))
        })
        .collect();
    scripts.sort();
    scripts
}

pub fn execute(args: CleanArgs) -> Result<()> {
    let project = load_project(
        &args.project.looper_config,
        ProjectOverrides {
            output_dir: args.project.output_dir.clone(),
            ..Default::default()
        },
    )?;
    let selector = args.selection.to_selector();
    let selected = selector.select(project.samples())?;

    let mut all_scripts = Vec::new();
    for sample in &selected {
        let folder = looper_core::sample_folder(project.results_folder(), sample.name());
        all_scripts.extend(cleanup_scripts(&folder));
    }

    if all_scripts.is_empty() {
        tracing::info!("Nothing to clean.");
        return Ok(());
    }
    tracing::info!("Files to clean:");
    for script in &all_scripts {
        tracing::info!("  {}", script.display());
    }

    if args.dry_run {
        tracing::info!("Dry run. No files cleaned.");
        return Ok(());
    }
    if !args.force_yes
        && !query_yes_no("Are you sure you want to permanently delete all cleanable data?")?
    {
        tracing::info!("Clean action aborted by user.");
        return Ok(());
    }

    for script in &all_scripts {
        tracing::info!(script = %script.display(), "running cleanup script");
        let status = Command::new("sh")
            .arg(script)
            .status()
            .with_context(|| format!("failed to run cleanup script {}", script.display()))?;
        if !status.success() {
            tracing::warn!(
                script = %script.display(),
                status = %status,
                "cleanup script failed"
            );
        }
    }
    tracing::info!("Clean complete.");
    Ok(())
}

#[cfg(test)]
#[path = "clean_tests.rs"]
mod tests;
