// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `looper run`, `looper rerun`, and `looper runp`.

use crate::commands::{parse_key_value, ProjectArgs, SelectionArgs};
use crate::config::{load_project, ProjectOverrides};
use crate::exit_error::ExitError;
use anyhow::{anyhow, Context, Result};
use clap::Args;
use indexmap::IndexMap;
use looper_compute::{select_compute_config, ComputeStore};
use looper_engine::{run_project_pipelines, run_samples, RunOptions, RunSummary};
use serde_yaml::Value;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Assemble submission scripts but do not invoke the submission command
    #[arg(short = 'd', long = "dry-run")]
    pub dry_run: bool,

    /// Seconds to wait between job submissions
    #[arg(short = 't', long = "time-delay", default_value_t = 0.0)]
    pub time_delay: f64,

    /// String to append to every command
    #[arg(short = 'x', long = "command-extra")]
    pub command_extra: Option<String>,

    /// Same as command-extra, but overrides values in the PEP
    #[arg(short = 'y', long = "command-extra-override")]
    pub command_extra_override: Option<String>,

    /// Ignore run-status flags
    #[arg(short = 'i', long = "ignore-flags")]
    pub ignore_flags: bool,

    /// Do not check whether input files exist
    #[arg(short = 'f', long = "skip-file-checks")]
    pub skip_file_checks: bool,

    /// Total input file size (GB) to batch into one job
    #[arg(short = 'u', long = "lump", value_name = "SIZE_GB")]
    pub lump: Option<f64>,

    /// Number of commands to batch into one job
    #[arg(short = 'n', long = "lump-n", value_name = "N")]
    pub lump_n: Option<usize>,

    /// Total number of jobs to divide the samples into
    #[arg(short = 'j', long = "lump-j", value_name = "N")]
    pub lump_j: Option<usize>,

    /// Compute package to activate
    #[arg(short = 'p', long = "package")]
    pub package: Option<String>,

    /// Compute environment configuration file
    #[arg(long = "divvy", value_name = "FILE")]
    pub divvy: Option<PathBuf>,

    /// Compute variable overrides (repeatable: --compute key=value)
    #[arg(long = "compute", value_parser = parse_key_value)]
    pub compute: Vec<(String, String)>,
}

impl RunArgs {
    fn overrides(&self) -> ProjectOverrides {
        ProjectOverrides {
            output_dir: self.project.output_dir.clone(),
            dry_run: self.dry_run,
            skip_file_checks: self.skip_file_checks,
            compute_package: self.package.clone(),
        }
    }

    fn run_options(&self, rerun: bool) -> RunOptions {
        let compute_overrides: IndexMap<String, Value> = self
            .compute
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        RunOptions {
            rerun,
            ignore_flags: self.ignore_flags,
            time_delay: self.time_delay,
            command_extra: self.command_extra.clone(),
            command_extra_override: self.command_extra_override.clone(),
            max_cmds: self.lump_n,
            max_size: self.lump,
            max_jobs: self.lump_j,
            compute_overrides,
            selector: self.selection.to_selector(),
        }
    }

    fn compute_store(&self, package: Option<&str>) -> Result<ComputeStore> {
        let mut store = match select_compute_config(self.divvy.as_deref()) {
            Some(path) => ComputeStore::from_file(&path)
                .with_context(|| format!("cannot load compute config {}", path.display()))?,
            None => ComputeStore::bundled(),
        };
        if let Some(package) = package {
            if !store.activate(package) {
                return Err(anyhow!(
                    "unknown compute package '{}'; available: {}",
                    package,
                    store.package_names().join(", ")
                ));
            }
        }
        Ok(store)
    }
}

fn exit_on_failures(summary: &RunSummary) -> Result<()> {
    if summary.has_submission_failures() {
        return Err(ExitError::new(1, "at least one job submission failed").into());
    }
    Ok(())
}

pub async fn execute_samples(args: RunArgs, rerun: bool) -> Result<()> {
    let project = Arc::new(load_project(&args.project.looper_config, args.overrides())?);
    let store = Arc::new(args.compute_store(project.compute_package())?);
    let backend: Arc<dyn looper_status::StatusBackend> =
        Arc::from(looper_status::backend_for_project(&project)?);
    let summary = run_samples(project, store, backend, args.run_options(rerun)).await?;
    exit_on_failures(&summary)
}

pub async fn execute_project(args: RunArgs) -> Result<()> {
    let project = Arc::new(load_project(&args.project.looper_config, args.overrides())?);
    let store = Arc::new(args.compute_store(project.compute_package())?);
    let backend: Arc<dyn looper_status::StatusBackend> =
        Arc::from(looper_status::backend_for_project(&project)?);
    let summary = run_project_pipelines(project, store, backend, args.run_options(false)).await?;
    exit_on_failures(&summary)
}
