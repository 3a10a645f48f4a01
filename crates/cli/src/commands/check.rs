// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `looper check`: tabulate pipeline status per sample.

use crate::commands::{ProjectArgs, SelectionArgs};
use crate::config::{load_project, ProjectOverrides};
use crate::table;
use anyhow::Result;
use clap::Args;
use indexmap::IndexMap;
use looper_piface::Router;

#[derive(Debug, Args)]
pub struct CheckArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Also list each sample's status
    #[arg(long)]
    pub itemized: bool,
}

pub fn execute(args: CheckArgs) -> Result<()> {
    let project = load_project(
        &args.project.looper_config,
        ProjectOverrides {
            output_dir: args.project.output_dir.clone(),
            ..Default::default()
        },
    )?;
    let backend = looper_status::backend_for_project(&project)?;
    let router = Router::build(&project)?;
    let selector = args.selection.to_selector();

    // pipeline name -> sample name -> status
    let mut statuses: IndexMap<String, IndexMap<String, String>> = IndexMap::new();
    for sample in selector.select(project.samples())? {
        for piface in router.interfaces_for(sample.name()) {
            let observed = backend.get_status(sample.name(), &piface.pipeline_name)?;
            let status = observed
                .first()
                .cloned()
                .unwrap_or_else(|| "unknown".to_string());
            statuses
                .entry(piface.pipeline_name.clone())
                .or_default()
                .insert(sample.name().to_string(), status);
        }
    }

    for (pipeline, by_sample) in &statuses {
        let total = by_sample.len();
        let mut counts: IndexMap<&str, usize> = IndexMap::new();
        for status in by_sample.values() {
            *counts.entry(status.as_str()).or_default() += 1;
        }
        let rows: Vec<(String, String)> = counts
            .iter()
            .map(|(status, count)| (status.to_string(), format!("{count}/{total}")))
            .collect();
        println!(
            "{}",
            table::render(
                &format!("'{pipeline}' pipeline status summary"),
                ("Status", "Jobs count/total jobs"),
                &rows,
            )
        );

        if args.itemized {
            let rows: Vec<(String, String)> = by_sample
                .iter()
                .map(|(sample, status)| (sample.clone(), status.clone()))
                .collect();
            println!(
                "{}",
                table::render(
                    &format!("Pipeline: '{pipeline}'"),
                    ("Sample name", "Status"),
                    &rows,
                )
            );
        }
    }

    if statuses.is_empty() {
        println!("No pipeline status found for this project.");
    }
    Ok(())
}
