// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The run loop: route selected samples to conductors, drain the pools,
//! and aggregate per-sample failure reasons.

use crate::conductor::{ConductorConfig, SubmissionConductor};
use crate::error::{RunError, SubmitError};
use crate::selection::SampleSelector;
use crate::validate::{validate_config, validate_sample, ValidationError};
use indexmap::IndexMap;
use looper_compute::ComputeStore;
use looper_core::{Project, NOT_SUB_MSG, SUBMISSION_FAILURE_MESSAGE};
use looper_piface::{PipelineLevel, Router, SchemaKind};
use looper_status::StatusBackend;
use serde_yaml::Value;
use std::path::PathBuf;
use std::sync::Arc;

/// Options shared by `run`, `rerun`, and `runp`.
#[derive(Debug, Default, Clone)]
pub struct RunOptions {
    pub rerun: bool,
    pub ignore_flags: bool,
    /// Seconds to sleep between job submissions.
    pub time_delay: f64,
    pub command_extra: Option<String>,
    pub command_extra_override: Option<String>,
    /// Max commands per job (`--lump-n`).
    pub max_cmds: Option<usize>,
    /// Max cumulative input size per job in GB (`--lump-s`).
    pub max_size: Option<f64>,
    /// Max total jobs (`--lump-j`).
    pub max_jobs: Option<usize>,
    /// CLI compute overrides (`--compute k=v`).
    pub compute_overrides: IndexMap<String, Value>,
    pub selector: SampleSelector,
}

/// What a run did, for reporting and exit-code decisions.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub samples_valid: usize,
    pub samples_total: usize,
    pub commands_possible: usize,
    pub commands_submitted: usize,
    pub jobs_submitted: usize,
    pub dry_run: bool,
    /// Failure reason -> names of samples that hit it.
    pub failures: IndexMap<String, Vec<String>>,
}

impl RunSummary {
    /// Whether any sample had a submission command fail.
    pub fn has_submission_failures(&self) -> bool {
        self.failures
            .get(SUBMISSION_FAILURE_MESSAGE)
            .is_some_and(|samples| !samples.is_empty())
    }
}

fn conductor_config(options: &RunOptions, collate: bool) -> ConductorConfig {
    ConductorConfig {
        delay: options.time_delay,
        extra_args: options.command_extra.clone(),
        extra_args_override: options.command_extra_override.clone(),
        ignore_flags: options.ignore_flags,
        compute_variables: options.compute_overrides.clone(),
        max_cmds: options.max_cmds,
        max_size: options.max_size,
        max_jobs: options.max_jobs,
        automatic: true,
        collate,
    }
}

/// The main per-sample run loop (`run` and `rerun`).
pub async fn run_samples(
    project: Arc<Project>,
    store: Arc<ComputeStore>,
    backend: Arc<dyn StatusBackend>,
    options: RunOptions,
) -> Result<RunSummary, RunError> {
    let router = Router::build(&project)?;
    let active = router.active_sample_interfaces();

    // project-config validation against every matched pipeline schema;
    // an unreadable schema only warns, like an unreachable remote one
    for piface in &active {
        if let Some(schema) = piface.schema_path(PipelineLevel::Sample, SchemaKind::Input) {
            match validate_config(&project, &schema) {
                Ok(()) => {}
                Err(ValidationError::Read { .. }) => {
                    tracing::warn!(
                        schema = %schema.display(),
                        "could not read schema, skipping config validation"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    let mut conductors: IndexMap<PathBuf, SubmissionConductor> = IndexMap::new();
    for piface in &active {
        let Some(source) = piface.source() else {
            continue;
        };
        let conductor = SubmissionConductor::new(
            (*piface).clone(),
            Arc::clone(&project),
            Arc::clone(&store),
            Arc::clone(&backend),
            conductor_config(&options, false),
        )?;
        conductors.insert(source.to_path_buf(), conductor);
    }

    let mut summary = RunSummary {
        samples_total: project.samples().len(),
        commands_possible: router.max_commands(),
        dry_run: project.dry_run(),
        ..Default::default()
    };
    let mut failures_by_sample: IndexMap<String, Vec<String>> = IndexMap::new();

    let selected = options.selector.select(project.samples())?;
    let selected_count = selected.len();
    for (position, sample) in selected.into_iter().enumerate() {
        let pifaces = router.interfaces_for(sample.name());
        if pifaces.is_empty() {
            let reason = "No pipeline interfaces defined".to_string();
            tracing::warn!("{} {}", NOT_SUB_MSG, reason);
            failures_by_sample
                .entry(sample.name().to_string())
                .or_default()
                .push(reason);
            continue;
        }

        for piface in &pifaces {
            if let Some(schema) = piface.schema_path(PipelineLevel::Sample, SchemaKind::Input) {
                match validate_sample(sample, &schema) {
                    Ok(()) => {}
                    Err(ValidationError::Read { .. }) => {
                        tracing::warn!(
                            sample = sample.name(),
                            schema = %schema.display(),
                            "could not read schema, skipping sample validation"
                        );
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "short-circuiting due to validation error");
                        return Err(RunError::Validation(e));
                    }
                }
            }
        }
        summary.samples_valid += 1;

        for piface in pifaces {
            tracing::info!(
                "## [{} of {}] {} ({})",
                position + 1,
                selected_count,
                sample.name(),
                piface.pipeline_name
            );
            let Some(conductor) = piface
                .source()
                .and_then(|source| conductors.get_mut(source))
            else {
                continue;
            };
            match conductor.add_sample(sample, options.rerun).await {
                Ok(skip_reasons) => {
                    if !skip_reasons.is_empty() {
                        failures_by_sample
                            .entry(sample.name().to_string())
                            .or_default()
                            .extend(skip_reasons);
                    }
                }
                Err(SubmitError::JobSubmissionFailed { command, script }) => {
                    // failed samples are recorded on the conductor
                    tracing::error!(command, script, "job submission failed");
                }
                Err(SubmitError::Hook(e)) => {
                    tracing::error!(error = %e, "pre-submission hook failed; pool dropped");
                    failures_by_sample
                        .entry(sample.name().to_string())
                        .or_default()
                        .push("Pre-submission hook failed".to_string());
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    // drain remaining pools
    for conductor in conductors.values_mut() {
        match conductor.submit(true).await {
            Ok(_) => {}
            Err(SubmitError::JobSubmissionFailed { command, script }) => {
                tracing::error!(command, script, "job submission failed");
            }
            Err(e) => {
                tracing::error!(error = %e, "final pool drain failed");
            }
        }
    }

    for conductor in conductors.values() {
        summary.jobs_submitted += conductor.num_job_submissions();
        summary.commands_submitted += conductor.num_cmd_submissions();
        if !conductor.failed_samples().is_empty() {
            let failed = summary
                .failures
                .entry(SUBMISSION_FAILURE_MESSAGE.to_string())
                .or_default();
            for name in conductor.failed_samples() {
                if !failed.contains(name) {
                    failed.push(name.clone());
                }
            }
        }
    }
    for (sample, reasons) in failures_by_sample {
        for reason in reasons {
            let entry = summary.failures.entry(reason).or_default();
            if !entry.contains(&sample) {
                entry.push(sample.clone());
            }
        }
    }

    report(&summary);
    Ok(summary)
}

/// The project-level run loop (`runp`): one submission per project
/// pipeline, collating every sample into a single command render.
pub async fn run_project_pipelines(
    project: Arc<Project>,
    store: Arc<ComputeStore>,
    backend: Arc<dyn StatusBackend>,
    options: RunOptions,
) -> Result<RunSummary, RunError> {
    let router = Router::build(&project)?;
    let pifaces = router.project_interfaces();
    if pifaces.is_empty() {
        return Err(RunError::NoProjectInterfaces);
    }

    let mut summary = RunSummary {
        samples_total: project.samples().len(),
        commands_possible: pifaces.len(),
        dry_run: project.dry_run(),
        ..Default::default()
    };

    let total = pifaces.len();
    for (position, piface) in pifaces.into_iter().enumerate() {
        tracing::info!(
            "## [{} of {}] {} ({})",
            position + 1,
            total,
            project.name(),
            piface.pipeline_name
        );
        let mut conductor = SubmissionConductor::new(
            piface.clone(),
            Arc::clone(&project),
            Arc::clone(&store),
            Arc::clone(&backend),
            conductor_config(&options, true),
        )?;
        if !conductor.is_project_submittable(options.ignore_flags)? {
            continue;
        }
        conductor.add_project();
        match conductor.submit(false).await {
            Ok(_) => {}
            Err(SubmitError::JobSubmissionFailed { command, script }) => {
                tracing::error!(command, script, "job submission failed");
                summary
                    .failures
                    .entry(SUBMISSION_FAILURE_MESSAGE.to_string())
                    .or_default()
                    .push(project.name().to_string());
            }
            Err(e) => return Err(e.into()),
        }
        summary.jobs_submitted += conductor.num_job_submissions();
        summary.commands_submitted += conductor.num_cmd_submissions();
    }

    report(&summary);
    Ok(summary)
}

fn report(summary: &RunSummary) {
    tracing::info!("Looper finished");
    tracing::info!(
        "Samples valid for job generation: {} of {}",
        summary.samples_valid,
        summary.samples_total
    );
    tracing::info!(
        "Commands submitted: {} of {}",
        summary.commands_submitted,
        summary.commands_possible
    );
    if summary.dry_run {
        tracing::info!(
            "Dry run. No jobs were actually submitted, but {} would have been.",
            summary.jobs_submitted
        );
        tracing::info!("Jobs submitted: 0");
    } else {
        tracing::info!("Jobs submitted: {}", summary.jobs_submitted);
    }

    if let Some(failed) = summary.failures.get(SUBMISSION_FAILURE_MESSAGE) {
        tracing::info!(
            "{} samples with at least one failed job submission: {}",
            failed.len(),
            failed.join(", ")
        );
    }
    if !summary.failures.is_empty() {
        tracing::info!(
            "{} unique reasons for submission failure: {}",
            summary.failures.len(),
            summary
                .failures
                .keys()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        );
        for (reason, samples) in &summary.failures {
            tracing::info!("{}: {}", reason, samples.join(", "));
        }
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
