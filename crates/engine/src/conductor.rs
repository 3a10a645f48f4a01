// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The submission conductor: a per-pipeline pool of samples that fills
//! until a capacity criterion is met, then renders and dispatches one
//! submission script for the pool.

use crate::dispatch::{self, InterruptGuard};
use crate::error::SubmitError;
use crate::hooks;
use crate::namespaces::{
    build_looper_namespace, set_in_namespace, to_mapping, LooperContext, Namespaces,
};
use crate::render::{render_template, render_var_templates};
use crate::validate::{input_file_sizes, populate_sample_paths};
use indexmap::IndexMap;
use looper_compute::ComputeStore;
use looper_core::flags::{any_contains, Flag};
use looper_core::{Project, Sample, NOT_SUB_MSG};
use looper_piface::{
    choose_resource_package, PipelineInterface, PipelineLevel, ResourceError, SchemaKind,
    SectionDef,
};
use looper_status::StatusBackend;
use serde_yaml::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Appendix for sample commands: the sample's own `command_extra`.
const EXTRA_SAMPLE_CMD_TEMPLATE: &str =
    "{%- if sample.command_extra is defined %} {sample.command_extra}{% endif -%}";

/// Appendix for collate commands: the project-wide `command_extra`.
const EXTRA_PROJECT_CMD_TEMPLATE: &str =
    "{%- if project.looper.command_extra is defined %} {project.looper.command_extra}{% endif -%}";

/// Construction-time knobs for a conductor.
#[derive(Debug, Default, Clone)]
pub struct ConductorConfig {
    /// Seconds to wait after each dispatched job.
    pub delay: f64,
    /// Free-form string appended to every generated command.
    pub extra_args: Option<String>,
    /// Like `extra_args`, but also suppresses the per-sample/project
    /// `command_extra` appendixes.
    pub extra_args_override: Option<String>,
    pub ignore_flags: bool,
    /// CLI-level compute overrides (highest precedence).
    pub compute_variables: IndexMap<String, Value>,
    /// Upper bound on commands per job script.
    pub max_cmds: Option<usize>,
    /// Upper bound on cumulative input size (GB) per job script.
    pub max_size: Option<f64>,
    /// Upper bound on total jobs; converts to a command bound.
    pub max_jobs: Option<usize>,
    /// Submit automatically when the pool fills.
    pub automatic: bool,
    /// One submission per project instead of per sample.
    pub collate: bool,
}

/// Per-pipeline submission state machine.
pub struct SubmissionConductor {
    piface: PipelineInterface,
    project: Arc<Project>,
    store: Arc<ComputeStore>,
    backend: Arc<dyn StatusBackend>,
    level: PipelineLevel,
    collate: bool,
    automatic: bool,
    delay: f64,
    ignore_flags: bool,
    extra_args: Option<String>,
    override_extra: bool,
    compute_variables: IndexMap<String, Value>,
    max_cmds: Option<usize>,
    max_size: f64,
    interrupts: InterruptGuard,

    pool: Vec<Sample>,
    pool_size: f64,
    skip_pool: Vec<Sample>,
    skip_pool_size: f64,
    project_pending: bool,

    num_good_submissions: usize,
    num_total_submissions: usize,
    num_cmds_submitted: usize,
    failed_sample_names: Vec<String>,
}

impl SubmissionConductor {
    pub fn new(
        piface: PipelineInterface,
        project: Arc<Project>,
        store: Arc<ComputeStore>,
        backend: Arc<dyn StatusBackend>,
        config: ConductorConfig,
    ) -> Result<Self, SubmitError> {
        let collate = config.collate;
        let level = if collate {
            PipelineLevel::Project
        } else {
            PipelineLevel::Sample
        };

        let mut max_cmds = config.max_cmds;
        if let Some(max_jobs) = config.max_jobs {
            if max_jobs == 0 {
                return Err(SubmitError::BadBounds(
                    "max job count must be a positive integer".to_string(),
                ));
            }
            let num_samples = project.samples().len();
            max_cmds = Some(num_samples.div_ceil(max_jobs).max(1));
        }
        if !collate {
            if max_cmds.is_none() && config.max_size.is_none() {
                max_cmds = Some(1);
            }
            if matches!(max_cmds, Some(0)) {
                return Err(SubmitError::BadBounds(
                    "max per-job command count must be positive".to_string(),
                ));
            }
            if config.max_size.is_some_and(|s| s < 0.0) {
                return Err(SubmitError::BadBounds(
                    "max per-job total file size must be nonnegative".to_string(),
                ));
            }
        }

        let (extra_args, override_extra) = match config.extra_args_override {
            Some(extra) => (Some(extra), true),
            None => (config.extra_args, false),
        };
        if let Some(extra) = &extra_args {
            tracing::debug!(extra = extra.as_str(), "string appended to every pipeline command");
        }

        Ok(SubmissionConductor {
            piface,
            project,
            store,
            backend,
            level,
            collate,
            automatic: config.automatic,
            delay: config.delay,
            ignore_flags: config.ignore_flags,
            extra_args,
            override_extra,
            compute_variables: config.compute_variables,
            max_cmds,
            max_size: config.max_size.unwrap_or(f64::INFINITY),
            interrupts: InterruptGuard::install()?,
            pool: Vec::new(),
            pool_size: 0.0,
            skip_pool: Vec::new(),
            skip_pool_size: 0.0,
            project_pending: false,
            num_good_submissions: 0,
            num_total_submissions: 0,
            num_cmds_submitted: 0,
            failed_sample_names: Vec::new(),
        })
    }

    pub fn pipeline_name(&self) -> &str {
        &self.piface.pipeline_name
    }

    /// Commands this conductor has submitted (rendered and pooled into
    /// dispatched or dry-run scripts).
    pub fn num_cmd_submissions(&self) -> usize {
        self.num_cmds_submitted
    }

    /// Jobs this conductor has submitted (or would have, under dry run).
    pub fn num_job_submissions(&self) -> usize {
        self.num_good_submissions
    }

    pub fn failed_samples(&self) -> &[String] {
        &self.failed_sample_names
    }

    pub fn pool_len(&self) -> usize {
        self.pool.len()
    }

    pub fn pool_size(&self) -> f64 {
        self.pool_size
    }

    fn is_full(&self, pool_len: usize, size: f64) -> bool {
        self.max_cmds == Some(pool_len) || size >= self.max_size
    }

    fn section(&self) -> Result<&SectionDef, SubmitError> {
        self.piface.section(self.level).ok_or_else(|| {
            SubmitError::BadBounds(format!(
                "pipeline '{}' has no {} section",
                self.piface.pipeline_name,
                self.level.section_key()
            ))
        })
    }

    /// Whether the project-level pipeline still needs a submission.
    pub fn is_project_submittable(&self, force: bool) -> Result<bool, SubmitError> {
        if self.backend.supports_set() {
            let statuses = self
                .backend
                .get_status(self.project.name(), &self.piface.pipeline_name)?;
            if !force && !statuses.is_empty() {
                tracing::info!(
                    status = statuses.join(", "),
                    "> Skipping project. Determined status"
                );
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Queue the project itself for a collate submission.
    pub fn add_project(&mut self) {
        self.project_pending = true;
    }

    /// Consider a sample for submission.
    ///
    /// Returns the skip reasons recorded for the sample; an empty vector
    /// means the sample joined the pool.
    pub async fn add_sample(
        &mut self,
        sample: &Sample,
        rerun: bool,
    ) -> Result<Vec<String>, SubmitError> {
        tracing::debug!(
            sample = sample.name(),
            pipeline = self.piface.pipeline_name.as_str(),
            rerun,
            "considering sample for submission"
        );

        let mut statuses = self
            .backend
            .get_status(sample.name(), &self.piface.pipeline_name)?;
        // rescue a failed record before the admission decision
        if rerun
            && self.backend.supports_set()
            && statuses.iter().any(|s| s == Flag::Failed.as_str())
        {
            self.backend
                .set_status(sample.name(), &self.piface.pipeline_name, Flag::Waiting.as_str())?;
            statuses = vec![Flag::Waiting.as_str().to_string()];
        }

        let mut use_this_sample = true;
        let mut msg = None;
        if rerun && statuses.is_empty() {
            msg = Some(
                "> Skipping sample because rerun requested, but no failed or waiting flag found."
                    .to_string(),
            );
            use_this_sample = false;
        }
        if !statuses.is_empty() {
            let status_str = statuses.join(", ");
            let failed_flag = any_contains(&statuses, Flag::Failed);
            let waiting_flag = any_contains(&statuses, Flag::Waiting);
            if self.ignore_flags {
                msg = Some(format!("> Found existing status: {status_str}. Ignoring."));
            } else {
                let mut skip_msg = format!("> Found existing status: {status_str}. Skipping sample.");
                if failed_flag && !rerun {
                    skip_msg.push_str(" Use rerun to ignore failed status.");
                }
                msg = Some(skip_msg);
                use_this_sample = false;
            }
            if rerun {
                if failed_flag || waiting_flag {
                    msg = Some(format!("> Re-running sample. Status: {status_str}"));
                    use_this_sample = true;
                } else {
                    msg = Some(format!(
                        "> Skipping sample because rerun requested, but no failed or waiting flag found. Status: {status_str}"
                    ));
                    use_this_sample = false;
                }
            }
        }
        if let Some(msg) = msg {
            tracing::info!("{}", msg);
        }

        let mut skip_reasons = Vec::new();
        let mut input_size_gb = 0.0;
        if self.project.file_checks() {
            if let Some(schema) = self.piface.schema_path(self.level, SchemaKind::Input) {
                match input_file_sizes(sample, &schema) {
                    Ok(sizing) => {
                        input_size_gb = sizing.total_gb;
                        if !sizing.missing.is_empty() {
                            tracing::warn!(
                                "{} Missing files: {}",
                                NOT_SUB_MSG,
                                sizing.missing.join(", ")
                            );
                            if use_this_sample {
                                skip_reasons.push("Missing files".to_string());
                            }
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "could not read schema, skipping inputs validation");
                    }
                }
            }
        }

        if use_this_sample && skip_reasons.is_empty() {
            self.pool.push(sample.clone());
            self.pool_size += input_size_gb;
            if self.automatic && self.is_full(self.pool.len(), self.pool_size) {
                self.submit(false).await?;
            }
        } else {
            self.skip_pool.push(sample.clone());
            self.skip_pool_size += input_size_gb;
            // a script is still written for rejected samples, as a record
            let skip_pool = self.skip_pool.clone();
            let skip_size = self.skip_pool_size;
            if let Err(e) = self.write_script(&skip_pool, skip_size, true).await {
                tracing::warn!(error = %e, "could not write script for skipped sample");
            }
            self.skip_pool.clear();
            self.skip_pool_size = 0.0;
        }
        Ok(skip_reasons)
    }

    /// Submit the pooled commands as one job if the pool is full, the
    /// submission is forced, or this is a collate conductor.
    pub async fn submit(&mut self, force: bool) -> Result<bool, SubmitError> {
        if self.collate {
            if !self.project_pending {
                return Ok(false);
            }
        } else if self.pool.is_empty() {
            tracing::debug!(
                pipeline = self.piface.pipeline_name.as_str(),
                "no submission (no pooled samples)"
            );
            return Ok(false);
        }

        if !(self.collate || force || self.is_full(self.pool.len(), self.pool_size)) {
            tracing::debug!(
                pipeline = self.piface.pipeline_name.as_str(),
                "no submission (pool is not full and submission was not forced)"
            );
            return Ok(false);
        }

        if !self.collate {
            if let Some(schema) = self.piface.schema_path(self.level, SchemaKind::Output) {
                for sample in &mut self.pool {
                    populate_sample_paths(sample, &schema)?;
                }
            }
        }

        let pool = self.pool.clone();
        let size = self.pool_size;
        let (script, rendered_count) = match self.write_script(&pool, size, false).await {
            Ok(outcome) => outcome,
            Err(e) => {
                self.reset_pool();
                return Err(e);
            }
        };
        tracing::info!(
            "Job script (n={}; {:.2} Gb): {}",
            pool.len(),
            size,
            script.display()
        );

        if self.project.dry_run() {
            tracing::info!("Dry run, not submitted");
        } else if rendered_count > 0 {
            let sub_cmd = self.store.submission_command()?.to_string();
            let command_line = format!("{} {}", sub_cmd, script.display());
            let status = dispatch::run_submission(&command_line, &mut self.interrupts).await?;
            if !status.success() {
                if !self.collate {
                    self.failed_sample_names
                        .extend(pool.iter().map(|s| s.name().to_string()));
                }
                self.reset_pool();
                return Err(SubmitError::JobSubmissionFailed {
                    command: sub_cmd,
                    script: script.display().to_string(),
                });
            }
            if self.delay > 0.0 {
                tokio::time::sleep(Duration::from_secs_f64(self.delay)).await;
            }
        }

        let submitted = rendered_count > 0;
        if submitted {
            self.num_cmds_submitted += rendered_count;
            self.num_good_submissions += 1;
        }
        self.reset_pool();
        Ok(submitted)
    }

    /// Render the commands for a pool and write its submission script.
    ///
    /// Returns the script path and how many commands rendered; a sample
    /// whose template hits an undefined variable is logged and excluded
    /// without aborting the rest of the pool.
    async fn write_script(
        &mut self,
        pool: &[Sample],
        size: f64,
        is_skip: bool,
    ) -> Result<(PathBuf, usize), SubmitError> {
        let section = self.section()?.clone();
        let lump_name = self.lump_name(pool);
        let job_name = format!("{}_{}", self.piface.pipeline_name, lump_name);
        let piface_dir = self.piface.dir();

        let mut looper = build_looper_namespace(LooperContext {
            project: &self.project,
            job_name: job_name.clone(),
            lump_name,
            total_input_size: size,
            piface_dir: &piface_dir,
        });

        let mut namespaces: Namespaces = IndexMap::new();
        namespaces.insert(
            "project".to_string(),
            to_mapping(&self.project.namespace()),
        );
        namespaces.insert("looper".to_string(), to_mapping(&looper));
        namespaces.insert("pipeline".to_string(), to_mapping(&self.piface.namespace()));
        let mut compute_vars = self.store.active_vars()?;
        namespaces.insert("compute".to_string(), to_mapping(&compute_vars));

        let mut template = section.command_template.clone();
        if !self.override_extra {
            template.push_str(if self.collate {
                EXTRA_PROJECT_CMD_TEMPLATE
            } else {
                EXTRA_SAMPLE_CMD_TEMPLATE
            });
        }

        let per_command: Vec<Option<&Sample>> = if self.collate {
            vec![None]
        } else {
            pool.iter().map(Some).collect()
        };

        let mut commands = Vec::new();
        let mut rendered_count = 0usize;
        for sample in per_command {
            match sample {
                Some(sample) => {
                    namespaces.insert("sample".to_string(), to_mapping(sample.attrs()));
                }
                None => {
                    let samples: Vec<Value> = self
                        .project
                        .samples()
                        .iter()
                        .map(|s| to_mapping(s.attrs()))
                        .collect();
                    namespaces.insert("samples".to_string(), Value::Sequence(samples));
                }
            }
            let record_id = sample.map_or_else(|| self.project.name(), Sample::name);
            namespaces.insert(
                "pipestat".to_string(),
                to_mapping(&self.backend.namespace(record_id)),
            );

            let resources = self
                .pick_resources(&section, &namespaces, size)
                .await?;
            for (k, v) in resources {
                compute_vars.insert(k, v);
            }
            namespaces.insert("compute".to_string(), to_mapping(&compute_vars));

            let var_templates = match render_var_templates(&self.piface.var_templates, &namespaces)
            {
                Ok(rendered) => rendered,
                Err(e) => {
                    tracing::warn!("{} {}", NOT_SUB_MSG, e);
                    continue;
                }
            };
            set_in_namespace(
                &mut namespaces,
                "pipeline",
                "var_templates",
                to_mapping(&var_templates),
            );

            if let Some(pre_submit) = &section.pre_submit {
                hooks::exec_pre_submit(pre_submit, &mut namespaces).await?;
            }

            match render_template(&template, &namespaces) {
                Ok(argstring) => {
                    let command = match self.extra_args.as_deref() {
                        Some(extra) if !extra.is_empty() => format!("{argstring} {extra}"),
                        _ => argstring,
                    };
                    commands.push(command);
                    rendered_count += 1;
                }
                Err(e) => {
                    // TemplateUndefined is local to the sample: log and
                    // carry on with the rest of the pool
                    tracing::warn!("{} {}", NOT_SUB_MSG, e);
                }
            }
        }

        looper.insert(
            "command".to_string(),
            Value::String(commands.join("\n")),
        );
        if !is_skip {
            self.num_total_submissions += 1;
        }

        let script_path = looper_core::submission_base(
            self.project.submission_folder(),
            &format!("{job_name}.sub"),
        );
        let extra_vars: IndexMap<String, Value> =
            [("looper".to_string(), to_mapping(&looper))]
                .into_iter()
                .collect();
        let written = self
            .store
            .write_script(&script_path, &compute_vars, &[extra_vars])?;
        Ok((written, rendered_count))
    }

    async fn pick_resources(
        &self,
        section: &SectionDef,
        namespaces: &Namespaces,
        size: f64,
    ) -> Result<IndexMap<String, Value>, SubmitError> {
        let dynamic = match section
            .compute
            .as_ref()
            .and_then(|c| c.dynamic_variables_command_template.as_deref())
        {
            Some(template) => {
                let command = render_template(template, namespaces)
                    .map_err(|e| ResourceError::Dynamic(e.to_string()))?;
                tracing::debug!(command = command.as_str(), "running dynamic compute variables command");
                let update = hooks::run_json_command(&command)
                    .await
                    .map_err(|e| ResourceError::Dynamic(e.to_string()))?;
                Some(update)
            }
            None => None,
        };

        let project_resources = self.project.compute_resources();
        let package = choose_resource_package(
            &self.piface,
            section,
            &project_resources,
            &self.compute_variables,
            size,
            move |_| {
                dynamic.ok_or_else(|| ResourceError::Dynamic("dynamic result missing".to_string()))
            },
        )?;
        Ok(package)
    }

    /// Job-name component for this pool: the sample for single-command
    /// jobs, the project for collate jobs, `lumpN` for batches.
    fn lump_name(&self, pool: &[Sample]) -> String {
        if self.collate {
            return self.project.name().to_string();
        }
        if self.max_cmds == Some(1) {
            if let Some(sample) = pool.first() {
                return sample.name().to_string();
            }
        }
        format!("lump{}", self.num_total_submissions + 1)
    }

    fn reset_pool(&mut self) {
        self.pool.clear();
        self.pool_size = 0.0;
        self.project_pending = false;
    }
}

#[cfg(test)]
#[path = "conductor_tests.rs"]
mod tests;
