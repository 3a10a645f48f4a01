// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project: the ordered sample collection plus run-wide configuration.

use crate::sample::Sample;
use indexmap::IndexMap;
use serde_yaml::Value;
use std::path::{Path, PathBuf};

/// Subdirectory of the output dir holding per-sample pipeline results.
pub const RESULTS_SUBDIR: &str = "results_pipeline";

/// Subdirectory of the output dir holding submission scripts and logs.
pub const SUBMISSION_SUBDIR: &str = "submission";

/// Configuration for constructing a [`Project`].
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    pub name: String,
    /// Path to the looper config file this project was loaded from.
    pub config_file: PathBuf,
    /// PEP source: a local path or a registry path `user/name[:tag]`.
    pub pep_config: String,
    pub output_dir: PathBuf,
    /// Pipeline-interface sources named at the project level.
    pub piface_sources: Vec<PathBuf>,
    /// The full parsed looper-config document, exposed to templates as
    /// the `project` namespace.
    pub raw_config: IndexMap<String, Value>,
    pub samples: Vec<Sample>,
    /// Name of the compute package to activate; None means "default".
    pub compute_package: Option<String>,
    pub dry_run: bool,
    /// Whether to stat input files named by input schemas.
    pub file_checks: bool,
    /// Optional pipeline config file passed through to templates.
    pub pipeline_config: Option<PathBuf>,
    /// Raw `pipestat` section of the looper config, if present.
    pub pipestat: Option<IndexMap<String, Value>>,
}

/// A project, read-only after construction.
#[derive(Debug, Clone)]
pub struct Project {
    config: ProjectConfig,
    results_subdir: PathBuf,
    submission_subdir: PathBuf,
}

impl Project {
    pub fn new(config: ProjectConfig) -> Self {
        let results_subdir = config.output_dir.join(RESULTS_SUBDIR);
        let submission_subdir = config.output_dir.join(SUBMISSION_SUBDIR);
        Project {
            config,
            results_subdir,
            submission_subdir,
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config_file(&self) -> &Path {
        &self.config.config_file
    }

    pub fn pep_config(&self) -> &str {
        &self.config.pep_config
    }

    pub fn output_dir(&self) -> &Path {
        &self.config.output_dir
    }

    pub fn results_folder(&self) -> &Path {
        &self.results_subdir
    }

    pub fn submission_folder(&self) -> &Path {
        &self.submission_subdir
    }

    pub fn samples(&self) -> &[Sample] {
        &self.config.samples
    }

    pub fn piface_sources(&self) -> &[PathBuf] {
        &self.config.piface_sources
    }

    pub fn compute_package(&self) -> Option<&str> {
        self.config.compute_package.as_deref()
    }

    pub fn dry_run(&self) -> bool {
        self.config.dry_run
    }

    pub fn file_checks(&self) -> bool {
        self.config.file_checks
    }

    pub fn pipeline_config(&self) -> Option<&Path> {
        self.config.pipeline_config.as_deref()
    }

    pub fn pipestat(&self) -> Option<&IndexMap<String, Value>> {
        self.config.pipestat.as_ref()
    }

    /// Project-wide command appendix from `looper.command_extra`.
    pub fn command_extra(&self) -> Option<&str> {
        self.looper_section()?.get("command_extra")?.as_str()
    }

    /// Compute-variable overrides from `looper.compute.resources`.
    pub fn compute_resources(&self) -> IndexMap<String, Value> {
        let Some(resources) = self
            .looper_section()
            .and_then(|looper| looper.get("compute"))
            .and_then(|compute| compute.get("resources"))
            .and_then(Value::as_mapping)
        else {
            return IndexMap::new();
        };
        resources
            .iter()
            .filter_map(|(k, v)| k.as_str().map(|k| (k.to_string(), v.clone())))
            .collect()
    }

    /// The `project` namespace for command templates: the raw config
    /// document with the project name injected.
    pub fn namespace(&self) -> IndexMap<String, Value> {
        let mut ns = self.config.raw_config.clone();
        ns.entry("name".to_string())
            .or_insert_with(|| Value::String(self.config.name.clone()));
        // Templates reference {project.looper.*}; keep the key present
        // even when the config omits the section.
        ns.entry("looper".to_string())
            .or_insert_with(|| Value::Mapping(Default::default()));
        ns
    }

    fn looper_section(&self) -> Option<&Value> {
        self.config.raw_config.get("looper")
    }
}

#[cfg(test)]
#[path = "project_tests.rs"]
mod tests;
