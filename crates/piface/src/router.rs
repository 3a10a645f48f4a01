// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sample-to-pipeline routing over a project's interface sources.

use crate::interface::{PipelineInterface, PipelineLevel};
use indexmap::IndexMap;
use looper_core::Project;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors building the project's routing indexes.
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("duplicate pipeline name '{name}' across pipeline interfaces {first} and {second}")]
    DuplicatePipelineName {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("linked pipeline interface '{link}' of {piface} does not match any sample-level interface in use")]
    UnresolvedLinkedInterface { piface: PathBuf, link: String },
}

/// Routing indexes: which samples use which pipeline interfaces.
///
/// Interfaces are loaded once per unique source; sources that fail to
/// parse are logged and skipped, so a bad interface disables its
/// pipeline rather than the whole run.
#[derive(Debug)]
pub struct Router {
    interfaces: Vec<PipelineInterface>,
    /// Source path -> names of samples routed to that interface.
    samples_by_interface: IndexMap<PathBuf, Vec<String>>,
    /// Sample name -> indexes into `interfaces`, in selection order.
    interfaces_by_sample: IndexMap<String, Vec<usize>>,
    /// Indexes of interfaces named at the project level.
    project_listed: Vec<usize>,
}

impl Router {
    /// Build routing indexes for a project.
    pub fn build(project: &Project) -> Result<Self, RouterError> {
        let config_dir = project
            .config_file()
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();

        let mut interfaces: Vec<PipelineInterface> = Vec::new();
        let mut by_source: IndexMap<PathBuf, usize> = IndexMap::new();
        let mut invalid: HashSet<PathBuf> = HashSet::new();
        let mut project_listed = Vec::new();

        let mut load = |source: PathBuf,
                        interfaces: &mut Vec<PipelineInterface>,
                        by_source: &mut IndexMap<PathBuf, usize>,
                        invalid: &mut HashSet<PathBuf>|
         -> Option<usize> {
            if let Some(idx) = by_source.get(&source) {
                return Some(*idx);
            }
            if invalid.contains(&source) {
                return None;
            }
            match PipelineInterface::from_file(&source) {
                Ok(piface) => {
                    let idx = interfaces.len();
                    interfaces.push(piface);
                    by_source.insert(source, idx);
                    Some(idx)
                }
                Err(e) => {
                    tracing::warn!(
                        source = %source.display(),
                        error = %e,
                        "ignoring invalid pipeline interface source"
                    );
                    invalid.insert(source);
                    None
                }
            }
        };

        for source in project.piface_sources() {
            let resolved = resolve_source(&config_dir, source);
            if let Some(idx) = load(resolved, &mut interfaces, &mut by_source, &mut invalid) {
                project_listed.push(idx);
            }
        }

        let mut interfaces_by_sample: IndexMap<String, Vec<usize>> = IndexMap::new();
        let mut samples_by_interface: IndexMap<PathBuf, Vec<String>> = IndexMap::new();

        for sample in project.samples() {
            let mut selected: Vec<usize> = Vec::new();

            for raw in sample.piface_sources() {
                let resolved = resolve_source(&config_dir, Path::new(&raw));
                if let Some(idx) = load(resolved, &mut interfaces, &mut by_source, &mut invalid) {
                    if interfaces[idx].section(PipelineLevel::Sample).is_some()
                        && !selected.contains(&idx)
                    {
                        selected.push(idx);
                    }
                }
            }

            for &idx in &project_listed {
                let piface = &interfaces[idx];
                if piface.section(PipelineLevel::Sample).is_some()
                    && piface.accepts_protocol(sample.protocol())
                    && !selected.contains(&idx)
                {
                    selected.push(idx);
                }
            }

            for &idx in &selected {
                if let Some(source) = interfaces[idx].source() {
                    samples_by_interface
                        .entry(source.to_path_buf())
                        .or_default()
                        .push(sample.name().to_string());
                }
            }
            interfaces_by_sample.insert(sample.name().to_string(), selected);
        }

        check_duplicate_names(&interfaces)?;

        let router = Router {
            interfaces,
            samples_by_interface,
            interfaces_by_sample,
            project_listed,
        };
        router.check_linked_interfaces(&config_dir)?;
        Ok(router)
    }

    /// Sample-level interfaces in use by at least one sample, in first-use
    /// order. Conductors are created per entry.
    pub fn active_sample_interfaces(&self) -> Vec<&PipelineInterface> {
        let mut seen = HashSet::new();
        let mut active = Vec::new();
        for selected in self.interfaces_by_sample.values() {
            for &idx in selected {
                if seen.insert(idx) {
                    active.push(&self.interfaces[idx]);
                }
            }
        }
        active
    }

    /// Project-level interfaces named in the project config.
    pub fn project_interfaces(&self) -> Vec<&PipelineInterface> {
        self.project_listed
            .iter()
            .map(|&idx| &self.interfaces[idx])
            .filter(|p| p.section(PipelineLevel::Project).is_some())
            .collect()
    }

    /// Interfaces routed to the named sample, in selection order.
    pub fn interfaces_for(&self, sample_name: &str) -> Vec<&PipelineInterface> {
        self.interfaces_by_sample
            .get(sample_name)
            .map(|selected| selected.iter().map(|&idx| &self.interfaces[idx]).collect())
            .unwrap_or_default()
    }

    /// Source path -> sample names routed to that interface.
    pub fn samples_by_interface(&self) -> &IndexMap<PathBuf, Vec<String>> {
        &self.samples_by_interface
    }

    /// Total number of (sample, pipeline) pairs: the command ceiling.
    pub fn max_commands(&self) -> usize {
        self.samples_by_interface.values().map(Vec::len).sum()
    }

    fn check_linked_interfaces(&self, config_dir: &Path) -> Result<(), RouterError> {
        for piface in self.project_interfaces() {
            for link in &piface.linked_pipeline_interfaces {
                let resolved = resolve_source(config_dir, Path::new(link));
                if !self.samples_by_interface.contains_key(&resolved) {
                    return Err(RouterError::UnresolvedLinkedInterface {
                        piface: piface.source().unwrap_or(Path::new("?")).to_path_buf(),
                        link: link.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

fn check_duplicate_names(interfaces: &[PipelineInterface]) -> Result<(), RouterError> {
    let mut seen: IndexMap<&str, &PipelineInterface> = IndexMap::new();
    for piface in interfaces {
        if let Some(prev) = seen.insert(&piface.pipeline_name, piface) {
            return Err(RouterError::DuplicatePipelineName {
                name: piface.pipeline_name.clone(),
                first: prev.source().unwrap_or(Path::new("?")).to_path_buf(),
                second: piface.source().unwrap_or(Path::new("?")).to_path_buf(),
            });
        }
    }
    Ok(())
}

/// Resolve an interface source against the project config directory,
/// preferring the canonical path so one file has one identity.
fn resolve_source(config_dir: &Path, source: &Path) -> PathBuf {
    let joined = if source.is_absolute() {
        source.to_path_buf()
    } else {
        config_dir.join(source)
    };
    std::fs::canonicalize(&joined).unwrap_or(joined)
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
