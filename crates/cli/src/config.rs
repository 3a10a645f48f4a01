// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Looper-config and PEP loading: the thin surface between the CLI and
//! the submission engine's project model.

use anyhow::{bail, Context, Result};
use indexmap::IndexMap;
use looper_core::{Project, ProjectConfig, Sample};
use serde_yaml::Value;
use std::path::{Path, PathBuf};

/// CLI-level knobs folded into the project.
#[derive(Debug, Default)]
pub struct ProjectOverrides {
    pub output_dir: Option<PathBuf>,
    pub dry_run: bool,
    pub skip_file_checks: bool,
    pub compute_package: Option<String>,
}

/// Load the looper config, its PEP, and build the project.
pub fn load_project(looper_config: &Path, overrides: ProjectOverrides) -> Result<Project> {
    let content = std::fs::read_to_string(looper_config)
        .with_context(|| format!("cannot read looper config {}", looper_config.display()))?;
    let raw: IndexMap<String, Value> = serde_yaml::from_str(&content)
        .with_context(|| format!("malformed looper config {}", looper_config.display()))?;
    let config_dir = looper_config
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."))
        .to_path_buf();

    let output_dir = match &overrides.output_dir {
        Some(dir) => dir.clone(),
        None => match raw.get("output_dir").and_then(Value::as_str) {
            Some(dir) => resolve(&config_dir, dir),
            None => bail!(
                "looper config {} does not define 'output_dir' (or pass --output-dir)",
                looper_config.display()
            ),
        },
    };

    let piface_sources = piface_sources(&raw);
    let pipestat = raw.get("pipestat").and_then(Value::as_mapping).map(|m| {
        m.iter()
            .filter_map(|(k, v)| k.as_str().map(|k| (k.to_string(), v.clone())))
            .collect::<IndexMap<String, Value>>()
    });

    let (pep_config, samples, pep_name) = load_samples(&raw, &config_dir)?;

    let name = raw
        .get("name")
        .and_then(Value::as_str)
        .map(String::from)
        .or(pep_name)
        .or_else(|| {
            config_dir
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
        })
        .unwrap_or_else(|| "project".to_string());

    let pipeline_config = raw
        .get("pipeline_config")
        .and_then(Value::as_str)
        .map(|p| resolve(&config_dir, p));

    Ok(Project::new(ProjectConfig {
        name,
        config_file: looper_config.to_path_buf(),
        pep_config,
        output_dir,
        piface_sources,
        raw_config: raw,
        samples,
        compute_package: overrides.compute_package,
        dry_run: overrides.dry_run,
        file_checks: !overrides.skip_file_checks,
        pipeline_config,
        pipestat,
    }))
}

fn resolve(base: &Path, raw: &str) -> PathBuf {
    let p = Path::new(raw);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base.join(p)
    }
}

/// `pipeline_interfaces` accepts a single path or a list of paths.
fn piface_sources(raw: &IndexMap<String, Value>) -> Vec<PathBuf> {
    match raw.get("pipeline_interfaces") {
        Some(Value::String(s)) => vec![PathBuf::from(s)],
        Some(Value::Sequence(seq)) => seq
            .iter()
            .filter_map(|v| v.as_str().map(PathBuf::from))
            .collect(),
        _ => Vec::new(),
    }
}

fn load_samples(
    raw: &IndexMap<String, Value>,
    config_dir: &Path,
) -> Result<(String, Vec<Sample>, Option<String>)> {
    // inline samples in the looper config itself
    if let Some(samples) = raw.get("samples") {
        return Ok((String::new(), samples_from_value(samples)?, None));
    }

    let Some(pep_config) = raw.get("pep_config").and_then(Value::as_str) else {
        bail!("looper config defines neither 'pep_config' nor inline 'samples'");
    };

    let pep_path = resolve(config_dir, pep_config);
    if !pep_path.exists() {
        if looks_like_registry_path(pep_config) {
            bail!(
                "'{}' looks like a PEP registry path; remote registry resolution is not supported",
                pep_config
            );
        }
        bail!("PEP config not found: {}", pep_path.display());
    }

    let content = std::fs::read_to_string(&pep_path)
        .with_context(|| format!("cannot read PEP config {}", pep_path.display()))?;
    let pep: IndexMap<String, Value> = serde_yaml::from_str(&content)
        .with_context(|| format!("malformed PEP config {}", pep_path.display()))?;
    let pep_name = pep.get("name").and_then(Value::as_str).map(String::from);

    let samples = if let Some(samples) = pep.get("samples") {
        samples_from_value(samples)?
    } else if let Some(table) = pep.get("sample_table").and_then(Value::as_str) {
        let pep_dir = pep_path.parent().unwrap_or(Path::new("."));
        samples_from_table(&resolve(pep_dir, table))?
    } else {
        bail!(
            "PEP config {} defines neither 'samples' nor 'sample_table'",
            pep_path.display()
        );
    };
    Ok((pep_path.display().to_string(), samples, pep_name))
}

fn samples_from_value(value: &Value) -> Result<Vec<Sample>> {
    let Value::Sequence(seq) = value else {
        bail!("'samples' must be a list of attribute mappings");
    };
    let mut samples = Vec::new();
    for entry in seq {
        let Value::Mapping(map) = entry else {
            bail!("every sample entry must be a mapping");
        };
        let attrs: IndexMap<String, Value> = map
            .iter()
            .filter_map(|(k, v)| k.as_str().map(|k| (k.to_string(), v.clone())))
            .collect();
        samples.push(Sample::from_attrs(attrs).context("invalid sample entry")?);
    }
    Ok(samples)
}

fn samples_from_table(path: &Path) -> Result<Vec<Sample>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("cannot read sample table {}", path.display()))?;
    let headers: Vec<String> = reader
        .headers()
        .with_context(|| format!("cannot read sample table header {}", path.display()))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut samples = Vec::new();
    for record in reader.records() {
        let record =
            record.with_context(|| format!("cannot parse sample table {}", path.display()))?;
        let attrs: IndexMap<String, Value> = headers
            .iter()
            .zip(record.iter())
            .filter(|(_, field)| !field.is_empty())
            .map(|(header, field)| (header.clone(), Value::String(field.to_string())))
            .collect();
        samples.push(
            Sample::from_attrs(attrs)
                .with_context(|| format!("invalid sample row in {}", path.display()))?,
        );
    }
    Ok(samples)
}

/// `user/name` or `user/name:tag`, with no such file on disk.
///
/// A dot in the name segment reads as a file extension, so
/// `configs/pep.yaml` stays a (missing) path rather than a registry ref.
fn looks_like_registry_path(source: &str) -> bool {
    let body = source.split_once(':').map_or(source, |(body, _)| body);
    let mut parts = body.split('/');
    matches!(
        (parts.next(), parts.next(), parts.next()),
        (Some(user), Some(name), None)
            if !user.is_empty() && !name.is_empty() && !name.contains('.')
    )
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
