// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Template namespace assembly and merging.

use indexmap::IndexMap;
use looper_core::Project;
use serde_yaml::{Mapping, Value};
use std::path::Path;

/// The namespaces mapping handed to the template renderer: top-level
/// names (`project`, `sample`, `looper`, ...) to value trees.
pub type Namespaces = IndexMap<String, Value>;

/// Convert a flat string-keyed map into a YAML mapping value.
pub fn to_mapping(map: &IndexMap<String, Value>) -> Value {
    let mut out = Mapping::new();
    for (k, v) in map {
        out.insert(Value::String(k.clone()), v.clone());
    }
    Value::Mapping(out)
}

/// Inputs for building the `looper` namespace of one submission.
pub struct LooperContext<'a> {
    pub project: &'a Project,
    pub job_name: String,
    pub lump_name: String,
    pub total_input_size: f64,
    pub piface_dir: &'a Path,
}

/// Build the `looper` namespace: run-wide paths and the per-submission
/// job identity. `command` is appended after the command lines render.
pub fn build_looper_namespace(ctx: LooperContext<'_>) -> IndexMap<String, Value> {
    let project = ctx.project;
    let mut looper = IndexMap::new();
    let path_string = |p: &Path| Value::String(p.display().to_string());

    looper.insert("config_file".to_string(), path_string(project.config_file()));
    looper.insert(
        "pep_config".to_string(),
        Value::String(project.pep_config().to_string()),
    );
    looper.insert(
        "results_subdir".to_string(),
        path_string(project.results_folder()),
    );
    looper.insert(
        "submission_subdir".to_string(),
        path_string(project.submission_folder()),
    );
    looper.insert("output_dir".to_string(), path_string(project.output_dir()));
    looper.insert(
        "sample_output_folder".to_string(),
        path_string(&project.results_folder().join(&ctx.lump_name)),
    );
    looper.insert("job_name".to_string(), Value::String(ctx.job_name.clone()));
    looper.insert(
        "total_input_size".to_string(),
        Value::Number(serde_yaml::Number::from(ctx.total_input_size)),
    );
    looper.insert(
        "log_file".to_string(),
        path_string(&looper_core::submission_base(
            project.submission_folder(),
            &format!("{}.log", ctx.job_name),
        )),
    );
    looper.insert("piface_dir".to_string(), path_string(ctx.piface_dir));
    if let Some(pipeline_config) = project.pipeline_config() {
        looper.insert("pipeline_config".to_string(), path_string(pipeline_config));
    }
    looper
}

/// Deep-merge a two-level (namespace -> key -> value) update into the
/// namespaces, creating namespaces that do not exist yet.
pub fn merge_two_level(namespaces: &mut Namespaces, update: &IndexMap<String, Value>) {
    for (name, patch) in update {
        let Value::Mapping(patch) = patch else {
            continue;
        };
        let entry = namespaces
            .entry(name.clone())
            .or_insert_with(|| Value::Mapping(Mapping::new()));
        if !matches!(entry, Value::Mapping(_)) {
            *entry = Value::Mapping(Mapping::new());
        }
        if let Value::Mapping(existing) = entry {
            for (k, v) in patch {
                existing.insert(k.clone(), v.clone());
            }
        }
    }
}

/// Overwrite one key inside a namespace mapping.
pub fn set_in_namespace(namespaces: &mut Namespaces, name: &str, key: &str, value: Value) {
    let entry = namespaces
        .entry(name.to_string())
        .or_insert_with(|| Value::Mapping(Mapping::new()));
    if let Value::Mapping(map) = entry {
        map.insert(Value::String(key.to_string()), value);
    }
}

#[cfg(test)]
#[path = "namespaces_tests.rs"]
mod tests;
