// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Input-schema checks: sample validation, project-config validation,
//! and input file sizing.

use looper_core::{Project, Sample};
use serde_yaml::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Errors reading schemas or validating against them.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("failed to read schema {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("schema parse error in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("invalid schema {path}: {message}")]
    InvalidSchema { path: PathBuf, message: String },

    #[error("sample '{sample}' failed validation against {schema}: {message}")]
    SampleInvalid {
        sample: String,
        schema: PathBuf,
        message: String,
    },

    #[error("project config failed validation against {schema}: {message}")]
    ConfigInvalid { schema: PathBuf, message: String },
}

/// Result of sizing a sample's schema-declared input files.
#[derive(Debug, Default)]
pub struct InputSizing {
    /// Total size of existing input files, in gigabytes.
    pub total_gb: f64,
    /// Required files that do not exist on disk.
    pub missing: Vec<String>,
}

fn read_schema_doc(path: &Path) -> Result<Value, ValidationError> {
    let content = std::fs::read_to_string(path).map_err(|source| ValidationError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&content).map_err(|source| ValidationError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// The per-sample subschema: `properties.samples.items` when present,
/// the document itself otherwise.
fn items_subschema(doc: &Value) -> &Value {
    doc.get("properties")
        .and_then(|p| p.get("samples"))
        .and_then(|s| s.get("items"))
        .unwrap_or(doc)
}

fn to_json(value: &Value) -> Result<serde_json::Value, String> {
    serde_json::to_value(value).map_err(|e| e.to_string())
}

fn check_against(
    schema_path: &Path,
    schema: &Value,
    instance: &serde_json::Value,
) -> Result<Result<(), String>, ValidationError> {
    let schema_json = to_json(schema).map_err(|message| ValidationError::InvalidSchema {
        path: schema_path.to_path_buf(),
        message,
    })?;
    let validator =
        jsonschema::validator_for(&schema_json).map_err(|e| ValidationError::InvalidSchema {
            path: schema_path.to_path_buf(),
            message: e.to_string(),
        })?;
    let result = match validator.iter_errors(instance).next() {
        None => Ok(()),
        Some(error) => Err(error.to_string()),
    };
    Ok(result)
}

/// Validate one sample against a pipeline's input schema.
pub fn validate_sample(sample: &Sample, schema_path: &Path) -> Result<(), ValidationError> {
    let doc = read_schema_doc(schema_path)?;
    let subschema = items_subschema(&doc);
    let instance = serde_json::to_value(sample.attrs()).map_err(|e| {
        ValidationError::InvalidSchema {
            path: schema_path.to_path_buf(),
            message: e.to_string(),
        }
    })?;
    match check_against(schema_path, subschema, &instance)? {
        Ok(()) => Ok(()),
        Err(message) => Err(ValidationError::SampleInvalid {
            sample: sample.name().to_string(),
            schema: schema_path.to_path_buf(),
            message,
        }),
    }
}

/// Validate the project config against an input schema, with the
/// samples section excluded.
pub fn validate_config(project: &Project, schema_path: &Path) -> Result<(), ValidationError> {
    let mut doc = read_schema_doc(schema_path)?;
    // strip sample requirements; only config-level keys apply here
    if let Some(Value::Mapping(properties)) = doc.get_mut("properties") {
        properties.remove(Value::String("samples".to_string()));
    }
    if let Some(Value::Sequence(required)) = doc.get_mut("required") {
        required.retain(|v| v.as_str() != Some("samples"));
    }

    let instance = serde_json::to_value(project.namespace()).map_err(|e| {
        ValidationError::InvalidSchema {
            path: schema_path.to_path_buf(),
            message: e.to_string(),
        }
    })?;
    match check_against(schema_path, &doc, &instance)? {
        Ok(()) => Ok(()),
        Err(message) => Err(ValidationError::ConfigInvalid {
            schema: schema_path.to_path_buf(),
            message,
        }),
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Sequence(seq)) => seq
            .iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect(),
        _ => Vec::new(),
    }
}

fn paths_of_attr(sample: &Sample, attr: &str) -> Vec<String> {
    match sample.get(attr) {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Sequence(seq)) => seq
            .iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect(),
        _ => Vec::new(),
    }
}

/// Resolve and size the input files an input schema names for a sample.
///
/// The schema's `files` and `required_files` lists name sample
/// attributes holding file paths. Existing files contribute to the
/// total; required files that do not exist are reported missing.
pub fn input_file_sizes(sample: &Sample, schema_path: &Path) -> Result<InputSizing, ValidationError> {
    let doc = read_schema_doc(schema_path)?;
    let subschema = items_subschema(&doc);
    let files = string_list(subschema.get("files"));
    let required_files = string_list(subschema.get("required_files"));

    let mut sizing = InputSizing::default();
    let mut seen_bytes: u64 = 0;
    for attr in files.iter().chain(required_files.iter()) {
        let required = required_files.contains(attr);
        for path in paths_of_attr(sample, attr) {
            match std::fs::metadata(&path) {
                Ok(meta) => seen_bytes += meta.len(),
                Err(_) if required => sizing.missing.push(path),
                Err(_) => {
                    tracing::debug!(file = path, "optional input file absent");
                }
            }
        }
    }
    sizing.total_gb = seen_bytes as f64 / BYTES_PER_GB;
    Ok(sizing)
}

/// Populate a sample's derived path attributes from an output schema.
///
/// Each top-level schema entry with a `value` gets its `path`-like
/// templates formatted with the sample's attributes and is then set on
/// the sample under the entry's key.
pub fn populate_sample_paths(sample: &mut Sample, schema_path: &Path) -> Result<(), ValidationError> {
    let doc = read_schema_doc(schema_path)?;
    let source = doc
        .get("properties")
        .and_then(|p| p.get("samples"))
        .and_then(|s| s.get("items"))
        .and_then(|i| i.get("properties"))
        .unwrap_or(&doc);
    let Value::Mapping(entries) = source else {
        return Ok(());
    };

    for (key, entry) in entries {
        let (Some(key), Some(_)) = (key.as_str(), entry.get("value")) else {
            continue;
        };
        let mut populated = entry.clone();
        fill_path_templates(&mut populated, sample);
        if let Some(value) = populated.get("value") {
            sample.set(key, value.clone());
        }
    }
    Ok(())
}

fn fill_path_templates(value: &mut Value, sample: &Sample) {
    let Value::Mapping(map) = value else { return };
    for (k, v) in map.iter_mut() {
        if matches!(k.as_str(), Some("path") | Some("thumbnail_path")) {
            if let Value::String(template) = v {
                match format_with_attrs(template, sample) {
                    Some(filled) => *v = Value::String(filled),
                    None => tracing::warn!(
                        template = template.as_str(),
                        "could not populate path template from sample attributes"
                    ),
                }
                continue;
            }
        }
        fill_path_templates(v, sample);
    }
}

// {attr} substitution from sample attributes; any unknown key leaves
// the template untouched so partial paths never escape.
fn format_with_attrs(template: &str, sample: &Sample) -> Option<String> {
    #[allow(clippy::expect_used)]
    static ATTR_PATTERN: std::sync::LazyLock<regex::Regex> = std::sync::LazyLock::new(|| {
        regex::Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}")
            .expect("constant regex pattern is valid")
    });

    let mut ok = true;
    let result = ATTR_PATTERN.replace_all(template, |caps: &regex::Captures| {
        match sample.get(&caps[1]) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => {
                ok = false;
                String::new()
            }
        }
    });
    ok.then(|| result.to_string())
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
