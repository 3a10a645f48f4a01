// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Size-dependent resource packages and the override cascade.

use crate::interface::{ComputeSection, PipelineInterface, SectionDef};
use indexmap::IndexMap;
use serde_yaml::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Mandatory column naming each package's file-size threshold (GB).
pub const FILE_SIZE_COLUMN: &str = "max_file_size";

/// Errors loading resource tables or selecting a package.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("attempted resource selection for negative input size: {0}")]
    NegativeInputSize(f64),

    #[error("required column '{FILE_SIZE_COLUMN}' does not exist in resource table {path}")]
    MissingFileSizeColumn { path: PathBuf },

    #[error("invalid '{FILE_SIZE_COLUMN}' value '{value}' in resource table {path}")]
    InvalidFileSize { path: PathBuf, value: String },

    #[error("negative '{FILE_SIZE_COLUMN}' value {value} in resource table {path}")]
    NegativeFileSize { path: PathBuf, value: f64 },

    #[error("resource table {path} has no default package (a row with {FILE_SIZE_COLUMN} of 0)")]
    NoDefaultPackage { path: PathBuf },

    #[error("failed to read resource table {path}: {source}")]
    Read {
        path: PathBuf,
        source: csv::Error,
    },

    #[error("dynamic compute variables command failed: {0}")]
    Dynamic(String),
}

/// One named resource package: a file-size threshold plus arbitrary
/// compute variables. The implicit name is the row index.
#[derive(Debug, Clone)]
pub struct ResourceRow {
    pub index: usize,
    pub max_file_size: f64,
    pub vars: IndexMap<String, Value>,
}

/// Load a tab-separated resource table.
///
/// Every row must carry a non-negative `max_file_size`; a row with
/// threshold 0 (the default package) is required.
pub fn load_resource_table(path: &Path) -> Result<Vec<ResourceRow>, ResourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .map_err(|source| ResourceError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|source| ResourceError::Read {
            path: path.to_path_buf(),
            source,
        })?
        .iter()
        .map(str::to_string)
        .collect();
    if !headers.iter().any(|h| h == FILE_SIZE_COLUMN) {
        return Err(ResourceError::MissingFileSizeColumn {
            path: path.to_path_buf(),
        });
    }

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|source| ResourceError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut vars = IndexMap::new();
        let mut max_file_size = None;
        for (header, field) in headers.iter().zip(record.iter()) {
            if header == FILE_SIZE_COLUMN {
                let size: f64 =
                    field
                        .parse()
                        .map_err(|_| ResourceError::InvalidFileSize {
                            path: path.to_path_buf(),
                            value: field.to_string(),
                        })?;
                if size < 0.0 {
                    return Err(ResourceError::NegativeFileSize {
                        path: path.to_path_buf(),
                        value: size,
                    });
                }
                max_file_size = Some(size);
            } else {
                vars.insert(header.clone(), Value::String(field.to_string()));
            }
        }
        let max_file_size = max_file_size.ok_or_else(|| ResourceError::MissingFileSizeColumn {
            path: path.to_path_buf(),
        })?;
        rows.push(ResourceRow {
            index,
            max_file_size,
            vars,
        });
    }

    if !rows.iter().any(|r| r.max_file_size == 0.0) {
        return Err(ResourceError::NoDefaultPackage {
            path: path.to_path_buf(),
        });
    }
    Ok(rows)
}

/// Pick the minimally-sufficient package for the given input size.
///
/// Rows are ranked by ascending threshold (stable, so equal thresholds
/// keep table order) and the first row covering the input wins. Returns
/// an empty map when no threshold covers the input.
fn select_by_size(rows: &[ResourceRow], size_gb: f64) -> IndexMap<String, Value> {
    let mut ranked: Vec<&ResourceRow> = rows.iter().collect();
    ranked.sort_by(|a, b| {
        a.max_file_size
            .partial_cmp(&b.max_file_size)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    for row in ranked {
        if row.max_file_size >= size_gb {
            tracing::debug!(
                package = row.index,
                threshold_gb = row.max_file_size,
                input_gb = size_gb,
                "selected resource package"
            );
            return row.vars.clone();
        }
    }
    tracing::debug!(input_gb = size_gb, "no resource package covers input size");
    IndexMap::new()
}

/// Select the resource package for one submission.
///
/// Order of precedence, lowest first: size-dependent table pick, the
/// section's static `compute` values, `looper.compute.resources` from the
/// project config, CLI-supplied overrides. A dynamic-variables command
/// template replaces the first three tiers; CLI overrides always apply.
pub fn choose_resource_package(
    piface: &PipelineInterface,
    section: &SectionDef,
    project_resources: &IndexMap<String, Value>,
    cli_overrides: &IndexMap<String, Value>,
    size_gb: f64,
    dynamic_exec: impl FnOnce(&str) -> Result<IndexMap<String, Value>, ResourceError>,
) -> Result<IndexMap<String, Value>, ResourceError> {
    if size_gb < 0.0 {
        return Err(ResourceError::NegativeInputSize(size_gb));
    }

    let compute = section.compute.as_ref();
    let mut package = match compute.and_then(|c| c.dynamic_variables_command_template.as_deref()) {
        Some(template) => dynamic_exec(template)?,
        None => {
            let mut package = match compute.and_then(|c| c.size_dependent_variables.as_deref()) {
                Some(table) => {
                    let rows = load_resource_table(&piface.resolve(table))?;
                    select_by_size(&rows, size_gb)
                }
                None => IndexMap::new(),
            };
            if let Some(ComputeSection { statics, .. }) = compute {
                for (k, v) in statics {
                    package.insert(k.clone(), v.clone());
                }
            }
            for (k, v) in project_resources {
                package.insert(k.clone(), v.clone());
            }
            package
        }
    };

    for (k, v) in cli_overrides {
        package.insert(k.clone(), v.clone());
    }
    Ok(package)
}

#[cfg(test)]
#[path = "resources_tests.rs"]
mod tests;
