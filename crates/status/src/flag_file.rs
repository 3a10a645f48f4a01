// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Flag-file status backend: `<pipeline>_<status>.flag` files written by
//! pipelines into each sample's results folder.

use crate::{StatusBackend, StatusError};
use indexmap::IndexMap;
use serde_yaml::Value;
use std::path::PathBuf;

/// Read-only backend scanning per-sample results folders for flag files.
#[derive(Debug, Clone)]
pub struct FlagFileBackend {
    results_dir: PathBuf,
}

impl FlagFileBackend {
    pub fn new(results_dir: PathBuf) -> Self {
        FlagFileBackend { results_dir }
    }
}

impl StatusBackend for FlagFileBackend {
    fn get_status(
        &self,
        record_identifier: &str,
        pipeline_name: &str,
    ) -> Result<Vec<String>, StatusError> {
        let folder = looper_core::sample_folder(&self.results_dir, record_identifier);
        let entries = match std::fs::read_dir(&folder) {
            Ok(entries) => entries,
            // an absent results folder just means no flags yet
            Err(_) => {
                tracing::debug!(
                    folder = %folder.display(),
                    sample = record_identifier,
                    "results folder does not exist; no flags"
                );
                return Ok(Vec::new());
            }
        };

        // The scan is already scoped to the sample's folder, so the
        // sample-name containment check is on the full path.
        let prefix = format!("{pipeline_name}_");
        let mut statuses = Vec::new();
        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let Some(stem) = name.strip_suffix(".flag") else {
                continue;
            };
            if !name.starts_with(&prefix) {
                continue;
            }
            if let Some(token) = stem.rsplit('_').next() {
                statuses.push(token.to_string());
            }
        }
        Ok(statuses)
    }

    fn set_status(
        &self,
        _record_identifier: &str,
        _pipeline_name: &str,
        _status: &str,
    ) -> Result<(), StatusError> {
        Err(StatusError::SetUnsupported)
    }

    fn supports_set(&self) -> bool {
        false
    }

    fn namespace(&self, _record_identifier: &str) -> IndexMap<String, Value> {
        IndexMap::new()
    }
}

#[cfg(test)]
#[path = "flag_file_tests.rs"]
mod tests;
