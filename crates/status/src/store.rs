// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Record-store status backend: a YAML results file Looper manages.

use crate::{StatusBackend, StatusError};
use indexmap::IndexMap;
use looper_core::Project;
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};

/// Name of the combined store config file written at startup.
pub const STORE_CONFIG_FILENAME: &str = "looper_pipestat_config.yaml";

/// Reserved key under which a record's status is stored.
const STATUS_KEY: &str = "status";

/// Status backend over a YAML record file.
///
/// The file maps pipeline name -> record identifier -> result mapping;
/// the `status` result is the one the core interprets.
#[derive(Debug, Clone)]
pub struct FileStoreBackend {
    results_file: PathBuf,
    config_file: PathBuf,
    flag_file_dir: Option<PathBuf>,
}

impl FileStoreBackend {
    /// Build the backend from the project's `pipestat` settings and
    /// write the combined config file into the output directory.
    pub fn from_settings(
        settings: &IndexMap<String, Value>,
        project: &Project,
    ) -> Result<Self, StatusError> {
        let results_file = settings
            .get("results_file_path")
            .and_then(Value::as_str)
            .map(|p| resolve(project.output_dir(), p))
            .unwrap_or_else(|| project.output_dir().join("results.yaml"));
        let flag_file_dir = settings
            .get("flag_file_dir")
            .and_then(Value::as_str)
            .map(|p| resolve(project.output_dir(), p));
        let config_file = project.output_dir().join(STORE_CONFIG_FILENAME);

        let backend = FileStoreBackend {
            results_file,
            config_file,
            flag_file_dir,
        };
        backend.write_config(settings, project)?;
        Ok(backend)
    }

    /// Open a backend over an existing results file (tests, tools).
    pub fn new(results_file: PathBuf, config_file: PathBuf) -> Self {
        FileStoreBackend {
            results_file,
            config_file,
            flag_file_dir: None,
        }
    }

    /// Write the combined store configuration consumed by pipelines.
    fn write_config(
        &self,
        settings: &IndexMap<String, Value>,
        project: &Project,
    ) -> Result<(), StatusError> {
        let mut config = Mapping::new();
        config.insert(
            "results_file_path".into(),
            Value::String(self.results_file.display().to_string()),
        );
        if let Some(dir) = &self.flag_file_dir {
            config.insert(
                "flag_file_dir".into(),
                Value::String(dir.display().to_string()),
            );
        }
        config.insert(
            "project_name".into(),
            Value::String(project.name().to_string()),
        );
        for (key, value) in settings {
            if !config.contains_key(Value::String(key.clone())) {
                config.insert(Value::String(key.clone()), value.clone());
            }
        }

        if let Some(parent) = self.config_file.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StatusError::Io {
                path: self.config_file.clone(),
                source,
            })?;
        }
        let content =
            serde_yaml::to_string(&Value::Mapping(config)).map_err(|source| StatusError::Yaml {
                path: self.config_file.clone(),
                source,
            })?;
        std::fs::write(&self.config_file, content).map_err(|source| StatusError::Io {
            path: self.config_file.clone(),
            source,
        })?;
        tracing::debug!(config = %self.config_file.display(), "initialized status store config");
        Ok(())
    }

    fn read_records(&self) -> Result<Mapping, StatusError> {
        let content = match std::fs::read_to_string(&self.results_file) {
            Ok(content) => content,
            Err(_) => return Ok(Mapping::new()),
        };
        serde_yaml::from_str(&content).map_err(|source| StatusError::Yaml {
            path: self.results_file.clone(),
            source,
        })
    }

    fn write_records(&self, records: &Mapping) -> Result<(), StatusError> {
        if let Some(parent) = self.results_file.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StatusError::Io {
                path: self.results_file.clone(),
                source,
            })?;
        }
        let content = serde_yaml::to_string(&Value::Mapping(records.clone())).map_err(
            |source| StatusError::Yaml {
                path: self.results_file.clone(),
                source,
            },
        )?;
        std::fs::write(&self.results_file, content).map_err(|source| StatusError::Io {
            path: self.results_file.clone(),
            source,
        })
    }

    /// Fetch an arbitrary result recorded for a (record, pipeline) pair.
    pub fn retrieve(
        &self,
        record_identifier: &str,
        pipeline_name: &str,
        result_identifier: &str,
    ) -> Result<Option<Value>, StatusError> {
        let records = self.read_records()?;
        Ok(records
            .get(Value::String(pipeline_name.to_string()))
            .and_then(|p| p.get(record_identifier))
            .and_then(|r| r.get(result_identifier))
            .cloned())
    }
}

impl StatusBackend for FileStoreBackend {
    fn get_status(
        &self,
        record_identifier: &str,
        pipeline_name: &str,
    ) -> Result<Vec<String>, StatusError> {
        let status = self.retrieve(record_identifier, pipeline_name, STATUS_KEY)?;
        Ok(status
            .and_then(|v| v.as_str().map(String::from))
            .into_iter()
            .collect())
    }

    fn set_status(
        &self,
        record_identifier: &str,
        pipeline_name: &str,
        status: &str,
    ) -> Result<(), StatusError> {
        let mut records = self.read_records()?;
        let pipeline = records
            .entry(Value::String(pipeline_name.to_string()))
            .or_insert_with(|| Value::Mapping(Mapping::new()));
        if !matches!(pipeline, Value::Mapping(_)) {
            *pipeline = Value::Mapping(Mapping::new());
        }
        if let Value::Mapping(pipeline) = pipeline {
            let record = pipeline
                .entry(Value::String(record_identifier.to_string()))
                .or_insert_with(|| Value::Mapping(Mapping::new()));
            if !matches!(record, Value::Mapping(_)) {
                *record = Value::Mapping(Mapping::new());
            }
            if let Value::Mapping(record) = record {
                record.insert(
                    Value::String(STATUS_KEY.to_string()),
                    Value::String(status.to_string()),
                );
            }
        }
        tracing::debug!(
            record = record_identifier,
            pipeline = pipeline_name,
            status,
            "recorded status"
        );
        self.write_records(&records)
    }

    fn supports_set(&self) -> bool {
        true
    }

    fn namespace(&self, record_identifier: &str) -> IndexMap<String, Value> {
        let mut ns = IndexMap::new();
        ns.insert(
            "results_file".to_string(),
            Value::String(self.results_file.display().to_string()),
        );
        ns.insert(
            "record_identifier".to_string(),
            Value::String(record_identifier.to_string()),
        );
        ns.insert(
            "config_file".to_string(),
            Value::String(self.config_file.display().to_string()),
        );
        if let Some(dir) = &self.flag_file_dir {
            ns.insert(
                "flag_file_dir".to_string(),
                Value::String(dir.display().to_string()),
            );
        }
        ns
    }
}

fn resolve(base: &Path, raw: &str) -> PathBuf {
    let p = Path::new(raw);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base.join(p)
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
