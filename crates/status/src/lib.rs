// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! looper-status: pipeline status tracking behind one interface
//!
//! Two realizations: flag files dropped by pipelines into per-sample
//! results folders, and a record store Looper manages itself. The store
//! is used whenever its configuration is present; flag files otherwise.

mod flag_file;
mod store;

pub use flag_file::FlagFileBackend;
pub use store::FileStoreBackend;

use indexmap::IndexMap;
use looper_core::Project;
use serde_yaml::Value;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from status backends.
#[derive(Debug, Error)]
pub enum StatusError {
    #[error("status I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("status record parse error at {path}: {source}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("the flag-file status backend cannot set status (pipelines own their flags)")]
    SetUnsupported,
}

/// Read/write access to per-record pipeline status.
pub trait StatusBackend {
    /// Status tokens recorded for a (record, pipeline) pair; empty when
    /// nothing is known.
    fn get_status(&self, record_identifier: &str, pipeline_name: &str)
        -> Result<Vec<String>, StatusError>;

    /// Record a status for a (record, pipeline) pair.
    fn set_status(
        &self,
        record_identifier: &str,
        pipeline_name: &str,
        status: &str,
    ) -> Result<(), StatusError>;

    /// Whether `set_status` is available on this backend.
    fn supports_set(&self) -> bool;

    /// The `pipestat` template namespace for one record.
    fn namespace(&self, record_identifier: &str) -> IndexMap<String, Value>;
}

/// Construct the backend for a project: the record store when the
/// project configures one, flag files otherwise.
pub fn backend_for_project(project: &Project) -> Result<Box<dyn StatusBackend>, StatusError> {
    match project.pipestat() {
        Some(settings) => {
            let store = FileStoreBackend::from_settings(settings, project)?;
            Ok(Box::new(store))
        }
        None => Ok(Box::new(FlagFileBackend::new(
            project.results_folder().to_path_buf(),
        ))),
    }
}
