// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Compute-environment configuration: named packages of submission
//! template, submission command, and extra variables.

use crate::script;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variables searched (in order) for a compute config path.
pub const COMPUTE_ENV_VARS: &[&str] = &["LOOPER_COMPUTE_CONFIG", "DIVCFG"];

/// Name of the package activated when none is requested.
pub const DEFAULT_PACKAGE: &str = "default";

/// The bundled local-shell submission template.
const LOCAL_TEMPLATE: &str = "#!/bin/bash\n\
\n\
echo 'Compute node:' `hostname`\n\
echo 'Start time:' `date +'%Y-%m-%d %T'`\n\
\n\
{CODE} | tee {LOGFILE}\n";

/// Errors loading compute configuration or rendering scripts.
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("failed to read compute config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("YAML parse error in compute config {path}: {source}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("no active compute package")]
    NoActivePackage,

    #[error("failed to read submission template {path}: {source}")]
    TemplateRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write submission script {path}: {source}")]
    ScriptWrite {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// One named compute package.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputePackage {
    pub submission_template: String,
    pub submission_command: String,
    #[serde(flatten)]
    pub extras: IndexMap<String, Value>,
    /// Inline template body for bundled packages that have no file.
    #[serde(skip)]
    inline_template: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ComputeConfigFile {
    #[serde(default)]
    compute_packages: IndexMap<String, ComputePackage>,
    #[serde(default)]
    adapters: Option<IndexMap<String, String>>,
}

/// Holds the compute packages and the currently active one.
#[derive(Debug)]
pub struct ComputeStore {
    packages: IndexMap<String, ComputePackage>,
    adapters: IndexMap<String, String>,
    config_dir: Option<PathBuf>,
    active: Option<String>,
}

impl ComputeStore {
    /// Load a compute config file and activate the default package.
    pub fn from_file(path: &Path) -> Result<Self, ComputeError> {
        let content = std::fs::read_to_string(path).map_err(|source| ComputeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let parsed: ComputeConfigFile =
            serde_yaml::from_str(&content).map_err(|source| ComputeError::Yaml {
                path: path.to_path_buf(),
                source,
            })?;
        let mut store = ComputeStore {
            packages: parsed.compute_packages,
            adapters: parsed.adapters.unwrap_or_default(),
            config_dir: path.parent().map(Path::to_path_buf),
            active: None,
        };
        store.activate(DEFAULT_PACKAGE);
        Ok(store)
    }

    /// The bundled configuration: a single local-shell package plus the
    /// standard adapters, used when no compute config is found.
    pub fn bundled() -> Self {
        let mut packages = IndexMap::new();
        packages.insert(
            DEFAULT_PACKAGE.to_string(),
            ComputePackage {
                submission_template: "localhost_template.sub".to_string(),
                submission_command: "sh".to_string(),
                extras: IndexMap::new(),
                inline_template: Some(LOCAL_TEMPLATE.to_string()),
            },
        );
        let adapters = [
            ("CODE", "looper.command"),
            ("JOBNAME", "looper.job_name"),
            ("LOGFILE", "looper.log_file"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let mut store = ComputeStore {
            packages,
            adapters,
            config_dir: None,
            active: None,
        };
        store.activate(DEFAULT_PACKAGE);
        store
    }

    /// Activate a package by name. Returns whether the name was known.
    ///
    /// On activation a relative `submission_template` is resolved against
    /// the compute config file's directory.
    pub fn activate(&mut self, name: &str) -> bool {
        if !self.packages.contains_key(name) {
            tracing::debug!(package = name, "cannot activate unknown compute package");
            return false;
        }
        if name == DEFAULT_PACKAGE {
            tracing::debug!(package = name, "activating compute package");
        } else {
            tracing::info!(package = name, "activating compute package");
        }
        self.active = Some(name.to_string());
        true
    }

    /// Names of the available packages.
    pub fn package_names(&self) -> Vec<&str> {
        self.packages.keys().map(String::as_str).collect()
    }

    fn active_package(&self) -> Result<&ComputePackage, ComputeError> {
        self.active
            .as_deref()
            .and_then(|name| self.packages.get(name))
            .ok_or(ComputeError::NoActivePackage)
    }

    /// The active package's submission command (e.g. `sbatch`, `sh`).
    pub fn submission_command(&self) -> Result<&str, ComputeError> {
        Ok(&self.active_package()?.submission_command)
    }

    /// The active package as the `compute` template namespace.
    pub fn active_vars(&self) -> Result<IndexMap<String, Value>, ComputeError> {
        let package = self.active_package()?;
        let mut vars = IndexMap::new();
        vars.insert(
            "submission_template".to_string(),
            Value::String(self.template_path(package).display().to_string()),
        );
        vars.insert(
            "submission_command".to_string(),
            Value::String(package.submission_command.clone()),
        );
        for (k, v) in &package.extras {
            vars.insert(k.clone(), v.clone());
        }
        Ok(vars)
    }

    fn template_path(&self, package: &ComputePackage) -> PathBuf {
        let raw = Path::new(&package.submission_template);
        if raw.is_absolute() {
            raw.to_path_buf()
        } else {
            match &self.config_dir {
                Some(dir) => dir.join(raw),
                None => raw.to_path_buf(),
            }
        }
    }

    /// The active package's submission template content.
    pub fn template(&self) -> Result<String, ComputeError> {
        let package = self.active_package()?;
        if let Some(inline) = &package.inline_template {
            return Ok(inline.clone());
        }
        let path = self.template_path(package);
        std::fs::read_to_string(&path)
            .map_err(|source| ComputeError::TemplateRead { path, source })
    }

    /// Render the submission script content without writing it.
    ///
    /// `compute_vars` is the merged compute namespace for this submission;
    /// `extra_vars` is a chain of namespaced variable maps (later entries
    /// override earlier ones). Adapters rename namespaced values into
    /// template tokens before the plain merge and consume the matching
    /// namespace.
    pub fn render(
        &self,
        compute_vars: &IndexMap<String, Value>,
        extra_vars: &[IndexMap<String, Value>],
    ) -> Result<String, ComputeError> {
        let template = self.template()?;
        let variables = script::merge_vars(compute_vars, extra_vars, &self.adapters);
        Ok(script::populate_template(&template, &variables))
    }

    /// Render and write the submission script, creating parent dirs.
    pub fn write_script(
        &self,
        output_path: &Path,
        compute_vars: &IndexMap<String, Value>,
        extra_vars: &[IndexMap<String, Value>],
    ) -> Result<PathBuf, ComputeError> {
        let content = self.render(compute_vars, extra_vars)?;
        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ComputeError::ScriptWrite {
                path: output_path.to_path_buf(),
                source,
            })?;
        }
        tracing::info!(script = %output_path.display(), "writing submission script");
        std::fs::write(output_path, content).map_err(|source| ComputeError::ScriptWrite {
            path: output_path.to_path_buf(),
            source,
        })?;
        Ok(output_path.to_path_buf())
    }
}

/// Choose the compute config path: explicit argument first, then the
/// environment search list. `None` means "use the bundled default".
pub fn select_compute_config(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    for var in COMPUTE_ENV_VARS {
        if let Ok(value) = std::env::var(var) {
            if !value.is_empty() {
                tracing::debug!(var, path = value, "compute config from environment");
                return Some(PathBuf::from(value));
            }
        }
    }
    None
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
