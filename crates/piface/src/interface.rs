// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline-interface documents: the declarative contract between Looper
//! and a pipeline.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Which side of a pipeline interface a conductor drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineLevel {
    /// One submission per sample (`sample_interface`).
    Sample,
    /// One submission per project (`project_interface`).
    Project,
}

impl PipelineLevel {
    pub fn section_key(&self) -> &'static str {
        match self {
            PipelineLevel::Sample => "sample_interface",
            PipelineLevel::Project => "project_interface",
        }
    }
}

/// Schema roles a pipeline interface may point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    Input,
    Output,
}

/// Errors parsing or validating a pipeline-interface document.
#[derive(Debug, Error)]
pub enum PifaceError {
    #[error("failed to read pipeline interface {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("YAML parse error in {path}: {source}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("pipeline interface {path} must declare 'sample_interface' and/or 'project_interface'")]
    MissingSections { path: PathBuf },

    #[error("pipeline interface {path} is missing a non-empty 'pipeline_name'")]
    MissingName { path: PathBuf },
}

/// Pre-submission hooks declared by a pipeline interface section.
///
/// Only the command form is executed; each template is rendered, run in a
/// shell, and must print a JSON object that is merged into the template
/// namespaces.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreSubmit {
    #[serde(default)]
    pub command_templates: Vec<String>,
    /// Accepted for document compatibility; never executed.
    #[serde(default)]
    pub python_functions: Vec<String>,
}

/// The `compute` block of an interface section: resource sources plus
/// static variable overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComputeSection {
    /// Tab-separated resource table, relative to the interface file.
    #[serde(default)]
    pub size_dependent_variables: Option<String>,
    /// Command template whose JSON stdout supplies resource variables.
    #[serde(default)]
    pub dynamic_variables_command_template: Option<String>,
    #[serde(flatten)]
    pub statics: IndexMap<String, Value>,
}

/// One side (sample- or project-level) of a pipeline interface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionDef {
    pub command_template: String,
    #[serde(default)]
    pub input_schema: Option<String>,
    #[serde(default)]
    pub output_schema: Option<String>,
    #[serde(default)]
    pub pre_submit: Option<PreSubmit>,
    #[serde(default)]
    pub compute: Option<ComputeSection>,
}

/// A protocol mapping: a single protocol name or a list of them.
#[derive(Debug, Clone, Serialize)]
pub struct ProtocolMapping(pub Vec<String>);

#[derive(Deserialize)]
#[serde(untagged)]
enum ProtocolMappingRaw {
    Single(String),
    Many(Vec<String>),
}

impl<'de> Deserialize<'de> for ProtocolMapping {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = ProtocolMappingRaw::deserialize(d)?;
        Ok(match raw {
            ProtocolMappingRaw::Single(s) => ProtocolMapping(vec![s]),
            ProtocolMappingRaw::Many(v) => ProtocolMapping(v),
        })
    }
}

/// A parsed pipeline interface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineInterface {
    pub pipeline_name: String,
    #[serde(default)]
    pub sample_interface: Option<SectionDef>,
    #[serde(default)]
    pub project_interface: Option<SectionDef>,
    /// Nested string templates rendered per submission and exposed as
    /// `pipeline.var_templates`.
    #[serde(default)]
    pub var_templates: IndexMap<String, Value>,
    /// Sample-level interfaces that feed this project-level pipeline.
    #[serde(default)]
    pub linked_pipeline_interfaces: Vec<String>,
    /// Protocols routed to this pipeline; absent means "all samples".
    #[serde(default)]
    pub protocol_mapping: Option<ProtocolMapping>,
    #[serde(skip)]
    source: Option<PathBuf>,
}

impl PipelineInterface {
    /// Load and validate a pipeline interface from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self, PifaceError> {
        let content = std::fs::read_to_string(path).map_err(|source| PifaceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut piface: PipelineInterface =
            serde_yaml::from_str(&content).map_err(|source| PifaceError::Yaml {
                path: path.to_path_buf(),
                source,
            })?;
        piface.source = Some(path.to_path_buf());
        piface.validate()?;
        if piface
            .sections()
            .any(|s| s.pre_submit.as_ref().is_some_and(|p| !p.python_functions.is_empty()))
        {
            tracing::warn!(
                piface = %path.display(),
                "pre_submit.python_functions is not supported; only command_templates run"
            );
        }
        Ok(piface)
    }

    fn validate(&self) -> Result<(), PifaceError> {
        let path = self.source.clone().unwrap_or_default();
        if self.pipeline_name.is_empty() {
            return Err(PifaceError::MissingName { path });
        }
        if self.sample_interface.is_none() && self.project_interface.is_none() {
            return Err(PifaceError::MissingSections { path });
        }
        Ok(())
    }

    /// Path of the file this interface was parsed from.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Directory the interface file lives in; relative paths inside the
    /// document resolve against this.
    pub fn dir(&self) -> PathBuf {
        self.source
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }

    /// The section for the requested level, if declared.
    pub fn section(&self, level: PipelineLevel) -> Option<&SectionDef> {
        match level {
            PipelineLevel::Sample => self.sample_interface.as_ref(),
            PipelineLevel::Project => self.project_interface.as_ref(),
        }
    }

    fn sections(&self) -> impl Iterator<Item = &SectionDef> {
        self.sample_interface
            .iter()
            .chain(self.project_interface.iter())
    }

    /// Absolute path to the section's schema of the given kind.
    pub fn schema_path(&self, level: PipelineLevel, kind: SchemaKind) -> Option<PathBuf> {
        let section = self.section(level)?;
        let raw = match kind {
            SchemaKind::Input => section.input_schema.as_deref()?,
            SchemaKind::Output => section.output_schema.as_deref()?,
        };
        Some(self.resolve(raw))
    }

    /// Resolve a document-relative path against the interface directory.
    pub fn resolve(&self, raw: &str) -> PathBuf {
        let p = Path::new(raw);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.dir().join(p)
        }
    }

    /// Whether this interface's protocol mapping accepts the protocol.
    ///
    /// An interface with no mapping accepts every sample; matching is
    /// fuzzy (case- and punctuation-insensitive).
    pub fn accepts_protocol(&self, protocol: Option<&str>) -> bool {
        match &self.protocol_mapping {
            None => true,
            Some(ProtocolMapping(declared)) => match protocol {
                None => false,
                Some(p) => declared
                    .iter()
                    .any(|d| crate::protocol::protocols_match(d, p)),
            },
        }
    }

    /// The `pipeline` namespace: the whole document as a mapping.
    pub fn namespace(&self) -> IndexMap<String, Value> {
        let Ok(Value::Mapping(map)) = serde_yaml::to_value(self) else {
            return IndexMap::new();
        };
        map.into_iter()
            .filter_map(|(k, v)| match k {
                Value::String(k) => Some((k, v)),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "interface_tests.rs"]
mod tests;
