// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sample: an attribute bag identified by `sample_name`.

use indexmap::IndexMap;
use serde::Serialize;
use serde_yaml::Value;
use std::hash::{Hash, Hasher};
use thiserror::Error;

/// Attribute key that identifies a sample within its project.
pub const SAMPLE_NAME_ATTR: &str = "sample_name";

/// Attribute key holding a sample's assay protocol, if any.
pub const PROTOCOL_ATTR: &str = "protocol";

/// Attribute key naming pipeline-interface sources selected per sample.
pub const PIFACE_ATTR: &str = "pipeline_interfaces";

/// Attribute key for a free-form string appended to this sample's command.
pub const COMMAND_EXTRA_ATTR: &str = "command_extra";

/// Errors constructing a sample from raw attributes.
#[derive(Debug, Error)]
pub enum SampleError {
    #[error("sample is missing the '{SAMPLE_NAME_ATTR}' attribute")]
    MissingName,
    #[error("sample '{SAMPLE_NAME_ATTR}' must be a non-empty string")]
    InvalidName,
}

/// A project sample: `sample_name` plus arbitrary attributes.
///
/// Attributes keep their insertion order so that generated commands and
/// serialized namespaces are deterministic. Identity, equality, and
/// hashing are all by `sample_name`.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct Sample {
    attrs: IndexMap<String, Value>,
}

impl Sample {
    /// Build a sample from raw attributes, requiring a valid name.
    pub fn from_attrs(attrs: IndexMap<String, Value>) -> Result<Self, SampleError> {
        match attrs.get(SAMPLE_NAME_ATTR) {
            None => Err(SampleError::MissingName),
            Some(Value::String(s)) if !s.is_empty() => Ok(Sample { attrs }),
            Some(_) => Err(SampleError::InvalidName),
        }
    }

    /// The sample's unique name.
    pub fn name(&self) -> &str {
        match self.attrs.get(SAMPLE_NAME_ATTR) {
            Some(Value::String(s)) => s,
            // from_attrs guarantees presence; unreachable in practice
            _ => "",
        }
    }

    /// The sample's protocol, if the attribute is present and a string.
    pub fn protocol(&self) -> Option<&str> {
        self.get_str(PROTOCOL_ATTR)
    }

    /// Free-form command appendix configured on this sample.
    pub fn command_extra(&self) -> Option<&str> {
        self.get_str(COMMAND_EXTRA_ATTR)
    }

    /// Pipeline-interface sources named by this sample's attributes.
    ///
    /// Accepts a single string or a list of strings; anything else is
    /// treated as no selection.
    pub fn piface_sources(&self) -> Vec<String> {
        match self.attrs.get(PIFACE_ATTR) {
            Some(Value::String(s)) => vec![s.clone()],
            Some(Value::Sequence(seq)) => seq
                .iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Get a raw attribute value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attrs.get(key)
    }

    /// Get an attribute as a string slice.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).and_then(Value::as_str)
    }

    /// Set or replace an attribute (used when populating derived paths).
    pub fn set(&mut self, key: &str, value: Value) {
        self.attrs.insert(key.to_string(), value);
    }

    /// All attributes, in insertion order.
    pub fn attrs(&self) -> &IndexMap<String, Value> {
        &self.attrs
    }
}

impl PartialEq for Sample {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

impl Eq for Sample {}

impl Hash for Sample {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name().hash(state);
    }
}

#[cfg(test)]
#[path = "sample_tests.rs"]
mod tests;
