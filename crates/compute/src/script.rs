// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Submission-script population: `{UPPERCASE}` token substitution with
//! adapter renaming.

use indexmap::IndexMap;
use regex::Regex;
use serde_yaml::Value;
use std::sync::LazyLock;

// Tokens the template marks as required-but-unreplaced: `!${NAME}`
#[allow(clippy::expect_used)]
static UNPOPULATED_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\$\{(.+?)\}").expect("constant regex pattern is valid"));

/// Render a template value as script text.
///
/// Scalars render plainly; sequences join with a single space; mappings
/// fall back to their YAML form (single-token mappings are not expected
/// in submission templates).
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Sequence(seq) => seq
            .iter()
            .map(value_to_string)
            .collect::<Vec<_>>()
            .join(" "),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

/// Look up a dotted path (`looper.job_name`) in a namespaced var map.
fn dig<'a>(vars: &'a IndexMap<String, Value>, dotted: &str) -> Option<&'a Value> {
    let mut parts = dotted.split('.');
    let first = parts.next()?;
    let mut current = vars.get(first)?;
    for part in parts {
        current = match current {
            Value::Mapping(map) => map.get(Value::String(part.to_string()))?,
            _ => return None,
        };
    }
    Some(current)
}

/// Merge the variable chain for script population.
///
/// Starts from the compute namespace, applies adapter renames sourced
/// from `extra_vars` (later entries win; the namespace an adapter reads
/// from is consumed), then flat-merges the unconsumed extra entries.
pub(crate) fn merge_vars(
    compute_vars: &IndexMap<String, Value>,
    extra_vars: &[IndexMap<String, Value>],
    adapters: &IndexMap<String, String>,
) -> IndexMap<String, Value> {
    let mut variables = compute_vars.clone();
    let mut consumed: Vec<&str> = Vec::new();

    for (token, dotted) in adapters {
        let namespace = dotted.split('.').next().unwrap_or(dotted);
        for extra in extra_vars.iter().rev() {
            if !extra.contains_key(namespace) {
                continue;
            }
            if !consumed.contains(&namespace) {
                consumed.push(namespace);
            }
            if let Some(value) = dig(extra, dotted) {
                tracing::debug!(token, source = dotted.as_str(), "adapted template variable");
                variables.insert(token.clone(), value.clone());
            }
            break;
        }
    }

    for extra in extra_vars.iter().rev() {
        for (key, value) in extra {
            if consumed.contains(&key.as_str()) {
                continue;
            }
            variables.insert(key.clone(), value.clone());
        }
    }
    variables
}

/// Substitute `{UPPERCASE_KEY}` tokens and warn about any `!${NAME}`
/// markers left unpopulated.
pub fn populate_template(template: &str, variables: &IndexMap<String, Value>) -> String {
    let mut content = template.to_string();
    for (key, value) in variables {
        let placeholder = format!("{{{}}}", key.to_uppercase());
        if content.contains(&placeholder) {
            content = content.replace(&placeholder, &value_to_string(value));
        }
    }

    let leftover: Vec<&str> = UNPOPULATED_PATTERN
        .captures_iter(&content)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();
    if !leftover.is_empty() {
        tracing::warn!(
            count = leftover.len(),
            tokens = leftover.join(", "),
            "submission template variables are not populated"
        );
    }
    content
}

#[cfg(test)]
#[path = "script_tests.rs"]
mod tests;
