// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pre-submission hooks: command templates whose JSON stdout feeds back
//! into the template namespaces.

use crate::namespaces::{merge_two_level, Namespaces};
use crate::render::{render_template, RenderError};
use crate::subprocess::{run_shell_with_timeout, HOOK_TIMEOUT};
use indexmap::IndexMap;
use looper_piface::PreSubmit;
use serde_yaml::Value;
use thiserror::Error;

/// Errors executing pre-submit hooks.
#[derive(Debug, Error)]
pub enum HookError {
    #[error("pre-submit template error: {0}")]
    Render(#[from] RenderError),

    #[error("pre-submit command failed: '{command}': {detail}")]
    CommandFailed { command: String, detail: String },

    #[error("pre-submit command '{command}' must print a JSON object, got: {detail}")]
    BadOutput { command: String, detail: String },
}

/// Run a shell command and parse its stdout as a JSON object of
/// namespace updates (namespace -> key -> value).
pub async fn run_json_command(command: &str) -> Result<IndexMap<String, Value>, HookError> {
    let output = run_shell_with_timeout(command, HOOK_TIMEOUT, "pre-submit command")
        .await
        .map_err(|detail| HookError::CommandFailed {
            command: command.to_string(),
            detail,
        })?;
    if !output.status.success() {
        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            tracing::error!(output = %stdout.trim(), "pre-submit command output");
        }
        return Err(HookError::CommandFailed {
            command: command.to_string(),
            detail: format!("exit status {}", output.status),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_namespace_update(command, stdout.trim())
}

fn parse_namespace_update(
    command: &str,
    stdout: &str,
) -> Result<IndexMap<String, Value>, HookError> {
    let parsed: serde_json::Value =
        serde_json::from_str(stdout).map_err(|e| HookError::BadOutput {
            command: command.to_string(),
            detail: e.to_string(),
        })?;
    if !parsed.is_object() {
        return Err(HookError::BadOutput {
            command: command.to_string(),
            detail: format!("JSON value of type {}", json_type_name(&parsed)),
        });
    }
    let update: IndexMap<String, Value> =
        serde_json::from_value(parsed).map_err(|e| HookError::BadOutput {
            command: command.to_string(),
            detail: e.to_string(),
        })?;
    Ok(update)
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Execute a section's pre-submit hooks in order, merging each result
/// into the namespaces before the next hook renders.
pub async fn exec_pre_submit(
    pre_submit: &PreSubmit,
    namespaces: &mut Namespaces,
) -> Result<(), HookError> {
    for template in &pre_submit.command_templates {
        let command = render_template(template, namespaces)?;
        tracing::info!(command = command.as_str(), "executing pre-submit command");
        let update = run_json_command(&command).await?;
        merge_two_level(namespaces, &update);
    }
    Ok(())
}

#[cfg(test)]
#[path = "hooks_tests.rs"]
mod tests;
