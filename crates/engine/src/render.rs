// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Strict command-template rendering.
//!
//! Command templates use single-brace `{namespace.attr}` placeholders.
//! An undefined variable is an error, never an empty substitution; list
//! values join with a single space.

use indexmap::IndexMap;
use minijinja::syntax::SyntaxConfig;
use minijinja::value::{Value as TemplateValue, ValueKind};
use minijinja::{Environment, ErrorKind, UndefinedBehavior};
use serde_yaml::Value;
use std::fmt::Write as _;
use thiserror::Error;

/// Errors from strict template rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("undefined template variable: {message}")]
    Undefined { message: String },

    #[error("template error: {message}")]
    Other { message: String },
}

fn environment() -> Result<Environment<'static>, RenderError> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    let syntax = SyntaxConfig::builder()
        .block_delimiters("{%", "%}")
        .variable_delimiters("{", "}")
        .comment_delimiters("{#", "#}")
        .build()
        .map_err(|e| RenderError::Other {
            message: e.to_string(),
        })?;
    env.set_syntax(syntax);
    env.set_formatter(|out, state, value| {
        if value.kind() == ValueKind::Seq {
            let mut first = true;
            for item in value.try_iter()? {
                if !first {
                    out.write_char(' ')?;
                }
                first = false;
                write!(out, "{}", item)?;
            }
            Ok(())
        } else {
            minijinja::escape_formatter(out, state, value)
        }
    });
    Ok(env)
}

/// Render a template string against the namespaces mapping, strictly.
pub fn render_template(
    template: &str,
    namespaces: &IndexMap<String, Value>,
) -> Result<String, RenderError> {
    let env = environment()?;
    let context = TemplateValue::from_serialize(namespaces);
    env.render_str(template, context).map_err(|e| {
        let message = e.to_string();
        if matches!(e.kind(), ErrorKind::UndefinedError) {
            RenderError::Undefined { message }
        } else {
            RenderError::Other { message }
        }
    })
}

/// Render every string leaf of a nested `var_templates` mapping.
///
/// The result replaces `pipeline.var_templates` in the namespaces before
/// the final command render, so templates can reference each expansion.
pub fn render_var_templates(
    var_templates: &IndexMap<String, Value>,
    namespaces: &IndexMap<String, Value>,
) -> Result<IndexMap<String, Value>, RenderError> {
    let mut rendered = IndexMap::new();
    for (key, value) in var_templates {
        rendered.insert(key.clone(), render_value(value, namespaces)?);
    }
    Ok(rendered)
}

fn render_value(
    value: &Value,
    namespaces: &IndexMap<String, Value>,
) -> Result<Value, RenderError> {
    match value {
        Value::String(template) => Ok(Value::String(render_template(template, namespaces)?)),
        Value::Mapping(map) => {
            let mut out = serde_yaml::Mapping::new();
            for (k, v) in map {
                out.insert(k.clone(), render_value(v, namespaces)?);
            }
            Ok(Value::Mapping(out))
        }
        other => Ok(other.clone()),
    }
}

#[cfg(test)]
#[path = "render_tests.rs"]
mod tests;
