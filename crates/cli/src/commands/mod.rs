// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subcommand implementations.

pub mod check;
pub mod clean;
pub mod destroy;
pub mod run;

use anyhow::Result;
use clap::Args;
use looper_engine::{RangeSpec, SampleSelector};
use std::io::Write;
use std::path::PathBuf;

/// Options shared by every subcommand that loads a project.
#[derive(Debug, Args)]
pub struct ProjectArgs {
    /// Looper configuration file
    #[arg(short = 'c', long = "looper-config", default_value = "looper.yaml")]
    pub looper_config: PathBuf,

    /// Override the configured output directory
    #[arg(short = 'o', long = "output-dir")]
    pub output_dir: Option<PathBuf>,
}

/// Sample-selection options shared by run/check/clean/destroy.
#[derive(Debug, Default, Args)]
pub struct SelectionArgs {
    /// Limit to the first N samples or the 1-based range LO:HI
    #[arg(long, value_name = "N|LO:HI", conflicts_with = "skip")]
    pub limit: Option<RangeSpec>,

    /// Skip the first N samples or the 1-based range LO:HI
    #[arg(long, value_name = "N|LO:HI")]
    pub skip: Option<RangeSpec>,

    /// Attribute for selection
    #[arg(long = "sel-attr")]
    pub sel_attr: Option<String>,

    /// Include only samples with these values of the selection attribute
    #[arg(long = "sel-incl", num_args = 1.., conflicts_with = "sel_excl")]
    pub sel_incl: Vec<String>,

    /// Exclude samples with these values of the selection attribute
    #[arg(long = "sel-excl", num_args = 1..)]
    pub sel_excl: Vec<String>,
}

impl SelectionArgs {
    pub fn to_selector(&self) -> SampleSelector {
        SampleSelector {
            limit: self.limit,
            skip: self.skip,
            attribute: self.sel_attr.clone(),
            include: self.sel_incl.clone(),
            exclude: self.sel_excl.clone(),
        }
    }
}

/// Parse a `key=value` CLI argument.
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{s}'")),
    }
}

/// Interactive yes/no confirmation; defaults to no.
pub fn query_yes_no(question: &str) -> Result<bool> {
    print!("{question} [y/N] ");
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
