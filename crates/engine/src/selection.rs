// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sample selection: positional `--limit`/`--skip` ranges and
//! attribute-based include/exclude filters.

use looper_core::Sample;
use std::str::FromStr;
use thiserror::Error;

/// Errors parsing or applying selection options.
#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("invalid range '{0}': expected N or LO:HI with positive integers")]
    BadRange(String),

    #[error("range '{0}' is inverted: LO must not exceed HI")]
    InvertedRange(String),

    #[error("--limit and --skip are mutually exclusive")]
    LimitAndSkip,

    #[error("--sel-incl and --sel-excl are mutually exclusive")]
    InclAndExcl,

    #[error("--sel-incl/--sel-excl require --sel-attr")]
    MissingAttribute,
}

/// A positional selection: the first `N` samples or an inclusive
/// 1-based `LO:HI` range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeSpec {
    Count(usize),
    Range(usize, usize),
}

impl RangeSpec {
    /// Whether the 1-based index falls inside the positive selection.
    fn contains(&self, index: usize) -> bool {
        match self {
            RangeSpec::Count(n) => index <= *n,
            RangeSpec::Range(lo, hi) => *lo <= index && index <= *hi,
        }
    }
}

impl FromStr for RangeSpec {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || SelectionError::BadRange(s.to_string());
        match s.split_once(':') {
            None => {
                let n: usize = s.parse().map_err(|_| bad())?;
                if n == 0 {
                    return Err(bad());
                }
                Ok(RangeSpec::Count(n))
            }
            Some((lo, hi)) => {
                let lo: usize = lo.parse().map_err(|_| bad())?;
                let hi: usize = hi.parse().map_err(|_| bad())?;
                if lo == 0 || hi == 0 {
                    return Err(bad());
                }
                if lo > hi {
                    return Err(SelectionError::InvertedRange(s.to_string()));
                }
                Ok(RangeSpec::Range(lo, hi))
            }
        }
    }
}

/// Combined selection predicate over a project's samples.
#[derive(Debug, Default, Clone)]
pub struct SampleSelector {
    pub limit: Option<RangeSpec>,
    pub skip: Option<RangeSpec>,
    pub attribute: Option<String>,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl SampleSelector {
    fn check(&self) -> Result<(), SelectionError> {
        if self.limit.is_some() && self.skip.is_some() {
            return Err(SelectionError::LimitAndSkip);
        }
        if !self.include.is_empty() && !self.exclude.is_empty() {
            return Err(SelectionError::InclAndExcl);
        }
        if self.attribute.is_none() && (!self.include.is_empty() || !self.exclude.is_empty()) {
            return Err(SelectionError::MissingAttribute);
        }
        Ok(())
    }

    fn attr_matches(&self, sample: &Sample) -> bool {
        let Some(attr) = &self.attribute else {
            return true;
        };
        let value = sample.get_str(attr);
        if !self.include.is_empty() {
            return value.is_some_and(|v| self.include.iter().any(|i| i == v));
        }
        if !self.exclude.is_empty() {
            return !value.is_some_and(|v| self.exclude.iter().any(|e| e == v));
        }
        true
    }

    /// Apply the selection, preserving sample order. Attribute filters
    /// apply first; positional ranges index the filtered sequence.
    pub fn select<'a>(&self, samples: &'a [Sample]) -> Result<Vec<&'a Sample>, SelectionError> {
        self.check()?;
        let filtered: Vec<&Sample> = samples.iter().filter(|s| self.attr_matches(s)).collect();
        let positional = |index: usize| match (&self.limit, &self.skip) {
            (Some(limit), None) => limit.contains(index),
            (None, Some(skip)) => !skip.contains(index),
            _ => true,
        };
        Ok(filtered
            .into_iter()
            .enumerate()
            .filter(|(i, _)| positional(i + 1))
            .map(|(_, s)| s)
            .collect())
    }
}

#[cfg(test)]
#[path = "selection_tests.rs"]
mod tests;
