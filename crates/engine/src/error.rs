// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the submission engine

use crate::dispatch::DispatchError;
use crate::hooks::HookError;
use crate::selection::SelectionError;
use crate::validate::ValidationError;
use thiserror::Error;

/// Errors raised while pooling and submitting jobs.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("job submission failed: command '{command}' for script '{script}'")]
    JobSubmissionFailed { command: String, script: String },

    #[error(transparent)]
    Hook(#[from] HookError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Compute(#[from] looper_compute::ComputeError),

    #[error(transparent)]
    Resources(#[from] looper_piface::ResourceError),

    #[error(transparent)]
    Status(#[from] looper_status::StatusError),

    #[error(transparent)]
    Schema(#[from] ValidationError),

    #[error("invalid submission bounds: {0}")]
    BadBounds(String),
}

/// Errors that abort a whole run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Router(#[from] looper_piface::RouterError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Submit(#[from] SubmitError),

    #[error(transparent)]
    Status(#[from] looper_status::StatusError),

    #[error("no project-level pipeline interfaces are defined for this project")]
    NoProjectInterfaces,
}
