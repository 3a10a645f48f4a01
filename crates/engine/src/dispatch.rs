// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Submission-command dispatch with signal-safe teardown.
//!
//! The submission command runs in its own process group. On SIGINT or
//! SIGTERM the whole group is signalled with escalation (INT, then TERM,
//! then KILL) and the process exits with code 1.

use nix::sys::signal::{killpg, Signal as NixSignal};
use nix::unistd::Pid;
use std::process::ExitStatus;
use std::time::Duration;
use thiserror::Error;
use tokio::process::{Child, Command};
use tokio::signal::unix::{signal, Signal, SignalKind};

/// Poll interval while waiting for a signalled child to die.
const TEARDOWN_POLL: Duration = Duration::from_millis(250);

/// Total teardown budget before giving up on the child.
const TEARDOWN_BUDGET: Duration = Duration::from_secs(3);

/// Errors dispatching the submission command.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("failed to install signal handler: {0}")]
    SignalInstall(std::io::Error),

    #[error("failed to spawn submission command '{command}': {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("failed to await submission command '{command}': {source}")]
    Wait {
        command: String,
        source: std::io::Error,
    },
}

/// SIGINT/SIGTERM streams installed once per conductor lifetime.
pub struct InterruptGuard {
    sigint: Signal,
    sigterm: Signal,
}

impl InterruptGuard {
    pub fn install() -> Result<Self, DispatchError> {
        Ok(InterruptGuard {
            sigint: signal(SignalKind::interrupt()).map_err(DispatchError::SignalInstall)?,
            sigterm: signal(SignalKind::terminate()).map_err(DispatchError::SignalInstall)?,
        })
    }
}

/// Run `command_line` through the shell and wait for it, unbounded.
///
/// If an interrupt arrives while the child runs, its process group is
/// torn down and the process exits with code 1.
pub async fn run_submission(
    command_line: &str,
    interrupts: &mut InterruptGuard,
) -> Result<ExitStatus, DispatchError> {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command_line).process_group(0);
    let mut child = cmd.spawn().map_err(|source| DispatchError::Spawn {
        command: command_line.to_string(),
        source,
    })?;
    let child_pid = child.id();
    tracing::debug!(pid = child_pid, command = command_line, "submission dispatched");

    tokio::select! {
        status = child.wait() => status.map_err(|source| DispatchError::Wait {
            command: command_line.to_string(),
            source,
        }),
        _ = interrupts.sigint.recv() => {
            tracing::warn!(signal = "SIGINT", "received interrupt; failing gracefully");
            teardown(&mut child).await;
            std::process::exit(1);
        }
        _ = interrupts.sigterm.recv() => {
            tracing::warn!(signal = "SIGTERM", "received interrupt; failing gracefully");
            teardown(&mut child).await;
            std::process::exit(1);
        }
    }
}

/// Signal the child's process group with escalation until it exits or
/// the teardown budget runs out.
async fn teardown(child: &mut Child) {
    let Some(pid) = child.id() else {
        // already reaped
        return;
    };
    let pgid = Pid::from_raw(pid as i32);
    let mut waited = Duration::ZERO;

    while waited < TEARDOWN_BUDGET {
        let sig = if waited > Duration::from_secs(2) {
            NixSignal::SIGKILL
        } else if waited > Duration::from_secs(1) {
            NixSignal::SIGTERM
        } else {
            NixSignal::SIGINT
        };
        if killpg(pgid, sig).is_err() {
            // group already gone
            break;
        }
        tokio::time::sleep(TEARDOWN_POLL).await;
        waited += TEARDOWN_POLL;
        if matches!(child.try_wait(), Ok(Some(_))) {
            tracing::warn!(pid, seconds = waited.as_secs_f64(), "child process terminated");
            return;
        }
    }

    if matches!(child.try_wait(), Ok(Some(_)) | Err(_)) {
        tracing::warn!(pid, "child process was already terminated");
    } else {
        tracing::warn!(pid, "unable to halt child process");
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
