// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Specs for status-driven admission: `looper rerun` and flag handling.

use crate::prelude::*;

#[test]
fn existing_status_skips_submission() {
    let fixture = ProjectFixture::new(&[("a", "X")], DEFAULT_PIFACE);
    fixture.write_flag("a", "pipe_failed.flag");
    fixture
        .looper()
        .args(&["run", "--dry-run"])
        .passes()
        .stderr_has("Found existing status: failed")
        .stderr_has("Use rerun to ignore failed status")
        .stderr_has("Commands submitted: 0 of 1");
    // a script is still written for the rejected sample, as a record
    assert!(fixture.script_exists("pipe_a"));
}

#[test]
fn rerun_admits_failed_samples() {
    let fixture = ProjectFixture::new(&[("a", "X")], DEFAULT_PIFACE);
    fixture.write_flag("a", "pipe_failed.flag");
    fixture
        .looper()
        .args(&["rerun", "--dry-run"])
        .passes()
        .stderr_has("Re-running sample")
        .stderr_has("Commands submitted: 1 of 1");
}

#[test]
fn rerun_admits_waiting_samples() {
    let fixture = ProjectFixture::new(&[("a", "X")], DEFAULT_PIFACE);
    fixture.write_flag("a", "pipe_waiting.flag");
    fixture
        .looper()
        .args(&["rerun", "--dry-run"])
        .passes()
        .stderr_has("Commands submitted: 1 of 1");
}

#[test]
fn rerun_skips_samples_with_no_flags() {
    let fixture = ProjectFixture::new(&[("a", "X")], DEFAULT_PIFACE);
    fixture
        .looper()
        .args(&["rerun", "--dry-run"])
        .passes()
        .stderr_has("no failed or waiting flag found")
        .stderr_has("Commands submitted: 0 of 1");
}

#[test]
fn rerun_skips_completed_samples() {
    let fixture = ProjectFixture::new(&[("a", "X")], DEFAULT_PIFACE);
    fixture.write_flag("a", "pipe_completed.flag");
    fixture
        .looper()
        .args(&["rerun", "--dry-run"])
        .passes()
        .stderr_has("Commands submitted: 0 of 1");
}

#[test]
fn completed_project_is_idempotent() {
    let fixture = ProjectFixture::new(&[("a", "X"), ("b", "X")], DEFAULT_PIFACE);
    for sample in ["a", "b"] {
        fixture.write_flag(sample, "pipe_completed.flag");
    }
    fixture
        .looper()
        .args(&["run", "--dry-run"])
        .passes()
        .stderr_has("Commands submitted: 0 of 2")
        .stderr_has("Jobs submitted: 0");
}

#[test]
fn ignore_flags_submits_anyway() {
    let fixture = ProjectFixture::new(&[("a", "X")], DEFAULT_PIFACE);
    fixture.write_flag("a", "pipe_running.flag");
    fixture
        .looper()
        .args(&["run", "--dry-run", "--ignore-flags"])
        .passes()
        .stderr_has("Ignoring")
        .stderr_has("Commands submitted: 1 of 1");
}

#[test]
fn store_backend_rescues_failed_records_on_rerun() {
    let fixture = ProjectFixture::new(&[("a", "X")], DEFAULT_PIFACE);
    fixture.write_file(
        "looper.yaml",
        "pep_config: pep.yaml\n\
         output_dir: out\n\
         pipeline_interfaces: [pi.yaml]\n\
         pipestat:\n\
         \x20 results_file_path: results.yaml\n",
    );
    std::fs::create_dir_all(fixture.root().join("out")).unwrap();
    fixture.write_file("out/results.yaml", "pipe:\n  a:\n    status: failed\n");

    fixture
        .looper()
        .args(&["rerun", "--dry-run"])
        .passes()
        .stderr_has("Commands submitted: 1 of 1");

    // the failed record was transitioned to waiting before admission
    let records = std::fs::read_to_string(fixture.root().join("out/results.yaml")).unwrap();
    assert!(records.contains("waiting"));
}
