// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Specs for `looper check`, `looper clean`, and `looper destroy`.

use crate::prelude::*;
use std::fs;

#[test]
fn check_tabulates_status_counts() {
    let fixture = ProjectFixture::new(&[("a", "X"), ("b", "X"), ("c", "X")], DEFAULT_PIFACE);
    fixture.write_flag("a", "pipe_completed.flag");
    fixture.write_flag("b", "pipe_completed.flag");
    fixture.write_flag("c", "pipe_failed.flag");

    fixture
        .looper()
        .args(&["check"])
        .passes()
        .stdout_has("'pipe' pipeline status summary")
        .stdout_has("completed")
        .stdout_has("2/3")
        .stdout_has("failed")
        .stdout_has("1/3");
}

#[test]
fn check_itemized_lists_samples() {
    let fixture = ProjectFixture::new(&[("a", "X")], DEFAULT_PIFACE);
    fixture.write_flag("a", "pipe_running.flag");
    fixture
        .looper()
        .args(&["check", "--itemized"])
        .passes()
        .stdout_has("Sample name")
        .stdout_has("a")
        .stdout_has("running");
}

#[test]
fn check_reports_unknown_for_unflagged_samples() {
    let fixture = ProjectFixture::new(&[("a", "X")], DEFAULT_PIFACE);
    fixture
        .looper()
        .args(&["check"])
        .passes()
        .stdout_has("unknown");
}

#[test]
fn clean_dry_run_lists_but_keeps_scripts() {
    let fixture = ProjectFixture::new(&[("a", "X")], DEFAULT_PIFACE);
    let folder = fixture.root().join("out/results_pipeline/a");
    fs::create_dir_all(&folder).unwrap();
    fs::write(folder.join("pipe_cleanup.sh"), "#!/bin/sh\nrm -f data.tmp\n").unwrap();

    fixture
        .looper()
        .args(&["clean", "--dry-run"])
        .passes()
        .stderr_has("pipe_cleanup.sh")
        .stderr_has("Dry run. No files cleaned.");
    assert!(folder.join("pipe_cleanup.sh").exists());
}

#[test]
fn clean_runs_cleanup_scripts() {
    let fixture = ProjectFixture::new(&[("a", "X")], DEFAULT_PIFACE);
    let folder = fixture.root().join("out/results_pipeline/a");
    fs::create_dir_all(&folder).unwrap();
    fs::write(folder.join("junk.tmp"), "x").unwrap();
    fs::write(
        folder.join("pipe_cleanup.sh"),
        format!("#!/bin/sh\nrm -f {}\n", folder.join("junk.tmp").display()),
    )
    .unwrap();

    fixture
        .looper()
        .args(&["clean", "--force-yes"])
        .passes()
        .stderr_has("Clean complete.");
    assert!(!folder.join("junk.tmp").exists());
}

#[test]
fn destroy_dry_run_previews_only() {
    let fixture = ProjectFixture::new(&[("a", "X")], DEFAULT_PIFACE);
    let folder = fixture.root().join("out/results_pipeline/a");
    fs::create_dir_all(&folder).unwrap();

    fixture
        .looper()
        .args(&["destroy", "--dry-run"])
        .passes()
        .stderr_has("Dry run. No files destroyed.");
    assert!(folder.exists());
}

#[test]
fn destroy_force_yes_removes_results() {
    let fixture = ProjectFixture::new(&[("a", "X"), ("b", "X")], DEFAULT_PIFACE);
    for sample in ["a", "b"] {
        fs::create_dir_all(fixture.root().join("out/results_pipeline").join(sample)).unwrap();
    }

    fixture
        .looper()
        .args(&["destroy", "--force-yes"])
        .passes()
        .stderr_has("Destroy complete.");
    assert!(!fixture.root().join("out/results_pipeline/a").exists());
    assert!(!fixture.root().join("out/results_pipeline/b").exists());
}

#[test]
fn destroy_respects_selection() {
    let fixture = ProjectFixture::new(&[("a", "X"), ("b", "X")], DEFAULT_PIFACE);
    for sample in ["a", "b"] {
        fs::create_dir_all(fixture.root().join("out/results_pipeline").join(sample)).unwrap();
    }

    fixture
        .looper()
        .args(&["destroy", "--force-yes", "--limit", "1"])
        .passes();
    assert!(!fixture.root().join("out/results_pipeline/a").exists());
    assert!(fixture.root().join("out/results_pipeline/b").exists());
}
