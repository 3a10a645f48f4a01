// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Exit-code and error-reporting specs.

use crate::prelude::*;

#[test]
fn failed_submission_command_exits_one() {
    let fixture =
        ProjectFixture::with_submission_command(&[("a", "X")], DEFAULT_PIFACE, "false");
    fixture
        .looper()
        .args(&["run"])
        .fails_with(1)
        .stderr_has("job submission failed")
        .stderr_has("at least one job submission failed");
}

#[test]
fn missing_looper_config_exits_one() {
    let fixture = ProjectFixture::new(&[], DEFAULT_PIFACE);
    fixture
        .looper()
        .args(&["run", "--looper-config", "nope.yaml"])
        .fails_with(1)
        .stderr_has("cannot read looper config");
}

#[test]
fn malformed_looper_config_exits_one() {
    let fixture = ProjectFixture::new(&[("a", "X")], DEFAULT_PIFACE);
    fixture.write_file("looper.yaml", "pep_config: [unclosed\n");
    fixture.looper().args(&["run"]).fails_with(1);
}

#[test]
fn sample_validation_error_exits_one() {
    let piface = "\
pipeline_name: pipe
protocol_mapping: X
sample_interface:
  command_template: P {sample.sample_name}
  input_schema: input.yaml
";
    let fixture = ProjectFixture::new(&[("a", "X")], piface);
    fixture.write_file(
        "input.yaml",
        "properties:\n\
         \x20 samples:\n\
         \x20   items:\n\
         \x20     type: object\n\
         \x20     required:\n\
         \x20       - genome\n",
    );
    fixture
        .looper()
        .args(&["run", "--dry-run"])
        .fails_with(1)
        .stderr_has("validation");
}

#[test]
fn cli_misuse_exits_two() {
    let fixture = ProjectFixture::new(&[], DEFAULT_PIFACE);
    fixture.looper().args(&["run", "--no-such-flag"]).fails_with(2);
    fixture.looper().args(&["frobnicate"]).fails_with(2);
}

#[test]
fn limit_and_skip_conflict_exits_two() {
    let fixture = ProjectFixture::new(&[("a", "X")], DEFAULT_PIFACE);
    fixture
        .looper()
        .args(&["run", "--limit", "1", "--skip", "1"])
        .fails_with(2);
}

#[test]
fn registry_pep_path_is_rejected() {
    let fixture = ProjectFixture::new(&[], DEFAULT_PIFACE);
    fixture.write_file(
        "looper.yaml",
        "pep_config: databio/example\noutput_dir: out\n",
    );
    fixture
        .looper()
        .args(&["run"])
        .fails_with(1)
        .stderr_has("registry");
}

#[test]
fn runp_without_project_interfaces_exits_one() {
    let fixture = ProjectFixture::new(&[("a", "X")], DEFAULT_PIFACE);
    fixture
        .looper()
        .args(&["runp", "--dry-run"])
        .fails_with(1)
        .stderr_has("no project-level pipeline interfaces");
}

#[test]
fn duplicate_pipeline_names_exit_one() {
    let fixture = ProjectFixture::new(&[("a", "X")], DEFAULT_PIFACE);
    fixture.write_file("pi2.yaml", DEFAULT_PIFACE);
    fixture.write_file(
        "looper.yaml",
        "pep_config: pep.yaml\noutput_dir: out\npipeline_interfaces: [pi.yaml, pi2.yaml]\n",
    );
    fixture
        .looper()
        .args(&["run", "--dry-run"])
        .fails_with(1)
        .stderr_has("duplicate pipeline name");
}

#[test]
fn invalid_interface_is_skipped_with_warning() {
    let fixture = ProjectFixture::new(&[("a", "X")], DEFAULT_PIFACE);
    fixture.write_file("broken.yaml", "pipeline_name: broken\n");
    fixture.write_file(
        "looper.yaml",
        "pep_config: pep.yaml\noutput_dir: out\npipeline_interfaces: [broken.yaml, pi.yaml]\n",
    );
    fixture
        .looper()
        .args(&["run", "--dry-run"])
        .passes()
        .stderr_has("ignoring invalid pipeline interface source")
        .stderr_has("Commands submitted: 1 of 1");
}

#[test]
fn bad_resource_table_is_fatal() {
    let piface = "\
pipeline_name: pipe
protocol_mapping: X
sample_interface:
  command_template: P {sample.sample_name}
  compute:
    size_dependent_variables: resources.tsv
";
    let fixture = ProjectFixture::new(&[("a", "X")], piface);
    // no default (zero-size) row
    fixture.write_file("resources.tsv", "max_file_size\tcores\n10\t4\n");
    fixture
        .looper()
        .args(&["run", "--dry-run"])
        .fails_with(1)
        .stderr_has("no default package");
}
