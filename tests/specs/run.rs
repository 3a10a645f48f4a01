// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Specs for `looper run` and `looper runp`.

use crate::prelude::*;

#[test]
fn dry_run_renders_a_script_per_sample() {
    let fixture = ProjectFixture::new(&[("a", "X"), ("b", "X")], DEFAULT_PIFACE);
    fixture
        .looper()
        .args(&["run", "--dry-run"])
        .passes()
        .stderr_has("Commands submitted: 2 of 2")
        .stderr_has("Jobs submitted: 0");

    assert!(fixture.script("pipe_a").contains("P --name a"));
    assert!(fixture.script("pipe_b").contains("P --name b"));
}

#[test]
fn lump_n_batches_commands_into_one_script() {
    let fixture = ProjectFixture::new(&[("a", "X"), ("b", "X"), ("c", "X")], DEFAULT_PIFACE);
    fixture
        .looper()
        .args(&["run", "--dry-run", "--lump-n", "2"])
        .passes()
        .stderr_has("Commands submitted: 3 of 3");

    assert_eq!(
        fixture.sub_files(),
        vec!["pipe_lump1.sub".to_string(), "pipe_lump2.sub".to_string()]
    );
    assert!(fixture
        .script("pipe_lump1")
        .contains("P --name a\nP --name b"));
    assert!(fixture.script("pipe_lump2").contains("P --name c"));
}

#[test]
fn real_run_executes_submission_command() {
    let piface = "\
pipeline_name: pipe
protocol_mapping: X
sample_interface:
  command_template: touch {looper.output_dir}/{sample.sample_name}.done
";
    let fixture = ProjectFixture::new(&[("a", "X")], piface);
    fixture
        .looper()
        .args(&["run"])
        .passes()
        .stderr_has("Jobs submitted: 1");
    assert!(fixture.root().join("out/a.done").exists());
}

#[test]
fn dry_and_real_runs_produce_identical_scripts() {
    let fixture = ProjectFixture::new(&[("a", "X")], DEFAULT_PIFACE);
    fixture.looper().args(&["run", "--dry-run"]).passes();
    let dry = fixture.script("pipe_a");

    let fixture = ProjectFixture::new(&[("a", "X")], DEFAULT_PIFACE);
    fixture.looper().args(&["run"]).passes();
    let real = fixture.script("pipe_a");

    // scripts are deterministic and identical either way, except for
    // the fixture-specific temp paths embedded in each
    assert_eq!(
        dry.lines().count(),
        real.lines().count()
    );
    assert!(dry.contains("P --name a"));
    assert!(real.contains("P --name a"));
}

#[test]
fn empty_project_reports_zero_and_exits_clean() {
    let fixture = ProjectFixture::new(&[], DEFAULT_PIFACE);
    fixture
        .looper()
        .args(&["run", "--dry-run"])
        .passes()
        .stderr_has("Commands submitted: 0 of 0");
}

#[test]
fn unmatched_protocol_is_a_reported_skip() {
    let fixture = ProjectFixture::new(&[("a", "X"), ("zz", "other")], DEFAULT_PIFACE);
    fixture
        .looper()
        .args(&["run", "--dry-run"])
        .passes()
        .stderr_has("No pipeline interfaces defined");
    assert!(!fixture.script_exists("pipe_zz"));
}

#[test]
fn undefined_template_variable_skips_only_that_sample() {
    let piface = "\
pipeline_name: pipe
protocol_mapping: X
sample_interface:
  command_template: P --g {sample.genome} --name {sample.sample_name}
";
    let fixture = ProjectFixture::new(&[("a", "X")], piface);
    fixture.write_file(
        "pep.yaml",
        "name: demo\n\
         samples:\n\
         \x20 - sample_name: a\n\
         \x20   protocol: X\n\
         \x20 - sample_name: b\n\
         \x20   protocol: X\n\
         \x20   genome: hg38\n",
    );
    fixture
        .looper()
        .args(&["run", "--dry-run", "--lump-n", "2"])
        .passes()
        .stderr_has("> Not submitted:")
        .stderr_has("Commands submitted: 1 of 2");

    let script = fixture.script("pipe_lump1");
    assert!(script.contains("P --g hg38 --name b"));
    assert!(!script.contains("--name a"));
}

#[test]
fn command_extra_appends_to_rendered_commands() {
    let fixture = ProjectFixture::new(&[("a", "X")], DEFAULT_PIFACE);
    fixture
        .looper()
        .args(&["run", "--dry-run", "--command-extra", "--cores 9"])
        .passes();
    assert!(fixture.script("pipe_a").contains("P --name a --cores 9"));
}

#[test]
fn size_dependent_resources_feed_command_templates() {
    let piface = "\
pipeline_name: pipe
protocol_mapping: X
sample_interface:
  command_template: P -c {compute.cores} --name {sample.sample_name}
  compute:
    size_dependent_variables: resources.tsv
";
    let fixture = ProjectFixture::new(&[("a", "X")], piface);
    fixture.write_file(
        "resources.tsv",
        "max_file_size\tcores\tmem\n0\t1\t8000\n10\t4\t16000\n30\t8\t32000\n",
    );
    fixture.looper().args(&["run", "--dry-run"]).passes();
    // zero input size selects the smallest sufficient package
    assert!(fixture.script("pipe_a").contains("P -c 1 --name a"));
}

#[test]
fn compute_cli_overrides_take_highest_precedence() {
    let piface = "\
pipeline_name: pipe
protocol_mapping: X
sample_interface:
  command_template: P -c {compute.cores}
  compute:
    cores: '2'
";
    let fixture = ProjectFixture::new(&[("a", "X")], piface);
    fixture
        .looper()
        .args(&["run", "--dry-run", "--compute", "cores=32"])
        .passes();
    assert!(fixture.script("pipe_a").contains("P -c 32"));
}

#[test]
fn limit_selects_a_prefix_of_samples() {
    let fixture = ProjectFixture::new(&[("a", "X"), ("b", "X"), ("c", "X")], DEFAULT_PIFACE);
    fixture
        .looper()
        .args(&["run", "--dry-run", "--limit", "2"])
        .passes()
        .stderr_has("Commands submitted: 2 of 3");
    assert!(!fixture.script_exists("pipe_c"));
}

#[test]
fn runp_collates_project_pipelines() {
    let piface = "\
pipeline_name: summarize
project_interface:
  command_template: summarize --name {project.name}
";
    let fixture = ProjectFixture::new(&[("a", "X")], piface);
    fixture.looper().args(&["runp", "--dry-run"]).passes();
    assert!(fixture
        .script("summarize_demo")
        .contains("summarize --name demo"));
}
