// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test helpers for behavioral specifications.
//!
//! Provides a high-level DSL for testing looper CLI behavior against a
//! throwaway project directory.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Returns the path to the looper binary, checking the llvm-cov target
/// directory first so coverage runs work too.
fn looper_binary() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));

    let llvm_cov_path = manifest_dir.join("target/llvm-cov-target/debug/looper");
    if llvm_cov_path.exists() {
        return llvm_cov_path;
    }

    let standard = manifest_dir.join("target/debug/looper");
    if standard.exists() {
        return standard;
    }

    // Fallback: resolve relative to the test binary itself, which lives
    // at target/debug/deps/specs-<hash>.
    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let fallback = debug_dir.join("looper");
            if fallback.exists() {
                return fallback;
            }
        }
    }

    standard
}

pub const DEFAULT_PIFACE: &str = "\
pipeline_name: pipe
protocol_mapping: X
sample_interface:
  command_template: P --name {sample.sample_name}
";

/// A throwaway project: looper config, PEP, pipeline interface, and a
/// local compute config submitting through `sh`.
pub struct ProjectFixture {
    dir: tempfile::TempDir,
}

impl ProjectFixture {
    pub fn new(samples: &[(&str, &str)], piface: &str) -> Self {
        Self::with_submission_command(samples, piface, "sh")
    }

    pub fn with_submission_command(
        samples: &[(&str, &str)],
        piface: &str,
        submission_command: &str,
    ) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        let mut pep = String::from("name: demo\nsamples:\n");
        for (name, protocol) in samples {
            pep.push_str(&format!("  - sample_name: {name}\n"));
            if !protocol.is_empty() {
                pep.push_str(&format!("    protocol: {protocol}\n"));
            }
        }
        if samples.is_empty() {
            pep = String::from("name: demo\nsamples: []\n");
        }
        fs::write(root.join("pep.yaml"), pep).unwrap();
        fs::write(root.join("pi.yaml"), piface).unwrap();

        fs::create_dir_all(root.join("templates")).unwrap();
        fs::write(root.join("templates/local.sub"), "#!/bin/bash\n{CODE}\n").unwrap();
        fs::write(
            root.join("compute.yaml"),
            format!(
                "adapters:\n\
                 \x20 CODE: looper.command\n\
                 \x20 JOBNAME: looper.job_name\n\
                 \x20 LOGFILE: looper.log_file\n\
                 compute_packages:\n\
                 \x20 default:\n\
                 \x20   submission_template: templates/local.sub\n\
                 \x20   submission_command: {submission_command}\n"
            ),
        )
        .unwrap();

        fs::write(
            root.join("looper.yaml"),
            "pep_config: pep.yaml\noutput_dir: out\npipeline_interfaces: [pi.yaml]\n",
        )
        .unwrap();

        ProjectFixture { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// A CLI invocation rooted at this project.
    pub fn looper(&self) -> CliBuilder {
        CliBuilder {
            args: Vec::new(),
            dir: self.root().to_path_buf(),
            envs: vec![(
                "LOOPER_COMPUTE_CONFIG".to_string(),
                self.root().join("compute.yaml").to_string_lossy().into_owned(),
            )],
        }
    }

    pub fn write_file(&self, name: &str, content: &str) {
        fs::write(self.root().join(name), content).unwrap();
    }

    /// Drop a status flag as a pipeline would.
    pub fn write_flag(&self, sample: &str, flag_name: &str) {
        let folder = self.root().join("out/results_pipeline").join(sample);
        fs::create_dir_all(&folder).unwrap();
        fs::write(folder.join(flag_name), "").unwrap();
    }

    pub fn submission_dir(&self) -> PathBuf {
        self.root().join("out/submission")
    }

    pub fn script(&self, job_name: &str) -> String {
        fs::read_to_string(self.submission_dir().join(format!("{job_name}.sub"))).unwrap()
    }

    pub fn script_exists(&self, job_name: &str) -> bool {
        self.submission_dir()
            .join(format!("{job_name}.sub"))
            .exists()
    }

    pub fn sub_files(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(self.submission_dir()) else {
            return Vec::new();
        };
        let mut files: Vec<String> = entries
            .flatten()
            .filter_map(|e| e.file_name().to_str().map(String::from))
            .filter(|name| name.ends_with(".sub"))
            .collect();
        files.sort();
        files
    }
}

/// Fluent CLI invocation builder.
pub struct CliBuilder {
    args: Vec<String>,
    dir: PathBuf,
    envs: Vec<(String, String)>,
}

impl CliBuilder {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    fn run(self) -> Output {
        let mut cmd = Command::new(looper_binary());
        cmd.args(&self.args).current_dir(&self.dir);
        for (key, value) in &self.envs {
            cmd.env(key, value);
        }
        cmd.output().expect("command should run")
    }

    /// Run and assert exit code 0.
    pub fn passes(self) -> Assertion {
        let output = self.run();
        let assertion = Assertion { output };
        assert!(
            assertion.output.status.success(),
            "expected success, got {:?}\nstderr: {}",
            assertion.output.status.code(),
            assertion.stderr()
        );
        assertion
    }

    /// Run and assert the given non-zero exit code.
    pub fn fails_with(self, code: i32) -> Assertion {
        let output = self.run();
        let assertion = Assertion { output };
        assert_eq!(
            assertion.output.status.code(),
            Some(code),
            "expected exit code {code}\nstderr: {}",
            assertion.stderr()
        );
        assertion
    }
}

/// Assertions over a finished CLI invocation.
pub struct Assertion {
    output: Output,
}

impl Assertion {
    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        assert!(
            self.stderr().contains(needle),
            "stderr does not contain '{needle}':\n{}",
            self.stderr()
        );
        self
    }

    pub fn stdout_has(self, needle: &str) -> Self {
        assert!(
            self.stdout().contains(needle),
            "stdout does not contain '{needle}':\n{}",
            self.stdout()
        );
        self
    }
}
