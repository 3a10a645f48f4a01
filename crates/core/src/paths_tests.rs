// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn sample_folder_joins_name() {
    assert_eq!(
        sample_folder(Path::new("/out/results_pipeline"), "s1"),
        PathBuf::from("/out/results_pipeline/s1")
    );
}

#[test]
fn submission_base_preserves_dotted_job_names() {
    assert_eq!(
        submission_base(Path::new("/out/submission"), "pipe_s1.sub"),
        PathBuf::from("/out/submission/pipe_s1.sub")
    );
    assert_eq!(
        submission_base(Path::new("/out/submission"), "pipe_v1.2_s1.log"),
        PathBuf::from("/out/submission/pipe_v1.2_s1.log")
    );
}
