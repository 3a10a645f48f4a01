// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn namespaces(yaml: &str) -> Namespaces {
    serde_yaml::from_str(yaml).unwrap()
}

#[tokio::test]
async fn json_object_stdout_is_parsed() {
    let update = run_json_command(r#"echo '{"sample": {"genome": "hg38"}}'"#)
        .await
        .unwrap();
    assert_eq!(
        update
            .get("sample")
            .and_then(|v| v.get("genome"))
            .and_then(|v| v.as_str()),
        Some("hg38")
    );
}

#[tokio::test]
async fn non_object_stdout_is_rejected() {
    let err = run_json_command("echo '[1, 2]'").await.unwrap_err();
    assert!(matches!(err, HookError::BadOutput { .. }));

    let err = run_json_command("echo not-json").await.unwrap_err();
    assert!(matches!(err, HookError::BadOutput { .. }));
}

#[tokio::test]
async fn nonzero_exit_is_fatal() {
    let err = run_json_command("echo oops; exit 2").await.unwrap_err();
    assert!(matches!(err, HookError::CommandFailed { .. }));
}

// Hook templates render under the single-brace syntax, so the JSON the
// hook emits lives in a script file, not inline in the template.
fn write_hook(dir: &std::path::Path, name: &str, body: &str) {
    std::fs::write(dir.join(name), body).unwrap();
}

#[tokio::test]
async fn hooks_render_against_namespaces_and_merge() {
    let dir = tempfile::tempdir().unwrap();
    write_hook(
        dir.path(),
        "hook.sh",
        "printf '{\"sample\": {\"derived\": \"%s.out\"}}' \"$1\"\n",
    );
    let mut ns = namespaces("sample:\n  sample_name: s1\n");
    let pre_submit = PreSubmit {
        command_templates: vec![format!(
            "sh {} {{sample.sample_name}}",
            dir.path().join("hook.sh").display()
        )],
        python_functions: vec![],
    };
    exec_pre_submit(&pre_submit, &mut ns).await.unwrap();
    assert_eq!(
        ns.get("sample")
            .and_then(|v| v.get("derived"))
            .and_then(|v| v.as_str()),
        Some("s1.out")
    );
}

#[tokio::test]
async fn later_hooks_see_earlier_updates() {
    let dir = tempfile::tempdir().unwrap();
    write_hook(
        dir.path(),
        "first.sh",
        "printf '{\"extra\": {\"a\": \"one\"}}'\n",
    );
    write_hook(
        dir.path(),
        "second.sh",
        "printf '{\"extra\": {\"b\": \"%s-two\"}}' \"$1\"\n",
    );
    let mut ns = namespaces("sample:\n  sample_name: s1\n");
    let pre_submit = PreSubmit {
        command_templates: vec![
            format!("sh {}", dir.path().join("first.sh").display()),
            format!("sh {} {{extra.a}}", dir.path().join("second.sh").display()),
        ],
        python_functions: vec![],
    };
    exec_pre_submit(&pre_submit, &mut ns).await.unwrap();
    assert_eq!(
        ns.get("extra")
            .and_then(|v| v.get("b"))
            .and_then(|v| v.as_str()),
        Some("one-two")
    );
}

#[tokio::test]
async fn undefined_hook_template_variable_is_fatal() {
    let mut ns = namespaces("sample:\n  sample_name: s1\n");
    let pre_submit = PreSubmit {
        command_templates: vec!["echo {sample.missing}".to_string()],
        python_functions: vec![],
    };
    assert!(matches!(
        exec_pre_submit(&pre_submit, &mut ns).await.unwrap_err(),
        HookError::Render(RenderError::Undefined { .. })
    ));
}
