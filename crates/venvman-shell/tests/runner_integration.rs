#![cfg(unix)]

use std::path::Path;

use tempfile::tempdir;
use venvman_platform::ShellSettings;
use venvman_shell::{
    COMMAND_NOT_FOUND_STATUS, ShellError, ShellRunner, SuccessStatuses, ToolCommand,
};

const SETUP: &str = r#"
fake_status() {
    echo "out"
    echo "err" >&2
    return "$1"
}
"#;

fn runner_with_setup(setup_file: &Path, timeout: Option<u64>) -> ShellRunner {
    ShellRunner::new(ShellSettings {
        shell: "sh".to_string(),
        interactive: false,
        use_setup: true,
        setup_file: Some(setup_file.to_path_buf()),
        command_timeout_secs: timeout,
    })
}

#[tokio::test]
async fn success_set_zero_one_accepts_one_and_rejects_two() {
    let temp_dir = tempdir().expect("create temp dir");
    let setup = temp_dir.path().join("setup.sh");
    std::fs::write(&setup, SETUP).expect("write setup file");
    let runner = runner_with_setup(&setup, None);
    let statuses = SuccessStatuses::new(&[0, 1]);

    let one = runner
        .run(&ToolCommand::new("fake_status").arg("1"), &statuses)
        .await
        .expect("run status 1");
    let two = runner
        .run(&ToolCommand::new("fake_status").arg("2"), &statuses)
        .await
        .expect("run status 2");

    assert!(one.success);
    assert_eq!(one.status, 1);
    assert_eq!(one.text, "out");

    assert!(!two.success);
    assert_eq!(two.status, 2);
    assert_eq!(two.text, "STATUS: 2 ; \nSTDOUT: out\n ; \nSTDERR: err\n");
}

#[tokio::test]
async fn missing_tool_reports_command_not_found_status() {
    let temp_dir = tempdir().expect("create temp dir");
    let setup = temp_dir.path().join("setup.sh");
    std::fs::write(&setup, SETUP).expect("write setup file");
    let runner = runner_with_setup(&setup, None);

    let result = runner
        .run(
            &ToolCommand::new("definitely_not_a_tool_4242"),
            &SuccessStatuses::default(),
        )
        .await
        .expect("shell itself runs");

    assert!(!result.success);
    assert_eq!(result.status, COMMAND_NOT_FOUND_STATUS);
}

#[tokio::test]
async fn failing_setup_file_prevents_the_command() {
    let temp_dir = tempdir().expect("create temp dir");
    let setup = temp_dir.path().join("setup.sh");
    std::fs::write(&setup, "echo setting up\nfalse\n").expect("write setup file");
    let runner = runner_with_setup(&setup, None);

    let checked = runner.check_setup().await.expect("run setup check");
    let captured = runner
        .run_captured(&ToolCommand::new("echo").arg("never printed"))
        .await
        .expect("run command");

    assert!(!checked.success);
    assert!(checked.text.contains("STDOUT: setting up"));
    assert_eq!(captured.status, 1);
    assert!(!captured.stdout.contains("never printed"));
}

#[tokio::test]
async fn check_setup_observes_setup_output() {
    let temp_dir = tempdir().expect("create temp dir");
    let setup = temp_dir.path().join("setup.sh");
    std::fs::write(&setup, "echo ready\n").expect("write setup file");
    let runner = runner_with_setup(&setup, None);

    let checked = runner.check_setup().await.expect("run setup check");

    assert!(checked.success);
    assert_eq!(checked.text, "ready");
}

#[tokio::test]
async fn slow_command_times_out() {
    let temp_dir = tempdir().expect("create temp dir");
    let setup = temp_dir.path().join("setup.sh");
    std::fs::write(&setup, SETUP).expect("write setup file");
    let runner = runner_with_setup(&setup, Some(1));

    let result = runner
        .run(
            &ToolCommand::new("sleep").arg("10"),
            &SuccessStatuses::default(),
        )
        .await;

    assert!(matches!(result, Err(ShellError::Timeout { seconds: 1, .. })));
}
