use dcimport::tool::{ProcessExecutor, ToolCommand, ToolError, ToolExecutor};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::time::{Duration, Instant};
use tempfile::tempdir;

fn write_script(path: &Path, body: &str) {
    fs::write(path, body).expect("write script");
    let mut perms = fs::metadata(path).expect("metadata").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).expect("chmod");
}

fn command(program: &Path, args: &[&str]) -> ToolCommand {
    ToolCommand {
        program: program.display().to_string(),
        args: args.iter().map(|a| a.to_string()).collect(),
    }
}

#[test]
fn stdout_and_stderr_are_captured_together() {
    let dir = tempdir().expect("tempdir");
    let bin = dir.path().join("tool-mock");
    write_script(
        &bin,
        "#!/bin/sh\necho \"mode $1\"\necho 'warning: sparse data' 1>&2\necho done\n",
    );

    let result = ProcessExecutor::default()
        .execute(&command(&bin, &["lint"]), Duration::from_secs(5))
        .expect("success");
    assert_eq!(result.exit_code, Some(0));
    assert_eq!(result.output, "mode lint\nwarning: sparse data\ndone\n");
}

#[test]
fn non_zero_exit_is_reported_not_failed() {
    let dir = tempdir().expect("tempdir");
    let bin = dir.path().join("tool-fail");
    write_script(&bin, "#!/bin/sh\necho 'bad csv header' 1>&2\nexit 7\n");

    let result = ProcessExecutor::default()
        .execute(&command(&bin, &[]), Duration::from_secs(5))
        .expect("exit code does not classify the run");
    assert_eq!(result.exit_code, Some(7));
    assert!(result.output.contains("bad csv header"));
}

#[test]
fn hung_tool_is_killed_at_deadline() {
    let dir = tempdir().expect("tempdir");
    let bin = dir.path().join("tool-hang");
    write_script(&bin, "#!/bin/sh\necho started\nsleep 10\necho late\n");

    let start = Instant::now();
    let err = ProcessExecutor::default()
        .execute(&command(&bin, &["lint"]), Duration::from_millis(300))
        .expect_err("expected timeout");
    assert!(start.elapsed() < Duration::from_secs(5));
    match err {
        ToolError::Timeout {
            timeout_ms,
            command_form,
            partial_output,
        } => {
            assert_eq!(timeout_ms, 300);
            assert!(command_form.ends_with("tool-hang lint"));
            assert!(partial_output.contains("started"));
            assert!(!partial_output.contains("late"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn missing_binary_is_explicit() {
    let dir = tempdir().expect("tempdir");
    let err = ProcessExecutor::default()
        .execute(
            &command(&dir.path().join("does-not-exist"), &[]),
            Duration::from_secs(1),
        )
        .expect_err("missing binary");
    assert!(matches!(err, ToolError::MissingBinary { .. }));
}

#[test]
fn background_process_holding_output_does_not_outlast_deadline() {
    let dir = tempdir().expect("tempdir");
    let bin = dir.path().join("tool-detach");
    write_script(&bin, "#!/bin/sh\necho hi\nsleep 10 &\nexit 0\n");

    let start = Instant::now();
    let result = ProcessExecutor::default()
        .execute(&command(&bin, &["lint"]), Duration::from_secs(1))
        .expect("tool itself exited cleanly");
    assert!(
        start.elapsed() < Duration::from_secs(3),
        "waited {:?} for a detached writer",
        start.elapsed()
    );
    assert_eq!(result.exit_code, Some(0));
    assert_eq!(result.output, "hi\n");
}
