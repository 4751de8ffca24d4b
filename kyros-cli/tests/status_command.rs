//! Runs the built binary and checks the status output

use std::process::Command;

fn kyros() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_kyros"));
    // Credentials from the developer's environment must not leak in
    cmd.env_clear();
    cmd
}

#[test]
fn status_reports_unconfigured_directory() {
    let dir = tempfile::tempdir().unwrap();

    let output = kyros()
        .args(["status", "--config-dir"])
        .arg(dir.path())
        .output()
        .expect("failed to run kyros");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "status exited with failure");
    assert!(stdout.contains(&dir.path().display().to_string()));
    assert!(stdout.contains("not configured"), "stdout was: {}", stdout);
}

#[test]
fn status_reports_configured_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("config.json"),
        r#"{"provider": {"api_key": "sk-test"}, "counselor": {"model": "gpt-4o-mini"}}"#,
    )
    .unwrap();

    let output = kyros()
        .args(["status", "--config-dir"])
        .arg(dir.path())
        .output()
        .expect("failed to run kyros");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "status exited with failure");
    assert!(stdout.contains("Model: gpt-4o-mini"), "stdout was: {}", stdout);
    assert!(stdout.contains("Credential: configured"), "stdout was: {}", stdout);
    assert!(!stdout.contains("sk-test"), "credential leaked to stdout");
}
