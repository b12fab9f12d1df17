//! End-to-end runs of the `lola-playground` binary

use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

fn fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/echo_guest.wat")
}

fn playground(
    dir: &Path,
    args: &[&str],
) -> Output {
    Command::new(env!("CARGO_BIN_EXE_lola-playground"))
        .args(args)
        .current_dir(dir)
        .env("XDG_CONFIG_HOME", dir)
        .stdin(Stdio::null())
        .output()
        .expect("Failed to spawn lola-playground")
}

fn with_module<'a>(
    module: &'a str,
    args: &[&'a str],
) -> Vec<&'a str> {
    let mut all = vec!["--module", module];
    all.extend_from_slice(args);
    all
}

#[test]
fn test_samples_listed() {
    let dir = tempfile::tempdir().unwrap();
    let output = playground(dir.path(), &["samples"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Hello, World!"));
    assert!(stdout.contains("Stack Trace"));
}

#[test]
fn test_unknown_sample_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = playground(dir.path(), &["samples", "99"]);
    assert!(!output.status.success());
}

#[test]
fn test_eval_exit_codes() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("lola-playground.toml"),
        "[scheduler]\ntick_interval_ms = 1\n\n[console]\nclear_on_start = false\ngreeting = false\n",
    )
    .unwrap();
    let module = fixture();
    let module = module.to_str().unwrap();

    let finished = playground(dir.path(), &with_module(module, &["eval", "abc"]));
    assert_eq!(finished.status.code(), Some(0));
    assert_eq!(String::from_utf8_lossy(&finished.stdout), "step\nstep\nstep\n");

    let faulted = playground(dir.path(), &with_module(module, &["eval", "a!"]));
    assert_eq!(faulted.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&faulted.stdout).ends_with("panic: Boom\n"));

    let rejected = playground(dir.path(), &with_module(module, &["eval", "(x"]));
    assert_eq!(rejected.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&rejected.stderr).contains("failed to compile code"));
}

#[test]
fn test_check_does_not_run() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("prog.lola");
    std::fs::write(&source, "abc").unwrap();
    let module = fixture();
    let module = module.to_str().unwrap();
    let source = source.to_str().unwrap();

    let output = playground(dir.path(), &with_module(module, &["check", source]));

    assert_eq!(output.status.code(), Some(0));
    assert!(!String::from_utf8_lossy(&output.stdout).contains("step"));
}

#[test]
fn test_missing_module_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = playground(dir.path(), &["--module", "absent.wasm", "eval", "abc"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("absent.wasm"));
}
