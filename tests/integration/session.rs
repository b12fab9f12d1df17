//! Async sessions over the echo fixture module

use std::future::pending;
use std::path::Path;
use std::time::Duration;

use lola_playground::io::{CaptureSink, IoBridge};
use lola_playground::util::config::HostConfig;
use lola_playground::{Outcome, Session, SessionExit, WasmGuest};

fn session(sink: &CaptureSink) -> Session<WasmGuest> {
    let mut config = HostConfig::default();
    config.module.path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/echo_guest.wat");
    config.scheduler.tick_interval_ms = 1;
    config.console.greeting = false;

    let guest = WasmGuest::load(&config.module.path, &config.module, IoBridge::new(sink.clone())).unwrap();
    Session::from_config(guest, &config).unwrap()
}

#[tokio::test]
async fn test_session_runs_wasm_program() {
    let sink = CaptureSink::new();
    let mut session = session(&sink);

    let exit = session.run("ab", &b"ok"[..], pending()).await.unwrap();

    assert_eq!(exit, SessionExit::Finished);
    assert_eq!(sink.text(), "okstep\nstep\n");
}

#[tokio::test]
async fn test_session_rejects_bad_source() {
    let sink = CaptureSink::new();
    let mut session = session(&sink);

    let exit = session.run("(", tokio::io::empty(), pending()).await.unwrap();

    assert_eq!(exit, SessionExit::Rejected(Outcome::SyntaxError));
}

#[tokio::test]
async fn test_session_cancel_mid_run() {
    let sink = CaptureSink::new();
    let mut session = session(&sink);
    let long = "a".repeat(10_000);

    let cancel = tokio::time::sleep(Duration::from_millis(20));
    let exit = session.run(&long, tokio::io::empty(), cancel).await.unwrap();

    assert_eq!(exit, SessionExit::Cancelled);
    assert!(session.scheduler().steps() < 10_000);
    assert!(!session.controller().is_run_active());
}
