//! WasmGuest against the echo fixture module

use std::path::{Path, PathBuf};
use std::time::Duration;

use lola_playground::error::GuestError;
use lola_playground::io::{CaptureSink, IoBridge, ManualClock};
use lola_playground::util::config::ModuleConfig;
use lola_playground::{Controller, Guest, LoopExit, Outcome, RunState, Scheduler, StepBudget, WasmGuest};

fn fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/echo_guest.wat")
}

struct Harness {
    controller: Controller<WasmGuest>,
    sink: CaptureSink,
    clock: ManualClock,
}

fn harness() -> Harness {
    let sink = CaptureSink::new();
    let clock = ManualClock::new();
    let bridge = IoBridge::with_clock(sink.clone(), clock.clone());
    let guest = WasmGuest::load(&fixture(), &ModuleConfig::default(), bridge).unwrap();
    Harness {
        controller: Controller::new(guest).unwrap(),
        sink,
        clock,
    }
}

fn scratch_word(
    controller: &Controller<WasmGuest>,
    offset: usize,
) -> u32 {
    let memory = controller.guest().memory();
    u32::from_le_bytes(memory[offset..offset + 4].try_into().unwrap())
}

fn allocations(controller: &Controller<WasmGuest>) -> u32 {
    scratch_word(controller, 0)
}

fn releases(controller: &Controller<WasmGuest>) -> u32 {
    scratch_word(controller, 4)
}

#[test]
fn test_validate_translates_status() {
    let mut h = harness();

    assert_eq!(h.controller.validate("(oops").unwrap(), Outcome::SyntaxError);
    assert_eq!(h.controller.validate("fine").unwrap(), Outcome::Success);
    assert_eq!(h.controller.state(), RunState::Idle);
    assert_eq!(allocations(&h.controller), 2);
    assert_eq!(releases(&h.controller), 2);
}

#[test]
fn test_program_runs_to_completion() {
    let mut h = harness();
    assert_eq!(h.controller.start("abc").unwrap(), Outcome::Success);

    let mut scheduler = Scheduler::new(StepBudget(10));
    scheduler.arm(&h.controller);
    let exit = scheduler.run(&mut h.controller, |_| {}).unwrap();

    assert_eq!(exit, LoopExit::Finished);
    assert_eq!(scheduler.steps(), 3);
    assert_eq!(h.sink.text(), "step\nstep\nstep\n");
    assert_eq!(scratch_word(&h.controller, 12), 10);
    assert_eq!(h.controller.state(), RunState::Stopped);
}

#[test]
fn test_panic_is_reported_by_guest() {
    let mut h = harness();
    h.controller.start("ab!d").unwrap();

    let mut scheduler = Scheduler::default();
    scheduler.arm(&h.controller);
    let exit = scheduler.run(&mut h.controller, |_| {}).unwrap();

    assert_eq!(exit, LoopExit::Faulted(Outcome::RuntimeFault));
    assert_eq!(h.sink.text(), "step\nstep\npanic: Boom\n");
    assert_eq!(h.controller.fault(), Some(Outcome::RuntimeFault));
}

#[test]
fn test_compile_error_faults_without_running() {
    let mut h = harness();

    assert_eq!(h.controller.start("(x").unwrap(), Outcome::SyntaxError);
    assert_eq!(h.controller.state(), RunState::Faulted);
    assert!(!h.controller.is_run_active());
    assert_eq!(allocations(&h.controller), releases(&h.controller));
}

#[test]
fn test_console_input_is_echoed() {
    let mut h = harness();
    h.controller.start("abcd").unwrap();
    assert!(h.controller.push_input(b"hi"));

    let mut scheduler = Scheduler::default();
    scheduler.arm(&h.controller);
    scheduler.tick(&mut h.controller).unwrap();

    assert_eq!(h.sink.text(), "histep\n");
    assert!(h.controller.bridge().input().is_empty());
}

#[test]
fn test_clock_counts_from_start() {
    let mut h = harness();
    h.clock.advance(Duration::from_millis(5_000));
    h.controller.start("ab").unwrap();
    h.clock.advance(Duration::from_millis(250));

    let mut scheduler = Scheduler::default();
    scheduler.arm(&h.controller);
    scheduler.tick(&mut h.controller).unwrap();

    assert_eq!(scratch_word(&h.controller, 8), 250);
}

#[test]
fn test_empty_source_finishes_immediately() {
    let mut h = harness();
    assert_eq!(h.controller.start("").unwrap(), Outcome::Success);

    let mut scheduler = Scheduler::default();
    scheduler.arm(&h.controller);
    let exit = scheduler.run(&mut h.controller, |_| {}).unwrap();

    assert_eq!(exit, LoopExit::Finished);
    assert_eq!(scheduler.steps(), 0);
    assert_eq!(h.sink.text(), "");
}

#[test]
fn test_oversized_source_is_out_of_memory() {
    let mut h = harness();
    let source = "x".repeat(70_000);

    assert_eq!(h.controller.start(&source).unwrap(), Outcome::OutOfMemory);
    assert_eq!(h.controller.state(), RunState::Faulted);
    assert_eq!(releases(&h.controller), 0);
}

#[test]
fn test_restart_replaces_running_program() {
    let mut h = harness();
    h.controller.start("aaaaaaaa").unwrap();

    let mut scheduler = Scheduler::default();
    scheduler.arm(&h.controller);
    scheduler.tick(&mut h.controller).unwrap();

    h.controller.start("b").unwrap();
    scheduler.arm(&h.controller);
    let exit = scheduler.run(&mut h.controller, |_| {}).unwrap();

    assert_eq!(exit, LoopExit::Finished);
    assert_eq!(scheduler.steps(), 1);
    assert_eq!(h.controller.runs(), 2);
}

#[test]
fn test_missing_export_is_reported() {
    let mut config = ModuleConfig::default();
    config.exports.step = "runSteps".to_string();
    let bridge = IoBridge::new(CaptureSink::new());

    let err = WasmGuest::load(&fixture(), &config, bridge).unwrap_err();

    assert!(matches!(err, GuestError::MissingExport { ref name } if name == "runSteps"));
}

#[test]
fn test_unlinkable_import_names_fail_to_load() {
    let mut config = ModuleConfig::default();
    config.imports.clock = "elapsedTime".to_string();
    let bridge = IoBridge::new(CaptureSink::new());

    let err = WasmGuest::load(&fixture(), &config, bridge).unwrap_err();

    assert!(matches!(err, GuestError::Load(_)));
}

#[test]
fn test_garbage_bytes_fail_to_load() {
    let bridge = IoBridge::new(CaptureSink::new());
    let err = WasmGuest::from_bytes(b"\0asm-not-really", &ModuleConfig::default(), bridge).unwrap_err();
    assert!(matches!(err, GuestError::Load(_)));
}
