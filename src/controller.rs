//! Lifecycle controller
//!
//! Owns the guest handle and tracks which phase the current program is in:
//!
//! ```text
//!            start              init ok
//!   Idle ───────────▶ Compiling ───────▶ Running ──finished / stop──▶ Stopped
//!                        │                  │                           │
//!                        │ init failed      │ step failed               │
//!                        ▼                  ▼                           │
//!                      Faulted ◀────────────┘                           │
//!                        │                                              │
//!                        └────────────── start ──▶ Compiling ◀──────────┘
//! ```
//!
//! A run stays *active* inside the guest from a successful init until the
//! guest's deinit export is called. Starting a new program always tears the
//! active run down first, before the new source reaches the guest.

use std::fmt;

use tracing::{debug, error, info, warn};

use crate::error::{GuestResult, HostError, HostResult};
use crate::guest::Guest;
use crate::io::IoBridge;
use crate::marshal::{self, GuestSlice};
use crate::scheduler::StepBudget;
use crate::status::{Outcome, StatusCode};

/// Phase of the controller's current program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RunState {
    #[default]
    Idle,
    Compiling,
    Running,
    Stopped,
    Faulted,
}

impl fmt::Display for RunState {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let name = match self {
            RunState::Idle => "idle",
            RunState::Compiling => "compiling",
            RunState::Running => "running",
            RunState::Stopped => "stopped",
            RunState::Faulted => "faulted",
        };
        f.write_str(name)
    }
}

/// Controller behaviour switches.
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    /// Clear the console after a program compiled successfully.
    pub clear_console_on_start: bool,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            clear_console_on_start: true,
        }
    }
}

/// Drives one guest module through compile → run → step → stop.
#[derive(Debug)]
pub struct Controller<G: Guest> {
    guest: G,
    state: RunState,
    /// A successful init has not been matched by a deinit yet.
    run_active: bool,
    fault: Option<Outcome>,
    runs: u64,
    /// Bumped by every `start`, successful or not.
    generation: u64,
    options: ControllerOptions,
}

impl<G: Guest> Controller<G> {
    /// Take ownership of `guest` and run its one-time initialization.
    pub fn new(guest: G) -> HostResult<Self> {
        Self::with_options(guest, ControllerOptions::default())
    }

    pub fn with_options(
        mut guest: G,
        options: ControllerOptions,
    ) -> HostResult<Self> {
        guest.initialize()?;
        debug!("guest initialized");
        Ok(Self {
            guest,
            state: RunState::Idle,
            run_active: false,
            fault: None,
            runs: 0,
            generation: 0,
            options,
        })
    }

    /// Ask the guest to compile `source` without running it.
    ///
    /// The run state is left untouched whatever the guest answers.
    pub fn validate(
        &mut self,
        source: &str,
    ) -> HostResult<Outcome> {
        let outcome = self.call_with_source(source, |guest, slice| {
            guest.validate_source(slice.ptr, slice.len)
        })?;
        if outcome.is_success() {
            debug!("source validated");
        } else {
            info!(%outcome, "failed to validate code");
        }
        Ok(outcome)
    }

    /// Compile `source` and prepare it to run.
    ///
    /// Any active run is torn down first. Pending console input is discarded
    /// and the guest clock restarts. On success the controller is `Running`
    /// and a scheduler may start stepping; otherwise it is `Faulted` with the
    /// guest's outcome preserved in [`Controller::fault`].
    pub fn start(
        &mut self,
        source: &str,
    ) -> HostResult<Outcome> {
        self.teardown()?;

        self.generation += 1;
        self.state = RunState::Compiling;
        self.fault = None;
        {
            let bridge = self.guest.bridge_mut();
            bridge.clear_input();
            bridge.reset_anchor();
        }
        debug!(len = source.len(), "compiling program");

        let outcome = match self.call_with_source(source, |guest, slice| {
            guest.init_run(slice.ptr, slice.len)
        }) {
            Ok(outcome) => outcome,
            Err(err) => {
                self.state = RunState::Faulted;
                return Err(err);
            }
        };

        if outcome.is_success() {
            self.run_active = true;
            if self.options.clear_console_on_start {
                if let Err(err) = self.guest.bridge_mut().clear_console() {
                    self.state = RunState::Faulted;
                    if let Err(teardown_err) = self.teardown() {
                        warn!(%teardown_err, "guest failed to tear down after console error");
                    }
                    return Err(err.into());
                }
            }
            self.state = RunState::Running;
            self.runs += 1;
            info!(run = self.runs, "program started");
        } else {
            self.state = RunState::Faulted;
            self.fault = Some(outcome);
            info!(%outcome, "failed to compile code");
        }
        Ok(outcome)
    }

    /// Stop the current program. Never fails and is safe to repeat.
    ///
    /// A running program is torn down and the controller becomes `Stopped`.
    /// A faulted program is torn down but stays `Faulted` so the fault remains
    /// reportable. In every other state this is a no-op.
    pub fn stop(&mut self) {
        match self.state {
            RunState::Running => {
                self.state = RunState::Stopped;
                if let Err(err) = self.teardown() {
                    error!(%err, "guest failed to tear down the run");
                } else {
                    info!("program stopped");
                }
            }
            RunState::Faulted => {
                if let Err(err) = self.teardown() {
                    error!(%err, "guest failed to tear down the faulted run");
                }
            }
            RunState::Idle | RunState::Compiling | RunState::Stopped => {}
        }
    }

    /// Whether the guest reports the program as complete.
    ///
    /// Without an active run there is nothing left to execute.
    /// A guest failure here faults the run.
    pub fn is_finished(&mut self) -> HostResult<bool> {
        if !self.run_active {
            return Ok(true);
        }
        match self.guest.is_run_finished() {
            Ok(finished) => Ok(finished),
            Err(err) => {
                self.state = RunState::Faulted;
                Err(err.into())
            }
        }
    }

    /// [`Controller::is_finished`], moving a running program to `Stopped`
    /// when it has completed.
    pub fn check_finished(&mut self) -> HostResult<bool> {
        let finished = self.is_finished()?;
        if finished && self.state == RunState::Running {
            self.state = RunState::Stopped;
            info!(run = self.runs, "program finished");
        }
        Ok(finished)
    }

    /// Execute one bounded slice of the running program.
    ///
    /// A program stopped between ticks yields [`Outcome::Cancelled`]. Any
    /// non-success status faults the run.
    pub fn step(
        &mut self,
        budget: StepBudget,
    ) -> HostResult<Outcome> {
        match self.state {
            RunState::Running => {}
            RunState::Stopped => return Ok(Outcome::Cancelled),
            state => return Err(HostError::InvalidTransition { op: "step", state }),
        }

        let outcome = match self.guest.step_run(budget) {
            Ok(code) => code.outcome(),
            Err(err) => {
                self.state = RunState::Faulted;
                return Err(err.into());
            }
        };

        if !outcome.is_success() {
            self.state = RunState::Faulted;
            self.fault = Some(outcome);
            debug!(%outcome, "step faulted the run");
        }
        Ok(outcome)
    }

    /// Queue console input for the running program.
    ///
    /// Input arriving while nothing runs is dropped; returns whether the
    /// bytes were queued.
    pub fn push_input(
        &mut self,
        bytes: &[u8],
    ) -> bool {
        if self.state != RunState::Running {
            debug!(len = bytes.len(), state = %self.state, "dropping console input");
            return false;
        }
        self.guest.bridge_mut().push_input(bytes);
        true
    }

    #[inline]
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Outcome that faulted the last run, if it was a guest status.
    #[inline]
    pub fn fault(&self) -> Option<Outcome> {
        self.fault
    }

    #[inline]
    pub fn is_run_active(&self) -> bool {
        self.run_active
    }

    /// Number of programs started successfully.
    #[inline]
    pub fn runs(&self) -> u64 {
        self.runs
    }

    /// Number of `start` calls so far, including failed ones.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn guest(&self) -> &G {
        &self.guest
    }

    pub fn bridge(&self) -> &IoBridge {
        self.guest.bridge()
    }

    pub fn bridge_mut(&mut self) -> &mut IoBridge {
        self.guest.bridge_mut()
    }

    pub fn into_guest(self) -> G {
        self.guest
    }

    fn teardown(&mut self) -> HostResult<()> {
        if !self.run_active {
            return Ok(());
        }
        debug!(run = self.runs, "tearing down active run");
        self.run_active = false;
        if let Err(err) = self.guest.deinit_run() {
            self.state = RunState::Faulted;
            return Err(err.into());
        }
        Ok(())
    }

    fn call_with_source(
        &mut self,
        source: &str,
        call: impl FnOnce(&mut G, GuestSlice) -> GuestResult<StatusCode>,
    ) -> HostResult<Outcome> {
        match marshal::with_guest_bytes(&mut self.guest, source.as_bytes(), call) {
            Ok(code) => Ok(code.outcome()),
            Err(err) if err.is_out_of_memory() => {
                warn!(%err, "could not hand source to the guest");
                Ok(Outcome::OutOfMemory)
            }
            Err(err) => Err(err.into()),
        }
    }
}
