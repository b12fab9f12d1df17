//! Cooperative tick scheduler
//!
//! Each tick runs at most one bounded guest step:
//!
//! 1. finished? → exit the loop
//! 2. otherwise step with the configured budget
//! 3. success → continue on the next tick; panic → exit quietly (the guest
//!    already printed its diagnostic); anything else → exit with an alarm
//!
//! The budget bounds the latency of a single tick, not the runtime of the
//! program. Suspension only ever happens between ticks, so a `stop()` issued
//! from outside takes effect at the next tick boundary.

use std::fmt;

use tracing::{debug, error, trace};

use crate::controller::{Controller, RunState};
use crate::error::HostResult;
use crate::guest::Guest;
use crate::status::Outcome;

/// Units of guest work allowed per step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StepBudget(pub u32);

impl StepBudget {
    pub const DEFAULT: StepBudget = StepBudget(1000);

    #[inline]
    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for StepBudget {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for StepBudget {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why the tick loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// The program ran to completion.
    Finished,
    /// The program panicked and reported it itself.
    Faulted(Outcome),
    /// The run failed in a way the host has to surface.
    Alarm(Outcome),
    /// The program was stopped from outside.
    Cancelled,
}

impl LoopExit {
    #[inline]
    pub fn is_alarm(self) -> bool {
        matches!(self, LoopExit::Alarm(_))
    }
}

/// Result of a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Schedule another tick.
    Continue,
    /// The scheduler is not armed; nothing was done.
    Idle,
    /// The loop is over.
    Exit(LoopExit),
}

/// One-step-per-tick driver for a [`Controller`].
#[derive(Debug, Clone)]
pub struct Scheduler {
    budget: StepBudget,
    armed: bool,
    ticks: u64,
    steps: u64,
    last_exit: Option<LoopExit>,
    /// Controller generation this loop drives.
    generation: u64,
}

impl Scheduler {
    pub fn new(budget: StepBudget) -> Self {
        Self {
            budget,
            armed: false,
            ticks: 0,
            steps: 0,
            last_exit: None,
            generation: 0,
        }
    }

    /// Begin a new loop for the program `controller` just started.
    ///
    /// The loop is bound to that program: if `start` is called again before
    /// the loop ends, the next tick exits as cancelled and leaves reporting
    /// the new program's outcome to `start`.
    pub fn arm<G: Guest>(
        &mut self,
        controller: &Controller<G>,
    ) {
        self.generation = controller.generation();
        self.armed = true;
        self.ticks = 0;
        self.steps = 0;
        self.last_exit = None;
        debug!(budget = %self.budget, "scheduler armed");
    }

    /// Run one tick against `controller`.
    pub fn tick<G: Guest>(
        &mut self,
        controller: &mut Controller<G>,
    ) -> HostResult<Tick> {
        if !self.armed {
            return Ok(Tick::Idle);
        }
        self.ticks += 1;
        trace!(tick = self.ticks, "tick");

        if controller.generation() != self.generation {
            debug!("program replaced since the loop was armed");
            return Ok(self.exit(LoopExit::Cancelled));
        }

        match controller.state() {
            RunState::Running => {}
            RunState::Faulted => {
                let outcome = controller.fault().unwrap_or(Outcome::InvalidState);
                return Ok(self.exit(Self::classify(outcome)));
            }
            RunState::Idle | RunState::Compiling | RunState::Stopped => {
                return Ok(self.exit(LoopExit::Cancelled));
            }
        }

        let finished = controller.check_finished().inspect_err(|_| self.armed = false)?;
        if finished {
            return Ok(self.exit(LoopExit::Finished));
        }

        let outcome = controller
            .step(self.budget)
            .inspect_err(|_| self.armed = false)?;
        self.steps += 1;

        if outcome.is_success() {
            return Ok(Tick::Continue);
        }
        Ok(self.exit(Self::classify(outcome)))
    }

    /// Drive ticks until the loop exits, calling `between_ticks` as the
    /// yield point after every tick that wants to continue.
    pub fn run<G, F>(
        &mut self,
        controller: &mut Controller<G>,
        mut between_ticks: F,
    ) -> HostResult<LoopExit>
    where
        G: Guest,
        F: FnMut(&mut Controller<G>),
    {
        loop {
            match self.tick(controller)? {
                Tick::Continue => between_ticks(controller),
                Tick::Idle => return Ok(self.last_exit.unwrap_or(LoopExit::Cancelled)),
                Tick::Exit(exit) => return Ok(exit),
            }
        }
    }

    #[inline]
    pub fn budget(&self) -> StepBudget {
        self.budget
    }

    #[inline]
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Ticks taken in the current loop, including the one that exited it.
    #[inline]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Guest steps issued in the current loop.
    #[inline]
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn last_exit(&self) -> Option<LoopExit> {
        self.last_exit
    }

    fn classify(outcome: Outcome) -> LoopExit {
        match outcome {
            Outcome::RuntimeFault => LoopExit::Faulted(outcome),
            Outcome::Cancelled => LoopExit::Cancelled,
            other => LoopExit::Alarm(other),
        }
    }

    fn exit(
        &mut self,
        exit: LoopExit,
    ) -> Tick {
        self.armed = false;
        self.last_exit = Some(exit);
        match exit {
            LoopExit::Alarm(outcome) => {
                error!(%outcome, steps = self.steps, "emulator failed");
            }
            other => debug!(exit = ?other, steps = self.steps, ticks = self.ticks, "tick loop ended"),
        }
        Tick::Exit(exit)
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(StepBudget::default())
    }
}
