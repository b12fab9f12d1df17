//! Async playground session
//!
//! Couples a [`Controller`] and a [`Scheduler`] to a tokio timer so guest
//! steps interleave with console input and cancellation. Everything runs on
//! one task: input is queued and `stop` is applied between ticks, never
//! while a guest call is in flight.

use std::future::Future;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::controller::Controller;
use crate::error::HostResult;
use crate::guest::Guest;
use crate::samples::GREETING;
use crate::scheduler::{LoopExit, Scheduler, StepBudget, Tick};
use crate::status::Outcome;
use crate::util::config::HostConfig;

const INPUT_CHUNK: usize = 256;

#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Delay between two ticks.
    pub tick_interval: Duration,
    /// Print the greeting before the first program.
    pub greeting: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(16),
            greeting: true,
        }
    }
}

/// How a session run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionExit {
    /// The program never started.
    Rejected(Outcome),
    Finished,
    Faulted(Outcome),
    Alarm(Outcome),
    Cancelled,
}

impl SessionExit {
    /// Process exit code for the CLI.
    pub fn exit_code(self) -> u8 {
        match self {
            SessionExit::Finished => 0,
            SessionExit::Faulted(_) => 1,
            SessionExit::Rejected(_) => 2,
            SessionExit::Alarm(_) => 3,
            SessionExit::Cancelled => 130,
        }
    }
}

impl From<LoopExit> for SessionExit {
    fn from(exit: LoopExit) -> Self {
        match exit {
            LoopExit::Finished => SessionExit::Finished,
            LoopExit::Faulted(outcome) => SessionExit::Faulted(outcome),
            LoopExit::Alarm(outcome) => SessionExit::Alarm(outcome),
            LoopExit::Cancelled => SessionExit::Cancelled,
        }
    }
}

#[derive(Debug)]
pub struct Session<G: Guest> {
    controller: Controller<G>,
    scheduler: Scheduler,
    options: SessionOptions,
    greeted: bool,
}

impl<G: Guest> Session<G> {
    pub fn new(
        controller: Controller<G>,
        budget: StepBudget,
        options: SessionOptions,
    ) -> Self {
        Self {
            controller,
            scheduler: Scheduler::new(budget),
            options,
            greeted: false,
        }
    }

    /// Initialize `guest` and wire up every knob from `config`.
    pub fn from_config(
        guest: G,
        config: &HostConfig,
    ) -> HostResult<Self> {
        let controller = Controller::with_options(guest, config.console.controller_options())?;
        let options = SessionOptions {
            tick_interval: config.scheduler.tick_interval(),
            greeting: config.console.greeting,
        };
        Ok(Self::new(controller, config.scheduler.budget(), options))
    }

    /// Validate `source` without running it.
    pub fn check(
        &mut self,
        source: &str,
    ) -> HostResult<Outcome> {
        self.controller.validate(source)
    }

    /// Start `source` and tick it until it ends.
    ///
    /// Bytes read from `input` are queued for the program as they arrive;
    /// end of input just stops reading. When `cancel` resolves the program is
    /// stopped and the loop exits on its next tick.
    pub async fn run<R, C>(
        &mut self,
        source: &str,
        mut input: R,
        cancel: C,
    ) -> HostResult<SessionExit>
    where
        R: AsyncRead + Unpin,
        C: Future<Output = ()>,
    {
        self.greet()?;

        let outcome = self.controller.start(source)?;
        if !outcome.is_success() {
            return Ok(SessionExit::Rejected(outcome));
        }
        self.scheduler.arm(&self.controller);

        let mut ticker = time::interval(self.options.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(cancel);

        let mut buf = [0u8; INPUT_CHUNK];
        let mut input_open = true;
        let mut cancelled = false;

        loop {
            tokio::select! {
                biased;

                _ = &mut cancel, if !cancelled => {
                    info!("stop requested");
                    cancelled = true;
                    self.controller.stop();
                }

                read = input.read(&mut buf), if input_open => match read {
                    Ok(0) => {
                        debug!("console input closed");
                        input_open = false;
                    }
                    Ok(n) => {
                        self.controller.push_input(&buf[..n]);
                    }
                    Err(err) => {
                        warn!(%err, "console input failed");
                        input_open = false;
                    }
                },

                _ = ticker.tick() => match self.scheduler.tick(&mut self.controller)? {
                    Tick::Continue => {}
                    // armed above, so an idle tick can only follow the exit
                    Tick::Exit(_) | Tick::Idle => {
                        let exit = self.scheduler.last_exit().unwrap_or(LoopExit::Cancelled);
                        return Ok(exit.into());
                    }
                },
            }
        }
    }

    pub fn controller(&self) -> &Controller<G> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut Controller<G> {
        &mut self.controller
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn into_controller(self) -> Controller<G> {
        self.controller
    }

    fn greet(&mut self) -> HostResult<()> {
        if self.options.greeting && !self.greeted {
            self.controller.bridge_mut().announce(GREETING)?;
        }
        self.greeted = true;
        Ok(())
    }
}
