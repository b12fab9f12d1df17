//! LoLa Playground Host
//!
//! Drives a LoLa interpreter compiled to WebAssembly: hands it source code,
//! steps it cooperatively in bounded slices, and bridges its console to the
//! host.
//!
//! # Example
//!
//! ```no_run
//! use lola_playground::{
//!     io::{IoBridge, StdoutSink},
//!     session::Session,
//!     util::config::HostConfig,
//!     WasmGuest,
//! };
//!
//! # async fn demo() -> lola_playground::Result<()> {
//! let config = HostConfig::default();
//! let guest = WasmGuest::load(&config.module.path, &config.module, IoBridge::new(StdoutSink))?;
//! let mut session = Session::from_config(guest, &config)?;
//! let exit = session
//!     .run("Print(\"Hello, World!\");", tokio::io::empty(), std::future::pending())
//!     .await?;
//! println!("exit code {}", exit.exit_code());
//! # Ok(())
//! # }
//! ```
//!
//! # Crate Features
//!
//! - `debug`: verbose default logging in the CLI

#![doc(html_root_url = "https://docs.rs/lola-playground")]
#![warn(rust_2018_idioms)]

pub mod controller;
pub mod error;
pub mod guest;
pub mod io;
pub mod marshal;
pub mod samples;
pub mod scheduler;
pub mod session;
pub mod status;

// Utility modules
pub mod util;

// Re-exports
pub use anyhow::{Context, Result};
pub use controller::{Controller, RunState};
pub use error::{HostError, HostResult};
pub use guest::{Guest, WasmGuest};
pub use scheduler::{LoopExit, Scheduler, StepBudget};
pub use session::{Session, SessionExit};
pub use status::{Outcome, StatusCode};

use std::fs;
use std::path::Path;

use tracing::debug;

/// Host version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Host name
pub const NAME: &str = "LoLa Playground";

/// Read a LoLa source file.
pub fn read_source(path: &Path) -> Result<String> {
    debug!(path = %path.display(), "reading source");
    fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path.display()))
}
