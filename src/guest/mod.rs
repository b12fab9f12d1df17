//! Guest module contract
//!
//! The interpreter runs inside a sandboxed module. The host sees it only
//! through the exports listed below and the linear memory they share; the
//! module in turn calls back into the [`IoBridge`] for console reads, writes
//! and clock queries.
//!
//! # Architecture
//!
//! ```text
//!   Controller ──exports──▶ Guest ──imports──▶ IoBridge
//!        │                    │                  │
//!        └──── Marshaller ◀───┴── linear memory ─┘
//! ```

pub mod wasm;

#[cfg(test)]
pub(crate) mod tests;

pub use wasm::WasmGuest;

use crate::error::GuestResult;
use crate::io::IoBridge;
use crate::scheduler::StepBudget;
use crate::status::StatusCode;

/// One instantiated guest module.
///
/// Pointers are offsets into the module's linear memory. A pointer of `0`
/// returned from [`Guest::allocate`] means the allocation failed.
pub trait Guest {
    /// One-time setup of the guest allocator and runtime.
    fn initialize(&mut self) -> GuestResult<()>;

    /// Request a region of at least `size` bytes.
    fn allocate(
        &mut self,
        size: u32,
    ) -> GuestResult<u32>;

    /// Free a region returned by [`Guest::allocate`] with the same size.
    fn release(
        &mut self,
        ptr: u32,
        size: u32,
    ) -> GuestResult<()>;

    /// Parse and compile the source at `(ptr, len)` without running it.
    fn validate_source(
        &mut self,
        ptr: u32,
        len: u32,
    ) -> GuestResult<StatusCode>;

    /// Compile the source at `(ptr, len)` and prepare a run.
    fn init_run(
        &mut self,
        ptr: u32,
        len: u32,
    ) -> GuestResult<StatusCode>;

    /// Tear down the active run.
    fn deinit_run(&mut self) -> GuestResult<()>;

    /// Whether the current program has run to completion.
    fn is_run_finished(&mut self) -> GuestResult<bool>;

    /// Execute up to `budget` units of work.
    fn step_run(
        &mut self,
        budget: StepBudget,
    ) -> GuestResult<StatusCode>;

    /// Current view of linear memory.
    fn memory(&self) -> &[u8];

    /// Mutable view of linear memory.
    fn memory_mut(&mut self) -> &mut [u8];

    /// Host state reachable from the guest's imports.
    fn bridge(&self) -> &IoBridge;

    fn bridge_mut(&mut self) -> &mut IoBridge;
}

impl<G: Guest + ?Sized> Guest for Box<G> {
    fn initialize(&mut self) -> GuestResult<()> {
        (**self).initialize()
    }

    fn allocate(
        &mut self,
        size: u32,
    ) -> GuestResult<u32> {
        (**self).allocate(size)
    }

    fn release(
        &mut self,
        ptr: u32,
        size: u32,
    ) -> GuestResult<()> {
        (**self).release(ptr, size)
    }

    fn validate_source(
        &mut self,
        ptr: u32,
        len: u32,
    ) -> GuestResult<StatusCode> {
        (**self).validate_source(ptr, len)
    }

    fn init_run(
        &mut self,
        ptr: u32,
        len: u32,
    ) -> GuestResult<StatusCode> {
        (**self).init_run(ptr, len)
    }

    fn deinit_run(&mut self) -> GuestResult<()> {
        (**self).deinit_run()
    }

    fn is_run_finished(&mut self) -> GuestResult<bool> {
        (**self).is_run_finished()
    }

    fn step_run(
        &mut self,
        budget: StepBudget,
    ) -> GuestResult<StatusCode> {
        (**self).step_run(budget)
    }

    fn memory(&self) -> &[u8] {
        (**self).memory()
    }

    fn memory_mut(&mut self) -> &mut [u8] {
        (**self).memory_mut()
    }

    fn bridge(&self) -> &IoBridge {
        (**self).bridge()
    }

    fn bridge_mut(&mut self) -> &mut IoBridge {
        (**self).bridge_mut()
    }
}
