//! Host-side errors
//!
//! These cover failures of the host/guest plumbing itself. Status codes
//! reported by the guest are not errors; they are [`Outcome`](crate::status::Outcome)
//! values carried in `Ok`.

use thiserror::Error;

use crate::controller::RunState;
use crate::util::config::ConfigError;

/// Host result
pub type HostResult<T> = Result<T, HostError>;

/// Guest call result
pub type GuestResult<T> = Result<T, GuestError>;

/// A guest memory range that does not fit inside linear memory.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("guest range {ptr:#x}+{len} exceeds linear memory of {memory_size} bytes")]
pub struct BoundsError {
    pub ptr: u32,
    pub len: u32,
    pub memory_size: usize,
}

/// Failures raised while talking to the guest module.
#[derive(Debug, Error)]
pub enum GuestError {
    #[error("failed to load guest module: {0}")]
    Load(String),

    #[error("guest module does not export `{name}`")]
    MissingExport { name: String },

    #[error("guest trapped in `{export}`: {message}")]
    Trap { export: String, message: String },

    #[error(transparent)]
    Bounds(#[from] BoundsError),
}

/// Failures of the copy-in/copy-out discipline.
#[derive(Debug, Error)]
pub enum MarshalError {
    #[error("guest allocator returned no region for {requested} bytes")]
    OutOfMemory { requested: u32 },

    #[error("payload of {len} bytes does not fit the guest address space")]
    PayloadTooLarge { len: usize },

    #[error(transparent)]
    Guest(#[from] GuestError),
}

impl MarshalError {
    /// Allocation failures surface as an out-of-memory outcome rather
    /// than a host error.
    pub fn is_out_of_memory(&self) -> bool {
        matches!(
            self,
            MarshalError::OutOfMemory { .. } | MarshalError::PayloadTooLarge { .. }
        )
    }
}

/// Top-level host error
#[derive(Debug, Error)]
pub enum HostError {
    #[error(transparent)]
    Guest(#[from] GuestError),

    #[error(transparent)]
    Marshal(#[from] MarshalError),

    #[error("`{op}` is not valid while the controller is {state}")]
    InvalidTransition { op: &'static str, state: RunState },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("console I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_error_display() {
        let err = BoundsError {
            ptr: 0x10,
            len: 8,
            memory_size: 16,
        };
        assert_eq!(
            err.to_string(),
            "guest range 0x10+8 exceeds linear memory of 16 bytes"
        );
    }

    #[test]
    fn test_marshal_out_of_memory_classification() {
        assert!(MarshalError::OutOfMemory { requested: 4 }.is_out_of_memory());
        assert!(MarshalError::PayloadTooLarge { len: usize::MAX }.is_out_of_memory());
        let trap = MarshalError::from(GuestError::Trap {
            export: "malloc".to_string(),
            message: "unreachable".to_string(),
        });
        assert!(!trap.is_out_of_memory());
    }

    #[test]
    fn test_invalid_transition_display() {
        let err = HostError::InvalidTransition {
            op: "step",
            state: RunState::Idle,
        };
        assert_eq!(err.to_string(), "`step` is not valid while the controller is idle");
    }
}
