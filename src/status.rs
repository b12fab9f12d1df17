//! Guest status codes and their host-side meaning
//!
//! Every lifecycle export of the interpreter module reports an integer
//! status. The host never interprets those integers ad hoc: they pass through
//! [`Outcome::translate`], which is total over `i32`.
//!
//! ```text
//! 0 Success      | 4 RuntimeFault (panic, already reported by the guest)
//! 1 OutOfMemory  | 5 InvalidObject
//! 2 SyntaxError  | 6 InvalidState
//! 3 SemanticError| _ UnknownError
//! ```

use std::fmt;

/// Raw status integer as returned by a guest export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusCode(pub i32);

impl StatusCode {
    pub const SUCCESS: StatusCode = StatusCode(0);
    pub const OUT_OF_MEMORY: StatusCode = StatusCode(1);
    pub const SYNTAX_ERROR: StatusCode = StatusCode(2);
    pub const SEMANTIC_ERROR: StatusCode = StatusCode(3);
    pub const RUNTIME_FAULT: StatusCode = StatusCode(4);
    pub const INVALID_OBJECT: StatusCode = StatusCode(5);
    pub const INVALID_STATE: StatusCode = StatusCode(6);

    /// Translate into the closed outcome taxonomy.
    #[inline]
    pub fn outcome(self) -> Outcome {
        Outcome::translate(self.0)
    }
}

impl From<i32> for StatusCode {
    fn from(raw: i32) -> Self {
        StatusCode(raw)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Host-observable result of a guest lifecycle call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// The call succeeded; for a step, the program wants to continue.
    Success,
    /// The guest allocator (or the marshaller on its behalf) ran out of memory.
    OutOfMemory,
    /// Source failed to parse.
    SyntaxError,
    /// Source parsed but failed to compile.
    SemanticError,
    /// The running program panicked. The guest printed its own diagnostic.
    RuntimeFault,
    /// The guest touched an object that no longer exists.
    InvalidObject,
    /// The guest was driven in a state it does not accept.
    InvalidState,
    /// Any code outside the known table.
    UnknownError(i32),
    /// Host-detected cancellation: the run was stopped between ticks.
    /// Never produced by [`Outcome::translate`].
    Cancelled,
}

impl Outcome {
    /// Exhaustive translation table for guest status integers.
    pub fn translate(raw: i32) -> Outcome {
        match raw {
            0 => Outcome::Success,
            1 => Outcome::OutOfMemory,
            2 => Outcome::SyntaxError,
            3 => Outcome::SemanticError,
            4 => Outcome::RuntimeFault,
            5 => Outcome::InvalidObject,
            6 => Outcome::InvalidState,
            other => Outcome::UnknownError(other),
        }
    }

    /// Wire value of this outcome, if it has one.
    pub fn code(self) -> Option<StatusCode> {
        match self {
            Outcome::Success => Some(StatusCode::SUCCESS),
            Outcome::OutOfMemory => Some(StatusCode::OUT_OF_MEMORY),
            Outcome::SyntaxError => Some(StatusCode::SYNTAX_ERROR),
            Outcome::SemanticError => Some(StatusCode::SEMANTIC_ERROR),
            Outcome::RuntimeFault => Some(StatusCode::RUNTIME_FAULT),
            Outcome::InvalidObject => Some(StatusCode::INVALID_OBJECT),
            Outcome::InvalidState => Some(StatusCode::INVALID_STATE),
            Outcome::UnknownError(raw) => Some(StatusCode(raw)),
            Outcome::Cancelled => None,
        }
    }

    #[inline]
    pub fn is_success(self) -> bool {
        matches!(self, Outcome::Success)
    }

    /// Compile-time rejection of the source text.
    #[inline]
    pub fn is_compile_error(self) -> bool {
        matches!(self, Outcome::SyntaxError | Outcome::SemanticError)
    }

    /// Whether the host has to raise its own alarm for this outcome.
    ///
    /// A runtime fault is not an alarm: the guest already wrote its
    /// diagnostic to the console before faulting. Cancellation is requested
    /// by the host itself.
    pub fn is_alarm(self) -> bool {
        !matches!(
            self,
            Outcome::Success | Outcome::RuntimeFault | Outcome::Cancelled
        )
    }

    /// Short human description, as shown to the console user.
    pub fn describe(self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::OutOfMemory => "out of memory",
            Outcome::SyntaxError | Outcome::SemanticError => "compilation error",
            Outcome::RuntimeFault => "panic",
            Outcome::InvalidObject => "invalid object",
            Outcome::InvalidState => "invalid interpreter state",
            Outcome::UnknownError(_) => "unknown",
            Outcome::Cancelled => "cancelled",
        }
    }
}

impl From<StatusCode> for Outcome {
    fn from(code: StatusCode) -> Self {
        code.outcome()
    }
}

impl fmt::Display for Outcome {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Outcome::UnknownError(raw) => write!(f, "unknown ({})", raw),
            other => f.write_str(other.describe()),
        }
    }
}
