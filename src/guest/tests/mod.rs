//! Guest 测试工具
//!
//! An in-process guest used by the controller, scheduler and session tests.


pub use scripted::{GuestCall, ScriptedGuest};
