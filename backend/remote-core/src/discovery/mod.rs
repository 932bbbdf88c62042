//! Locating, launching and waiting for an operator process.
//!
//! - [`port`] waits until the operator's telnet port accepts connections
//! - [`process`] maps a listening port back to the process that owns it
//! - [`launch`] starts an operator in telnet mode and waits for its port
//!
//! These are the outer, asynchronous parts of a session. The protocol itself
//! lives in [`crate::connection`] and is synchronous.

pub mod launch;
pub mod port;
pub mod process;
