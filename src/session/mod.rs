//! Session layer: commands, console and REPL.
//!
//! This module wraps a [`Repository`](crate::storage::Repository) in a
//! user-facing session that applies commands one at a time, logs what they
//! did and keeps a journal that can be replayed.

mod action;
mod api;
mod console;
mod repl;
mod shared;

pub use action::{Action, Outcome};
pub use api::{Session, SessionConfig, SessionError, SessionResult};
pub use console::{Console, ConsoleEntry, ConsoleLevel};
pub use repl::{parse_command, resolve_commit, write_log, write_status, Command, Repl, ReplConfig, ReplError, ReplResult};
pub use shared::SharedSession;
