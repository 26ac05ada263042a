//! Command-line runtime for tmledger.
//!
//! This crate provides:
//! - [`cli`] - Argument parsing and the `convert`, `check` and `replay` commands
//! - [`Session`] - A step-through replay with undo
//! - [`Repl`] - The interactive loop over a session
//! - [`logging`] - Tracing subscriber setup

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod cli;
pub mod editor;
pub mod logging;
pub mod repl;
pub mod session;

pub use cli::{Cli, Command, parse_args};
pub use editor::{LineEditor, ReadResult, RustylineEditor};
pub use repl::Repl;
pub use session::{Outcome, Session, parse_command};
