//! Replay engine for tmledger.
//!
//! This crate provides:
//! - [`Execute`] - Validation and execution of actions against a [`GameState`]
//! - [`execute_action`] - Dispatch with compound affordability retries
//! - [`Replayer`] - The driver that walks a log and can step backwards
//! - [`ReplayConfig`] - Retry, history and error handling settings
//!
//! [`GameState`]: tmledger_state::GameState

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod build;
pub mod compound;
pub mod config;
mod cult;
mod economy;
pub mod execute;
pub mod replayer;
mod special;

pub use compound::{execute_compound, execute_wrapped};
pub use config::ReplayConfig;
pub use execute::{Execute, execute_action};
pub use replayer::{ReplayReport, Replayer};
