//! Action model and canonical notation for tmledger.
//!
//! This crate provides:
//! - [`Action`] and [`SpecialAction`] - The closed action model
//! - [`LogItem`] and [`GameSettings`] - What the lexers produce
//! - [`parse_action_code`] - Canonical cell parsing
//! - [`parse_canonical_log`] - Strict whole-document parsing
//! - [`CanonicalLog`] and [`emit_items`] - Canonical rendering
//! - [`classify`] - Token predicates used by reconstruction

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod action;
pub mod classify;
pub mod emitter;
pub mod item;
pub mod log;
pub mod parser;

pub use action::{Action, SpecialAction, compound_has_main};
pub use emitter::{CELL_WIDTH, CanonicalLog, CellRef, Emitted, Section, emit_items, render_row};
pub use item::{GameSettings, LogItem, SETUP_ROUND};
pub use log::{looks_canonical, parse_canonical_log};
pub use parser::parse_action_code;
