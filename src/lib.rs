//! tmledger - Terra Mystica ledger compiler
//!
//! This crate re-exports all layers of the tmledger system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 5: tmledger_runtime - CLI, configuration, step-through REPL
//! Layer 4: tmledger_replay - Action execution, compound retry, replay driver
//! Layer 3: tmledger_ingest - BGA and ledger lexers, round grid, reconstruction
//! Layer 2: tmledger_notation - Action model, canonical parser and emitter
//! Layer 1: tmledger_state - Reference game state (players, map, pending tables)
//! Layer 0: tmledger_foundation - Errors, code tables, hex math, coordinates
//! ```
//!
//! Data flows upward: raw ledger text is lexed (and, for the tabular ledger,
//! reconstructed) into canonical notation, parsed into [`notation::Action`]
//! values, and replayed against a [`state::GameState`].

pub use tmledger_foundation as foundation;
pub use tmledger_ingest as ingest;
pub use tmledger_notation as notation;
pub use tmledger_replay as replay;
pub use tmledger_runtime as runtime;
pub use tmledger_state as state;
