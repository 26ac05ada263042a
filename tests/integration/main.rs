//! Cross-layer integration tests for tmledger
//!
//! Tests that verify correct interaction between multiple crates.

mod cli;
mod pipeline;
