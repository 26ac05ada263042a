//! Integration tests for Layer 2: Notation
//!
//! Tests for action codes, the canonical parser, and the emitter.

mod actions;
mod canonical;
