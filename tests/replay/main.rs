//! Integration tests for Layer 4: Replay
//!
//! Tests for replaying canonical logs against the reference game state.

mod games;
