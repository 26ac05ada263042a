//! Integration tests for Layer 0: Foundation
//!
//! Tests for coordinates, code tables, the terrain wheel, and errors.

mod codes;
mod coords;
mod errors;
