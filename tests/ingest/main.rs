//! Integration tests for Layer 3: Ingest
//!
//! Tests for format detection, both lexers, and the conversion pipeline.

mod bga;
mod ledger;
