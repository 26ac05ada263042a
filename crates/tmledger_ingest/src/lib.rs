//! Log ingestion for tmledger.
//!
//! This crate provides:
//! - [`detect_format`] - Format sniffing
//! - [`bga_html_to_text`] and [`snellman_html_to_text`] - HTML normalizers
//! - [`lex_bga`] - The BGA narrative lexer
//! - [`read_ledger`] and [`RoundGrid`] - The Snellman ledger lexer and its round grid
//! - [`reconstruct`] - Chronological reconstruction of leech reactions
//! - [`convert`] and [`load_items`] - The whole pipeline
//!
//! # Pipeline
//!
//! ```text
//! BGA html ──normalize──▶ BGA text ──lex_bga──────────────────────┐
//!                                                                  ├──▶ emit ──▶ CanonicalLog
//! ledger html ─normalize─▶ ledger text ──read_ledger──▶ RoundGrid  │
//!                                          └──reconstruct──────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod bga;
pub mod config;
pub mod convert;
pub mod detect;
pub mod grid;
pub mod html;
pub mod ledger;
pub mod reconstruct;

pub use bga::lex_bga;
pub use config::{ConvertConfig, SourceFormat};
pub use convert::{convert, convert_to_string, load_items};
pub use detect::{detect_format, is_ledger_text};
pub use grid::{Cell, Pos, RoundGrid};
pub use html::{bga_html_to_text, snellman_html_to_text};
pub use ledger::{LedgerDocument, ledger_to_log, read_ledger};
pub use reconstruct::{adjacency_holds, adjacency_violations, reconstruct};
