//! Core types and lookup tables for tmledger.
//!
//! This crate provides:
//! - [`Error`] - Rich error types with context
//! - [`Faction`], [`Terrain`], [`Building`], [`CultTrack`] - Domain enums
//! - [`FavorTile`], [`BonusCard`], [`TownTile`], [`PowerAction`] - Code tables
//! - [`Resources`] - Resource bundles and the conversion grammar
//! - [`Hex`] and the base board layout
//! - Log coordinates ([`parse_log_coord`], [`format_log_coord`])

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod board;
pub mod coord;
pub mod error;
pub mod faction;
pub mod hex;
pub mod resource;
pub mod terrain;
pub mod tiles;

pub use coord::{format_log_coord, is_coord, parse_log_coord, parse_river_coord};
pub use error::{Error, ErrorContext, ErrorKind, Result};
pub use faction::Faction;
pub use hex::Hex;
pub use resource::{Resource, Resources};
pub use terrain::Terrain;
pub use tiles::{BonusCard, Building, CultTrack, FavorTile, PowerAction, TownTile};
