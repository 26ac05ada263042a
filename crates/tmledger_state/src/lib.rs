//! Reference game state for tmledger replay.
//!
//! This crate provides:
//! - [`GameState`] - Players, map, pending tables, and turn primitives
//! - [`Player`] - Per-player resources, cult positions, and tiles
//! - [`PowerBowls`] - The power cycle
//! - [`MapState`] - Terrain, structures, and bridges
//! - [`Pending`] - Leech offers, free spades, and tile selections
//!
//! Every collection is an `im` persistent structure, so snapshots are
//! cheap clones.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod income;
pub mod map;
pub mod pending;
pub mod player;
pub mod power;
pub mod state;

pub use map::{MapState, Structure};
pub use pending::{HalflingsSpades, LeechOffer, Pending};
pub use player::Player;
pub use power::PowerBowls;
pub use state::{GameState, Phase};
