//! Log items: the unit both lexers produce and the replayer consumes.

use std::collections::BTreeMap;
use std::fmt;

use tmledger_foundation::{BonusCard, Faction};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::action::Action;

/// Round number used for the setup section.
pub const SETUP_ROUND: u8 = 0;

/// Game configuration extracted from a log header.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GameSettings {
    /// Board or game variant name.
    pub game: Option<String>,
    /// Scoring tile ids, one per round (`SCORE2`).
    pub scoring_tiles: Vec<String>,
    /// Bonus cards in play.
    pub bonus_cards: Vec<BonusCard>,
    /// Starting victory points per faction, in seating order.
    pub starting_vps: Vec<(Faction, i32)>,
    /// Player names and the faction each one plays.
    pub players: Vec<(String, Faction)>,
    /// Game options (`variable-turn-order`).
    pub options: Vec<String>,
    /// Anything else the header carried.
    pub extras: BTreeMap<String, String>,
}

impl GameSettings {
    /// Creates empty settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the game name.
    #[must_use]
    pub fn with_game(mut self, game: impl Into<String>) -> Self {
        self.game = Some(game.into());
        self
    }

    /// Adds a faction with its starting victory points.
    #[must_use]
    pub fn with_faction(mut self, faction: Faction, vp: i32) -> Self {
        self.starting_vps.push((faction, vp));
        self
    }

    /// Returns the seated factions: the starting VP list, falling back to
    /// the player map.
    #[must_use]
    pub fn factions(&self) -> Vec<Faction> {
        if self.starting_vps.is_empty() {
            self.players.iter().map(|(_, f)| *f).collect()
        } else {
            self.starting_vps.iter().map(|(f, _)| *f).collect()
        }
    }

    /// Looks up the faction a named player plays.
    #[must_use]
    pub fn faction_of(&self, player: &str) -> Option<Faction> {
        self.players
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(player))
            .map(|(_, f)| *f)
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// One parsed log entry.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LogItem {
    /// A replayable action.
    Action(Action),
    /// Header configuration.
    GameSettings(GameSettings),
    /// Start of a round ([`SETUP_ROUND`] for setup) and its turn order.
    RoundStart {
        /// Round number.
        round: u8,
        /// Factions in turn order.
        turn_order: Vec<Faction>,
    },
}

impl LogItem {
    /// Returns the wrapped action, if any.
    #[must_use]
    pub const fn as_action(&self) -> Option<&Action> {
        match self {
            Self::Action(action) => Some(action),
            _ => None,
        }
    }
}

impl From<Action> for LogItem {
    fn from(action: Action) -> Self {
        Self::Action(action)
    }
}

impl fmt::Display for LogItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Action(action) => match action.actor() {
                Some(actor) => write!(f, "{actor}: {action}"),
                None => write!(f, "{action}"),
            },
            Self::GameSettings(settings) => {
                write!(f, "settings ({} factions)", settings.factions().len())
            }
            Self::RoundStart { round, turn_order } => {
                let names: Vec<&str> = turn_order.iter().map(|f| f.title()).collect();
                if *round == SETUP_ROUND {
                    write!(f, "Setup: {}", names.join(", "))
                } else {
                    write!(f, "Round {round}: {}", names.join(", "))
                }
            }
        }
    }
}
