//! The fourteen base-game factions.
//!
//! Both ledger formats name actors by faction, but spell them differently:
//! the tabular ledger uses lowercase keys (`chaosmagicians`), the narrative
//! log uses titles (`Chaos Magicians`). Everything is normalized to
//! [`Faction`] once at ingestion.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::terrain::Terrain;

/// A base-game faction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Faction {
    /// Alchemists.
    Alchemists,
    /// Auren.
    Auren,
    /// Chaos Magicians.
    ChaosMagicians,
    /// Cultists.
    Cultists,
    /// Darklings.
    Darklings,
    /// Dwarves.
    Dwarves,
    /// Engineers.
    Engineers,
    /// Fakirs.
    Fakirs,
    /// Giants.
    Giants,
    /// Halflings.
    Halflings,
    /// Mermaids.
    Mermaids,
    /// Nomads.
    Nomads,
    /// Swarmlings.
    Swarmlings,
    /// Witches.
    Witches,
}

impl Faction {
    /// Every faction.
    pub const ALL: [Self; 14] = [
        Self::Alchemists,
        Self::Auren,
        Self::ChaosMagicians,
        Self::Cultists,
        Self::Darklings,
        Self::Dwarves,
        Self::Engineers,
        Self::Fakirs,
        Self::Giants,
        Self::Halflings,
        Self::Mermaids,
        Self::Nomads,
        Self::Swarmlings,
        Self::Witches,
    ];

    /// Returns the display title used in canonical notation headers.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Alchemists => "Alchemists",
            Self::Auren => "Auren",
            Self::ChaosMagicians => "Chaos Magicians",
            Self::Cultists => "Cultists",
            Self::Darklings => "Darklings",
            Self::Dwarves => "Dwarves",
            Self::Engineers => "Engineers",
            Self::Fakirs => "Fakirs",
            Self::Giants => "Giants",
            Self::Halflings => "Halflings",
            Self::Mermaids => "Mermaids",
            Self::Nomads => "Nomads",
            Self::Swarmlings => "Swarmlings",
            Self::Witches => "Witches",
        }
    }

    /// Returns the lowercase key used by the tabular ledger.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Alchemists => "alchemists",
            Self::Auren => "auren",
            Self::ChaosMagicians => "chaosmagicians",
            Self::Cultists => "cultists",
            Self::Darklings => "darklings",
            Self::Dwarves => "dwarves",
            Self::Engineers => "engineers",
            Self::Fakirs => "fakirs",
            Self::Giants => "giants",
            Self::Halflings => "halflings",
            Self::Mermaids => "mermaids",
            Self::Nomads => "nomads",
            Self::Swarmlings => "swarmlings",
            Self::Witches => "witches",
        }
    }

    /// Looks up a faction by title or key, ignoring case, spaces and
    /// underscores.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized: String = name
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Self::ALL.into_iter().find(|f| f.key() == normalized)
    }

    /// Returns the faction's home terrain.
    #[must_use]
    pub const fn home_terrain(self) -> Terrain {
        match self {
            Self::Cultists | Self::Halflings => Terrain::Plains,
            Self::Alchemists | Self::Darklings => Terrain::Swamp,
            Self::Mermaids | Self::Swarmlings => Terrain::Lake,
            Self::Auren | Self::Witches => Terrain::Forest,
            Self::Dwarves | Self::Engineers => Terrain::Mountain,
            Self::ChaosMagicians | Self::Giants => Terrain::Wasteland,
            Self::Fakirs | Self::Nomads => Terrain::Desert,
        }
    }
}

impl fmt::Display for Faction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

impl FromStr for Faction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| Error::unknown_faction(s))
    }
}
