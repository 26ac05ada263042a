//! Terrain types and the terraforming wheel.

use std::fmt;

/// A terrain type on the base-game board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Terrain {
    /// Plains (brown).
    Plains,
    /// Swamp (black).
    Swamp,
    /// Lakes (blue).
    Lake,
    /// Forest (green).
    Forest,
    /// Mountains (gray).
    Mountain,
    /// Wasteland (red).
    Wasteland,
    /// Desert (yellow).
    Desert,
    /// River space; never a build target.
    River,
}

impl Terrain {
    /// Land terrains in wheel order. Neighbours on the wheel are one spade apart.
    pub const WHEEL: [Self; 7] = [
        Self::Plains,
        Self::Swamp,
        Self::Lake,
        Self::Forest,
        Self::Mountain,
        Self::Wasteland,
        Self::Desert,
    ];

    /// Returns the short colour code used in canonical notation.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Plains => "Br",
            Self::Swamp => "Bk",
            Self::Lake => "Bl",
            Self::Forest => "G",
            Self::Mountain => "Gy",
            Self::Wasteland => "R",
            Self::Desert => "Y",
            Self::River => "~",
        }
    }

    /// Parses a colour code (case-insensitive).
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_ascii_uppercase().as_str() {
            "BR" => Some(Self::Plains),
            "BK" => Some(Self::Swamp),
            "BL" => Some(Self::Lake),
            "G" => Some(Self::Forest),
            "GY" => Some(Self::Mountain),
            "R" => Some(Self::Wasteland),
            "Y" => Some(Self::Desert),
            _ => None,
        }
    }

    /// Parses a colour or terrain word: "brown", "grey", "lakes", "mountains".
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "brown" | "plains" | "plain" => Some(Self::Plains),
            "black" | "swamp" | "swamps" => Some(Self::Swamp),
            "blue" | "lake" | "lakes" => Some(Self::Lake),
            "green" | "forest" | "forests" => Some(Self::Forest),
            "gray" | "grey" | "mountain" | "mountains" => Some(Self::Mountain),
            "red" | "wasteland" | "wastelands" => Some(Self::Wasteland),
            "yellow" | "desert" | "deserts" => Some(Self::Desert),
            "river" => Some(Self::River),
            _ => None,
        }
    }

    /// Returns the lowercase terrain word.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Plains => "plains",
            Self::Swamp => "swamp",
            Self::Lake => "lakes",
            Self::Forest => "forest",
            Self::Mountain => "mountains",
            Self::Wasteland => "wasteland",
            Self::Desert => "desert",
            Self::River => "river",
        }
    }

    /// Returns the position on the wheel, or `None` for river.
    #[must_use]
    pub fn wheel_index(self) -> Option<usize> {
        Self::WHEEL.iter().position(|t| *t == self)
    }

    /// Returns the number of spades needed to turn `self` into `target`.
    ///
    /// Returns `None` if either side is river.
    #[must_use]
    pub fn distance(self, target: Self) -> Option<u8> {
        let a = self.wheel_index()?;
        let b = target.wheel_index()?;
        let diff = a.abs_diff(b);
        let steps = diff.min(Self::WHEEL.len() - diff);
        u8::try_from(steps).ok()
    }

    /// Moves `spades` steps around the wheel toward `target`, taking the
    /// shorter way. Stops at `target`. River stays river.
    #[must_use]
    pub fn step_toward(self, target: Self, spades: u8) -> Self {
        let (Some(from), Some(to)) = (self.wheel_index(), target.wheel_index()) else {
            return self;
        };
        let len = Self::WHEEL.len();
        let forward = (to + len - from) % len;
        let backward = (from + len - to) % len;
        let steps = usize::from(spades).min(forward.min(backward));
        let index = if forward <= backward {
            (from + steps) % len
        } else {
            (from + len - steps) % len
        };
        Self::WHEEL[index]
    }

    /// Returns true for every terrain except river.
    #[must_use]
    pub const fn is_land(self) -> bool {
        !matches!(self, Self::River)
    }
}

impl fmt::Display for Terrain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
