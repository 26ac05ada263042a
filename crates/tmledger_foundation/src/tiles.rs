//! Buildings, cult tracks, and the tile and card tables.
//!
//! Each table maps between the source ledgers' identifiers (`FAV5`, `BON2`,
//! `TW4`) and the canonical notation codes (`FAV-F2`, `BON-4C`, `TW6VP`).

use std::fmt;

/// A building type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Building {
    /// Dwelling.
    Dwelling,
    /// Trading house.
    TradingHouse,
    /// Temple.
    Temple,
    /// Stronghold.
    Stronghold,
    /// Sanctuary.
    Sanctuary,
}

impl Building {
    /// Returns the code used in upgrade tokens (`UP-TH-C4`).
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Dwelling => "D",
            Self::TradingHouse => "TH",
            Self::Temple => "TE",
            Self::Stronghold => "SH",
            Self::Sanctuary => "SA",
        }
    }

    /// Parses a building code; `TP` is accepted for trading house.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_ascii_uppercase().as_str() {
            "D" => Some(Self::Dwelling),
            "TH" | "TP" => Some(Self::TradingHouse),
            "TE" => Some(Self::Temple),
            "SH" => Some(Self::Stronghold),
            "SA" => Some(Self::Sanctuary),
            _ => None,
        }
    }

    /// Parses a narrative building name such as "Trading house" or
    /// "Faction Stronghold".
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        if lower.contains("dwelling") {
            Some(Self::Dwelling)
        } else if lower.contains("trading") {
            Some(Self::TradingHouse)
        } else if lower.contains("temple") {
            Some(Self::Temple)
        } else if lower.contains("stronghold") {
            Some(Self::Stronghold)
        } else if lower.contains("sanctuary") {
            Some(Self::Sanctuary)
        } else {
            None
        }
    }

    /// Returns the power value neighbours may leech from this building.
    #[must_use]
    pub const fn power_value(self) -> u8 {
        match self {
            Self::Dwelling => 1,
            Self::TradingHouse | Self::Temple => 2,
            Self::Stronghold | Self::Sanctuary => 3,
        }
    }

    /// Returns the building this one may be upgraded from.
    #[must_use]
    pub const fn upgrades_from(self) -> Option<Self> {
        match self {
            Self::Dwelling => None,
            Self::TradingHouse => Some(Self::Dwelling),
            Self::Temple | Self::Stronghold => Some(Self::TradingHouse),
            Self::Sanctuary => Some(Self::Temple),
        }
    }
}

impl fmt::Display for Building {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One of the four cult tracks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CultTrack {
    /// Fire.
    Fire,
    /// Water.
    Water,
    /// Earth.
    Earth,
    /// Air.
    Air,
}

impl CultTrack {
    /// All tracks in board order.
    pub const ALL: [Self; 4] = [Self::Fire, Self::Water, Self::Earth, Self::Air];

    /// Returns the single-letter code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Fire => "F",
            Self::Water => "W",
            Self::Earth => "E",
            Self::Air => "A",
        }
    }

    /// Parses a letter code or a track name (`FIRE`, `water`).
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "F" | "FIRE" => Some(Self::Fire),
            "W" | "WATER" => Some(Self::Water),
            "E" | "EARTH" => Some(Self::Earth),
            "A" | "AIR" => Some(Self::Air),
            _ => None,
        }
    }

    /// Returns the track's index into per-player cult arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Fire => 0,
            Self::Water => 1,
            Self::Earth => 2,
            Self::Air => 3,
        }
    }
}

impl fmt::Display for CultTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A favor tile, identified by its cult track and step count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FavorTile {
    /// The cult track the tile advances.
    pub track: CultTrack,
    /// Steps gained on the track (1 to 3).
    pub steps: u8,
}

impl FavorTile {
    /// Creates a favor tile if the step count is valid.
    #[must_use]
    pub const fn new(track: CultTrack, steps: u8) -> Option<Self> {
        if steps >= 1 && steps <= 3 {
            Some(Self { track, steps })
        } else {
            None
        }
    }

    /// Maps a ledger favor index (`FAV1`..`FAV12`) to a tile.
    ///
    /// The ledger numbers the 3-step tiles first, then 2-step, then 1-step,
    /// each in Fire, Water, Earth, Air order.
    #[must_use]
    pub fn from_ledger_index(index: u8) -> Option<Self> {
        if !(1..=12).contains(&index) {
            return None;
        }
        let zero = index - 1;
        let track = CultTrack::ALL[usize::from(zero % 4)];
        Self::new(track, 3 - zero / 4)
    }

    /// Returns the canonical code (`FAV-F2`).
    #[must_use]
    pub fn code(self) -> String {
        format!("FAV-{}{}", self.track.code(), self.steps)
    }

    /// Parses a canonical code (`FAV-F2`, case-insensitive).
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        let upper = code.trim().to_ascii_uppercase();
        let rest = upper.strip_prefix("FAV-")?;
        let mut chars = rest.chars();
        let track = CultTrack::from_code(&chars.next()?.to_string())?;
        let steps: u8 = chars.as_str().parse().ok()?;
        Self::new(track, steps)
    }

    /// Every favor tile in ledger order.
    #[must_use]
    pub fn all() -> Vec<Self> {
        (1..=12).filter_map(Self::from_ledger_index).collect()
    }
}

impl fmt::Display for FavorTile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code())
    }
}

/// A bonus card.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BonusCard {
    /// Spade action, +2 coins.
    Spade,
    /// Cult action, +4 coins.
    CultAction,
    /// +6 coins.
    SixCoins,
    /// +1 shipping, +3 power.
    Shipping,
    /// +1 worker, +3 power.
    WorkerPower,
    /// Stronghold/sanctuary pass VP, +2 workers.
    BigBuildings,
    /// Trading house pass VP, +1 worker.
    TradingHouses,
    /// +1 priest.
    Priest,
    /// Dwelling pass VP, +2 coins.
    Dwellings,
    /// Shipping pass VP, +3 power.
    ShippingVp,
}

impl BonusCard {
    /// Every card in ledger order (`BON1`..`BON10`).
    pub const ALL: [Self; 10] = [
        Self::Spade,
        Self::CultAction,
        Self::SixCoins,
        Self::Shipping,
        Self::WorkerPower,
        Self::BigBuildings,
        Self::TradingHouses,
        Self::Priest,
        Self::Dwellings,
        Self::ShippingVp,
    ];

    /// Returns the canonical code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Spade => "BON-SPD",
            Self::CultAction => "BON-4C",
            Self::SixCoins => "BON-6C",
            Self::Shipping => "BON-SHIP",
            Self::WorkerPower => "BON-WP",
            Self::BigBuildings => "BON-BB",
            Self::TradingHouses => "BON-TP",
            Self::Priest => "BON-P",
            Self::Dwellings => "BON-DW",
            Self::ShippingVp => "BON-SHIP-VP",
        }
    }

    /// Parses a canonical code (`BON-4C`) or ledger id (`BON2`).
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        let upper = code.trim().to_ascii_uppercase();
        if let Some(n) = upper.strip_prefix("BON").and_then(|r| r.parse::<u8>().ok()) {
            return Self::from_ledger_index(n);
        }
        Self::ALL.into_iter().find(|c| c.code() == upper)
    }

    /// Maps a ledger index (1-based) to a card.
    #[must_use]
    pub fn from_ledger_index(index: u8) -> Option<Self> {
        let i = usize::from(index.checked_sub(1)?);
        Self::ALL.get(i).copied()
    }

    /// Returns the 1-based ledger index.
    #[must_use]
    pub fn ledger_index(self) -> u8 {
        let i = Self::ALL.iter().position(|c| *c == self).unwrap_or(0);
        u8::try_from(i + 1).unwrap_or(0)
    }
}

impl fmt::Display for BonusCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A town tile, identified by its victory point value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TownTile {
    /// 5 VP, +6 coins.
    Vp5,
    /// 7 VP, +2 workers.
    Vp7,
    /// 9 VP, +1 priest.
    Vp9,
    /// 6 VP, +8 power.
    Vp6,
    /// 8 VP, +1 on every cult track.
    Vp8,
    /// 2 VP, +2 on every cult track.
    Vp2,
    /// 4 VP, +1 shipping.
    Vp4,
    /// 11 VP.
    Vp11,
}

impl TownTile {
    /// Every tile in ledger order (`TW1`..`TW8`).
    pub const ALL: [Self; 8] = [
        Self::Vp5,
        Self::Vp7,
        Self::Vp9,
        Self::Vp6,
        Self::Vp8,
        Self::Vp2,
        Self::Vp4,
        Self::Vp11,
    ];

    /// Returns the victory points awarded.
    #[must_use]
    pub const fn vp(self) -> u8 {
        match self {
            Self::Vp5 => 5,
            Self::Vp7 => 7,
            Self::Vp9 => 9,
            Self::Vp6 => 6,
            Self::Vp8 => 8,
            Self::Vp2 => 2,
            Self::Vp4 => 4,
            Self::Vp11 => 11,
        }
    }

    /// Looks a tile up by its VP value.
    #[must_use]
    pub fn from_vp(vp: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.vp() == vp)
    }

    /// Maps a ledger index (`TW1`..`TW8`) to a tile.
    #[must_use]
    pub fn from_ledger_index(index: u8) -> Option<Self> {
        let i = usize::from(index.checked_sub(1)?);
        Self::ALL.get(i).copied()
    }

    /// Returns the canonical code (`TW6VP`).
    #[must_use]
    pub fn code(self) -> String {
        format!("TW{}VP", self.vp())
    }

    /// Parses a canonical code (`TW6VP`, case-insensitive).
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        let upper = code.trim().to_ascii_uppercase();
        let vp = upper.strip_prefix("TW")?.strip_suffix("VP")?;
        Self::from_vp(vp.parse().ok()?)
    }
}

impl fmt::Display for TownTile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code())
    }
}

/// One of the six shared power action spaces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PowerAction {
    /// ACT1: build a bridge.
    Bridge,
    /// ACT2: gain a priest.
    Priest,
    /// ACT3: gain two workers.
    Workers,
    /// ACT4: gain seven coins.
    Coins,
    /// ACT5: one spade.
    Spade,
    /// ACT6: two spades.
    TwoSpades,
}

impl PowerAction {
    /// Every power action in board order.
    pub const ALL: [Self; 6] = [
        Self::Bridge,
        Self::Priest,
        Self::Workers,
        Self::Coins,
        Self::Spade,
        Self::TwoSpades,
    ];

    /// Returns the power cost from bowl III.
    #[must_use]
    pub const fn cost(self) -> u8 {
        match self {
            Self::Bridge | Self::Priest => 3,
            Self::Workers | Self::Coins | Self::Spade => 4,
            Self::TwoSpades => 6,
        }
    }

    /// Returns the canonical code (`ACT1`..`ACT6`).
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Bridge => "ACT1",
            Self::Priest => "ACT2",
            Self::Workers => "ACT3",
            Self::Coins => "ACT4",
            Self::Spade => "ACT5",
            Self::TwoSpades => "ACT6",
        }
    }

    /// Parses `ACT1`..`ACT6` (case-insensitive).
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        let upper = code.trim().to_ascii_uppercase();
        Self::ALL.into_iter().find(|a| a.code() == upper)
    }

    /// Identifies a power action from a narrative "spends N to get M" pair.
    #[must_use]
    pub const fn from_spend(cost: u32, reward: u32) -> Option<Self> {
        match (cost, reward) {
            (3, 1) => Some(Self::Priest),
            (3, _) => Some(Self::Bridge),
            (4, 2) => Some(Self::Workers),
            (4, 7) => Some(Self::Coins),
            (4, 1) => Some(Self::Spade),
            (6, 2) => Some(Self::TwoSpades),
            _ => None,
        }
    }

    /// Spades granted by this action.
    #[must_use]
    pub const fn spades(self) -> u8 {
        match self {
            Self::Spade => 1,
            Self::TwoSpades => 2,
            _ => 0,
        }
    }
}

impl fmt::Display for PowerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
