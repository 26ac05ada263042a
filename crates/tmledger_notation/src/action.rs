//! The closed action model.
//!
//! Every ledger line, in either source format, ends up as one [`Action`].
//! Each variant carries its actor; a [`Action::Compound`] takes the actor of
//! its first sub-action.
//!
//! Rendering back to canonical tokens lives in `Display`, so
//! `action.to_string()` is the cell text the emitter writes.

use std::fmt;

use tmledger_foundation::{
    BonusCard, Building, CultTrack, Faction, FavorTile, Hex, PowerAction, Resources, Terrain,
    TownTile, format_log_coord,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A faction-specific or card-specific special action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SpecialAction {
    /// Witches stronghold: a free dwelling on any forest hex (`ACT-SH-D-c`).
    WitchesRide(Hex),
    /// Nomads stronghold: turn a hex to desert, optionally building (`ACT-SH-T-c`).
    Sandstorm {
        /// Target hex.
        hex: Hex,
        /// Whether a dwelling is built in the same action.
        build: bool,
    },
    /// Giants stronghold: two free spades (`ACT-SH-S-c`).
    GiantsTransform {
        /// Target hex.
        hex: Hex,
        /// Whether a dwelling is built in the same action.
        build: bool,
    },
    /// Swarmlings stronghold: a free trading house upgrade (`ACT-SH-TP-c`).
    SwarmlingsUpgrade(Hex),
    /// Chaos Magicians stronghold: two actions in one turn (`ACT-SH-2X`).
    DoubleTurn,
    /// Auren stronghold: two steps on a cult track (`ACT-SH-<T>`).
    AurenCult(CultTrack),
    /// Water-2 favor tile: one cult step (`ACT-FAV[-T]`).
    FavorCult(Option<CultTrack>),
    /// Cult bonus card: one cult step (`ACT-BON-<T>`).
    BonusCult(CultTrack),
    /// Spade bonus card used without a target; the spade stays pending
    /// (`ACT-BON-SPD`).
    BonusSpadeGrant,
    /// Spade bonus card applied to a hex (`ACTS-c[-T]`).
    BonusSpade {
        /// Target hex.
        hex: Hex,
        /// Target terrain; `None` means the actor's home terrain.
        terrain: Option<Terrain>,
        /// Whether a dwelling is built in the same action.
        build: bool,
    },
    /// Engineers stronghold bridge for two workers (`ACT-BR-c-c`).
    EngineersBridge(Hex, Hex),
    /// Mermaids town across a river hex (`ACT-TOWN[-q_r]`).
    MermaidsTown(Option<Hex>),
    /// Darklings ordination: workers into priests (`ORD-n`).
    Ordination(u8),
}

/// One replayable action.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Action {
    /// Initial dwelling during setup.
    SetupDwelling {
        /// Actor.
        player: Faction,
        /// Target hex.
        hex: Hex,
    },
    /// Build a dwelling, terraforming to home terrain first if needed.
    Build {
        /// Actor.
        player: Faction,
        /// Target hex.
        hex: Hex,
    },
    /// Terraform and build in one step.
    TransformBuild {
        /// Actor.
        player: Faction,
        /// Target hex.
        hex: Hex,
        /// Target terrain; `None` means home terrain.
        terrain: Option<Terrain>,
    },
    /// Terraform without building.
    Transform {
        /// Actor.
        player: Faction,
        /// Target hex.
        hex: Hex,
        /// Target terrain; `None` means home terrain.
        terrain: Option<Terrain>,
    },
    /// Spend a fixed number of spades toward home terrain.
    Dig {
        /// Actor.
        player: Faction,
        /// Spades spent.
        spades: u8,
        /// Target hex.
        hex: Hex,
    },
    /// Upgrade a building.
    Upgrade {
        /// Actor.
        player: Faction,
        /// Target hex.
        hex: Hex,
        /// The building upgraded to.
        to: Building,
    },
    /// A power action space.
    PowerAction {
        /// Actor.
        player: Faction,
        /// The space taken.
        action: PowerAction,
        /// Bridge endpoints for `ACT1`.
        bridge: Option<(Hex, Hex)>,
    },
    /// Accept a leech offer.
    AcceptLeech {
        /// Actor.
        player: Faction,
        /// Expected source of the offer.
        from: Option<Faction>,
        /// Explicit power amount.
        amount: Option<i32>,
        /// Explicit VP cost.
        vp_cost: Option<i32>,
    },
    /// Decline a leech offer.
    DeclineLeech {
        /// Actor.
        player: Faction,
        /// Expected source of the offer.
        from: Option<Faction>,
    },
    /// Burn power: bowl II loses `2n`, bowl III gains `n`.
    Burn {
        /// Actor.
        player: Faction,
        /// Power gained in bowl III.
        amount: u8,
    },
    /// Exchange resources.
    Conversion {
        /// Actor.
        player: Faction,
        /// What is spent.
        cost: Resources,
        /// What is received.
        reward: Resources,
    },
    /// Take a favor tile.
    FavorTile {
        /// Actor.
        player: Faction,
        /// The tile.
        tile: FavorTile,
    },
    /// Take a town tile.
    TownTile {
        /// Actor.
        player: Faction,
        /// The tile.
        tile: TownTile,
    },
    /// Select a bonus card during setup.
    BonusCard {
        /// Actor.
        player: Faction,
        /// The card.
        card: BonusCard,
    },
    /// Pass, optionally taking a bonus card.
    Pass {
        /// Actor.
        player: Faction,
        /// The card taken.
        bonus: Option<BonusCard>,
    },
    /// Send a priest to a cult track.
    SendPriest {
        /// Actor.
        player: Faction,
        /// The track.
        track: CultTrack,
        /// Spaces climbed (3, 2, or 1 when returned to supply).
        spaces: Option<u8>,
    },
    /// One step up a cult track.
    CultAdvance {
        /// Actor.
        player: Faction,
        /// The track.
        track: CultTrack,
    },
    /// One step down a cult track, or a selector before a cult town tile.
    CultDecrease {
        /// Actor.
        player: Faction,
        /// The track.
        track: CultTrack,
    },
    /// Advance shipping by one.
    AdvanceShipping {
        /// Actor.
        player: Faction,
    },
    /// Advance digging by one.
    AdvanceDigging {
        /// Actor.
        player: Faction,
    },
    /// A faction or card special action.
    Special {
        /// Actor.
        player: Faction,
        /// Which one.
        action: SpecialAction,
    },
    /// Halflings stronghold spades spent on a run of transforms.
    HalflingsSpade {
        /// Actor.
        player: Faction,
        /// Each transformed hex and its target terrain (home when `None`).
        transforms: Vec<(Hex, Option<Terrain>)>,
    },
    /// An action logged before the round's income.
    PreIncome(Box<Action>),
    /// An action logged after income, before the action phase.
    PostIncome(Box<Action>),
    /// Several actions in one cell.
    Compound(Vec<Action>),
}

impl Action {
    /// Returns the acting faction. Compounds report their first sub-action's
    /// actor; an empty compound has none.
    #[must_use]
    pub fn actor(&self) -> Option<Faction> {
        match self {
            Self::SetupDwelling { player, .. }
            | Self::Build { player, .. }
            | Self::TransformBuild { player, .. }
            | Self::Transform { player, .. }
            | Self::Dig { player, .. }
            | Self::Upgrade { player, .. }
            | Self::PowerAction { player, .. }
            | Self::AcceptLeech { player, .. }
            | Self::DeclineLeech { player, .. }
            | Self::Burn { player, .. }
            | Self::Conversion { player, .. }
            | Self::FavorTile { player, .. }
            | Self::TownTile { player, .. }
            | Self::BonusCard { player, .. }
            | Self::Pass { player, .. }
            | Self::SendPriest { player, .. }
            | Self::CultAdvance { player, .. }
            | Self::CultDecrease { player, .. }
            | Self::AdvanceShipping { player }
            | Self::AdvanceDigging { player }
            | Self::Special { player, .. }
            | Self::HalflingsSpade { player, .. } => Some(*player),
            Self::PreIncome(inner) | Self::PostIncome(inner) => inner.actor(),
            Self::Compound(actions) => actions.first().and_then(Self::actor),
        }
    }

    /// Returns true for actions that never make up a turn on their own.
    ///
    /// Income wrappers inherit the classification of what they wrap.
    #[must_use]
    pub fn is_auxiliary(&self) -> bool {
        match self {
            Self::Conversion { .. }
            | Self::Burn { .. }
            | Self::FavorTile { .. }
            | Self::TownTile { .. }
            | Self::CultAdvance { .. }
            | Self::CultDecrease { .. }
            | Self::BonusCard { .. }
            | Self::HalflingsSpade { .. }
            | Self::AcceptLeech { .. }
            | Self::DeclineLeech { .. } => true,
            Self::PreIncome(inner) | Self::PostIncome(inner) => inner.is_auxiliary(),
            Self::Compound(actions) => !compound_has_main(actions),
            _ => false,
        }
    }

    /// Returns true for a leech accept or decline.
    #[must_use]
    pub const fn is_reaction(&self) -> bool {
        matches!(self, Self::AcceptLeech { .. } | Self::DeclineLeech { .. })
    }

    /// Returns true if the action places or upgrades a building, and so can
    /// make leech offers to neighbours.
    #[must_use]
    pub fn is_trigger_capable(&self) -> bool {
        match self {
            Self::Build { .. } | Self::TransformBuild { .. } | Self::Upgrade { .. } => true,
            Self::Special { action, .. } => matches!(
                action,
                SpecialAction::WitchesRide(_)
                    | SpecialAction::SwarmlingsUpgrade(_)
                    | SpecialAction::Sandstorm { build: true, .. }
                    | SpecialAction::GiantsTransform { build: true, .. }
                    | SpecialAction::BonusSpade { build: true, .. }
            ),
            Self::PreIncome(inner) | Self::PostIncome(inner) => inner.is_trigger_capable(),
            Self::Compound(actions) => actions.iter().any(Self::is_trigger_capable),
            _ => false,
        }
    }

    /// Flattens compounds into their leaves, in order.
    #[must_use]
    pub fn leaves(&self) -> Vec<&Self> {
        match self {
            Self::Compound(actions) => actions.iter().flat_map(Self::leaves).collect(),
            other => vec![other],
        }
    }
}

/// Returns true if any action in the list is not auxiliary.
#[must_use]
pub fn compound_has_main(actions: &[Action]) -> bool {
    actions.iter().any(|a| !a.is_auxiliary())
}

fn coord(hex: Hex) -> String {
    format_log_coord(hex).unwrap_or_else(|_| format!("{}_{}", hex.q, hex.r))
}

fn terrain_suffix(player: Faction, terrain: Option<Terrain>) -> String {
    match terrain {
        Some(t) if t != player.home_terrain() => format!("-{}", t.code()),
        _ => String::new(),
    }
}

fn source_suffix(from: Option<Faction>) -> String {
    from.map(|f| format!("-{}", f.title().replace(' ', "")))
        .unwrap_or_default()
}

impl SpecialAction {
    fn render(self, player: Faction) -> String {
        match self {
            Self::WitchesRide(hex) => format!("ACT-SH-D-{}", coord(hex)),
            Self::Sandstorm { hex, build } => with_build("ACT-SH-T-", hex, build),
            Self::GiantsTransform { hex, build } => with_build("ACT-SH-S-", hex, build),
            Self::SwarmlingsUpgrade(hex) => format!("ACT-SH-TP-{}", coord(hex)),
            Self::DoubleTurn => "ACT-SH-2X".to_string(),
            Self::AurenCult(track) => format!("ACT-SH-{track}"),
            Self::FavorCult(Some(track)) => format!("ACT-FAV-{track}"),
            Self::FavorCult(None) => "ACT-FAV".to_string(),
            Self::BonusCult(track) => format!("ACT-BON-{track}"),
            Self::BonusSpadeGrant => "ACT-BON-SPD".to_string(),
            Self::BonusSpade {
                hex,
                terrain,
                build,
            } => {
                let c = coord(hex);
                let mut out = format!("ACTS-{c}{}", terrain_suffix(player, terrain));
                if build {
                    out.push('.');
                    out.push_str(&c);
                }
                out
            }
            Self::EngineersBridge(a, b) => format!("ACT-BR-{}-{}", coord(a), coord(b)),
            Self::MermaidsTown(Some(hex)) => format!("ACT-TOWN-{}_{}", hex.q, hex.r),
            Self::MermaidsTown(None) => "ACT-TOWN".to_string(),
            Self::Ordination(n) => format!("ORD-{n}"),
        }
    }
}

fn with_build(prefix: &str, hex: Hex, build: bool) -> String {
    let c = coord(hex);
    if build {
        format!("{prefix}{c}.{c}")
    } else {
        format!("{prefix}{c}")
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetupDwelling { hex, .. } => write!(f, "S-{}", coord(*hex)),
            Self::Build { hex, .. } => f.write_str(&coord(*hex)),
            Self::TransformBuild {
                player,
                hex,
                terrain,
            } => write!(f, "TB-{}{}", coord(*hex), terrain_suffix(*player, *terrain)),
            Self::Transform {
                player,
                hex,
                terrain,
            } => write!(f, "T-{}{}", coord(*hex), terrain_suffix(*player, *terrain)),
            Self::Dig { spades, hex, .. } => write!(f, "DIG{spades}-{}", coord(*hex)),
            Self::Upgrade { hex, to, .. } => write!(f, "UP-{}-{}", to.code(), coord(*hex)),
            Self::PowerAction { action, bridge, .. } => match bridge {
                Some((a, b)) => write!(f, "{}-{}-{}", action.code(), coord(*a), coord(*b)),
                None => f.write_str(action.code()),
            },
            Self::AcceptLeech { from, amount, .. } => {
                f.write_str("L")?;
                if let Some(n) = amount {
                    write!(f, "{n}")?;
                }
                f.write_str(&source_suffix(*from))
            }
            Self::DeclineLeech { from, .. } => write!(f, "DL{}", source_suffix(*from)),
            Self::Burn { amount, .. } => write!(f, "BURN{amount}"),
            Self::Conversion { cost, reward, .. } => write!(f, "C{cost}:{reward}"),
            Self::FavorTile { tile, .. } => f.write_str(&tile.code()),
            Self::TownTile { tile, .. } => f.write_str(&tile.code()),
            Self::BonusCard { card, .. } => f.write_str(card.code()),
            Self::Pass { bonus, .. } => match bonus {
                Some(card) => write!(f, "PASS-{}", card.code()),
                None => f.write_str("PASS"),
            },
            Self::SendPriest { track, spaces, .. } => match spaces {
                Some(n) => write!(f, "->{track}{n}"),
                None => write!(f, "->{track}"),
            },
            Self::CultAdvance { track, .. } => write!(f, "+{track}"),
            Self::CultDecrease { track, .. } => write!(f, "-{track}"),
            Self::AdvanceShipping { .. } => f.write_str("+SHIP"),
            Self::AdvanceDigging { .. } => f.write_str("+DIG"),
            Self::Special { player, action } => f.write_str(&action.render(*player)),
            Self::HalflingsSpade { player, transforms } => {
                let parts: Vec<String> = transforms
                    .iter()
                    .map(|(hex, terrain)| format!("T-{}{}", coord(*hex), terrain_suffix(*player, *terrain)))
                    .collect();
                f.write_str(&parts.join("."))
            }
            Self::PreIncome(inner) => write_wrapped(f, "PRE-", inner),
            Self::PostIncome(inner) => write_wrapped(f, "POST-", inner),
            Self::Compound(actions) => {
                let parts: Vec<String> = actions.iter().map(ToString::to_string).collect();
                f.write_str(&parts.join("."))
            }
        }
    }
}

// Wrapping a compound prefixes each part, so the token still splits on '.'.
fn write_wrapped(f: &mut fmt::Formatter<'_>, prefix: &str, inner: &Action) -> fmt::Result {
    match inner {
        Action::Compound(actions) => {
            let parts: Vec<String> = actions.iter().map(|a| format!("{prefix}{a}")).collect();
            f.write_str(&parts.join("."))
        }
        other => write!(f, "{prefix}{other}"),
    }
}
