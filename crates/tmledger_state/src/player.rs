//! Per-player state.

use im::Vector;
use tmledger_foundation::{
    BonusCard, CultTrack, Error, Faction, FavorTile, Resource, Resources, Result, TownTile,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::power::PowerBowls;

/// Highest position on a cult track.
pub const CULT_MAX: u8 = 10;

/// Highest shipping level.
pub const SHIPPING_MAX: u8 = 3;

/// Highest digging level.
pub const DIGGING_MAX: u8 = 2;

/// Starting victory points.
pub const STARTING_VP: i32 = 20;

/// A seated player.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Player {
    /// The player's faction.
    pub faction: Faction,
    /// Coins.
    pub coins: i32,
    /// Workers.
    pub workers: i32,
    /// Priests in supply.
    pub priests: i32,
    /// Power bowls.
    pub power: PowerBowls,
    /// Victory points.
    pub vp: i32,
    /// Cult positions, indexed by [`CultTrack::index`].
    pub cults: [u8; 4],
    /// Shipping level.
    pub shipping: u8,
    /// Digging level (each level saves one worker per spade).
    pub digging: u8,
    /// Whether the player passed this round.
    pub passed: bool,
    /// The bonus card currently held.
    pub bonus: Option<BonusCard>,
    /// Favor tiles taken.
    pub favors: Vector<FavorTile>,
    /// Town tiles taken.
    pub towns: Vector<TownTile>,
    /// Town keys held.
    pub keys: u8,
    /// Whether the stronghold special action was used this round.
    pub stronghold_action_used: bool,
    /// Whether the bonus card action was used this round.
    pub bonus_action_used: bool,
    /// Whether a favor tile action was used this round.
    pub favor_action_used: bool,
    /// Whether the faction's stronghold is built.
    pub has_stronghold: bool,
}

impl Player {
    /// Creates a player with the faction's starting resources.
    #[must_use]
    pub fn new(faction: Faction) -> Self {
        let mut player = Self {
            faction,
            coins: 15,
            workers: 3,
            priests: 0,
            power: PowerBowls::new(5, 7, 0),
            vp: STARTING_VP,
            cults: [0; 4],
            shipping: 0,
            digging: 0,
            passed: false,
            bonus: None,
            favors: Vector::new(),
            towns: Vector::new(),
            keys: 0,
            stronghold_action_used: false,
            bonus_action_used: false,
            favor_action_used: false,
            has_stronghold: false,
        };
        match faction {
            Faction::Engineers => {
                player.coins = 10;
                player.workers = 2;
                player.power = PowerBowls::new(3, 9, 0);
            }
            Faction::Darklings => {
                player.workers = 1;
                player.priests = 1;
                player.cults = [0, 1, 1, 0];
            }
            Faction::Swarmlings => {
                player.coins = 20;
                player.workers = 8;
                player.power = PowerBowls::new(3, 9, 0);
                player.cults = [1, 1, 1, 1];
            }
            Faction::Nomads => {
                player.workers = 2;
                player.cults = [1, 0, 1, 0];
            }
            Faction::ChaosMagicians => {
                player.workers = 4;
                player.cults = [2, 0, 0, 0];
            }
            Faction::Fakirs => {
                player.power = PowerBowls::new(7, 5, 0);
                player.cults = [1, 0, 0, 1];
            }
            Faction::Halflings => {
                player.power = PowerBowls::new(3, 9, 0);
                player.cults = [0, 0, 1, 1];
            }
            Faction::Mermaids => {
                player.power = PowerBowls::new(3, 9, 0);
                player.cults = [0, 2, 0, 0];
            }
            Faction::Cultists => player.cults = [1, 0, 1, 0],
            Faction::Auren => player.cults = [0, 1, 0, 1],
            Faction::Witches => player.cults = [0, 0, 0, 2],
            Faction::Giants => player.cults = [1, 0, 0, 1],
            Faction::Dwarves => player.cults = [0, 0, 2, 0],
            Faction::Alchemists => player.cults = [1, 1, 0, 0],
            Faction::Engineers | Faction::Darklings => {}
        }
        player
    }

    /// Returns the amount of a resource available to spend.
    ///
    /// Power means tokens in bowl III.
    #[must_use]
    pub const fn available(&self, resource: Resource) -> i32 {
        match resource {
            Resource::Coins => self.coins,
            Resource::Workers => self.workers,
            Resource::Priests => self.priests,
            Resource::Power => self.power.bowl3,
            Resource::VictoryPoints => self.vp,
        }
    }

    /// Checks that a bundle can be paid.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientResources` naming the first short resource.
    pub fn can_afford(&self, cost: &Resources) -> Result<()> {
        for (resource, need) in cost.iter() {
            let have = self.available(resource);
            if need > have {
                return Err(Error::insufficient(resource, need, have));
            }
        }
        Ok(())
    }

    /// Pays a bundle. Power is spent from bowl III into bowl I.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientResources` without changing anything if any part
    /// of the bundle cannot be paid.
    pub fn pay(&mut self, cost: &Resources) -> Result<()> {
        self.can_afford(cost)?;
        self.coins -= cost.coins;
        self.workers -= cost.workers;
        self.priests -= cost.priests;
        self.vp -= cost.vp;
        self.power.spend(cost.power)?;
        Ok(())
    }

    /// Receives a bundle. Power goes through the gain cycle.
    pub fn receive(&mut self, reward: &Resources) {
        self.coins += reward.coins;
        self.workers += reward.workers;
        self.priests += reward.priests;
        self.vp += reward.vp;
        self.power.gain(reward.power);
    }

    /// Returns the position on a cult track.
    #[must_use]
    pub const fn cult(&self, track: CultTrack) -> u8 {
        self.cults[track.index()]
    }

    /// Moves on a cult track, clamped to `0..=10`, and returns the power
    /// earned for crossing positions 3, 5, 7 and 10.
    ///
    /// Each track at 10 uses up one town key; without a spare key the
    /// marker stops at 9.
    pub fn advance_cult(&mut self, track: CultTrack, steps: i32) -> i32 {
        let before = i32::from(self.cults[track.index()]);
        let topped = self.cults.iter().filter(|c| **c == CULT_MAX).count();
        let cap = if usize::from(self.keys) > topped { CULT_MAX } else { CULT_MAX - 1 };
        let cap = i32::from(cap).max(before);
        let after = (before + steps).clamp(0, cap);
        self.cults[track.index()] = u8::try_from(after).unwrap_or(0);
        if after <= before {
            return 0;
        }
        let earned = [(3, 1), (5, 2), (7, 2), (10, 3)]
            .into_iter()
            .filter(|(threshold, _)| before < *threshold && after >= *threshold)
            .map(|(_, pw)| pw)
            .sum();
        self.power.gain(earned);
        earned
    }

    /// Spades' worker cost at the current digging level.
    #[must_use]
    pub fn workers_per_spade(&self) -> i32 {
        3 - i32::from(self.digging)
    }

    /// Clears the per-round flags.
    pub fn reset_round(&mut self) {
        self.passed = false;
        self.stronghold_action_used = false;
        self.bonus_action_used = false;
        self.favor_action_used = false;
    }
}
