//! The game state replay runs against.
//!
//! All collections are `im` persistent structures, so cloning a
//! [`GameState`] is cheap and clones share structure. The step-through
//! session keeps a history of clones to step backwards.

use im::{OrdMap, OrdSet, Vector};
use tmledger_foundation::{
    BonusCard, Building, CultTrack, Error, ErrorKind, Faction, FavorTile, Hex, PowerAction,
    Resources, Result, TownTile,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::income;
use crate::map::MapState;
use crate::pending::{LeechOffer, Pending};
use crate::player::Player;

/// Order spaces below each cult track.
pub const ORDER_SPACES: u8 = 4;

/// Game phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Phase {
    /// Initial dwellings and bonus cards.
    Setup,
    /// Action rounds.
    Action,
}

/// The full replay state.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GameState {
    players: OrdMap<Faction, Player>,
    /// The board.
    pub map: MapState,
    /// Pending offers and selections.
    pub pending: Pending,
    /// Current round (0 during setup).
    pub round: u32,
    /// Current phase.
    pub phase: Phase,
    /// This round's turn order.
    pub turn_order: Vector<Faction>,
    /// Index into `turn_order` of the player to act.
    pub current: usize,
    /// Order in which players passed this round.
    pub pass_order: Vector<Faction>,
    /// Power actions taken this round.
    pub power_actions_used: OrdSet<PowerAction>,
    /// Favor tiles remaining in supply.
    pub favor_pool: OrdMap<FavorTile, u8>,
    /// Town tiles remaining in supply.
    pub town_pool: OrdMap<TownTile, u8>,
    /// Bonus cards on the table.
    pub bonus_pool: OrdSet<BonusCard>,
    /// Priests placed on each track's order spaces.
    pub order_spaces: OrdMap<CultTrack, u8>,
    /// While set, [`GameState::next_turn`] is not called by single actions.
    pub suppress_turn_advance: bool,
    /// Turns advanced so far.
    pub turns_taken: u64,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    /// Creates an empty game with full tile supplies.
    #[must_use]
    pub fn new() -> Self {
        let favor_pool = FavorTile::all()
            .into_iter()
            .map(|t| (t, if t.steps == 3 { 1 } else { 3 }))
            .collect();
        let town_pool = TownTile::ALL.into_iter().map(|t| (t, 2)).collect();
        Self {
            players: OrdMap::new(),
            map: MapState::new(),
            pending: Pending::default(),
            round: 0,
            phase: Phase::Setup,
            turn_order: Vector::new(),
            current: 0,
            pass_order: Vector::new(),
            power_actions_used: OrdSet::new(),
            favor_pool,
            town_pool,
            bonus_pool: BonusCard::ALL.into_iter().collect(),
            order_spaces: OrdMap::new(),
            suppress_turn_advance: false,
            turns_taken: 0,
        }
    }

    // --- Players ---

    /// Seats a faction. Seating order becomes the initial turn order.
    ///
    /// # Errors
    ///
    /// Returns `IllegalAction` if the faction is already seated.
    pub fn add_player(&mut self, faction: Faction) -> Result<()> {
        if self.players.contains_key(&faction) {
            return Err(Error::illegal(format!("{faction} is already seated")));
        }
        self.players.insert(faction, Player::new(faction));
        self.turn_order.push_back(faction);
        Ok(())
    }

    /// Returns a seated player.
    #[must_use]
    pub fn player(&self, faction: Faction) -> Option<&Player> {
        self.players.get(&faction)
    }

    /// Returns a seated player, or `UnknownPlayer`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownPlayer` if the faction is not seated.
    pub fn require(&self, faction: Faction) -> Result<&Player> {
        self.player(faction)
            .ok_or_else(|| Error::unknown_player(faction.title()))
    }

    /// Returns a seated player mutably.
    ///
    /// # Errors
    ///
    /// Returns `UnknownPlayer` if the faction is not seated.
    pub fn player_mut(&mut self, faction: Faction) -> Result<&mut Player> {
        self.players
            .get_mut(&faction)
            .ok_or_else(|| Error::unknown_player(faction.title()))
    }

    /// Iterates over seated players in faction order.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    /// Returns the seated factions in faction order.
    #[must_use]
    pub fn factions(&self) -> Vec<Faction> {
        self.players.keys().copied().collect()
    }

    /// Returns the player whose turn it is.
    #[must_use]
    pub fn current_player(&self) -> Option<Faction> {
        self.turn_order.get(self.current).copied()
    }

    // --- Turns and rounds ---

    /// Advances to the next player who has not passed.
    ///
    /// Returns true when every player has passed.
    pub fn next_turn(&mut self) -> bool {
        self.turns_taken += 1;
        if self.turn_order.is_empty() {
            return true;
        }
        let len = self.turn_order.len();
        for step in 1..=len {
            let index = (self.current + step) % len;
            let faction = self.turn_order[index];
            if self.player(faction).is_some_and(|p| !p.passed) {
                self.current = index;
                return false;
            }
        }
        true
    }

    /// Starts an action round: pays income, clears power actions and passes,
    /// and installs the turn order.
    ///
    /// # Errors
    ///
    /// Returns `UnknownPlayer` if the turn order names an unseated faction.
    pub fn start_round(&mut self, round: u32, turn_order: &[Faction]) -> Result<()> {
        for faction in turn_order {
            self.require(*faction)?;
        }
        let grants: Vec<(Faction, Resources)> = self
            .players
            .values()
            .map(|p| (p.faction, income::income(p, &self.map)))
            .collect();
        for (faction, grant) in grants {
            let player = self.player_mut(faction)?;
            player.receive(&grant);
            player.reset_round();
        }
        self.round = round;
        self.phase = Phase::Action;
        self.power_actions_used = OrdSet::new();
        self.pending.spades.clear();
        self.pass_order = Vector::new();
        if !turn_order.is_empty() {
            self.turn_order = turn_order.iter().copied().collect();
        }
        self.current = 0;
        Ok(())
    }

    /// Returns true if every seated player has passed.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.players.values().all(|p| p.passed)
    }

    // --- Power actions ---

    /// Returns true if a power action space is free this round.
    #[must_use]
    pub fn power_action_available(&self, action: PowerAction) -> bool {
        !self.power_actions_used.contains(&action)
    }

    /// Marks a power action space as taken.
    ///
    /// # Errors
    ///
    /// Returns `PowerActionTaken` if it was already taken.
    pub fn mark_power_action(&mut self, action: PowerAction) -> Result<()> {
        if self.power_actions_used.insert(action).is_some() {
            return Err(Error::new(ErrorKind::PowerActionTaken(action.code().to_string())));
        }
        Ok(())
    }

    // --- Cult order spaces ---

    /// Places a priest below a track and returns the steps it climbs.
    ///
    /// Each track has one 3-step space and three 2-step spaces, filled in
    /// that order. With `requested` set, that many steps are climbed and a
    /// space is taken unless it is 1 (priest returned to supply). Without
    /// it, the next free space decides, or 1 when all four are taken.
    pub fn claim_order_space(&mut self, track: CultTrack, requested: Option<u8>) -> u8 {
        let taken = self.order_spaces.get(&track).copied().unwrap_or(0);
        let steps = requested.unwrap_or(match taken {
            0 => 3,
            1..=3 => 2,
            _ => 1,
        });
        if steps > 1 && taken < ORDER_SPACES {
            self.order_spaces.insert(track, taken + 1);
        }
        steps
    }

    // --- Map helpers ---

    /// Makes leech offers to every opponent adjacent to `hex`.
    pub fn trigger_leech(&mut self, hex: Hex, owner: Faction) {
        for (neighbor, value) in self.map.neighbors_owned_by_others(hex, owner) {
            let Some(player) = self.player(neighbor) else {
                continue;
            };
            if let Some(offer) = LeechOffer::capped(owner, i32::from(value), player.power.capacity()) {
                self.pending.offer_leech(neighbor, offer);
            }
        }
    }

    /// Terraform cost in workers for `spades` spades, after free spades.
    #[must_use]
    pub fn spade_cost(&self, faction: Faction, spades: u8) -> (u8, i32) {
        let free = self.pending.spades(faction).min(spades);
        let paid = i32::from(spades - free);
        let per = self.player(faction).map_or(3, Player::workers_per_spade);
        (free, paid * per)
    }

    /// Standard cost of building or upgrading to `building` at `hex`.
    #[must_use]
    pub fn building_cost(&self, faction: Faction, building: Building, hex: Hex) -> Resources {
        let neighboured = self.map.has_opponent_neighbor(hex, faction);
        let (workers, coins) = match (faction, building) {
            (Faction::Engineers, Building::Dwelling) => (1, 1),
            (Faction::Engineers, Building::TradingHouse) => (1, if neighboured { 2 } else { 4 }),
            (Faction::Engineers, Building::Temple) => (1, 4),
            (Faction::Engineers, Building::Stronghold | Building::Sanctuary) => (3, 6),
            (Faction::Swarmlings, Building::Dwelling) => (2, 3),
            (Faction::Swarmlings, Building::TradingHouse) => (3, if neighboured { 4 } else { 8 }),
            (Faction::Swarmlings, Building::Temple) => (3, 6),
            (Faction::Swarmlings, Building::Stronghold | Building::Sanctuary) => (5, 8),
            (_, Building::Dwelling) => (1, 2),
            (_, Building::TradingHouse) => (2, if neighboured { 3 } else { 6 }),
            (_, Building::Temple) => (2, 5),
            (Faction::ChaosMagicians, Building::Stronghold) => (4, 4),
            (Faction::Fakirs, Building::Stronghold) => (4, 10),
            (Faction::Darklings, Building::Sanctuary) => (4, 10),
            (
                Faction::Cultists | Faction::Nomads | Faction::Halflings,
                Building::Stronghold,
            )
            | (
                Faction::Cultists | Faction::ChaosMagicians | Faction::Auren | Faction::Mermaids,
                Building::Sanctuary,
            ) => (4, 8),
            (_, Building::Stronghold | Building::Sanctuary) => (4, 6),
        };
        Resources::new().with_workers(workers).with_coins(coins)
    }

    // --- Tiles and cards ---

    /// Gives a favor tile and applies its cult steps.
    ///
    /// # Errors
    ///
    /// Returns `IllegalAction` if the tile is out of supply or already held.
    pub fn take_favor(&mut self, faction: Faction, tile: FavorTile) -> Result<()> {
        let left = self.favor_pool.get(&tile).copied().unwrap_or(0);
        if left == 0 {
            return Err(Error::illegal(format!("{tile} is not available")));
        }
        if self.require(faction)?.favors.contains(&tile) {
            return Err(Error::illegal(format!("{faction} already holds {tile}")));
        }
        self.favor_pool.insert(tile, left - 1);
        let player = self.player_mut(faction)?;
        player.favors.push_back(tile);
        player.advance_cult(tile.track, i32::from(tile.steps));
        Ok(())
    }

    /// Gives a town tile, a key, and the tile's reward.
    ///
    /// For cult tiles, each entry in `lowered` reduces the gain on that track
    /// by one.
    ///
    /// # Errors
    ///
    /// Returns `IllegalAction` if the tile is out of supply.
    pub fn take_town(&mut self, faction: Faction, tile: TownTile, lowered: &[CultTrack]) -> Result<()> {
        let left = self.town_pool.get(&tile).copied().unwrap_or(0);
        if left == 0 {
            return Err(Error::illegal(format!("{tile} is not available")));
        }
        self.require(faction)?;
        self.town_pool.insert(tile, left - 1);
        let player = self.player_mut(faction)?;
        player.towns.push_back(tile);
        player.keys += 1;
        player.vp += i32::from(tile.vp());
        let r = Resources::new();
        match tile {
            TownTile::Vp5 => player.receive(&r.with_coins(6)),
            TownTile::Vp7 => player.receive(&r.with_workers(2)),
            TownTile::Vp9 => player.receive(&r.with_priests(1)),
            TownTile::Vp6 => player.receive(&r.with_power(8)),
            TownTile::Vp8 | TownTile::Vp2 => {
                let steps = if tile == TownTile::Vp8 { 1 } else { 2 };
                for track in CultTrack::ALL {
                    let skipped = lowered.iter().filter(|t| **t == track).count();
                    let skipped = i32::try_from(skipped).unwrap_or(i32::MAX);
                    let gain = (steps - skipped).max(0);
                    if gain > 0 {
                        player.advance_cult(track, gain);
                    }
                }
            }
            TownTile::Vp4 => player.shipping = (player.shipping + 1).min(crate::player::SHIPPING_MAX),
            TownTile::Vp11 => {}
        }
        Ok(())
    }

    /// Takes a bonus card from the table, returning any held card.
    ///
    /// # Errors
    ///
    /// Returns `IllegalAction` if the card is not on the table.
    pub fn take_bonus(&mut self, faction: Faction, card: BonusCard) -> Result<()> {
        if !self.bonus_pool.contains(&card) {
            return Err(Error::illegal(format!("{card} is not on the table")));
        }
        let previous = self.require(faction)?.bonus;
        self.bonus_pool.remove(&card);
        if let Some(old) = previous {
            self.bonus_pool.insert(old);
        }
        self.player_mut(faction)?.bonus = Some(card);
        Ok(())
    }

    /// Removes a bonus card from play (unused cards in smaller games).
    pub fn remove_bonus(&mut self, card: BonusCard) {
        self.bonus_pool.remove(&card);
    }

    /// Marks a player passed, scores pass VP, and swaps the bonus card.
    ///
    /// # Errors
    ///
    /// Returns `IllegalAction` if the player already passed or the card is
    /// not on the table.
    pub fn pass(&mut self, faction: Faction, card: Option<BonusCard>) -> Result<()> {
        let player = self.require(faction)?;
        if player.passed {
            return Err(Error::illegal(format!("{faction} has already passed")));
        }
        let vp = income::pass_vp(player, &self.map);
        if let Some(card) = card {
            if !self.bonus_pool.contains(&card) {
                return Err(Error::illegal(format!("{card} is not on the table")));
            }
        }
        let player = self.player_mut(faction)?;
        player.vp += vp;
        player.passed = true;
        if let Some(card) = card {
            self.take_bonus(faction, card)?;
        }
        self.pass_order.push_back(faction);
        Ok(())
    }
}
