//! Pending offers and selections.
//!
//! Actions that grant something to be resolved later (a leech offer to a
//! neighbour, spades to spend, a favor tile to choose) record it here. The
//! replay engine reads and clears these tables.

use im::{HashMap, Vector};
use tmledger_foundation::Faction;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A power offer made to a neighbour of a new or upgraded building.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LeechOffer {
    /// The faction whose building triggered the offer.
    pub from: Faction,
    /// Power that may be gained.
    pub amount: i32,
    /// Victory points paid on accepting.
    pub vp_cost: i32,
}

impl LeechOffer {
    /// Creates an offer capped by the receiver's gain capacity.
    ///
    /// Returns `None` if nothing could be gained.
    #[must_use]
    pub fn capped(from: Faction, value: i32, capacity: i32) -> Option<Self> {
        let amount = value.min(capacity);
        (amount > 0).then_some(Self {
            from,
            amount,
            vp_cost: amount - 1,
        })
    }
}

/// Halflings stronghold spades being spent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HalflingsSpades {
    /// The halflings player.
    pub faction: Faction,
    /// Spades not yet spent.
    pub remaining: u8,
}

/// Every pending table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pending {
    /// Leech offers, per receiving faction, in the order they were made.
    pub leech: HashMap<Faction, Vector<LeechOffer>>,
    /// Free spades to spend on transforms.
    pub spades: HashMap<Faction, u8>,
    /// Favor tiles to select.
    pub favor: HashMap<Faction, u8>,
    /// Town tiles to select.
    pub town: HashMap<Faction, u8>,
    /// Halflings stronghold spades.
    pub halflings: Option<HalflingsSpades>,
    /// Darklings stronghold ordination not yet used.
    pub ordination: Option<Faction>,
}

impl Pending {
    /// Returns the leech offers for a faction.
    #[must_use]
    pub fn leech_offers(&self, faction: Faction) -> Vector<LeechOffer> {
        self.leech.get(&faction).cloned().unwrap_or_default()
    }

    /// Adds a leech offer.
    pub fn offer_leech(&mut self, to: Faction, offer: LeechOffer) {
        self.leech.entry(to).or_insert_with(Vector::new).push_back(offer);
    }

    /// Removes and returns the first offer matching the source (and amount,
    /// if given).
    pub fn take_leech(&mut self, to: Faction, from: Option<Faction>, amount: Option<i32>) -> Option<LeechOffer> {
        let offers = self.leech.get_mut(&to)?;
        let index = offers.iter().position(|o| {
            from.is_none_or(|f| o.from == f) && amount.is_none_or(|a| o.amount == a)
        })?;
        let offer = offers.remove(index);
        if offers.is_empty() {
            self.leech.remove(&to);
        }
        Some(offer)
    }

    /// Returns the free spades pending for a faction.
    #[must_use]
    pub fn spades(&self, faction: Faction) -> u8 {
        self.spades.get(&faction).copied().unwrap_or(0)
    }

    /// Adds free spades.
    pub fn grant_spades(&mut self, faction: Faction, count: u8) {
        *self.spades.entry(faction).or_insert(0) += count;
    }

    /// Uses up to `count` pending spades and returns how many were used.
    pub fn use_spades(&mut self, faction: Faction, count: u8) -> u8 {
        let have = self.spades(faction);
        let used = have.min(count);
        if have == used {
            self.spades.remove(&faction);
        } else {
            self.spades.insert(faction, have - used);
        }
        used
    }

    /// Records a favor tile selection to be made.
    pub fn grant_favor(&mut self, faction: Faction) {
        *self.favor.entry(faction).or_insert(0) += 1;
    }

    /// Records a town tile selection to be made.
    pub fn grant_town(&mut self, faction: Faction) {
        *self.town.entry(faction).or_insert(0) += 1;
    }

    /// Consumes one selection from a counter table; returns false if none.
    pub fn consume(table: &mut HashMap<Faction, u8>, faction: Faction) -> bool {
        match table.get(&faction).copied() {
            Some(n) if n > 1 => {
                table.insert(faction, n - 1);
                true
            }
            Some(_) => {
                table.remove(&faction);
                true
            }
            None => false,
        }
    }
}
