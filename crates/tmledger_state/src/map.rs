//! Terrain, structures and bridges on the board.

use im::{HashMap, Vector};
use tmledger_foundation::{Building, Error, Faction, Hex, Result, Terrain, board};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A building on the map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Structure {
    /// The owner.
    pub owner: Faction,
    /// The building type.
    pub building: Building,
}

/// The mutable map: current terrain, structures, and bridges.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MapState {
    terrain: HashMap<Hex, Terrain>,
    structures: HashMap<Hex, Structure>,
    bridges: Vector<(Hex, Hex)>,
}

impl Default for MapState {
    fn default() -> Self {
        Self::new()
    }
}

impl MapState {
    /// Creates the base-game map.
    #[must_use]
    pub fn new() -> Self {
        Self {
            terrain: board::base_layout().into_iter().collect(),
            structures: HashMap::new(),
            bridges: Vector::new(),
        }
    }

    /// Returns the current terrain of a hex, or `None` off the board.
    #[must_use]
    pub fn hex(&self, hex: Hex) -> Option<Terrain> {
        self.terrain.get(&hex).copied()
    }

    /// Returns the structure on a hex.
    #[must_use]
    pub fn structure(&self, hex: Hex) -> Option<Structure> {
        self.structures.get(&hex).copied()
    }

    /// Iterates over every structure.
    pub fn structures(&self) -> impl Iterator<Item = (Hex, Structure)> + '_ {
        self.structures.iter().map(|(h, s)| (*h, *s))
    }

    /// Counts one faction's buildings of a type.
    #[must_use]
    pub fn count(&self, owner: Faction, building: Building) -> usize {
        self.structures
            .values()
            .filter(|s| s.owner == owner && s.building == building)
            .count()
    }

    /// Returns the bridges built so far.
    #[must_use]
    pub fn bridges(&self) -> &Vector<(Hex, Hex)> {
        &self.bridges
    }

    /// Spades needed to turn a hex into `target`.
    ///
    /// # Errors
    ///
    /// Returns `MalformedCoordinate` off the board and `IllegalAction` for
    /// river hexes.
    pub fn terrain_distance(&self, hex: Hex, target: Terrain) -> Result<u8> {
        let current = self
            .hex(hex)
            .ok_or_else(|| Error::malformed_coordinate(hex.to_string()))?;
        current
            .distance(target)
            .ok_or_else(|| Error::illegal(format!("cannot terraform river at {hex}")))
    }

    /// Changes the terrain of an unbuilt land hex.
    ///
    /// # Errors
    ///
    /// Returns an error for river hexes, built hexes and hexes off the board.
    pub fn transform_terrain(&mut self, hex: Hex, target: Terrain) -> Result<()> {
        self.terrain_distance(hex, target)?;
        if self.structures.contains_key(&hex) {
            return Err(Error::illegal(format!("hex {hex} is already built on")));
        }
        self.terrain.insert(hex, target);
        Ok(())
    }

    /// Places a new building on an empty land hex.
    ///
    /// # Errors
    ///
    /// Returns an error if the hex is off the board, river, or occupied.
    pub fn place_building(&mut self, hex: Hex, owner: Faction, building: Building) -> Result<()> {
        match self.hex(hex) {
            None => return Err(Error::malformed_coordinate(hex.to_string())),
            Some(Terrain::River) => {
                return Err(Error::illegal(format!("cannot build on river at {hex}")));
            }
            Some(_) => {}
        }
        if let Some(existing) = self.structure(hex) {
            return Err(Error::illegal(format!(
                "hex {hex} already holds a {} of {}",
                existing.building, existing.owner
            )));
        }
        self.structures.insert(hex, Structure { owner, building });
        Ok(())
    }

    /// Replaces the owner's building on a hex with `to`.
    ///
    /// # Errors
    ///
    /// Returns an error if the owner has no building there or `to` cannot be
    /// reached from the current building.
    pub fn upgrade_building(&mut self, hex: Hex, owner: Faction, to: Building) -> Result<Building> {
        let current = self
            .structure(hex)
            .filter(|s| s.owner == owner)
            .ok_or_else(|| Error::illegal(format!("{owner} has no building at {hex}")))?;
        if to.upgrades_from() != Some(current.building) {
            return Err(Error::illegal(format!(
                "cannot upgrade {} to {to} at {hex}",
                current.building
            )));
        }
        self.structures.insert(hex, Structure { owner, building: to });
        Ok(current.building)
    }

    /// Adds a bridge between two land hexes across a river.
    ///
    /// # Errors
    ///
    /// Returns `IllegalAction` if the hexes cannot be bridged or the bridge
    /// already exists.
    pub fn build_bridge(&mut self, a: Hex, b: Hex) -> Result<()> {
        if !board::bridgeable(a, b) {
            return Err(Error::illegal(format!("no river crossing between {a} and {b}")));
        }
        if self.bridges.iter().any(|(x, y)| (*x, *y) == (a, b) || (*x, *y) == (b, a)) {
            return Err(Error::illegal(format!("bridge {a}-{b} already built")));
        }
        self.bridges.push_back((a, b));
        Ok(())
    }

    /// Sums, per neighbouring opponent, the power value of their buildings
    /// adjacent to `hex`. Bridged hexes count as adjacent.
    #[must_use]
    pub fn neighbors_owned_by_others(&self, hex: Hex, owner: Faction) -> Vec<(Faction, u8)> {
        let mut totals: Vec<(Faction, u8)> = Vec::new();
        for neighbor in self.connected(hex) {
            let Some(structure) = self.structure(neighbor) else {
                continue;
            };
            if structure.owner == owner {
                continue;
            }
            let value = structure.building.power_value();
            match totals.iter_mut().find(|(f, _)| *f == structure.owner) {
                Some((_, total)) => *total += value,
                None => totals.push((structure.owner, value)),
            }
        }
        totals
    }

    /// Returns true if any building of another faction is directly adjacent.
    #[must_use]
    pub fn has_opponent_neighbor(&self, hex: Hex, owner: Faction) -> bool {
        !self.neighbors_owned_by_others(hex, owner).is_empty()
    }

    fn connected(&self, hex: Hex) -> Vec<Hex> {
        let mut out: Vec<Hex> = hex.neighbors().into_iter().collect();
        for (a, b) in &self.bridges {
            if *a == hex {
                out.push(*b);
            } else if *b == hex {
                out.push(*a);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tmledger_foundation::parse_log_coord;

    fn hex(coord: &str) -> Hex {
        parse_log_coord(coord).unwrap()
    }

    #[test]
    fn transform_and_distance() {
        let mut map = MapState::new();
        let e6 = hex("E6");
        assert_eq!(map.hex(e6), Some(Terrain::Plains));
        assert_eq!(map.terrain_distance(e6, Terrain::Swamp).unwrap(), 1);
        map.transform_terrain(e6, Terrain::Swamp).unwrap();
        assert_eq!(map.hex(e6), Some(Terrain::Swamp));
        assert_eq!(map.terrain_distance(e6, Terrain::Swamp).unwrap(), 0);
    }

    #[test]
    fn place_and_upgrade() {
        let mut map = MapState::new();
        let e6 = hex("E6");
        map.place_building(e6, Faction::Cultists, Building::Dwelling).unwrap();
        assert!(map.place_building(e6, Faction::Witches, Building::Dwelling).is_err());
        assert!(map.transform_terrain(e6, Terrain::Lake).is_err());
        assert!(map.upgrade_building(e6, Faction::Cultists, Building::Temple).is_err());
        let from = map
            .upgrade_building(e6, Faction::Cultists, Building::TradingHouse)
            .unwrap();
        assert_eq!(from, Building::Dwelling);
        assert_eq!(map.count(Faction::Cultists, Building::TradingHouse), 1);
    }

    #[test]
    fn neighbours_sum_power_per_owner() {
        let mut map = MapState::new();
        let e6 = hex("E6");
        let e7 = hex("E7");
        map.place_building(e6, Faction::Cultists, Building::Dwelling).unwrap();
        map.place_building(e7, Faction::Engineers, Building::Dwelling).unwrap();
        map.upgrade_building(e7, Faction::Engineers, Building::TradingHouse)
            .unwrap();
        assert_eq!(
            map.neighbors_owned_by_others(e6, Faction::Cultists),
            vec![(Faction::Engineers, 2)]
        );
        assert!(map.neighbors_owned_by_others(e6, Faction::Engineers).is_empty());
    }

    #[test]
    fn snapshots_are_independent() {
        let mut map = MapState::new();
        let before = map.clone();
        map.place_building(hex("A1"), Faction::Halflings, Building::Dwelling)
            .unwrap();
        assert!(before.structure(hex("A1")).is_none());
        assert!(map.structure(hex("A1")).is_some());
    }
}
