//! Terraforming, building and upgrading.

use tmledger_foundation::{Building, Error, Faction, Hex, Resources, Result, Terrain};
use tmledger_state::{GameState, HalflingsSpades};
use tracing::trace;

use crate::economy::shipping_max;

/// Places a setup dwelling: free, on home terrain, no leech.
pub(crate) fn setup_dwelling(state: &mut GameState, faction: Faction, hex: Hex) -> Result<()> {
    state.require(faction)?;
    let terrain = state
        .map
        .hex(hex)
        .ok_or_else(|| Error::malformed_coordinate(hex.to_string()))?;
    if terrain != faction.home_terrain() {
        return Err(Error::illegal(format!(
            "setup dwelling at {hex} is on {terrain}, not {}",
            faction.home_terrain()
        )));
    }
    state.map.place_building(hex, faction, Building::Dwelling)
}

/// Terraforms toward `terrain` (home when `None`) and builds a dwelling.
pub(crate) fn build(state: &mut GameState, faction: Faction, hex: Hex, terrain: Option<Terrain>) -> Result<()> {
    transform(state, faction, hex, terrain)?;
    place_dwelling(state, faction, hex, true)
}

/// Places a dwelling on an already prepared hex and makes leech offers.
pub(crate) fn place_dwelling(state: &mut GameState, faction: Faction, hex: Hex, paid: bool) -> Result<()> {
    if paid {
        let cost = state.building_cost(faction, Building::Dwelling, hex);
        state.player_mut(faction)?.pay(&cost)?;
    }
    state.map.place_building(hex, faction, Building::Dwelling)?;
    state.trigger_leech(hex, faction);
    Ok(())
}

/// Terraforms a hex to `terrain`, paying for the spades not covered by
/// pending free spades. Already at the target, nothing happens.
pub(crate) fn transform(state: &mut GameState, faction: Faction, hex: Hex, terrain: Option<Terrain>) -> Result<()> {
    let target = terrain.unwrap_or_else(|| faction.home_terrain());
    let spades = state.map.terrain_distance(hex, target)?;
    if spades == 0 {
        return Ok(());
    }
    pay_spades(state, faction, spades)?;
    state.map.transform_terrain(hex, target)?;
    trace!(%faction, %hex, %target, spades, "terraformed");
    Ok(())
}

/// Spends exactly `spades` spades toward home terrain.
pub(crate) fn dig(state: &mut GameState, faction: Faction, spades: u8, hex: Hex) -> Result<()> {
    let home = faction.home_terrain();
    let current = state
        .map
        .hex(hex)
        .ok_or_else(|| Error::malformed_coordinate(hex.to_string()))?;
    let needed = state.map.terrain_distance(hex, home)?;
    if spades > needed {
        return Err(Error::illegal(format!(
            "{spades} spades at {hex} overshoot {home} ({needed} needed)"
        )));
    }
    pay_spades(state, faction, spades)?;
    state.map.transform_terrain(hex, current.step_toward(home, spades))
}

fn pay_spades(state: &mut GameState, faction: Faction, spades: u8) -> Result<()> {
    let (free, workers) = state.spade_cost(faction, spades);
    let cost = if faction == Faction::Darklings {
        Resources::new().with_priests(i32::from(spades - free))
    } else {
        Resources::new().with_workers(workers)
    };
    state.player_mut(faction)?.pay(&cost)?;
    state.pending.use_spades(faction, free);
    Ok(())
}

/// Upgrades a building, pays for it, and applies what the new building
/// unlocks.
pub(crate) fn upgrade(state: &mut GameState, faction: Faction, hex: Hex, to: Building) -> Result<()> {
    let cost = state.building_cost(faction, to, hex);
    state.player_mut(faction)?.pay(&cost)?;
    finish_upgrade(state, faction, hex, to)
}

/// Swaps the building and applies its side effects, without paying.
pub(crate) fn finish_upgrade(state: &mut GameState, faction: Faction, hex: Hex, to: Building) -> Result<()> {
    state.map.upgrade_building(hex, faction, to)?;
    state.trigger_leech(hex, faction);
    match to {
        Building::Temple | Building::Sanctuary => {
            state.pending.grant_favor(faction);
            if faction == Faction::ChaosMagicians {
                state.pending.grant_favor(faction);
            }
        }
        Building::Stronghold => found_stronghold(state, faction)?,
        Building::Dwelling | Building::TradingHouse => {}
    }
    Ok(())
}

fn found_stronghold(state: &mut GameState, faction: Faction) -> Result<()> {
    let player = state.player_mut(faction)?;
    player.has_stronghold = true;
    match faction {
        Faction::Alchemists => {
            player.power.gain(12);
        }
        Faction::Cultists => player.vp += 7,
        Faction::Mermaids => player.shipping = (player.shipping + 1).min(shipping_max(faction)),
        _ => {}
    }
    match faction {
        Faction::Auren => state.pending.grant_favor(faction),
        Faction::Halflings => {
            state.pending.halflings = Some(HalflingsSpades { faction, remaining: 3 });
        }
        Faction::Darklings => state.pending.ordination = Some(faction),
        _ => {}
    }
    Ok(())
}

/// Spends Halflings stronghold spades on a run of transforms.
pub(crate) fn halflings_spades(
    state: &mut GameState,
    faction: Faction,
    transforms: &[(Hex, Option<Terrain>)],
) -> Result<()> {
    let mut window = state
        .pending
        .halflings
        .filter(|w| w.faction == faction)
        .ok_or_else(|| Error::no_pending(faction.title(), "no stronghold spades to spend"))?;
    for (hex, terrain) in transforms {
        let target = terrain.unwrap_or_else(|| faction.home_terrain());
        let spades = state.map.terrain_distance(*hex, target)?;
        if spades > window.remaining {
            return Err(Error::illegal(format!(
                "{spades} spades at {hex} exceed the {} left",
                window.remaining
            )));
        }
        state.map.transform_terrain(*hex, target)?;
        window.remaining -= spades;
    }
    state.pending.halflings = (window.remaining > 0).then_some(window);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tmledger_foundation::{ErrorKind, parse_log_coord};

    fn at(coord: &str) -> Hex {
        parse_log_coord(coord).unwrap()
    }

    fn seated(factions: &[Faction]) -> GameState {
        let mut state = GameState::new();
        for f in factions {
            state.add_player(*f).unwrap();
        }
        state
    }

    #[test]
    fn setup_dwelling_requires_home_terrain() {
        let mut state = seated(&[Faction::Witches]);
        setup_dwelling(&mut state, Faction::Witches, at("E9")).unwrap();
        let err = setup_dwelling(&mut state, Faction::Witches, at("E6")).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::IllegalAction(_)));
        assert_eq!(state.player(Faction::Witches).unwrap().coins, 15);
    }

    #[test]
    fn build_terraforms_and_pays() {
        let mut state = seated(&[Faction::Witches]);
        state.player_mut(Faction::Witches).unwrap().workers = 20;
        // E6 is plains, three spades from forest.
        build(&mut state, Faction::Witches, at("E6"), None).unwrap();
        let witches = state.player(Faction::Witches).unwrap();
        assert_eq!(witches.workers, 20 - 9 - 1);
        assert_eq!(witches.coins, 13);
        assert_eq!(state.map.hex(at("E6")), Some(Terrain::Forest));
    }

    #[test]
    fn transform_at_target_is_free() {
        let mut state = seated(&[Faction::Witches]);
        let before = state.clone();
        transform(&mut state, Faction::Witches, at("E9"), None).unwrap();
        assert_eq!(state, before);
    }

    #[test]
    fn pending_spades_are_spent_first() {
        let mut state = seated(&[Faction::Witches]);
        state.pending.grant_spades(Faction::Witches, 2);
        dig(&mut state, Faction::Witches, 2, at("E6")).unwrap();
        assert_eq!(state.player(Faction::Witches).unwrap().workers, 3);
        assert_eq!(state.pending.spades(Faction::Witches), 0);
        assert_eq!(state.map.hex(at("E6")), Some(Terrain::Lake));
        assert!(dig(&mut state, Faction::Witches, 2, at("E6")).is_err());
    }

    #[test]
    fn building_offers_leech() {
        let mut state = seated(&[Faction::Witches, Faction::Giants]);
        // E4 lakes, E5 swamp: give the giants a neighbour.
        state.map.place_building(at("E5"), Faction::Giants, Building::Dwelling).unwrap();
        state.player_mut(Faction::Witches).unwrap().workers = 20;
        build(&mut state, Faction::Witches, at("E6"), None).unwrap();
        assert_eq!(state.pending.leech_offers(Faction::Giants).len(), 1);
    }

    #[test]
    fn temple_grants_a_favor() {
        let mut state = seated(&[Faction::ChaosMagicians]);
        let hex = at("E9");
        state.map.place_building(hex, Faction::ChaosMagicians, Building::TradingHouse).unwrap();
        upgrade(&mut state, Faction::ChaosMagicians, hex, Building::Temple).unwrap();
        assert_eq!(state.pending.favor.get(&Faction::ChaosMagicians), Some(&2));
    }

    #[test]
    fn halflings_stronghold_spades() {
        let mut state = seated(&[Faction::Halflings]);
        let hex = at("E9");
        state.map.place_building(hex, Faction::Halflings, Building::TradingHouse).unwrap();
        {
            let halflings = state.player_mut(Faction::Halflings).unwrap();
            halflings.coins = 30;
            halflings.workers = 10;
        }
        upgrade(&mut state, Faction::Halflings, hex, Building::Stronghold).unwrap();
        assert!(state.player(Faction::Halflings).unwrap().has_stronghold);
        assert_eq!(state.pending.halflings.map(|w| w.remaining), Some(3));

        // E5 swamp is one step from plains, E7 mountains three.
        halflings_spades(&mut state, Faction::Halflings, &[(at("E5"), None)]).unwrap();
        assert_eq!(state.pending.halflings.map(|w| w.remaining), Some(2));
        assert!(halflings_spades(&mut state, Faction::Halflings, &[(at("E7"), None)]).is_err());
        halflings_spades(&mut state, Faction::Halflings, &[(at("E3"), None)]).unwrap();
        assert!(state.pending.halflings.is_none());
    }
}
