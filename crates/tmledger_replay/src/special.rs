//! Faction stronghold abilities and card actions.

use tmledger_foundation::{BonusCard, Building, CultTrack, Error, Faction, FavorTile, Hex, Resources, Result, Terrain};
use tmledger_notation::SpecialAction;
use tmledger_state::{GameState, Player};

use crate::build;

fn require_faction(faction: Faction, expected: Faction, action: &str) -> Result<()> {
    if faction == expected {
        Ok(())
    } else {
        Err(Error::illegal(format!("{action} is a {expected} action, not {faction}")))
    }
}

fn use_stronghold(state: &mut GameState, faction: Faction) -> Result<()> {
    let player = state.player_mut(faction)?;
    if !player.has_stronghold {
        return Err(Error::illegal(format!("{faction} has no stronghold")));
    }
    if player.stronghold_action_used {
        return Err(Error::illegal(format!("{faction} already used the stronghold action this round")));
    }
    player.stronghold_action_used = true;
    Ok(())
}

fn use_bonus(state: &mut GameState, faction: Faction, card: BonusCard) -> Result<()> {
    let player = state.player_mut(faction)?;
    if player.bonus != Some(card) {
        return Err(Error::illegal(format!("{faction} does not hold {card}")));
    }
    if player.bonus_action_used {
        return Err(Error::illegal(format!("{faction} already used {card} this round")));
    }
    player.bonus_action_used = true;
    Ok(())
}

fn use_favor(player: &mut Player) -> Result<()> {
    let water = FavorTile::new(CultTrack::Water, 2).ok_or_else(|| Error::illegal("no cult-action favor tile"))?;
    if !player.favors.contains(&water) {
        return Err(Error::illegal(format!("{} does not hold {water}", player.faction)));
    }
    if player.favor_action_used {
        return Err(Error::illegal(format!("{} already used {water} this round", player.faction)));
    }
    player.favor_action_used = true;
    Ok(())
}

/// Applies a special action.
pub(crate) fn apply(state: &mut GameState, faction: Faction, action: SpecialAction) -> Result<()> {
    match action {
        SpecialAction::WitchesRide(hex) => {
            require_faction(faction, Faction::Witches, "witches' ride")?;
            use_stronghold(state, faction)?;
            if state.map.hex(hex) != Some(Terrain::Forest) {
                return Err(Error::illegal(format!("witches' ride needs forest at {hex}")));
            }
            build::place_dwelling(state, faction, hex, false)
        }
        SpecialAction::Sandstorm { hex, build } => {
            require_faction(faction, Faction::Nomads, "sandstorm")?;
            use_stronghold(state, faction)?;
            free_transform(state, faction, hex, build)
        }
        SpecialAction::GiantsTransform { hex, build } => {
            require_faction(faction, Faction::Giants, "giants' transform")?;
            use_stronghold(state, faction)?;
            free_transform(state, faction, hex, build)
        }
        SpecialAction::SwarmlingsUpgrade(hex) => {
            require_faction(faction, Faction::Swarmlings, "free trading house")?;
            use_stronghold(state, faction)?;
            build::finish_upgrade(state, faction, hex, Building::TradingHouse)
        }
        SpecialAction::DoubleTurn => {
            require_faction(faction, Faction::ChaosMagicians, "double turn")?;
            use_stronghold(state, faction)
        }
        SpecialAction::AurenCult(track) => {
            require_faction(faction, Faction::Auren, "two cult steps")?;
            use_stronghold(state, faction)?;
            state.player_mut(faction)?.advance_cult(track, 2);
            Ok(())
        }
        SpecialAction::EngineersBridge(a, b) => {
            require_faction(faction, Faction::Engineers, "bridge for two workers")?;
            use_stronghold(state, faction)?;
            let cost = Resources::new().with_workers(2);
            state.player_mut(faction)?.pay(&cost)?;
            state.map.build_bridge(a, b)
        }
        SpecialAction::MermaidsTown(_) => {
            require_faction(faction, Faction::Mermaids, "river town")?;
            state.pending.grant_town(faction);
            Ok(())
        }
        SpecialAction::Ordination(workers) => {
            require_faction(faction, Faction::Darklings, "ordination")?;
            if workers > 3 {
                return Err(Error::illegal(format!("ordination converts at most 3 workers, not {workers}")));
            }
            if state.pending.ordination.take() != Some(faction) {
                return Err(Error::no_pending(faction.title(), "ordination is not available"));
            }
            let player = state.player_mut(faction)?;
            let workers = i32::from(workers);
            player.pay(&Resources::new().with_workers(workers))?;
            player.priests += workers;
            Ok(())
        }
        SpecialAction::FavorCult(track) => {
            use_favor(state.player_mut(faction)?)?;
            if let Some(track) = track {
                state.player_mut(faction)?.advance_cult(track, 1);
            }
            Ok(())
        }
        SpecialAction::BonusCult(track) => {
            use_bonus(state, faction, BonusCard::CultAction)?;
            state.player_mut(faction)?.advance_cult(track, 1);
            Ok(())
        }
        SpecialAction::BonusSpadeGrant => {
            use_bonus(state, faction, BonusCard::Spade)?;
            state.pending.grant_spades(faction, 1);
            Ok(())
        }
        SpecialAction::BonusSpade { hex, terrain, build } => {
            use_bonus(state, faction, BonusCard::Spade)?;
            let before = state.pending.spades(faction);
            state.pending.grant_spades(faction, 1);
            build::transform(state, faction, hex, terrain)?;
            let unused = state.pending.spades(faction).saturating_sub(before);
            state.pending.use_spades(faction, unused);
            if build {
                build::place_dwelling(state, faction, hex, true)?;
            }
            Ok(())
        }
    }
}

fn free_transform(state: &mut GameState, faction: Faction, hex: Hex, then_build: bool) -> Result<()> {
    state.map.transform_terrain(hex, faction.home_terrain())?;
    if then_build {
        build::place_dwelling(state, faction, hex, true)?;
    }
    Ok(())
}
