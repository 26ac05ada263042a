//! Cult tracks and tile selections.

use tmledger_foundation::{CultTrack, Error, Faction, FavorTile, Resources, Result, TownTile};
use tmledger_state::{GameState, Pending};
use tracing::debug;

/// Sends a priest to a track's order space.
///
/// Without an explicit count the next free order space decides how far the
/// priest climbs.
pub(crate) fn send_priest(state: &mut GameState, faction: Faction, track: CultTrack, spaces: Option<u8>) -> Result<()> {
    state.player_mut(faction)?.pay(&Resources::new().with_priests(1))?;
    let steps = state.claim_order_space(track, spaces);
    state.player_mut(faction)?.advance_cult(track, i32::from(steps));
    Ok(())
}

/// Moves one step up or down a track.
pub(crate) fn step(state: &mut GameState, faction: Faction, track: CultTrack, delta: i32) -> Result<()> {
    state.player_mut(faction)?.advance_cult(track, delta);
    Ok(())
}

/// Takes a favor tile against a pending selection.
pub(crate) fn favor_tile(state: &mut GameState, faction: Faction, tile: FavorTile) -> Result<()> {
    state.require(faction)?;
    if !Pending::consume(&mut state.pending.favor, faction) {
        return Err(Error::no_pending(faction.title(), format!("no favor tile to take for {tile}")));
    }
    state.take_favor(faction, tile)
}

/// Takes a town tile. Towns are not recomputed from the map, so a tile with
/// no pending selection is taken as logged.
pub(crate) fn town_tile(state: &mut GameState, faction: Faction, tile: TownTile, lowered: &[CultTrack]) -> Result<()> {
    state.require(faction)?;
    if !Pending::consume(&mut state.pending.town, faction) {
        debug!(%faction, %tile, "town tile taken without a pending selection");
    }
    state.take_town(faction, tile, lowered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tmledger_foundation::ErrorKind;

    fn seated() -> GameState {
        let mut state = GameState::new();
        state.add_player(Faction::Nomads).unwrap();
        state.add_player(Faction::Auren).unwrap();
        state
    }

    #[test]
    fn priests_claim_order_spaces() {
        let mut state = seated();
        state.player_mut(Faction::Nomads).unwrap().priests = 3;
        send_priest(&mut state, Faction::Nomads, CultTrack::Water, None).unwrap();
        send_priest(&mut state, Faction::Nomads, CultTrack::Water, None).unwrap();
        send_priest(&mut state, Faction::Nomads, CultTrack::Water, Some(1)).unwrap();
        let nomads = state.player(Faction::Nomads).unwrap();
        assert_eq!(nomads.cult(CultTrack::Water), 6);
        assert_eq!(nomads.priests, 0);
        assert!(send_priest(&mut state, Faction::Nomads, CultTrack::Fire, None).is_err());
    }

    #[test]
    fn stepping_down_stops_at_zero() {
        let mut state = seated();
        step(&mut state, Faction::Auren, CultTrack::Fire, -1).unwrap();
        assert_eq!(state.player(Faction::Auren).unwrap().cult(CultTrack::Fire), 0);
        step(&mut state, Faction::Auren, CultTrack::Water, 1).unwrap();
        assert_eq!(state.player(Faction::Auren).unwrap().cult(CultTrack::Water), 2);
    }

    #[test]
    fn favor_needs_a_selection() {
        let mut state = seated();
        let tile = FavorTile::from_code("FAV-E2").unwrap();
        let err = favor_tile(&mut state, Faction::Auren, tile).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::NoPendingOffer { .. }));
        state.pending.grant_favor(Faction::Auren);
        favor_tile(&mut state, Faction::Auren, tile).unwrap();
        assert_eq!(state.player(Faction::Auren).unwrap().cult(CultTrack::Earth), 2);
        assert!(state.pending.favor.is_empty());
    }

    #[test]
    fn town_tiles_are_trusted() {
        let mut state = seated();
        town_tile(&mut state, Faction::Nomads, TownTile::Vp7, &[]).unwrap();
        state.pending.grant_town(Faction::Nomads);
        town_tile(&mut state, Faction::Nomads, TownTile::Vp7, &[]).unwrap();
        assert!(town_tile(&mut state, Faction::Nomads, TownTile::Vp7, &[]).is_err());
        assert_eq!(state.player(Faction::Nomads).unwrap().keys, 2);
    }
}
