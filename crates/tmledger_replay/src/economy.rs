//! Power, conversions, leech reactions, and the shipping and digging tracks.

use tmledger_foundation::{Error, ErrorKind, Faction, Hex, PowerAction, Resource, Resources, Result};
use tmledger_state::GameState;
use tmledger_state::player::{DIGGING_MAX, SHIPPING_MAX};
use tracing::{debug, trace};

// =============================================================================
// Power actions
// =============================================================================

/// Takes a power action space.
pub(crate) fn power_action(
    state: &mut GameState,
    faction: Faction,
    action: PowerAction,
    bridge: Option<(Hex, Hex)>,
) -> Result<()> {
    if !state.power_action_available(action) {
        return Err(Error::new(ErrorKind::PowerActionTaken(action.code().to_string())));
    }
    let cost = Resources::new().with_power(i32::from(action.cost()));
    state.player_mut(faction)?.pay(&cost)?;
    state.mark_power_action(action)?;
    let r = Resources::new();
    match action {
        PowerAction::Bridge => {
            if let Some((a, b)) = bridge {
                state.map.build_bridge(a, b)?;
            }
        }
        PowerAction::Priest => state.player_mut(faction)?.receive(&r.with_priests(1)),
        PowerAction::Workers => state.player_mut(faction)?.receive(&r.with_workers(2)),
        PowerAction::Coins => state.player_mut(faction)?.receive(&r.with_coins(7)),
        PowerAction::Spade | PowerAction::TwoSpades => state.pending.grant_spades(faction, action.spades()),
    }
    Ok(())
}

/// Burns power: bowl II loses twice `amount`, bowl III gains `amount`.
pub(crate) fn burn(state: &mut GameState, faction: Faction, amount: u8) -> Result<()> {
    state.player_mut(faction)?.power.burn(i32::from(amount))
}

/// Exchanges resources at the logged rate.
pub(crate) fn convert(state: &mut GameState, faction: Faction, cost: &Resources, reward: &Resources) -> Result<()> {
    let player = state.player_mut(faction)?;
    player.pay(cost)?;
    player.receive(reward);
    trace!(%faction, %cost, %reward, "converted");
    Ok(())
}

// =============================================================================
// Leech
// =============================================================================

/// Accepts a pending leech offer.
///
/// With nothing offered, a player whose bowls are already full has nothing
/// to accept and the reaction is a no-op.
pub(crate) fn accept_leech(
    state: &mut GameState,
    faction: Faction,
    from: Option<Faction>,
    amount: Option<i32>,
    vp_cost: Option<i32>,
) -> Result<()> {
    let capacity = state.require(faction)?.power.capacity();
    if state.pending.leech_offers(faction).is_empty() {
        if capacity == 0 {
            debug!(%faction, "leech with full bowls ignored");
            return Ok(());
        }
        return Err(Error::no_pending(faction.title(), "no leech offer to accept"));
    }
    let offer = state
        .pending
        .take_leech(faction, from, amount)
        .or_else(|| state.pending.take_leech(faction, from, None))
        .ok_or_else(|| {
            let source = from.map_or("anyone", Faction::title);
            Error::no_pending(faction.title(), format!("no leech offer from {source}"))
        })?;
    let player = state.player_mut(faction)?;
    let gained = player.power.gain(amount.unwrap_or(offer.amount));
    player.vp -= vp_cost.unwrap_or(gained - 1).max(0);
    trace!(%faction, from = %offer.from, gained, "leech accepted");
    Ok(())
}

/// Declines a pending leech offer. Declining with nothing offered is fine.
pub(crate) fn decline_leech(state: &mut GameState, faction: Faction, from: Option<Faction>) -> Result<()> {
    state.require(faction)?;
    if state.pending.leech_offers(faction).is_empty() {
        return Ok(());
    }
    state.pending.take_leech(faction, from, None).map(|_| ()).ok_or_else(|| {
        let source = from.map_or("anyone", Faction::title);
        Error::no_pending(faction.title(), format!("no leech offer from {source} to decline"))
    })
}

// =============================================================================
// Shipping and digging
// =============================================================================

pub(crate) fn shipping_max(faction: Faction) -> u8 {
    match faction {
        Faction::Mermaids => SHIPPING_MAX + 2,
        Faction::Dwarves | Faction::Fakirs => 0,
        _ => SHIPPING_MAX,
    }
}

/// Advances shipping for 1 priest and 4 coins, scoring the new level's VP.
pub(crate) fn advance_shipping(state: &mut GameState, faction: Faction) -> Result<()> {
    let player = state.player_mut(faction)?;
    if player.shipping >= shipping_max(faction) {
        return Err(Error::illegal(format!("{faction} cannot advance shipping further")));
    }
    player.pay(&Resources::new().with_priests(1).with_coins(4))?;
    player.shipping += 1;
    player.vp += i32::from(player.shipping) + 1;
    Ok(())
}

/// Advances digging, scoring 6 VP.
pub(crate) fn advance_digging(state: &mut GameState, faction: Faction) -> Result<()> {
    let player = state.player_mut(faction)?;
    if player.digging >= DIGGING_MAX {
        return Err(Error::illegal(format!("{faction} cannot advance digging further")));
    }
    let coins = if faction == Faction::Halflings { 1 } else { 5 };
    player.pay(&Resources::new().with_workers(2).with_coins(coins).with_priests(1))?;
    player.digging += 1;
    player.vp += 6;
    Ok(())
}

/// Returns true if a conversion's reward covers `resource`.
pub(crate) fn covers(reward: &Resources, resource: Resource) -> bool {
    reward.get(resource) > 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use tmledger_foundation::{Building, parse_log_coord};
    use tmledger_state::PowerBowls;

    fn seated() -> GameState {
        let mut state = GameState::new();
        state.add_player(Faction::Witches).unwrap();
        state.add_player(Faction::Giants).unwrap();
        state
    }

    #[test]
    fn power_action_spends_and_marks() {
        let mut state = seated();
        state.player_mut(Faction::Witches).unwrap().power = PowerBowls::new(0, 0, 6);
        power_action(&mut state, Faction::Witches, PowerAction::Coins, None).unwrap();
        let witches = state.player(Faction::Witches).unwrap();
        assert_eq!(witches.coins, 22);
        assert_eq!(witches.power, PowerBowls::new(4, 0, 2));

        let err = power_action(&mut state, Faction::Giants, PowerAction::Coins, None).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::PowerActionTaken(_)));
    }

    #[test]
    fn power_action_needs_bowl_three() {
        let mut state = seated();
        let err = power_action(&mut state, Faction::Witches, PowerAction::TwoSpades, None).unwrap_err();
        assert_eq!(err.shortfall(), Some((Resource::Power, 6)));
        assert!(state.power_action_available(PowerAction::TwoSpades));
    }

    #[test]
    fn spade_actions_leave_pending_spades() {
        let mut state = seated();
        state.player_mut(Faction::Giants).unwrap().power = PowerBowls::new(0, 0, 6);
        power_action(&mut state, Faction::Giants, PowerAction::TwoSpades, None).unwrap();
        assert_eq!(state.pending.spades(Faction::Giants), 2);
    }

    #[test]
    fn conversion_pays_then_receives() {
        let mut state = seated();
        state.player_mut(Faction::Witches).unwrap().power = PowerBowls::new(0, 0, 3);
        let cost = Resources::new().with_power(3);
        let reward = Resources::new().with_workers(1);
        convert(&mut state, Faction::Witches, &cost, &reward).unwrap();
        let witches = state.player(Faction::Witches).unwrap();
        assert_eq!(witches.workers, 4);
        assert_eq!(witches.power, PowerBowls::new(3, 0, 0));
        assert!(convert(&mut state, Faction::Witches, &cost, &reward).is_err());
    }

    #[test]
    fn leech_is_matched_by_source() {
        let mut state = seated();
        let e6 = parse_log_coord("E6").unwrap();
        let e7 = parse_log_coord("E7").unwrap();
        state.map.place_building(e7, Faction::Giants, Building::TradingHouse).unwrap();
        state.map.place_building(e6, Faction::Witches, Building::TradingHouse).unwrap();
        state.trigger_leech(e6, Faction::Witches);

        let err = accept_leech(&mut state, Faction::Giants, Some(Faction::Nomads), None, None).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::NoPendingOffer { .. }));

        accept_leech(&mut state, Faction::Giants, Some(Faction::Witches), None, None).unwrap();
        let giants = state.player(Faction::Giants).unwrap();
        assert_eq!(giants.vp, 19);
        assert_eq!(giants.power, PowerBowls::new(3, 9, 0));
        assert!(state.pending.leech_offers(Faction::Giants).is_empty());
    }

    #[test]
    fn leech_without_offer() {
        let mut state = seated();
        let err = accept_leech(&mut state, Faction::Giants, None, None, None).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::NoPendingOffer { .. }));

        state.player_mut(Faction::Giants).unwrap().power = PowerBowls::new(0, 0, 12);
        accept_leech(&mut state, Faction::Giants, None, Some(1), None).unwrap();
        decline_leech(&mut state, Faction::Giants, Some(Faction::Witches)).unwrap();
    }

    #[test]
    fn tracks_score_and_cap() {
        let mut state = seated();
        {
            let witches = state.player_mut(Faction::Witches).unwrap();
            witches.priests = 5;
            witches.coins = 40;
            witches.workers = 10;
        }
        advance_shipping(&mut state, Faction::Witches).unwrap();
        assert_eq!(state.player(Faction::Witches).unwrap().vp, 22);
        advance_digging(&mut state, Faction::Witches).unwrap();
        advance_digging(&mut state, Faction::Witches).unwrap();
        assert!(advance_digging(&mut state, Faction::Witches).is_err());
        assert_eq!(state.player(Faction::Witches).unwrap().workers_per_spade(), 1);
    }
}
