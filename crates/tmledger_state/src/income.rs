//! Round income and pass scoring.
//!
//! The reference state uses one income table for every faction; faction
//! specific stronghold and sanctuary income is out of its scope.

use tmledger_foundation::{BonusCard, Building, CultTrack, Faction, FavorTile, Resources};

use crate::map::MapState;
use crate::player::Player;

/// Income printed on a bonus card.
#[must_use]
pub const fn bonus_income(card: BonusCard) -> Resources {
    let r = Resources::new();
    match card {
        BonusCard::Spade | BonusCard::Dwellings => r.with_coins(2),
        BonusCard::CultAction => r.with_coins(4),
        BonusCard::SixCoins => r.with_coins(6),
        BonusCard::Shipping | BonusCard::ShippingVp => r.with_power(3),
        BonusCard::WorkerPower => r.with_workers(1).with_power(3),
        BonusCard::BigBuildings => r.with_workers(2),
        BonusCard::TradingHouses => r.with_workers(1),
        BonusCard::Priest => r.with_priests(1),
    }
}

/// Income from one favor tile.
#[must_use]
pub fn favor_income(tile: FavorTile) -> Resources {
    let r = Resources::new();
    match (tile.track, tile.steps) {
        (CultTrack::Earth, 2) => r.with_workers(1).with_power(1),
        (CultTrack::Air, 2) => r.with_power(4),
        (CultTrack::Fire, 1) => r.with_coins(3),
        _ => r,
    }
}

/// Computes a player's income for the coming round.
#[must_use]
pub fn income(player: &Player, map: &MapState) -> Resources {
    let faction = player.faction;
    let count = |b: Building| i32::try_from(map.count(faction, b)).unwrap_or(0);

    let mut total = Resources::new();
    total.workers += 1 + count(Building::Dwelling).min(8);
    total.coins += 2 * count(Building::TradingHouse);
    total.power += count(Building::TradingHouse);
    total.priests += count(Building::Temple) + count(Building::Sanctuary);
    if count(Building::Stronghold) > 0 {
        total.power += 2;
    }
    for tile in &player.favors {
        let extra = favor_income(*tile);
        for (resource, amount) in extra.iter() {
            total.add(resource, amount);
        }
    }
    if let Some(card) = player.bonus {
        for (resource, amount) in bonus_income(card).iter() {
            total.add(resource, amount);
        }
    }
    total
}

/// Victory points scored when passing with a held bonus card and favor tiles.
#[must_use]
pub fn pass_vp(player: &Player, map: &MapState) -> i32 {
    let faction: Faction = player.faction;
    let count = |b: Building| i32::try_from(map.count(faction, b)).unwrap_or(0);

    let card_vp = match player.bonus {
        Some(BonusCard::BigBuildings) => {
            4 * (count(Building::Stronghold) + count(Building::Sanctuary))
        }
        Some(BonusCard::TradingHouses) => 2 * count(Building::TradingHouse),
        Some(BonusCard::Dwellings) => count(Building::Dwelling),
        Some(BonusCard::ShippingVp) => 3 * i32::from(player.shipping),
        _ => 0,
    };

    let air_one = FavorTile {
        track: CultTrack::Air,
        steps: 1,
    };
    let favor_vp = if player.favors.contains(&air_one) {
        match count(Building::TradingHouse) {
            0 => 0,
            1 => 2,
            2 | 3 => 3,
            _ => 4,
        }
    } else {
        0
    };

    card_vp + favor_vp
}

#[cfg(test)]
mod tests {
    use super::*;
    use tmledger_foundation::parse_log_coord;

    #[test]
    fn base_income_counts_buildings() {
        let mut map = MapState::new();
        let player = Player::new(Faction::Cultists);
        map.place_building(parse_log_coord("E6").unwrap(), Faction::Cultists, Building::Dwelling)
            .unwrap();
        map.place_building(parse_log_coord("A1").unwrap(), Faction::Cultists, Building::Dwelling)
            .unwrap();
        let got = income(&player, &map);
        assert_eq!(got.workers, 3);
        assert_eq!(got.coins, 0);
    }

    #[test]
    fn bonus_and_favor_income_stack() {
        let map = MapState::new();
        let mut player = Player::new(Faction::Witches);
        player.bonus = Some(BonusCard::WorkerPower);
        player.favors.push_back(FavorTile {
            track: CultTrack::Air,
            steps: 2,
        });
        let got = income(&player, &map);
        assert_eq!(got.workers, 2);
        assert_eq!(got.power, 7);
    }

    #[test]
    fn pass_vp_for_dwellings() {
        let mut map = MapState::new();
        let mut player = Player::new(Faction::Halflings);
        player.bonus = Some(BonusCard::Dwellings);
        map.place_building(parse_log_coord("A1").unwrap(), Faction::Halflings, Building::Dwelling)
            .unwrap();
        assert_eq!(pass_vp(&player, &map), 1);
    }
}
