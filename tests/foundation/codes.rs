//! Integration tests for code tables and resource bundles

use tmledger_foundation::{
    BonusCard, Building, CultTrack, Faction, FavorTile, PowerAction, Resource, Resources, Terrain, TownTile,
};

// =============================================================================
// Factions and terrain
// =============================================================================

#[test]
fn faction_names_and_keys() {
    for faction in Faction::ALL {
        assert_eq!(Faction::from_name(faction.key()), Some(faction));
        assert_eq!(Faction::from_name(faction.title()), Some(faction));
    }
    assert_eq!(Faction::from_name("Chaos Magicians"), Some(Faction::ChaosMagicians));
    assert_eq!(Faction::from_name("orcs"), None);
}

#[test]
fn home_terrains() {
    assert_eq!(Faction::Witches.home_terrain(), Terrain::Forest);
    assert_eq!(Faction::Nomads.home_terrain(), Terrain::Desert);
    assert_eq!(Faction::Halflings.home_terrain(), Terrain::Plains);
    assert_eq!(Faction::Giants.home_terrain(), Terrain::Wasteland);
}

#[test]
fn wheel_distance_takes_the_short_way() {
    assert_eq!(Terrain::Plains.distance(Terrain::Desert), Some(1));
    assert_eq!(Terrain::Forest.distance(Terrain::Plains), Some(3));
    assert_eq!(Terrain::Swamp.distance(Terrain::Forest), Some(2));
    assert_eq!(Terrain::River.distance(Terrain::Plains), None);
    assert_eq!(Terrain::Plains.step_toward(Terrain::Mountain, 1), Terrain::Desert);
    assert_eq!(Terrain::Swamp.step_toward(Terrain::Forest, 5), Terrain::Forest);
}

// =============================================================================
// Tiles and cards
// =============================================================================

#[test]
fn favor_ledger_order() {
    let first = FavorTile::from_ledger_index(1).unwrap();
    assert_eq!((first.track, first.steps), (CultTrack::Fire, 3));
    let last = FavorTile::from_ledger_index(12).unwrap();
    assert_eq!((last.track, last.steps), (CultTrack::Air, 1));
    assert_eq!(FavorTile::from_code("fav-w2").unwrap().code(), "FAV-W2");
    assert_eq!(FavorTile::all().len(), 12);
    assert!(FavorTile::new(CultTrack::Earth, 4).is_none());
}

#[test]
fn bonus_cards_by_code_and_index() {
    assert_eq!(BonusCard::from_code("BON-SPD"), Some(BonusCard::Spade));
    assert_eq!(BonusCard::from_code("BON3"), Some(BonusCard::SixCoins));
    for card in BonusCard::ALL {
        assert_eq!(BonusCard::from_ledger_index(card.ledger_index()), Some(card));
    }
}

#[test]
fn town_tiles() {
    assert_eq!(TownTile::from_code("TW8VP"), Some(TownTile::Vp8));
    assert_eq!(TownTile::from_ledger_index(6), Some(TownTile::Vp2));
    assert_eq!(TownTile::Vp11.code(), "TW11VP");
}

#[test]
fn power_actions() {
    assert_eq!(PowerAction::from_code("act6"), Some(PowerAction::TwoSpades));
    assert_eq!(PowerAction::from_spend(4, 7), Some(PowerAction::Coins));
    assert_eq!(PowerAction::from_spend(3, 1), Some(PowerAction::Priest));
    assert_eq!(PowerAction::TwoSpades.cost(), 6);
    assert_eq!(PowerAction::Spade.spades(), 1);
}

#[test]
fn buildings_upgrade_in_a_chain() {
    assert_eq!(Building::TradingHouse.upgrades_from(), Some(Building::Dwelling));
    assert_eq!(Building::Dwelling.upgrades_from(), None);
    assert_eq!(Building::Dwelling.power_value(), 1);
    assert_eq!(Building::TradingHouse.power_value(), 2);
}

// =============================================================================
// Resources
// =============================================================================

#[test]
fn resource_bundles() {
    let bundle = Resources::parse("2W1C").unwrap();
    assert_eq!(bundle.get(Resource::Workers), 2);
    assert_eq!(bundle.get(Resource::Coins), 1);
    assert_eq!(Resources::parse("PW").unwrap(), Resources::new().with_power(1));
    assert!(Resources::parse("3X").is_err());
    assert!(Resources::parse("").is_err());
}

#[test]
fn exchanges_net_out() {
    let (cost, reward) = Resources::net(Resources::new().with_workers(2), Resources::new().with_workers(3));
    assert!(cost.is_empty());
    assert_eq!(reward, Resources::new().with_workers(1));
}
