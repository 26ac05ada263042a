//! Canonical token parser.
//!
//! A cell holds one or more dot-separated parts. Parts are matched
//! case-insensitively and grouped into a single [`Action`]:
//!
//! - a build-carrying special followed by its own coordinate
//!   (`ACTS-G2.G2`, `ACT-SH-T-F4.F4`) stays one special with `build` set
//! - a conversion is only valid alongside another part
//! - for Halflings, the `T-` parts after a stronghold upgrade form one
//!   [`Action::HalflingsSpade`]
//!
//! A single part comes back bare; several become an [`Action::Compound`].

use tmledger_foundation::{
    BonusCard, Building, CultTrack, Error, Faction, FavorTile, Hex, PowerAction, Resources,
    Result, Terrain, TownTile, is_coord, parse_log_coord,
};

use crate::action::{Action, SpecialAction};

/// Parses one canonical cell for `player`.
///
/// # Errors
///
/// Returns `UnknownToken` for parts that match no rule (including a
/// standalone conversion), `MalformedCoordinate` for bad coordinates and
/// `UnknownFaction` for bad leech sources.
pub fn parse_action_code(player: Faction, code: &str) -> Result<Action> {
    let parts: Vec<&str> = code
        .split('.')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    match parts.as_slice() {
        [] => return Err(Error::unknown_token(code, "empty action code")),
        [only] if only.contains(':') => {
            return Err(Error::unknown_token(
                code,
                "conversion must accompany another action",
            ));
        }
        _ => {}
    }

    let mut actions = Vec::with_capacity(parts.len());
    let mut i = 0;
    while i < parts.len() {
        let upper = parts[i].to_ascii_uppercase();

        if player == Faction::Halflings
            && upper.starts_with("T-")
            && opens_halflings_window(actions.last())
        {
            let mut transforms = Vec::new();
            while let Some(part) = parts.get(i) {
                let upper = part.to_ascii_uppercase();
                let Some(rest) = upper.strip_prefix("T-") else {
                    break;
                };
                transforms.push(coord_terrain(rest, part)?);
                i += 1;
            }
            actions.push(Action::HalflingsSpade { player, transforms });
            continue;
        }

        let mut action = parse_part(player, &upper, parts[i])?;
        i += 1;
        if let Some((hex, build)) = build_flag(&mut action) {
            let follows = parts
                .get(i)
                .is_some_and(|next| is_coord(next) && parse_log_coord(next).ok() == Some(hex));
            if follows {
                *build = true;
                i += 1;
            }
        }
        actions.push(action);
    }

    if actions.len() == 1 {
        Ok(actions.remove(0))
    } else {
        Ok(Action::Compound(actions))
    }
}

fn opens_halflings_window(last: Option<&Action>) -> bool {
    matches!(
        last,
        Some(Action::Upgrade {
            to: Building::Stronghold,
            ..
        })
    )
}

fn build_flag(action: &mut Action) -> Option<(Hex, &mut bool)> {
    match action {
        Action::Special {
            action:
                SpecialAction::BonusSpade { hex, build, .. }
                | SpecialAction::Sandstorm { hex, build }
                | SpecialAction::GiantsTransform { hex, build },
            ..
        } if !*build => Some((*hex, build)),
        _ => None,
    }
}

fn parse_part(player: Faction, token: &str, original: &str) -> Result<Action> {
    let unknown = |reason: &str| Error::unknown_token(original, reason);

    if let Some(rest) = token.strip_prefix("PRE-") {
        return Ok(Action::PreIncome(Box::new(parse_part(player, rest, original)?)));
    }
    if let Some(rest) = token.strip_prefix("POST-") {
        return Ok(Action::PostIncome(Box::new(parse_part(player, rest, original)?)));
    }
    if token.contains(':') {
        return parse_conversion(player, token, original);
    }
    if is_coord(token) {
        return Ok(Action::Build {
            player,
            hex: parse_log_coord(token)?,
        });
    }
    if let Some(rest) = token.strip_prefix("S-") {
        return Ok(Action::SetupDwelling {
            player,
            hex: parse_log_coord(rest)?,
        });
    }
    if let Some(rest) = token.strip_prefix("TB-") {
        let (hex, terrain) = coord_terrain(rest, original)?;
        return Ok(Action::TransformBuild {
            player,
            hex,
            terrain,
        });
    }
    if let Some(rest) = token.strip_prefix("T-") {
        let (hex, terrain) = coord_terrain(rest, original)?;
        return Ok(Action::Transform {
            player,
            hex,
            terrain,
        });
    }
    if let Some(rest) = token.strip_prefix("DIG") {
        let (spades, coord) = rest.split_once('-').ok_or_else(|| unknown("expected DIG<n>-<coord>"))?;
        let spades = spades.parse().map_err(|_| unknown("bad spade count"))?;
        return Ok(Action::Dig {
            player,
            spades,
            hex: parse_log_coord(coord)?,
        });
    }
    if let Some(rest) = token.strip_prefix("UP-") {
        let (building, coord) = rest.split_once('-').ok_or_else(|| unknown("expected UP-<building>-<coord>"))?;
        let to = Building::from_code(building).ok_or_else(|| unknown("unknown building"))?;
        return Ok(Action::Upgrade {
            player,
            hex: parse_log_coord(coord)?,
            to,
        });
    }
    if let Some(rest) = token.strip_prefix("ACTS-") {
        let (hex, terrain) = coord_terrain(rest, original)?;
        return Ok(Action::Special {
            player,
            action: SpecialAction::BonusSpade {
                hex,
                terrain,
                build: false,
            },
        });
    }
    if let Some(rest) = token.strip_prefix("ACT-") {
        let action = parse_special(rest, original)?;
        return Ok(Action::Special { player, action });
    }
    if token.starts_with("ACT") {
        let (code, bridge) = match token.split_once('-') {
            Some((code, ends)) => (code, Some(coord_pair(ends, original)?)),
            None => (token, None),
        };
        let action = PowerAction::from_code(code).ok_or_else(|| unknown("unknown power action"))?;
        if bridge.is_some() && action != PowerAction::Bridge {
            return Err(unknown("only ACT1 takes bridge endpoints"));
        }
        return Ok(Action::PowerAction {
            player,
            action,
            bridge,
        });
    }
    if let Some(rest) = token.strip_prefix("ORD-") {
        let n = rest.parse().map_err(|_| unknown("bad ordination count"))?;
        return Ok(Action::Special {
            player,
            action: SpecialAction::Ordination(n),
        });
    }
    if let Some(rest) = token.strip_prefix("DL") {
        return Ok(Action::DeclineLeech {
            player,
            from: leech_source(rest, original)?,
        });
    }
    if let Some(rest) = token.strip_prefix('L') {
        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        let amount = if digits > 0 {
            Some(rest[..digits].parse().map_err(|_| unknown("bad leech amount"))?)
        } else {
            None
        };
        return Ok(Action::AcceptLeech {
            player,
            from: leech_source(&rest[digits..], original)?,
            amount,
            vp_cost: None,
        });
    }
    if let Some(rest) = token.strip_prefix("BURN") {
        let amount = rest.parse().map_err(|_| unknown("bad burn amount"))?;
        return Ok(Action::Burn { player, amount });
    }
    if token.starts_with("FAV") {
        let tile = FavorTile::from_code(token).ok_or_else(|| unknown("unknown favor tile"))?;
        return Ok(Action::FavorTile { player, tile });
    }
    if token.starts_with("TW") {
        let tile = TownTile::from_code(token).ok_or_else(|| unknown("unknown town tile"))?;
        return Ok(Action::TownTile { player, tile });
    }
    if let Some(rest) = token.strip_prefix("PASS") {
        let bonus = match rest.strip_prefix('-') {
            Some(card) => Some(BonusCard::from_code(card).ok_or_else(|| unknown("unknown bonus card"))?),
            None if rest.is_empty() => None,
            None => return Err(unknown("expected PASS or PASS-<bonus>")),
        };
        return Ok(Action::Pass { player, bonus });
    }
    if token.starts_with("BON") {
        let card = BonusCard::from_code(token).ok_or_else(|| unknown("unknown bonus card"))?;
        return Ok(Action::BonusCard { player, card });
    }
    if let Some(rest) = token.strip_prefix("->") {
        let mut chars = rest.chars();
        let letter = chars.next().map(String::from).unwrap_or_default();
        let track = track(&letter, original)?;
        let spaces = match chars.as_str() {
            "" => None,
            n => Some(n.parse().map_err(|_| unknown("bad priest spaces"))?),
        };
        return Ok(Action::SendPriest {
            player,
            track,
            spaces,
        });
    }
    match token {
        "+SHIP" => return Ok(Action::AdvanceShipping { player }),
        "+DIG" => return Ok(Action::AdvanceDigging { player }),
        _ => {}
    }
    if let Some(rest) = token.strip_prefix('+').or_else(|| token.strip_prefix("CULT-")) {
        return Ok(Action::CultAdvance {
            player,
            track: track(rest, original)?,
        });
    }
    if let Some(rest) = token.strip_prefix('-') {
        return Ok(Action::CultDecrease {
            player,
            track: track(rest, original)?,
        });
    }
    Err(unknown("unrecognized action"))
}

fn parse_special(rest: &str, original: &str) -> Result<SpecialAction> {
    let unknown = |reason: &str| Error::unknown_token(original, reason);

    if let Some(sh) = rest.strip_prefix("SH-") {
        if let Some(c) = sh.strip_prefix("D-") {
            return Ok(SpecialAction::WitchesRide(parse_log_coord(c)?));
        }
        if let Some(c) = sh.strip_prefix("TP-") {
            return Ok(SpecialAction::SwarmlingsUpgrade(parse_log_coord(c)?));
        }
        if let Some(c) = sh.strip_prefix("T-") {
            return Ok(SpecialAction::Sandstorm {
                hex: parse_log_coord(c)?,
                build: false,
            });
        }
        if let Some(c) = sh.strip_prefix("S-") {
            return Ok(SpecialAction::GiantsTransform {
                hex: parse_log_coord(c)?,
                build: false,
            });
        }
        if sh == "2X" {
            return Ok(SpecialAction::DoubleTurn);
        }
        return Ok(SpecialAction::AurenCult(track(sh, original)?));
    }
    if let Some(fav) = rest.strip_prefix("FAV") {
        return match fav.strip_prefix('-') {
            Some(t) => Ok(SpecialAction::FavorCult(Some(track(t, original)?))),
            None if fav.is_empty() => Ok(SpecialAction::FavorCult(None)),
            None => Err(unknown("expected ACT-FAV[-<track>]")),
        };
    }
    if rest == "BON-SPD" {
        return Ok(SpecialAction::BonusSpadeGrant);
    }
    if let Some(t) = rest.strip_prefix("BON-") {
        return Ok(SpecialAction::BonusCult(track(t, original)?));
    }
    if let Some(ends) = rest.strip_prefix("BR-") {
        let (a, b) = coord_pair(ends, original)?;
        return Ok(SpecialAction::EngineersBridge(a, b));
    }
    if let Some(town) = rest.strip_prefix("TOWN") {
        if town.is_empty() {
            return Ok(SpecialAction::MermaidsTown(None));
        }
        let axial = town.strip_prefix('-').ok_or_else(|| unknown("expected ACT-TOWN[-q_r]"))?;
        let (q, r) = axial.split_once('_').ok_or_else(|| unknown("expected q_r"))?;
        let q = q.parse().map_err(|_| unknown("bad axial q"))?;
        let r = r.parse().map_err(|_| unknown("bad axial r"))?;
        return Ok(SpecialAction::MermaidsTown(Some(Hex::new(q, r))));
    }
    Err(unknown("unknown special action"))
}

fn parse_conversion(player: Faction, token: &str, original: &str) -> Result<Action> {
    let body = token
        .strip_prefix('C')
        .ok_or_else(|| Error::unknown_token(original, "expected C<cost>:<reward>"))?;
    let (cost, reward) = body
        .split_once(':')
        .ok_or_else(|| Error::unknown_token(original, "expected C<cost>:<reward>"))?;
    Ok(Action::Conversion {
        player,
        cost: Resources::parse(cost)?,
        reward: Resources::parse(reward)?,
    })
}

fn coord_terrain(rest: &str, original: &str) -> Result<(Hex, Option<Terrain>)> {
    match rest.split_once('-') {
        Some((coord, terrain)) => {
            let terrain = Terrain::from_code(terrain)
                .ok_or_else(|| Error::unknown_token(original, "unknown terrain code"))?;
            Ok((parse_log_coord(coord)?, Some(terrain)))
        }
        None => Ok((parse_log_coord(rest)?, None)),
    }
}

fn coord_pair(text: &str, original: &str) -> Result<(Hex, Hex)> {
    let (a, b) = text
        .split_once('-')
        .ok_or_else(|| Error::unknown_token(original, "expected two coordinates"))?;
    Ok((parse_log_coord(a)?, parse_log_coord(b)?))
}

fn track(code: &str, original: &str) -> Result<CultTrack> {
    CultTrack::from_code(code).ok_or_else(|| Error::unknown_token(original, "unknown cult track"))
}

fn leech_source(rest: &str, original: &str) -> Result<Option<Faction>> {
    if rest.is_empty() {
        return Ok(None);
    }
    let name = rest
        .strip_prefix('-')
        .ok_or_else(|| Error::unknown_token(original, "expected -<source>"))?;
    Faction::from_name(name)
        .map(Some)
        .ok_or_else(|| Error::unknown_faction(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tmledger_foundation::ErrorKind;

    fn parts(action: &Action) -> &[Action] {
        match action {
            Action::Compound(actions) => actions,
            other => panic!("expected compound, got {other:?}"),
        }
    }

    #[test]
    fn recognizes_special_act_codes() {
        for code in ["ACT-BON-E", "ACT-FAV", "ACT-TOWN-2_-3", "ACT-BR-C2-D4"] {
            let action = parse_action_code(Faction::Cultists, code).unwrap();
            assert!(matches!(action, Action::Special { .. }), "{code}: {action:?}");
        }
    }

    #[test]
    fn cult_shorthand_in_compound() {
        let action = parse_action_code(Faction::Cultists, "UP-TH-E6.+E").unwrap();
        let parts = parts(&action);
        assert_eq!(parts.len(), 2);
        assert!(matches!(parts[1], Action::CultAdvance { track: CultTrack::Earth, .. }));
    }

    #[test]
    fn cult_decrease_shorthand() {
        let action = parse_action_code(Faction::Cultists, "-W").unwrap();
        assert!(matches!(action, Action::CultDecrease { track: CultTrack::Water, .. }));
    }

    #[test]
    fn decrease_selectors_before_town() {
        let action = parse_action_code(Faction::Witches, "-F.-W.-E.TW8VP").unwrap();
        let parts = parts(&action);
        assert_eq!(parts.len(), 4);
        assert!(parts[..3].iter().all(|a| matches!(a, Action::CultDecrease { .. })));
        assert!(matches!(parts[3], Action::TownTile { tile: TownTile::Vp8, .. }));
    }

    #[test]
    fn rejects_standalone_conversion() {
        let err = parse_action_code(Faction::Cultists, "C5PW:1P").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::UnknownToken { .. }));
    }

    #[test]
    fn dl_is_a_decline() {
        let action = parse_action_code(Faction::Cultists, "DL").unwrap();
        assert!(matches!(action, Action::DeclineLeech { from: None, .. }));
    }

    #[test]
    fn conversion_inside_compound_any_case() {
        for code in ["BURN3.C5PW:1P.+SHIP", "burn3.c5pw:1p.+ship"] {
            let action = parse_action_code(Faction::Witches, code).unwrap();
            let parts = parts(&action);
            assert_eq!(parts.len(), 3);
            assert!(matches!(parts[0], Action::Burn { amount: 3, .. }));
            assert!(matches!(parts[1], Action::Conversion { .. }));
            assert!(matches!(parts[2], Action::AdvanceShipping { .. }));
        }
    }

    #[test]
    fn pass_with_trailing_cult_bonus() {
        let action = parse_action_code(Faction::Cultists, "PASS-BON-BB.+A").unwrap();
        let parts = parts(&action);
        assert!(matches!(
            parts[0],
            Action::Pass {
                bonus: Some(BonusCard::BigBuildings),
                ..
            }
        ));
        assert!(matches!(parts[1], Action::CultAdvance { track: CultTrack::Air, .. }));
    }

    #[test]
    fn build_specials_stay_combined() {
        let action = parse_action_code(Faction::Dwarves, "ACTS-G2.G2").unwrap();
        assert!(matches!(
            action,
            Action::Special {
                action: SpecialAction::BonusSpade { build: true, .. },
                ..
            }
        ));
        let action = parse_action_code(Faction::Nomads, "ACT-SH-T-F4.F4").unwrap();
        assert!(matches!(
            action,
            Action::Special {
                action: SpecialAction::Sandstorm { build: true, .. },
                ..
            }
        ));
    }

    #[test]
    fn combined_special_then_conversion() {
        let action = parse_action_code(Faction::Cultists, "ACTS-B5.B5.C1PW:1C").unwrap();
        let parts = parts(&action);
        assert_eq!(parts.len(), 2);
        assert!(matches!(parts[1], Action::Conversion { .. }));
    }

    #[test]
    fn no_merge_across_conversion() {
        let action = parse_action_code(Faction::Nomads, "ACTS-E3.C2PW:2C.E3").unwrap();
        let parts = parts(&action);
        assert_eq!(parts.len(), 3);
        assert!(matches!(
            parts[0],
            Action::Special {
                action: SpecialAction::BonusSpade { build: false, .. },
                ..
            }
        ));
        assert!(matches!(parts[2], Action::Build { .. }));
    }

    #[test]
    fn cult_alias_and_priest() {
        let action = parse_action_code(Faction::Auren, "CULT-F").unwrap();
        assert!(matches!(action, Action::CultAdvance { track: CultTrack::Fire, .. }));
        let action = parse_action_code(Faction::Auren, "->W2").unwrap();
        assert!(matches!(
            action,
            Action::SendPriest {
                track: CultTrack::Water,
                spaces: Some(2),
                ..
            }
        ));
    }

    #[test]
    fn leech_forms() {
        let action = parse_action_code(Faction::Auren, "L3-Engineers").unwrap();
        assert_eq!(
            action,
            Action::AcceptLeech {
                player: Faction::Auren,
                from: Some(Faction::Engineers),
                amount: Some(3),
                vp_cost: None,
            }
        );
        let action = parse_action_code(Faction::Auren, "l-chaosmagicians").unwrap();
        assert!(matches!(
            action,
            Action::AcceptLeech {
                from: Some(Faction::ChaosMagicians),
                amount: None,
                ..
            }
        ));
        let err = parse_action_code(Faction::Auren, "L-Nobody").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::UnknownFaction(_)));
    }

    #[test]
    fn halflings_spades_after_stronghold() {
        let action = parse_action_code(Faction::Halflings, "UP-SH-E6.T-G5.T-F6-Y.T-F5").unwrap();
        let parts = parts(&action);
        assert_eq!(parts.len(), 2);
        match &parts[1] {
            Action::HalflingsSpade { transforms, .. } => {
                assert_eq!(transforms.len(), 3);
                assert_eq!(transforms[1].1, Some(Terrain::Desert));
            }
            other => panic!("expected halflings spade, got {other:?}"),
        }
    }

    #[test]
    fn income_wrappers() {
        let action = parse_action_code(Faction::Cultists, "PRE-+F").unwrap();
        assert!(matches!(action, Action::PreIncome(_)));
        assert!(action.is_auxiliary());
    }

    #[test]
    fn power_action_with_bridge() {
        let action = parse_action_code(Faction::Engineers, "ACT1-C2-D4").unwrap();
        assert!(matches!(
            action,
            Action::PowerAction {
                action: PowerAction::Bridge,
                bridge: Some(_),
                ..
            }
        ));
        assert!(parse_action_code(Faction::Engineers, "ACT3-C2-D4").is_err());
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_action_code(Faction::Cultists, "BADTOKEN").is_err());
        assert!(parse_action_code(Faction::Cultists, "").is_err());
        assert!(parse_action_code(Faction::Cultists, "Z9").is_err());
    }
}
