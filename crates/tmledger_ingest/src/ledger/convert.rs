//! Ledger command to canonical token conversion.
//!
//! Commands are dot-separated clauses (`burn 2. action ACT6. transform F2 to
//! gray. build D4`). Most clauses map one-to-one onto a canonical token;
//! faction and card actions swallow the clause that completes them
//! (`action ACTW. build E7` becomes the single token `ACT-SH-D-E7`).

use once_cell::sync::Lazy;
use regex::Regex;
use tmledger_foundation::{BonusCard, CultTrack, Faction, FavorTile, Terrain, TownTile};

static TRANSFORM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)transform (\w+) to (\w+)").expect("valid pattern"));
static UPGRADE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)upgrade (\w+) to (\w+)").expect("valid pattern"));
static FAVOR_GAIN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\+FAV(\d+)").expect("valid pattern"));
static CONVERT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)convert (.*) to (.*)").expect("valid pattern"));
static BURN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)burn (\d+)").expect("valid pattern"));
static DIG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^dig (\d+)").expect("valid pattern"));
static BRIDGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^bridge (\w+)\s*:\s*(\w+)").expect("valid pattern"));
static DOUBLE_TRACK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+2(FIRE|WATER|EARTH|AIR)$").expect("valid pattern"));
static SINGLE_TRACK: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+(FIRE|WATER|EARTH|AIR)$").expect("valid pattern"));
static FAVOR_ACTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^FAV(\d+)$").expect("valid pattern"));
static TOWN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^TW(\d+)$").expect("valid pattern"));

/// Converts one ledger command to a dot-joined canonical token.
///
/// `cult_delta` is the cult movement the row recorded (see
/// [`cult_delta`](super::extract::cult_delta)); it decides how far a sent
/// priest advanced. Returns an empty string for rows that carry no action.
#[must_use]
pub fn convert_ledger_action(action: &str, faction: Faction, in_setup: bool, cult_delta: u8) -> String {
    let action = action.trim();
    let lower = action.to_lowercase();

    if matches!(action, "setup" | "other_income_for_faction" | "score_resources")
        || action.contains("[opponent")
        || lower.contains("for network")
        || lower.contains("for cult")
    {
        return String::new();
    }

    if let Some(coord) = strip_prefix_ci(action, "build ") {
        if action.contains('.') {
            return convert_compound(action, faction, cult_delta);
        }
        let coord = coord.trim().to_uppercase();
        return if in_setup { format!("S-{coord}") } else { coord };
    }
    if lower.starts_with("upgrade ") {
        if action.contains('.') {
            return convert_compound(action, faction, cult_delta);
        }
        return upgrade(action).unwrap_or_default();
    }
    if lower == "pass" {
        return "PASS".to_string();
    }
    if let Some(card) = strip_prefix_ci(action, "pass ") {
        let code = bonus_code(card);
        return if in_setup { code } else { format!("PASS-{code}") };
    }
    if lower.starts_with("leech ") {
        return "L".to_string();
    }
    if lower.starts_with("decline ") {
        return "DL".to_string();
    }
    if lower.starts_with("send p to ") && !action.contains('.') {
        return send_priest(action, cult_delta).unwrap_or_default();
    }
    if lower.starts_with("dig ") {
        let converted = convert_compound(action, faction, cult_delta);
        if !converted.is_empty() || faction == Faction::Darklings {
            return converted;
        }
        return "+DIG".to_string();
    }
    if lower.starts_with("advance ship") && !action.contains('.') {
        return "+SHIP".to_string();
    }
    if lower.starts_with("advance dig") && !action.contains('.') {
        return "+DIG".to_string();
    }
    let compound = ["action ", "burn ", "send p to ", "transform ", "convert ", "advance "];
    if compound.iter().any(|p| lower.starts_with(p)) || action.starts_with('+') {
        return convert_compound(action, faction, cult_delta);
    }
    String::new()
}

fn strip_prefix_ci<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &text[prefix.len()..])
}

fn bonus_code(card: &str) -> String {
    let upper = card.trim().to_uppercase();
    BonusCard::from_code(&upper).map_or(upper, |c| c.code().to_string())
}

fn favor_code(index: &str) -> Option<String> {
    let tile = FavorTile::from_ledger_index(index.parse().ok()?)?;
    Some(tile.code())
}

fn town_code(index: &str) -> Option<String> {
    let tile = TownTile::from_ledger_index(index.parse().ok()?)?;
    Some(tile.code())
}

fn track_code(name: &str) -> Option<&'static str> {
    CultTrack::from_code(name).map(CultTrack::code)
}

// `upgrade E5 to TP` becomes `UP-TH-E5`; a `+FAVn` in the same clause is kept.
fn upgrade(part: &str) -> Option<String> {
    let caps = UPGRADE.captures(part)?;
    let coord = caps[1].to_uppercase();
    let building = match caps[2].to_uppercase().as_str() {
        "TP" => "TH".to_string(),
        other => other.to_string(),
    };
    let mut token = format!("UP-{building}-{coord}");
    if let Some(fav) = FAVOR_GAIN.captures(part).and_then(|f| favor_code(&f[1])) {
        token.push('.');
        token.push_str(&fav);
    }
    Some(token)
}

fn send_priest(part: &str, cult_delta: u8) -> Option<String> {
    let lower = part.trim().to_lowercase();
    let rest = lower.strip_prefix("send p to ")?;
    let track = rest.split('.').next().unwrap_or_default().trim();
    let code = track_code(track)?;
    Some(if (1..=3).contains(&cult_delta) {
        format!("->{code}{cult_delta}")
    } else {
        format!("->{code}")
    })
}

fn transform_target(part: &str) -> Option<(String, Option<Terrain>)> {
    let caps = TRANSFORM.captures(part)?;
    Some((caps[1].to_uppercase(), Terrain::from_name(&caps[2])))
}

fn transform(part: &str, faction: Faction) -> Option<String> {
    let (coord, terrain) = transform_target(part)?;
    Some(match terrain {
        Some(t) if t != faction.home_terrain() => format!("T-{coord}-{}", t.code()),
        _ => format!("T-{coord}"),
    })
}

fn build_coord(part: &str) -> Option<String> {
    strip_prefix_ci(part, "build ").map(|c| c.trim().to_uppercase())
}

// Clause list with consumed entries blanked out.
struct Clauses {
    parts: Vec<Option<String>>,
}

impl Clauses {
    fn new(action: &str) -> Self {
        Self {
            parts: action.split('.').map(|p| Some(p.trim().to_string())).collect(),
        }
    }

    fn len(&self) -> usize {
        self.parts.len()
    }

    fn get(&self, i: usize) -> Option<&str> {
        self.parts.get(i)?.as_deref()
    }

    // Takes the first clause after `after` that `pick` accepts.
    fn take_after<T>(&mut self, after: usize, pick: impl Fn(&str) -> Option<T>) -> Option<T> {
        for j in after + 1..self.parts.len() {
            if let Some(value) = self.get(j).and_then(&pick) {
                self.parts[j] = None;
                return Some(value);
            }
        }
        None
    }

    // Takes the clause right after `after` if `pick` accepts it.
    fn take_next_if<T>(&mut self, after: usize, pick: impl Fn(&str) -> Option<T>) -> Option<T> {
        let j = after + 1;
        let value = self.get(j).and_then(pick)?;
        self.parts[j] = None;
        Some(value)
    }
}

fn is_track_clause(part: &str) -> bool {
    let upper = part.to_uppercase();
    part.starts_with('+') && !upper.starts_with("+SHIP") && !upper.starts_with("+FAV")
}

fn convert_compound(action: &str, faction: Faction, cult_delta: u8) -> String {
    let mut clauses = Clauses::new(action);
    let bonus_cult = clauses.parts.iter().flatten().any(|p| {
        strip_prefix_ci(p, "action ").is_some_and(|a| a.trim().eq_ignore_ascii_case("BON2"))
    });
    let cult_track = clauses
        .parts
        .iter()
        .flatten()
        .filter(|p| is_track_clause(p))
        .filter_map(|p| track_code(&p[1..]))
        .last();

    let mut out: Vec<String> = Vec::new();
    for i in 0..clauses.len() {
        let Some(part) = clauses.get(i).map(str::to_string) else {
            continue;
        };
        let lower = part.to_lowercase();

        if let Some(n) = BURN.captures(&part).filter(|_| lower.starts_with("burn ")) {
            out.push(format!("BURN{}", &n[1]));
        }

        if let Some(act) = strip_prefix_ci(&part, "action ") {
            let act = act.trim().to_uppercase();
            out.extend(card_action(&mut clauses, i, &act, bonus_cult.then_some(cult_track).flatten()));
            continue;
        }

        if part.starts_with('+') {
            if bonus_cult && cult_track.is_some() && is_track_clause(&part) {
                continue;
            }
            out.extend(gain(&part[1..]));
        }

        if let Some(n) = DIG.captures(&part) {
            // A dig kept apart from its transform by a conversion stays explicit.
            let separated = clauses.get(i + 1).is_some_and(|p| p.to_lowercase().starts_with("convert "));
            if separated {
                let spades = n[1].to_string();
                if let Some((coord, _)) = clauses.take_after(i, transform_target) {
                    out.push(format!("DIG{spades}-{coord}"));
                }
            }
        }

        if lower.starts_with("transform ") {
            out.extend(transform(&part, faction));
        }
        if let Some(coord) = build_coord(&part) {
            out.push(coord);
        }
        if lower.starts_with("upgrade ") {
            out.extend(upgrade(&part));
        }
        if let Some(caps) = CONVERT.captures(&part).filter(|_| lower.starts_with("convert ")) {
            let cost = caps[1].replace(' ', "").to_uppercase();
            let reward = caps[2].replace(' ', "").to_uppercase();
            out.push(format!("C{cost}:{reward}"));
        }
        if lower.starts_with("advance ship") {
            out.push("+SHIP".to_string());
        }
        if lower.starts_with("advance dig") {
            out.push("+DIG".to_string());
        }
        if lower.starts_with("send p to ") {
            out.extend(send_priest(&part, cult_delta));
        }
        if lower == "pass" {
            out.push("PASS".to_string());
        }
        if let Some(card) = strip_prefix_ci(&part, "pass ") {
            out.push(format!("PASS-{}", bonus_code(card)));
        }
    }
    out.join(".")
}

// A `+X` clause: town tile, favor tile, shipping or a cult step.
fn gain(what: &str) -> Option<String> {
    let upper = what.trim().to_uppercase();
    if upper.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    if let Some(caps) = TOWN.captures(&upper) {
        return town_code(&caps[1]);
    }
    if upper == "SHIP" {
        return Some("+SHIP".to_string());
    }
    if let Some(index) = upper.strip_prefix("FAV") {
        return favor_code(index);
    }
    track_code(&upper).map(|t| format!("+{t}"))
}

fn card_action(clauses: &mut Clauses, i: usize, act: &str, bonus_track: Option<&str>) -> Vec<String> {
    let build = |p: &str| build_coord(p);
    let transformed = |p: &str| {
        p.to_lowercase()
            .starts_with("transform ")
            .then(|| transform_target(p).map(|(coord, _)| coord))
            .flatten()
    };

    match act {
        "ACTA" => {
            let aura = clauses.take_after(i, |p| {
                DOUBLE_TRACK
                    .captures(&p.to_uppercase())
                    .and_then(|c| track_code(&c[1]))
                    .map(|t| format!("ACT-SH-{t}"))
            });
            vec![aura.unwrap_or_else(|| act.to_string())]
        }
        "ACTW" => vec![
            clauses
                .take_after(i, build)
                .map_or_else(|| act.to_string(), |c| format!("ACT-SH-D-{c}")),
        ],
        "ACTG" => vec![
            clauses
                .take_after(i, transformed)
                .map_or_else(|| act.to_string(), |c| format!("ACT-SH-S-{c}")),
        ],
        "ACTN" => {
            let first = clauses.take_after(i, |p| {
                transformed(p)
                    .map(|c| (c, false))
                    .or_else(|| build(p).map(|c| (c, true)))
            });
            match first {
                Some((coord, true)) => vec![format!("ACT-SH-T-{coord}.{coord}")],
                Some((coord, false)) => {
                    let mut token = format!("ACT-SH-T-{coord}");
                    if let Some(built) = clauses.take_after(i, build) {
                        token.push('.');
                        token.push_str(&built);
                    }
                    vec![token]
                }
                None => vec![act.to_string()],
            }
        }
        "ACTC" => vec!["ACT-SH-2X".to_string()],
        "ACTS" => vec![
            clauses
                .take_after(i, |p| {
                    UPGRADE
                        .captures(p)
                        .filter(|c| c[2].eq_ignore_ascii_case("TP"))
                        .map(|c| c[1].to_uppercase())
                })
                .map_or_else(|| act.to_string(), |c| format!("ACT-SH-TP-{c}")),
        ],
        "ACTE" | "ACT1" => {
            let ends = clauses.take_next_if(i, |p| {
                BRIDGE
                    .captures(p)
                    .map(|c| (c[1].to_uppercase(), c[2].to_uppercase()))
            });
            match (act, ends) {
                ("ACTE", Some((a, b))) => vec![format!("ACT-BR-{a}-{b}")],
                ("ACT1", Some((a, b))) => vec![format!("ACT1-{a}-{b}")],
                _ => vec![act.to_string()],
            }
        }
        "BON1" => {
            let target = clauses.take_after(i, |p| {
                transformed(p)
                    .map(|c| (c, false))
                    .or_else(|| build(p).map(|c| (c, true)))
            });
            match target {
                Some((coord, true)) => vec![format!("ACTS-{coord}"), coord],
                Some((coord, false)) => vec![format!("ACTS-{coord}")],
                None => vec!["ACT-BON-SPD".to_string()],
            }
        }
        "BON2" => match bonus_track {
            Some(track) => vec![format!("ACT-BON-{track}")],
            None => vec![act.to_string()],
        },
        _ => {
            if let Some(index) = FAVOR_ACTION.captures(act).map(|c| c[1].to_string()) {
                let track = clauses.take_after(i, |p| {
                    SINGLE_TRACK
                        .captures(&p.to_uppercase())
                        .and_then(|c| track_code(&c[1]))
                        .map(|t| format!("ACT-FAV-{t}"))
                });
                return track.or_else(|| favor_code(&index)).into_iter().collect();
            }
            vec![act.to_string()]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert(action: &str, faction: Faction) -> String {
        convert_ledger_action(action, faction, false, 0)
    }

    #[test]
    fn builds_and_setup() {
        assert_eq!(convert_ledger_action("build e7", Faction::Engineers, true, 0), "S-E7");
        assert_eq!(convert("build E7", Faction::Engineers), "E7");
        assert_eq!(convert_ledger_action("pass BON3", Faction::Witches, true, 0), "BON-6C");
        assert_eq!(convert("pass BON3", Faction::Witches), "PASS-BON-6C");
        assert_eq!(convert("pass", Faction::Witches), "PASS");
    }

    #[test]
    fn reactions() {
        assert_eq!(convert("Leech 2 from witches", Faction::Nomads), "L");
        assert_eq!(convert("Decline 4 from witches", Faction::Nomads), "DL");
    }

    #[test]
    fn upgrades_rename_trading_posts() {
        assert_eq!(convert("upgrade E5 to TP", Faction::Witches), "UP-TH-E5");
        assert_eq!(convert("upgrade E5 to TE. +FAV11", Faction::Witches), "UP-TE-E5.FAV-E1");
        assert_eq!(convert("upgrade F4 to SA. +FAV1. +TW2", Faction::Witches), "UP-SA-F4.FAV-F3.TW7VP");
    }

    #[test]
    fn transforms_omit_home_terrain() {
        assert_eq!(convert("transform F5 to green. build F5", Faction::Witches), "T-F5.F5");
        assert_eq!(convert("transform F5 to gray", Faction::Witches), "T-F5-Gy");
        assert_eq!(
            convert("burn 6. action ACT6. transform F2 to gray. build D4", Faction::Engineers),
            "BURN6.ACT6.T-F2.D4"
        );
    }

    #[test]
    fn faction_actions_swallow_their_clause() {
        assert_eq!(convert("action ACTW. build E7", Faction::Witches), "ACT-SH-D-E7");
        assert_eq!(convert("action ACTG. transform E7 to red", Faction::Giants), "ACT-SH-S-E7");
        assert_eq!(convert("action ACTN. transform E7 to yellow. build E7", Faction::Nomads), "ACT-SH-T-E7.E7");
        assert_eq!(convert("action ACTN. build E7", Faction::Nomads), "ACT-SH-T-E7.E7");
        assert_eq!(convert("action ACTA. +2FIRE", Faction::Auren), "ACT-SH-F");
        assert_eq!(convert("action FAV6. +WATER", Faction::Auren), "ACT-FAV-W");
        assert_eq!(convert("action ACTC", Faction::ChaosMagicians), "ACT-SH-2X");
        assert_eq!(convert("action ACTS. upgrade F3 to TP", Faction::Swarmlings), "ACT-SH-TP-F3");
        assert_eq!(convert("action ACTE. bridge C2:D4", Faction::Engineers), "ACT-BR-C2-D4");
        assert_eq!(convert("action ACT1. bridge C2:D4", Faction::Engineers), "ACT1-C2-D4");
    }

    #[test]
    fn bonus_card_actions() {
        assert_eq!(convert("action BON1. transform G2 to brown", Faction::Cultists), "ACTS-G2");
        assert_eq!(convert("action BON1. build G2", Faction::Cultists), "ACTS-G2.G2");
        assert_eq!(convert("action BON1", Faction::Cultists), "ACT-BON-SPD");
        assert_eq!(convert("action BON2. +WATER", Faction::Cultists), "ACT-BON-W");
    }

    #[test]
    fn conversions_and_advances() {
        assert_eq!(convert("convert 1 PW to 1 C", Faction::Witches), "C1PW:1C");
        assert_eq!(convert("burn 3. convert 5PW to 1P. advance ship", Faction::Witches), "BURN3.C5PW:1P.+SHIP");
        assert_eq!(convert("advance dig", Faction::Witches), "+DIG");
        assert_eq!(convert("+EARTH", Faction::Cultists), "+E");
        assert_eq!(convert("+15vp", Faction::Cultists), "");
    }

    #[test]
    fn priests_use_the_cult_delta() {
        assert_eq!(convert_ledger_action("send p to WATER", Faction::Witches, false, 2), "->W2");
        assert_eq!(convert_ledger_action("send p to FIRE", Faction::Witches, false, 0), "->F");
    }

    #[test]
    fn digs() {
        assert_eq!(convert("dig 1. build G6", Faction::Dwarves), "G6");
        assert_eq!(convert("dig 1", Faction::Dwarves), "+DIG");
        assert_eq!(convert("dig 1", Faction::Darklings), "");
        assert_eq!(
            convert("dig 1. convert 1W to 1C. transform E7 to black", Faction::Darklings),
            "DIG1-E7.C1W:1C"
        );
    }

    #[test]
    fn bookkeeping_yields_nothing() {
        assert_eq!(convert("setup", Faction::Witches), "");
        assert_eq!(convert("[opponent fell asleep]", Faction::Witches), "");
        assert_eq!(convert("wave hello", Faction::Witches), "");
    }
}
