//! The BGA narrative log lexer.
//!
//! A BGA log is one English sentence per event: "Alice builds a Dwelling for
//! 1 workers 2 coins [E5]". The lexer scans forward once, matching each line
//! against a priority-ordered pattern list and producing [`LogItem`]s.
//!
//! Some events span lines. A favor tile is named by the cult step logged
//! after it, and a town by the VP it pays. Those follow-ups are found in a
//! bounded lookahead window and marked consumed so the main scan skips them.
//! Triggered effects (cult bonuses, tiles) are fused into the actor's most
//! recent action as a [`Action::Compound`].

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tmledger_foundation::{
    BonusCard, Building, CultTrack, Error, ErrorContext, Faction, FavorTile, Hex, PowerAction, Resource,
    Resources, Result, Terrain, TownTile, parse_log_coord, parse_river_coord,
};
use tmledger_notation::{Action, GameSettings, LogItem, SpecialAction};
use tracing::{debug, info, trace};

/// How far ahead a follow-up line is searched for.
pub const LOOKAHEAD: usize = 50;

fn pattern(source: &str) -> Regex {
    Regex::new(source).expect("valid pattern")
}

// Header and structure.
static GAME_BOARD: Lazy<Regex> = Lazy::new(|| pattern(r"^Game board:\s*(.+)$"));
static MINI_EXPANSIONS: Lazy<Regex> = Lazy::new(|| pattern(r"^Mini-expansions:\s*(.+)$"));
static PLAYING: Lazy<Regex> = Lazy::new(|| pattern(r"^(.+?) is playing the (.+?) Faction\b"));
static MOVE: Lazy<Regex> = Lazy::new(|| pattern(r"^Move \d+\s*:"));
static TIMESTAMP: Lazy<Regex> = Lazy::new(|| pattern(r"^\d{1,2}:\d{2}(?::\d{2})?(?:\s*[AP]M)?$"));
static FINAL_SCORING: Lazy<Regex> = Lazy::new(|| pattern(r"(?i)^(?:~\s*final scoring\s*~|\*+\s*final scoring\s*\*+)$"));
static ACTION_PHASE: Lazy<Regex> = Lazy::new(|| pattern(r"(?i)^~\s*action phase\s*~$"));

// Setup and faction abilities.
static SETUP_DWELLING: Lazy<Regex> = Lazy::new(|| pattern(r"^(.+?) places a Dwelling\b.*?\[([^\]]+)\]"));
static DOUBLE_TURN: Lazy<Regex> = Lazy::new(|| pattern(r"^(.+?) takes a double-turn\b"));
static SANDSTORM: Lazy<Regex> = Lazy::new(|| pattern(r"^(.+?) uses Sandstorm ability\b.*?\[([^\]]+)\]"));
static GIANTS: Lazy<Regex> = Lazy::new(|| pattern(r"^(.+?) uses Giants Stronghold to terraform\b.*?\[([^\]]+)\]"));
static SWARMLINGS: Lazy<Regex> =
    Lazy::new(|| pattern(r"^(.+?) upgrades .*\(Swarmlings Stronghold\).*?\[([^\]]+)\]"));
static WITCHES_RIDE: Lazy<Regex> = Lazy::new(|| {
    pattern(r"^(.+?) (?:takes a Witches Ride|builds a Dwelling for free \(Witches Ride\))\b.*?\[([^\]]+)\]")
});
static MERMAIDS_TOWN: Lazy<Regex> =
    Lazy::new(|| pattern(r"^(.+?) forms a Town \(Mermaids using river\)(?:.*?\[([^\]]+)\])?"));
static HALFLINGS: Lazy<Regex> =
    Lazy::new(|| pattern(r"^(.+?) gets (\d+) Spades? to Transform and Build \(Halflings Stronghold\)"));
static AUREN_CULT: Lazy<Regex> =
    Lazy::new(|| pattern(r"^(.+?) gains \d+ on the Cult of (\w+) track \(Auren Stronghold\)"));
static ALCHEMISTS: Lazy<Regex> =
    Lazy::new(|| pattern(r"^(.+?) converts (\d+) VP into (\d+) coins? \(Alchemists ability\)"));

// Card actions.
static BONUS_CULT: Lazy<Regex> =
    Lazy::new(|| pattern(r"^(.+?) gains \d+ on the Cult of (\w+) track \(Bonus card action\)"));
static FAVOR_CULT: Lazy<Regex> =
    Lazy::new(|| pattern(r"^(.+?) gains \d+ on the Cult of (\w+) track \(Favor tile action\)"));
static BONUS_TAKEN: Lazy<Regex> = Lazy::new(|| {
    pattern(r"(?i)^(.+?) (?:takes|gets|chooses|selects) (?:a |the )?bonus card\b(.*)$")
});
static BONUS_CODE: Lazy<Regex> = Lazy::new(|| pattern(r"(?i)\b(BON\d+|BON(?:-[A-Z0-9]+)+)\b"));

// Generic actions.
static TRANSFORM: Lazy<Regex> = Lazy::new(|| {
    pattern(r"^(.+?) transforms a Terrain space (\w+) (?:→|->) (\w+) for (\d+) spade\(s\)(.*?)\[([^\]]+)\]")
});
static BUILD: Lazy<Regex> = Lazy::new(|| pattern(r"^(.+?) builds a Dwelling\b.*?\[([^\]]+)\]"));
static UPGRADE: Lazy<Regex> =
    Lazy::new(|| pattern(r"^(.+?) upgrades an? (.+?) to an? (.+?) for\b.*?\[([^\]]+)\]"));
static PASSES: Lazy<Regex> = Lazy::new(|| pattern(r"^(.+?) passes\b"));
static SEND_PRIEST: Lazy<Regex> =
    Lazy::new(|| pattern(r"^(.+?) sends a Priest to the (?:Order of the )?Cult of (\w+)(.*)$"));
static SHIPPING: Lazy<Regex> = Lazy::new(|| pattern(r"(?i)^(.+?) advances on the Shipping track\b"));
static EXCHANGE: Lazy<Regex> = Lazy::new(|| pattern(r"(?i)^(.+?) advances on the Exchange track\b"));
static BURN: Lazy<Regex> = Lazy::new(|| pattern(r"^(.+?) sacrificed (\d+) in Bowl 2\b"));
static BRIDGE: Lazy<Regex> =
    Lazy::new(|| pattern(r"^(.+?) spends \d+ power to build a Bridge \(Power action\)"));
static POWER_ACTION: Lazy<Regex> = Lazy::new(|| {
    pattern(r"^(.+?) spends (\d+)(?: power)? to (?:get|collect) (\d+)\b.*\(Power action\)")
});
static CONVERSIONS: Lazy<Regex> =
    Lazy::new(|| pattern(r"^(.+?) does some Conversions \(spent:(.*?);\s*collects:(.*?)\)"));
static AMOUNT: Lazy<Regex> = Lazy::new(|| pattern(r"(\d+)\s+([A-Za-z]+)"));
static PAID_LEECH: Lazy<Regex> = Lazy::new(|| {
    pattern(r"^(.+?) pays (\d+) VP and gets (\d+) power via Structures(?:.*?\[([^\]]+)\])?")
});
static LEECH: Lazy<Regex> =
    Lazy::new(|| pattern(r"^(.+?) gets (\d+) power via Structures(?:.*?\[([^\]]+)\])?"));
static DECLINE: Lazy<Regex> =
    Lazy::new(|| pattern(r"(?i)^(.+?) declines getting power via Structures(?:.*?\[([^\]]+)\])?"));

// Triggered follow-ups.
static CULTISTS: Lazy<Regex> =
    Lazy::new(|| pattern(r"^(.+?) gains \d+ on the Cult of (\w+) track \(Cultists ability\)"));
static FAVOR_TAKEN: Lazy<Regex> = Lazy::new(|| pattern(r"^(.+?) takes a Favor tile\b(.*)$"));
static FAVOR_CODE: Lazy<Regex> = Lazy::new(|| pattern(r"\b(FAV-?[A-Z]+\d|FAV\d+)\b"));
static FAVOR_GAIN: Lazy<Regex> =
    Lazy::new(|| pattern(r"^(.+?) gains (\d+) on the Cult of (\w+) track \(Favor tile\)"));
static TOWN_FORMED: Lazy<Regex> = Lazy::new(|| pattern(r"^(.+?) forms a Town\b"));
static TOWN_VP: Lazy<Regex> = Lazy::new(|| pattern(r"^(.+?) (?:gets|gains) (\d+) VP \(Town tile\)"));

/// Lexes a BGA log, already flattened to one entry per line.
///
/// Unrecognized lines are skipped, and so is a line whose coordinate does not
/// parse. The first item is always the [`LogItem::GameSettings`] gathered
/// from the header.
///
/// # Errors
///
/// Returns [`UnknownFaction`](tmledger_foundation::ErrorKind::UnknownFaction)
/// when a player is announced with a faction that does not exist, and
/// [`InvalidFormat`](tmledger_foundation::ErrorKind::InvalidFormat) when no
/// player is announced at all.
pub fn lex_bga(text: &str) -> Result<Vec<LogItem>> {
    let mut lexer = Lexer::new(text);
    lexer.run()?;
    lexer.finish()
}

#[derive(Clone, Copy, Debug)]
struct HalflingsWindow {
    actor: Faction,
    item: usize,
    remaining: u8,
}

struct Lexer<'a> {
    lines: Vec<&'a str>,
    consumed: HashSet<usize>,
    items: Vec<LogItem>,
    settings: GameSettings,
    setup_order: Vec<Faction>,
    turn_order: Vec<Faction>,
    pass_order: Vec<Faction>,
    round: u8,
    halflings: Option<HalflingsWindow>,
    // Last item that put a building on each hex.
    structures: HashMap<Hex, (Faction, usize)>,
    declined: HashSet<(Faction, Hex, usize)>,
}

impl<'a> Lexer<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().map(str::trim).collect(),
            consumed: HashSet::new(),
            items: Vec::new(),
            settings: GameSettings::new(),
            setup_order: Vec::new(),
            turn_order: Vec::new(),
            pass_order: Vec::new(),
            round: 0,
            halflings: None,
            structures: HashMap::new(),
            declined: HashSet::new(),
        }
    }

    fn run(&mut self) -> Result<()> {
        for index in 0..self.lines.len() {
            if self.consumed.contains(&index) {
                continue;
            }
            let line = self.lines[index];
            if line.is_empty() || MOVE.is_match(line) || TIMESTAMP.is_match(line) {
                continue;
            }
            if FINAL_SCORING.is_match(line) {
                debug!(line = index + 1, "final scoring reached");
                break;
            }
            if ACTION_PHASE.is_match(line) {
                self.start_round();
                continue;
            }
            if self.header(index, line)? {
                continue;
            }
            if let Err(error) = self.line(index, line) {
                debug!(line = index + 1, %error, text = line, "skipping line");
            }
        }
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<LogItem>> {
        self.close_halflings();
        if self.settings.players.is_empty() {
            return Err(Error::invalid_format("no player is announced with a faction"));
        }
        info!(
            players = self.settings.players.len(),
            rounds = self.round,
            items = self.items.len(),
            "lexed BGA log"
        );
        let mut items = Vec::with_capacity(self.items.len() + 1);
        items.push(LogItem::GameSettings(self.settings));
        items.extend(self.items);
        Ok(items)
    }

    fn header(&mut self, index: usize, line: &str) -> Result<bool> {
        if let Some(caps) = GAME_BOARD.captures(line) {
            self.settings.game = Some(caps[1].trim().to_string());
            return Ok(true);
        }
        if let Some(caps) = MINI_EXPANSIONS.captures(line) {
            self.settings
                .extras
                .insert("Mini-expansions".to_string(), caps[1].trim().to_string());
            return Ok(true);
        }
        if let Some(caps) = PLAYING.captures(line) {
            let name = caps[1].trim();
            let faction = Faction::from_name(&caps[2]).ok_or_else(|| {
                Error::unknown_faction(caps[2].trim()).with_context(
                    ErrorContext::new()
                        .with_source(line)
                        .with_player(name)
                        .with_position(index + 1, 1),
                )
            })?;
            trace!(player = name, faction = faction.title(), "player announced");
            self.settings.players.push((name.to_string(), faction));
            if !self.setup_order.contains(&faction) {
                self.setup_order.push(faction);
            }
            return Ok(true);
        }
        Ok(line.starts_with("Every player has chosen a Faction") || line.starts_with("The Factions auction is over"))
    }

    fn start_round(&mut self) {
        self.close_halflings();
        self.round += 1;
        let order = if self.round == 1 || self.pass_order.is_empty() {
            if self.turn_order.is_empty() {
                self.setup_order.clone()
            } else {
                self.turn_order.clone()
            }
        } else {
            let mut order = std::mem::take(&mut self.pass_order);
            for faction in &self.turn_order {
                if !order.contains(faction) {
                    order.push(*faction);
                }
            }
            order
        };
        self.pass_order.clear();
        self.turn_order.clone_from(&order);
        debug!(round = self.round, ?order, "round start");
        self.items.push(LogItem::RoundStart {
            round: self.round,
            turn_order: order,
        });
    }

    fn actor(&self, name: &str) -> Result<Faction> {
        let name = name.trim();
        self.settings
            .faction_of(name)
            .or_else(|| Faction::from_name(name))
            .ok_or_else(|| Error::unknown_player(name))
    }

    #[allow(clippy::too_many_lines)]
    fn line(&mut self, index: usize, line: &str) -> Result<()> {
        if let Some(caps) = SETUP_DWELLING.captures(line) {
            let player = self.actor(&caps[1])?;
            let hex = parse_log_coord(&caps[2])?;
            self.push_building(hex, Action::SetupDwelling { player, hex });
            return Ok(());
        }

        // Stronghold and faction abilities.
        if let Some(caps) = DOUBLE_TURN.captures(line) {
            let player = self.actor(&caps[1])?;
            self.push_special(player, SpecialAction::DoubleTurn);
            return Ok(());
        }
        if let Some(caps) = SANDSTORM.captures(line) {
            let player = self.actor(&caps[1])?;
            let hex = parse_log_coord(&caps[2])?;
            self.push_special(player, SpecialAction::Sandstorm { hex, build: false });
            return Ok(());
        }
        if let Some(caps) = GIANTS.captures(line) {
            let player = self.actor(&caps[1])?;
            let hex = parse_log_coord(&caps[2])?;
            self.push_special(player, SpecialAction::GiantsTransform { hex, build: false });
            return Ok(());
        }
        if let Some(caps) = SWARMLINGS.captures(line) {
            let player = self.actor(&caps[1])?;
            let hex = parse_log_coord(&caps[2])?;
            self.push_building(
                hex,
                Action::Special {
                    player,
                    action: SpecialAction::SwarmlingsUpgrade(hex),
                },
            );
            return Ok(());
        }
        if let Some(caps) = WITCHES_RIDE.captures(line) {
            let player = self.actor(&caps[1])?;
            let hex = parse_log_coord(&caps[2])?;
            self.push_building(
                hex,
                Action::Special {
                    player,
                    action: SpecialAction::WitchesRide(hex),
                },
            );
            return Ok(());
        }
        if let Some(caps) = MERMAIDS_TOWN.captures(line) {
            let player = self.actor(&caps[1])?;
            let river = caps.get(2).map(|m| parse_river_coord(m.as_str())).transpose()?;
            self.push_special(player, SpecialAction::MermaidsTown(river));
            self.town_tile(index, &caps[1], player);
            return Ok(());
        }
        if let Some(caps) = HALFLINGS.captures(line) {
            let player = self.actor(&caps[1])?;
            let spades = caps[2].parse::<u8>().unwrap_or(3);
            self.close_halflings();
            let item = self.fuse(
                player,
                Action::HalflingsSpade {
                    player,
                    transforms: Vec::new(),
                },
            );
            self.halflings = Some(HalflingsWindow {
                actor: player,
                item,
                remaining: spades,
            });
            return Ok(());
        }
        if let Some(caps) = AUREN_CULT.captures(line) {
            let player = self.actor(&caps[1])?;
            let track = track(&caps[2])?;
            self.push_special(player, SpecialAction::AurenCult(track));
            return Ok(());
        }
        if let Some(caps) = ALCHEMISTS.captures(line) {
            let player = self.actor(&caps[1])?;
            let cost = Resources::new().with_vp(number(&caps[2])?);
            let reward = Resources::new().with_coins(number(&caps[3])?);
            self.push(Action::Conversion { player, cost, reward });
            return Ok(());
        }

        // Card actions.
        if let Some(caps) = BONUS_CULT.captures(line) {
            let player = self.actor(&caps[1])?;
            let track = track(&caps[2])?;
            self.push_special(player, SpecialAction::BonusCult(track));
            return Ok(());
        }
        if let Some(caps) = FAVOR_CULT.captures(line) {
            let player = self.actor(&caps[1])?;
            let track = track(&caps[2])?;
            self.push_special(player, SpecialAction::FavorCult(Some(track)));
            return Ok(());
        }
        if let Some(caps) = BONUS_TAKEN.captures(line) {
            let player = self.actor(&caps[1])?;
            let card = BONUS_CODE
                .captures(&caps[2])
                .and_then(|c| BonusCard::from_code(&c[1]))
                .ok_or_else(|| Error::unknown_token(caps[2].trim(), "no bonus card code"))?;
            self.bonus_card(player, card);
            return Ok(());
        }
        if let Some(caps) = TRANSFORM.captures(line) {
            return self.transform(&caps);
        }

        // Generic actions.
        if let Some(caps) = BUILD.captures(line) {
            let player = self.actor(&caps[1])?;
            let hex = parse_log_coord(&caps[2])?;
            self.build(player, hex);
            return Ok(());
        }
        if let Some(caps) = UPGRADE.captures(line) {
            let player = self.actor(&caps[1])?;
            let to = Building::from_name(&caps[3])
                .ok_or_else(|| Error::unknown_token(caps[3].trim(), "unknown building"))?;
            let hex = parse_log_coord(&caps[4])?;
            self.push_building(hex, Action::Upgrade { player, hex, to });
            return Ok(());
        }
        if let Some(caps) = PASSES.captures(line) {
            let player = self.actor(&caps[1])?;
            if !self.pass_order.contains(&player) {
                self.pass_order.push(player);
            }
            self.push(Action::Pass { player, bonus: None });
            return Ok(());
        }
        if let Some(caps) = SEND_PRIEST.captures(line) {
            let player = self.actor(&caps[1])?;
            let track = track(&caps[2])?;
            let spaces = caps[3].contains("reclaims").then_some(1);
            self.push(Action::SendPriest { player, track, spaces });
            return Ok(());
        }
        if let Some(caps) = SHIPPING.captures(line) {
            let player = self.actor(&caps[1])?;
            self.push(Action::AdvanceShipping { player });
            return Ok(());
        }
        if let Some(caps) = EXCHANGE.captures(line) {
            let player = self.actor(&caps[1])?;
            self.push(Action::AdvanceDigging { player });
            return Ok(());
        }
        if let Some(caps) = BURN.captures(line) {
            let player = self.actor(&caps[1])?;
            let amount = caps[2]
                .parse::<u8>()
                .map_err(|_| Error::unknown_token(&caps[2], "burn amount"))?;
            self.push(Action::Burn { player, amount });
            return Ok(());
        }
        if let Some(caps) = BRIDGE.captures(line) {
            let player = self.actor(&caps[1])?;
            self.push(Action::PowerAction {
                player,
                action: PowerAction::Bridge,
                bridge: None,
            });
            return Ok(());
        }
        if let Some(caps) = POWER_ACTION.captures(line) {
            let player = self.actor(&caps[1])?;
            let cost = caps[2].parse::<u32>().unwrap_or(0);
            let reward = caps[3].parse::<u32>().unwrap_or(0);
            let action = PowerAction::from_spend(cost, reward)
                .ok_or_else(|| Error::unknown_token(line, "unknown power action"))?;
            self.push(Action::PowerAction {
                player,
                action,
                bridge: None,
            });
            return Ok(());
        }
        if let Some(caps) = CONVERSIONS.captures(line) {
            let player = self.actor(&caps[1])?;
            let (cost, reward) = Resources::net(amounts(&caps[2]), amounts(&caps[3]));
            if !cost.is_empty() || !reward.is_empty() {
                self.push(Action::Conversion { player, cost, reward });
            }
            return Ok(());
        }
        if let Some(caps) = PAID_LEECH.captures(line) {
            let player = self.actor(&caps[1])?;
            let from = self.leech_source(caps.get(4).map(|m| m.as_str()))?.map(|(f, _)| f);
            self.push(Action::AcceptLeech {
                player,
                from,
                amount: Some(number(&caps[3])?),
                vp_cost: Some(number(&caps[2])?),
            });
            return Ok(());
        }
        if let Some(caps) = LEECH.captures(line) {
            let player = self.actor(&caps[1])?;
            let from = self.leech_source(caps.get(3).map(|m| m.as_str()))?.map(|(f, _)| f);
            self.push(Action::AcceptLeech {
                player,
                from,
                amount: Some(number(&caps[2])?),
                vp_cost: None,
            });
            return Ok(());
        }
        if let Some(caps) = DECLINE.captures(line) {
            let player = self.actor(&caps[1])?;
            let coord = caps.get(2).map(|m| m.as_str());
            let source = self.leech_source(coord)?;
            if let (Some(coord), Some((from, trigger))) = (coord, source) {
                let hex = parse_log_coord(coord)?;
                if !self.declined.insert((player, hex, trigger)) {
                    trace!(player = player.title(), coord, "duplicate decline");
                    return Ok(());
                }
                self.push(Action::DeclineLeech {
                    player,
                    from: Some(from),
                });
            } else {
                self.push(Action::DeclineLeech { player, from: None });
            }
            return Ok(());
        }

        // Triggered follow-ups.
        if let Some(caps) = CULTISTS.captures(line) {
            let player = self.actor(&caps[1])?;
            let track = track(&caps[2])?;
            self.fuse(player, Action::CultAdvance { player, track });
            return Ok(());
        }
        if let Some(caps) = FAVOR_TAKEN.captures(line) {
            let player = self.actor(&caps[1])?;
            self.favor_tile(index, &caps, player)?;
            return Ok(());
        }
        if let Some(caps) = TOWN_FORMED.captures(line) {
            let player = self.actor(&caps[1])?;
            self.town_tile(index, &caps[1], player);
            return Ok(());
        }

        trace!(line = index + 1, text = line, "unrecognized line");
        Ok(())
    }

    fn transform(&mut self, caps: &Captures<'_>) -> Result<()> {
        let player = self.actor(&caps[1])?;
        let target = Terrain::from_name(&caps[3])
            .ok_or_else(|| Error::unknown_token(&caps[3], "unknown terrain"))?;
        let hex = parse_log_coord(&caps[6])?;
        let terrain = (target != player.home_terrain()).then_some(target);

        if caps[5].contains("(Bonus card action)") {
            self.push_special(
                player,
                SpecialAction::BonusSpade {
                    hex,
                    terrain,
                    build: false,
                },
            );
            return Ok(());
        }

        if let Some(window) = self.halflings.filter(|w| w.actor == player) {
            let spades = caps[4].parse::<u8>().unwrap_or(1).max(1);
            if let Some(LogItem::Action(action)) = self.items.get_mut(window.item) {
                if let Some(Action::HalflingsSpade { transforms, .. }) = halflings_part(action) {
                    transforms.push((hex, terrain));
                    let remaining = window.remaining.saturating_sub(spades);
                    self.halflings = (remaining > 0).then_some(HalflingsWindow { remaining, ..window });
                    return Ok(());
                }
            }
        }

        self.push(Action::Transform { player, hex, terrain });
        Ok(())
    }

    // A build on the hex a spade special just targeted completes that
    // special instead of standing alone.
    fn build(&mut self, player: Faction, hex: Hex) {
        if let Some(index) = self.last_main(player) {
            if let LogItem::Action(action) = &mut self.items[index] {
                if let Some(build) = pending_build(action, hex) {
                    *build = true;
                    self.structures.insert(hex, (player, index));
                    return;
                }
            }
        }
        self.push_building(hex, Action::Build { player, hex });
    }

    fn bonus_card(&mut self, player: Faction, card: BonusCard) {
        for item in self.items.iter_mut().rev() {
            match item {
                LogItem::RoundStart { .. } => break,
                LogItem::Action(Action::Pass { player: p, bonus }) if *p == player && bonus.is_none() => {
                    *bonus = Some(card);
                    return;
                }
                _ => {}
            }
        }
        if self.round == 0 {
            self.push(Action::BonusCard { player, card });
        } else {
            debug!(player = player.title(), card = card.code(), "bonus card without a pass");
        }
    }

    fn favor_tile(&mut self, index: usize, caps: &Captures<'_>, player: Faction) -> Result<()> {
        let named = FAVOR_CODE
            .captures(&caps[2])
            .and_then(|c| FavorTile::from_code(&c[1]));
        let tile = match named {
            Some(tile) => tile,
            None => {
                let (_, gain) = self
                    .lookahead(index, &FAVOR_GAIN, &caps[1])
                    .ok_or_else(|| Error::unknown_token(caps[0].trim(), "no cult gain follows the favor tile"))?;
                let steps = gain[2]
                    .parse::<u8>()
                    .map_err(|_| Error::unknown_token(&gain[2], "favor steps"))?;
                FavorTile::new(track(&gain[3])?, steps)
                    .ok_or_else(|| Error::unknown_token(gain[0].trim(), "no such favor tile"))?
            }
        };
        self.fuse(player, Action::FavorTile { player, tile });
        Ok(())
    }

    fn town_tile(&mut self, index: usize, name: &str, player: Faction) {
        let tile = self
            .lookahead(index, &TOWN_VP, name)
            .and_then(|(_, caps)| caps[2].parse::<u8>().ok())
            .and_then(TownTile::from_vp);
        match tile {
            Some(tile) => {
                self.fuse(player, Action::TownTile { player, tile });
            }
            None => debug!(player = player.title(), "town formed without a known tile"),
        }
    }

    // Finds the first unconsumed line within the window that matches and is
    // logged for the same player name, and consumes it.
    fn lookahead(&mut self, from: usize, re: &Regex, name: &str) -> Option<(usize, Captures<'a>)> {
        let end = (from + 1 + LOOKAHEAD).min(self.lines.len());
        for index in from + 1..end {
            if self.consumed.contains(&index) {
                continue;
            }
            let line: &'a str = self.lines[index];
            if let Some(caps) = re.captures(line) {
                if caps[1].trim().eq_ignore_ascii_case(name.trim()) {
                    self.consumed.insert(index);
                    return Some((index, caps));
                }
            }
        }
        None
    }

    fn leech_source(&self, coord: Option<&str>) -> Result<Option<(Faction, usize)>> {
        let Some(coord) = coord else {
            return Ok(None);
        };
        let hex = parse_log_coord(coord)?;
        Ok(self.structures.get(&hex).copied())
    }

    fn push(&mut self, action: Action) -> usize {
        if let Some(window) = self.halflings {
            if action.actor() != Some(window.actor) && !action.is_reaction() {
                self.close_halflings();
            }
        }
        trace!(action = %action, "lexed");
        self.items.push(LogItem::Action(action));
        self.items.len() - 1
    }

    fn push_special(&mut self, player: Faction, action: SpecialAction) -> usize {
        self.push(Action::Special { player, action })
    }

    fn push_building(&mut self, hex: Hex, action: Action) {
        let Some(player) = action.actor() else {
            return;
        };
        let index = self.push(action);
        self.structures.insert(hex, (player, index));
    }

    // Appends to the actor's most recent non-reaction action in this round,
    // or pushes a new action when there is none. Returns the item index.
    fn fuse(&mut self, player: Faction, extra: Action) -> usize {
        let Some(index) = self.last_main(player) else {
            return self.push(extra);
        };
        if let LogItem::Action(action) = &mut self.items[index] {
            trace!(into = %action, extra = %extra, "fused");
            if let Action::Compound(parts) = action {
                parts.push(extra);
            } else {
                let first = std::mem::replace(action, Action::Compound(Vec::new()));
                *action = Action::Compound(vec![first, extra]);
            }
        }
        index
    }

    fn last_main(&self, player: Faction) -> Option<usize> {
        for (index, item) in self.items.iter().enumerate().rev() {
            match item {
                LogItem::RoundStart { .. } => return None,
                LogItem::Action(action) if action.actor() == Some(player) && !action.is_reaction() => {
                    return Some(index);
                }
                _ => {}
            }
        }
        None
    }

    // Drops a halflings spade that never received a transform.
    fn close_halflings(&mut self) {
        let Some(window) = self.halflings.take() else {
            return;
        };
        let collapsed = match self.items.get_mut(window.item) {
            Some(LogItem::Action(Action::Compound(parts))) => {
                parts.retain(|part| !matches!(part, Action::HalflingsSpade { transforms, .. } if transforms.is_empty()));
                if parts.len() == 1 { parts.pop() } else { None }
            }
            _ => None,
        };
        if let Some(only) = collapsed {
            self.items[window.item] = LogItem::Action(only);
        }
    }
}

fn halflings_part(action: &mut Action) -> Option<&mut Action> {
    match action {
        Action::HalflingsSpade { .. } => Some(action),
        Action::Compound(parts) => parts
            .iter_mut()
            .rev()
            .find(|part| matches!(part, Action::HalflingsSpade { .. })),
        _ => None,
    }
}

// The `build` flag of a spade special on `hex` that has not built yet.
fn pending_build(action: &mut Action, hex: Hex) -> Option<&mut bool> {
    match action {
        Action::Special {
            action:
                SpecialAction::BonusSpade { hex: target, build, .. }
                | SpecialAction::Sandstorm { hex: target, build }
                | SpecialAction::GiantsTransform { hex: target, build },
            ..
        } if *target == hex && !*build => Some(build),
        Action::Compound(parts) => parts.last_mut().and_then(|last| pending_build(last, hex)),
        _ => None,
    }
}

fn track(name: &str) -> Result<CultTrack> {
    CultTrack::from_code(name).ok_or_else(|| Error::unknown_token(name, "unknown cult track"))
}

fn number(text: &str) -> Result<i32> {
    text.trim()
        .parse()
        .map_err(|_| Error::unknown_token(text, "expected a number"))
}

// "3 Power 2 Workers" as a bundle; unknown words are ignored.
fn amounts(text: &str) -> Resources {
    let mut bundle = Resources::new();
    for caps in AMOUNT.captures_iter(text) {
        let (Ok(n), Some(resource)) = (caps[1].parse::<i32>(), Resource::from_word(&caps[2])) else {
            continue;
        };
        bundle.add(resource, n);
    }
    bundle
}
