//! HTML normalizers.
//!
//! Both sources are also published as web pages. These functions reduce a
//! page to the plain text the lexers read: one narrative entry per line for
//! BGA, one tab-joined ledger row per line for Snellman.

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use once_cell::sync::Lazy;
use regex::Regex;
use tmledger_foundation::{Error, Result};

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid pattern"));
static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("valid pattern"));
static SHOW_HISTORY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*show history\s*$").expect("valid pattern"));
static TABS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\t+").expect("valid pattern"));
static SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r" +").expect("valid pattern"));

// Amount badges and the unit word each one reads as.
const AMOUNT_UNITS: &[(&str, &str)] = &[
    ("workers_amount", "workers"),
    ("coins_amount", "coins"),
    ("power_amount", "power"),
    ("spade_amount", "spade(s)"),
    ("vp_amount", "VP"),
    ("priests_amount", "Priests"),
    ("cult_p_amount", "priest(s)"),
    ("earth_amount", ""),
    ("fire_amount", ""),
    ("water_amount", ""),
    ("air_amount", ""),
];

const TERRAIN_ICONS: &[(&str, &str)] = &[
    ("trans_mountains", "mountains"),
    ("trans_forest", "forest"),
    ("trans_lakes", "lakes"),
    ("trans_swamp", "swamp"),
    ("trans_desert", "desert"),
    ("trans_plains", "plains"),
    ("trans_wasteland", "wasteland"),
];

const ICON: &str = "tmlogs_icon";

fn parse(html: &str) -> RcDom {
    parse_document(RcDom::default(), Default::default()).one(html)
}

fn tag_is(handle: &Handle, tag: &str) -> bool {
    matches!(&handle.data, NodeData::Element { name, .. } if &*name.local == tag)
}

fn attr(handle: &Handle, key: &str) -> Option<String> {
    match &handle.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|a| &*a.name.local == key)
            .map(|a| String::from(&*a.value)),
        _ => None,
    }
}

fn has_class(handle: &Handle, class: &str) -> bool {
    attr(handle, "class").is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
}

fn element_children(handle: &Handle) -> Vec<Handle> {
    handle
        .children
        .borrow()
        .iter()
        .filter(|child| matches!(child.data, NodeData::Element { .. }))
        .cloned()
        .collect()
}

fn collect_text(handle: &Handle, out: &mut String) {
    match &handle.data {
        NodeData::Text { contents } => out.push_str(&contents.borrow()),
        NodeData::Element { .. } if tag_is(handle, "script") || tag_is(handle, "style") => {}
        _ => {
            for child in handle.children.borrow().iter() {
                collect_text(child, out);
            }
        }
    }
}

fn plain_text(handle: &Handle) -> String {
    let mut out = String::new();
    collect_text(handle, &mut out);
    out
}

fn find_all(handle: &Handle, pred: &dyn Fn(&Handle) -> bool, out: &mut Vec<Handle>) {
    if pred(handle) {
        out.push(handle.clone());
        return;
    }
    for child in handle.children.borrow().iter() {
        find_all(child, pred, out);
    }
}

// =============================================================================
// BGA
// =============================================================================

// The text an icon-like element reads as, if it is one.
fn badge_text(handle: &Handle) -> Option<String> {
    for (class, unit) in AMOUNT_UNITS {
        if has_class(handle, class) {
            let amount = plain_text(handle).trim().to_string();
            return Some(if unit.is_empty() {
                amount
            } else {
                format!("{amount} {unit}")
            });
        }
    }
    TERRAIN_ICONS
        .iter()
        .find(|(class, _)| has_class(handle, class))
        .map(|(_, word)| (*word).to_string())
}

fn icon_text(handle: &Handle) -> Option<String> {
    if !has_class(handle, ICON) {
        return badge_text(handle);
    }
    element_children(handle)
        .iter()
        .find_map(badge_text)
        .or_else(|| attr(handle, "title"))
}

fn collect_entry_text(handle: &Handle, out: &mut String) {
    if let Some(text) = icon_text(handle) {
        out.push_str(&text);
        return;
    }
    match &handle.data {
        NodeData::Text { contents } => out.push_str(&contents.borrow()),
        _ => {
            for child in handle.children.borrow().iter() {
                collect_entry_text(child, out);
            }
        }
    }
}

// A conversion entry renders its closing parenthesis before the collected
// resources; move it to the end so the lexer sees the whole list.
fn repair_conversion(text: &str) -> String {
    if !(text.contains("Conversions") && text.contains("collects:")) {
        return text.to_string();
    }
    let repaired = text.split_once("collects:").and_then(|(head, suffix)| {
        let (before, after) = suffix.split_once(')')?;
        DIGITS
            .is_match(after)
            .then(|| format!("{head}collects:{before}{after})"))
    });
    repaired.unwrap_or_else(|| text.to_string())
}

/// Reduces a BGA game log page to narrative text, one entry per line.
///
/// Resource badges become `"<n> <unit>"`, terrain icons become terrain
/// words, and other icons become their title. If the page has no
/// `div.gamelogreview` entries the whole document text is returned.
#[must_use]
pub fn bga_html_to_text(html: &str) -> String {
    let dom = parse(html);
    let mut entries = Vec::new();
    find_all(
        &dom.document,
        &|h| tag_is(h, "div") && has_class(h, "gamelogreview"),
        &mut entries,
    );
    if entries.is_empty() {
        return plain_text(&dom.document).trim().to_string();
    }
    let lines: Vec<String> = entries
        .iter()
        .map(|entry| {
            let mut text = String::new();
            collect_entry_text(entry, &mut text);
            let repaired = repair_conversion(text.trim());
            WHITESPACE.replace_all(&repaired, " ").into_owned()
        })
        .collect();
    tracing::debug!(entries = lines.len(), "extracted BGA log entries");
    lines.join("\n")
}

// =============================================================================
// Snellman
// =============================================================================

fn normalize_cell(raw: &str) -> Option<String> {
    let collapsed = WHITESPACE.replace_all(raw.trim(), " ");
    let text = SHOW_HISTORY.replace(&collapsed, "").trim().to_string();
    if text.is_empty() || text.eq_ignore_ascii_case("Load full log") {
        None
    } else {
        Some(text)
    }
}

fn is_cell(handle: &Handle) -> bool {
    tag_is(handle, "td") || tag_is(handle, "th")
}

fn row_lines(row: &Handle, lines: &mut Vec<String>) {
    let mut cells = Vec::new();
    find_all(row, &is_cell, &mut cells);

    if let Some(header) = cells.iter().find(|c| attr(c, "colspan").is_some()) {
        if let Some(text) = normalize_cell(&plain_text(header)) {
            lines.push(text);
        }
    }

    let fields: Vec<String> = cells
        .iter()
        .filter(|c| attr(c, "colspan").is_none())
        .filter_map(|c| normalize_cell(&plain_text(c)))
        .collect();
    if !fields.is_empty() {
        lines.push(fields.join("\t"));
    }
}

/// Reduces a Snellman ledger page to tab-delimited ledger text.
///
/// # Errors
///
/// Returns an `Html` error if the page has no `table#ledger`, or if the
/// table yields no lines.
pub fn snellman_html_to_text(html: &str) -> Result<String> {
    let dom = parse(html);
    let mut tables = Vec::new();
    find_all(
        &dom.document,
        &|h| tag_is(h, "table") && attr(h, "id").as_deref() == Some("ledger"),
        &mut tables,
    );
    let table = tables
        .first()
        .ok_or_else(|| Error::html("ledger table not found"))?;

    let mut rows = Vec::new();
    find_all(table, &|h| tag_is(h, "tr"), &mut rows);
    let mut lines = Vec::new();
    for row in &rows {
        row_lines(row, &mut lines);
    }
    if lines.is_empty() {
        return Err(Error::html("no ledger rows found in table"));
    }
    tracing::debug!(rows = lines.len(), "extracted ledger rows");

    let joined = lines.join("\n");
    let tabs = TABS.replace_all(&joined, "\t");
    Ok(SPACES.replace_all(&tabs, " ").into_owned())
}
