//! The conversion pipeline: sniff, normalize, lex, reconstruct, emit.

use tmledger_foundation::{Error, Result};
use tmledger_notation::{CanonicalLog, LogItem, emit_items, parse_canonical_log};
use tracing::{debug, info};

use crate::bga::lex_bga;
use crate::config::{ConvertConfig, SourceFormat};
use crate::detect::detect_format;
use crate::html::{bga_html_to_text, snellman_html_to_text};
use crate::ledger::ledger_to_log;

/// Converts a document in any supported format into a canonical log.
///
/// Canonical input is parsed strictly and laid out again, so the output is
/// normalized either way.
///
/// # Errors
///
/// Returns the first lexical, HTML or reconstruction error of the chosen
/// pipeline.
pub fn convert(text: &str, config: &ConvertConfig) -> Result<CanonicalLog> {
    let format = config.source_format.unwrap_or_else(|| detect_format(text));
    info!(%format, bytes = text.len(), "converting");
    match format {
        SourceFormat::BgaText => Ok(emit_items(&lex_bga(text)?).log),
        SourceFormat::BgaHtml => {
            let flat = bga_html_to_text(text);
            debug!(lines = flat.lines().count(), "flattened BGA page");
            Ok(emit_items(&lex_bga(&flat)?).log)
        }
        SourceFormat::LedgerText => ledger_to_log(text, config),
        SourceFormat::LedgerHtml => ledger_to_log(&snellman_html_to_text(text)?, config),
        SourceFormat::Canonical => Ok(emit_items(&parse_canonical_log(text)?).log),
    }
}

/// Converts and renders with the configured cell width.
///
/// # Errors
///
/// See [`convert`].
pub fn convert_to_string(text: &str, config: &ConvertConfig) -> Result<String> {
    let log = convert(text, config)?;
    Ok(log.render_with_width(config.cell_width))
}

/// Produces the replayable item stream for a document in any format.
///
/// BGA logs are lexed straight into items. Ledgers are converted with leech
/// sources annotated and read back through the strict canonical parser, so a
/// reaction always names the offer it answers.
///
/// # Errors
///
/// See [`convert`]. A ledger whose rendering fails to parse back is reported
/// as [`InvalidFormat`](tmledger_foundation::ErrorKind::InvalidFormat).
pub fn load_items(text: &str, config: &ConvertConfig) -> Result<Vec<LogItem>> {
    let format = config.source_format.unwrap_or_else(|| detect_format(text));
    match format {
        SourceFormat::BgaText => lex_bga(text),
        SourceFormat::BgaHtml => lex_bga(&bga_html_to_text(text)),
        SourceFormat::Canonical => parse_canonical_log(text),
        SourceFormat::LedgerText | SourceFormat::LedgerHtml => {
            let annotated = config.clone().with_annotations(true).with_format(format);
            let rendered = convert_to_string(text, &annotated)?;
            parse_canonical_log(&rendered)
                .map_err(|e| Error::invalid_format(format!("converted ledger does not parse back: {e}")))
        }
    }
}
