//! Configuration for log conversion.

use std::fmt;
use std::str::FromStr;

use tmledger_foundation::{Error, Result};
use tmledger_notation::CELL_WIDTH;

/// The shape of an input document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SourceFormat {
    /// BGA narrative log as plain text.
    BgaText,
    /// BGA game log page.
    BgaHtml,
    /// Snellman tab-delimited ledger.
    LedgerText,
    /// Snellman ledger page with `table#ledger`.
    LedgerHtml,
    /// Already canonical notation.
    Canonical,
}

impl SourceFormat {
    /// Every format, in the order the sniffer tries them.
    pub const ALL: [Self; 5] = [
        Self::LedgerHtml,
        Self::BgaHtml,
        Self::Canonical,
        Self::LedgerText,
        Self::BgaText,
    ];

    /// Returns the command-line name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::BgaText => "bga",
            Self::BgaHtml => "bga-html",
            Self::LedgerText => "snellman",
            Self::LedgerHtml => "snellman-html",
            Self::Canonical => "canonical",
        }
    }

    /// Returns true for the HTML variants.
    #[must_use]
    pub const fn is_html(self) -> bool {
        matches!(self, Self::BgaHtml | Self::LedgerHtml)
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SourceFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|format| format.name() == lower)
            .or(match lower.as_str() {
                "ledger" => Some(Self::LedgerText),
                "ledger-html" => Some(Self::LedgerHtml),
                "concise" => Some(Self::Canonical),
                _ => None,
            })
            .ok_or_else(|| Error::config(format!("unknown format '{s}'")))
    }
}

/// Configuration for [`convert`](crate::convert).
#[derive(Clone, Debug)]
pub struct ConvertConfig {
    /// Emit `L-<Source>` / `DL-<Source>` instead of bare `L` / `DL`.
    pub annotate_leech_sources: bool,

    /// Width every grid cell is padded to.
    pub cell_width: usize,

    /// Run the reconstruction passes over ledger rounds.
    pub reconstruct: bool,

    /// Skip sniffing and treat the input as this format.
    pub source_format: Option<SourceFormat>,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            annotate_leech_sources: false,
            cell_width: CELL_WIDTH,
            reconstruct: true,
            source_format: None,
        }
    }
}

impl ConvertConfig {
    /// Output meant for replay: reaction cells name their source.
    #[must_use]
    pub fn annotated() -> Self {
        Self {
            annotate_leech_sources: true,
            ..Self::default()
        }
    }

    /// The grid exactly as placement left it, without reconstruction.
    #[must_use]
    pub fn raw() -> Self {
        Self {
            reconstruct: false,
            ..Self::default()
        }
    }

    /// Builder method to set leech source annotation.
    #[must_use]
    pub fn with_annotations(mut self, annotate: bool) -> Self {
        self.annotate_leech_sources = annotate;
        self
    }

    /// Builder method to set the cell width.
    #[must_use]
    pub fn with_cell_width(mut self, width: usize) -> Self {
        self.cell_width = width;
        self
    }

    /// Builder method to enable or disable reconstruction.
    #[must_use]
    pub fn with_reconstruct(mut self, reconstruct: bool) -> Self {
        self.reconstruct = reconstruct;
        self
    }

    /// Builder method to force a source format.
    #[must_use]
    pub fn with_format(mut self, format: SourceFormat) -> Self {
        self.source_format = Some(format);
        self
    }
}
