//! Error types for the tmledger system.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.
//! Errors fall into three classes: lexical/structural problems found while
//! reading a ledger, reconstruction failures while rebinding reactions, and
//! replay failures raised by the game state.

use std::fmt;

use thiserror::Error;

use crate::resource::Resource;

/// The main error type for tmledger operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Adds a context frame, creating the context if needed.
    #[must_use]
    pub fn in_frame(mut self, frame: impl Into<String>) -> Self {
        let context = self.context.take().unwrap_or_default();
        self.context = Some(context.with_frame(frame));
        self
    }

    /// Creates an unknown token error.
    #[must_use]
    pub fn unknown_token(token: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownToken {
            token: token.into(),
            reason: reason.into(),
        })
    }

    /// Creates a malformed coordinate error.
    #[must_use]
    pub fn malformed_coordinate(coord: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedCoordinate(coord.into()))
    }

    /// Creates an unknown faction error.
    #[must_use]
    pub fn unknown_faction(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownFaction(name.into()))
    }

    /// Creates an invalid format error.
    #[must_use]
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidFormat(message.into()))
    }

    /// Creates an HTML extraction error.
    #[must_use]
    pub fn html(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Html(message.into()))
    }

    /// Creates an error for a reaction row that names no source.
    #[must_use]
    pub fn missing_leech_source(row: impl Into<String>) -> Self {
        Self::new(ErrorKind::MissingLeechSource(row.into()))
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config(message.into()))
    }

    /// Creates an I/O error.
    #[must_use]
    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io(message.into()))
    }

    /// Creates an error for a reaction or selection with nothing pending.
    #[must_use]
    pub fn no_pending(player: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::NoPendingOffer {
            player: player.into(),
            detail: detail.into(),
        })
    }

    /// Creates a not-supported error.
    #[must_use]
    pub fn not_supported(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotSupported(message.into()))
    }

    /// Creates an unresolved reaction error.
    #[must_use]
    pub fn unresolved(
        reactor: impl Into<String>,
        source: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self::new(ErrorKind::UnresolvedReaction {
            reactor: reactor.into(),
            trigger_faction: source.into(),
            detail: detail.into(),
        })
    }

    /// Creates an iteration limit error for a reconstruction pass.
    #[must_use]
    pub fn iteration_limit(pass: &'static str, limit: usize) -> Self {
        Self::new(ErrorKind::IterationLimit { pass, limit })
    }

    /// Creates an insufficient resources error.
    #[must_use]
    pub fn insufficient(resource: Resource, need: i32, have: i32) -> Self {
        Self::new(ErrorKind::InsufficientResources {
            resource,
            need,
            have,
        })
    }

    /// Creates an illegal action error.
    #[must_use]
    pub fn illegal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::IllegalAction(message.into()))
    }

    /// Creates an unknown player error.
    #[must_use]
    pub fn unknown_player(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownPlayer(name.into()))
    }

    /// Returns true if this is an affordability failure that a burn or
    /// conversion could fix.
    #[must_use]
    pub const fn is_affordability(&self) -> bool {
        matches!(self.kind, ErrorKind::InsufficientResources { .. })
    }

    /// Returns the shortfall resource and amount if this is an affordability
    /// failure.
    #[must_use]
    pub fn shortfall(&self) -> Option<(Resource, i32)> {
        match self.kind {
            ErrorKind::InsufficientResources {
                resource,
                need,
                have,
            } => Some((resource, need - have)),
            _ => None,
        }
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// A token could not be recognized.
    #[error("unknown token '{token}': {reason}")]
    UnknownToken {
        /// The offending token.
        token: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A board coordinate could not be parsed or does not exist.
    #[error("malformed coordinate: {0}")]
    MalformedCoordinate(String),

    /// A faction name was not recognized.
    #[error("unknown faction: {0}")]
    UnknownFaction(String),

    /// The input document does not have the expected shape.
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// HTML extraction failed.
    #[error("html extraction failed: {0}")]
    Html(String),

    /// A leech/decline row did not name its source faction.
    #[error("reaction without source: {0}")]
    MissingLeechSource(String),

    /// No trigger could be bound to a reaction.
    #[error("unresolved reaction by {reactor} from {trigger_faction}: {detail}")]
    UnresolvedReaction {
        /// The reacting faction.
        reactor: String,
        /// The faction whose action should have triggered the reaction.
        trigger_faction: String,
        /// Description of what failed.
        detail: String,
    },

    /// A reconstruction pass did not reach a fixed point in time.
    #[error("reconstruction pass '{pass}' exceeded {limit} iterations")]
    IterationLimit {
        /// Name of the pass.
        pass: &'static str,
        /// The iteration bound that was hit.
        limit: usize,
    },

    /// The actor is not seated in the game.
    #[error("unknown player: {0}")]
    UnknownPlayer(String),

    /// The actor cannot pay for an action.
    #[error("insufficient resources: need {need} {resource}, have {have}")]
    InsufficientResources {
        /// Which resource is short.
        resource: Resource,
        /// Amount required.
        need: i32,
        /// Amount available.
        have: i32,
    },

    /// The action is not legal in the current state.
    #[error("illegal action: {0}")]
    IllegalAction(String),

    /// A reaction or selection has nothing pending to consume.
    #[error("no pending offer for {player}: {detail}")]
    NoPendingOffer {
        /// The acting player.
        player: String,
        /// What was expected.
        detail: String,
    },

    /// A power action space is already occupied this round.
    #[error("power action {0} already taken this round")]
    PowerActionTaken(String),

    /// The action is recognized but cannot be replayed.
    #[error("not supported: {0}")]
    NotSupported(String),

    /// File system failure.
    #[error("io error: {0}")]
    Io(String),

    /// Invalid configuration or command line.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The token or file the error refers to.
    pub source: Option<String>,
    /// The player or faction column involved.
    pub player: Option<String>,
    /// Line number in the input (1-indexed).
    pub line: Option<usize>,
    /// Column number in the input (1-indexed).
    pub column: Option<usize>,
    /// Outer frames, innermost first.
    pub stack: Vec<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the source token or file.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Sets the player.
    #[must_use]
    pub fn with_player(mut self, player: impl Into<String>) -> Self {
        self.player = Some(player.into());
        self
    }

    /// Sets the line and column.
    #[must_use]
    pub fn with_position(mut self, line: usize, column: usize) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    /// Adds a stack frame.
    #[must_use]
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.stack.push(frame.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(source) = &self.source {
            write!(f, "at '{source}'")?;
        }
        if let (Some(line), Some(col)) = (self.line, self.column) {
            write!(f, " (line {line}, column {col})")?;
        }
        if let Some(player) = &self.player {
            write!(f, " for {player}")?;
        }
        if !self.stack.is_empty() {
            writeln!(f)?;
            for frame in &self.stack {
                writeln!(f, "  in {frame}")?;
            }
        }
        Ok(())
    }
}

/// Result type alias using the tmledger error.
pub type Result<T> = std::result::Result<T, Error>;
