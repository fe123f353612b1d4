//! Error types for the trainer core.

use shakmaty::Square;
use thiserror::Error;

use crate::session::Phase;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PositionError {
    #[error("Malformed FEN: {0}")]
    Malformed(String),

    #[error("Illegal position: {0}")]
    Illegal(String),
}

/// Failure reported by one of the remote lookups.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("Position not found")]
    NotFound,

    #[error("Request error: {0}")]
    Transport(String),

    #[error("Unexpected response: {0}")]
    Malformed(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("No cloud evaluation for {fen}")]
    EvaluationNotFound { fen: String },

    #[error("Evaluation lookup failed: {0}")]
    Evaluation(LookupError),

    #[error("Statistics lookup failed: {0}")]
    Statistics(LookupError),

    #[error("Statistics returned unplayable move {san}")]
    UnplayableMove { san: String },

    #[error(transparent)]
    Position(#[from] PositionError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Not allowed while {actual:?}")]
    WrongPhase { actual: Phase },

    #[error("The opponent is already thinking")]
    OpponentPending,

    #[error("The opponent lookup failed; reset to continue")]
    Stalled,

    #[error("Opponent reply belongs to an earlier request")]
    StaleRequest,

    #[error("Select at least one speed and one rating band")]
    EmptyFilters,

    #[error("No piece on {0}")]
    EmptySquare(Square),

    #[error("Opponent move {san} is not legal here")]
    IllegalOpponentMove { san: String },

    #[error(transparent)]
    Position(#[from] PositionError),
}
