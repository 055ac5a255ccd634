//! Error types for engine input contracts.
//!
//! The engine never fails mid-simulation. Every variant here is a caller
//! contract violation detected at the boundary, before any state changes.

use std::fmt;

use crate::sim::BallId;

/// Errors reported by configuration and control calls.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Row count must be in 1..=MAX_ROWS.
    InvalidRows { rows: u32 },
    /// A geometry or tuning value must be positive and finite.
    InvalidDimension { field: &'static str },
    /// Pegs on the same row would overlap.
    PegOverlap,
    /// The outermost slots fall outside the playable width.
    BoardTooNarrow,
    /// Outcome path length does not match the board's row count.
    PathLength { expected: u32, actual: usize },
    /// Outcome path string contained something other than `L`/`R`.
    InvalidPathSymbol { symbol: char },
    /// Serialized outcome path has choices set beyond its length.
    PathBits { len: u32 },
    /// A ball with this id is already on the board.
    DuplicateBall(BallId),
    /// No ball with this id exists.
    UnknownBall(BallId),
    /// The ball is not waiting in the reservoir.
    NotInReservoir(BallId),
    /// The ball already holds an outcome path.
    PathAlreadyAssigned(BallId),
    /// The bucket cannot open while a reservoir ball has no path.
    PathMissing(BallId),
    /// Configuration could not be parsed.
    Config(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::InvalidRows { rows } => {
                write!(f, "row count {} out of range (1..={})", rows, crate::consts::MAX_ROWS)
            }
            EngineError::InvalidDimension { field } => {
                write!(f, "{} must be positive and finite", field)
            }
            EngineError::PegOverlap => write!(f, "peg spacing too small, pegs in a row overlap"),
            EngineError::BoardTooNarrow => write!(f, "board too narrow for its outer slots"),
            EngineError::PathLength { expected, actual } => {
                write!(f, "outcome path has {} entries, board has {} rows", actual, expected)
            }
            EngineError::InvalidPathSymbol { symbol } => {
                write!(f, "invalid path symbol {:?} (expected L or R)", symbol)
            }
            EngineError::PathBits { len } => {
                write!(f, "outcome path of {} rows has choices set past its length", len)
            }
            EngineError::DuplicateBall(id) => write!(f, "ball {} already exists", id),
            EngineError::UnknownBall(id) => write!(f, "ball {} not found", id),
            EngineError::NotInReservoir(id) => write!(f, "ball {} is not in the reservoir", id),
            EngineError::PathAlreadyAssigned(id) => {
                write!(f, "ball {} already has an outcome path", id)
            }
            EngineError::PathMissing(id) => write!(f, "ball {} has no outcome path yet", id),
            EngineError::Config(msg) => write!(f, "invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Config(err.to_string())
    }
}
