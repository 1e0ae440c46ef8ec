//! Crate error types.
//!
//! Steady-state play never produces errors; these surface from setup paths
//! (tuning validation, browser bootstrap) and from factory calls handed a
//! level index outside the table.

use std::fmt;

/// Top-level error enum for Fruit Fusion.
#[derive(Debug)]
pub enum GameError {
    /// A level index outside the level table was passed to a body factory.
    UnknownLevel {
        /// Level that was requested.
        level: usize,
        /// Number of levels in the table.
        len: usize,
    },

    /// A tuning value is outside its accepted range.
    InvalidTuning {
        /// Dotted path of the field (for logging).
        field: &'static str,
        /// Human-readable description of the accepted range.
        reason: &'static str,
    },

    /// Tuning JSON could not be parsed.
    TuningParse(serde_json::Error),

    /// The browser shell could not set itself up (missing window, canvas context, ...).
    Platform(String),
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::UnknownLevel { level, len } => {
                write!(f, "level {} is outside the level table (0..{})", level, len)
            }
            GameError::InvalidTuning { field, reason } => {
                write!(f, "tuning field '{}' is invalid: {}", field, reason)
            }
            GameError::TuningParse(err) => write!(f, "tuning JSON could not be parsed: {}", err),
            GameError::Platform(msg) => write!(f, "platform error: {}", msg),
        }
    }
}

impl std::error::Error for GameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GameError::TuningParse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for GameError {
    fn from(err: serde_json::Error) -> Self {
        GameError::TuningParse(err)
    }
}

/// Convenience alias: a `Result` using `GameError` as the error type.
pub type GameResult<T> = Result<T, GameError>;
