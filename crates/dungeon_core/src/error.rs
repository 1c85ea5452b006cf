//! Error types for the combat engine.

use thiserror::Error;

/// Result type alias using [`BattleError`].
pub type Result<T> = std::result::Result<T, BattleError>;

/// Top-level error type for squad construction and balance data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BattleError {
    /// Fighter class tag is not one of the known classes.
    #[error("{0} is not a valid class")]
    InvalidClass(String),

    /// Grid position outside the 3x2 squad layout.
    #[error("Invalid squad position: row {row}, column {col}")]
    InvalidPosition {
        /// Requested row.
        row: usize,
        /// Requested column.
        col: usize,
    },

    /// Balance data failed to parse.
    #[error("Failed to parse data file '{path}': {message}")]
    DataParseError {
        /// Path (or label) of the data that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// Balance data parsed but holds unusable values.
    #[error("Invalid balance configuration: {0}")]
    InvalidConfig(String),
}
