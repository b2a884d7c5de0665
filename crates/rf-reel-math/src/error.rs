//! Error types for the reel math engine

use thiserror::Error;

/// Engine error type
///
/// Every variant is a configuration or consistency defect. Criteria rejection
/// inside the trial controller is ordinary control flow and never surfaces here.
#[derive(Error, Debug)]
pub enum ReelError {
    #[error("Symbol '{0}' is not registered")]
    UnknownSymbol(String),

    #[error("Reel strip '{0}' is not defined")]
    UnknownReelStrip(String),

    #[error("Bet mode '{0}' is not defined")]
    UnknownBetMode(String),

    #[error("Criteria '{criteria}' is not defined for bet mode '{mode}'")]
    UnknownCriteria { mode: String, criteria: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid weight table: {0}")]
    InvalidWeights(String),

    #[error("Distribution condition missing: {0}")]
    MissingCondition(String),

    #[error("Attribute '{attribute}' is not declared by the roles of symbol '{symbol}'")]
    UndeclaredAttribute { symbol: String, attribute: String },

    #[error("Reel {reel} length after tumble must match board size: expected {expected}, got {actual}")]
    BoardShape {
        reel: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Anticipation must be non-decreasing across reels: {0:?}")]
    Anticipation(Vec<u32>),

    #[error("Base + feature payout mismatch: base {base}, feature {feature}, final {total}")]
    PayoutMismatch { base: f64, feature: f64, total: f64 },

    #[error("Reel CSV error at line {line}: {message}")]
    Csv { line: usize, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for engine operations
pub type ReelResult<T> = Result<T, ReelError>;
