//! Error types for batch runs

use thiserror::Error;

use rf_reel_math::ReelError;

/// Batch run errors
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Engine error: {0}")]
    Engine(#[from] ReelError),

    #[error("Invalid run settings: {0}")]
    InvalidRun(String),

    #[error("Shard {shard} produced {actual} trials, expected {expected}")]
    ShardMismatch {
        shard: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Lookup table line {line}: {message}")]
    Lookup { line: usize, message: String },

    #[error("Thread pool error: {0}")]
    ThreadPool(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for batch runs
pub type SimResult<T> = Result<T, SimError>;
