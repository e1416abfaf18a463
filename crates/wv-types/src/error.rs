use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("missing 0x prefix: {0}")]
    MissingPrefix(String),

    #[error("content identifier must not be empty")]
    EmptyCid,

    #[error("invalid chain id: {0}")]
    InvalidChainId(String),
}
