use thiserror::Error;

/// Errors raised while parsing explorer inputs
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoreError {
    /// Task identifiers are 32 bytes of hex, optionally `0x`-prefixed
    #[error("invalid task id: {0:?}")]
    InvalidTaskId(String),
}
