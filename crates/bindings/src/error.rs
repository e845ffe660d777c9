use alloy_primitives::B256;
use thiserror::Error;

/// Errors decoding contract return data or logs
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// Return data ended before a required word
    #[error("return data too short: need {needed} bytes, got {actual}")]
    TooShort {
        /// Bytes required
        needed: usize,
        /// Bytes present
        actual: usize,
    },

    /// A word does not fit its declared Solidity type
    #[error("word {index} is not a valid {kind}")]
    InvalidValue {
        /// Word position
        index: usize,
        /// Expected Solidity type
        kind: &'static str,
    },

    /// A dynamic offset or length points outside the data
    #[error("dynamic data at offset {offset} is out of range")]
    OutOfRange {
        /// Offending byte offset
        offset: usize,
    },

    /// A log has fewer topics than the event declares
    #[error("log is missing topic {0}")]
    MissingTopic(usize),

    /// topic0 matches no watched event
    #[error("unexpected event topic {0}")]
    UnknownEvent(B256),
}
