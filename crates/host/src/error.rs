use arbius_bindings::DecodeError;
use thiserror::Error;

/// Errors from chain reads, indexer queries and configuration
#[derive(Debug, Error)]
pub enum HostError {
    /// HTTP request failed or returned a non-success status
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The node answered with a JSON-RPC error object
    #[error("rpc error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code
        code: i64,
        /// Node-supplied message
        message: String,
    },

    /// Response had neither `result` nor `error`
    #[error("no result in response to {0}")]
    MissingResult(String),

    /// Response was well-formed JSON of the wrong shape
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Hex payload did not decode
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    /// JSON body or config file did not parse
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Contract return data or log did not decode
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// The indexing service returned a GraphQL `errors` array
    #[error("indexer error: {0}")]
    GraphQl(String),

    /// Configuration rejected by validation
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Reading a config file failed
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
