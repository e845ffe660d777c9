//! Identifier types

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::error::CoreError;

pub use alloy_primitives::{Address, B256, U256};

/// Identifier of an engine task (the `taskid` page parameter)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub B256);

impl TaskId {
    /// Wrap a raw 32-byte hash
    pub const fn new(hash: B256) -> Self {
        Self(hash)
    }

    /// The underlying hash, as passed to the engine getters
    pub const fn as_b256(&self) -> &B256 {
        &self.0
    }

    /// Resolve a route parameter into a task id.
    ///
    /// A parameter that is absent (route not resolved yet) or malformed gives
    /// `None`, which callers treat as "nothing to load" rather than an error.
    pub fn from_route(param: Option<&str>) -> Option<Self> {
        param.and_then(|p| p.parse().ok())
    }
}

impl FromStr for TaskId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if digits.len() != 64 {
            return Err(CoreError::InvalidTaskId(s.to_string()));
        }

        let bytes = hex::decode(digits).map_err(|_| CoreError::InvalidTaskId(s.to_string()))?;
        Ok(Self(B256::from_slice(&bytes)))
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl From<B256> for TaskId {
    fn from(hash: B256) -> Self {
        Self(hash)
    }
}
