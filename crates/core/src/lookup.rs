//! Presence and loading states

use serde::Serialize;
use std::fmt::Display;

/// Records whose all-zero form means "does not exist yet".
///
/// The engine getters never fail for unknown keys; they return the zero
/// struct. Implementors name the one field that decides presence.
pub trait Sentinel {
    /// Returns true when this record is the zero value
    fn is_sentinel(&self) -> bool;
}

/// Result of looking a record up by key
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "lookup", content = "record", rename_all = "snake_case")]
pub enum Lookup<T> {
    /// The record exists
    Found(T),
    /// The getter returned the zero record
    Absent,
}

impl<T: Sentinel> Lookup<T> {
    /// Classify a decoded record by its sentinel field
    pub fn from_record(record: T) -> Self {
        if record.is_sentinel() {
            Self::Absent
        } else {
            Self::Found(record)
        }
    }
}

impl<T> Lookup<T> {
    /// Returns true if the record exists
    pub const fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// Borrow the record if it exists
    pub const fn found(&self) -> Option<&T> {
        match self {
            Self::Found(record) => Some(record),
            Self::Absent => None,
        }
    }
}

/// State of one independent read
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum ReadState<T> {
    /// Not issued yet, or in flight
    Pending,
    /// Transport, decoding or indexer failure
    Failed(String),
    /// Completed
    Ready(T),
}

impl<T> Default for ReadState<T> {
    fn default() -> Self {
        Self::Pending
    }
}

impl<T> ReadState<T> {
    /// Convert a finished read, keeping only the error's message
    pub fn from_result<E: Display>(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Ready(value),
            Err(e) => Self::Failed(e.to_string()),
        }
    }

    /// Returns true while the read has not completed
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Returns true if the read failed
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Borrow the completed value
    pub const fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }
}
