//! Arbius engine read-model core
//!
//! This crate contains the types shared by:
//! - The contract bindings (decoding engine return data)
//! - The host (readers, session, view composer)
//!
//! Records are only ever projections of on-chain or indexer state. Presence is
//! decided once, when a record is decoded, and carried as [`Lookup`].

pub mod error;
pub mod format;
pub mod lookup;
pub mod records;
pub mod types;

pub use error::CoreError;
pub use format::{cidify, format_ether, format_rate, gateway_url, render_blocktime};
pub use lookup::{Lookup, ReadState, Sentinel};
pub use records::{Contestation, ContestationVote, Model, Solution, Task};
pub use types::{Address, TaskId, B256, U256};
