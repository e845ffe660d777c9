//! Engine records and indexed votes
//!
//! Field sets mirror the engine's public getters. Nothing here is mutated by
//! the explorer; every value is a read-only projection for one page view.

use serde::{Deserialize, Deserializer, Serialize};

use crate::lookup::Sentinel;
use crate::types::{Address, B256, U256};

/// A unit of requested computation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Model the task runs against
    pub model: B256,
    /// Fee paid by the owner, in wei
    pub fee: U256,
    /// Task owner
    pub owner: Address,
    /// Submission time (unix seconds)
    pub blocktime: u64,
    /// Input format version
    pub version: u8,
    /// Multihash of the task input
    pub cid: Vec<u8>,
}

/// A validator's submitted result for a task
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solution {
    /// Submitting validator
    pub validator: Address,
    /// Submission time (unix seconds)
    pub blocktime: u64,
    /// Whether the fee has been claimed
    pub claimed: bool,
    /// Multihash of the solution output
    pub cid: Vec<u8>,
}

/// A dispute raised against a solution
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contestation {
    /// Validator that raised the contestation
    pub validator: Address,
    /// Submission time (unix seconds)
    pub blocktime: u64,
    /// Index into the voter list where finishing starts
    pub finish_start_index: u32,
    /// Amount slashed from the losing side, in wei
    pub slash_amount: U256,
}

/// A registered model descriptor
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    /// Base fee, in wei
    pub fee: U256,
    /// Fee recipient
    pub addr: Address,
    /// Reward multiplier (18-decimal fixed point)
    pub rate: U256,
    /// Multihash of the model template
    pub cid: Vec<u8>,
}

/// A contestation vote as recorded by the indexing service
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContestationVote {
    /// Indexer record id
    pub id: String,
    /// Voting validator
    pub address: String,
    /// `true` for a vote in favour of the contestation
    pub yea: bool,
    /// Vote time as reported by the indexer
    #[serde(deserialize_with = "string_or_number")]
    pub timestamp: String,
    /// Transaction that carried the vote
    #[serde(rename = "txHash")]
    pub tx_hash: String,
}

impl Sentinel for Task {
    fn is_sentinel(&self) -> bool {
        self.model == B256::ZERO
    }
}

impl Sentinel for Solution {
    fn is_sentinel(&self) -> bool {
        self.validator == Address::ZERO
    }
}

impl Sentinel for Contestation {
    fn is_sentinel(&self) -> bool {
        self.validator == Address::ZERO
    }
}

impl Sentinel for Model {
    fn is_sentinel(&self) -> bool {
        self.addr == Address::ZERO
    }
}

/// Indexers disagree on whether timestamps are strings or numbers
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(u64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
    })
}
