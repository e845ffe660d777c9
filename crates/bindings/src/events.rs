//! Engine task events
//!
//! Both watched events index the submitting validator (topic 1) and the task
//! id (topic 2):
//! - `SolutionSubmitted(address indexed addr, bytes32 indexed task)`
//! - `ContestationSubmitted(address indexed addr, bytes32 indexed task)`

use alloy_primitives::{Address, Bytes, B256, U64};
use serde::{Deserialize, Serialize};

use crate::abi::keccak256;
use crate::error::DecodeError;

/// Events the explorer subscribes to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EngineEvent {
    /// A validator submitted a solution
    SolutionSubmitted,
    /// A validator contested a solution
    ContestationSubmitted,
}

impl EngineEvent {
    /// Every watched event
    pub const ALL: [Self; 2] = [Self::SolutionSubmitted, Self::ContestationSubmitted];

    /// Event name
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SolutionSubmitted => "SolutionSubmitted",
            Self::ContestationSubmitted => "ContestationSubmitted",
        }
    }

    /// Canonical Solidity signature
    pub const fn signature(&self) -> &'static str {
        match self {
            Self::SolutionSubmitted => "SolutionSubmitted(address,bytes32)",
            Self::ContestationSubmitted => "ContestationSubmitted(address,bytes32)",
        }
    }

    /// Topic 0
    pub fn topic(&self) -> B256 {
        B256::from(keccak256(self.signature().as_bytes()))
    }

    /// Identify an event by its topic 0
    pub fn from_topic(topic: &B256) -> Option<Self> {
        Self::ALL.into_iter().find(|event| event.topic() == *topic)
    }

    /// Topic filter matching this event for one task, any validator
    pub fn task_filter(&self, task: B256) -> Vec<Option<B256>> {
        vec![Some(self.topic()), None, Some(task)]
    }
}

/// A log entry as returned by `eth_getLogs`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLog {
    /// Emitting contract
    pub address: Address,
    /// Indexed topics
    pub topics: Vec<B256>,
    /// Non-indexed data
    #[serde(default)]
    pub data: Bytes,
    /// Absent for pending logs
    #[serde(default)]
    pub block_number: Option<U64>,
    /// Absent for pending logs
    #[serde(default)]
    pub transaction_hash: Option<B256>,
}

/// A decoded engine task event
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EngineLog {
    /// Which event fired
    pub event: EngineEvent,
    /// Submitting validator
    pub validator: Address,
    /// Task the event refers to
    pub task: B256,
    /// Block the log was included in
    pub block_number: Option<u64>,
    /// Transaction that emitted the log
    pub tx_hash: Option<B256>,
}

impl EngineLog {
    /// Decode a raw log emitted by the engine
    pub fn decode(raw: &RawLog) -> Result<Self, DecodeError> {
        let topic0 = raw.topics.first().ok_or(DecodeError::MissingTopic(0))?;
        let event = EngineEvent::from_topic(topic0).ok_or(DecodeError::UnknownEvent(*topic0))?;
        let validator_topic = raw.topics.get(1).ok_or(DecodeError::MissingTopic(1))?;
        let task = *raw.topics.get(2).ok_or(DecodeError::MissingTopic(2))?;

        if validator_topic[..12].iter().any(|&b| b != 0) {
            return Err(DecodeError::InvalidValue { index: 1, kind: "address" });
        }

        Ok(Self {
            event,
            validator: Address::from_slice(&validator_topic[12..]),
            task,
            block_number: raw.block_number.map(|n| n.to::<u64>()),
            tx_hash: raw.transaction_hash,
        })
    }
}
