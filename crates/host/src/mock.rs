//! In-memory chain and indexer doubles for unit tests

use alloy_primitives::{Address, B256, U256};
use arbius_bindings::{EngineCall, RawLog};
use arbius_core::{Contestation, ContestationVote, Model, Solution, Task, TaskId};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicU64, AtomicUsize, Ordering},
    Arc, Mutex,
};
use tokio::sync::Semaphore;

use crate::error::HostError;
use crate::rpc::{ChainClient, LogFilter};
use crate::votes::VoteSource;

pub(crate) const ENGINE: Address = Address::new([0xe0; 20]);

pub(crate) fn sample_task() -> Task {
    Task {
        model: B256::repeat_byte(0x42),
        fee: U256::from(1_000_000_000_000_000_000u64),
        owner: Address::repeat_byte(0x11),
        blocktime: 1_700_000_000,
        version: 0,
        cid: hex::decode("1220b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9")
            .unwrap(),
    }
}

pub(crate) fn sample_solution() -> Solution {
    Solution {
        validator: Address::repeat_byte(0x22),
        blocktime: 1_700_000_060,
        claimed: false,
        cid: vec![0x12, 0x20, 0x05],
    }
}

pub(crate) fn sample_contestation() -> Contestation {
    Contestation {
        validator: Address::repeat_byte(0x33),
        blocktime: 1_700_000_120,
        finish_start_index: 2,
        slash_amount: U256::from(500_000_000_000_000_000u64),
    }
}

pub(crate) fn sample_model() -> Model {
    Model {
        fee: U256::ZERO,
        addr: Address::repeat_byte(0x44),
        rate: U256::from(1_000_000_000_000_000_000u64),
        cid: vec![0x12, 0x20, 0x09],
    }
}

pub(crate) fn vote(id: &str, yea: bool) -> ContestationVote {
    ContestationVote {
        id: id.to_string(),
        address: format!("0x{}", id.repeat(20).chars().take(40).collect::<String>()),
        yea,
        timestamp: "1700000200".to_string(),
        tx_hash: format!("0x{}", "ab".repeat(32)),
    }
}

/// Chain double keyed by calldata
#[derive(Debug, Default)]
pub(crate) struct MockChain {
    replies: Mutex<HashMap<Vec<u8>, Result<Vec<u8>, String>>>,
    gates: Mutex<HashMap<Vec<u8>, Arc<Semaphore>>>,
    calls: Mutex<Vec<Vec<u8>>>,
    head: AtomicU64,
    logs: Mutex<Vec<RawLog>>,
    failing_polls: AtomicU64,
    filters: Mutex<Vec<LogFilter>>,
}

impl MockChain {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reply(&self, call: EngineCall, reply: Result<Vec<u8>, String>) {
        self.reply_raw(call.calldata(), reply);
    }

    pub(crate) fn reply_raw(&self, calldata: Vec<u8>, reply: Result<Vec<u8>, String>) {
        self.replies.lock().unwrap().insert(calldata, reply);
    }

    /// Hold calls for `call` until permits are added to the returned gate
    pub(crate) fn gate(&self, call: EngineCall) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.gates.lock().unwrap().insert(call.calldata(), Arc::clone(&gate));
        gate
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub(crate) fn calls_to(&self, call: EngineCall) -> usize {
        let calldata = call.calldata();
        self.calls.lock().unwrap().iter().filter(|c| **c == calldata).count()
    }

    pub(crate) fn set_head(&self, block: u64) {
        self.head.store(block, Ordering::SeqCst);
    }

    pub(crate) fn push_log(&self, log: RawLog) {
        self.logs.lock().unwrap().push(log);
    }

    pub(crate) fn fail_next_polls(&self, count: u64) {
        self.failing_polls.store(count, Ordering::SeqCst);
    }

    pub(crate) fn filters(&self) -> Vec<LogFilter> {
        self.filters.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn call(&self, _to: Address, data: Vec<u8>) -> Result<Vec<u8>, HostError> {
        self.calls.lock().unwrap().push(data.clone());

        let gate = self.gates.lock().unwrap().get(&data).cloned();
        if let Some(gate) = gate {
            let _permit = gate.acquire().await;
        }

        match self.replies.lock().unwrap().get(&data).cloned() {
            Some(Ok(bytes)) => Ok(bytes),
            Some(Err(message)) => Err(HostError::InvalidResponse(message)),
            None => Err(HostError::MissingResult("eth_call".to_string())),
        }
    }

    async fn block_number(&self) -> Result<u64, HostError> {
        let failing = self.failing_polls.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_polls.store(failing - 1, Ordering::SeqCst);
            return Err(HostError::InvalidResponse("node unavailable".to_string()));
        }
        Ok(self.head.load(Ordering::SeqCst))
    }

    async fn logs(&self, filter: &LogFilter) -> Result<Vec<RawLog>, HostError> {
        self.filters.lock().unwrap().push(filter.clone());

        let logs = self.logs.lock().unwrap();
        Ok(logs
            .iter()
            .filter(|log| {
                let block = log.block_number.map(|n| n.to::<u64>()).unwrap_or_default();
                block >= filter.from_block && block <= filter.to_block
            })
            .filter(|log| {
                filter.topics.iter().enumerate().all(|(i, wanted)| match wanted {
                    Some(topic) => log.topics.get(i) == Some(topic),
                    None => true,
                })
            })
            .cloned()
            .collect())
    }
}

/// Indexer double keyed by task id; unknown tasks have no votes
#[derive(Debug, Default)]
pub(crate) struct MockVotes {
    replies: Mutex<HashMap<TaskId, Result<Vec<ContestationVote>, String>>>,
    calls: AtomicUsize,
}

impl MockVotes {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reply(&self, task: TaskId, reply: Result<Vec<ContestationVote>, String>) {
        self.replies.lock().unwrap().insert(task, reply);
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VoteSource for MockVotes {
    async fn contestation_votes(&self, task: &TaskId) -> Result<Vec<ContestationVote>, HostError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.replies.lock().unwrap().get(task).cloned() {
            Some(Ok(votes)) => Ok(votes),
            Some(Err(message)) => Err(HostError::GraphQl(message)),
            None => Ok(Vec::new()),
        }
    }
}
