//! Live engine event feed
//!
//! Best effort: logs are polled with `eth_getLogs` from the head observed at
//! subscription time onwards. Nothing emitted before subscribing, or while a
//! subscription is torn down, is replayed.

use alloy_primitives::{Address, B256};
use arbius_bindings::{EngineEvent, EngineLog};
use arbius_core::TaskId;
use std::{sync::Arc, time::Duration};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::HostError;
use crate::rpc::{ChainClient, LogFilter};

/// Spawns polling subscriptions for engine task events
#[derive(Debug)]
pub struct EventSubscriber<C> {
    client: Arc<C>,
    engine: Address,
    poll_interval: Duration,
    max_backoff: Duration,
}

impl<C> Clone for EventSubscriber<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            engine: self.engine,
            poll_interval: self.poll_interval,
            max_backoff: self.max_backoff,
        }
    }
}

impl<C: ChainClient> EventSubscriber<C> {
    /// Create a subscriber polling every `poll_interval`.
    ///
    /// After a failed poll the delay doubles, up to `max_backoff`, and resets
    /// on the next successful poll.
    pub fn new(client: Arc<C>, engine: Address, poll_interval: Duration, max_backoff: Duration) -> Self {
        Self { client, engine, poll_interval, max_backoff: max_backoff.max(poll_interval) }
    }

    /// Watch `event` for `task`, calling `on_logs` with every non-empty batch.
    ///
    /// Must be called from within a tokio runtime. The feed stops when the
    /// returned [`Subscription`] is dropped.
    pub fn subscribe<F>(&self, event: EngineEvent, task: TaskId, on_logs: F) -> Subscription
    where
        F: Fn(Vec<EngineLog>) + Send + Sync + 'static,
    {
        let poller = Poller {
            client: Arc::clone(&self.client),
            engine: self.engine,
            topics: event.task_filter(task.0),
            task: task.0,
            next_block: None,
        };
        let poll_interval = self.poll_interval;
        let max_backoff = self.max_backoff;

        debug!(target: "event_subscriber", event = event.name(), %task, "Subscribing");
        let handle = tokio::spawn(async move {
            poller.run(event, poll_interval, max_backoff, on_logs).await;
        });

        Subscription { event, task, handle }
    }
}

struct Poller<C> {
    client: Arc<C>,
    engine: Address,
    topics: Vec<Option<B256>>,
    task: B256,
    /// First block not yet scanned; `None` until the head is known
    next_block: Option<u64>,
}

impl<C: ChainClient> Poller<C> {
    async fn run<F>(mut self, event: EngineEvent, poll_interval: Duration, max_backoff: Duration, on_logs: F)
    where
        F: Fn(Vec<EngineLog>),
    {
        let mut delay = poll_interval;
        loop {
            match self.poll_once().await {
                Ok(logs) => {
                    delay = poll_interval;
                    if !logs.is_empty() {
                        debug!(
                            target: "event_subscriber",
                            event = event.name(),
                            count = logs.len(),
                            "New logs"
                        );
                        on_logs(logs);
                    }
                }
                Err(e) => {
                    delay = (delay * 2).min(max_backoff);
                    warn!(
                        target: "event_subscriber",
                        event = event.name(),
                        error = %e,
                        retry_in = ?delay,
                        "Failed to poll engine logs"
                    );
                }
            }

            tokio::time::sleep(delay).await;
        }
    }

    async fn poll_once(&mut self) -> Result<Vec<EngineLog>, HostError> {
        let head = self.client.block_number().await?;

        let Some(from_block) = self.next_block else {
            // first poll only records where the live feed starts
            self.next_block = Some(head + 1);
            return Ok(Vec::new());
        };
        if head < from_block {
            return Ok(Vec::new());
        }

        let filter = LogFilter {
            address: self.engine,
            from_block,
            to_block: head,
            topics: self.topics.clone(),
        };
        let raw = self.client.logs(&filter).await?;
        self.next_block = Some(head + 1);

        Ok(raw
            .iter()
            .filter_map(|log| match EngineLog::decode(log) {
                Ok(decoded) if decoded.task == self.task => Some(decoded),
                Ok(_) => None,
                Err(e) => {
                    warn!(target: "event_subscriber", error = %e, "Skipping undecodable log");
                    None
                }
            })
            .collect())
    }
}

/// Handle to a running event feed; dropping it stops the feed
#[derive(Debug)]
pub struct Subscription {
    event: EngineEvent,
    task: TaskId,
    handle: JoinHandle<()>,
}

impl Subscription {
    /// Watched event
    pub const fn event(&self) -> EngineEvent {
        self.event
    }

    /// Watched task
    pub const fn task(&self) -> TaskId {
        self.task
    }

    /// Returns true while the polling task is alive
    pub fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Stop the feed
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
        debug!(target: "event_subscriber", event = self.event.name(), task = %self.task, "Unsubscribed");
    }
}
