//! Per-page task session
//!
//! A [`TaskSession`] owns every read issued for one task identifier. Reads
//! run independently and may resolve in any order; each one lands in its own
//! section of [`SessionState`]. Switching the task bumps a generation counter
//! so that late results for the previous task are discarded instead of
//! overwriting the new view.

use alloy_primitives::{Address, B256, U256};
use arbius_bindings::{EngineEvent, EngineLog};
use arbius_core::{Contestation, ContestationVote, Lookup, Model, ReadState, Solution, Task, TaskId};
use serde::Serialize;
use std::{
    collections::HashMap,
    fmt,
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
};
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::composer::{Links, TaskView, ViewComposer};
use crate::config::Config;
use crate::error::HostError;
use crate::reader::EngineReader;
use crate::rpc::ChainClient;
use crate::subscriber::{EventSubscriber, Subscription};
use crate::templates::TemplateRegistry;
use crate::votes::VoteSource;

/// Who is looking at the page
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Viewer {
    /// Connected wallet account, if any
    pub account: Option<Address>,
}

/// Everything known about the current task, one section per read
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SessionState {
    /// Bumped on every task change
    pub generation: u64,
    /// Task being shown; `None` until the route resolves
    pub task_id: Option<TaskId>,
    /// Viewer account
    pub account: Option<Address>,
    /// `tasks(id)`
    pub task: ReadState<Lookup<Task>>,
    /// `solutions(id)`
    pub solution: ReadState<Lookup<Solution>>,
    /// `contestations(id)`
    pub contestation: ReadState<Lookup<Contestation>>,
    /// Issued once the task's model id is known
    pub model: ReadState<Lookup<Model>>,
    /// Indexed contestation votes
    pub votes: ReadState<Vec<ContestationVote>>,
    /// Only tracked when a token and an account are both known
    pub balance: Option<ReadState<U256>>,
    /// Engine events seen since the task was selected
    pub events: Vec<EngineLog>,
}

impl SessionState {
    /// Returns true once no issued read is still outstanding.
    ///
    /// A model read is never issued after a failed task read, so its pending
    /// state does not count in that case.
    pub fn is_settled(&self) -> bool {
        if self.task_id.is_none() {
            return true;
        }
        let model_settled = !self.model.is_pending() || self.task.is_failed();
        let balance_settled = self.balance.as_ref().map_or(true, |b| !b.is_pending());

        !self.task.is_pending()
            && !self.solution.is_pending()
            && !self.contestation.is_pending()
            && !self.votes.is_pending()
            && model_settled
            && balance_settled
    }
}

/// Reads and live updates for the task currently on screen
pub struct TaskSession<C, V> {
    inner: Arc<SessionInner<C, V>>,
    subscriptions: Vec<Subscription>,
}

struct SessionInner<C, V> {
    reader: EngineReader<C>,
    subscriber: EventSubscriber<C>,
    votes: Arc<V>,
    viewer: Viewer,
    token: Option<Address>,
    state: watch::Sender<SessionState>,
    in_flight: Mutex<Vec<JoinHandle<()>>>,
    /// Newest ticket issued per section; older reads of a section are superseded
    latest: Mutex<HashMap<&'static str, u64>>,
}

impl<C: ChainClient, V: VoteSource> TaskSession<C, V> {
    /// Create an idle session from configuration
    pub fn new(client: Arc<C>, votes: Arc<V>, config: &Config, viewer: Viewer) -> Self {
        let reader = EngineReader::new(Arc::clone(&client), config.engine_address);
        let subscriber = EventSubscriber::new(
            client,
            config.engine_address,
            config.poll_interval(),
            config.max_backoff(),
        );
        Self::from_parts(reader, subscriber, votes, viewer, config.token_address)
    }

    /// Create an idle session from already configured components
    pub fn from_parts(
        reader: EngineReader<C>,
        subscriber: EventSubscriber<C>,
        votes: Arc<V>,
        viewer: Viewer,
        token: Option<Address>,
    ) -> Self {
        let (state, _) = watch::channel(SessionState { account: viewer.account, ..Default::default() });
        Self {
            inner: Arc::new(SessionInner {
                reader,
                subscriber,
                votes,
                viewer,
                token,
                state,
                in_flight: Mutex::new(Vec::new()),
                latest: Mutex::new(HashMap::new()),
            }),
            subscriptions: Vec::new(),
        }
    }

    /// Switch to `task`, or to no task at all.
    ///
    /// Outstanding reads and subscriptions for the previous task are dropped.
    /// `None` issues nothing and leaves every section pending.
    pub fn set_task(&mut self, task: Option<TaskId>) {
        self.subscriptions.clear();
        let generation = self.inner.reset(task);

        let Some(task) = task else {
            debug!(target: "task_session", generation, "No task selected");
            return;
        };
        info!(target: "task_session", %task, generation, "Loading task");

        self.inner.read_task(generation, task);
        self.inner.read_solution(generation, task);
        self.inner.read_contestation(generation, task);
        self.inner.read_votes(generation, task);
        self.inner.read_balance(generation);

        self.subscriptions = EngineEvent::ALL
            .iter()
            .map(|&event| {
                let session = Arc::downgrade(&self.inner);
                self.inner.subscriber.subscribe(event, task, move |logs| {
                    SessionInner::on_events(&session, generation, task, logs);
                })
            })
            .collect();
    }

    /// Current state of every section
    pub fn snapshot(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    /// Receiver notified on every applied change
    pub fn subscribe_updates(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    /// Wait until every issued read has resolved
    pub async fn settled(&self) {
        let mut updates = self.inner.state.subscribe();
        loop {
            if updates.borrow_and_update().is_settled() {
                return;
            }
            if updates.changed().await.is_err() {
                return;
            }
        }
    }

    /// Compose the current state into a render-ready view
    pub fn view(&self, links: &Links, templates: &TemplateRegistry, now: u64) -> TaskView {
        ViewComposer::compose(&self.snapshot(), links, templates, now)
    }
}

impl<C, V> fmt::Debug for TaskSession<C, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskSession")
            .field("state", &*self.inner.state.borrow())
            .field("subscriptions", &self.subscriptions.len())
            .finish_non_exhaustive()
    }
}

impl<C, V> Drop for TaskSession<C, V> {
    fn drop(&mut self) {
        for handle in self.inner.in_flight().drain(..) {
            handle.abort();
        }
    }
}

impl<C, V> SessionInner<C, V> {
    fn in_flight(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn latest(&self) -> MutexGuard<'_, HashMap<&'static str, u64>> {
        self.latest.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Ticket for a new read of `section`
    fn issue(&self, section: &'static str) -> u64 {
        let mut latest = self.latest();
        let ticket = latest.entry(section).or_default();
        *ticket += 1;
        *ticket
    }
}

impl<C: ChainClient, V: VoteSource> SessionInner<C, V> {
    fn reset(&self, task: Option<TaskId>) -> u64 {
        for handle in self.in_flight().drain(..) {
            handle.abort();
        }

        let track_balance = task.is_some() && self.token.is_some() && self.viewer.account.is_some();
        let mut generation = 0;
        self.state.send_modify(|state| {
            generation = state.generation + 1;
            *state = SessionState {
                generation,
                task_id: task,
                account: self.viewer.account,
                balance: track_balance.then(ReadState::default),
                ..Default::default()
            };
        });
        generation
    }

    /// Run `update` only if `generation` is still current and, for a
    /// ticketed read, no newer read of the same section has been issued
    fn apply(
        &self,
        generation: u64,
        section: &'static str,
        ticket: Option<u64>,
        update: impl FnOnce(&mut SessionState),
    ) -> bool {
        self.state.send_if_modified(|state| {
            if state.generation != generation {
                debug!(
                    target: "task_session",
                    section,
                    generation,
                    current = state.generation,
                    "Discarding stale read"
                );
                return false;
            }
            if let Some(ticket) = ticket {
                let newest = self.latest().get(section).copied().unwrap_or_default();
                if ticket != newest {
                    debug!(target: "task_session", section, ticket, newest, "Discarding superseded read");
                    return false;
                }
            }
            update(state);
            true
        })
    }

    fn spawn(&self, read: impl Future<Output = ()> + Send + 'static) {
        let handle = tokio::spawn(read);
        let mut in_flight = self.in_flight();
        in_flight.retain(|h| !h.is_finished());
        in_flight.push(handle);
    }

    fn read_task(self: &Arc<Self>, generation: u64, task: TaskId) {
        let ticket = self.issue("task");
        let inner = Arc::clone(self);
        self.spawn(async move {
            let result = inner.reader.task(&task).await;
            let model = match &result {
                Ok(Lookup::Found(record)) => Some(Some(record.model)),
                Ok(Lookup::Absent) => Some(None),
                Err(_) => None,
            };

            let state = outcome("task", result);
            if !inner.apply(generation, "task", Some(ticket), |s| s.task = state) {
                return;
            }
            match model {
                Some(Some(model)) => inner.read_model(generation, model),
                Some(None) => {
                    let ticket = inner.issue("model");
                    inner.apply(generation, "model", Some(ticket), |s| {
                        s.model = ReadState::Ready(Lookup::Absent);
                    });
                }
                None => {}
            }
        });
    }

    fn read_model(self: &Arc<Self>, generation: u64, model: B256) {
        let ticket = self.issue("model");
        let inner = Arc::clone(self);
        self.spawn(async move {
            let state = outcome("model", inner.reader.model(model).await);
            inner.apply(generation, "model", Some(ticket), |s| s.model = state);
        });
    }

    fn read_solution(self: &Arc<Self>, generation: u64, task: TaskId) {
        let ticket = self.issue("solution");
        let inner = Arc::clone(self);
        self.spawn(async move {
            let state = outcome("solution", inner.reader.solution(&task).await);
            inner.apply(generation, "solution", Some(ticket), |s| s.solution = state);
        });
    }

    fn read_contestation(self: &Arc<Self>, generation: u64, task: TaskId) {
        let ticket = self.issue("contestation");
        let inner = Arc::clone(self);
        self.spawn(async move {
            let state = outcome("contestation", inner.reader.contestation(&task).await);
            inner.apply(generation, "contestation", Some(ticket), |s| s.contestation = state);
        });
    }

    fn read_votes(self: &Arc<Self>, generation: u64, task: TaskId) {
        let ticket = self.issue("votes");
        let inner = Arc::clone(self);
        self.spawn(async move {
            let state = outcome("votes", inner.votes.contestation_votes(&task).await);
            inner.apply(generation, "votes", Some(ticket), |s| s.votes = state);
        });
    }

    fn read_balance(self: &Arc<Self>, generation: u64) {
        let (Some(token), Some(account)) = (self.token, self.viewer.account) else {
            return;
        };
        let ticket = self.issue("balance");
        let inner = Arc::clone(self);
        self.spawn(async move {
            let state = outcome("balance", inner.reader.token_balance(token, account).await);
            inner.apply(generation, "balance", Some(ticket), |s| s.balance = Some(state));
        });
    }

    fn on_events(session: &Weak<Self>, generation: u64, task: TaskId, logs: Vec<EngineLog>) {
        let Some(inner) = session.upgrade() else {
            return;
        };

        let solution = logs.iter().any(|l| l.event == EngineEvent::SolutionSubmitted);
        let contestation = logs.iter().any(|l| l.event == EngineEvent::ContestationSubmitted);
        for log in &logs {
            info!(
                target: "task_session",
                event = log.event.name(),
                %task,
                validator = %log.validator,
                "Engine event"
            );
        }
        if !inner.apply(generation, "events", None, |s| s.events.extend(logs)) {
            return;
        }

        if solution {
            inner.read_solution(generation, task);
        }
        if contestation {
            inner.read_contestation(generation, task);
            inner.read_votes(generation, task);
        }
    }
}

fn outcome<T>(section: &'static str, result: Result<T, HostError>) -> ReadState<T> {
    if let Err(e) = &result {
        warn!(target: "task_session", section, error = %e, "Read failed");
    }
    ReadState::from_result(result)
}
