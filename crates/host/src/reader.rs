//! Engine record reads

use alloy_primitives::{Address, B256, U256};
use arbius_bindings::{
    engine::{decode_contestation, decode_model, decode_solution, decode_task},
    token::{balance_of_calldata, decode_balance},
    DecodeError, EngineCall,
};
use arbius_core::{Contestation, Lookup, Model, Solution, Task, TaskId};
use std::sync::Arc;
use tracing::debug;

use crate::error::HostError;
use crate::rpc::ChainClient;

/// Reads task, solution, contestation and model records from the engine.
///
/// No retries: a failed call is reported once and left to the caller.
#[derive(Debug)]
pub struct EngineReader<C> {
    client: Arc<C>,
    engine: Address,
}

impl<C> Clone for EngineReader<C> {
    fn clone(&self) -> Self {
        Self { client: Arc::clone(&self.client), engine: self.engine }
    }
}

impl<C: ChainClient> EngineReader<C> {
    /// Create a reader for the engine at `engine`
    pub const fn new(client: Arc<C>, engine: Address) -> Self {
        Self { client, engine }
    }

    /// Engine contract address
    pub const fn engine(&self) -> Address {
        self.engine
    }

    /// Shared chain client
    pub const fn client(&self) -> &Arc<C> {
        &self.client
    }

    async fn read<T>(
        &self,
        call: EngineCall,
        decode: fn(&[u8]) -> Result<Lookup<T>, DecodeError>,
    ) -> Result<Lookup<T>, HostError> {
        debug!(
            target: "engine_reader",
            function = call.function_name(),
            key = %call.key(),
            "Issuing engine read"
        );

        let data = self.client.call(self.engine, call.calldata()).await?;
        let record = decode(&data)?;

        debug!(
            target: "engine_reader",
            function = call.function_name(),
            found = record.is_found(),
            "Engine read resolved"
        );
        Ok(record)
    }

    /// `tasks(taskid)`
    pub async fn task(&self, task: &TaskId) -> Result<Lookup<Task>, HostError> {
        self.read(EngineCall::Task(task.0), decode_task).await
    }

    /// `solutions(taskid)`
    pub async fn solution(&self, task: &TaskId) -> Result<Lookup<Solution>, HostError> {
        self.read(EngineCall::Solution(task.0), decode_solution).await
    }

    /// `contestations(taskid)`
    pub async fn contestation(&self, task: &TaskId) -> Result<Lookup<Contestation>, HostError> {
        self.read(EngineCall::Contestation(task.0), decode_contestation).await
    }

    /// `models(modelid)`, keyed by `Task::model`
    pub async fn model(&self, model: B256) -> Result<Lookup<Model>, HostError> {
        self.read(EngineCall::Model(model), decode_model).await
    }

    /// ERC-20 `balanceOf(account)` on `token`
    pub async fn token_balance(&self, token: Address, account: Address) -> Result<U256, HostError> {
        let data = self.client.call(token, balance_of_calldata(account)).await?;
        Ok(decode_balance(&data)?)
    }
}
