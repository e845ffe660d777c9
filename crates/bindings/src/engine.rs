//! Engine read getters
//!
//! The public mappings return flattened structs:
//! - `tasks(bytes32)`: `(bytes32 model, uint256 fee, address owner, uint64 blocktime, uint8 version, bytes cid)`
//! - `solutions(bytes32)`: `(address validator, uint64 blocktime, bool claimed, bytes cid)`
//! - `contestations(bytes32)`: `(address validator, uint64 blocktime, uint32 finish_start_index, uint256 slashAmount)`
//! - `models(bytes32)`: `(uint256 fee, address addr, uint256 rate, bytes cid)`

use alloy_primitives::B256;
use arbius_core::{Contestation, Lookup, Model, Solution, Task};

use crate::abi::{encode_call, encode_tuple, selector, AbiWords, Token};
use crate::error::DecodeError;

/// A read against one of the engine's record mappings
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineCall {
    /// `tasks(taskid)`
    Task(B256),
    /// `solutions(taskid)`
    Solution(B256),
    /// `contestations(taskid)`
    Contestation(B256),
    /// `models(modelid)`
    Model(B256),
}

impl EngineCall {
    /// Getter name on the engine
    pub const fn function_name(&self) -> &'static str {
        match self {
            Self::Task(_) => "tasks",
            Self::Solution(_) => "solutions",
            Self::Contestation(_) => "contestations",
            Self::Model(_) => "models",
        }
    }

    /// Canonical Solidity signature
    pub const fn signature(&self) -> &'static str {
        match self {
            Self::Task(_) => "tasks(bytes32)",
            Self::Solution(_) => "solutions(bytes32)",
            Self::Contestation(_) => "contestations(bytes32)",
            Self::Model(_) => "models(bytes32)",
        }
    }

    /// Mapping key
    pub const fn key(&self) -> B256 {
        match self {
            Self::Task(key) | Self::Solution(key) | Self::Contestation(key) | Self::Model(key) => {
                *key
            }
        }
    }

    /// `eth_call` input data
    pub fn calldata(&self) -> Vec<u8> {
        encode_call(selector(self.signature()), &[Token::b256(self.key())])
    }
}

/// Decode `tasks` return data
pub fn decode_task(data: &[u8]) -> Result<Lookup<Task>, DecodeError> {
    let words = AbiWords::new(data);
    let task = Task {
        model: words.b256(0)?,
        fee: words.uint256(1)?,
        owner: words.address(2)?,
        blocktime: words.uint64(3)?,
        version: words.uint8(4)?,
        cid: words.bytes(5)?,
    };
    Ok(Lookup::from_record(task))
}

/// Decode `solutions` return data
pub fn decode_solution(data: &[u8]) -> Result<Lookup<Solution>, DecodeError> {
    let words = AbiWords::new(data);
    let solution = Solution {
        validator: words.address(0)?,
        blocktime: words.uint64(1)?,
        claimed: words.bool(2)?,
        cid: words.bytes(3)?,
    };
    Ok(Lookup::from_record(solution))
}

/// Decode `contestations` return data
pub fn decode_contestation(data: &[u8]) -> Result<Lookup<Contestation>, DecodeError> {
    let words = AbiWords::new(data);
    let contestation = Contestation {
        validator: words.address(0)?,
        blocktime: words.uint64(1)?,
        finish_start_index: words.uint32(2)?,
        slash_amount: words.uint256(3)?,
    };
    Ok(Lookup::from_record(contestation))
}

/// Decode `models` return data
pub fn decode_model(data: &[u8]) -> Result<Lookup<Model>, DecodeError> {
    let words = AbiWords::new(data);
    let model = Model {
        fee: words.uint256(0)?,
        addr: words.address(1)?,
        rate: words.uint256(2)?,
        cid: words.bytes(3)?,
    };
    Ok(Lookup::from_record(model))
}

/// Encode a task the way `tasks` returns it
pub fn encode_task(task: &Task) -> Vec<u8> {
    encode_tuple(&[
        Token::b256(task.model),
        Token::uint(task.fee),
        Token::address(task.owner),
        Token::u64(task.blocktime),
        Token::u64(u64::from(task.version)),
        Token::Bytes(task.cid.clone()),
    ])
}

/// Encode a solution the way `solutions` returns it
pub fn encode_solution(solution: &Solution) -> Vec<u8> {
    encode_tuple(&[
        Token::address(solution.validator),
        Token::u64(solution.blocktime),
        Token::bool(solution.claimed),
        Token::Bytes(solution.cid.clone()),
    ])
}

/// Encode a contestation the way `contestations` returns it
pub fn encode_contestation(contestation: &Contestation) -> Vec<u8> {
    encode_tuple(&[
        Token::address(contestation.validator),
        Token::u64(contestation.blocktime),
        Token::u64(u64::from(contestation.finish_start_index)),
        Token::uint(contestation.slash_amount),
    ])
}

/// Encode a model the way `models` returns it
pub fn encode_model(model: &Model) -> Vec<u8> {
    encode_tuple(&[
        Token::uint(model.fee),
        Token::address(model.addr),
        Token::uint(model.rate),
        Token::Bytes(model.cid.clone()),
    ])
}
