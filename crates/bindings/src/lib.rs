//! Engine contract bindings
//!
//! The engine interface is defined manually: selectors and event topics are
//! derived from their Solidity signatures, and return data is decoded word by
//! word into the core record types.

pub mod abi;
pub mod engine;
pub mod error;
pub mod events;
pub mod token;

pub use abi::{encode_call, encode_tuple, keccak256, selector, AbiWords, Token};
pub use engine::EngineCall;
pub use error::DecodeError;
pub use events::{EngineEvent, EngineLog, RawLog};
