//! ERC-20 balance read for the viewer banner

use alloy_primitives::{Address, U256};

use crate::abi::{encode_call, selector, AbiWords, Token};
use crate::error::DecodeError;

/// `balanceOf(account)` input data
pub fn balance_of_calldata(account: Address) -> Vec<u8> {
    encode_call(selector("balanceOf(address)"), &[Token::address(account)])
}

/// Decode the `uint256` returned by `balanceOf`
pub fn decode_balance(data: &[u8]) -> Result<U256, DecodeError> {
    AbiWords::new(data).uint256(0)
}
