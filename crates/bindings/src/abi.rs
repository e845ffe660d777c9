//! Minimal ABI word codec
//!
//! Covers the static types the engine getters return (`bytes32`, `uint*`,
//! `address`, `bool`) plus dynamic `bytes` reached through a head offset.

use alloy_primitives::{Address, B256, U256};
use tiny_keccak::{Hasher, Keccak};

use crate::error::DecodeError;

/// ABI word size in bytes
pub const WORD: usize = 32;

/// Compute keccak256 hash
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut output = [0u8; 32];
    hasher.finalize(&mut output);
    output
}

/// Function selector for a canonical signature, e.g. `tasks(bytes32)`
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// A value in a tuple being encoded
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    /// Any static 32-byte value
    Word([u8; WORD]),
    /// Dynamic `bytes`
    Bytes(Vec<u8>),
}

impl Token {
    /// `uint256`
    pub fn uint(value: U256) -> Self {
        Self::Word(value.to_be_bytes::<WORD>())
    }

    /// Any unsigned integer narrower than 64 bits, widened
    pub fn u64(value: u64) -> Self {
        Self::uint(U256::from(value))
    }

    /// `address`, left-padded
    pub fn address(address: Address) -> Self {
        let mut word = [0u8; WORD];
        word[12..].copy_from_slice(address.as_slice());
        Self::Word(word)
    }

    /// `bytes32`
    pub fn b256(value: B256) -> Self {
        Self::Word(value.0)
    }

    /// `bool`
    pub fn bool(value: bool) -> Self {
        Self::u64(u64::from(value))
    }
}

/// Encode a tuple: static words in the head, dynamic bytes in the tail
pub fn encode_tuple(tokens: &[Token]) -> Vec<u8> {
    let head_len = tokens.len() * WORD;
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for token in tokens {
        match token {
            Token::Word(word) => head.extend_from_slice(word),
            Token::Bytes(bytes) => {
                head.extend_from_slice(&len_word(head_len + tail.len()));
                tail.extend_from_slice(&len_word(bytes.len()));
                tail.extend_from_slice(bytes);
                let padding = (WORD - bytes.len() % WORD) % WORD;
                tail.resize(tail.len() + padding, 0);
            }
        }
    }

    head.extend_from_slice(&tail);
    head
}

/// Selector followed by the encoded arguments
pub fn encode_call(selector: [u8; 4], args: &[Token]) -> Vec<u8> {
    let mut calldata = Vec::with_capacity(4 + args.len() * WORD);
    calldata.extend_from_slice(&selector);
    calldata.extend_from_slice(&encode_tuple(args));
    calldata
}

fn len_word(len: usize) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[24..].copy_from_slice(&(len as u64).to_be_bytes());
    word
}

/// Positional reader over ABI-encoded return data
#[derive(Clone, Copy, Debug)]
pub struct AbiWords<'a> {
    data: &'a [u8],
}

impl<'a> AbiWords<'a> {
    /// Wrap return data
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Raw head word at `index`
    pub fn word(&self, index: usize) -> Result<&'a [u8], DecodeError> {
        self.slice(index * WORD, WORD)
    }

    fn slice(&self, start: usize, len: usize) -> Result<&'a [u8], DecodeError> {
        let end = start.checked_add(len).ok_or(DecodeError::OutOfRange { offset: start })?;
        self.data.get(start..end).ok_or(DecodeError::TooShort {
            needed: end,
            actual: self.data.len(),
        })
    }

    /// `bytes32`
    pub fn b256(&self, index: usize) -> Result<B256, DecodeError> {
        Ok(B256::from_slice(self.word(index)?))
    }

    /// `uint256`
    pub fn uint256(&self, index: usize) -> Result<U256, DecodeError> {
        Ok(U256::from_be_slice(self.word(index)?))
    }

    /// `address`; the 12 padding bytes must be zero
    pub fn address(&self, index: usize) -> Result<Address, DecodeError> {
        let word = self.word(index)?;
        if word[..12].iter().any(|&b| b != 0) {
            return Err(DecodeError::InvalidValue { index, kind: "address" });
        }
        Ok(Address::from_slice(&word[12..]))
    }

    /// `uint64`
    pub fn uint64(&self, index: usize) -> Result<u64, DecodeError> {
        self.narrow_uint(index, 8, "uint64")
    }

    /// `uint32`
    pub fn uint32(&self, index: usize) -> Result<u32, DecodeError> {
        self.narrow_uint(index, 4, "uint32").map(|v| v as u32)
    }

    /// `uint8`
    pub fn uint8(&self, index: usize) -> Result<u8, DecodeError> {
        self.narrow_uint(index, 1, "uint8").map(|v| v as u8)
    }

    /// `bool`
    pub fn bool(&self, index: usize) -> Result<bool, DecodeError> {
        match self.narrow_uint(index, 1, "bool")? {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(DecodeError::InvalidValue { index, kind: "bool" }),
        }
    }

    /// Dynamic `bytes` whose offset sits in head word `index`
    pub fn bytes(&self, index: usize) -> Result<Vec<u8>, DecodeError> {
        let offset = self.offset(index)?;
        let len_word = self.slice(offset, WORD)?;
        let len = word_to_usize(len_word).ok_or(DecodeError::OutOfRange { offset })?;
        let start = offset + WORD;
        let bytes = self
            .data
            .get(start..)
            .and_then(|rest| rest.get(..len))
            .ok_or(DecodeError::OutOfRange { offset: start })?;
        Ok(bytes.to_vec())
    }

    fn offset(&self, index: usize) -> Result<usize, DecodeError> {
        let word = self.word(index)?;
        word_to_usize(word).ok_or(DecodeError::InvalidValue { index, kind: "offset" })
    }

    /// Unsigned integer of `width` bytes; everything above must be zero
    fn narrow_uint(&self, index: usize, width: usize, kind: &'static str) -> Result<u64, DecodeError> {
        let word = self.word(index)?;
        if word[..WORD - width].iter().any(|&b| b != 0) {
            return Err(DecodeError::InvalidValue { index, kind });
        }
        let mut tail = [0u8; 8];
        tail.copy_from_slice(&word[24..]);
        Ok(u64::from_be_bytes(tail))
    }
}

fn word_to_usize(word: &[u8]) -> Option<usize> {
    if word[..24].iter().any(|&b| b != 0) {
        return None;
    }
    let mut tail = [0u8; 8];
    tail.copy_from_slice(&word[24..WORD]);
    usize::try_from(u64::from_be_bytes(tail)).ok()
}
