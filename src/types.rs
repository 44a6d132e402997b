/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Defines common data structures to be used inside this library, or from outside application.

use std::fmt;
use std::str::FromStr;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tiny_keccak::{Hasher, Keccak};

use crate::error::ExecutionError;

/// Length in bytes of an account address.
pub const ADDRESS_LENGTH: usize = 20;

/// 32-byte word used as storage key and as content hash.
pub type Word256 = [u8; 32];

/// Content hash of code or metadata.
pub type Hash = [u8; 32];

/// The all-zero word. Reading an unset storage cell yields this value.
pub const ZERO_WORD: Word256 = [0u8; 32];

/// Address of an account, either externally owned or a contract.
#[derive(
    Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, BorshSerialize, BorshDeserialize,
)]
pub struct Address(pub [u8; ADDRESS_LENGTH]);

impl Address {
    /// Parses an address from raw bytes. Fails with `AddressResolution` if the length is wrong.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ExecutionError> {
        let inner: [u8; ADDRESS_LENGTH] = bytes.try_into().map_err(|_| {
            ExecutionError::AddressResolution(format!(
                "expected {} bytes, got {}",
                ADDRESS_LENGTH,
                bytes.len()
            ))
        })?;
        Ok(Self(inner))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    /// Derives the address of a contract created by `creator`. The address is the last 20 bytes of
    /// `keccak256(creator || sequence_bytes)`. Nothing guards against deriving the same address twice
    /// when `sequence_bytes` does not change between two deploys.
    pub fn derive_contract(creator: &Address, sequence_bytes: &[u8]) -> Address {
        let mut hasher = Keccak::v256();
        hasher.update(creator.as_bytes());
        hasher.update(sequence_bytes);
        let mut digest = [0u8; 32];
        hasher.finalize(&mut digest);

        let mut address = [0u8; ADDRESS_LENGTH];
        address.copy_from_slice(&digest[32 - ADDRESS_LENGTH..]);
        Address(address)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", hex::encode(self.0))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = ExecutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s.trim_start_matches("0x"))
            .map_err(|e| ExecutionError::AddressResolution(e.to_string()))?;
        Address::from_slice(&bytes)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <String as Deserialize>::deserialize(deserializer)?;
        Address::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// keccak256 digest, used for code hashes and metadata content hashes.
pub fn keccak256(bytes: &[u8]) -> Hash {
    let mut hasher = Keccak::v256();
    hasher.update(bytes);
    let mut digest = [0u8; 32];
    hasher.finalize(&mut digest);
    digest
}

/// Returns true if every byte of the value is zero. Such a storage value is treated as absent.
pub fn is_zero_value(value: &[u8]) -> bool {
    value.iter().all(|b| *b == 0)
}

/// Flavor of a contract's bytecode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeKind {
    Evm,
    Wasm,
}

impl fmt::Display for CodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodeKind::Evm => f.write_str("EVM"),
            CodeKind::Wasm => f.write_str("WASM"),
        }
    }
}

/// Contract code tagged by flavor. An account holds at most one of them.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum Code {
    Evm(Vec<u8>),
    Wasm(Vec<u8>),
}

impl Code {
    pub fn new(kind: CodeKind, bytes: Vec<u8>) -> Self {
        match kind {
            CodeKind::Evm => Code::Evm(bytes),
            CodeKind::Wasm => Code::Wasm(bytes),
        }
    }

    pub fn kind(&self) -> CodeKind {
        match self {
            Code::Evm(_) => CodeKind::Evm,
            Code::Wasm(_) => CodeKind::Wasm,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        match self {
            Code::Evm(bytes) | Code::Wasm(bytes) => bytes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes().is_empty()
    }

    pub fn hash(&self) -> Hash {
        keccak256(self.bytes())
    }
}

/// Link between a piece of deployed code and the metadata describing it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct ContractMeta {
    pub code_hash: Hash,
    pub metadata_hash: Hash,
}

/// Address-keyed record of balance, code, and metadata links.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Account {
    pub address: Address,
    /// Balance mirrored from the ledger. Writing a different value reconciles the ledger on sync.
    pub balance: u64,
    pub code: Option<Code>,
    pub contract_meta: Vec<ContractMeta>,
}

impl Account {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            ..Default::default()
        }
    }

    pub fn has_code(&self) -> bool {
        self.code.as_ref().map_or(false, |c| !c.is_empty())
    }

    pub fn add_balance(&mut self, amount: u64) -> Result<(), ExecutionError> {
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or(ExecutionError::IntegerOverflow)?;
        Ok(())
    }

    pub fn subtract_balance(&mut self, amount: u64) -> Result<(), ExecutionError> {
        self.balance = self
            .balance
            .checked_sub(amount)
            .ok_or(ExecutionError::InsufficientBalance(self.address))?;
        Ok(())
    }
}

/// Header fields of the block in which calls are executed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockHeader {
    /// Height of the current block
    pub height: u64,
    /// Unix timestamp of the current block, in seconds
    pub time: u64,
    /// Hash of the preceding block. Absent at genesis.
    pub last_block_hash: Option<Hash>,
}

/// Whether the interpreter is running init code or calling deployed code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallKind {
    Create,
    Call,
}

/// Parameters of one (possibly nested) invocation handed to an interpreter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallParams {
    pub kind: CallKind,
    /// Account that triggered this invocation
    pub caller: Address,
    /// Account whose code is running
    pub callee: Address,
    /// Amount transferred from caller to callee before execution
    pub value: u64,
    /// Call data, or init code arguments for a create
    pub input: Vec<u8>,
    /// 0 for the top-level call, increased by one per nested call
    pub depth: u32,
    /// True if this invocation belongs to a view call
    pub is_view: bool,
}

/// Log record emitted by a contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEvent {
    pub address: Address,
    pub topics: Vec<Word256>,
    pub data: Vec<u8>,
}

/// Trace of a nested contract-to-contract call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallEvent {
    pub caller: Address,
    pub callee: Address,
    pub value: u64,
    pub input: Vec<u8>,
    pub depth: u32,
    pub return_value: Vec<u8>,
}

/// The two event shapes accepted by an event sink.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    Call(CallEvent),
    Log(LogEvent),
}
