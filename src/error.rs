/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! error defines sets of error definitions in entire life time of a contract call.
//!
//! Interpreter failures are reported as [InterpreterError] and mapped once, here, into
//! [ExecutionError]. Every [ExecutionError] carries a stable [ErrorCode] so that callers
//! never depend on interpreter internals.

use crate::types::{Address, CodeKind};

/// Errors raised by the state layer (adapter, cache, ledger).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    /// Account to remove does not exist.
    #[error("account {0} not found")]
    AccountNotFound(Address),

    /// A stored record could not be decoded.
    #[error("corrupted record under key {key}: {reason}")]
    CorruptedRecord { key: String, reason: String },

    /// The ledger rejected a mint, burn, or transfer.
    #[error("ledger: {0}")]
    Ledger(String),
}

/// Failures an interpreter may signal back to the coordinator.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InterpreterError {
    #[error("execution reverted")]
    Reverted(Vec<u8>),

    #[error("insufficient gas")]
    InsufficientGas,

    #[error("data sent to account {0} which has no code")]
    CodeOutOfBounds(Address),

    #[error("block {requested} is beyond current height {current}")]
    InvalidBlockNumber { requested: u64, current: u64 },

    #[error("insufficient balance in {0}")]
    InsufficientBalance(Address),

    #[error("call depth limit exceeded")]
    CallDepthExceeded,

    #[error("no interpreter for {0} code")]
    Unavailable(CodeKind),

    #[error("invalid code: {0}")]
    InvalidCode(String),

    #[error(transparent)]
    State(#[from] StateError),

    /// Any other failure inside the interpreter, e.g. a wasm trap.
    #[error("{0}")]
    Other(String),
}

/// Descriptive error definitions of a contract call or deploy.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ExecutionError {
    /// Malformed address.
    #[error("cannot resolve address: {0}")]
    AddressResolution(String),

    /// Data was sent to an account that has no code.
    #[error("data sent to account {0} which has no code")]
    CodeOutOfBounds(Address),

    /// Arithmetic overflow, e.g. while converting the host gas budget.
    #[error("integer overflow")]
    IntegerOverflow,

    /// The interpreter reverted. Carries the revert data, if any.
    #[error("execution reverted")]
    ExecutionReverted(Vec<u8>),

    /// Gas ran out during interpretation.
    #[error("insufficient gas")]
    InsufficientGas,

    /// Block hash requested for a block that is not yet produced.
    #[error("block {requested} is beyond current height {current}")]
    InvalidBlockNumber { requested: u64, current: u64 },

    #[error("account {0} not found")]
    AccountNotFound(Address),

    #[error("insufficient balance in {0}")]
    InsufficientBalance(Address),

    /// The derived contract address already holds code.
    #[error("account {0} already exists")]
    DuplicateAddress(Address),

    /// No interpreter is configured for this code flavor.
    #[error("no interpreter for {0} code")]
    InterpreterUnavailable(CodeKind),

    /// The bytecode cannot be loaded by its interpreter.
    #[error("invalid code: {0}")]
    InvalidCode(String),

    #[error(transparent)]
    State(StateError),
}

impl From<StateError> for ExecutionError {
    fn from(error: StateError) -> Self {
        match error {
            StateError::AccountNotFound(address) => ExecutionError::AccountNotFound(address),
            e => ExecutionError::State(e),
        }
    }
}

impl From<InterpreterError> for ExecutionError {
    fn from(error: InterpreterError) -> Self {
        match error {
            InterpreterError::Reverted(data) => ExecutionError::ExecutionReverted(data),
            InterpreterError::InsufficientGas => ExecutionError::InsufficientGas,
            InterpreterError::CodeOutOfBounds(address) => ExecutionError::CodeOutOfBounds(address),
            InterpreterError::InvalidBlockNumber { requested, current } => {
                ExecutionError::InvalidBlockNumber { requested, current }
            }
            InterpreterError::InsufficientBalance(address) => {
                ExecutionError::InsufficientBalance(address)
            }
            InterpreterError::CallDepthExceeded => ExecutionError::ExecutionReverted(Vec::new()),
            InterpreterError::Unavailable(kind) => ExecutionError::InterpreterUnavailable(kind),
            InterpreterError::InvalidCode(reason) => ExecutionError::InvalidCode(reason),
            InterpreterError::State(e) => e.into(),
            InterpreterError::Other(_) => ExecutionError::ExecutionReverted(Vec::new()),
        }
    }
}

impl From<ExecutionError> for InterpreterError {
    fn from(error: ExecutionError) -> Self {
        match error {
            ExecutionError::ExecutionReverted(data) => InterpreterError::Reverted(data),
            ExecutionError::InsufficientGas => InterpreterError::InsufficientGas,
            ExecutionError::CodeOutOfBounds(address) => InterpreterError::CodeOutOfBounds(address),
            ExecutionError::InvalidBlockNumber { requested, current } => {
                InterpreterError::InvalidBlockNumber { requested, current }
            }
            ExecutionError::InsufficientBalance(address) => {
                InterpreterError::InsufficientBalance(address)
            }
            ExecutionError::AccountNotFound(address) => {
                InterpreterError::State(StateError::AccountNotFound(address))
            }
            ExecutionError::InterpreterUnavailable(kind) => InterpreterError::Unavailable(kind),
            ExecutionError::InvalidCode(reason) => InterpreterError::InvalidCode(reason),
            ExecutionError::State(e) => InterpreterError::State(e),
            e => InterpreterError::Other(e.to_string()),
        }
    }
}

/// Numeric error codes exposed to callers of the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ErrorCode {
    AddressResolution = 1,
    CodeOutOfBounds = 2,
    IntegerOverflow = 3,
    ExecutionReverted = 4,
    InsufficientGas = 5,
    InvalidBlockNumber = 6,
    AccountNotFound = 7,
    InsufficientBalance = 8,
    DuplicateAddress = 9,
    InterpreterUnavailable = 10,
    InvalidCode = 11,
    StateFailure = 12,
}

impl ErrorCode {
    pub fn name(&self) -> &'static str {
        match self {
            ErrorCode::AddressResolution => "AddressResolutionError",
            ErrorCode::CodeOutOfBounds => "CodeOutOfBounds",
            ErrorCode::IntegerOverflow => "IntegerOverflow",
            ErrorCode::ExecutionReverted => "ExecutionReverted",
            ErrorCode::InsufficientGas => "InsufficientGas",
            ErrorCode::InvalidBlockNumber => "InvalidBlockNumber",
            ErrorCode::AccountNotFound => "AccountNotFound",
            ErrorCode::InsufficientBalance => "InsufficientBalance",
            ErrorCode::DuplicateAddress => "DuplicateAddress",
            ErrorCode::InterpreterUnavailable => "InterpreterUnavailable",
            ErrorCode::InvalidCode => "InvalidCode",
            ErrorCode::StateFailure => "StateFailure",
        }
    }
}

/// Externally visible form of an [ExecutionError].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodedError {
    pub code: u32,
    pub name: &'static str,
    pub message: String,
}

impl ExecutionError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ExecutionError::AddressResolution(_) => ErrorCode::AddressResolution,
            ExecutionError::CodeOutOfBounds(_) => ErrorCode::CodeOutOfBounds,
            ExecutionError::IntegerOverflow => ErrorCode::IntegerOverflow,
            ExecutionError::ExecutionReverted(_) => ErrorCode::ExecutionReverted,
            ExecutionError::InsufficientGas => ErrorCode::InsufficientGas,
            ExecutionError::InvalidBlockNumber { .. } => ErrorCode::InvalidBlockNumber,
            ExecutionError::AccountNotFound(_) => ErrorCode::AccountNotFound,
            ExecutionError::InsufficientBalance(_) => ErrorCode::InsufficientBalance,
            ExecutionError::DuplicateAddress(_) => ErrorCode::DuplicateAddress,
            ExecutionError::InterpreterUnavailable(_) => ErrorCode::InterpreterUnavailable,
            ExecutionError::InvalidCode(_) => ErrorCode::InvalidCode,
            ExecutionError::State(_) => ErrorCode::StateFailure,
        }
    }

    pub fn coded(&self) -> CodedError {
        let code = self.code();
        CodedError {
            code: code as u32,
            name: code.name(),
            message: self.to_string(),
        }
    }
}
