/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Defines the phases a call goes through:
//!
//! Resolve Callee -> Charge Gas -> Interpret -> Settle -> Commit | Abort
//!
//! Each function here implements one phase on the call's [ChangeCache](super::cache::ChangeCache).
//! The order in which they run is decided by [execute](super::execute).

use crate::{
    error::ExecutionError,
    execution::cache::StateAccess,
    gas::{GasConverter, GasLedger, HostGasMeter},
    interpreter::transfer_value,
    types::{keccak256, Account, Address, Code, ContractMeta},
};

/// Bytes hashed with the caller's address to derive a contract address during a view deploy.
/// View calls never read or advance the caller's sequence.
pub const VIEW_SEQUENCE_PLACEHOLDER: &[u8] = b"view";

/// Resolve Callee for a deploy. Derives the contract address, refuses an address which already
/// holds code, and moves the deploy value into the new account.
pub(crate) fn resolve_deploy(
    state: &mut dyn StateAccess,
    caller: &Address,
    value: u64,
    view: bool,
) -> Result<Address, ExecutionError> {
    let sequence_bytes = if view {
        VIEW_SEQUENCE_PLACEHOLDER.to_vec()
    } else {
        state
            .sequence(caller)
            .unwrap_or_default()
            .to_be_bytes()
            .to_vec()
    };
    let address = Address::derive_contract(caller, &sequence_bytes);

    if let Some(existing) = state.get_account(&address)? {
        if existing.has_code() {
            return Err(ExecutionError::DuplicateAddress(address));
        }
    }
    transfer_value(state, caller, &address, value)?;
    Ok(address)
}

/// Resolve Callee for a call. Returns the callee's code, or `None` for a plain transfer to a
/// codeless account.
pub(crate) fn resolve_call(
    state: &mut dyn StateAccess,
    caller: &Address,
    callee: &Address,
    value: u64,
    data: &[u8],
) -> Result<Option<Code>, ExecutionError> {
    let code = state
        .get_account(callee)?
        .and_then(|account| account.code)
        .filter(|code| !code.is_empty());
    if code.is_none() && !data.is_empty() {
        return Err(ExecutionError::CodeOutOfBounds(*callee));
    }
    transfer_value(state, caller, callee, value)?;
    Ok(code)
}

/// Charge Gas. Opens the call's gas ledger from what is left of the host's budget.
pub(crate) fn charge(
    converter: &GasConverter,
    host_gas: &dyn HostGasMeter,
) -> Result<GasLedger, ExecutionError> {
    let original = converter.to_engine_gas(host_gas.limit(), host_gas.consumed())?;
    Ok(GasLedger::new(original))
}

/// Installs the code produced by a deploy together with its metadata links and abi.
pub(crate) fn install_code(
    state: &mut dyn StateAccess,
    address: &Address,
    code: Code,
    metas: &[String],
    abi: Option<Vec<u8>>,
) -> Result<(), ExecutionError> {
    let mut account = state
        .get_account(address)?
        .unwrap_or_else(|| Account::new(*address));

    let code_hash = code.hash();
    for metadata in metas {
        let metadata_hash = keccak256(metadata.as_bytes());
        state.set_metadata(metadata_hash, metadata.clone())?;
        account.contract_meta.push(ContractMeta {
            code_hash,
            metadata_hash,
        });
    }
    account.code = Some(code);
    state.update_account(account)?;

    if let Some(abi) = abi {
        state.set_abi(address, abi)?;
    }
    Ok(())
}

/// Outcome of the Settle phase, in engine and host gas units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Settlement {
    /// Engine gas consumed before refund
    pub consumed: u64,
    /// Engine gas refunded. Zero for a failed call.
    pub refund: u64,
    /// Engine gas charged: `consumed - refund`
    pub fee: u64,
    /// Host gas charged: `ceil(fee / gas rate)`
    pub host_fee: u64,
}

/// Settle. Applies the capped refund only if the call succeeded, then charges the host's gas
/// meter exactly once.
pub(crate) fn settle(
    converter: &GasConverter,
    gas: &mut GasLedger,
    host_gas: &mut dyn HostGasMeter,
    success: bool,
) -> Settlement {
    let consumed = gas.consumed();
    let fee = if success {
        gas.settle()
    } else {
        gas.settle_without_refund()
    };
    let host_fee = converter.to_host_gas(fee);
    host_gas.consume_gas(host_fee, "cvm execution");
    Settlement {
        consumed,
        refund: consumed - fee,
        fee,
        host_fee,
    }
}
