/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Defines [StateAccess], the interface through which interpreters reach the call's state.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{
    error::StateError,
    types::{Account, Address, ContractMeta, Hash, Word256},
};

/// Read and write access to accounts, storage and metadata during one call. All writes are
/// speculative until the owner of the call syncs them.
pub trait StateAccess: Send {
    fn get_account(&self, address: &Address) -> Result<Option<Account>, StateError>;

    fn update_account(&mut self, account: Account) -> Result<(), StateError>;

    fn remove_account(&mut self, address: &Address) -> Result<(), StateError>;

    /// Value of a storage cell. An unset cell reads as 32 zero bytes.
    fn get_storage(&self, address: &Address, key: &Word256) -> Result<Vec<u8>, StateError>;

    /// Writes a storage cell. An all-zero value deletes it.
    fn set_storage(&mut self, address: &Address, key: Word256, value: Vec<u8>)
        -> Result<(), StateError>;

    fn get_metadata(&self, hash: &Hash) -> Result<Option<String>, StateError>;

    /// No-op if a record already exists under `hash`.
    fn set_metadata(&mut self, hash: Hash, metadata: String) -> Result<(), StateError>;

    fn get_address_meta(&self, address: &Address) -> Result<Vec<ContractMeta>, StateError>;

    fn set_address_meta(
        &mut self,
        address: &Address,
        metas: Vec<ContractMeta>,
    ) -> Result<(), StateError>;

    fn get_abi(&self, address: &Address) -> Result<Option<Vec<u8>>, StateError>;

    fn set_abi(&mut self, address: &Address, abi: Vec<u8>) -> Result<(), StateError>;

    /// Sequence number of an account known to the host's account directory.
    fn sequence(&self, address: &Address) -> Option<u64>;
}

/// Handle to the state of one call, shared by the coordinator and every (nested) interpreter.
pub type SharedState = Arc<Mutex<dyn StateAccess>>;

/// Locks the shared state. A poisoned lock is still usable: the overlay is discarded anyway when
/// the call fails.
pub fn lock_state(state: &SharedState) -> MutexGuard<'_, dyn StateAccess + 'static> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
