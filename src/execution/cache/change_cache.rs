/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Defines a struct that serves as a speculative overlay on top of the [StateAdapter].
//!
//! There are two data caches per record category:
//! - `reads` (first-hand data obtained from the adapter)
//! - `writes` (the data pending to be flushed into the adapter)
//!
//! In Read Operation, `writes` is accessed first. If data is not found, search `reads`. If it fails in both sets,
//! then finally the adapter is accessed. The result will then be cached to `reads`.
//!
//! In Write Operation, only `writes` is updated.
//!
//! At the end of a call, if it succeeds, the data in `writes` is flushed by [ChangeCache::sync]. Otherwise,
//! the cache is dropped without any changes to the store.

use std::{
    cell::RefCell,
    collections::{BTreeMap, HashMap},
    hash::Hash as StdHash,
};

use super::StateAccess;
use crate::{
    error::StateError,
    state::{Backend, StateAdapter},
    types::{is_zero_value, Account, Address, ContractMeta, Hash, Word256, ZERO_WORD},
};

/// ChangeCache is the overlay through which all reads and writes of one call go.
pub struct ChangeCache<B: Backend> {
    /// Adapter serves as the data source
    adapter: StateAdapter<B>,

    accounts: CacheData<Address, Account>,
    storage: CacheData<(Address, Word256), Vec<u8>>,
    metadata: CacheData<Hash, String>,
    address_meta: CacheData<Address, Vec<ContractMeta>>,
    abi: CacheData<Address, Vec<u8>>,
}

impl<B: Backend> ChangeCache<B> {
    pub fn new(adapter: StateAdapter<B>) -> Self {
        Self {
            adapter,
            accounts: CacheData::default(),
            storage: CacheData::default(),
            metadata: CacheData::default(),
            address_meta: CacheData::default(),
            abi: CacheData::default(),
        }
    }

    pub fn adapter(&self) -> &StateAdapter<B> {
        &self.adapter
    }

    /// True if no write is pending.
    pub fn is_clean(&self) -> bool {
        self.accounts.writes.is_empty()
            && self.storage.writes.is_empty()
            && self.metadata.writes.is_empty()
            && self.address_meta.writes.is_empty()
            && self.abi.writes.is_empty()
    }

    /// Flushes every pending write into the adapter, in the order accounts, storage, abi, metadata
    /// links, metadata table. The overlay is empty afterwards.
    pub fn sync(&mut self) -> Result<(), StateError> {
        for (address, account) in std::mem::take(&mut self.accounts.writes) {
            match account {
                Some(account) => self.adapter.update_account(&account)?,
                None => {
                    if self.adapter.get_account(&address)?.is_some() {
                        self.adapter.remove_account(&address)?;
                    }
                }
            }
        }
        for ((address, key), value) in std::mem::take(&mut self.storage.writes) {
            self.adapter
                .set_storage(&address, &key, value.unwrap_or_default());
        }
        for (address, abi) in std::mem::take(&mut self.abi.writes) {
            if let Some(abi) = abi {
                self.adapter.set_abi(&address, abi);
            }
        }
        for (address, metas) in std::mem::take(&mut self.address_meta.writes) {
            self.adapter
                .set_address_meta(&address, &metas.unwrap_or_default())?;
        }
        for (hash, metadata) in std::mem::take(&mut self.metadata.writes) {
            if let Some(metadata) = metadata {
                self.adapter.set_metadata(&hash, &metadata);
            }
        }
        self.revert();
        Ok(())
    }

    /// Discards both reads and writes.
    pub fn revert(&mut self) {
        self.accounts.revert();
        self.storage.revert();
        self.metadata.revert();
        self.address_meta.revert();
        self.abi.revert();
    }
}

impl<B: Backend> StateAccess for ChangeCache<B> {
    fn get_account(&self, address: &Address) -> Result<Option<Account>, StateError> {
        let account = self
            .accounts
            .get(address, |address| self.adapter.get_account(address))?;
        match account {
            Some(mut account) => {
                account.contract_meta = self.get_address_meta(address)?;
                Ok(Some(account))
            }
            None => Ok(None),
        }
    }

    fn update_account(&mut self, account: Account) -> Result<(), StateError> {
        self.address_meta
            .set(account.address, account.contract_meta.clone());
        self.accounts.set(account.address, account);
        Ok(())
    }

    fn remove_account(&mut self, address: &Address) -> Result<(), StateError> {
        if self.get_account(address)?.is_none() {
            return Err(StateError::AccountNotFound(*address));
        }
        self.accounts.remove(*address);
        self.address_meta.remove(*address);
        self.abi.remove(*address);
        Ok(())
    }

    fn get_storage(&self, address: &Address, key: &Word256) -> Result<Vec<u8>, StateError> {
        let value = self.storage.get(&(*address, *key), |(address, key)| {
            Ok::<_, StateError>(self.adapter.get_storage_raw(address, key))
        })?;
        Ok(value.unwrap_or_else(|| ZERO_WORD.to_vec()))
    }

    fn set_storage(
        &mut self,
        address: &Address,
        key: Word256,
        value: Vec<u8>,
    ) -> Result<(), StateError> {
        if is_zero_value(&value) {
            self.storage.remove((*address, key));
        } else {
            self.storage.set((*address, key), value);
        }
        Ok(())
    }

    fn get_metadata(&self, hash: &Hash) -> Result<Option<String>, StateError> {
        self.metadata
            .get(hash, |hash| self.adapter.get_metadata(hash))
    }

    fn set_metadata(&mut self, hash: Hash, metadata: String) -> Result<(), StateError> {
        if self.get_metadata(&hash)?.is_none() {
            self.metadata.set(hash, metadata);
        }
        Ok(())
    }

    fn get_address_meta(&self, address: &Address) -> Result<Vec<ContractMeta>, StateError> {
        let metas = self
            .address_meta
            .get(address, |address| self.adapter.get_address_meta(address).map(Some))?;
        Ok(metas.unwrap_or_default())
    }

    fn set_address_meta(
        &mut self,
        address: &Address,
        metas: Vec<ContractMeta>,
    ) -> Result<(), StateError> {
        self.address_meta.set(*address, metas);
        Ok(())
    }

    fn get_abi(&self, address: &Address) -> Result<Option<Vec<u8>>, StateError> {
        self.abi
            .get(address, |address| Ok::<_, StateError>(self.adapter.get_abi(address)))
    }

    fn set_abi(&mut self, address: &Address, abi: Vec<u8>) -> Result<(), StateError> {
        self.abi.set(*address, abi);
        Ok(())
    }

    fn sequence(&self, address: &Address) -> Option<u64> {
        self.adapter.sequence(address)
    }
}

/// Read and write sets of one record category. A write of `None` is a deletion.
pub(crate) struct CacheData<K, V> {
    /// writes stores key-value pairs for Write operations. Ordered so that flushing is deterministic.
    pub writes: BTreeMap<K, Option<V>>,
    /// reads stores key-value pairs from Read operations. It is de facto the original data read from the store.
    pub reads: RefCell<HashMap<K, Option<V>>>,
}

impl<K, V> Default for CacheData<K, V> {
    fn default() -> Self {
        Self {
            writes: BTreeMap::new(),
            reads: RefCell::new(HashMap::new()),
        }
    }
}

impl<K, V> CacheData<K, V>
where
    K: Ord + Eq + StdHash + Clone,
    V: Clone,
{
    /// Get latest value from the read-write set. If not found, get from the source and then cache it.
    pub fn get<E, F>(&self, key: &K, source: F) -> Result<Option<V>, E>
    where
        F: FnOnce(&K) -> Result<Option<V>, E>,
    {
        // 1. Return the value that was written earlier in the call ('read-your-write' semantics)
        if let Some(value) = self.writes.get(key) {
            return Ok(value.clone());
        }

        // 2. Return the value that was read earlier in the call
        if let Some(value) = self.reads.borrow().get(key) {
            return Ok(value.clone());
        }

        // 3. Get the value from the source
        let value = source(key)?;

        // 4. Cache to reads
        self.reads.borrow_mut().insert(key.clone(), value.clone());
        Ok(value)
    }

    /// Insert to write set.
    pub fn set(&mut self, key: K, value: V) {
        self.writes.insert(key, Some(value));
    }

    /// Record a deletion in the write set.
    pub fn remove(&mut self, key: K) {
        self.writes.insert(key, None);
    }

    pub fn revert(&mut self) {
        self.reads.borrow_mut().clear();
        self.writes.clear();
    }
}
