/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! In-memory [Backend](super::Backend) for tooling and tests. Clones share one world.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::backend::{AccountDirectory, BaseAccount, KvStore, Ledger};
use crate::{error::StateError, types::Address};

#[derive(Default)]
struct World {
    kv: BTreeMap<Vec<u8>, Vec<u8>>,
    balances: HashMap<Address, u64>,
    pools: HashMap<String, u64>,
    accounts: HashMap<Address, BaseAccount>,
    supply: u64,
}

#[derive(Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<RwLock<World>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, World> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, World> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Issues `amount` new coins to `address`, registering the account if it is unknown.
    pub fn fund(&self, address: &Address, amount: u64) {
        let mut world = self.write();
        world.accounts.entry(*address).or_insert(BaseAccount {
            address: *address,
            sequence: 0,
        });
        *world.balances.entry(*address).or_default() += amount;
        world.supply += amount;
    }

    /// Advances the sequence number of a known account, as the host does after each transaction.
    pub fn increment_sequence(&self, address: &Address) {
        if let Some(account) = self.write().accounts.get_mut(address) {
            account.sequence += 1;
        }
    }

    pub fn total_supply(&self) -> u64 {
        self.read().supply
    }

    pub fn pool_balance(&self, module: &str) -> u64 {
        self.read().pools.get(module).copied().unwrap_or_default()
    }

    /// Copy of every key-value entry, for comparing the store before and after a call.
    pub fn dump(&self) -> BTreeMap<Vec<u8>, Vec<u8>> {
        self.read().kv.clone()
    }
}

impl KvStore for MemoryBackend {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.read().kv.get(key).cloned()
    }

    fn set(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.write().kv.insert(key, value);
    }

    fn delete(&mut self, key: &[u8]) {
        self.write().kv.remove(key);
    }

    fn prefix_entries(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.read()
            .kv
            .range(prefix.to_vec()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

impl Ledger for MemoryBackend {
    fn get_balance(&self, address: &Address) -> u64 {
        self.read().balances.get(address).copied().unwrap_or_default()
    }

    fn mint_coins(&mut self, module: &str, amount: u64) -> Result<(), StateError> {
        let mut world = self.write();
        world.supply = world
            .supply
            .checked_add(amount)
            .ok_or_else(|| StateError::Ledger("supply overflow".to_string()))?;
        *world.pools.entry(module.to_string()).or_default() += amount;
        Ok(())
    }

    fn burn_coins(&mut self, module: &str, amount: u64) -> Result<(), StateError> {
        let mut world = self.write();
        let pool = world.pools.entry(module.to_string()).or_default();
        *pool = pool
            .checked_sub(amount)
            .ok_or_else(|| StateError::Ledger(format!("pool {} cannot burn {}", module, amount)))?;
        world.supply -= amount;
        Ok(())
    }

    fn send_coins_from_account_to_module(
        &mut self,
        from: &Address,
        module: &str,
        amount: u64,
    ) -> Result<(), StateError> {
        let mut world = self.write();
        let balance = world.balances.entry(*from).or_default();
        *balance = balance
            .checked_sub(amount)
            .ok_or_else(|| StateError::Ledger(format!("{} cannot send {}", from, amount)))?;
        *world.pools.entry(module.to_string()).or_default() += amount;
        Ok(())
    }

    fn send_coins_from_module_to_account(
        &mut self,
        module: &str,
        to: &Address,
        amount: u64,
    ) -> Result<(), StateError> {
        let mut world = self.write();
        let pool = world.pools.entry(module.to_string()).or_default();
        *pool = pool
            .checked_sub(amount)
            .ok_or_else(|| StateError::Ledger(format!("pool {} cannot send {}", module, amount)))?;
        *world.balances.entry(*to).or_default() += amount;
        Ok(())
    }
}

impl AccountDirectory for MemoryBackend {
    fn get_account(&self, address: &Address) -> Option<BaseAccount> {
        self.read().accounts.get(address).cloned()
    }

    fn set_account(&mut self, account: BaseAccount) {
        self.write().accounts.insert(account.address, account);
    }
}
