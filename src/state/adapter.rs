/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Implements [StateAdapter], the translation between the engine's account and storage model and
//! the host's [Backend].

use std::cmp::Ordering;

use borsh::{BorshDeserialize, BorshSerialize};

use super::{backend::Backend, keys};
use crate::{
    error::StateError,
    types::{is_zero_value, Account, Address, Code, ContractMeta, Hash, Word256, ZERO_WORD},
};

/// Name of the module-owned pool through which balance differences are minted and burnt.
pub const MODULE_NAME: &str = "cvm";

/// StateAdapter owns a handle to the host backend. It is the only place where keys of the
/// persistent key space are built and records are encoded.
#[derive(Clone)]
pub struct StateAdapter<B> {
    backend: B,
}

impl<B: Backend> StateAdapter<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /* ↓↓↓ Accounts ↓↓↓ */

    /// Returns the account at `address`, or `None` if the account directory does not know it.
    pub fn get_account(&self, address: &Address) -> Result<Option<Account>, StateError> {
        if self.backend.get_account(address).is_none() {
            return Ok(None);
        }
        Ok(Some(Account {
            address: *address,
            balance: self.backend.get_balance(address),
            code: self.get_code(address)?,
            contract_meta: self.get_address_meta(address)?,
        }))
    }

    /// Upserts code, balance and metadata links of `account`. A missing directory entry is created.
    /// The ledger is brought to `account.balance` through the module pool, so total supply is unchanged
    /// as long as the balances written within one sync net to zero.
    pub fn update_account(&mut self, account: &Account) -> Result<(), StateError> {
        let address = &account.address;
        if self.backend.get_account(address).is_none() {
            let base = self.backend.new_account_with_address(address);
            self.backend.set_account(base);
        }

        let current = self.backend.get_balance(address);
        match account.balance.cmp(&current) {
            Ordering::Greater => {
                let diff = account.balance - current;
                self.backend.mint_coins(MODULE_NAME, diff)?;
                self.backend
                    .send_coins_from_module_to_account(MODULE_NAME, address, diff)?;
            }
            Ordering::Less => {
                let diff = current - account.balance;
                self.backend
                    .send_coins_from_account_to_module(address, MODULE_NAME, diff)?;
                self.backend.burn_coins(MODULE_NAME, diff)?;
            }
            Ordering::Equal => {}
        }

        match &account.code {
            Some(code) => self.set_code(address, code)?,
            None => self.backend.delete(&keys::code_key(address)),
        }
        self.set_address_meta(address, &account.contract_meta)
    }

    /// Deletes code, abi and metadata links of an account. The ledger balance and the directory
    /// entry belong to the host and are left alone.
    pub fn remove_account(&mut self, address: &Address) -> Result<(), StateError> {
        if self.backend.get_account(address).is_none() {
            return Err(StateError::AccountNotFound(*address));
        }
        self.backend.delete(&keys::code_key(address));
        self.backend.delete(&keys::abi_key(address));
        self.backend.delete(&keys::address_meta_key(address));
        Ok(())
    }

    pub fn sequence(&self, address: &Address) -> Option<u64> {
        self.backend.sequence(address)
    }

    /* ↓↓↓ Code ↓↓↓ */

    pub fn get_code(&self, address: &Address) -> Result<Option<Code>, StateError> {
        let key = keys::code_key(address);
        self.backend
            .get(&key)
            .map(|bytes| decode::<Code>(&key, &bytes))
            .transpose()
    }

    fn set_code(&mut self, address: &Address, code: &Code) -> Result<(), StateError> {
        let key = keys::code_key(address);
        let value = encode(&key, code)?;
        self.backend.set(key, value);
        Ok(())
    }

    /// Addresses of all accounts which hold code, in key order.
    pub fn coded_accounts(&self) -> Vec<Address> {
        self.backend
            .prefix_entries(&[keys::CODE_PREFIX])
            .into_iter()
            .filter_map(|(key, _)| keys::address_of(&key))
            .collect()
    }

    /* ↓↓↓ Storage ↓↓↓ */

    /// Value of a storage cell. An unset cell reads as 32 zero bytes.
    pub fn get_storage(&self, address: &Address, key: &Word256) -> Vec<u8> {
        self.get_storage_raw(address, key)
            .unwrap_or_else(|| ZERO_WORD.to_vec())
    }

    /// Value of a storage cell, or `None` if the cell does not exist.
    pub fn get_storage_raw(&self, address: &Address, key: &Word256) -> Option<Vec<u8>> {
        self.backend.get(&keys::storage_key(address, key))
    }

    /// Writes a storage cell. An all-zero value deletes it.
    pub fn set_storage(&mut self, address: &Address, key: &Word256, value: Vec<u8>) {
        let key = keys::storage_key(address, key);
        if is_zero_value(&value) {
            self.backend.delete(&key);
        } else {
            self.backend.set(key, value);
        }
    }

    /// All existing storage cells of an account, in key order.
    pub fn storage_of(&self, address: &Address) -> Vec<(Word256, Vec<u8>)> {
        self.backend
            .prefix_entries(&keys::storage_prefix(address))
            .into_iter()
            .filter_map(|(key, value)| keys::storage_word_of(&key).map(|word| (word, value)))
            .collect()
    }

    /* ↓↓↓ Metadata ↓↓↓ */

    pub fn get_metadata(&self, hash: &Hash) -> Result<Option<String>, StateError> {
        let key = keys::metadata_key(hash);
        match self.backend.get(&key) {
            Some(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|e| corrupted(&key, e)),
            None => Ok(None),
        }
    }

    /// Records are content-addressed and immutable: an existing record is never overwritten.
    pub fn set_metadata(&mut self, hash: &Hash, metadata: &str) {
        let key = keys::metadata_key(hash);
        if self.backend.get(&key).is_none() {
            self.backend.set(key, metadata.as_bytes().to_vec());
        }
    }

    /// The whole metadata table, in hash order.
    pub fn all_metadata(&self) -> Result<Vec<(Hash, String)>, StateError> {
        self.backend
            .prefix_entries(&[keys::METADATA_PREFIX])
            .into_iter()
            .filter_map(|(key, value)| keys::metadata_hash_of(&key).map(|hash| (key, hash, value)))
            .map(|(key, hash, value)| {
                String::from_utf8(value)
                    .map(|metadata| (hash, metadata))
                    .map_err(|e| corrupted(&key, e))
            })
            .collect()
    }

    pub fn get_address_meta(&self, address: &Address) -> Result<Vec<ContractMeta>, StateError> {
        let key = keys::address_meta_key(address);
        match self.backend.get(&key) {
            Some(bytes) => decode::<Vec<ContractMeta>>(&key, &bytes),
            None => Ok(Vec::new()),
        }
    }

    /// Replaces the link list of an address. An empty list removes the record.
    pub fn set_address_meta(
        &mut self,
        address: &Address,
        metas: &[ContractMeta],
    ) -> Result<(), StateError> {
        let key = keys::address_meta_key(address);
        if metas.is_empty() {
            self.backend.delete(&key);
            return Ok(());
        }
        let value = encode(&key, &metas.to_vec())?;
        self.backend.set(key, value);
        Ok(())
    }

    /* ↓↓↓ Abi ↓↓↓ */

    pub fn get_abi(&self, address: &Address) -> Option<Vec<u8>> {
        self.backend.get(&keys::abi_key(address))
    }

    pub fn set_abi(&mut self, address: &Address, abi: Vec<u8>) {
        self.backend.set(keys::abi_key(address), abi);
    }

    /* ↓↓↓ Block hashes ↓↓↓ */

    pub fn get_block_hash(&self, height: u64) -> Option<Hash> {
        self.backend
            .get(&keys::block_hash_key(height))
            .and_then(|bytes| bytes.try_into().ok())
    }

    pub fn set_block_hash(&mut self, height: u64, hash: Hash) {
        self.backend.set(keys::block_hash_key(height), hash.to_vec());
    }
}

fn corrupted(key: &[u8], reason: impl ToString) -> StateError {
    StateError::CorruptedRecord {
        key: hex::encode(key),
        reason: reason.to_string(),
    }
}

fn decode<T: BorshDeserialize>(key: &[u8], bytes: &[u8]) -> Result<T, StateError> {
    T::try_from_slice(bytes).map_err(|e| corrupted(key, e))
}

fn encode<T: BorshSerialize>(key: &[u8], value: &T) -> Result<Vec<u8>, StateError> {
    value.try_to_vec().map_err(|e| corrupted(key, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{KvStore, Ledger, MemoryBackend};

    fn adapter() -> StateAdapter<MemoryBackend> {
        StateAdapter::new(MemoryBackend::new())
    }

    #[test]
    fn unset_storage_reads_zero() {
        let adapter = adapter();
        assert_eq!(adapter.get_storage(&Address([1u8; 20]), &[2u8; 32]), vec![0u8; 32]);
    }

    #[test]
    fn zero_write_deletes_cell() {
        let mut adapter = adapter();
        let address = Address([1u8; 20]);
        adapter.set_storage(&address, &[2u8; 32], vec![1, 2, 3]);
        assert_eq!(adapter.get_storage(&address, &[2u8; 32]), vec![1, 2, 3]);

        adapter.set_storage(&address, &[2u8; 32], vec![0u8; 4]);
        assert_eq!(adapter.get_storage_raw(&address, &[2u8; 32]), None);
        assert!(adapter.backend().prefix_entries(&[keys::STORAGE_PREFIX]).is_empty());
    }

    #[test]
    fn update_account_reconciles_ledger() {
        let mut adapter = adapter();
        let a = Address([1u8; 20]);
        let b = Address([2u8; 20]);
        adapter.backend().fund(&a, 100);
        let supply = adapter.backend().total_supply();

        let mut account_a = adapter.get_account(&a).unwrap().unwrap();
        let mut account_b = Account::new(b);
        account_a.subtract_balance(40).unwrap();
        account_b.add_balance(40).unwrap();
        adapter.update_account(&account_a).unwrap();
        adapter.update_account(&account_b).unwrap();

        assert_eq!(adapter.backend().get_balance(&a), 60);
        assert_eq!(adapter.backend().get_balance(&b), 40);
        assert_eq!(adapter.backend().total_supply(), supply);
        assert!(adapter.get_account(&b).unwrap().is_some());
    }

    #[test]
    fn remove_missing_account() {
        let mut adapter = adapter();
        assert_eq!(
            adapter.remove_account(&Address([5u8; 20])),
            Err(StateError::AccountNotFound(Address([5u8; 20])))
        );
    }

    #[test]
    fn remove_account_clears_code_and_links() {
        let mut adapter = adapter();
        let address = Address([5u8; 20]);
        let mut account = Account::new(address);
        account.code = Some(Code::Wasm(vec![0, 97, 115, 109]));
        account.contract_meta = vec![ContractMeta {
            code_hash: [1u8; 32],
            metadata_hash: [2u8; 32],
        }];
        adapter.update_account(&account).unwrap();
        adapter.set_abi(&address, b"abi".to_vec());
        assert_eq!(adapter.get_account(&address).unwrap(), Some(account));

        adapter.remove_account(&address).unwrap();
        assert_eq!(adapter.get_code(&address).unwrap(), None);
        assert_eq!(adapter.get_abi(&address), None);
        assert!(adapter.get_address_meta(&address).unwrap().is_empty());
    }

    #[test]
    fn metadata_is_write_once() {
        let mut adapter = adapter();
        adapter.set_metadata(&[1u8; 32], "first");
        adapter.set_metadata(&[1u8; 32], "second");
        assert_eq!(adapter.get_metadata(&[1u8; 32]).unwrap(), Some("first".to_string()));
        assert_eq!(adapter.all_metadata().unwrap().len(), 1);
    }

    #[test]
    fn truncated_link_record_is_corrupted() {
        let mut adapter = adapter();
        let address = Address([6u8; 20]);
        let mut backend = adapter.backend().clone();
        backend.set(keys::address_meta_key(&address), vec![1, 0, 0, 0, 7]);
        assert!(matches!(
            adapter.get_address_meta(&address),
            Err(StateError::CorruptedRecord { .. })
        ));
        adapter.set_address_meta(&address, &[]).unwrap();
        assert!(adapter.get_address_meta(&address).unwrap().is_empty());
    }
}
