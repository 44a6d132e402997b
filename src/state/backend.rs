/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Interfaces of the collaborators which own persistent state. They are implemented by the host
//! chain. Implementations are handles: clones share the same underlying state.

use crate::{error::StateError, types::Address};

/// Key-value byte store.
pub trait KvStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    fn set(&mut self, key: Vec<u8>, value: Vec<u8>);

    fn delete(&mut self, key: &[u8]);

    /// Returns every entry whose key starts with `prefix`, in ascending key order.
    fn prefix_entries(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)>;
}

/// Balance ledger. Coins are only created and destroyed through a module-owned pool.
pub trait Ledger {
    fn get_balance(&self, address: &Address) -> u64;

    fn mint_coins(&mut self, module: &str, amount: u64) -> Result<(), StateError>;

    fn burn_coins(&mut self, module: &str, amount: u64) -> Result<(), StateError>;

    fn send_coins_from_account_to_module(
        &mut self,
        from: &Address,
        module: &str,
        amount: u64,
    ) -> Result<(), StateError>;

    fn send_coins_from_module_to_account(
        &mut self,
        module: &str,
        to: &Address,
        amount: u64,
    ) -> Result<(), StateError>;
}

/// Record of an account kept by the host's account directory.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BaseAccount {
    pub address: Address,
    pub sequence: u64,
}

/// Directory of known accounts and their sequence numbers.
pub trait AccountDirectory {
    fn get_account(&self, address: &Address) -> Option<BaseAccount>;

    fn set_account(&mut self, account: BaseAccount);

    fn new_account_with_address(&self, address: &Address) -> BaseAccount {
        BaseAccount {
            address: *address,
            sequence: 0,
        }
    }

    fn sequence(&self, address: &Address) -> Option<u64> {
        self.get_account(address).map(|account| account.sequence)
    }
}

/// Everything the engine needs from the host, as one cloneable handle.
pub trait Backend: KvStore + Ledger + AccountDirectory + Clone + Send + Sync + 'static {}

impl<T> Backend for T where T: KvStore + Ledger + AccountDirectory + Clone + Send + Sync + 'static {}
