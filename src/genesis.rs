/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Genesis snapshot of every contract account and of the metadata table.
//!
//! [export] walks the code key space and collects, per coded account, its code, storage cells,
//! metadata links and abi. [import] replays a snapshot through one [ChangeCache], syncs it once, and
//! only then writes the independent metadata table. Balances are not part of the snapshot: an account
//! that already exists in the ledger keeps its balance.
//!
//! Byte fields are hex strings, with or without a `0x` prefix on input.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    error::StateError,
    execution::cache::{ChangeCache, StateAccess},
    state::{Backend, StateAdapter},
    types::{Account, Address, Code, CodeKind, ContractMeta, Hash, Word256},
};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisState {
    pub accounts: Vec<GenesisAccount>,
    pub metadata: Vec<GenesisMetadata>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisAccount {
    pub address: Address,
    pub kind: CodeKind,
    #[serde(with = "hex_bytes")]
    pub code: Vec<u8>,
    #[serde(default)]
    pub storage: Vec<GenesisStorage>,
    #[serde(default)]
    pub contract_meta: Vec<GenesisContractMeta>,
    #[serde(default, with = "hex_option", skip_serializing_if = "Option::is_none")]
    pub abi: Option<Vec<u8>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisStorage {
    #[serde(with = "hex_bytes")]
    pub key: Word256,
    #[serde(with = "hex_bytes")]
    pub value: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisContractMeta {
    #[serde(with = "hex_bytes")]
    pub code_hash: Hash,
    #[serde(with = "hex_bytes")]
    pub metadata_hash: Hash,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisMetadata {
    #[serde(with = "hex_bytes")]
    pub hash: Hash,
    pub metadata: String,
}

impl GenesisState {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

impl From<ContractMeta> for GenesisContractMeta {
    fn from(meta: ContractMeta) -> Self {
        Self {
            code_hash: meta.code_hash,
            metadata_hash: meta.metadata_hash,
        }
    }
}

impl From<&GenesisContractMeta> for ContractMeta {
    fn from(meta: &GenesisContractMeta) -> Self {
        Self {
            code_hash: meta.code_hash,
            metadata_hash: meta.metadata_hash,
        }
    }
}

/// Collects every coded account and the metadata table, in key order.
pub fn export<B: Backend>(adapter: &StateAdapter<B>) -> Result<GenesisState, StateError> {
    let mut accounts = Vec::new();
    for address in adapter.coded_accounts() {
        let code = match adapter.get_code(&address)? {
            Some(code) => code,
            None => continue,
        };
        let storage = adapter
            .storage_of(&address)
            .into_iter()
            .map(|(key, value)| GenesisStorage { key, value })
            .collect();
        let contract_meta = adapter
            .get_address_meta(&address)?
            .into_iter()
            .map(GenesisContractMeta::from)
            .collect();

        accounts.push(GenesisAccount {
            address,
            kind: code.kind(),
            code: code.bytes().to_vec(),
            storage,
            contract_meta,
            abi: adapter.get_abi(&address),
        });
    }

    let metadata = adapter
        .all_metadata()?
        .into_iter()
        .map(|(hash, metadata)| GenesisMetadata { hash, metadata })
        .collect();

    Ok(GenesisState { accounts, metadata })
}

/// Replays a snapshot into `backend`.
pub fn import<B: Backend>(backend: B, genesis: &GenesisState) -> Result<(), StateError> {
    let mut cache = ChangeCache::new(StateAdapter::new(backend.clone()));

    for entry in &genesis.accounts {
        let mut account = cache
            .get_account(&entry.address)?
            .unwrap_or_else(|| Account::new(entry.address));
        account.code = Some(Code::new(entry.kind, entry.code.clone()));
        account.contract_meta = entry.contract_meta.iter().map(ContractMeta::from).collect();
        cache.update_account(account)?;

        for cell in &entry.storage {
            cache.set_storage(&entry.address, cell.key, cell.value.clone())?;
        }
        if let Some(abi) = &entry.abi {
            cache.set_abi(&entry.address, abi.clone())?;
        }
    }
    cache.sync()?;

    let mut adapter = StateAdapter::new(backend);
    for record in &genesis.metadata {
        adapter.set_metadata(&record.hash, &record.metadata);
    }

    info!(
        accounts = genesis.accounts.len(),
        metadata = genesis.metadata.len(),
        "imported genesis"
    );
    Ok(())
}

/// Like `#[serde(with = "hex")]`, but tolerates a leading `0x` on input.
mod hex_bytes {
    use serde::{de::Error as _, Deserialize as _, Deserializer, Serializer};

    pub fn serialize<S: Serializer, T: hex::ToHex>(data: T, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&data.encode_hex::<String>())
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: hex::FromHex,
        T::Error: std::fmt::Display,
    {
        let s = String::deserialize(deserializer)?;
        T::from_hex(s.trim_start_matches("0x")).map_err(D::Error::custom)
    }
}

mod hex_option {
    use serde::{Deserialize as _, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
        match data {
            Some(bytes) => super::hex_bytes::serialize(bytes, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error> {
        let s = Option::<String>::deserialize(deserializer)?;
        s.map(|s| hex::decode(s.trim_start_matches("0x")).map_err(serde::de::Error::custom))
            .transpose()
    }
}
