/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Layout of the persistent key space. Each record category owns one prefix byte.
//!
//! |Category        | Key                                 | Value                      |
//! |:---            |:---                                 |:---                        |
//! |Storage cell    | `0x01 ‖ address ‖ 32-byte key`       | raw bytes                  |
//! |Block hash      | `0x02 ‖ big-endian(height)`          | 32-byte hash               |
//! |Code            | `0x03 ‖ address`                     | borsh [Code](crate::types::Code) |
//! |Abi             | `0x04 ‖ address`                     | opaque bytes               |
//! |Metadata        | `0x05 ‖ 32-byte content hash`        | UTF-8 string               |
//! |Address meta    | `0x06 ‖ address`                     | borsh `Vec<ContractMeta>`  |

use crate::types::{Address, Hash, Word256, ADDRESS_LENGTH};

pub const STORAGE_PREFIX: u8 = 0x01;
pub const BLOCK_HASH_PREFIX: u8 = 0x02;
pub const CODE_PREFIX: u8 = 0x03;
pub const ABI_PREFIX: u8 = 0x04;
pub const METADATA_PREFIX: u8 = 0x05;
pub const ADDRESS_META_PREFIX: u8 = 0x06;

fn prefixed(prefix: u8, body: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + body.len());
    key.push(prefix);
    key.extend_from_slice(body);
    key
}

pub fn storage_key(address: &Address, key: &Word256) -> Vec<u8> {
    let mut k = storage_prefix(address);
    k.extend_from_slice(key);
    k
}

/// Prefix shared by all storage cells of one account.
pub fn storage_prefix(address: &Address) -> Vec<u8> {
    prefixed(STORAGE_PREFIX, address.as_bytes())
}

pub fn block_hash_key(height: u64) -> Vec<u8> {
    prefixed(BLOCK_HASH_PREFIX, &height.to_be_bytes())
}

pub fn code_key(address: &Address) -> Vec<u8> {
    prefixed(CODE_PREFIX, address.as_bytes())
}

pub fn abi_key(address: &Address) -> Vec<u8> {
    prefixed(ABI_PREFIX, address.as_bytes())
}

pub fn metadata_key(hash: &Hash) -> Vec<u8> {
    prefixed(METADATA_PREFIX, hash)
}

pub fn address_meta_key(address: &Address) -> Vec<u8> {
    prefixed(ADDRESS_META_PREFIX, address.as_bytes())
}

/// Recovers the address from a key of the code, abi or address meta categories.
pub fn address_of(key: &[u8]) -> Option<Address> {
    match key.split_first() {
        Some((_, body)) if body.len() == ADDRESS_LENGTH => Address::from_slice(body).ok(),
        _ => None,
    }
}

/// Recovers the 32-byte storage key from a storage cell key.
pub fn storage_word_of(key: &[u8]) -> Option<Word256> {
    if key.len() != 1 + ADDRESS_LENGTH + 32 || key[0] != STORAGE_PREFIX {
        return None;
    }
    key[1 + ADDRESS_LENGTH..].try_into().ok()
}

/// Recovers the content hash from a metadata key.
pub fn metadata_hash_of(key: &[u8]) -> Option<Hash> {
    match key.split_first() {
        Some((&METADATA_PREFIX, body)) => body.try_into().ok(),
        _ => None,
    }
}
