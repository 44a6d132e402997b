/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! File system cache of compiled contract modules, keyed by the keccak256 hash of the bytecode.
//! Contracts deployed from identical bytecode share one entry.

use std::{
    io::{Error, ErrorKind},
    path::PathBuf,
    sync::{Arc, RwLock},
};

use wasmer::{DeserializeError, Module, SerializeError, Store};
use wasmer_cache::{Cache as WasmerCache, FileSystemCache};

use crate::types::Hash;

#[derive(Clone)]
pub struct Cache {
    inner: Arc<RwLock<FileSystemCache>>,
}

impl Cache {
    /// Opens (creating if needed) a cache directory.
    pub fn new<P: Into<PathBuf>>(binaries_dir: P) -> std::io::Result<Self> {
        let fs_cache = FileSystemCache::new(binaries_dir.into())?;
        Ok(Self {
            inner: Arc::new(RwLock::new(fs_cache)),
        })
    }

    pub(crate) fn load(&self, code_hash: &Hash, store: &Store) -> Result<Module, DeserializeError> {
        let key = wasmer_cache::Hash::new(*code_hash);
        let fs_cache = self
            .inner
            .try_read()
            .map_err(|_| DeserializeError::Io(Error::from(ErrorKind::Interrupted)))?;
        // modules in the directory are only ever written by `store` below
        unsafe { fs_cache.load(store, key) }
    }

    pub(crate) fn store(&self, code_hash: &Hash, module: &Module) -> Result<(), SerializeError> {
        let key = wasmer_cache::Hash::new(*code_hash);
        let mut fs_cache = self
            .inner
            .try_write()
            .map_err(|_| SerializeError::Io(Error::from(ErrorKind::Interrupted)))?;
        fs_cache.store(key, module)
    }
}
