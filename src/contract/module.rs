/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Defines a struct wrapping [wasmer::Module], the compiled form of contract bytecode.

use tracing::warn;
use wasmer::ImportObject;

use super::{
    cache::Cache,
    instance::{Instance, CONTRACT_METHOD},
    non_determinism_filter::OPCODE_ERROR,
};
use crate::types::Hash;

pub(crate) struct Module(pub wasmer::Module);

impl Module {
    pub fn from_cache(code_hash: &Hash, cache: &Cache, store: &wasmer::Store) -> Option<Module> {
        cache.load(code_hash, store).ok().map(Module)
    }

    pub fn cache_to(&self, code_hash: &Hash, cache: &Cache) {
        if let Err(e) = cache.store(code_hash, &self.0) {
            warn!(code_hash = %hex::encode(code_hash), "cannot cache compiled module: {}", e);
        }
    }

    /// Compiles and validates bytecode. Modules rejected by the opcode filter, and modules which do
    /// not export the contract method, are refused.
    pub fn from_wasm_bytecode(
        bytecode: &[u8],
        store: &wasmer::Store,
    ) -> Result<Module, ModuleBuildError> {
        let module = wasmer::Module::from_binary(store, bytecode).map_err(|e| {
            let reason = e.to_string();
            if reason.contains(OPCODE_ERROR) {
                ModuleBuildError::DisallowedOpcodePresent(reason)
            } else {
                ModuleBuildError::Invalid(reason)
            }
        })?;

        if !module.exports().functions().any(|f| f.name() == CONTRACT_METHOD) {
            return Err(ModuleBuildError::MethodNotFound);
        }
        Ok(Module(module))
    }

    pub fn instantiate(
        &self,
        import_object: &ImportObject,
        gas_limit: u64,
    ) -> Result<Instance, wasmer::InstantiationError> {
        let instance = wasmer::Instance::new(&self.0, import_object)?;
        wasmer_middlewares::metering::set_remaining_points(&instance, gas_limit);
        Ok(Instance(instance))
    }
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum ModuleBuildError {
    #[error("disallowed opcode: {0}")]
    DisallowedOpcodePresent(String),

    #[error("contract does not export `{}`", CONTRACT_METHOD)]
    MethodNotFound,

    #[error("{0}")]
    Invalid(String),
}
