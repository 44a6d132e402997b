/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! runtime defines the public entry points of the engine: deploy, call, read APIs, genesis, and the
//! begin-block hook.

use std::sync::Arc;

use tracing::debug;

use crate::{
    contract::{Cache, WasmInterpreter},
    error::ExecutionError,
    execution::{
        block_env::{record_predecessor_hash, BlockEnvironment},
        execute::{CallRequest, Coordinator, DeployRequest, ExecutionResult},
    },
    gas::{GasConverter, HostGasMeter},
    genesis::{self, GenesisState},
    interpreter::{Dispatcher, EventSink, Interpreter},
    params::{Params, DEFAULT_MAX_GAS_PER_CALL},
    state::{Backend, StateAdapter},
    types::{Address, BlockHeader, Code, ContractMeta, Hash, Word256},
};

/// Runtime defines a virtual machine executing contract deploys and calls against a [Backend].
#[derive(Clone)]
pub struct Runtime {
    /// EVM-style interpreter, supplied by the host
    evm: Option<Arc<dyn Interpreter>>,
    /// Smart Contract Cache
    sc_cache: Option<Cache>,
    /// Memory limit to wasm linear memory in contract execution
    sc_memory_limit: Option<usize>,
    max_gas_per_call: u64,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    /// Instantiate Runtime. Only the built-in WASM interpreter is available until an EVM
    /// interpreter is set.
    pub fn new() -> Self {
        Self {
            evm: None,
            sc_cache: None,
            sc_memory_limit: None,
            max_gas_per_call: DEFAULT_MAX_GAS_PER_CALL,
        }
    }

    pub fn set_evm_interpreter(mut self, interpreter: Arc<dyn Interpreter>) -> Self {
        self.evm = Some(interpreter);
        self
    }

    /// specify smart contract cache to improve performance for contract code compilation.
    pub fn set_smart_contract_cache(mut self, sc_cache: Cache) -> Self {
        self.sc_cache = Some(sc_cache);
        self
    }

    /// specify the limit to wasm linear memory in contract execution.
    /// It is a tunable maximum guest memory limit that is made available to the VM
    pub fn set_smart_contract_memory_limit(mut self, memory_limit: usize) -> Self {
        self.sc_memory_limit = Some(memory_limit);
        self
    }

    /// Hard ceiling on engine gas available to one call.
    pub fn set_max_gas_per_call(mut self, max_gas_per_call: u64) -> Self {
        self.max_gas_per_call = max_gas_per_call;
        self
    }

    fn dispatcher(&self) -> Arc<Dispatcher> {
        let wasm: Arc<dyn Interpreter> = Arc::new(WasmInterpreter::new(
            self.sc_cache.clone(),
            self.sc_memory_limit,
        ));
        Arc::new(Dispatcher::new(self.evm.clone(), Some(wasm)))
    }

    fn coordinator<B: Backend>(
        &self,
        backend: B,
        header: BlockHeader,
        params: &Params,
    ) -> Coordinator<B> {
        let block = Arc::new(BlockEnvironment::new(
            header,
            StateAdapter::new(backend.clone()),
        ));
        Coordinator::new(
            backend,
            block,
            self.dispatcher(),
            GasConverter::new(params, self.max_gas_per_call),
        )
    }

    /// Deploys a contract. On success the result carries the new contract's address, which is also
    /// its return value.
    pub fn deploy<B: Backend>(
        &self,
        backend: B,
        header: BlockHeader,
        params: &Params,
        request: DeployRequest,
        host_gas: &mut dyn HostGasMeter,
        sink: &mut dyn EventSink,
    ) -> Result<ExecutionResult, ExecutionError> {
        self.coordinator(backend, header, params)
            .deploy(request, host_gas, sink)
    }

    /// Calls a contract, or transfers value to a codeless account. A view call is never committed.
    pub fn call<B: Backend>(
        &self,
        backend: B,
        header: BlockHeader,
        params: &Params,
        request: CallRequest,
        host_gas: &mut dyn HostGasMeter,
        sink: &mut dyn EventSink,
    ) -> Result<ExecutionResult, ExecutionError> {
        self.coordinator(backend, header, params)
            .call(request, host_gas, sink)
    }

    /// Records the predecessor's hash for the block about to run. Call once per block, before its
    /// first call.
    pub fn begin_block<B: Backend>(&self, backend: B, header: &BlockHeader) {
        let mut adapter = StateAdapter::new(backend);
        if record_predecessor_hash(&mut adapter, header) {
            debug!(height = header.height, "recorded predecessor hash");
        }
    }

    /* ↓↓↓ Read APIs ↓↓↓ */

    pub fn get_code<B: Backend>(
        &self,
        backend: B,
        address: &Address,
    ) -> Result<Option<Code>, ExecutionError> {
        Ok(StateAdapter::new(backend).get_code(address)?)
    }

    /// Value of a storage cell. An unset cell reads as 32 zero bytes.
    pub fn get_storage<B: Backend>(&self, backend: B, address: &Address, key: &Word256) -> Vec<u8> {
        StateAdapter::new(backend).get_storage(address, key)
    }

    pub fn get_address_meta<B: Backend>(
        &self,
        backend: B,
        address: &Address,
    ) -> Result<Vec<ContractMeta>, ExecutionError> {
        Ok(StateAdapter::new(backend).get_address_meta(address)?)
    }

    pub fn get_metadata<B: Backend>(
        &self,
        backend: B,
        hash: &Hash,
    ) -> Result<Option<String>, ExecutionError> {
        Ok(StateAdapter::new(backend).get_metadata(hash)?)
    }

    pub fn get_abi<B: Backend>(&self, backend: B, address: &Address) -> Option<Vec<u8>> {
        StateAdapter::new(backend).get_abi(address)
    }

    /* ↓↓↓ Genesis ↓↓↓ */

    pub fn genesis_export<B: Backend>(&self, backend: B) -> Result<GenesisState, ExecutionError> {
        Ok(genesis::export(&StateAdapter::new(backend))?)
    }

    pub fn genesis_import<B: Backend>(
        &self,
        backend: B,
        genesis: &GenesisState,
    ) -> Result<(), ExecutionError> {
        Ok(genesis::import(backend, genesis)?)
    }
}
