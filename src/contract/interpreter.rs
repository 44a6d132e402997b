/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The WASM [Interpreter]: compiles (or loads from cache) contract modules, instantiates them with the
//! host functions in [imports](super::host_functions::imports), and runs their exported methods under
//! wasmer metering.
//!
//! A create runs the optional `init` method and returns the bytecode itself as runtime code. A call runs
//! `entrypoint` and returns whatever the contract passed to `return_value`.

use tracing::debug;

use super::{
    cache::Cache,
    env::Env,
    host_functions,
    instance::{CONTRACT_METHOD, INIT_METHOD},
    module::{Module, ModuleBuildError},
    store,
};
use crate::{
    error::InterpreterError,
    gas::GasLedger,
    interpreter::{forward_events, CallContext, EventSink, Interpreter},
    types::{keccak256, CallKind, CallParams},
};

#[derive(Clone, Default)]
pub struct WasmInterpreter {
    cache: Option<Cache>,
    /// Upper bound on the linear memory of an instance, in bytes
    memory_limit: Option<usize>,
}

impl WasmInterpreter {
    pub fn new(cache: Option<Cache>, memory_limit: Option<usize>) -> Self {
        Self {
            cache,
            memory_limit,
        }
    }

    fn load_module(&self, code: &[u8], store: &wasmer::Store) -> Result<Module, InterpreterError> {
        let code_hash = keccak256(code);
        if let Some(module) = self
            .cache
            .as_ref()
            .and_then(|cache| Module::from_cache(&code_hash, cache, store))
        {
            return Ok(module);
        }

        let module = Module::from_wasm_bytecode(code, store).map_err(|e| match e {
            ModuleBuildError::DisallowedOpcodePresent(reason) | ModuleBuildError::Invalid(reason) => {
                InterpreterError::InvalidCode(reason)
            }
            e => InterpreterError::InvalidCode(e.to_string()),
        })?;
        if let Some(cache) = &self.cache {
            module.cache_to(&code_hash, cache);
        }
        Ok(module)
    }
}

impl Interpreter for WasmInterpreter {
    fn execute(
        &self,
        ctx: &CallContext,
        sink: &mut dyn EventSink,
        params: &CallParams,
        code: &[u8],
        gas: &mut GasLedger,
    ) -> Result<Vec<u8>, InterpreterError> {
        let store = store::instantiate_store(self.memory_limit);
        let module = self.load_module(code, &store)?;

        let env = Env::new(ctx.clone(), params.clone());
        let import_object = host_functions::imports(&store, &env);
        let instance = module
            .instantiate(&import_object, gas.remaining())
            .map_err(|e| InterpreterError::InvalidCode(e.to_string()))?;
        let global = instance
            .remaining_points()
            .map_err(|e| InterpreterError::InvalidCode(e.to_string()))?;
        env.init_gas_global(global);

        let method = match params.kind {
            CallKind::Create => INIT_METHOD,
            CallKind::Call => CONTRACT_METHOD,
        };
        let result = if params.kind == CallKind::Create && !instance.has_method(INIT_METHOD) {
            Ok(gas.remaining())
        } else {
            instance.call_method(method)
        };
        env.clear_gas_global();
        let output = env.take_output();

        match result {
            Ok(remaining) => {
                gas.set_remaining(remaining);
                gas.add_refund(output.refund);
                debug!(
                    callee = %params.callee,
                    depth = params.depth,
                    consumed = gas.consumed(),
                    "wasm {} done",
                    method
                );
                forward_events(output.events, sink);
                Ok(match params.kind {
                    CallKind::Create => code.to_vec(),
                    CallKind::Call => output.return_value,
                })
            }
            Err((remaining, error)) => {
                gas.set_remaining(remaining);
                Err(error.into())
            }
        }
    }
}
