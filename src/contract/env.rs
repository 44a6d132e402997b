/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Defines the environment host functions are given when a contract is instantiated.
//!
//! The environment (Env) keeps track of what a contract call produces: its return value, its
//! events, and the gas refund earned by deleting storage. Reads and writes go to the call's shared
//! state through the [CallContext].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::anyhow;
use wasmer::{Array, Global, LazyInit, Memory, NativeFunc, WasmPtr};

use super::memory::MemoryContext;
use crate::{
    gas::WasmerGasGlobal,
    interpreter::CallContext,
    types::{CallParams, Event},
};

/// What a running contract has produced so far.
#[derive(Default)]
pub(crate) struct CallOutput {
    pub return_value: Vec<u8>,
    pub events: Vec<Event>,
    pub refund: u64,
}

/// Env provides the functions in `imports` (which are in turn imported by WASM contracts) access to
/// functionality that cannot cross the host-WASM barrier.
#[derive(wasmer::WasmerEnv, Clone)]
pub(crate) struct Env {
    pub ctx: CallContext,

    /// Parameters of the invocation this instance serves
    pub params: CallParams,

    /// Metering global of the instance, set right after instantiation
    pub gas_global: Arc<Mutex<WasmerGasGlobal>>,

    pub output: Arc<Mutex<CallOutput>>,

    #[wasmer(export)]
    pub memory: LazyInit<Memory>,

    #[wasmer(export(name = "alloc"))]
    pub alloc: LazyInit<NativeFunc<u32, WasmPtr<u8, Array>>>,
}

impl Env {
    pub fn new(ctx: CallContext, params: CallParams) -> Self {
        Self {
            ctx,
            params,
            gas_global: Arc::new(Mutex::new(WasmerGasGlobal::new())),
            output: Arc::new(Mutex::new(CallOutput::default())),
            memory: LazyInit::default(),
            alloc: LazyInit::default(),
        }
    }

    pub fn init_gas_global(&self, global: Global) {
        self.gas().write(global);
    }

    pub fn clear_gas_global(&self) {
        self.gas().clear();
    }

    pub fn gas(&self) -> MutexGuard<'_, WasmerGasGlobal> {
        self.gas_global.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn output(&self) -> MutexGuard<'_, CallOutput> {
        self.output.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn take_output(&self) -> CallOutput {
        std::mem::take(&mut *self.output())
    }
}

impl MemoryContext for Env {
    fn get_memory(&self) -> anyhow::Result<&Memory> {
        self.memory_ref()
            .ok_or_else(|| anyhow!("contract does not export memory"))
    }

    fn get_alloc(&self) -> anyhow::Result<&NativeFunc<u32, WasmPtr<u8, Array>>> {
        self.alloc_ref()
            .ok_or_else(|| anyhow!("contract does not export alloc"))
    }
}
