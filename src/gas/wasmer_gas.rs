/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Access to the metering global of a running WASM instance, so that host functions draw from
//! the same gas counter as opcode execution.

use wasmer::{Global, Value};

/// Name of the global exported by `wasmer_middlewares::Metering`.
pub const REMAINING_POINTS_GLOBAL: &str = "wasmer_metering_remaining_points";

/// Keeps a handle to the instance's remaining points global. Unset outside of a running call.
#[derive(Default)]
pub struct WasmerGasGlobal {
    global: Option<Global>,
}

impl WasmerGasGlobal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write(&mut self, global: Global) {
        self.global = Some(global);
    }

    pub fn clear(&mut self) {
        self.global = None;
    }

    /// Remaining points. Zero if the global is unset.
    pub fn gas(&self) -> u64 {
        match self.global.as_ref().map(Global::get) {
            Some(Value::I64(points)) => points as u64,
            _ => 0,
        }
    }

    fn set(&self, points: u64) {
        if let Some(global) = &self.global {
            // the global is mutable i64 by construction of the metering middleware
            let _ = global.set(Value::I64(points as i64));
        }
    }

    /// Deducts `amount`. Returns false and drains the counter if not enough points remain.
    pub fn subtract(&self, amount: u64) -> bool {
        match self.gas().checked_sub(amount) {
            Some(remaining) => {
                self.set(remaining);
                true
            }
            None => {
                self.set(0);
                false
            }
        }
    }
}
