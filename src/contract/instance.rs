/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Defines a struct containing [wasmer::Instance] to run the exported methods of a contract.

use wasmer_middlewares::metering::{get_remaining_points, MeteringPoints};

use super::host_functions::FuncError;
use crate::{error::InterpreterError, gas::REMAINING_POINTS_GLOBAL};

/// Method run by every call.
pub const CONTRACT_METHOD: &str = "entrypoint";

/// Optional method run once when the contract is deployed.
pub const INIT_METHOD: &str = "init";

pub(crate) struct Instance(pub(crate) wasmer::Instance);

impl Instance {
    pub(crate) fn has_method(&self, name: &str) -> bool {
        self.0.exports.get_native_function::<(), ()>(name).is_ok()
    }

    /// Runs method `name`. Returns the remaining gas, along with the error if the method failed.
    pub(crate) fn call_method(&self, name: &str) -> Result<u64, (u64, MethodCallError)> {
        let method = match self.0.exports.get_native_function::<(), ()>(name) {
            Ok(m) => m,
            Err(e) => return Err((self.remaining_gas(), MethodCallError::NoExportedMethod(e))),
        };

        let execution_result = method.call();
        let remaining_gas = self.remaining_gas();

        execution_result
            .map(|()| remaining_gas)
            .map_err(|e| (remaining_gas, MethodCallError::from_trap(e, remaining_gas)))
    }

    pub(crate) fn remaining_gas(&self) -> u64 {
        match get_remaining_points(&self.0) {
            MeteringPoints::Exhausted => 0,
            MeteringPoints::Remaining(points) => points,
        }
    }

    pub(crate) fn remaining_points(&self) -> Result<wasmer::Global, wasmer::ExportError> {
        self.0.exports.get_global(REMAINING_POINTS_GLOBAL).cloned()
    }
}

#[derive(Debug)]
pub enum MethodCallError {
    Runtime(wasmer::RuntimeError),
    GasExhaustion,
    NoExportedMethod(wasmer::ExportError),
}

impl MethodCallError {
    /// A trap raised by a host function keeps its cause. Any other trap with no points left was
    /// raised by the metering middleware.
    fn from_trap(error: wasmer::RuntimeError, remaining_gas: u64) -> Self {
        if remaining_gas == 0 && !error.is::<FuncError>() {
            MethodCallError::GasExhaustion
        } else {
            MethodCallError::Runtime(error)
        }
    }
}

impl From<MethodCallError> for InterpreterError {
    fn from(error: MethodCallError) -> Self {
        match error {
            MethodCallError::GasExhaustion => InterpreterError::InsufficientGas,
            MethodCallError::NoExportedMethod(e) => InterpreterError::InvalidCode(e.to_string()),
            MethodCallError::Runtime(e) => match e.downcast::<FuncError>() {
                Ok(FuncError::Revert(data)) => InterpreterError::Reverted(data),
                Ok(FuncError::GasExhaustion) => InterpreterError::InsufficientGas,
                Ok(FuncError::Interpreter(e)) => e,
                Ok(FuncError::Runtime(e)) => InterpreterError::Other(e.to_string()),
                Err(trap) => InterpreterError::Other(trap.message()),
            },
        }
    }
}
