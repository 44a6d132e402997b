/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Defines a middleware filter which rejects contracts using opcodes whose results may differ
//! between machines: floating point, fixed width SIMD and atomics.
//!
//! See <https://github.com/WebAssembly/design/blob/main/Nondeterminism.md>

use loupe::MemoryUsage;
use wasmer::{
    wasmparser::Operator, FunctionMiddleware, LocalFunctionIndex, MiddlewareError,
    MiddlewareReaderState, ModuleMiddleware,
};

/// Families of opcodes the filter can reject.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum OpcodeFamily {
    FloatingPoint,
    Simd,
    Atomic,
    Other,
}

impl OpcodeFamily {
    /// Classifies an operator by its mnemonic. SIMD lane shapes (`i32x4`, `f64x2`, ...) and `v128` are
    /// checked before floats, so `f32x4.add` is a SIMD operator.
    pub(crate) fn of(operator: &Operator) -> Self {
        let name = format!("{:?}", operator);
        let mnemonic = name.split(|c: char| c == ' ' || c == '{').next().unwrap_or_default();
        if mnemonic.contains("Atomic") {
            OpcodeFamily::Atomic
        } else if mnemonic.starts_with("V128")
            || ["x16", "x8", "x4", "x2"]
                .iter()
                .any(|lanes| mnemonic.contains(lanes))
        {
            OpcodeFamily::Simd
        } else if mnemonic.contains("F32") || mnemonic.contains("F64") {
            OpcodeFamily::FloatingPoint
        } else {
            OpcodeFamily::Other
        }
    }
}

/// Which opcode families are admitted.
#[derive(Debug, MemoryUsage, Clone, Copy)]
struct FilterConfig {
    allow_floating_point_ops: bool,
    allow_simd_ops: bool,
    allow_atomic_ops: bool,
}

/// NonDeterminismFilter is the module middleware. It rejects the module at compile time.
#[derive(Debug, MemoryUsage)]
pub struct NonDeterminismFilter {
    config: FilterConfig,
}

impl Default for NonDeterminismFilter {
    fn default() -> Self {
        Self {
            config: FilterConfig {
                allow_floating_point_ops: false,
                allow_simd_ops: false,
                allow_atomic_ops: false,
            },
        }
    }
}

impl ModuleMiddleware for NonDeterminismFilter {
    fn generate_function_middleware(&self, _: LocalFunctionIndex) -> Box<dyn FunctionMiddleware> {
        Box::new(FunctionNonDeterminismFilter {
            config: self.config,
        })
    }
}

#[derive(Debug)]
struct FunctionNonDeterminismFilter {
    config: FilterConfig,
}

impl FunctionMiddleware for FunctionNonDeterminismFilter {
    fn feed<'a>(
        &mut self,
        operator: Operator<'a>,
        state: &mut MiddlewareReaderState<'a>,
    ) -> Result<(), MiddlewareError> {
        let rejected = match OpcodeFamily::of(&operator) {
            OpcodeFamily::FloatingPoint if !self.config.allow_floating_point_ops => {
                Some("Floating Point Operations")
            }
            OpcodeFamily::Simd if !self.config.allow_simd_ops => Some("SIMD Operations"),
            OpcodeFamily::Atomic if !self.config.allow_atomic_ops => Some("Atomic Operations"),
            _ => None,
        };
        match rejected {
            Some(family) => Err(MiddlewareError::new(
                "NonDeterminismFilter",
                format!("{}: {}", OPCODE_ERROR, family),
            )),
            None => {
                state.push_operator(operator);
                Ok(())
            }
        }
    }
}

/// Marker contained in the compile error of a module rejected by the filter.
pub(crate) const OPCODE_ERROR: &str = "OpcodeError";
