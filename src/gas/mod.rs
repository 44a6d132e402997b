/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Gas accounting of the engine.
//!
//! - [constants]: costs of opcodes and host operations.
//! - [converter]: translation between host gas and engine gas.
//! - [ledger]: the per-call gas ledger with its refund counter.
//! - [wasmer_gas]: the metering counter of a running WASM instance.

pub mod cost_change;
pub use cost_change::*;

pub mod constants;
pub use constants::*;

pub mod converter;
pub use converter::*;

pub mod ledger;
pub use ledger::*;

pub mod wasmer_gas;
pub use wasmer_gas::*;
