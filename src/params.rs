/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Parameters supplied to the engine at the start of every call.

/// Default hard ceiling on engine gas available to one call, regardless of the host gas limit.
pub const DEFAULT_MAX_GAS_PER_CALL: u64 = 50_000_000;

/// Maximum depth of nested contract-to-contract calls.
pub const MAX_CALL_DEPTH: u32 = 64;

/// Governance-controlled parameters. They are passed explicitly into each call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Params {
    /// Multiplier converting host gas units into engine gas units. Always at least 1.
    pub gas_rate: u64,
}

impl Params {
    pub fn new(gas_rate: u64) -> Self {
        Self {
            gas_rate: gas_rate.max(1),
        }
    }
}

impl Default for Params {
    fn default() -> Self {
        Self::new(1)
    }
}
