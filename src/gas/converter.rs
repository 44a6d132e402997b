/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Translation between the host chain's gas and engine gas.
//!
//! ```text
//! engine gas = min((host limit - host consumed) * gas rate, max gas per call)
//! host fee   = ceil(engine fee / gas rate)
//! ```

use crate::{error::ExecutionError, params::Params};

/// The host chain's gas meter. It is charged exactly once per call, at settlement.
pub trait HostGasMeter {
    fn limit(&self) -> u64;
    fn consumed(&self) -> u64;
    fn consume_gas(&mut self, amount: u64, descriptor: &str);
}

/// A plain [HostGasMeter] which saturates at `u64::MAX`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BasicHostGasMeter {
    limit: u64,
    consumed: u64,
}

impl BasicHostGasMeter {
    pub fn new(limit: u64) -> Self {
        Self { limit, consumed: 0 }
    }
}

impl HostGasMeter for BasicHostGasMeter {
    fn limit(&self) -> u64 {
        self.limit
    }

    fn consumed(&self) -> u64 {
        self.consumed
    }

    fn consume_gas(&mut self, amount: u64, _descriptor: &str) {
        self.consumed = self.consumed.saturating_add(amount);
    }
}

/// Converts gas between host units and engine units for one call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GasConverter {
    gas_rate: u64,
    max_gas_per_call: u64,
}

impl GasConverter {
    pub fn new(params: &Params, max_gas_per_call: u64) -> Self {
        Self {
            gas_rate: params.gas_rate.max(1),
            max_gas_per_call,
        }
    }

    /// Engine gas available to a call whose host meter allows `host_limit` and has consumed
    /// `host_consumed`. Fails with `IntegerOverflow` if the multiplication by the gas rate overflows.
    pub fn to_engine_gas(&self, host_limit: u64, host_consumed: u64) -> Result<u64, ExecutionError> {
        let host_remaining = host_limit.saturating_sub(host_consumed);
        let engine_gas = host_remaining
            .checked_mul(self.gas_rate)
            .ok_or(ExecutionError::IntegerOverflow)?;
        Ok(engine_gas.min(self.max_gas_per_call))
    }

    /// Host gas to charge for an engine fee, rounded up.
    pub fn to_host_gas(&self, engine_fee: u64) -> u64 {
        let quotient = engine_fee / self.gas_rate;
        if engine_fee % self.gas_rate == 0 {
            quotient
        } else {
            quotient + 1
        }
    }
}
