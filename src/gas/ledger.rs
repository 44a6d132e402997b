/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The gas ledger of one call. It is created when the call starts, shared by every nested call of
//! the call tree, and discarded when the call ends.

use crate::error::InterpreterError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GasLedger {
    original: u64,
    remaining: u64,
    refund: u64,
}

impl GasLedger {
    pub fn new(original: u64) -> Self {
        Self {
            original,
            remaining: original,
            refund: 0,
        }
    }

    pub fn original(&self) -> u64 {
        self.original
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn consumed(&self) -> u64 {
        self.original - self.remaining
    }

    pub fn refund(&self) -> u64 {
        self.refund
    }

    /// Deducts `amount`. If not enough gas remains, the ledger is drained and `InsufficientGas` returned.
    pub fn consume(&mut self, amount: u64) -> Result<(), InterpreterError> {
        match self.remaining.checked_sub(amount) {
            Some(remaining) => {
                self.remaining = remaining;
                Ok(())
            }
            None => {
                self.remaining = 0;
                Err(InterpreterError::InsufficientGas)
            }
        }
    }

    /// Overwrites the remaining gas, e.g. after a metered interpreter reports its own counter.
    /// The value never exceeds the original gas.
    pub fn set_remaining(&mut self, remaining: u64) {
        self.remaining = remaining.min(self.original);
    }

    /// Credits the refund counter. Applied only by [settle](GasLedger::settle) on success.
    pub fn add_refund(&mut self, amount: u64) {
        self.refund = self.refund.saturating_add(amount);
    }

    /// Applies the capped refund and returns the fee in engine gas.
    ///
    /// `refund = min(consumed / 2, refund counter)`, `fee = original - (remaining + refund)`.
    pub fn settle(&mut self) -> u64 {
        let refund = std::cmp::min(self.consumed() / 2, self.refund);
        self.remaining += refund;
        self.original - self.remaining
    }

    /// Returns the fee without any refund, for calls that failed.
    pub fn settle_without_refund(&self) -> u64 {
        self.consumed()
    }
}
