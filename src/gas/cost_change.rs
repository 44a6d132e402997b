/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! A struct which stores intermediate gas cost changes.
//!
//! Most chargeable operations deduct gas. Some, e.g. the deletion of a storage cell, also
//! reward gas. Rewards are not paid back immediately: they accumulate in the refund counter of the
//! [GasLedger](super::GasLedger), which is capped at settlement.

use std::ops::{Add, AddAssign};

/// ### Example:
/// ```no_run
/// let mut change = CostChange::default();
/// change += CostChange::reward(1);
/// change += CostChange::deduct(2);
/// assert_eq!(change.values(), (2, 1));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CostChange {
    deduct: u64,
    reward: u64,
}

impl CostChange {
    pub const fn new(deduct: u64, reward: u64) -> Self {
        Self { deduct, reward }
    }

    pub const fn deduct(value: u64) -> Self {
        Self {
            deduct: value,
            reward: 0,
        }
    }

    pub const fn reward(value: u64) -> Self {
        Self {
            deduct: 0,
            reward: value,
        }
    }

    /// Gross values as (deducted, rewarded).
    pub const fn values(&self) -> (u64, u64) {
        (self.deduct, self.reward)
    }
}

impl AddAssign for CostChange {
    fn add_assign(&mut self, rhs: Self) {
        self.deduct = self.deduct.saturating_add(rhs.deduct);
        self.reward = self.reward.saturating_add(rhs.reward);
    }
}

impl Add for CostChange {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            deduct: self.deduct.saturating_add(other.deduct),
            reward: self.reward.saturating_add(other.reward),
        }
    }
}

#[test]
fn test_cost_change() {
    let mut change = CostChange::default();
    change += CostChange::reward(1);
    change += CostChange::deduct(2);
    assert_eq!(change.values(), (2, 1));
    let change = change + CostChange::new(u64::MAX, 0);
    assert_eq!(change.values(), (u64::MAX, 1));
}
