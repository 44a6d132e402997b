/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Constants and formulas which are primitives used in the cost calculation of engine operations.
//!
//! |Operation              | Related Function / Constants      |
//! |:---                   |:---                               |
//! |Wasm opcode            | [wasm_opcode_gas_schedule]        |
//! |Read guest memory      | [wasm_memory_read_cost]           |
//! |Write guest memory     | [wasm_memory_write_cost]          |
//! |Read storage cell      | [storage_get_cost]                |
//! |Write storage cell     | [storage_set_cost]                |
//! |Emit log               | [log_cost]                        |
//! |Hash functions         | [CRYPTO_SHA256_PER_BYTE], [CRYPTO_KECCAK256_PER_BYTE], [CRYPTO_RIPEMD160_PER_BYTE] |
//! |Nested call            | [CALL_BASE_COST]                  |

use wasmer::wasmparser::Operator;

use super::CostChange;

/* ↓↓↓ Gas Costs for Wasm opcode execution ↓↓↓ */

/// wasm_opcode_gas_schedule maps a Wasm Operator to the engine gas charged for executing it.
pub fn wasm_opcode_gas_schedule(operator: &Operator) -> u64 {
    match operator {
        Operator::I32Const { .. } | Operator::I64Const { .. } => 0,

        Operator::Nop
        | Operator::Unreachable
        | Operator::Block { .. }
        | Operator::Loop { .. }
        | Operator::If { .. }
        | Operator::Else
        | Operator::End => 0,

        Operator::Br { .. } | Operator::BrTable { .. } | Operator::Return => 2,
        Operator::BrIf { .. } | Operator::Select => 3,
        Operator::Call { .. } | Operator::CallIndirect { .. } => 5,

        Operator::LocalGet { .. }
        | Operator::LocalSet { .. }
        | Operator::LocalTee { .. }
        | Operator::GlobalGet { .. }
        | Operator::GlobalSet { .. } => 2,

        Operator::I32Load { .. }
        | Operator::I64Load { .. }
        | Operator::I32Load8S { .. }
        | Operator::I32Load8U { .. }
        | Operator::I32Load16S { .. }
        | Operator::I32Load16U { .. }
        | Operator::I64Load8S { .. }
        | Operator::I64Load8U { .. }
        | Operator::I64Load16S { .. }
        | Operator::I64Load16U { .. }
        | Operator::I64Load32S { .. }
        | Operator::I64Load32U { .. } => WASM_MEMORY_READ_PER64_BITS_COST,

        Operator::I32Store { .. }
        | Operator::I64Store { .. }
        | Operator::I32Store8 { .. }
        | Operator::I32Store16 { .. }
        | Operator::I64Store8 { .. }
        | Operator::I64Store16 { .. }
        | Operator::I64Store32 { .. } => WASM_MEMORY_WRITE_PER64_BITS_COST,

        Operator::MemorySize { .. } => 3,
        Operator::MemoryGrow { .. } => 1_000,
        Operator::MemoryCopy { .. } | Operator::MemoryFill { .. } => 10,

        Operator::I32Mul | Operator::I64Mul => 3,
        Operator::I32DivS
        | Operator::I32DivU
        | Operator::I32RemS
        | Operator::I32RemU
        | Operator::I64DivS
        | Operator::I64DivU
        | Operator::I64RemS
        | Operator::I64RemU => 80,
        Operator::I32Clz | Operator::I64Clz | Operator::I32Ctz | Operator::I64Ctz => 100,

        _ => 1,
    }
}

/* ↓↓↓ Gas Costs for Accessing Wasm memory from host functions ↓↓↓ */

/// Cost of writing into the WASM linear memory *per 64 bits*.
pub const WASM_MEMORY_WRITE_PER64_BITS_COST: u64 = 3;
/// Cost of reading from the WASM linear memory *per 64 bits*.
pub const WASM_MEMORY_READ_PER64_BITS_COST: u64 = 3;

/// Cost of reading `len` bytes from Wasm linear memory. Never zero.
pub const fn wasm_memory_read_cost(len: usize) -> u64 {
    let cost = ceil_div_8(len as u64).saturating_mul(WASM_MEMORY_READ_PER64_BITS_COST);
    if cost == 0 {
        return 1;
    }
    cost
}

/// Cost of writing `len` bytes into Wasm linear memory. Never zero.
pub const fn wasm_memory_write_cost(len: usize) -> u64 {
    let cost = ceil_div_8(len as u64).saturating_mul(WASM_MEMORY_WRITE_PER64_BITS_COST);
    if cost == 0 {
        return 1;
    }
    cost
}

/// Ceiling of the value after dividing by 8.
pub const fn ceil_div_8(l: u64) -> u64 {
    l.saturating_add(7).saturating_div(8)
}

/* ↓↓↓ Storage access ↓↓↓ */

/// Flat cost of touching a storage cell.
pub const STORAGE_ACCESS_COST: u64 = 200;
/// Cost of reading a single byte of a storage value.
pub const STORAGE_READ_PER_BYTE_COST: u64 = 50;
/// Cost of writing a single byte of a storage value.
pub const STORAGE_WRITE_PER_BYTE_COST: u64 = 2_500;
/// Proportion (percent) of the write cost of an old value that is credited to the refund counter
/// when the value is overwritten or deleted.
pub const STORAGE_REFUND_PROPORTION: u64 = 50;

/// Cost of reading a storage value of `value_len` bytes.
pub const fn storage_get_cost(value_len: usize) -> u64 {
    STORAGE_ACCESS_COST.saturating_add((value_len as u64).saturating_mul(STORAGE_READ_PER_BYTE_COST))
}

/// Cost change of replacing a value of `old_len` bytes by a value of `new_len` bytes.
/// The new bytes are charged; part of the old bytes' write cost is rewarded. A zero `new_len`
/// is a deletion. The reward also covers the 32-byte key when the cell is deleted.
pub const fn storage_set_cost(old_len: usize, new_len: usize) -> CostChange {
    let write = STORAGE_ACCESS_COST
        .saturating_add((new_len as u64).saturating_mul(STORAGE_WRITE_PER_BYTE_COST));
    let refunded_bytes = if old_len > 0 && new_len == 0 {
        old_len as u64 + 32
    } else {
        old_len as u64
    };
    let reward = refunded_bytes
        .saturating_mul(STORAGE_WRITE_PER_BYTE_COST * STORAGE_REFUND_PROPORTION)
        .saturating_div(100);
    CostChange::new(write, reward)
}

/* ↓↓↓ Events ↓↓↓ */

/// Cost of including one byte of log data in the block.
pub const LOG_PER_BYTE_COST: u64 = 30;

/// Cost of emitting a log with `topics` 32-byte topics and `data_len` bytes of data.
pub const fn log_cost(topics: usize, data_len: usize) -> u64 {
    let len = (topics as u64 * 32).saturating_add(data_len as u64);
    len.saturating_mul(LOG_PER_BYTE_COST)
}

/* ↓↓↓ Calls ↓↓↓ */

/// Flat cost of a nested contract-to-contract call, on top of the callee's own consumption.
pub const CALL_BASE_COST: u64 = 700;

/* ↓↓↓ Cryptographic functions ↓↓↓ */

pub const CRYPTO_SHA256_PER_BYTE: u64 = 16;
pub const CRYPTO_KECCAK256_PER_BYTE: u64 = 16;
pub const CRYPTO_RIPEMD160_PER_BYTE: u64 = 16;
