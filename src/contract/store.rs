/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Instantiation of the wasmer [Store] every contract is compiled and run in.
//!
//! The compiler is Singlepass with two middlewares: the [NonDeterminismFilter], then gas metering
//! with [wasm_opcode_gas_schedule]. The metering limit given here is only a placeholder; the actual
//! budget is written into each instance before it runs.

use std::convert::TryFrom;
use std::sync::Arc;
use wasmer::{BaseTunables, CompilerConfig, Pages, Store, Target, WASM_PAGE_SIZE};
use wasmer_compiler_singlepass::Singlepass;
use wasmer_engine_universal::Universal;
use wasmer_middlewares::Metering;

use super::custom_tunables::MemoryLimitTunables;
use super::non_determinism_filter::NonDeterminismFilter;
use crate::gas::wasm_opcode_gas_schedule;

/// Linear memory in WASM has at most 65536 pages of 64 KiB.
const MAX_PAGES_AVAILABLE: u32 = 65536;

pub fn instantiate_store(memory_limit: Option<usize>) -> Store {
    let nd_filter = Arc::new(NonDeterminismFilter::default());
    let metering = Arc::new(Metering::new(0, wasm_opcode_gas_schedule));

    let mut compiler_config = Singlepass::new();
    compiler_config.push_middleware(nd_filter);
    compiler_config.push_middleware(metering);
    let engine = Universal::new(compiler_config).engine();

    match memory_limit {
        Some(limit) => {
            let base_tunables = BaseTunables::for_target(&Target::default());
            let tunables = MemoryLimitTunables::new(base_tunables, limit_pages(limit));
            Store::new_with_tunables(&engine, tunables)
        }
        None => Store::new(&engine),
    }
}

/// Number of whole pages that fit in `limit` bytes, capped at the WASM maximum.
fn limit_pages(limit: usize) -> Pages {
    let pages = u32::try_from(limit / WASM_PAGE_SIZE).unwrap_or(MAX_PAGES_AVAILABLE);
    Pages(pages.min(MAX_PAGES_AVAILABLE))
}
