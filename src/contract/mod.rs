/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Execution of WASM contracts with wasmer.

pub mod cache;
pub use cache::Cache;

pub(crate) mod custom_tunables;

pub(crate) mod env;

pub(crate) mod host_functions;
pub use host_functions::FuncError;

pub(crate) mod instance;
pub use instance::{CONTRACT_METHOD, INIT_METHOD};

pub mod interpreter;
pub use interpreter::WasmInterpreter;

pub(crate) mod memory;

pub(crate) mod module;

pub mod non_determinism_filter;

pub(crate) mod store;
