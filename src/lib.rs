/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! cvm-runtime is a contract execution engine embedded in a host chain. It runs EVM-style and
//! WASM-style bytecode against an account store whose balances live in the host's ledger.
//!
//! ```text
//! Resolve Callee -> Charge Gas -> Interpret -> Settle -> Commit | Abort
//! ```
//!
//! ### Example
//!
//! ```rust
//! let runtime = cvm_runtime::Runtime::new().set_evm_interpreter(evm);
//! let result = runtime.call(backend, header, &params, request, &mut host_gas, &mut events);
//! ```
//!
//! Every call runs on its own [change cache](execution::cache::ChangeCache) over the
//! [state adapter](state::StateAdapter); nothing reaches the host's [store](state::Backend) unless
//! the call succeeds. Gas is converted between host and engine units by the [gas] module. EVM
//! bytecode is run by a host supplied [Interpreter]; WASM bytecode by the built-in [contract]
//! interpreter on [wasmer]. Failures surface as an [error::ExecutionError] with a stable numeric code.

pub mod contract;
pub use contract::{Cache, WasmInterpreter};

pub mod error;
pub use error::{CodedError, ErrorCode, ExecutionError};

pub mod execution;
pub use execution::execute::{CallRequest, DeployRequest, ExecutionResult};
pub use execution::phase::Settlement;

pub mod gas;

pub mod genesis;
pub use genesis::GenesisState;

pub mod interpreter;
pub use interpreter::{CallContext, Dispatcher, EventSink, Interpreter};

pub mod params;
pub use params::Params;

pub mod runtime;
pub use runtime::Runtime;

pub mod state;

pub mod types;
