/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The state layer translates the engine's account and storage model onto the host's persistent
//! key-value [store](backend::KvStore), [ledger](backend::Ledger) and
//! [account directory](backend::AccountDirectory).
//!
//! The [key space](keys) assigns one prefix byte per record category. The [adapter] is the only
//! component which reads or writes those keys. An in-[memory] backend is provided for tooling and tests.

pub mod backend;
pub use backend::*;

pub mod keys;

pub mod adapter;
pub use adapter::*;

pub mod memory;
pub use memory::MemoryBackend;
