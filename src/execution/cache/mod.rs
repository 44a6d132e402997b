/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Modules for data caching during execution.
//!
//! Includes:
//! - `change_cache`: the speculative overlay through which every read and write of a call goes.
//! - `state_access`: the object-safe view of the overlay that interpreters are handed.

pub mod change_cache;
pub use change_cache::*;

pub mod state_access;
pub use state_access::*;
