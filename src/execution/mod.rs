/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Implementation of contract execution.
//!
//! A deploy or call is [executed](execute) across [phases](phase) on a [cache] which overlays the
//! persistent state. Contracts see the block through the [block environment](block_env).

pub mod block_env;

pub mod cache;

pub mod execute;

pub mod phase;
