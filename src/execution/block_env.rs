/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Block environment available to contracts: current height and time, and hashes of past blocks.

use crate::{
    error::InterpreterError,
    state::{Backend, StateAdapter},
    types::{BlockHeader, Hash},
};

/// Read-only view of the block in which a call executes.
pub trait BlockInfo: Send + Sync {
    fn last_block_height(&self) -> u64;

    fn last_block_time(&self) -> u64;

    /// Hash of the block at `height`. Fails with `InvalidBlockNumber` if `height` is above the
    /// current height. `None` if no hash was ever recorded for that height.
    fn block_hash(&self, height: u64) -> Result<Option<Hash>, InterpreterError>;
}

/// [BlockInfo] backed by the current header and the block hash records of the store.
pub struct BlockEnvironment<B: Backend> {
    header: BlockHeader,
    adapter: StateAdapter<B>,
}

impl<B: Backend> BlockEnvironment<B> {
    pub fn new(header: BlockHeader, adapter: StateAdapter<B>) -> Self {
        Self { header, adapter }
    }
}

impl<B: Backend> BlockInfo for BlockEnvironment<B> {
    fn last_block_height(&self) -> u64 {
        self.header.height
    }

    fn last_block_time(&self) -> u64 {
        self.header.time
    }

    fn block_hash(&self, height: u64) -> Result<Option<Hash>, InterpreterError> {
        if height > self.header.height {
            return Err(InterpreterError::InvalidBlockNumber {
                requested: height,
                current: self.header.height,
            });
        }
        Ok(self.adapter.get_block_hash(height))
    }
}

/// Records the hash of the preceding block under height `header.height - 1`. Skipped at genesis
/// height and when the header carries no predecessor hash. Returns whether a record was written.
pub fn record_predecessor_hash<B: Backend>(
    adapter: &mut StateAdapter<B>,
    header: &BlockHeader,
) -> bool {
    match (header.height, header.last_block_hash) {
        (0, _) | (_, None) => false,
        (height, Some(hash)) => {
            adapter.set_block_hash(height - 1, hash);
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::MemoryBackend;

    fn header(height: u64, last_block_hash: Option<Hash>) -> BlockHeader {
        BlockHeader {
            height,
            time: 1_700_000_000,
            last_block_hash,
        }
    }

    #[test]
    fn future_block_is_invalid() {
        let env = BlockEnvironment::new(header(5, None), StateAdapter::new(MemoryBackend::new()));
        assert_eq!(
            env.block_hash(6),
            Err(InterpreterError::InvalidBlockNumber {
                requested: 6,
                current: 5
            })
        );
        assert_eq!(env.block_hash(5), Ok(None));
    }

    #[test]
    fn predecessor_hash_is_recorded() {
        let mut adapter = StateAdapter::new(MemoryBackend::new());
        assert!(!record_predecessor_hash(&mut adapter, &header(0, Some([1u8; 32]))));
        assert!(!record_predecessor_hash(&mut adapter, &header(3, None)));
        assert!(record_predecessor_hash(&mut adapter, &header(4, Some([4u8; 32]))));

        let env = BlockEnvironment::new(header(4, Some([4u8; 32])), adapter);
        assert_eq!(env.block_hash(3), Ok(Some([4u8; 32])));
        assert_eq!(env.block_hash(2), Ok(None));
        assert_eq!(env.last_block_height(), 4);
    }
}
