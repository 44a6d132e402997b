/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Read and write access to the linear memory of a running contract.
//!
//! Variable-length outputs are written into a segment the contract allocates through its exported
//! `alloc` function; the offset of the segment is stored at a pointer the contract passes in
//! (arguments suffixed `_ptr_ptr`). Fixed-length outputs are written directly at a pointer the
//! contract passes in (arguments suffixed `_ptr`).

use anyhow::{anyhow, Result};
use wasmer::{Array, Memory, NativeFunc, WasmPtr};

pub trait MemoryContext {
    fn get_memory(&self) -> Result<&Memory>;

    fn get_alloc(&self) -> Result<&NativeFunc<u32, WasmPtr<u8, Array>>>;

    /// Copies `len` bytes at `offset` out of guest memory.
    fn read_bytes(&self, offset: u32, len: u32) -> Result<Vec<u8>> {
        let memory = self.get_memory()?;
        let cells = WasmPtr::<u8, Array>::new(offset)
            .deref(memory, 0, len)
            .ok_or_else(|| anyhow!("read of {} bytes at {} is out of bounds", len, offset))?;
        Ok(cells.iter().map(|cell| cell.get()).collect())
    }

    /// Writes `value` at `offset` in guest memory.
    fn write_bytes_at(&self, value: &[u8], offset: u32) -> Result<()> {
        let memory = self.get_memory()?;
        let cells = WasmPtr::<u8, Array>::new(offset)
            .deref(memory, 0, value.len() as u32)
            .ok_or_else(|| anyhow!("write of {} bytes at {} is out of bounds", value.len(), offset))?;
        for (cell, byte) in cells.iter().zip(value) {
            cell.set(*byte);
        }
        Ok(())
    }

    /// Allocates a guest segment for `value`, copies it in, and stores the segment's offset at
    /// `val_ptr_ptr`. Returns the length of `value`.
    fn write_bytes(&self, value: &[u8], val_ptr_ptr: u32) -> Result<u32> {
        let segment_ptr = self
            .get_alloc()?
            .call(value.len() as u32)
            .map_err(|e| anyhow!("fail to allocate linear memory: {}", e))?;
        self.write_bytes_at(value, segment_ptr.offset())?;
        self.write_bytes_at(&segment_ptr.offset().to_le_bytes(), val_ptr_ptr)?;
        Ok(value.len() as u32)
    }
}
