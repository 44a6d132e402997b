/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Tunables which cap the linear memory a contract may declare or grow into.

use loupe::MemoryUsage;
use std::ptr::NonNull;
use std::sync::Arc;
use wasmer::{
    vm::{self, MemoryError, MemoryStyle, TableStyle, VMMemoryDefinition, VMTableDefinition},
    MemoryType, Pages, TableType, Tunables,
};

/// MemoryLimitTunables wraps base tunables. Memories without a declared maximum get `limit` as
/// their maximum; memories declaring more than `limit` are refused.
#[derive(MemoryUsage)]
pub struct MemoryLimitTunables<T: Tunables> {
    limit: Pages,
    base: T,
}

impl<T: Tunables> MemoryLimitTunables<T> {
    pub fn new(base: T, limit: Pages) -> Self {
        Self { limit, base }
    }

    fn limited(&self, requested: &MemoryType) -> Result<MemoryType, MemoryError> {
        let mut memory = *requested;
        let maximum = *memory.maximum.get_or_insert(self.limit);
        if memory.minimum > self.limit || maximum > self.limit {
            return Err(MemoryError::Generic(format!(
                "memory of {:?}..{:?} exceeds the limit of {:?}",
                memory.minimum, maximum, self.limit
            )));
        }
        Ok(memory)
    }
}

impl<T: Tunables> Tunables for MemoryLimitTunables<T> {
    fn memory_style(&self, memory: &MemoryType) -> MemoryStyle {
        let mut adjusted = *memory;
        adjusted.maximum.get_or_insert(self.limit);
        self.base.memory_style(&adjusted)
    }

    fn table_style(&self, table: &TableType) -> TableStyle {
        self.base.table_style(table)
    }

    fn create_host_memory(
        &self,
        ty: &MemoryType,
        style: &MemoryStyle,
    ) -> Result<Arc<dyn vm::Memory>, MemoryError> {
        self.base.create_host_memory(&self.limited(ty)?, style)
    }

    unsafe fn create_vm_memory(
        &self,
        ty: &MemoryType,
        style: &MemoryStyle,
        vm_definition_location: NonNull<VMMemoryDefinition>,
    ) -> Result<Arc<dyn vm::Memory>, MemoryError> {
        self.base
            .create_vm_memory(&self.limited(ty)?, style, vm_definition_location)
    }

    fn create_host_table(
        &self,
        ty: &TableType,
        style: &TableStyle,
    ) -> Result<Arc<dyn vm::Table>, String> {
        self.base.create_host_table(ty, style)
    }

    unsafe fn create_vm_table(
        &self,
        ty: &TableType,
        style: &TableStyle,
        vm_definition_location: NonNull<VMTableDefinition>,
    ) -> Result<Arc<dyn vm::Table>, String> {
        self.base.create_vm_table(ty, style, vm_definition_location)
    }
}
