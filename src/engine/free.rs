//! Releasing composite values
//!
//! A value owns its strings and variable-array buffers transitively.
//! [`free_aux`] walks the type and releases that auxiliary memory,
//! nulling each slot as it goes so a partially released tree is still
//! well formed; [`free_value`] then releases the root buffer.

use super::errors::ValueError;
use super::CompositeEngine;
use crate::memory::heap::Heap;
use crate::memory::{Address, WORD_SIZE};
use crate::registry::shape::{classify, AtomicKind, TypeShape};
use crate::registry::TypeRegistry;

impl CompositeEngine {
    /// Release a value and all memory it transitively owns
    pub fn free(&mut self, value: Address, type_name: &str) -> Result<(), ValueError> {
        free_value(&self.registry, &mut self.heap, value, type_name)
    }
}

pub(crate) fn free_value(
    registry: &TypeRegistry,
    heap: &mut Heap,
    value: Address,
    type_name: &str,
) -> Result<(), ValueError> {
    free_aux(registry, heap, value, type_name)?;
    heap.free(value)
}

/// Release the auxiliary memory a value owns, leaving the buffer itself
pub(crate) fn free_aux(
    registry: &TypeRegistry,
    heap: &mut Heap,
    addr: Address,
    type_name: &str,
) -> Result<(), ValueError> {
    match classify(type_name) {
        TypeShape::Atomic(AtomicKind::Str) => {
            let text = heap.read_u64(addr)?;
            if text != 0 {
                heap.free(text)?;
                heap.write_u64(addr, 0)?;
            }
            Ok(())
        }
        TypeShape::Atomic(_) => Ok(()),
        TypeShape::FixedArray { elem, len } => {
            let stride = registry.stride_of(&elem)?;
            for i in 0..len {
                free_aux(registry, heap, addr + (stride * i) as Address, &elem)?;
            }
            Ok(())
        }
        TypeShape::VarArray { elem } => {
            let data = heap.read_u64(addr)?;
            let len = heap.read_u64(addr + WORD_SIZE as Address)? as usize;
            if data != 0 {
                let stride = registry.stride_of(&elem)?;
                for i in 0..len {
                    free_aux(registry, heap, data + (stride * i) as Address, &elem)?;
                }
                heap.free(data)?;
            }
            heap.write_u64(addr, 0)?;
            heap.write_u64(addr + WORD_SIZE as Address, 0)?;
            Ok(())
        }
        TypeShape::Record => {
            let def = registry
                .lookup(type_name)
                .ok_or_else(|| ValueError::Internal {
                    message: format!("no definition for type \"{type_name}\""),
                })?;
            for field in &def.fields {
                free_aux(registry, heap, addr + field.offset as Address, &field.type_name)?;
            }
            Ok(())
        }
    }
}
