//! Structural deep copy
//!
//! Duplication re-allocates every owned string and every variable-array
//! buffer, so the copy never aliases the source. The destination of
//! [`duplicate_into`] must not own anything (a fresh zero-filled buffer
//! does not).

use super::errors::ValueError;
use super::free::free_value;
use super::CompositeEngine;
use crate::memory::heap::Heap;
use crate::memory::{Address, WORD_SIZE};
use crate::registry::layout::atomic_layout;
use crate::registry::shape::{classify, AtomicKind, TypeShape};
use crate::registry::TypeRegistry;

impl CompositeEngine {
    /// Deep-copy a value into a newly allocated buffer
    pub fn duplicate(&mut self, value: Address, type_name: &str) -> Result<Address, ValueError> {
        duplicate_value(&self.registry, &mut self.heap, value, type_name)
    }
}

pub(crate) fn duplicate_value(
    registry: &TypeRegistry,
    heap: &mut Heap,
    source: Address,
    type_name: &str,
) -> Result<Address, ValueError> {
    let size = registry.size_of(type_name)?;
    let dest = heap.allocate(size)?;
    if let Err(e) = duplicate_into(registry, heap, dest, source, type_name) {
        let _ = free_value(registry, heap, dest, type_name);
        return Err(e);
    }
    Ok(dest)
}

pub(crate) fn duplicate_into(
    registry: &TypeRegistry,
    heap: &mut Heap,
    dest: Address,
    source: Address,
    type_name: &str,
) -> Result<(), ValueError> {
    match classify(type_name) {
        TypeShape::Atomic(AtomicKind::Str) => {
            let text = heap.read_u64(source)?;
            if text == 0 {
                heap.write_u64(dest, 0)
            } else {
                let copy = heap.read_str(text)?;
                let copy_addr = heap.alloc_str(&copy)?;
                heap.write_u64(dest, copy_addr)
            }
        }
        TypeShape::Atomic(kind) => {
            let (size, _) = atomic_layout(kind);
            let bytes = heap.read_bytes(source, size)?;
            heap.write_bytes(dest, &bytes)
        }
        TypeShape::FixedArray { elem, len } => {
            let stride = registry.stride_of(&elem)?;
            for i in 0..len {
                let offset = (stride * i) as Address;
                duplicate_into(registry, heap, dest + offset, source + offset, &elem)?;
            }
            Ok(())
        }
        TypeShape::VarArray { elem } => {
            let len = heap.read_u64(source + WORD_SIZE as Address)? as usize;
            if len == 0 {
                heap.write_u64(dest, 0)?;
                heap.write_u64(dest + WORD_SIZE as Address, 0)?;
                return Ok(());
            }
            let data = heap.read_u64(source)?;
            let stride = registry.stride_of(&elem)?;
            let copy = heap.allocate(stride * len)?;
            heap.write_u64(dest, copy)?;
            heap.write_u64(dest + WORD_SIZE as Address, len as u64)?;
            for i in 0..len {
                let offset = (stride * i) as Address;
                duplicate_into(registry, heap, copy + offset, data + offset, &elem)?;
            }
            Ok(())
        }
        TypeShape::Record => {
            let def = registry
                .lookup(type_name)
                .ok_or_else(|| ValueError::Internal {
                    message: format!("no definition for type \"{type_name}\""),
                })?;
            for field in &def.fields {
                let offset = field.offset as Address;
                duplicate_into(registry, heap, dest + offset, source + offset, &field.type_name)?;
            }
            Ok(())
        }
    }
}
