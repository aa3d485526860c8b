//! Structural comparison
//!
//! Values compare by content, never by pointer. Records compare field by
//! field in declaration order, arrays element by element; variable arrays
//! compare their lengths first. A null string sorts before any non-null
//! string.

use super::errors::ValueError;
use super::CompositeEngine;
use crate::memory::heap::Heap;
use crate::memory::{Address, WORD_SIZE};
use crate::registry::shape::{classify, AtomicKind, TypeShape};
use crate::registry::TypeRegistry;
use std::cmp::Ordering;

impl CompositeEngine {
    /// Compare two values of the same type structurally
    pub fn compare(
        &self,
        first: Address,
        second: Address,
        type_name: &str,
    ) -> Result<Ordering, ValueError> {
        compare_values(&self.registry, &self.heap, first, second, type_name)
    }
}

pub(crate) fn compare_values(
    registry: &TypeRegistry,
    heap: &Heap,
    first: Address,
    second: Address,
    type_name: &str,
) -> Result<Ordering, ValueError> {
    match classify(type_name) {
        TypeShape::Atomic(AtomicKind::Bool) => {
            Ok(heap.read_u8(first)?.cmp(&heap.read_u8(second)?))
        }
        TypeShape::Atomic(AtomicKind::Int) => {
            Ok(heap.read_i32(first)?.cmp(&heap.read_i32(second)?))
        }
        TypeShape::Atomic(AtomicKind::Real) => {
            Ok(heap.read_f64(first)?.total_cmp(&heap.read_f64(second)?))
        }
        TypeShape::Atomic(AtomicKind::Str) => {
            match (heap.read_u64(first)?, heap.read_u64(second)?) {
                (0, 0) => Ok(Ordering::Equal),
                (0, _) => Ok(Ordering::Less),
                (_, 0) => Ok(Ordering::Greater),
                (a, b) => Ok(heap.read_str(a)?.cmp(&heap.read_str(b)?)),
            }
        }
        TypeShape::FixedArray { elem, len } => {
            compare_elements(registry, heap, first, second, &elem, len)
        }
        TypeShape::VarArray { elem } => {
            let first_len = heap.read_u64(first + WORD_SIZE as Address)? as usize;
            let second_len = heap.read_u64(second + WORD_SIZE as Address)? as usize;
            let by_len = first_len.cmp(&second_len);
            if by_len != Ordering::Equal {
                return Ok(by_len);
            }
            if first_len == 0 {
                return Ok(Ordering::Equal);
            }
            let first_data = heap.read_u64(first)?;
            let second_data = heap.read_u64(second)?;
            compare_elements(registry, heap, first_data, second_data, &elem, first_len)
        }
        TypeShape::Record => {
            let def = registry
                .lookup(type_name)
                .ok_or_else(|| ValueError::Internal {
                    message: format!("no definition for type \"{type_name}\""),
                })?;
            for field in &def.fields {
                let offset = field.offset as Address;
                let order = compare_values(
                    registry,
                    heap,
                    first + offset,
                    second + offset,
                    &field.type_name,
                )?;
                if order != Ordering::Equal {
                    return Ok(order);
                }
            }
            Ok(Ordering::Equal)
        }
    }
}

fn compare_elements(
    registry: &TypeRegistry,
    heap: &Heap,
    first: Address,
    second: Address,
    elem: &str,
    len: usize,
) -> Result<Ordering, ValueError> {
    let stride = registry.stride_of(elem)?;
    for i in 0..len {
        let offset = (stride * i) as Address;
        let order = compare_values(registry, heap, first + offset, second + offset, elem)?;
        if order != Ordering::Equal {
            return Ok(order);
        }
    }
    Ok(Ordering::Equal)
}
