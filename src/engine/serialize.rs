//! Rendering values back to text
//!
//! Two modes. Pretty output quotes string values (the null string renders
//! as bare `nil`) and leaves other atomics plain. Wire output
//! single-quotes every atomic and doubles quotes inside strings, so the
//! result re-parses exactly.
//!
//! A variable array renders in extended form `{size: N, data: [...]}`
//! once its length reaches the engine's expand threshold, so oversized
//! arrays stay legible and resizable.

use super::errors::ValueError;
use super::CompositeEngine;
use crate::memory::heap::Heap;
use crate::memory::{Address, WORD_SIZE};
use crate::registry::shape::{classify, AtomicKind, TypeShape};
use crate::registry::TypeRegistry;

impl CompositeEngine {
    /// Render a value to text; `wire` selects the quoted, re-parseable form
    pub fn serialize(
        &self,
        value: Address,
        type_name: &str,
        wire: bool,
    ) -> Result<String, ValueError> {
        value_to_text(
            &self.registry,
            &self.heap,
            value,
            type_name,
            wire,
            self.expand_array_view_threshold,
        )
    }

    /// Upper-bound hint for the serialized length, for caller-side buffer sizing
    pub fn length_of_serialized(
        &self,
        value: Address,
        type_name: &str,
    ) -> Result<usize, ValueError> {
        serialized_len_hint(
            &self.registry,
            &self.heap,
            value,
            type_name,
            self.expand_array_view_threshold,
        )
    }
}

pub(crate) fn value_to_text(
    registry: &TypeRegistry,
    heap: &Heap,
    addr: Address,
    type_name: &str,
    wire: bool,
    expand_threshold: usize,
) -> Result<String, ValueError> {
    match classify(type_name) {
        TypeShape::Atomic(kind) => atomic_to_text(heap, addr, kind, wire),
        TypeShape::FixedArray { elem, len } => {
            let stride = registry.stride_of(&elem)?;
            let mut parts = Vec::with_capacity(len);
            for i in 0..len {
                let offset = (stride * i) as Address;
                parts.push(value_to_text(
                    registry,
                    heap,
                    addr + offset,
                    &elem,
                    wire,
                    expand_threshold,
                )?);
            }
            Ok(format!("[{}]", parts.join(", ")))
        }
        TypeShape::VarArray { elem } => {
            let len = heap.read_u64(addr + WORD_SIZE as Address)? as usize;
            let data = heap.read_u64(addr)?;
            let stride = registry.stride_of(&elem)?;
            let mut parts = Vec::with_capacity(len);
            for i in 0..len {
                let offset = (stride * i) as Address;
                parts.push(value_to_text(
                    registry,
                    heap,
                    data + offset,
                    &elem,
                    wire,
                    expand_threshold,
                )?);
            }
            let body = format!("[{}]", parts.join(", "));
            if len >= expand_threshold {
                Ok(format!("{{size: {len}, data: {body}}}"))
            } else {
                Ok(body)
            }
        }
        TypeShape::Record => {
            let def = registry
                .lookup(type_name)
                .ok_or_else(|| ValueError::Internal {
                    message: format!("no definition for type \"{type_name}\""),
                })?;
            let mut parts = Vec::with_capacity(def.fields.len());
            for field in &def.fields {
                let text = value_to_text(
                    registry,
                    heap,
                    addr + field.offset as Address,
                    &field.type_name,
                    wire,
                    expand_threshold,
                )?;
                parts.push(format!("{}: {}", field.name, text));
            }
            Ok(format!("{{{}}}", parts.join(", ")))
        }
    }
}

fn atomic_to_text(
    heap: &Heap,
    addr: Address,
    kind: AtomicKind,
    wire: bool,
) -> Result<String, ValueError> {
    let (text, quote) = match kind {
        AtomicKind::Bool => {
            let value = heap.read_u8(addr)? != 0;
            (if value { "true" } else { "false" }.to_string(), wire)
        }
        AtomicKind::Int => (heap.read_i32(addr)?.to_string(), wire),
        AtomicKind::Real => (heap.read_f64(addr)?.to_string(), wire),
        AtomicKind::Str => {
            let text = heap.read_u64(addr)?;
            if text == 0 {
                ("nil".to_string(), wire)
            } else {
                let raw = heap.read_str(text)?;
                let escaped = if wire { raw.replace('\'', "''") } else { raw };
                (escaped, true)
            }
        }
    };
    Ok(if quote { format!("'{text}'") } else { text })
}

pub(crate) fn serialized_len_hint(
    registry: &TypeRegistry,
    heap: &Heap,
    addr: Address,
    type_name: &str,
    expand_threshold: usize,
) -> Result<usize, ValueError> {
    match classify(type_name) {
        // worst case including quotes
        TypeShape::Atomic(AtomicKind::Bool) => Ok(7),
        TypeShape::Atomic(AtomicKind::Int) => Ok(13),
        TypeShape::Atomic(AtomicKind::Real) => Ok(26),
        TypeShape::Atomic(AtomicKind::Str) => {
            let text = heap.read_u64(addr)?;
            if text == 0 {
                Ok(5)
            } else {
                // every byte could be a quote that doubles
                Ok(heap.read_str(text)?.len() * 2 + 2)
            }
        }
        TypeShape::FixedArray { elem, len } => {
            let stride = registry.stride_of(&elem)?;
            let mut total = 3;
            for i in 0..len {
                let offset = (stride * i) as Address;
                total += serialized_len_hint(
                    registry,
                    heap,
                    addr + offset,
                    &elem,
                    expand_threshold,
                )? + 2;
            }
            Ok(total)
        }
        TypeShape::VarArray { elem } => {
            let len = heap.read_u64(addr + WORD_SIZE as Address)? as usize;
            let data = heap.read_u64(addr)?;
            let stride = registry.stride_of(&elem)?;
            let mut total = 3;
            if len >= expand_threshold {
                total += 30; // extended-form facade and a decimal length
            }
            for i in 0..len {
                let offset = (stride * i) as Address;
                total += serialized_len_hint(
                    registry,
                    heap,
                    data + offset,
                    &elem,
                    expand_threshold,
                )? + 2;
            }
            Ok(total)
        }
        TypeShape::Record => {
            let def = registry
                .lookup(type_name)
                .ok_or_else(|| ValueError::Internal {
                    message: format!("no definition for type \"{type_name}\""),
                })?;
            let mut total = 3;
            for field in &def.fields {
                total += serialized_len_hint(
                    registry,
                    heap,
                    addr + field.offset as Address,
                    &field.type_name,
                    expand_threshold,
                )? + field.name.len() + 4;
            }
            Ok(total)
        }
    }
}
