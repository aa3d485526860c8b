//! Field lookup: one step of path resolution
//!
//! Given a value's type and address, [`step`] resolves one path component
//! to the component's type and address. Records resolve by field name and
//! arrays by decimal index. A variable array exposes two header keys:
//! `data` resolves to the array itself at offset 0 (so resolution can
//! recurse through it) and `size` to an `int` one word in; a bare index
//! dereferences the data buffer.

use super::errors::ValueError;
use crate::memory::heap::Heap;
use crate::memory::{Address, WORD_SIZE};
use crate::parser::scanner::trim;
use crate::registry::shape::{classify, TypeShape};
use crate::registry::TypeRegistry;

/// Parse a path component as a decimal array index
pub(crate) fn canonical_index(token: &str) -> Option<usize> {
    let token = trim(token);
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

/// Resolve one path component to `(component type, component address)`
pub(crate) fn step(
    registry: &TypeRegistry,
    heap: &Heap,
    type_name: &str,
    addr: Address,
    field: &str,
) -> Result<(String, Address), ValueError> {
    let unknown = || ValueError::UnknownField {
        type_name: type_name.to_string(),
        field: field.to_string(),
    };

    match classify(type_name) {
        TypeShape::Atomic(_) => Err(unknown()),
        TypeShape::FixedArray { elem, len } => {
            let index = canonical_index(field).ok_or_else(unknown)?;
            if index >= len {
                return Err(unknown());
            }
            let stride = registry.stride_of(&elem)?;
            Ok((elem, addr + (stride * index) as Address))
        }
        TypeShape::VarArray { elem } => {
            if field == "data" {
                return Ok((type_name.to_string(), addr));
            }
            if field == "size" {
                return Ok(("int".to_string(), addr + WORD_SIZE as Address));
            }
            let index = canonical_index(field).ok_or_else(unknown)?;
            let len = heap.read_u64(addr + WORD_SIZE as Address)? as usize;
            if index >= len {
                return Err(unknown());
            }
            let data = heap.read_u64(addr)?;
            if data == 0 {
                return Err(unknown());
            }
            let stride = registry.stride_of(&elem)?;
            Ok((elem, data + (stride * index) as Address))
        }
        TypeShape::Record => {
            let def = registry
                .lookup(type_name)
                .ok_or_else(|| ValueError::Internal {
                    message: format!("no definition for type \"{type_name}\""),
                })?;
            let field_layout = def.field(field).ok_or_else(unknown)?;
            Ok((
                field_layout.type_name.clone(),
                addr + field_layout.offset as Address,
            ))
        }
    }
}
