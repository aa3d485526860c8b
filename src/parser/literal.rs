//! Recursive-descent parser for composite literals
//!
//! [`LiteralParser`] writes parsed values directly into heap buffers at
//! the offsets the registry computed. The destination buffer must hold a
//! well-formed value already (zero-filled counts: every slot is then a
//! null string, zero scalar, or empty variable array), because parsing
//! has patch semantics — fields and elements the literal does not mention
//! keep what the buffer held, and slots that are overwritten release the
//! memory they owned first.
//!
//! Arrays accept either all-indexed or all-positional elements. Variable
//! arrays additionally accept the extended form
//! `{size: N, data: [...]}`, which can resize without supplying data.

use super::atomics;
use super::scanner::{find_same_level, split_top_level, trim, Scan};
use crate::engine::errors::ValueError;
use crate::engine::free::free_aux;
use crate::memory::heap::Heap;
use crate::memory::{Address, WORD_SIZE};
use crate::registry::shape::{classify, AtomicKind, TypeShape};
use crate::registry::{TypeDefinition, TypeRegistry};
use tracing::warn;

pub(crate) struct LiteralParser<'a> {
    registry: &'a TypeRegistry,
    heap: &'a mut Heap,
}

fn atomic_failure(kind: AtomicKind, value: &str, hint: &'static str) -> ValueError {
    warn!(value, type_name = kind.name(), "failed to parse atomic value");
    ValueError::AtomicParseFailure {
        type_name: kind.name(),
        value: value.to_string(),
        hint,
    }
}

/// Check the opening delimiter and find its matching close.
/// Returns the byte position of the close symbol.
fn check_delims(text: &str, open: u8, close: u8) -> Result<usize, ValueError> {
    if text.as_bytes().first() != Some(&open) {
        warn!(value = text, "composite value starts with the wrong symbol");
        return Err(ValueError::InvalidLiteral {
            message: format!("composite value starts with the wrong symbol: {text}"),
            hint: Some("records start with '{', arrays with '['"),
        });
    }
    match find_same_level(&text[1..], close) {
        Scan::Found(i) => {
            let pos = 1 + i;
            if trim(&text[pos + 1..]).is_empty() {
                Ok(pos)
            } else {
                Err(ValueError::InvalidLiteral {
                    message: format!("unexpected text after the closing delimiter: {text}"),
                    hint: None,
                })
            }
        }
        Scan::NotFound(_) => {
            warn!(value = text, "composite value has no matching close symbol");
            Err(ValueError::InvalidLiteral {
                message: format!("composite value has no matching close symbol: {text}"),
                hint: None,
            })
        }
    }
}

/// Split an array element into its optional `index:` prefix and the value
fn split_index(piece: &str) -> Result<(Option<usize>, &str), ValueError> {
    let colon = match find_same_level(piece, b':') {
        Scan::Found(i) => i,
        Scan::NotFound(_) => return Ok((None, piece)),
    };
    let raw = trim(&piece[..colon]);
    if raw.is_empty() {
        return Err(ValueError::InvalidLiteral {
            message: "empty array index".to_string(),
            hint: Some("set a number before ':' or do not use ':'"),
        });
    }
    if !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValueError::InvalidLiteral {
            message: format!("incorrect array index: {raw}"),
            hint: Some("array index must be a number >= 0"),
        });
    }
    let index = raw.parse::<usize>().map_err(|_| ValueError::InvalidLiteral {
        message: format!("incorrect array index: {raw}"),
        hint: Some("array index must be a number >= 0"),
    })?;
    Ok((Some(index), &piece[colon + 1..]))
}

/// Split a record field into its `name:` prefix and the value
fn split_name(piece: &str) -> Result<(&str, &str), ValueError> {
    let colon = match find_same_level(piece, b':') {
        Scan::Found(i) => i,
        Scan::NotFound(_) => {
            return Err(ValueError::InvalidLiteral {
                message: format!("field has no name: {}", trim(piece)),
                hint: Some("give a name to every field"),
            });
        }
    };
    let name = trim(&piece[..colon]);
    if name.is_empty() {
        return Err(ValueError::InvalidLiteral {
            message: "empty field name".to_string(),
            hint: Some("set a name before ':'"),
        });
    }
    Ok((name, &piece[colon + 1..]))
}

/// Enforce the all-or-none index rule and compute the maximum effective
/// index over the elements.
fn max_effective_index(pieces: &[&str]) -> Result<usize, ValueError> {
    let mut uses_indexes: Option<bool> = None;
    let mut next = 0usize;
    let mut max = 0usize;

    for piece in pieces {
        let (index, _) = split_index(piece)?;
        match uses_indexes {
            None => uses_indexes = Some(index.is_some()),
            Some(expected) if expected != index.is_some() => {
                warn!("array mixes indexed and positional elements");
                return Err(ValueError::InvalidLiteral {
                    message: "array mixes indexed and positional elements".to_string(),
                    hint: Some("give an index to every element or to none"),
                });
            }
            Some(_) => {}
        }
        let effective = index.unwrap_or(next);
        max = max.max(effective);
        next = effective + 1;
    }
    Ok(max)
}

impl<'a> LiteralParser<'a> {
    pub(crate) fn new(registry: &'a TypeRegistry, heap: &'a mut Heap) -> Self {
        LiteralParser { registry, heap }
    }

    /// Parse one (trimmed) value of the given type into `dest`
    pub(crate) fn parse_value(
        &mut self,
        text: &str,
        type_name: &str,
        dest: Address,
    ) -> Result<(), ValueError> {
        match classify(type_name) {
            TypeShape::Atomic(kind) => self.parse_atomic(text, kind, dest),
            TypeShape::FixedArray { elem, len } => self.parse_fixed_array(text, &elem, len, dest),
            TypeShape::VarArray { elem } => {
                if text.starts_with('{') {
                    self.parse_var_array_extended(text, &elem, dest)
                } else {
                    self.parse_var_array_short(text, &elem, dest)
                }
            }
            TypeShape::Record => {
                let registry = self.registry;
                let def = registry
                    .lookup(type_name)
                    .ok_or_else(|| ValueError::Internal {
                        message: format!("no definition for type \"{type_name}\""),
                    })?;
                self.parse_record(text, def, dest)
            }
        }
    }

    fn parse_atomic(
        &mut self,
        text: &str,
        kind: AtomicKind,
        dest: Address,
    ) -> Result<(), ValueError> {
        let unquoted;
        let token: &str = if text.starts_with('\'') {
            unquoted = atomics::unquote(text).map_err(|hint| atomic_failure(kind, text, hint))?;
            &unquoted
        } else {
            text
        };

        match kind {
            AtomicKind::Bool => {
                let value = atomics::parse_bool(token)
                    .ok_or_else(|| atomic_failure(kind, text, "use 'on' or 'off'"))?;
                self.heap.write_u8(dest, value as u8)
            }
            AtomicKind::Int => {
                let value =
                    atomics::parse_int(token).map_err(|hint| atomic_failure(kind, text, hint))?;
                self.heap.write_i32(dest, value)
            }
            AtomicKind::Real => {
                let value =
                    atomics::parse_real(token).map_err(|hint| atomic_failure(kind, text, hint))?;
                self.heap.write_f64(dest, value)
            }
            AtomicKind::Str => {
                // Release whatever text the slot owned before rebinding it.
                let old = self.heap.read_u64(dest)?;
                if old != 0 {
                    self.heap.free(old)?;
                    self.heap.write_u64(dest, 0)?;
                }
                if token != "nil" {
                    let text_addr = self.heap.alloc_str(token)?;
                    self.heap.write_u64(dest, text_addr)?;
                }
                Ok(())
            }
        }
    }

    fn parse_fixed_array(
        &mut self,
        text: &str,
        elem: &str,
        len: usize,
        dest: Address,
    ) -> Result<(), ValueError> {
        let close = check_delims(text, b'[', b']')?;
        let inner = &text[1..close];
        if trim(inner).is_empty() {
            return Ok(());
        }

        let pieces = split_top_level(inner, b',');
        let max = max_effective_index(&pieces)?;
        if max >= len {
            warn!(index = max, size = len, "index out of bounds in fixed array");
            return Err(ValueError::IndexOutOfBounds { index: max, size: len });
        }
        self.parse_elements(&pieces, elem, dest)
    }

    fn parse_var_array_short(
        &mut self,
        text: &str,
        elem: &str,
        dest: Address,
    ) -> Result<(), ValueError> {
        let close = check_delims(text, b'[', b']')?;
        let inner = &text[1..close];
        if trim(inner).is_empty() {
            return Ok(());
        }

        let pieces = split_top_level(inner, b',');
        let max = max_effective_index(&pieces)?;
        let prev_len = self.read_var_len(dest)?;
        let new_len = (max + 1).max(prev_len);

        let data = self.resize_var_buffer(dest, elem, new_len)?;
        self.parse_elements(&pieces, elem, data)
    }

    /// Extended variable-array form: `{size: N, data: [...]}`, fields in
    /// either order, at most these two.
    fn parse_var_array_extended(
        &mut self,
        text: &str,
        elem: &str,
        dest: Address,
    ) -> Result<(), ValueError> {
        let close = check_delims(text, b'{', b'}')?;
        let inner = &text[1..close];
        let no_fields = || ValueError::InvalidLiteral {
            message: "extended array has neither a size nor a data field".to_string(),
            hint: Some("give a 'size' field, a 'data' field, or both"),
        };
        if trim(inner).is_empty() {
            return Err(no_fields());
        }

        let pieces = split_top_level(inner, b',');
        let mut size_text: Option<&str> = None;
        let mut data_text: Option<&str> = None;
        for piece in &pieces {
            let (name, value) = split_name(piece)?;
            let slot = match name {
                "size" => &mut size_text,
                "data" => &mut data_text,
                other => {
                    warn!(field = other, "excess field in extended array");
                    return Err(ValueError::InvalidLiteral {
                        message: format!("excess field \"{other}\" in extended array"),
                        hint: Some("an extended array takes only 'data' and 'size' fields"),
                    });
                }
            };
            if slot.is_some() {
                return Err(ValueError::InvalidLiteral {
                    message: format!("field \"{name}\" appears twice in extended array"),
                    hint: None,
                });
            }
            *slot = Some(value);
        }

        let explicit_len = match size_text {
            Some(value) => Some(self.parse_size_field(trim(value))?),
            None => None,
        };

        // (element pieces, max effective index) when data is present
        let data_info = match data_text {
            Some(value) => {
                let value = trim(value);
                let dclose = check_delims(value, b'[', b']')
                    .map_err(|e| e.in_frame("in field data".to_string()))?;
                let dinner = &value[1..dclose];
                if trim(dinner).is_empty() {
                    Some((Vec::new(), None))
                } else {
                    let dpieces = split_top_level(dinner, b',');
                    let max = max_effective_index(&dpieces)
                        .map_err(|e| e.in_frame("in field data".to_string()))?;
                    Some((dpieces, Some(max)))
                }
            }
            None => None,
        };

        let prev_len = self.read_var_len(dest)?;
        let new_len = match (explicit_len, &data_info) {
            (Some(size), Some((_, Some(max)))) if *max >= size => {
                warn!(index = *max, size, "index out of bounds in extended array");
                return Err(ValueError::IndexOutOfBounds { index: *max, size });
            }
            (Some(size), _) => size,
            (None, Some((_, Some(max)))) => (max + 1).max(prev_len),
            (None, Some((_, None))) => prev_len,
            (None, None) => return Err(no_fields()),
        };

        let data = self.resize_var_buffer(dest, elem, new_len)?;
        if let Some((pieces, _)) = data_info {
            if !pieces.is_empty() {
                self.parse_elements(&pieces, elem, data)
                    .map_err(|e| e.in_frame("in field data".to_string()))?;
            }
        }
        Ok(())
    }

    fn parse_record(
        &mut self,
        text: &str,
        def: &TypeDefinition,
        dest: Address,
    ) -> Result<(), ValueError> {
        let close = check_delims(text, b'{', b'}')?;
        let inner = &text[1..close];
        if trim(inner).is_empty() {
            return Ok(());
        }

        for piece in split_top_level(inner, b',') {
            let (name, value) = split_name(piece)?;
            let field = match def.field(name) {
                Some(field) => field,
                None => {
                    warn!(type_name = %def.name, field = name, "invalid field name");
                    return Err(ValueError::InvalidLiteral {
                        message: format!("type \"{}\" has no field \"{}\"", def.name, name),
                        hint: Some("field names must match the type signature"),
                    });
                }
            };
            self.parse_value(trim(value), &field.type_name, dest + field.offset as Address)
                .map_err(|e| {
                    warn!("in field {}", name);
                    e.in_frame(format!("in field {name}"))
                })?;
        }
        Ok(())
    }

    fn parse_elements(
        &mut self,
        pieces: &[&str],
        elem: &str,
        base: Address,
    ) -> Result<(), ValueError> {
        let stride = self.registry.stride_of(elem)?;
        let mut next = 0usize;
        for piece in pieces {
            let (given, value) = split_index(piece)?;
            let index = given.unwrap_or(next);
            next = index + 1;
            self.parse_value(trim(value), elem, base + (stride * index) as Address)
                .map_err(|e| {
                    warn!("in element {}", index);
                    e.in_frame(format!("in element {index}"))
                })?;
        }
        Ok(())
    }

    /// Parse the `size:` value of the extended form through the regular
    /// atomic machinery (so quoting and units behave as everywhere else).
    fn parse_size_field(&mut self, text: &str) -> Result<usize, ValueError> {
        let scratch = self.heap.allocate(4)?;
        let parsed = self
            .parse_atomic(text, AtomicKind::Int, scratch)
            .map_err(|e| e.in_frame("in field size".to_string()));
        let size = match parsed {
            Ok(()) => self.heap.read_i32(scratch)?,
            Err(e) => {
                let _ = self.heap.free(scratch);
                return Err(e);
            }
        };
        self.heap.free(scratch)?;
        if size < 0 {
            return Err(ValueError::InvalidLiteral {
                message: format!("negative array size: {size}"),
                hint: Some("array size must be >= 0"),
            });
        }
        Ok(size as usize)
    }

    fn read_var_len(&self, dest: Address) -> Result<usize, ValueError> {
        Ok(self.heap.read_u64(dest + WORD_SIZE as Address)? as usize)
    }

    /// Re-allocate a variable array's buffer for `new_len` elements,
    /// moving the old contents (ownership of strings and nested buffers
    /// transfers bytewise), zeroing grown space, and releasing what a
    /// shrink truncates.
    fn resize_var_buffer(
        &mut self,
        dest: Address,
        elem: &str,
        new_len: usize,
    ) -> Result<Address, ValueError> {
        let stride = self.registry.stride_of(elem)?;
        let old_data = self.heap.read_u64(dest)?;
        let old_len = self.read_var_len(dest)?;

        if new_len < old_len && old_data != 0 {
            for i in new_len..old_len {
                free_aux(
                    self.registry,
                    self.heap,
                    old_data + (stride * i) as Address,
                    elem,
                )?;
            }
        }

        let new_data = if new_len == 0 {
            0
        } else {
            let buf = self.heap.allocate(stride * new_len)?;
            let keep = stride * old_len.min(new_len);
            if keep > 0 {
                let bytes = self.heap.read_bytes(old_data, keep)?;
                self.heap.write_bytes(buf, &bytes)?;
            }
            buf
        };

        if old_data != 0 {
            self.heap.free(old_data)?;
        }
        self.heap.write_u64(dest, new_data)?;
        self.heap.write_u64(dest + WORD_SIZE as Address, new_len as u64)?;
        Ok(new_data)
    }
}
