//! Size, alignment, and offset computation
//!
//! Atomic layouts are fixed by the value encoding (see [`crate::memory`]).
//! A fixed array is `len` elements at the element stride; a variable array
//! occupies two machine words in its container (data address, then the
//! length); a record's layout is computed at registration. The element
//! stride rounds the element size up to its alignment so that every
//! element of an array buffer stays aligned.

use super::shape::{classify, AtomicKind, TypeShape};
use super::TypeRegistry;
use crate::engine::errors::ValueError;
use crate::memory::WORD_SIZE;

/// Two machine words: data address and length
pub const VAR_ARRAY_SIZE: usize = 2 * WORD_SIZE;
pub const VAR_ARRAY_ALIGN: usize = WORD_SIZE;

pub(crate) fn round_up(size: usize, align: usize) -> usize {
    size.div_ceil(align) * align
}

pub(crate) fn atomic_layout(kind: AtomicKind) -> (usize, usize) {
    match kind {
        AtomicKind::Bool => (1, 1),
        AtomicKind::Int => (4, 4),
        AtomicKind::Real => (8, 8),
        AtomicKind::Str => (WORD_SIZE, WORD_SIZE),
    }
}

impl TypeRegistry {
    /// Size and alignment of any composite type
    pub fn layout_of(&self, type_name: &str) -> Result<(usize, usize), ValueError> {
        match classify(type_name) {
            TypeShape::Atomic(kind) => Ok(atomic_layout(kind)),
            TypeShape::VarArray { .. } => Ok((VAR_ARRAY_SIZE, VAR_ARRAY_ALIGN)),
            TypeShape::FixedArray { elem, len } => {
                let stride = self.stride_of(&elem)?;
                let (_, align) = self.layout_of(&elem)?;
                Ok((stride * len, align))
            }
            TypeShape::Record => match self.lookup(type_name) {
                Some(def) => Ok((def.size, def.alignment)),
                None => Err(ValueError::Internal {
                    message: format!("no layout for unregistered type \"{type_name}\""),
                }),
            },
        }
    }

    pub fn size_of(&self, type_name: &str) -> Result<usize, ValueError> {
        Ok(self.layout_of(type_name)?.0)
    }

    pub fn align_of(&self, type_name: &str) -> Result<usize, ValueError> {
        Ok(self.layout_of(type_name)?.1)
    }

    /// Distance between consecutive array elements of the given type
    pub fn stride_of(&self, type_name: &str) -> Result<usize, ValueError> {
        let (size, align) = self.layout_of(type_name)?;
        Ok(round_up(size, align))
    }
}
