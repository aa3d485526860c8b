//! The composite-value engine
//!
//! [`CompositeEngine`] is the facade the host's settings subsystem talks
//! to. It owns the type registry, the heap every value lives in, and the
//! serializer's expand threshold. One engine serves one settings
//! subsystem; the host serialises concurrent writers, so the mutating
//! entry points take `&mut self` and nothing here suspends.
//!
//! The reflective operations are implemented across the sibling modules,
//! each an `impl CompositeEngine` block:
//! - [`duplicate`], [`compare`], [`free`], [`serialize`]: the walkers
//! - [`access`], [`paths`]: field lookup and scoped-assignment paths
//! - [`errors`]: the [`ValueError`] type

pub mod access;
pub mod compare;
pub mod duplicate;
pub mod errors;
pub mod free;
pub mod paths;
pub mod serialize;

use crate::memory::heap::{Heap, DEFAULT_HEAP_LIMIT};
use crate::memory::Address;
use crate::parser::literal::LiteralParser;
use crate::parser::scanner::{find_same_level, trim, Scan};
use crate::registry::TypeRegistry;
use errors::ValueError;
use tracing::warn;

/// Default length at which variable arrays serialize in extended form
pub const DEFAULT_EXPAND_ARRAY_VIEW_THRESHOLD: usize = 3;

/// The engine behind composite configuration knobs
pub struct CompositeEngine {
    registry: TypeRegistry,
    heap: Heap,
    expand_array_view_threshold: usize,
}

impl CompositeEngine {
    /// Create an engine with the given heap limit in bytes
    pub fn new(heap_limit: usize) -> Self {
        CompositeEngine {
            registry: TypeRegistry::new(),
            heap: Heap::new(heap_limit),
            expand_array_view_threshold: DEFAULT_EXPAND_ARRAY_VIEW_THRESHOLD,
        }
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn expand_array_view_threshold(&self) -> usize {
        self.expand_array_view_threshold
    }

    /// Length at or above which variable arrays serialize in extended form
    pub fn set_expand_array_view_threshold(&mut self, threshold: usize) {
        self.expand_array_view_threshold = threshold;
    }

    /// Number of live heap blocks, for leak accounting
    pub fn allocated_blocks(&self) -> usize {
        self.heap.block_count()
    }

    /// Register a composite type from its textual signature
    pub fn register_type(&mut self, name: &str, signature: &str) -> Result<(), ValueError> {
        self.registry.register(name, signature)
    }

    /// Parse a textual assignment into an owned value.
    ///
    /// `previous` supplies the value being replaced; fields and elements
    /// the text does not mention keep their previous content. Text ending
    /// in `;` is a patch list: a sequence of literals or `path = value`
    /// assignments applied left to right.
    pub fn parse(
        &mut self,
        text: &str,
        type_name: &str,
        previous: Option<Address>,
    ) -> Result<Address, ValueError> {
        let value = trim(text);
        if value.ends_with(';') {
            self.parse_patch_list(value, type_name, previous)
        } else {
            self.parse_literal(value, type_name, previous)
        }
    }

    fn parse_literal(
        &mut self,
        value: &str,
        type_name: &str,
        previous: Option<Address>,
    ) -> Result<Address, ValueError> {
        let size = self.registry.size_of(type_name)?;
        let dest = self.heap.allocate(size)?;

        if let Some(previous) = previous {
            if let Err(e) =
                duplicate::duplicate_into(&self.registry, &mut self.heap, dest, previous, type_name)
            {
                let _ = free::free_value(&self.registry, &mut self.heap, dest, type_name);
                return Err(e);
            }
        }

        let mut parser = LiteralParser::new(&self.registry, &mut self.heap);
        match parser.parse_value(value, type_name, dest) {
            Ok(()) => Ok(dest),
            Err(e) => {
                warn!("in composite value: {}", value);
                let _ = free::free_value(&self.registry, &mut self.heap, dest, type_name);
                Err(e)
            }
        }
    }

    /// Apply a `;`-separated patch list. On a failing step the
    /// accumulated value rides inside [`ValueError::PatchAborted`]; the
    /// host decides whether to adopt or free it.
    fn parse_patch_list(
        &mut self,
        text: &str,
        type_name: &str,
        previous: Option<Address>,
    ) -> Result<Address, ValueError> {
        let mut accumulated = match previous {
            Some(previous) => Some(duplicate::duplicate_value(
                &self.registry,
                &mut self.heap,
                previous,
                type_name,
            )?),
            None => None,
        };

        let mut rest = text;
        let mut step = 0usize;
        while !rest.is_empty() {
            let end = match find_same_level(rest, b';') {
                Scan::Found(i) => i,
                Scan::NotFound(_) => rest.len(),
            };
            let patch = trim(&rest[..end]);

            match self.apply_patch(patch, type_name, accumulated) {
                Ok(next) => {
                    if let Some(old) = accumulated {
                        let _ = free::free_value(&self.registry, &mut self.heap, old, type_name);
                    }
                    accumulated = Some(next);
                }
                Err(cause) => {
                    warn!(patch, step, "patch list aborted");
                    return Err(ValueError::PatchAborted {
                        partial: accumulated,
                        step,
                        cause: Box::new(cause),
                    });
                }
            }

            step += 1;
            rest = if end < rest.len() {
                trim(&rest[end + 1..])
            } else {
                ""
            };
        }

        accumulated.ok_or_else(|| ValueError::InvalidLiteral {
            message: "empty patch list".to_string(),
            hint: None,
        })
    }

    /// One patch step: either `path = value` or a bare composite literal
    fn apply_patch(
        &mut self,
        patch: &str,
        type_name: &str,
        previous: Option<Address>,
    ) -> Result<Address, ValueError> {
        match find_same_level(patch, b'=') {
            Scan::Found(i) => {
                let path = trim(&patch[..i]);
                let leaf = trim(&patch[i + 1..]);
                let literal = paths::convert_path_to_literal(path, leaf);
                self.parse_literal(&literal, type_name, previous)
            }
            Scan::NotFound(_) => self.parse_literal(patch, type_name, previous),
        }
    }
}

impl Default for CompositeEngine {
    fn default() -> Self {
        Self::new(DEFAULT_HEAP_LIMIT)
    }
}
