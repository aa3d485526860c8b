//! Error types for the composite-value engine
//!
//! This module defines [`ValueError`], which covers type-registration
//! failures, literal-parse failures, reflective-walk faults, and heap
//! faults.
//!
//! Registration errors leave the registry unchanged; parse errors leave
//! the previous value untouched. A failed patch list is the one special
//! case: it carries the accumulated value built by the steps that did
//! succeed, and the host decides whether to adopt or free it.

use crate::memory::Address;
use std::fmt;

/// Errors produced by the composite-value engine
#[derive(Debug)]
pub enum ValueError {
    /// Malformed signature, unknown referenced type, or duplicate registration
    InvalidTypeDefinition { type_name: String, message: String },

    /// Malformed composite literal (wrong delimiter, bad index, unknown field, ...)
    InvalidLiteral {
        message: String,
        hint: Option<&'static str>,
    },

    /// Array index beyond the declared or given size
    IndexOutOfBounds { index: usize, size: usize },

    /// An atomic token was rejected by its value parser
    AtomicParseFailure {
        type_name: &'static str,
        value: String,
        hint: &'static str,
    },

    /// Path resolution did not find a named component
    UnknownField { type_name: String, field: String },

    /// Layout or registry inconsistency; should not fire if the registry is valid
    Internal { message: String },

    /// Out of heap memory
    OutOfMemory { requested: usize, limit: usize },

    /// Invalid heap access (freed block, overrun, unknown address)
    InvalidPointer { address: Address, message: String },

    /// A patch list failed partway; `partial` is the accumulated value so far
    PatchAborted {
        partial: Option<Address>,
        step: usize,
        cause: Box<ValueError>,
    },

    /// Positional context wrapped around a nested failure
    Context {
        frame: String,
        cause: Box<ValueError>,
    },
}

impl ValueError {
    /// Wrap this error with a positional frame such as "in field nodes"
    pub(crate) fn in_frame(self, frame: String) -> ValueError {
        ValueError::Context {
            frame,
            cause: Box::new(self),
        }
    }

    /// The innermost error, past any context frames
    pub fn root_cause(&self) -> &ValueError {
        match self {
            ValueError::Context { cause, .. } => cause.root_cause(),
            other => other,
        }
    }

    /// Human-readable hint for the host's error reporter, if one applies
    pub fn hint(&self) -> Option<&'static str> {
        match self.root_cause() {
            ValueError::InvalidLiteral { hint, .. } => *hint,
            ValueError::AtomicParseFailure { hint, .. } => Some(hint),
            ValueError::PatchAborted { cause, .. } => cause.hint(),
            _ => None,
        }
    }
}

impl fmt::Display for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueError::InvalidTypeDefinition { type_name, message } => {
                write!(f, "invalid definition of type \"{}\": {}", type_name, message)
            }
            ValueError::InvalidLiteral { message, .. } => {
                write!(f, "invalid composite literal: {}", message)
            }
            ValueError::IndexOutOfBounds { index, size } => {
                write!(f, "index {} out of bounds for array of size {}", index, size)
            }
            ValueError::AtomicParseFailure {
                type_name, value, ..
            } => {
                write!(f, "failed to parse {} value: {}", type_name, value)
            }
            ValueError::UnknownField { type_name, field } => {
                write!(f, "type \"{}\" has no field \"{}\"", type_name, field)
            }
            ValueError::Internal { message } => {
                write!(f, "internal error: {}", message)
            }
            ValueError::OutOfMemory { requested, limit } => {
                write!(
                    f,
                    "out of memory: requested {} bytes, limit is {}",
                    requested, limit
                )
            }
            ValueError::InvalidPointer { address, message } => {
                write!(f, "invalid pointer 0x{:x}: {}", address, message)
            }
            ValueError::PatchAborted { step, cause, .. } => {
                write!(f, "patch list aborted at step {}: {}", step, cause)
            }
            ValueError::Context { frame, cause } => {
                write!(f, "{}: {}", frame, cause)
            }
        }
    }
}

impl std::error::Error for ValueError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ValueError::Context { cause, .. } | ValueError::PatchAborted { cause, .. } => {
                Some(cause.as_ref())
            }
            _ => None,
        }
    }
}
