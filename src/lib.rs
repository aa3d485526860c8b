//! # Introduction
//!
//! `compval` is the dynamic composite-value engine behind a database
//! server's structured configuration knobs. Operators declare record
//! types with typed named fields, fixed-length arrays, and
//! variable-length arrays; the engine parses textual assignments into
//! native in-memory layouts, serializes them back, compares, deep-copies,
//! patches them through path assignments (`cluster.nodes[1].port =
//! 5433`), and releases their transitively owned memory.
//!
//! ## Write pipeline
//!
//! ```text
//! Text → Scanner → Literal parser → Heap buffer → swap by host
//!                      ↑ offsets
//!        Registry → Layout
//! ```
//!
//! 1. [`registry`] — interns type definitions and computes each record's
//!    field offsets, size, and alignment once at registration.
//! 2. [`parser`] — bracket-aware scanning, atomic-value parsers, and the
//!    recursive-descent composite-literal parser.
//! 3. [`memory`] — the virtual heap values live in: zero-filled byte
//!    blocks behind 64-bit addresses, with address 0 as the null string.
//! 4. [`engine`] — the [`CompositeEngine`] facade and the reflective
//!    walkers (serialize, duplicate, compare, free, path resolution).
//!
//! ## Value semantics
//!
//! Parsing has patch semantics against the previous value: untouched
//! fields and elements carry over, and a parse failure leaves the
//! previous value untouched. A returned value is owned by the caller and
//! owns its strings and variable-array buffers transitively.

pub mod engine;
pub mod memory;
pub mod parser;
pub mod registry;

pub use engine::errors::ValueError;
pub use engine::paths::{convert_path_to_literal, normalize_assignment};
pub use engine::CompositeEngine;
pub use memory::Address;
