//! Memory model for composite values
//!
//! Composite values live in an address-keyed virtual heap rather than in
//! native process memory:
//! - [`heap`]: zero-filled byte blocks looked up by [`Address`], with an
//!   allocation limit and little-endian scalar accessors
//!
//! # Value encoding
//!
//! The engine uses fixed, platform-independent sizes:
//! - `bool`: 1 byte (0 or 1)
//! - `int`: 4 bytes (`i32`, little-endian)
//! - `real`: 8 bytes (`f64`, little-endian)
//! - `string`: 8 bytes (the [`Address`] of an owned text block; 0 is the
//!   null string)
//! - variable array: 16 bytes (data [`Address`], then the length as a
//!   64-bit integer)
//!
//! Address 0 is never handed out by the heap, so it doubles as the null
//! sentinel for strings and empty variable-array buffers.

pub mod heap;

/// Memory address type (64-bit)
pub type Address = u64;

/// Size of one machine word in the value encoding
pub const WORD_SIZE: usize = 8;
