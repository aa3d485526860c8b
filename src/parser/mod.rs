//! Composite-literal text parsing
//!
//! This module turns the textual form of a composite value into bytes in
//! the engine's heap:
//! - [`scanner`]: bracket-aware scanning (find a delimiter at the current
//!   nesting level, honouring single-quoted strings)
//! - [`atomics`]: value parsers for `bool`, `int` (with memory units),
//!   `real`, and quoted-string de-escaping
//! - [`literal`]: the recursive-descent parser over composite literals
//!
//! # Grammar
//!
//! ```text
//! value  := atomic | array | record
//! record := '{' [ field (',' field)* ] '}'
//! field  := name ':' value
//! array  := '[' [ elem (',' elem)* ] ']'
//! elem   := [ uint ':' ] value            -- indexes all-or-none
//! extArr := '{' extField (',' extField)* '}'   -- variable arrays only
//! extField := ('data' ':' array) | ('size' ':' int)
//! ```
//!
//! Hand-written recursive descent over `&str` slices; the parser never
//! mutates its input. Insignificant whitespace is space, tab, vertical
//! tab, and newline. Comments are not supported.

pub mod atomics;
pub mod literal;
pub mod scanner;
