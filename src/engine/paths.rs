//! Scoped-assignment paths
//!
//! A settings write can address one leaf of a composite knob, as in
//! `cluster.nodes[1].port = 5433`. [`convert_path_to_literal`] turns such
//! a path into the composite literal that patches exactly that leaf, and
//! [`CompositeEngine::resolve_path`] follows a path through a live value
//! to the leaf's type and address. The outermost path component is the
//! setting's own name and is skipped by both.

use super::access;
use super::errors::ValueError;
use super::CompositeEngine;
use crate::memory::Address;
use crate::parser::scanner::trim;

/// Split a path on `.` and `[N]` into its components
fn tokenize(path: &str) -> Vec<&str> {
    path.split(|c| c == '.' || c == '[' || c == ']')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .collect()
}

/// Convert a leaf assignment into a composite literal.
///
/// Each path component after the first wraps the leaf in one more level:
/// components starting with a digit become array syntax (`[n: ...]`),
/// the rest record syntax (`{name: ...}`).
pub fn convert_path_to_literal(path: &str, leaf_text: &str) -> String {
    let tokens = tokenize(path);
    let mut prefix = String::new();
    let mut closers = Vec::new();

    for token in tokens.iter().skip(1) {
        if token.as_bytes()[0].is_ascii_digit() {
            prefix.push('[');
            closers.push(']');
        } else {
            prefix.push('{');
            closers.push('}');
        }
        prefix.push_str(token);
        prefix.push_str(": ");
    }

    let suffix: String = closers.iter().rev().collect();
    format!("{prefix}{leaf_text}{suffix}")
}

/// Prepare a raw command-layer assignment for the parser.
///
/// A leaf value arrives from the command layer with its quoting already
/// stripped, so it is re-quoted here (quotes doubled) before the spine is
/// built; the atomic parsers then take it verbatim. Composite text,
/// recognised by its opening delimiter, passes through untouched.
pub fn normalize_assignment(path: &str, raw_value: &str) -> String {
    let value = trim(raw_value);
    if value.starts_with('{') || value.starts_with('[') {
        convert_path_to_literal(path, value)
    } else {
        let quoted = format!("'{}'", value.replace('\'', "''"));
        convert_path_to_literal(path, &quoted)
    }
}

impl CompositeEngine {
    /// Follow a path through a value to `(leaf type, leaf address)`.
    ///
    /// Traversing a variable array past its header dereferences the data
    /// buffer, so `arr[3]` and `arr.data[3]` land on the same element.
    pub fn resolve_path(
        &self,
        root: Address,
        type_name: &str,
        path: &str,
    ) -> Result<(String, Address), ValueError> {
        let tokens = tokenize(path);
        if tokens.is_empty() {
            return Err(ValueError::UnknownField {
                type_name: type_name.to_string(),
                field: path.to_string(),
            });
        }

        let mut current_type = type_name.to_string();
        let mut current = root;
        for token in tokens.iter().skip(1) {
            let (next_type, next_addr) =
                access::step(&self.registry, &self.heap, &current_type, current, token)?;
            current_type = next_type;
            current = next_addr;
        }
        Ok((current_type, current))
    }
}
