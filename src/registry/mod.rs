//! Type registry for user-declared composite types
//!
//! Operators declare record types through textual signatures of the form
//! `"type1 field1; type2 field2"`. Registration parses the signature,
//! validates every referenced type, computes the record's native layout
//! once, and stores the result; every later reflective operation is then
//! O(fields) instead of re-parsing the signature.
//!
//! - [`shape`]: lexical classification of type names
//! - [`layout`]: size / alignment / offset computation

pub mod layout;
pub mod shape;

use crate::engine::errors::ValueError;
use rustc_hash::FxHashMap;
use shape::{classify, TypeShape};
use tracing::debug;

/// One field of a registered record, with its precomputed offset
#[derive(Debug, Clone)]
pub struct FieldLayout {
    pub name: String,
    pub type_name: String,
    pub offset: usize,
}

/// A registered record type
#[derive(Debug, Clone)]
pub struct TypeDefinition {
    pub name: String,
    /// Original textual declaration, kept for SHOW-style introspection
    pub signature: String,
    pub fields: Vec<FieldLayout>,
    pub size: usize,
    pub alignment: usize,
}

impl TypeDefinition {
    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&FieldLayout> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Registry of record definitions, keyed by type name
#[derive(Debug, Default)]
pub struct TypeRegistry {
    definitions: FxHashMap<String, TypeDefinition>,
}

fn is_identifier(name: &str) -> bool {
    let mut bytes = name.bytes();
    match bytes.next() {
        Some(b) if b.is_ascii_alphabetic() || b == b'_' => {}
        _ => return false,
    }
    bytes.all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a record type from its textual signature.
    ///
    /// Fails with `InvalidTypeDefinition` on an empty signature, a field
    /// definition that is not exactly `type name`, an unknown referenced
    /// type, or a duplicate registration.
    pub fn register(&mut self, name: &str, signature: &str) -> Result<(), ValueError> {
        if !is_identifier(name) || classify(name) != TypeShape::Record {
            return Err(ValueError::InvalidTypeDefinition {
                type_name: name.to_string(),
                message: "type name must be an identifier and not an atomic or array form"
                    .to_string(),
            });
        }
        if self.definitions.contains_key(name) {
            return Err(ValueError::InvalidTypeDefinition {
                type_name: name.to_string(),
                message: "type is already registered".to_string(),
            });
        }

        let mut fields: Vec<FieldLayout> = Vec::new();
        let mut offset = 0usize;
        let mut max_align = 1usize;

        for field_def in signature.split(';') {
            let field_def = field_def.trim();
            if field_def.is_empty() {
                continue;
            }

            let mut words = field_def.split_whitespace();
            let (field_type, field_name) = match (words.next(), words.next(), words.next()) {
                (Some(t), Some(n), None) => (t, n),
                _ => {
                    return Err(ValueError::InvalidTypeDefinition {
                        type_name: name.to_string(),
                        message: format!("wrong field definition: \"{field_def}\""),
                    });
                }
            };

            if !is_identifier(field_name) {
                return Err(ValueError::InvalidTypeDefinition {
                    type_name: name.to_string(),
                    message: format!("invalid field name: \"{field_name}\""),
                });
            }
            if fields.iter().any(|f| f.name == field_name) {
                return Err(ValueError::InvalidTypeDefinition {
                    type_name: name.to_string(),
                    message: format!("duplicate field name: \"{field_name}\""),
                });
            }
            self.validate_reference(name, field_type, field_def)?;

            let (field_size, field_align) = self.layout_of(field_type)?;
            offset = layout::round_up(offset, field_align);
            fields.push(FieldLayout {
                name: field_name.to_string(),
                type_name: field_type.to_string(),
                offset,
            });
            offset += field_size;
            max_align = max_align.max(field_align);
        }

        if fields.is_empty() {
            return Err(ValueError::InvalidTypeDefinition {
                type_name: name.to_string(),
                message: "signature is empty".to_string(),
            });
        }

        let size = layout::round_up(offset, max_align);
        debug!(type_name = name, size, alignment = max_align, "registered composite type");
        self.definitions.insert(
            name.to_string(),
            TypeDefinition {
                name: name.to_string(),
                signature: signature.to_string(),
                fields,
                size,
                alignment: max_align,
            },
        );
        Ok(())
    }

    /// Look up a registered record definition
    pub fn lookup(&self, name: &str) -> Option<&TypeDefinition> {
        self.definitions.get(name)
    }

    /// Iterate over all registered definitions, for SHOW-style listings
    pub fn definitions(&self) -> impl Iterator<Item = &TypeDefinition> {
        self.definitions.values()
    }

    /// Check that a referenced field type is an atomic, an array over a
    /// known type, or a previously registered record.
    fn validate_reference(
        &self,
        record: &str,
        type_name: &str,
        field_def: &str,
    ) -> Result<(), ValueError> {
        match classify(type_name) {
            TypeShape::Atomic(_) => Ok(()),
            TypeShape::FixedArray { elem, .. } | TypeShape::VarArray { elem } => {
                self.validate_reference(record, &elem, field_def)
            }
            TypeShape::Record => {
                if self.definitions.contains_key(type_name) {
                    Ok(())
                } else {
                    Err(ValueError::InvalidTypeDefinition {
                        type_name: record.to_string(),
                        message: format!(
                            "unknown type \"{type_name}\" in field definition \"{field_def}\""
                        ),
                    })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let mut reg = TypeRegistry::new();
        reg.register("node", "string name; string ip; int port").unwrap();

        let def = reg.lookup("node").unwrap();
        assert_eq!(def.fields.len(), 3);
        assert_eq!(def.field("port").unwrap().type_name, "int");
        assert!(def.field("missing").is_none());
        assert_eq!(def.signature, "string name; string ip; int port");
        assert_eq!(reg.definitions().count(), 1);
    }

    #[test]
    fn test_layout_law() {
        let mut reg = TypeRegistry::new();
        reg.register("node", "string name; string ip; int port").unwrap();
        reg.register("cluster", "string name; int size; node[10] nodes").unwrap();

        for ty in ["node", "cluster"] {
            let def = reg.lookup(ty).unwrap();
            assert_eq!(def.size % def.alignment, 0, "size law for {ty}");
            let mut prev_end = 0;
            for f in &def.fields {
                let (fsize, falign) = reg.layout_of(&f.type_name).unwrap();
                assert_eq!(f.offset % falign, 0, "offset law for {ty}.{}", f.name);
                assert!(f.offset >= prev_end, "overlap in {ty}.{}", f.name);
                prev_end = f.offset + fsize;
            }
            assert!(def.size >= prev_end);
        }
    }

    #[test]
    fn test_rejects_empty_signature() {
        let mut reg = TypeRegistry::new();
        assert!(matches!(
            reg.register("empty", "   "),
            Err(ValueError::InvalidTypeDefinition { .. })
        ));
    }

    #[test]
    fn test_rejects_malformed_field() {
        let mut reg = TypeRegistry::new();
        assert!(reg.register("bad", "int").is_err());
        assert!(reg.register("bad", "int a b").is_err());
    }

    #[test]
    fn test_rejects_unknown_reference() {
        let mut reg = TypeRegistry::new();
        assert!(reg.register("bad", "missing a").is_err());
        assert!(reg.register("bad", "missing[3] a").is_err());
    }

    #[test]
    fn test_rejects_duplicate_registration() {
        let mut reg = TypeRegistry::new();
        reg.register("point", "int x; int y").unwrap();
        assert!(reg.register("point", "int x").is_err());
    }

    #[test]
    fn test_rejects_reserved_names() {
        let mut reg = TypeRegistry::new();
        assert!(reg.register("int", "int x").is_err());
        assert!(reg.register("point[3]", "int x").is_err());
    }

    #[test]
    fn test_rejects_duplicate_field() {
        let mut reg = TypeRegistry::new();
        assert!(reg.register("bad", "int x; real x").is_err());
    }
}
