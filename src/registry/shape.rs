//! Lexical classification of type names
//!
//! A type name is one of four shapes, recognised without consulting the
//! registry:
//! - atomic: `bool`, `int`, `real`, `string`
//! - fixed array: `Base[N]` with `N >= 1`
//! - variable array: `Base[]` or `Base[0]`
//! - record: anything else (must be registered)
//!
//! The element name of an array is the name with its first `[...]` group
//! removed, prefix and suffix concatenated, so `node[10]` has element
//! `node` and `int[3][]` is a fixed array of `int[]`.

/// The four built-in atomic types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtomicKind {
    Bool,
    Int,
    Real,
    Str,
}

impl AtomicKind {
    pub fn name(self) -> &'static str {
        match self {
            AtomicKind::Bool => "bool",
            AtomicKind::Int => "int",
            AtomicKind::Real => "real",
            AtomicKind::Str => "string",
        }
    }
}

/// Shape of a type, derived from its name alone
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeShape {
    Atomic(AtomicKind),
    FixedArray { elem: String, len: usize },
    VarArray { elem: String },
    Record,
}

/// Classify a type name into its shape
pub fn classify(type_name: &str) -> TypeShape {
    match type_name {
        "bool" => return TypeShape::Atomic(AtomicKind::Bool),
        "int" => return TypeShape::Atomic(AtomicKind::Int),
        "real" => return TypeShape::Atomic(AtomicKind::Real),
        "string" => return TypeShape::Atomic(AtomicKind::Str),
        _ => {}
    }

    let open = match type_name.find('[') {
        Some(i) => i,
        None => return TypeShape::Record,
    };
    let close = match type_name[open..].find(']') {
        Some(i) => open + i,
        None => return TypeShape::Record,
    };

    let count = type_name[open + 1..close].trim();
    let elem = format!("{}{}", &type_name[..open], &type_name[close + 1..]);

    if count.is_empty() {
        return TypeShape::VarArray { elem };
    }
    if count.bytes().all(|b| b.is_ascii_digit()) {
        return match count.parse::<usize>() {
            Ok(0) => TypeShape::VarArray { elem },
            Ok(len) => TypeShape::FixedArray { elem, len },
            // Longer than usize: nothing valid, let the lookup fail.
            Err(_) => TypeShape::Record,
        };
    }
    TypeShape::Record
}
