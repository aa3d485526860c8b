// Universal laws and boundary behaviours of the composite-value engine

use compval::{CompositeEngine, ValueError};
use std::cmp::Ordering;

fn profile_engine() -> CompositeEngine {
    let mut engine = CompositeEngine::default();
    engine
        .register_type(
            "profile",
            "bool active; int quota; real ratio; string label; string missing; int[3] slots; string[] tags",
        )
        .expect("profile registration failed");
    engine
}

const PROFILE_TEXT: &str = "{active: on, quota: 8kB, ratio: 0.125, label: 'it''s fine', \
                            slots: [7, 8, 9], tags: ['a', 'b', 'c', 'd']}";

#[test]
fn test_wire_round_trip() {
    let mut engine = profile_engine();
    let value = engine.parse(PROFILE_TEXT, "profile", None).unwrap();

    let wire = engine.serialize(value, "profile", true).unwrap();
    let reparsed = engine.parse(&wire, "profile", None).expect("wire text failed to reparse");

    assert_eq!(engine.compare(value, reparsed, "profile").unwrap(), Ordering::Equal);
}

#[test]
fn test_wire_quotes_and_escapes() {
    let mut engine = profile_engine();
    let value = engine.parse(PROFILE_TEXT, "profile", None).unwrap();

    let wire = engine.serialize(value, "profile", true).unwrap();
    assert!(wire.starts_with("{active: 'true', quota: '8192', ratio: '0.125', label: 'it''s fine', missing: 'nil'"),
        "unexpected wire form: {wire}");
}

#[test]
fn test_idempotent_patch() {
    let mut engine = profile_engine();
    // No quotes inside strings here: pretty mode does not escape them.
    let value = engine
        .parse("{active: off, quota: 10, ratio: 2.5, label: 'steady', tags: ['x', 'y']}", "profile", None)
        .unwrap();

    let pretty = engine.serialize(value, "profile", false).unwrap();
    let repatched = engine.parse(&pretty, "profile", Some(value)).unwrap();

    assert_eq!(engine.compare(value, repatched, "profile").unwrap(), Ordering::Equal);
}

#[test]
fn test_deep_copy_independence() {
    let mut engine = profile_engine();
    let value = engine.parse(PROFILE_TEXT, "profile", None).unwrap();
    let copy = engine.duplicate(value, "profile").unwrap();
    assert_eq!(engine.compare(value, copy, "profile").unwrap(), Ordering::Equal);

    // Mutating the copy must not leak into the original.
    let mutated = engine
        .parse("{label: 'changed', tags: [0: 'z']}", "profile", Some(copy))
        .unwrap();
    engine.free(copy, "profile").unwrap();

    assert_ne!(engine.compare(value, mutated, "profile").unwrap(), Ordering::Equal);
    let (ty, addr) = engine.resolve_path(value, "profile", "profile.label").unwrap();
    assert_eq!(engine.serialize(addr, &ty, false).unwrap(), "'it's fine'");
    let (ty, addr) = engine.resolve_path(value, "profile", "profile.tags[0]").unwrap();
    assert_eq!(engine.serialize(addr, &ty, false).unwrap(), "'a'");
}

#[test]
fn test_free_releases_every_block() {
    let mut engine = profile_engine();
    assert_eq!(engine.allocated_blocks(), 0);

    let value = engine.parse(PROFILE_TEXT, "profile", None).unwrap();
    let copy = engine.duplicate(value, "profile").unwrap();
    let patched = engine
        .parse("{tags: {size: 2}, label: nil}", "profile", Some(copy))
        .unwrap();
    assert!(engine.allocated_blocks() > 0);

    engine.free(value, "profile").unwrap();
    engine.free(copy, "profile").unwrap();
    engine.free(patched, "profile").unwrap();
    assert_eq!(engine.allocated_blocks(), 0);
}

#[test]
fn test_failed_parse_leaks_nothing() {
    let mut engine = profile_engine();
    let value = engine.parse(PROFILE_TEXT, "profile", None).unwrap();
    let before = engine.allocated_blocks();

    // Fails deep inside after strings were already copied from `value`.
    let err = engine
        .parse("{tags: [0: 'new'], slots: [0: nope]}", "profile", Some(value))
        .unwrap_err();
    assert!(matches!(err.root_cause(), ValueError::AtomicParseFailure { .. }));
    assert_eq!(engine.allocated_blocks(), before);
}

#[test]
fn test_layout_law_holds_for_registered_types() {
    let engine = profile_engine();
    let registry = engine.registry();
    let def = registry.lookup("profile").unwrap();

    assert_eq!(def.size % def.alignment, 0);
    let mut previous_end = 0;
    for field in &def.fields {
        let (size, align) = registry.layout_of(&field.type_name).unwrap();
        assert_eq!(field.offset % align, 0, "field {} misaligned", field.name);
        assert!(field.offset >= previous_end, "field {} overlaps", field.name);
        previous_end = field.offset + size;
    }
}

#[test]
fn test_length_hint_bounds_actual_length() {
    let mut engine = profile_engine();
    let value = engine.parse(PROFILE_TEXT, "profile", None).unwrap();

    let hint = engine.length_of_serialized(value, "profile").unwrap();
    let pretty = engine.serialize(value, "profile", false).unwrap();
    let wire = engine.serialize(value, "profile", true).unwrap();
    assert!(hint >= pretty.len(), "hint {hint} < pretty {}", pretty.len());
    assert!(hint >= wire.len(), "hint {hint} < wire {}", wire.len());
}

// === BOUNDARY BEHAVIOURS ===

#[test]
fn test_empty_fixed_array_keeps_previous_elements() {
    let mut engine = profile_engine();
    let value = engine.parse(PROFILE_TEXT, "profile", None).unwrap();

    let patched = engine.parse("{slots: []}", "profile", Some(value)).unwrap();
    assert_eq!(engine.compare(value, patched, "profile").unwrap(), Ordering::Equal);
}

#[test]
fn test_extended_size_grows_zero_initialised() {
    let mut engine = CompositeEngine::default();
    let value = engine.parse("[4, 5]", "int[]", None).unwrap();

    let grown = engine.parse("{size: 5}", "int[]", Some(value)).unwrap();
    assert_eq!(
        engine.serialize(grown, "int[]", false).unwrap(),
        "{size: 5, data: [4, 5, 0, 0, 0]}"
    );
}

#[test]
fn test_extended_size_shrinks() {
    let mut engine = CompositeEngine::default();
    let value = engine.parse("['a', 'b', 'c']", "string[]", None).unwrap();

    let shrunk = engine.parse("{size: 1}", "string[]", Some(value)).unwrap();
    assert_eq!(engine.serialize(shrunk, "string[]", false).unwrap(), "['a']");

    engine.free(value, "string[]").unwrap();
    engine.free(shrunk, "string[]").unwrap();
    assert_eq!(engine.allocated_blocks(), 0);
}

#[test]
fn test_extended_size_below_data_rejected() {
    let mut engine = CompositeEngine::default();
    let err = engine
        .parse("{size: 2, data: [0, 1, 2]}", "int[]", None)
        .unwrap_err();
    assert!(matches!(
        err,
        ValueError::IndexOutOfBounds { index: 2, size: 2 }
    ));
}

#[test]
fn test_mixed_index_styles_rejected() {
    let mut engine = CompositeEngine::default();
    let err = engine.parse("[0: 1, 2, 2: 3]", "int[]", None).unwrap_err();
    assert!(matches!(err.root_cause(), ValueError::InvalidLiteral { .. }));
}

#[test]
fn test_doubled_quote_parses_as_one() {
    let mut engine = profile_engine();
    let value = engine.parse("{label: 'can''t'}", "profile", None).unwrap();

    let (ty, addr) = engine.resolve_path(value, "profile", "profile.label").unwrap();
    assert_eq!(engine.serialize(addr, &ty, false).unwrap(), "'can't'");
    assert_eq!(engine.serialize(addr, &ty, true).unwrap(), "'can''t'");
}

#[test]
fn test_short_form_var_array_patch_keeps_tail() {
    let mut engine = CompositeEngine::default();
    let value = engine.parse("[1, 2, 3, 4]", "int[]", None).unwrap();

    // Touching element 0 must not disturb elements 1..3 or the length.
    let patched = engine.parse("[0: 9]", "int[]", Some(value)).unwrap();
    assert_eq!(
        engine.serialize(patched, "int[]", false).unwrap(),
        "{size: 4, data: [9, 2, 3, 4]}"
    );
}

// === SEMANTIC DETAILS ===

#[test]
fn test_compare_orders_structurally() {
    let mut engine = profile_engine();

    let small = engine.parse("{quota: 1}", "profile", None).unwrap();
    let large = engine.parse("{quota: 2}", "profile", None).unwrap();
    assert_eq!(engine.compare(small, large, "profile").unwrap(), Ordering::Less);
    assert_eq!(engine.compare(large, small, "profile").unwrap(), Ordering::Greater);

    // A null string sorts before any non-null string.
    let null_label = engine.parse("{label: nil}", "profile", None).unwrap();
    let some_label = engine.parse("{label: ''}", "profile", None).unwrap();
    assert_eq!(
        engine.compare(null_label, some_label, "profile").unwrap(),
        Ordering::Less
    );

    // Variable arrays compare by length before content.
    let short = engine.parse("[9]", "int[]", None).unwrap();
    let long = engine.parse("[0, 0]", "int[]", None).unwrap();
    assert_eq!(engine.compare(short, long, "int[]").unwrap(), Ordering::Less);
}

#[test]
fn test_duplicate_field_names_overwrite_in_order() {
    let mut engine = profile_engine();
    let value = engine
        .parse("{label: 'first', label: 'second'}", "profile", None)
        .unwrap();

    let (ty, addr) = engine.resolve_path(value, "profile", "profile.label").unwrap();
    assert_eq!(engine.serialize(addr, &ty, false).unwrap(), "'second'");
    // The overwritten text was released, not leaked: the value owns its
    // root block and one string.
    let blocks = engine.allocated_blocks();
    engine.free(value, "profile").unwrap();
    assert_eq!(engine.allocated_blocks(), blocks - 2);
}

#[test]
fn test_whitespace_tolerated_between_tokens() {
    let mut engine = profile_engine();
    let compact = engine.parse("{quota: 5, slots: [1, 2]}", "profile", None).unwrap();
    let spread = engine
        .parse("{\n\tquota :\t5 ,\n slots : [ 1 ,\t2 ]\n}", "profile", None)
        .unwrap();
    assert_eq!(engine.compare(compact, spread, "profile").unwrap(), Ordering::Equal);
}

#[test]
fn test_quoted_atomics_accepted_everywhere() {
    let mut engine = profile_engine();
    let quoted = engine
        .parse("{active: 'on', quota: '8kB', ratio: '0.5', slots: ['1', '2', '3']}", "profile", None)
        .unwrap();
    let plain = engine
        .parse("{active: on, quota: 8192, ratio: 0.5, slots: [1, 2, 3]}", "profile", None)
        .unwrap();
    assert_eq!(engine.compare(quoted, plain, "profile").unwrap(), Ordering::Equal);
}

#[test]
fn test_empty_var_array_view() {
    let mut engine = CompositeEngine::default();
    let value = engine.parse("[]", "int[]", None).unwrap();
    assert_eq!(engine.serialize(value, "int[]", false).unwrap(), "[]");

    // Threshold zero expands even the empty array.
    engine.set_expand_array_view_threshold(0);
    assert_eq!(
        engine.serialize(value, "int[]", false).unwrap(),
        "{size: 0, data: []}"
    );
}

#[test]
fn test_registration_failure_leaves_registry_unchanged() {
    let mut engine = CompositeEngine::default();
    engine.register_type("node", "string name; int port").unwrap();

    assert!(engine.register_type("bad", "node a; ghost b").is_err());
    assert!(engine.registry().lookup("bad").is_none());

    // The earlier registration still works.
    let value = engine.parse("{name: 'n', port: 1}", "node", None).unwrap();
    engine.free(value, "node").unwrap();
}
