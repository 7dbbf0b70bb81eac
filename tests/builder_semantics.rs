//! Builder behavior: union activation, validation and recursive merge.

mod common;

use fieldwire::{Error, Value};

#[test]
fn union_keeps_single_active_field() {
    let descriptor = common::shape_union();
    let mut builder = descriptor.start_builder();

    let mut origin = common::point().start_builder();
    origin.set(1, Value::I32(1)).unwrap();
    origin.set(2, Value::I32(2)).unwrap();
    builder.set(1, Value::Message(origin.build())).unwrap();
    assert!(builder.is_set(1));

    builder.set(2, Value::Str("circle".into())).unwrap();
    assert!(!builder.is_set(1));
    assert!(builder.is_set(2));
    // Displacing a field counts as modifying it.
    assert!(builder.is_modified(1));

    let message = builder.build();
    assert_eq!(message.union_field().map(|f| f.name()), Some("label"));
    assert!(!message.has(1));
    assert!(message.has(2));
}

#[test]
fn empty_union_fails_validation() {
    let builder = common::shape_union().start_builder();
    assert!(!builder.valid());
    match builder.validate() {
        Err(Error::NoUnionFieldSet { message }) => assert_eq!(message, "demo.Shape"),
        other => panic!("expected NoUnionFieldSet, got {other:?}"),
    }
}

#[test]
fn validation_reports_every_missing_required_field() {
    let builder = common::point().start_builder();
    match builder.validate() {
        Err(Error::MissingRequired { message, fields }) => {
            assert_eq!(message, "demo.Point");
            assert_eq!(fields, vec!["x".to_owned(), "y".to_owned()]);
        }
        other => panic!("expected MissingRequired, got {other:?}"),
    }

    // build() itself never validates.
    let built = common::point().start_builder().build();
    assert!(!built.has(1));
}

#[test]
fn merge_overwrites_scalars_and_replaces_lists() {
    let descriptor = common::profile();

    let mut base = descriptor.start_builder();
    base.set(1, Value::Str("old".into())).unwrap();
    base.set(2, Value::I16(1)).unwrap();
    base.set(4, Value::List(vec![Value::I32(1)])).unwrap();

    let mut incoming = descriptor.start_builder();
    incoming.set(1, Value::Str("new".into())).unwrap();
    incoming
        .set(4, Value::List(vec![Value::I32(2), Value::I32(3)]))
        .unwrap();
    let incoming = incoming.build();

    base.merge(&incoming).unwrap();
    let merged = base.build();

    assert_eq!(merged.get(1), Some(&Value::Str("new".into())));
    // Untouched by the merge source.
    assert_eq!(merged.get(2), Some(&Value::I16(1)));
    assert_eq!(
        merged.get(4),
        Some(&Value::List(vec![Value::I32(2), Value::I32(3)]))
    );
}

#[test]
fn merge_unions_sets_and_maps() {
    let descriptor = common::profile();

    let mut base = descriptor.start_builder();
    base.set(1, Value::Str("p".into())).unwrap();
    {
        let tags = base.mutable_set(5).unwrap();
        tags.insert(Value::Str("a".into()));
        tags.insert(Value::Str("b".into()));
    }
    {
        let attrs = base.mutable_map(6).unwrap();
        attrs.insert(Value::Str("k1".into()), Value::I64(1));
    }

    let mut incoming = descriptor.start_builder();
    incoming.set(1, Value::Str("p".into())).unwrap();
    {
        let tags = incoming.mutable_set(5).unwrap();
        tags.insert(Value::Str("b".into()));
        tags.insert(Value::Str("c".into()));
    }
    {
        let attrs = incoming.mutable_map(6).unwrap();
        attrs.insert(Value::Str("k1".into()), Value::I64(10));
        attrs.insert(Value::Str("k2".into()), Value::I64(2));
    }
    let incoming = incoming.build();

    base.merge(&incoming).unwrap();
    let merged = base.build();

    match merged.get(5) {
        Some(Value::Set(tags)) => {
            assert_eq!(tags.len(), 3);
            assert!(tags.contains(&Value::Str("c".into())));
        }
        other => panic!("expected set, got {other:?}"),
    }
    match merged.get(6) {
        Some(Value::Map(attrs)) => {
            assert_eq!(attrs.len(), 2);
            assert_eq!(attrs.get(&Value::Str("k1".into())), Some(&Value::I64(10)));
        }
        other => panic!("expected map, got {other:?}"),
    }
}

#[test]
fn merging_an_empty_message_changes_nothing() {
    let descriptor = common::profile();

    let mut base = descriptor.start_builder();
    base.set(1, Value::Str("p".into())).unwrap();
    base.set(2, Value::I16(3)).unwrap();
    let before = base.build();

    base.merge(&descriptor.start_builder().build()).unwrap();
    assert_eq!(base.build(), before);

    // Merging a message into itself is idempotent too.
    base.merge(&before).unwrap();
    assert_eq!(base.build(), before);
}

#[test]
fn merge_recurses_into_message_fields() {
    let descriptor = common::profile();

    let mut staged = descriptor.start_builder();
    staged.set(1, Value::Str("p".into())).unwrap();
    {
        let home = staged.mutable_message(7).unwrap();
        home.set(1, Value::I32(1)).unwrap();
        home.set(2, Value::I32(2)).unwrap();
    }
    // Reopen through mutate() so every modified bit starts clear.
    let mut base = staged.build().mutate();
    assert!(!base.is_modified(7));

    let mut incoming = descriptor.start_builder();
    incoming.set(1, Value::Str("p".into())).unwrap();
    {
        let home = incoming.mutable_message(7).unwrap();
        home.set(2, Value::I32(9)).unwrap();
    }
    let incoming = incoming.build();

    base.merge(&incoming).unwrap();
    // The recursive merge goes through the child builder, so the parent
    // field counts as modified and the child tracks which of its own
    // fields actually changed.
    assert!(base.is_modified(7));
    {
        let home = base.mutable_message(7).unwrap();
        assert!(home.is_modified(2));
        assert!(!home.is_modified(1));
    }
    let merged = base.build();

    match merged.get(7) {
        Some(Value::Message(home)) => {
            assert_eq!(home.get(1), Some(&Value::I32(1)));
            assert_eq!(home.get(2), Some(&Value::I32(9)));
        }
        other => panic!("expected message, got {other:?}"),
    }
}

#[test]
fn union_merge_recurses_only_on_same_active_message_field() {
    let descriptor = common::shape_union();

    // Same active message-typed field on both sides merges recursively.
    let mut base = descriptor.start_builder();
    {
        let origin = base.mutable_message(1).unwrap();
        origin.set(1, Value::I32(5)).unwrap();
    }
    let mut incoming = descriptor.start_builder();
    {
        let origin = incoming.mutable_message(1).unwrap();
        origin.set(2, Value::I32(6)).unwrap();
    }
    base.merge(&incoming.build()).unwrap();
    let merged = base.build();
    match merged.get(1) {
        Some(Value::Message(origin)) => {
            assert_eq!(origin.get(1), Some(&Value::I32(5)));
            assert_eq!(origin.get(2), Some(&Value::I32(6)));
        }
        other => panic!("expected message, got {other:?}"),
    }

    // A different active field simply displaces the old one.
    let mut base = descriptor.start_builder();
    {
        let origin = base.mutable_message(1).unwrap();
        origin.set(1, Value::I32(5)).unwrap();
    }
    let mut incoming = descriptor.start_builder();
    incoming.set(2, Value::Str("circle".into())).unwrap();
    base.merge(&incoming.build()).unwrap();
    let merged = base.build();
    assert_eq!(merged.union_field().map(|f| f.name()), Some("label"));
    assert!(!merged.has(1));
}

#[test]
fn mutate_preserves_values_and_resets_modified() {
    let descriptor = common::profile();
    let mut builder = descriptor.start_builder();
    builder.set(1, Value::Str("ada".into())).unwrap();
    builder.set(2, Value::I16(36)).unwrap();
    let message = builder.build();

    let mut again = message.mutate();
    assert!(again.is_set(1));
    assert!(!again.is_modified(1));
    again.set(2, Value::I16(37)).unwrap();
    assert!(again.is_modified(2));
    assert!(!again.is_modified(1));

    let updated = again.build();
    assert_eq!(updated.get(1), Some(&Value::Str("ada".into())));
    assert_eq!(updated.get(2), Some(&Value::I16(37)));
}

#[test]
fn wrong_kind_and_unknown_field_are_rejected() {
    let mut builder = common::point().start_builder();
    assert!(matches!(
        builder.set(1, Value::Str("no".into())),
        Err(Error::ValueKind { .. })
    ));
    assert!(matches!(
        builder.set(42, Value::I32(0)),
        Err(Error::UnknownField { .. })
    ));
}

#[test]
fn clear_drops_value_and_marks_modified() {
    let mut builder = common::profile().start_builder();
    builder.set(2, Value::I16(1)).unwrap();
    builder.clear(2).unwrap();
    assert!(!builder.is_set(2));
    assert!(builder.is_modified(2));
    assert!(!builder.build().has(2));
}
