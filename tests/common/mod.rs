//! Shared schema fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::{Arc, OnceLock};

use fieldwire::{
    CollectionRepr, Descriptor, EnumDescriptor, Field, MessageDescriptor, Provider, Requirement,
    Variant,
};

/// An enum with a gap in its ids, as real schemas tend to have.
pub fn status_enum() -> Arc<EnumDescriptor> {
    static STATUS: OnceLock<Arc<EnumDescriptor>> = OnceLock::new();
    STATUS
        .get_or_init(|| {
            EnumDescriptor::new("demo.Status", [(1, "ACTIVE"), (2, "SUSPENDED"), (5, "CLOSED")])
        })
        .clone()
}

/// A small nested struct.
pub fn point() -> Arc<MessageDescriptor> {
    static POINT: OnceLock<Arc<MessageDescriptor>> = OnceLock::new();
    POINT
        .get_or_init(|| {
            MessageDescriptor::builder("demo.Point", Variant::Struct)
                .field(Field::new(
                    1,
                    "x",
                    Requirement::Required,
                    Provider::of(Descriptor::I32),
                ))
                .field(Field::new(
                    2,
                    "y",
                    Requirement::Required,
                    Provider::of(Descriptor::I32),
                ))
                .build()
        })
        .clone()
}

/// A struct exercising every requirement level and every container shape.
pub fn profile() -> Arc<MessageDescriptor> {
    static PROFILE: OnceLock<Arc<MessageDescriptor>> = OnceLock::new();
    PROFILE
        .get_or_init(|| {
            MessageDescriptor::builder("demo.Profile", Variant::Struct)
                .field(Field::new(
                    1,
                    "name",
                    Requirement::Required,
                    Provider::of(Descriptor::Str),
                ))
                .field(Field::new(
                    2,
                    "age",
                    Requirement::Optional,
                    Provider::of(Descriptor::I16),
                ))
                .field(Field::new(
                    3,
                    "status",
                    Requirement::Default,
                    Provider::of(Descriptor::Enum(status_enum())),
                ))
                .field(Field::new(
                    4,
                    "scores",
                    Requirement::Optional,
                    Provider::of(Descriptor::list(Provider::of(Descriptor::I32))),
                ))
                .field(Field::new(
                    5,
                    "tags",
                    Requirement::Optional,
                    Provider::of(Descriptor::set(
                        Provider::of(Descriptor::Str),
                        CollectionRepr::Sorted,
                    )),
                ))
                .field(Field::new(
                    6,
                    "attrs",
                    Requirement::Optional,
                    Provider::of(Descriptor::map(
                        Provider::of(Descriptor::Str),
                        Provider::of(Descriptor::I64),
                        CollectionRepr::Insertion,
                    )),
                ))
                .field(Field::new(
                    7,
                    "home",
                    Requirement::Optional,
                    Provider::of(Descriptor::Message(point())),
                ))
                .field(Field::new(
                    8,
                    "avatar",
                    Requirement::Optional,
                    Provider::of(Descriptor::Binary),
                ))
                .field(Field::new(
                    9,
                    "weight",
                    Requirement::Optional,
                    Provider::of(Descriptor::Double),
                ))
                .build()
        })
        .clone()
}

/// A union over two message-typed fields plus a scalar.
pub fn shape_union() -> Arc<MessageDescriptor> {
    static SHAPE: OnceLock<Arc<MessageDescriptor>> = OnceLock::new();
    SHAPE
        .get_or_init(|| {
            MessageDescriptor::builder("demo.Shape", Variant::Union)
                .field(Field::new(
                    1,
                    "origin",
                    Requirement::Optional,
                    Provider::of(Descriptor::Message(point())),
                ))
                .field(Field::new(
                    2,
                    "label",
                    Requirement::Optional,
                    Provider::of(Descriptor::Str),
                ))
                .field(Field::new(
                    3,
                    "center",
                    Requirement::Optional,
                    Provider::of(Descriptor::Message(point())),
                ))
                .build()
        })
        .clone()
}

/// An exception type with one required detail field.
pub fn not_found() -> Arc<MessageDescriptor> {
    static NOT_FOUND: OnceLock<Arc<MessageDescriptor>> = OnceLock::new();
    NOT_FOUND
        .get_or_init(|| {
            MessageDescriptor::builder("demo.NotFound", Variant::Exception)
                .field(Field::new(
                    1,
                    "what",
                    Requirement::Required,
                    Provider::of(Descriptor::Str),
                ))
                .build()
        })
        .clone()
}

/// A self-referential tree node, resolvable only through a lazy provider.
pub fn tree_node() -> Arc<MessageDescriptor> {
    static NODE: OnceLock<Arc<MessageDescriptor>> = OnceLock::new();
    NODE.get_or_init(|| {
        MessageDescriptor::builder("demo.TreeNode", Variant::Struct)
            .field(Field::new(
                1,
                "value",
                Requirement::Required,
                Provider::of(Descriptor::I64),
            ))
            .field(Field::new(
                2,
                "children",
                Requirement::Optional,
                Provider::of(Descriptor::list(Provider::lazy(|| {
                    Descriptor::Message(tree_node())
                }))),
            ))
            .build()
    })
    .clone()
}
