//! Reflective type descriptors
//!
//! Descriptors describe the shape of a type without being an instance of it:
//! primitives, enums, structs/unions/exceptions with ordered field lists, and
//! parametrized collections. Message fields and collection element types hold
//! [`Provider`]s rather than descriptors directly, which is what lets
//! self-referential and mutually-referential schemas construct without
//! initialization cycles.

mod enums;
mod field;
mod message;
mod provider;

pub use enums::{EnumDescriptor, EnumValue};
pub use field::{Field, Requirement};
pub use message::{MessageDescriptor, MessageDescriptorBuilder, Variant};
pub use provider::Provider;

use std::fmt;
use std::sync::Arc;

use crate::model::Value;

/// Coarse type classification shared by descriptors and runtime values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// No payload; only meaningful as a union case
    Void,
    /// Boolean
    Bool,
    /// Signed 8-bit integer
    Byte,
    /// Signed 16-bit integer
    I16,
    /// Signed 32-bit integer
    I32,
    /// Signed 64-bit integer
    I64,
    /// 64-bit IEEE float
    Double,
    /// UTF-8 string
    Str,
    /// Raw bytes
    Binary,
    /// Named integer enumeration
    Enum,
    /// Struct, union or exception
    Message,
    /// Ordered list
    List,
    /// Deduplicating set
    Set,
    /// Key-value map
    Map,
}

impl TypeKind {
    /// Lowercase name used in diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Void => "void",
            Self::Bool => "bool",
            Self::Byte => "byte",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::Double => "double",
            Self::Str => "string",
            Self::Binary => "binary",
            Self::Enum => "enum",
            Self::Message => "message",
            Self::List => "list",
            Self::Set => "set",
            Self::Map => "map",
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Runtime representation choice for sets and maps.
///
/// A schema-level decision: element iteration order determines the byte
/// order of encoded containers, so deterministic fixtures pick one of these
/// explicitly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CollectionRepr {
    /// Entries iterate in insertion order
    #[default]
    Insertion,
    /// Entries iterate sorted by the element (or key) ordering
    Sorted,
}

/// List element type.
#[derive(Clone)]
pub struct ListDescriptor {
    element: Provider,
}

impl ListDescriptor {
    /// The element type of the list.
    #[must_use]
    pub fn element_type(&self) -> Descriptor {
        self.element.descriptor()
    }
}

/// Set element type and runtime representation.
#[derive(Clone)]
pub struct SetDescriptor {
    element: Provider,
    repr: CollectionRepr,
}

impl SetDescriptor {
    /// The element type of the set.
    #[must_use]
    pub fn element_type(&self) -> Descriptor {
        self.element.descriptor()
    }

    /// The runtime representation of the set.
    #[must_use]
    pub const fn repr(&self) -> CollectionRepr {
        self.repr
    }
}

/// Map key and value types and runtime representation.
#[derive(Clone)]
pub struct MapDescriptor {
    key: Provider,
    value: Provider,
    repr: CollectionRepr,
}

impl MapDescriptor {
    /// The key type of the map.
    #[must_use]
    pub fn key_type(&self) -> Descriptor {
        self.key.descriptor()
    }

    /// The value type of the map.
    #[must_use]
    pub fn value_type(&self) -> Descriptor {
        self.value.descriptor()
    }

    /// The runtime representation of the map.
    #[must_use]
    pub const fn repr(&self) -> CollectionRepr {
        self.repr
    }
}

/// A reflective type descriptor.
///
/// Cheap to clone; aggregate variants share their metadata through `Arc`.
#[derive(Clone)]
pub enum Descriptor {
    /// No payload; only meaningful as a union case
    Void,
    /// Boolean
    Bool,
    /// Signed 8-bit integer
    Byte,
    /// Signed 16-bit integer
    I16,
    /// Signed 32-bit integer
    I32,
    /// Signed 64-bit integer
    I64,
    /// 64-bit IEEE float
    Double,
    /// UTF-8 string
    Str,
    /// Raw bytes
    Binary,
    /// Named integer enumeration
    Enum(Arc<EnumDescriptor>),
    /// Struct, union or exception
    Message(Arc<MessageDescriptor>),
    /// Ordered list of one element type
    List(Arc<ListDescriptor>),
    /// Deduplicating set of one element type
    Set(Arc<SetDescriptor>),
    /// Map of one key type to one value type
    Map(Arc<MapDescriptor>),
}

impl Descriptor {
    /// A `list<element>` descriptor.
    #[must_use]
    pub fn list(element: Provider) -> Self {
        Self::List(Arc::new(ListDescriptor { element }))
    }

    /// A `set<element>` descriptor with the given representation.
    #[must_use]
    pub fn set(element: Provider, repr: CollectionRepr) -> Self {
        Self::Set(Arc::new(SetDescriptor { element, repr }))
    }

    /// A `map<key, value>` descriptor with the given representation.
    #[must_use]
    pub fn map(key: Provider, value: Provider, repr: CollectionRepr) -> Self {
        Self::Map(Arc::new(MapDescriptor { key, value, repr }))
    }

    /// The coarse kind of this type.
    #[must_use]
    pub fn kind(&self) -> TypeKind {
        match self {
            Self::Void => TypeKind::Void,
            Self::Bool => TypeKind::Bool,
            Self::Byte => TypeKind::Byte,
            Self::I16 => TypeKind::I16,
            Self::I32 => TypeKind::I32,
            Self::I64 => TypeKind::I64,
            Self::Double => TypeKind::Double,
            Self::Str => TypeKind::Str,
            Self::Binary => TypeKind::Binary,
            Self::Enum(_) => TypeKind::Enum,
            Self::Message(_) => TypeKind::Message,
            Self::List(_) => TypeKind::List,
            Self::Set(_) => TypeKind::Set,
            Self::Map(_) => TypeKind::Map,
        }
    }

    /// Descriptive type name for diagnostics, e.g. `list<i32>` or the
    /// qualified name of a message or enum type.
    #[must_use]
    pub fn type_name(&self) -> String {
        match self {
            Self::Enum(e) => e.name().to_owned(),
            Self::Message(m) => m.name().to_owned(),
            Self::List(l) => format!("list<{}>", l.element_type().type_name()),
            Self::Set(s) => format!("set<{}>", s.element_type().type_name()),
            Self::Map(m) => format!(
                "map<{},{}>",
                m.key_type().type_name(),
                m.value_type().type_name()
            ),
            other => other.kind().name().to_owned(),
        }
    }

    /// The implicit default for this type where one exists.
    ///
    /// Scalars default to zero/empty and containers to empty; enum and
    /// message types have no implicit default.
    #[must_use]
    pub fn zero_value(&self) -> Option<Value> {
        match self {
            Self::Void => Some(Value::Void),
            Self::Bool => Some(Value::Bool(false)),
            Self::Byte => Some(Value::Byte(0)),
            Self::I16 => Some(Value::I16(0)),
            Self::I32 => Some(Value::I32(0)),
            Self::I64 => Some(Value::I64(0)),
            Self::Double => Some(Value::Double(0.0)),
            Self::Str => Some(Value::Str(String::new())),
            Self::Binary => Some(Value::Binary(bytes::Bytes::new())),
            Self::Enum(_) | Self::Message(_) => None,
            Self::List(_) => Some(Value::List(Vec::new())),
            Self::Set(s) => Some(Value::Set(crate::model::SetValue::new(s.repr()))),
            Self::Map(m) => Some(Value::Map(crate::model::MapValue::new(m.repr()))),
        }
    }
}

// Manual Debug: descriptors may reference each other cyclically, so printing
// must not recurse through providers.
impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Descriptor({})", self.type_name())
    }
}
