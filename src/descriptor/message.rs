//! Message (struct/union/exception) descriptors

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::Field;
use crate::model::MessageBuilder;

/// Aggregate type variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    /// Plain struct: any combination of fields may be present
    Struct,
    /// At most one field active at a time
    Union,
    /// Struct that doubles as an error at the RPC boundary
    Exception,
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Struct => "struct",
            Self::Union => "union",
            Self::Exception => "exception",
        })
    }
}

/// Self-describing metadata for a struct, union or exception type.
///
/// Holds the declaration-ordered field list plus id and name lookup tables.
pub struct MessageDescriptor {
    name: String,
    variant: Variant,
    fields: Vec<Field>,
    by_id: HashMap<u16, usize>,
    by_name: HashMap<String, usize>,
}

impl MessageDescriptor {
    /// Start describing a message type.
    pub fn builder<S: Into<String>>(name: S, variant: Variant) -> MessageDescriptorBuilder {
        MessageDescriptorBuilder {
            name: name.into(),
            variant,
            fields: Vec::new(),
        }
    }

    /// Qualified name of the message type.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this is a struct, union or exception.
    #[must_use]
    pub const fn variant(&self) -> Variant {
        self.variant
    }

    /// True for union descriptors.
    #[must_use]
    pub fn is_union(&self) -> bool {
        self.variant == Variant::Union
    }

    /// Fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Look up a field by numeric id.
    #[must_use]
    pub fn field_by_id(&self, id: u16) -> Option<&Field> {
        self.by_id.get(&id).map(|&i| &self.fields[i])
    }

    /// Look up a field by name.
    #[must_use]
    pub fn field_by_name(&self, name: &str) -> Option<&Field> {
        self.by_name.get(name).map(|&i| &self.fields[i])
    }

    /// Declaration index of a field id.
    pub(crate) fn index_of(&self, id: u16) -> Option<usize> {
        self.by_id.get(&id).copied()
    }

    /// Start an empty builder for this type, with `Default`-requirement
    /// fields pre-populated with their schema defaults.
    #[must_use]
    pub fn start_builder(self: &Arc<Self>) -> MessageBuilder {
        MessageBuilder::new(self.clone())
    }
}

impl fmt::Debug for MessageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MessageDescriptor({} {})", self.variant, self.name)
    }
}

/// Builder for [`MessageDescriptor`], validating field id and name
/// uniqueness.
pub struct MessageDescriptorBuilder {
    name: String,
    variant: Variant,
    fields: Vec<Field>,
}

impl MessageDescriptorBuilder {
    /// Append a field in declaration order.
    ///
    /// # Panics
    ///
    /// Panics if the field id or name duplicates an earlier field. Schema
    /// definitions are static program data, so this is a programming error.
    #[must_use]
    pub fn field(mut self, field: Field) -> Self {
        assert!(
            !self.fields.iter().any(|f| f.id() == field.id()),
            "duplicate field id {} in {}",
            field.id(),
            self.name
        );
        assert!(
            !self.fields.iter().any(|f| f.name() == field.name()),
            "duplicate field name `{}` in {}",
            field.name(),
            self.name
        );
        self.fields.push(field);
        self
    }

    /// Finish the descriptor.
    #[must_use]
    pub fn build(self) -> Arc<MessageDescriptor> {
        let by_id = self
            .fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.id(), i))
            .collect();
        let by_name = self
            .fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name().to_owned(), i))
            .collect();
        Arc::new(MessageDescriptor {
            name: self.name,
            variant: self.variant,
            fields: self.fields,
            by_id,
            by_name,
        })
    }
}
