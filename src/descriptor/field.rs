//! Per-field identity and metadata

use std::fmt;
use std::sync::OnceLock;

use super::{Descriptor, Provider};
use crate::model::Value;

/// Field requirement level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Requirement {
    /// Must be present in any valid message
    Required,
    /// May be truly absent
    Optional,
    /// Always reported present; reads back the schema default when unset
    Default,
}

/// Identity and metadata of a single message field, independent of any
/// message instance.
///
/// Field ids are unique within one message type but need not be contiguous
/// or ordered; declaration order and numeric order may differ.
#[derive(Clone)]
pub struct Field {
    id: u16,
    name: String,
    requirement: Requirement,
    ty: Provider,
    default: Option<Value>,
    // Implicit default for Default-requirement fields, resolved lazily so
    // field construction never dereferences the type provider.
    zero: OnceLock<Option<Value>>,
}

impl Field {
    /// Create a field. The type is given as a provider so recursive schemas
    /// can reference message types that are not yet constructed.
    pub fn new<S: Into<String>>(id: u16, name: S, requirement: Requirement, ty: Provider) -> Self {
        Self {
            id,
            name: name.into(),
            requirement,
            ty,
            default: None,
            zero: OnceLock::new(),
        }
    }

    /// Attach an explicit schema default value.
    #[must_use]
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Numeric field id.
    #[must_use]
    pub const fn id(&self) -> u16 {
        self.id
    }

    /// Field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Requirement level.
    #[must_use]
    pub const fn requirement(&self) -> Requirement {
        self.requirement
    }

    /// Resolve the field's type descriptor.
    #[must_use]
    pub fn descriptor(&self) -> Descriptor {
        self.ty.descriptor()
    }

    /// The explicitly declared default value, if any.
    #[must_use]
    pub fn declared_default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// The default read back for this field when it is unset.
    ///
    /// An explicit default wins; otherwise `Default`-requirement fields fall
    /// back to the type's implicit zero/empty value. `Required` and
    /// `Optional` fields without an explicit default have none.
    #[must_use]
    pub fn effective_default(&self) -> Option<&Value> {
        if self.default.is_some() {
            return self.default.as_ref();
        }
        if self.requirement == Requirement::Default {
            return self
                .zero
                .get_or_init(|| self.descriptor().zero_value())
                .as_ref();
        }
        None
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Field({}: {})", self.id, self.name)
    }
}
