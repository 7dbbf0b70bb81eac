//! Enum descriptors and values

use std::fmt;
use std::sync::Arc;

/// Reflective metadata for a named integer enumeration.
pub struct EnumDescriptor {
    name: String,
    values: Vec<(i32, String)>,
}

impl EnumDescriptor {
    /// Create an enum descriptor from `(id, name)` pairs in declaration
    /// order.
    pub fn new<S, I>(name: S, values: I) -> Arc<Self>
    where
        S: Into<String>,
        I: IntoIterator<Item = (i32, &'static str)>,
    {
        Arc::new(Self {
            name: name.into(),
            values: values
                .into_iter()
                .map(|(id, name)| (id, name.to_owned()))
                .collect(),
        })
    }

    /// Qualified name of the enum type.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared `(id, name)` pairs in declaration order.
    #[must_use]
    pub fn values(&self) -> &[(i32, String)] {
        &self.values
    }

    /// Look up a value name by numeric id.
    #[must_use]
    pub fn name_by_id(&self, id: i32) -> Option<&str> {
        self.values
            .iter()
            .find(|(v, _)| *v == id)
            .map(|(_, n)| n.as_str())
    }

    /// Look up a numeric id by value name.
    #[must_use]
    pub fn id_by_name(&self, name: &str) -> Option<i32> {
        self.values.iter().find(|(_, n)| n == name).map(|(v, _)| *v)
    }
}

impl fmt::Debug for EnumDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EnumDescriptor({})", self.name)
    }
}

/// A runtime enum value: a descriptor plus a numeric id.
///
/// The id is not required to be one of the declared values; unknown ids
/// round-trip through the wire codec untouched (schema evolution).
#[derive(Clone)]
pub struct EnumValue {
    descriptor: Arc<EnumDescriptor>,
    value: i32,
}

impl EnumValue {
    /// Wrap a numeric id in an enum value.
    #[must_use]
    pub fn new(descriptor: Arc<EnumDescriptor>, value: i32) -> Self {
        Self { descriptor, value }
    }

    /// Look up a declared value by name.
    #[must_use]
    pub fn by_name(descriptor: &Arc<EnumDescriptor>, name: &str) -> Option<Self> {
        descriptor
            .id_by_name(name)
            .map(|value| Self::new(descriptor.clone(), value))
    }

    /// The enum descriptor.
    #[must_use]
    pub fn descriptor(&self) -> &Arc<EnumDescriptor> {
        &self.descriptor
    }

    /// The numeric id.
    #[must_use]
    pub const fn value(&self) -> i32 {
        self.value
    }

    /// The declared name, if the id is a declared value.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.descriptor.name_by_id(self.value)
    }
}

impl PartialEq for EnumValue {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value && self.descriptor.name == other.descriptor.name
    }
}

impl Eq for EnumValue {}

impl fmt::Debug for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "{}", self.value),
        }
    }
}
