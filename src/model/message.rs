//! Immutable message values

use std::cmp::Ordering;
use std::fmt;
use std::sync::{Arc, OnceLock};

use xxhash_rust::xxh3::Xxh3;

use crate::descriptor::{Field, MessageDescriptor, Requirement};
use crate::model::{MessageBuilder, Value};

/// An immutable aggregate of field values.
///
/// Messages are safe to share across threads; nothing is mutated after
/// construction. The structural hash is computed lazily and cached behind a
/// `OnceLock`, which is an optimization only: hashing is a pure function of
/// the immutable fields.
#[derive(Clone)]
pub struct Message {
    descriptor: Arc<MessageDescriptor>,
    // Field values by declaration index. None means the field holds no
    // value; Default-requirement fields still read back their default.
    values: Vec<Option<Value>>,
    // Declaration index of the active union field, if any.
    union_index: Option<usize>,
    hash: OnceLock<u64>,
}

impl Message {
    pub(crate) fn from_parts(
        descriptor: Arc<MessageDescriptor>,
        values: Vec<Option<Value>>,
        union_index: Option<usize>,
    ) -> Self {
        Self {
            descriptor,
            values,
            union_index,
            hash: OnceLock::new(),
        }
    }

    /// The descriptor of this message type.
    #[must_use]
    pub fn descriptor(&self) -> &Arc<MessageDescriptor> {
        &self.descriptor
    }

    /// True iff the field holds a value. `Default`-requirement fields are
    /// always reported present; unknown ids are absent.
    #[must_use]
    pub fn has(&self, id: u16) -> bool {
        let Some(index) = self.descriptor.index_of(id) else {
            return false;
        };
        if self.values[index].is_some() {
            return true;
        }
        self.descriptor.fields()[index].requirement() == Requirement::Default
    }

    /// Element count for collection fields (0 if absent), otherwise presence
    /// as 1 or 0.
    #[must_use]
    pub fn num(&self, id: u16) -> usize {
        self.get(id).map_or(0, Value::num)
    }

    /// Generic accessor for the effective field value.
    ///
    /// `Default`-requirement fields yield the schema default when unset;
    /// truly absent fields and unknown ids yield `None`.
    #[must_use]
    pub fn get(&self, id: u16) -> Option<&Value> {
        let index = self.descriptor.index_of(id)?;
        self.values[index]
            .as_ref()
            .or_else(|| self.descriptor.fields()[index].effective_default())
    }

    /// The active field of a union, or `None` when no field is set (or this
    /// is not a union).
    #[must_use]
    pub fn union_field(&self) -> Option<&Field> {
        self.union_index.map(|i| &self.descriptor.fields()[i])
    }

    /// Lazily computed, cached structural hash.
    #[must_use]
    pub fn hash64(&self) -> u64 {
        *self.hash.get_or_init(|| {
            let mut hasher = Xxh3::new();
            hasher.update(self.descriptor.name().as_bytes());
            for field in self.descriptor.fields() {
                if let Some(value) = self.get(field.id()) {
                    hasher.update(&field.id().to_be_bytes());
                    value.feed(&mut hasher);
                }
            }
            hasher.digest()
        })
    }

    /// Canonical `{field:value,...}` rendering in declaration order.
    ///
    /// Absent fields are omitted; `Default`-requirement fields always
    /// render.
    #[must_use]
    pub fn as_string(&self) -> String {
        let mut out = String::new();
        out.push('{');
        let mut first = true;
        for field in self.descriptor.fields() {
            if let Some(value) = self.get(field.id()) {
                if !first {
                    out.push(',');
                }
                first = false;
                out.push_str(field.name());
                out.push(':');
                value.render_into(&mut out);
            }
        }
        out.push('}');
        out
    }

    /// Start a builder pre-populated from this message's field values.
    #[must_use]
    pub fn mutate(&self) -> MessageBuilder {
        MessageBuilder::from_message(self)
    }

    // Internal presence, without Default substitution. The wire writer and
    // merge use this so unset Default fields are not copied around.
    pub(crate) fn raw(&self, index: usize) -> Option<&Value> {
        self.values[index].as_ref()
    }

    pub(crate) fn union_index(&self) -> Option<usize> {
        self.union_index
    }
}

impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        if self.descriptor.name() != other.descriptor.name()
            || self.descriptor.variant() != other.descriptor.variant()
        {
            return false;
        }
        self.descriptor
            .fields()
            .iter()
            .all(|f| self.get(f.id()) == other.get(f.id()))
    }
}

impl Eq for Message {}

impl PartialOrd for Message {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Message {
    /// Lexicographic by declaration order: presence before value, absent
    /// sorting below present. Collection values order by structural hash.
    fn cmp(&self, other: &Self) -> Ordering {
        let by_name = self.descriptor.name().cmp(other.descriptor.name());
        if by_name != Ordering::Equal {
            return by_name;
        }
        if self.descriptor.is_union() {
            let by_tag = self.union_index.cmp(&other.union_index);
            if by_tag != Ordering::Equal {
                return by_tag;
            }
        }
        for field in self.descriptor.fields() {
            let ordering = match (self.get(field.id()), other.get(field.id())) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (Some(a), Some(b)) => a.total_cmp(b),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.descriptor.name(), self.as_string())
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}
