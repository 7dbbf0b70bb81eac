//! Boxed runtime values
//!
//! [`Value`] is the generic representation every field value takes in the
//! reflective model. Structural equality, a stable 64-bit structural hash,
//! a total ordering, and the canonical string rendering all live here.

use std::cmp::Ordering;
use std::fmt;
use std::fmt::Write as _;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use bytes::Bytes;
use xxhash_rust::xxh3::Xxh3;

use crate::descriptor::{CollectionRepr, EnumValue, TypeKind};
use crate::model::Message;

/// A boxed runtime field value.
#[derive(Clone, Debug)]
pub enum Value {
    /// Payload-less union case marker
    Void,
    /// Boolean
    Bool(bool),
    /// Signed 8-bit integer
    Byte(i8),
    /// Signed 16-bit integer
    I16(i16),
    /// Signed 32-bit integer
    I32(i32),
    /// Signed 64-bit integer
    I64(i64),
    /// 64-bit IEEE float
    Double(f64),
    /// UTF-8 string
    Str(String),
    /// Raw bytes
    Binary(Bytes),
    /// Enum value
    Enum(EnumValue),
    /// Nested message
    Message(Message),
    /// List of values
    List(Vec<Value>),
    /// Set of values
    Set(SetValue),
    /// Map of values
    Map(MapValue),
}

impl Value {
    /// The coarse kind of this value.
    #[must_use]
    pub fn kind(&self) -> TypeKind {
        match self {
            Self::Void => TypeKind::Void,
            Self::Bool(_) => TypeKind::Bool,
            Self::Byte(_) => TypeKind::Byte,
            Self::I16(_) => TypeKind::I16,
            Self::I32(_) => TypeKind::I32,
            Self::I64(_) => TypeKind::I64,
            Self::Double(_) => TypeKind::Double,
            Self::Str(_) => TypeKind::Str,
            Self::Binary(_) => TypeKind::Binary,
            Self::Enum(_) => TypeKind::Enum,
            Self::Message(_) => TypeKind::Message,
            Self::List(_) => TypeKind::List,
            Self::Set(_) => TypeKind::Set,
            Self::Map(_) => TypeKind::Map,
        }
    }

    /// Element count for collections, otherwise 1.
    #[must_use]
    pub fn num(&self) -> usize {
        match self {
            Self::List(items) => items.len(),
            Self::Set(set) => set.len(),
            Self::Map(map) => map.len(),
            _ => 1,
        }
    }

    /// Stable structural 64-bit hash.
    ///
    /// Set and map hashes are order-insensitive so equal collections hash
    /// equally regardless of insertion history.
    #[must_use]
    pub fn hash64(&self) -> u64 {
        let mut hasher = Xxh3::new();
        self.feed(&mut hasher);
        hasher.digest()
    }

    pub(crate) fn feed(&self, hasher: &mut Xxh3) {
        hasher.update(&[self.kind() as u8]);
        match self {
            Self::Void => {}
            Self::Bool(v) => hasher.update(&[u8::from(*v)]),
            Self::Byte(v) => hasher.update(&v.to_be_bytes()),
            Self::I16(v) => hasher.update(&v.to_be_bytes()),
            Self::I32(v) => hasher.update(&v.to_be_bytes()),
            Self::I64(v) => hasher.update(&v.to_be_bytes()),
            Self::Double(v) => hasher.update(&canonical_f64_bits(*v).to_be_bytes()),
            Self::Str(v) => hasher.update(v.as_bytes()),
            Self::Binary(v) => hasher.update(v),
            Self::Enum(v) => hasher.update(&v.value().to_be_bytes()),
            Self::Message(m) => hasher.update(&m.hash64().to_be_bytes()),
            Self::List(items) => {
                for item in items {
                    item.feed(hasher);
                }
            }
            Self::Set(set) => hasher.update(&set.content_hash().to_be_bytes()),
            Self::Map(map) => hasher.update(&map.content_hash().to_be_bytes()),
        }
    }

    /// Total ordering over values.
    ///
    /// Scalars compare by natural order, messages recursively, and
    /// collections by their structural hash. The collection ordering is
    /// stable but not content-semantic.
    #[must_use]
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Void, Self::Void) => Ordering::Equal,
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Byte(a), Self::Byte(b)) => a.cmp(b),
            (Self::I16(a), Self::I16(b)) => a.cmp(b),
            (Self::I32(a), Self::I32(b)) => a.cmp(b),
            (Self::I64(a), Self::I64(b)) => a.cmp(b),
            (Self::Double(a), Self::Double(b)) => cmp_f64(*a, *b),
            (Self::Str(a), Self::Str(b)) => a.cmp(b),
            (Self::Binary(a), Self::Binary(b)) => a.cmp(b),
            (Self::Enum(a), Self::Enum(b)) => a.value().cmp(&b.value()),
            (Self::Message(a), Self::Message(b)) => a.cmp(b),
            (Self::List(_) | Self::Set(_) | Self::Map(_), _)
                if self.kind() == other.kind() =>
            {
                self.hash64().cmp(&other.hash64())
            }
            _ => (self.kind() as u8).cmp(&(other.kind() as u8)),
        }
    }

    /// Append the canonical rendering of this value.
    ///
    /// Strings are quoted and escaped, binary renders as base64, enums by
    /// name, and containers recursively.
    pub fn render_into(&self, out: &mut String) {
        match self {
            Self::Void => out.push_str("true"),
            Self::Bool(v) => {
                let _ = write!(out, "{v}");
            }
            Self::Byte(v) => {
                let _ = write!(out, "{v}");
            }
            Self::I16(v) => {
                let _ = write!(out, "{v}");
            }
            Self::I32(v) => {
                let _ = write!(out, "{v}");
            }
            Self::I64(v) => {
                let _ = write!(out, "{v}");
            }
            Self::Double(v) => {
                let _ = write!(out, "{v}");
            }
            Self::Str(v) => {
                out.push('"');
                escape_into(v, out);
                out.push('"');
            }
            Self::Binary(v) => {
                out.push_str("b64(");
                out.push_str(&STANDARD_NO_PAD.encode(v));
                out.push(')');
            }
            Self::Enum(v) => {
                let _ = write!(out, "{v}");
            }
            Self::Message(m) => out.push_str(&m.as_string()),
            Self::List(items) => render_seq(items.iter(), out),
            Self::Set(set) => render_seq(set.iter(), out),
            Self::Map(map) => {
                out.push('{');
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    k.render_into(out);
                    out.push(':');
                    v.render_into(out);
                }
                out.push('}');
            }
        }
    }
}

fn render_seq<'a>(items: impl Iterator<Item = &'a Value>, out: &mut String) {
    out.push('[');
    for (i, item) in items.enumerate() {
        if i > 0 {
            out.push(',');
        }
        item.render_into(out);
    }
    out.push(']');
}

fn escape_into(s: &str, out: &mut String) {
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
}

// NaN compares equal to NaN and above all other values; +0.0 and -0.0 are
// equal, keeping the ordering consistent with structural equality.
fn cmp_f64(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

fn eq_f64(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

fn canonical_f64_bits(v: f64) -> u64 {
    if v.is_nan() {
        f64::NAN.to_bits()
    } else if v == 0.0 {
        0
    } else {
        v.to_bits()
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Void, Self::Void) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Byte(a), Self::Byte(b)) => a == b,
            (Self::I16(a), Self::I16(b)) => a == b,
            (Self::I32(a), Self::I32(b)) => a == b,
            (Self::I64(a), Self::I64(b)) => a == b,
            (Self::Double(a), Self::Double(b)) => eq_f64(*a, *b),
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Binary(a), Self::Binary(b)) => a == b,
            (Self::Enum(a), Self::Enum(b)) => a == b,
            (Self::Message(a), Self::Message(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Set(a), Self::Set(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.render_into(&mut out);
        f.write_str(&out)
    }
}

/// A set value, deduplicating by structural equality.
///
/// Vector-backed: iteration order is either insertion order or the element
/// ordering, per the schema's representation choice, and is the order used
/// on the wire.
#[derive(Clone, Debug)]
pub struct SetValue {
    repr: CollectionRepr,
    items: Vec<Value>,
}

impl SetValue {
    /// An empty set with the given representation.
    #[must_use]
    pub const fn new(repr: CollectionRepr) -> Self {
        Self {
            repr,
            items: Vec::new(),
        }
    }

    /// Build a set from elements, deduplicating.
    #[must_use]
    pub fn from_items(repr: CollectionRepr, items: impl IntoIterator<Item = Value>) -> Self {
        let mut set = Self::new(repr);
        for item in items {
            set.insert(item);
        }
        set
    }

    /// The representation of this set.
    #[must_use]
    pub const fn repr(&self) -> CollectionRepr {
        self.repr
    }

    /// Insert an element; returns false if an equal element was present.
    pub fn insert(&mut self, value: Value) -> bool {
        match self.repr {
            CollectionRepr::Insertion => {
                if self.items.contains(&value) {
                    return false;
                }
                self.items.push(value);
                true
            }
            CollectionRepr::Sorted => {
                match self.items.binary_search_by(|probe| probe.total_cmp(&value)) {
                    Ok(_) => false,
                    Err(at) => {
                        self.items.insert(at, value);
                        true
                    }
                }
            }
        }
    }

    /// Whether an equal element is present.
    #[must_use]
    pub fn contains(&self, value: &Value) -> bool {
        match self.repr {
            CollectionRepr::Insertion => self.items.contains(value),
            CollectionRepr::Sorted => self
                .items
                .binary_search_by(|probe| probe.total_cmp(value))
                .is_ok(),
        }
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True if the set has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate elements in wire order.
    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.items.iter()
    }

    // Order-insensitive content hash: wrapping sum of element hashes.
    pub(crate) fn content_hash(&self) -> u64 {
        self.items
            .iter()
            .map(Value::hash64)
            .fold(0u64, u64::wrapping_add)
    }
}

impl<'a> IntoIterator for &'a SetValue {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl PartialEq for SetValue {
    fn eq(&self, other: &Self) -> bool {
        self.items.len() == other.items.len()
            && self.items.iter().all(|item| other.contains(item))
    }
}

impl Eq for SetValue {}

/// A map value keyed by structural equality.
///
/// Vector-backed like [`SetValue`], with the same iteration-order guarantee.
#[derive(Clone, Debug)]
pub struct MapValue {
    repr: CollectionRepr,
    entries: Vec<(Value, Value)>,
}

impl MapValue {
    /// An empty map with the given representation.
    #[must_use]
    pub const fn new(repr: CollectionRepr) -> Self {
        Self {
            repr,
            entries: Vec::new(),
        }
    }

    /// Build a map from entries; later duplicate keys replace earlier ones.
    #[must_use]
    pub fn from_entries(
        repr: CollectionRepr,
        entries: impl IntoIterator<Item = (Value, Value)>,
    ) -> Self {
        let mut map = Self::new(repr);
        for (key, value) in entries {
            map.insert(key, value);
        }
        map
    }

    /// The representation of this map.
    #[must_use]
    pub const fn repr(&self) -> CollectionRepr {
        self.repr
    }

    /// Insert a pair, replacing and returning any previous value for an
    /// equal key.
    pub fn insert(&mut self, key: Value, value: Value) -> Option<Value> {
        match self.repr {
            CollectionRepr::Insertion => {
                if let Some((_, existing)) = self.entries.iter_mut().find(|(k, _)| *k == key) {
                    return Some(std::mem::replace(existing, value));
                }
                self.entries.push((key, value));
                None
            }
            CollectionRepr::Sorted => {
                match self
                    .entries
                    .binary_search_by(|(probe, _)| probe.total_cmp(&key))
                {
                    Ok(at) => Some(std::mem::replace(&mut self.entries[at].1, value)),
                    Err(at) => {
                        self.entries.insert(at, (key, value));
                        None
                    }
                }
            }
        }
    }

    /// Look up the value for an equal key.
    #[must_use]
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in wire order.
    pub fn iter(&self) -> std::slice::Iter<'_, (Value, Value)> {
        self.entries.iter()
    }

    pub(crate) fn content_hash(&self) -> u64 {
        self.entries
            .iter()
            .map(|(k, v)| {
                let mut hasher = Xxh3::new();
                k.feed(&mut hasher);
                v.feed(&mut hasher);
                hasher.digest()
            })
            .fold(0u64, u64::wrapping_add)
    }
}

impl PartialEq for MapValue {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .all(|(k, v)| other.get(k).is_some_and(|o| o == v))
    }
}

impl Eq for MapValue {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_dedup_and_order_insensitive_eq() {
        let a = SetValue::from_items(
            CollectionRepr::Insertion,
            [Value::I32(1), Value::I32(2), Value::I32(1)],
        );
        assert_eq!(a.len(), 2);

        let b = SetValue::from_items(CollectionRepr::Insertion, [Value::I32(2), Value::I32(1)]);
        assert_eq!(a, b);
        assert_eq!(
            Value::Set(a.clone()).hash64(),
            Value::Set(b.clone()).hash64()
        );
    }

    #[test]
    fn test_sorted_set_iterates_in_order() {
        let s = SetValue::from_items(
            CollectionRepr::Sorted,
            [Value::I32(3), Value::I32(1), Value::I32(2)],
        );
        let got: Vec<&Value> = s.iter().collect();
        assert_eq!(got, vec![&Value::I32(1), &Value::I32(2), &Value::I32(3)]);
    }

    #[test]
    fn test_map_replaces_on_duplicate_key() {
        let mut m = MapValue::new(CollectionRepr::Insertion);
        assert!(m.insert(Value::Str("k".into()), Value::I32(1)).is_none());
        assert_eq!(
            m.insert(Value::Str("k".into()), Value::I32(2)),
            Some(Value::I32(1))
        );
        assert_eq!(m.len(), 1);
        assert_eq!(m.get(&Value::Str("k".into())), Some(&Value::I32(2)));
    }

    #[test]
    fn test_double_equality_edge_cases() {
        assert_eq!(Value::Double(0.0), Value::Double(-0.0));
        assert_eq!(Value::Double(f64::NAN), Value::Double(f64::NAN));
        assert_eq!(
            Value::Double(0.0).hash64(),
            Value::Double(-0.0).hash64()
        );
    }

    #[test]
    fn test_render() {
        let mut out = String::new();
        Value::Str("a\"b\n".into()).render_into(&mut out);
        assert_eq!(out, "\"a\\\"b\\n\"");

        let mut out = String::new();
        Value::List(vec![Value::I32(1), Value::I32(2)]).render_into(&mut out);
        assert_eq!(out, "[1,2]");

        let mut out = String::new();
        Value::Binary(Bytes::from_static(b"\x01\x02")).render_into(&mut out);
        assert_eq!(out, "b64(AQI)");
    }

    #[test]
    fn test_collection_ordering_uses_hash() {
        let a = Value::List(vec![Value::I32(1)]);
        let b = Value::List(vec![Value::I32(2)]);
        let expect = a.hash64().cmp(&b.hash64());
        assert_eq!(a.total_cmp(&b), expect);
    }
}
