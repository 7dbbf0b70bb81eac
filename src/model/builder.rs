//! Mutable message builders

use std::sync::Arc;

use crate::descriptor::{Descriptor, MessageDescriptor, Requirement, TypeKind};
use crate::error::{Error, Result};
use crate::model::{BitSet, MapValue, Message, SetValue, Value};

/// Per-field staging state.
///
/// A message-typed field is either unset, frozen to a built value, or open
/// as a live child builder; holding a value and a builder at once is
/// unrepresentable.
#[derive(Debug)]
enum Slot {
    Unset,
    Value(Value),
    Builder(Box<MessageBuilder>),
}

/// Mutable staging counterpart of a [`Message`].
///
/// Tracks two bit vectors sized to the field count: `optionals` (is the
/// field set) and `modified` (has the field changed since this builder was
/// created). A merge can set a field to its existing value, which marks it
/// modified without changing is-set.
///
/// Builders are single-owner and not thread-safe during mutation.
#[derive(Debug)]
pub struct MessageBuilder {
    descriptor: Arc<MessageDescriptor>,
    slots: Vec<Slot>,
    optionals: BitSet,
    modified: BitSet,
    union_index: Option<usize>,
}

impl MessageBuilder {
    /// An empty builder, with `Default`-requirement fields pre-populated
    /// with their schema defaults (not marked set).
    #[must_use]
    pub fn new(descriptor: Arc<MessageDescriptor>) -> Self {
        let count = descriptor.fields().len();
        let mut slots: Vec<Slot> = (0..count).map(|_| Slot::Unset).collect();
        if !descriptor.is_union() {
            for (index, field) in descriptor.fields().iter().enumerate() {
                if field.requirement() == Requirement::Default {
                    if let Some(default) = field.effective_default() {
                        slots[index] = Slot::Value(default.clone());
                    }
                }
            }
        }
        Self {
            descriptor,
            slots,
            optionals: BitSet::with_capacity(count),
            modified: BitSet::with_capacity(count),
            union_index: None,
        }
    }

    /// A builder pre-populated from a message's field values.
    #[must_use]
    pub fn from_message(message: &Message) -> Self {
        let descriptor = message.descriptor().clone();
        let count = descriptor.fields().len();
        let mut builder = Self::new(descriptor);
        for index in 0..count {
            if let Some(value) = message.raw(index) {
                builder.slots[index] = Slot::Value(value.clone());
                builder.optionals.set(index);
            }
        }
        builder.union_index = message.union_index();
        builder
    }

    /// The descriptor of the message type being built.
    #[must_use]
    pub fn descriptor(&self) -> &Arc<MessageDescriptor> {
        &self.descriptor
    }

    /// Set a field value. The value kind must match the field's declared
    /// type; on a union this deactivates any previously active field.
    pub fn set(&mut self, id: u16, value: Value) -> Result<&mut Self> {
        let index = self.index_of(id)?;
        let expected = self.descriptor.fields()[index].descriptor().kind();
        if value.kind() != expected {
            return Err(Error::ValueKind {
                field: self.descriptor.fields()[index].name().to_owned(),
                expected: expected.name(),
                actual: value.kind().name(),
            });
        }
        if self.descriptor.is_union() {
            self.activate(index);
        }
        self.slots[index] = Slot::Value(value);
        self.optionals.set(index);
        self.modified.set(index);
        Ok(self)
    }

    /// Clear a field.
    pub fn clear(&mut self, id: u16) -> Result<&mut Self> {
        let index = self.index_of(id)?;
        self.slots[index] = Slot::Unset;
        self.optionals.clear(index);
        self.modified.set(index);
        if self.union_index == Some(index) {
            self.union_index = None;
        }
        Ok(self)
    }

    /// Whether the field is currently set. Unknown ids read as false.
    #[must_use]
    pub fn is_set(&self, id: u16) -> bool {
        self.descriptor
            .index_of(id)
            .is_some_and(|i| self.optionals.get(i))
    }

    /// Whether the field has changed since this builder was created.
    /// Unknown ids read as false.
    #[must_use]
    pub fn is_modified(&self, id: u16) -> bool {
        self.descriptor
            .index_of(id)
            .is_some_and(|i| self.modified.get(i))
    }

    /// Mutable access to a message-typed field as a child builder.
    ///
    /// Created on demand; a frozen built value is unfrozen via
    /// [`Message::mutate`] first. Marks the field set and modified.
    pub fn mutable_message(&mut self, id: u16) -> Result<&mut MessageBuilder> {
        let index = self.index_of(id)?;
        let Descriptor::Message(child) = self.descriptor.fields()[index].descriptor() else {
            return Err(self.wrong_kind(index, TypeKind::Message));
        };
        if self.descriptor.is_union() {
            self.activate(index);
        }
        self.optionals.set(index);
        self.modified.set(index);
        if !matches!(self.slots[index], Slot::Builder(_)) {
            let opened = match std::mem::replace(&mut self.slots[index], Slot::Unset) {
                Slot::Value(Value::Message(frozen)) => frozen.mutate(),
                _ => MessageBuilder::new(child),
            };
            self.slots[index] = Slot::Builder(Box::new(opened));
        }
        match &mut self.slots[index] {
            Slot::Builder(builder) => Ok(builder),
            _ => unreachable!("slot was just opened as a builder"),
        }
    }

    /// Mutable handle to a list-typed field, created empty on demand.
    /// Marks the field set and modified.
    pub fn mutable_list(&mut self, id: u16) -> Result<&mut Vec<Value>> {
        let index = self.index_of(id)?;
        if self.descriptor.fields()[index].descriptor().kind() != TypeKind::List {
            return Err(self.wrong_kind(index, TypeKind::List));
        }
        self.touch(index);
        if !matches!(self.slots[index], Slot::Value(Value::List(_))) {
            self.slots[index] = Slot::Value(Value::List(Vec::new()));
        }
        match &mut self.slots[index] {
            Slot::Value(Value::List(items)) => Ok(items),
            _ => unreachable!("slot was just populated with a list"),
        }
    }

    /// Mutable handle to a set-typed field, created empty on demand.
    /// Marks the field set and modified.
    pub fn mutable_set(&mut self, id: u16) -> Result<&mut SetValue> {
        let index = self.index_of(id)?;
        let Descriptor::Set(set) = self.descriptor.fields()[index].descriptor() else {
            return Err(self.wrong_kind(index, TypeKind::Set));
        };
        self.touch(index);
        if !matches!(self.slots[index], Slot::Value(Value::Set(_))) {
            self.slots[index] = Slot::Value(Value::Set(SetValue::new(set.repr())));
        }
        match &mut self.slots[index] {
            Slot::Value(Value::Set(value)) => Ok(value),
            _ => unreachable!("slot was just populated with a set"),
        }
    }

    /// Mutable handle to a map-typed field, created empty on demand.
    /// Marks the field set and modified.
    pub fn mutable_map(&mut self, id: u16) -> Result<&mut MapValue> {
        let index = self.index_of(id)?;
        let Descriptor::Map(map) = self.descriptor.fields()[index].descriptor() else {
            return Err(self.wrong_kind(index, TypeKind::Map));
        };
        self.touch(index);
        if !matches!(self.slots[index], Slot::Value(Value::Map(_))) {
            self.slots[index] = Slot::Value(Value::Map(MapValue::new(map.repr())));
        }
        match &mut self.slots[index] {
            Slot::Value(Value::Map(value)) => Ok(value),
            _ => unreachable!("slot was just populated with a map"),
        }
    }

    /// Merge a message into this builder, field by field.
    ///
    /// Scalars overwrite, lists replace wholesale, sets and maps
    /// union-merge, and message fields merge recursively into any live
    /// child builder. Adopting a union field that differs from the active
    /// one is a plain set; adopting the same active message-typed field
    /// merges recursively instead.
    pub fn merge(&mut self, other: &Message) -> Result<&mut Self> {
        let descriptor = other.descriptor().clone();
        if descriptor.is_union() {
            let Some(active) = other.union_index() else {
                return Ok(self);
            };
            let field = &descriptor.fields()[active];
            let Some(value) = other.raw(active) else {
                return Ok(self);
            };
            let self_index = self.index_of(field.id())?;
            let same_active = self.union_index == Some(self_index);
            if let Value::Message(sub) = value {
                if same_active
                    && matches!(
                        self.slots[self_index],
                        Slot::Builder(_) | Slot::Value(Value::Message(_))
                    )
                {
                    self.mutable_message(field.id())?.merge(sub)?;
                    return Ok(self);
                }
            }
            self.set(field.id(), value.clone())?;
            return Ok(self);
        }

        for (index, field) in descriptor.fields().iter().enumerate() {
            let Some(value) = other.raw(index) else {
                continue;
            };
            match value {
                Value::Message(sub) => {
                    let self_index = self.index_of(field.id())?;
                    if matches!(
                        self.slots[self_index],
                        Slot::Builder(_) | Slot::Value(Value::Message(_))
                    ) {
                        self.mutable_message(field.id())?.merge(sub)?;
                    } else {
                        self.set(field.id(), value.clone())?;
                    }
                }
                Value::Set(source) => {
                    let target = self.mutable_set(field.id())?;
                    for item in source {
                        target.insert(item.clone());
                    }
                }
                Value::Map(source) => {
                    let target = self.mutable_map(field.id())?;
                    for (key, item) in source.iter() {
                        target.insert(key.clone(), item.clone());
                    }
                }
                _ => {
                    self.set(field.id(), value.clone())?;
                }
            }
        }
        Ok(self)
    }

    /// Whether the staged data would make a valid message: all required
    /// fields set for a struct, exactly one non-null active field for a
    /// union. Never called implicitly by [`MessageBuilder::build`].
    #[must_use]
    pub fn valid(&self) -> bool {
        if self.descriptor.is_union() {
            return self
                .union_index
                .is_some_and(|i| !matches!(self.slots[i], Slot::Unset));
        }
        self.descriptor
            .fields()
            .iter()
            .enumerate()
            .all(|(i, f)| f.requirement() != Requirement::Required || self.optionals.get(i))
    }

    /// Like [`MessageBuilder::valid`], but reporting *all* missing required
    /// field names in one aggregate error (or a single "no field set" error
    /// for a union).
    pub fn validate(&self) -> Result<()> {
        if self.descriptor.is_union() {
            if self.valid() {
                return Ok(());
            }
            return Err(Error::NoUnionFieldSet {
                message: self.descriptor.name().to_owned(),
            });
        }
        let missing: Vec<String> = self
            .descriptor
            .fields()
            .iter()
            .enumerate()
            .filter(|(i, f)| f.requirement() == Requirement::Required && !self.optionals.get(*i))
            .map(|(_, f)| f.name().to_owned())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::MissingRequired {
                message: self.descriptor.name().to_owned(),
                fields: missing,
            })
        }
    }

    /// Snapshot the staged state into an immutable [`Message`].
    ///
    /// Live child builders are built (winning over stale frozen values) and
    /// `Default`-requirement fields left unset take their schema default.
    /// Validation is *not* run; building an incomplete message is the
    /// caller's prerogative until [`MessageBuilder::validate`] is invoked.
    #[must_use]
    pub fn build(&self) -> Message {
        let is_union = self.descriptor.is_union();
        let values = self
            .descriptor
            .fields()
            .iter()
            .zip(&self.slots)
            .map(|(field, slot)| match slot {
                Slot::Builder(builder) => Some(Value::Message(builder.build())),
                Slot::Value(value) => Some(value.clone()),
                Slot::Unset => {
                    if !is_union && field.requirement() == Requirement::Default {
                        field.effective_default().cloned()
                    } else {
                        None
                    }
                }
            })
            .collect();
        Message::from_parts(self.descriptor.clone(), values, self.union_index)
    }

    fn index_of(&self, id: u16) -> Result<usize> {
        self.descriptor.index_of(id).ok_or_else(|| Error::UnknownField {
            message: self.descriptor.name().to_owned(),
            id,
        })
    }

    fn wrong_kind(&self, index: usize, expected: TypeKind) -> Error {
        let field = &self.descriptor.fields()[index];
        Error::ValueKind {
            field: field.name().to_owned(),
            expected: expected.name(),
            actual: field.descriptor().kind().name(),
        }
    }

    fn touch(&mut self, index: usize) {
        if self.descriptor.is_union() {
            self.activate(index);
        }
        self.optionals.set(index);
        self.modified.set(index);
    }

    // Union bookkeeping: deactivating the previous field counts as
    // modifying it.
    fn activate(&mut self, index: usize) {
        if let Some(previous) = self.union_index {
            if previous != index {
                self.slots[previous] = Slot::Unset;
                self.optionals.clear(previous);
                self.modified.set(previous);
            }
        }
        self.union_index = Some(index);
    }
}
