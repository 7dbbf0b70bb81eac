//! Wire format decoder
//!
//! Mirrors the writer: loop on type tags until the terminator, dispatch on
//! the target descriptor's field table, and generically skip anything the
//! schema does not know about. A known field carrying the wrong tag is a
//! fatal decode error; no partial message is ever returned.

use std::sync::Arc;

use bytes::Bytes;
use tracing::trace;

use super::{STOP, WireType};
use crate::descriptor::{Descriptor, EnumValue, MessageDescriptor};
use crate::error::{Error, Result};
use crate::model::{MapValue, Message, SetValue, Value};

// Nested messages and containers recurse; the nesting depth on the wire is
// sender-controlled, so it is capped like the count-driven allocations.
const MAX_DEPTH: usize = 64;

/// Decode one message from the front of `bytes` in strict mode.
pub fn decode(bytes: &[u8], descriptor: &Arc<MessageDescriptor>) -> Result<Message> {
    let mut buf = bytes;
    read_message(&mut buf, descriptor, true)
}

/// Read one message from the buffer, advancing it past the terminator.
pub fn read_message(
    buf: &mut &[u8],
    descriptor: &Arc<MessageDescriptor>,
    strict: bool,
) -> Result<Message> {
    read_nested(buf, descriptor, strict, 0)
}

fn read_nested(
    buf: &mut &[u8],
    descriptor: &Arc<MessageDescriptor>,
    strict: bool,
    depth: usize,
) -> Result<Message> {
    if depth >= MAX_DEPTH {
        return Err(Error::DepthLimitExceeded { limit: MAX_DEPTH });
    }
    let mut builder = descriptor.start_builder();
    loop {
        let tag = read_u8(buf)?;
        if tag == STOP {
            break;
        }
        let wire_type = WireType::from_u8(tag).ok_or(Error::UnknownWireType { tag })?;
        let id = read_u16(buf)?;
        if let Some(field) = descriptor.field_by_id(id) {
            let field_type = field.descriptor();
            let expected = WireType::for_descriptor(&field_type);
            if expected != wire_type {
                return Err(Error::WireTypeMismatch {
                    field: field.name().to_owned(),
                    expected,
                    actual: wire_type,
                });
            }
            let value = read_value(buf, &field_type, strict, depth)?;
            builder.set(id, value)?;
        } else {
            trace!(message = descriptor.name(), id, tag = %wire_type, "skipping unknown field");
            skip_value(buf, wire_type, depth)?;
        }
    }
    Ok(builder.build())
}

fn read_value(
    buf: &mut &[u8],
    descriptor: &Descriptor,
    strict: bool,
    depth: usize,
) -> Result<Value> {
    match descriptor {
        Descriptor::Void => Ok(Value::Void),
        Descriptor::Bool => Ok(Value::Bool(read_u8(buf)? != 0)),
        Descriptor::Byte => Ok(Value::Byte(read_u8(buf)? as i8)),
        Descriptor::I16 => Ok(Value::I16(read_i16(buf)?)),
        Descriptor::I32 => Ok(Value::I32(read_i32(buf)?)),
        Descriptor::I64 => Ok(Value::I64(read_i64(buf)?)),
        Descriptor::Double => Ok(Value::Double(f64::from_bits(read_u64(buf)?))),
        Descriptor::Str => {
            let len = read_u32(buf)? as usize;
            let data = take(buf, len)?;
            Ok(Value::Str(String::from_utf8(data.to_vec())?))
        }
        Descriptor::Binary => {
            let len = read_u32(buf)? as usize;
            let data = take(buf, len)?;
            Ok(Value::Binary(Bytes::copy_from_slice(data)))
        }
        Descriptor::Enum(e) => Ok(Value::Enum(EnumValue::new(e.clone(), read_i32(buf)?))),
        Descriptor::Message(m) => Ok(Value::Message(read_nested(buf, m, strict, depth + 1)?)),
        Descriptor::List(list) => {
            let element = list.element_type();
            check_element_tag(buf, &element, "list element")?;
            let count = read_u32(buf)?;
            let mut items = Vec::with_capacity(sane_capacity(count));
            for _ in 0..count {
                items.push(read_value(buf, &element, strict, depth + 1)?);
            }
            Ok(Value::List(items))
        }
        Descriptor::Set(set) => {
            let element = set.element_type();
            check_element_tag(buf, &element, "set element")?;
            let count = read_u32(buf)?;
            let mut items = SetValue::new(set.repr());
            for _ in 0..count {
                items.insert(read_value(buf, &element, strict, depth + 1)?);
            }
            Ok(Value::Set(items))
        }
        Descriptor::Map(map) => {
            let key_type = map.key_type();
            let value_type = map.value_type();
            check_element_tag(buf, &key_type, "map key")?;
            check_element_tag(buf, &value_type, "map value")?;
            let count = read_u32(buf)?;
            let mut entries = MapValue::new(map.repr());
            for _ in 0..count {
                let key = read_value(buf, &key_type, strict, depth + 1)?;
                let value = read_value(buf, &value_type, strict, depth + 1)?;
                entries.insert(key, value);
            }
            Ok(Value::Map(entries))
        }
    }
}

fn check_element_tag(buf: &mut &[u8], descriptor: &Descriptor, context: &'static str) -> Result<()> {
    let tag = read_u8(buf)?;
    let actual = WireType::from_u8(tag).ok_or(Error::UnknownWireType { tag })?;
    let expected = WireType::for_descriptor(descriptor);
    if actual != expected {
        return Err(Error::ElementTypeMismatch {
            context,
            expected,
            actual,
        });
    }
    Ok(())
}

/// Skip one value of the given wire type without knowing its application
/// type, recursing into containers and nested messages using only
/// wire-level tags. This is the schema-evolution path; the nesting depth
/// comes entirely from the wire, so the same cap applies.
fn skip_value(buf: &mut &[u8], wire_type: WireType, depth: usize) -> Result<()> {
    if depth >= MAX_DEPTH {
        return Err(Error::DepthLimitExceeded { limit: MAX_DEPTH });
    }
    match wire_type {
        WireType::Void => Ok(()),
        WireType::Bool | WireType::Byte => take(buf, 1).map(drop),
        WireType::I16 => take(buf, 2).map(drop),
        WireType::I32 => take(buf, 4).map(drop),
        WireType::I64 | WireType::Double => take(buf, 8).map(drop),
        WireType::Binary => {
            let len = read_u32(buf)? as usize;
            take(buf, len).map(drop)
        }
        WireType::Message => loop {
            let tag = read_u8(buf)?;
            if tag == STOP {
                return Ok(());
            }
            let nested = WireType::from_u8(tag).ok_or(Error::UnknownWireType { tag })?;
            let _ = read_u16(buf)?;
            skip_value(buf, nested, depth + 1)?;
        },
        WireType::Map => {
            let key_type = read_wire_type(buf)?;
            let value_type = read_wire_type(buf)?;
            let count = read_u32(buf)?;
            for _ in 0..count {
                skip_value(buf, key_type, depth + 1)?;
                skip_value(buf, value_type, depth + 1)?;
            }
            Ok(())
        }
        WireType::Set | WireType::List => {
            let element_type = read_wire_type(buf)?;
            let count = read_u32(buf)?;
            for _ in 0..count {
                skip_value(buf, element_type, depth + 1)?;
            }
            Ok(())
        }
    }
}

fn read_wire_type(buf: &mut &[u8]) -> Result<WireType> {
    let tag = read_u8(buf)?;
    WireType::from_u8(tag).ok_or(Error::UnknownWireType { tag })
}

// Collections on the wire declare their count up front; cap the initial
// allocation so a corrupt count cannot reserve gigabytes.
fn sane_capacity(count: u32) -> usize {
    (count as usize).min(1 << 16)
}

fn take<'a>(buf: &mut &'a [u8], n: usize) -> Result<&'a [u8]> {
    if buf.len() < n {
        return Err(Error::UnexpectedEof {
            needed: n,
            remaining: buf.len(),
        });
    }
    let (head, tail) = buf.split_at(n);
    *buf = tail;
    Ok(head)
}

fn read_u8(buf: &mut &[u8]) -> Result<u8> {
    Ok(take(buf, 1)?[0])
}

fn read_u16(buf: &mut &[u8]) -> Result<u16> {
    let data = take(buf, 2)?;
    Ok(u16::from_be_bytes([data[0], data[1]]))
}

fn read_i16(buf: &mut &[u8]) -> Result<i16> {
    let data = take(buf, 2)?;
    Ok(i16::from_be_bytes([data[0], data[1]]))
}

fn read_i32(buf: &mut &[u8]) -> Result<i32> {
    let data = take(buf, 4)?;
    Ok(i32::from_be_bytes([data[0], data[1], data[2], data[3]]))
}

fn read_u32(buf: &mut &[u8]) -> Result<u32> {
    let data = take(buf, 4)?;
    Ok(u32::from_be_bytes([data[0], data[1], data[2], data[3]]))
}

fn read_i64(buf: &mut &[u8]) -> Result<i64> {
    let data = take(buf, 8)?;
    Ok(i64::from_be_bytes([
        data[0], data[1], data[2], data[3], data[4], data[5], data[6], data[7],
    ]))
}

fn read_u64(buf: &mut &[u8]) -> Result<u64> {
    let data = take(buf, 8)?;
    Ok(u64::from_be_bytes([
        data[0], data[1], data[2], data[3], data[4], data[5], data[6], data[7],
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{Field, Provider, Requirement, Variant};
    use crate::wire::encode;

    fn simple() -> Arc<MessageDescriptor> {
        MessageDescriptor::builder("test.Simple", Variant::Struct)
            .field(Field::new(
                1,
                "value",
                Requirement::Optional,
                Provider::of(Descriptor::I32),
            ))
            .field(Field::new(
                2,
                "label",
                Requirement::Optional,
                Provider::of(Descriptor::Str),
            ))
            .build()
    }

    #[test]
    fn test_truncated_input_fails() {
        let descriptor = simple();
        let mut builder = descriptor.start_builder();
        builder.set(1, Value::I32(42)).unwrap();
        let bytes = encode(&builder.build());

        let result = decode(&bytes[..bytes.len() - 2], &descriptor);
        assert!(matches!(result, Err(Error::UnexpectedEof { .. })));
    }

    #[test]
    fn test_type_mismatch_names_field_and_tags() {
        // Field 1 declared i32 but carrying a binary tag.
        let bytes = [0x0B, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00];
        match decode(&bytes, &simple()) {
            Err(Error::WireTypeMismatch {
                field,
                expected,
                actual,
            }) => {
                assert_eq!(field, "value");
                assert_eq!(expected, WireType::I32);
                assert_eq!(actual, WireType::Binary);
            }
            other => panic!("expected WireTypeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        let bytes = [0x0B, 0x00, 0x02, 0x00, 0x00, 0x00, 0x01, 0xFF, 0x00];
        let result = decode(&bytes, &simple());
        assert!(matches!(result, Err(Error::InvalidUtf8(_))));
    }

    #[test]
    fn test_skip_unknown_field_types() {
        // Unknown field id 99 carrying a map<binary,i32> of one entry,
        // followed by known field 1.
        let bytes = [
            0x0D, 0x00, 0x63, // map, field 99
            0x0B, 0x08, 0x00, 0x00, 0x00, 0x01, // binary keys, i32 values, 1 entry
            0x00, 0x00, 0x00, 0x01, 0x61, // key "a"
            0x00, 0x00, 0x00, 0x07, // value 7
            0x08, 0x00, 0x01, 0x00, 0x00, 0x00, 0x2A, // field 1 = 42
            0x00,
        ];
        let message = decode(&bytes, &simple()).unwrap();
        assert_eq!(message.get(1), Some(&Value::I32(42)));
    }

    #[test]
    fn test_unknown_tag_is_fatal() {
        let bytes = [0x05, 0x00, 0x01, 0x00];
        let result = decode(&bytes, &simple());
        assert!(matches!(result, Err(Error::UnknownWireType { tag: 5 })));
    }

    #[test]
    fn test_unknown_field_nesting_is_depth_limited() {
        // An endless run of nested-message openers on an unknown field id.
        let mut bytes = Vec::new();
        for _ in 0..10_000 {
            bytes.extend_from_slice(&[0x0C, 0x00, 0x63]);
        }
        let result = decode(&bytes, &simple());
        assert!(matches!(result, Err(Error::DepthLimitExceeded { .. })));
    }

    #[test]
    fn test_moderate_unknown_nesting_still_decodes() {
        // 32 properly terminated levels stay under the cap.
        let mut bytes = Vec::new();
        for _ in 0..32 {
            bytes.extend_from_slice(&[0x0C, 0x00, 0x63]);
        }
        bytes.extend(std::iter::repeat_n(0x00, 33));
        let message = decode(&bytes, &simple()).unwrap();
        assert!(!message.has(1));
    }

    #[test]
    fn test_known_field_nesting_is_depth_limited() {
        use std::sync::OnceLock;

        static DEEP: OnceLock<Arc<MessageDescriptor>> = OnceLock::new();
        fn deep() -> Arc<MessageDescriptor> {
            DEEP.get_or_init(|| {
                MessageDescriptor::builder("test.Deep", Variant::Struct)
                    .field(Field::new(
                        1,
                        "next",
                        Requirement::Optional,
                        Provider::lazy(|| Descriptor::Message(deep())),
                    ))
                    .build()
            })
            .clone()
        }

        let mut bytes = Vec::new();
        for _ in 0..10_000 {
            bytes.extend_from_slice(&[0x0C, 0x00, 0x01]);
        }
        let result = decode(&bytes, &deep());
        assert!(matches!(result, Err(Error::DepthLimitExceeded { .. })));
    }
}
