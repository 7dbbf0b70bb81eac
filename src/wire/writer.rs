//! Wire format encoder
//!
//! Single-pass and streaming: fields are emitted in declaration order with
//! no aggregate length prefix, the terminator byte alone delimits each
//! nested message.

use bytes::{BufMut, Bytes, BytesMut};

use super::{STOP, WireType};
use crate::descriptor::Descriptor;
use crate::model::{Message, Value};

/// Encode a message to bytes.
#[must_use]
pub fn encode(message: &Message) -> Bytes {
    let mut buf = BytesMut::new();
    write_message(&mut buf, message);
    buf.freeze()
}

/// Write a message's field loop plus terminator; returns bytes written.
pub fn write_message<B: BufMut>(buf: &mut B, message: &Message) -> usize {
    let mut written = 0;
    for (index, field) in message.descriptor().fields().iter().enumerate() {
        if let Some(value) = message.raw(index) {
            let descriptor = field.descriptor();
            buf.put_u8(WireType::for_descriptor(&descriptor).as_u8());
            buf.put_u16(field.id());
            written += 3 + write_value(buf, value, &descriptor);
        }
    }
    buf.put_u8(STOP);
    written + 1
}

// Values are kind-checked against their field descriptor when staged in a
// builder, so the pairing here cannot mismatch.
fn write_value<B: BufMut>(buf: &mut B, value: &Value, descriptor: &Descriptor) -> usize {
    match (value, descriptor) {
        (Value::Void, _) => 0,
        (Value::Bool(v), _) => {
            buf.put_u8(u8::from(*v));
            1
        }
        (Value::Byte(v), _) => {
            buf.put_i8(*v);
            1
        }
        (Value::I16(v), _) => {
            buf.put_i16(*v);
            2
        }
        (Value::I32(v), _) => {
            buf.put_i32(*v);
            4
        }
        (Value::I64(v), _) => {
            buf.put_i64(*v);
            8
        }
        (Value::Double(v), _) => {
            buf.put_f64(*v);
            8
        }
        (Value::Str(v), _) => {
            buf.put_u32(v.len() as u32);
            buf.put_slice(v.as_bytes());
            4 + v.len()
        }
        (Value::Binary(v), _) => {
            buf.put_u32(v.len() as u32);
            buf.put_slice(v);
            4 + v.len()
        }
        (Value::Enum(v), _) => {
            buf.put_i32(v.value());
            4
        }
        (Value::Message(m), _) => write_message(buf, m),
        (Value::List(items), Descriptor::List(list)) => {
            let element = list.element_type();
            buf.put_u8(WireType::for_descriptor(&element).as_u8());
            buf.put_u32(items.len() as u32);
            let mut written = 5;
            for item in items {
                written += write_value(buf, item, &element);
            }
            written
        }
        (Value::Set(items), Descriptor::Set(set)) => {
            let element = set.element_type();
            buf.put_u8(WireType::for_descriptor(&element).as_u8());
            buf.put_u32(items.len() as u32);
            let mut written = 5;
            for item in items {
                written += write_value(buf, item, &element);
            }
            written
        }
        (Value::Map(entries), Descriptor::Map(map)) => {
            let key_type = map.key_type();
            let value_type = map.value_type();
            buf.put_u8(WireType::for_descriptor(&key_type).as_u8());
            buf.put_u8(WireType::for_descriptor(&value_type).as_u8());
            buf.put_u32(entries.len() as u32);
            let mut written = 6;
            for (key, item) in entries.iter() {
                written += write_value(buf, key, &key_type);
                written += write_value(buf, item, &value_type);
            }
            written
        }
        _ => unreachable!("value kind verified against the field descriptor at build time"),
    }
}
