//! Binary TLV wire codec
//!
//! The only component touching raw bytes. Each present field of an
//! aggregate encodes as `[type-tag:1][field-id:2 BE][payload]`, with a lone
//! `0x00` terminating the field loop; no length prefix wraps the aggregate,
//! so encoding is streaming and single-pass. Unknown field ids are skipped
//! generically on decode, which is what gives forward/backward wire
//! compatibility.

mod reader;
mod writer;

pub use reader::{decode, read_message};
pub use writer::{encode, write_message};

use std::fmt;

use bytes::Bytes;
use std::sync::Arc;

use crate::descriptor::{Descriptor, MessageDescriptor, TypeKind};
use crate::error::Result;
use crate::model::Message;

/// Field-loop terminator byte; reserved, never a value type tag.
pub const STOP: u8 = 0x00;

/// One-byte wire type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WireType {
    /// Payload-less union case
    Void = 1,
    /// One byte, `0x00` or `0x01`
    Bool = 2,
    /// Signed 8-bit integer
    Byte = 3,
    /// 64-bit IEEE float, big-endian
    Double = 4,
    /// Signed 16-bit integer, big-endian
    I16 = 6,
    /// Signed 32-bit integer, big-endian; also carries enums
    I32 = 8,
    /// Signed 64-bit integer, big-endian
    I64 = 10,
    /// Length-prefixed bytes; strings are UTF-8
    Binary = 11,
    /// Nested struct, union or exception
    Message = 12,
    /// Key-tag, value-tag, count, then pairs
    Map = 13,
    /// Element-tag, count, then elements
    Set = 14,
    /// Element-tag, count, then elements
    List = 15,
}

impl WireType {
    /// Convert from a tag byte.
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Void),
            2 => Some(Self::Bool),
            3 => Some(Self::Byte),
            4 => Some(Self::Double),
            6 => Some(Self::I16),
            8 => Some(Self::I32),
            10 => Some(Self::I64),
            11 => Some(Self::Binary),
            12 => Some(Self::Message),
            13 => Some(Self::Map),
            14 => Some(Self::Set),
            15 => Some(Self::List),
            _ => None,
        }
    }

    /// Convert to the tag byte.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// The tag a value of the given type carries on the wire.
    #[must_use]
    pub fn for_descriptor(descriptor: &Descriptor) -> Self {
        match descriptor.kind() {
            TypeKind::Void => Self::Void,
            TypeKind::Bool => Self::Bool,
            TypeKind::Byte => Self::Byte,
            TypeKind::Double => Self::Double,
            TypeKind::I16 => Self::I16,
            TypeKind::I32 | TypeKind::Enum => Self::I32,
            TypeKind::I64 => Self::I64,
            TypeKind::Str | TypeKind::Binary => Self::Binary,
            TypeKind::Message => Self::Message,
            TypeKind::Map => Self::Map,
            TypeKind::Set => Self::Set,
            TypeKind::List => Self::List,
        }
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Void => "void",
            Self::Bool => "bool",
            Self::Byte => "byte",
            Self::Double => "double",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::Binary => "binary",
            Self::Message => "message",
            Self::Map => "map",
            Self::Set => "set",
            Self::List => "list",
        })
    }
}

/// Binary codec with a decode-time strictness flag.
///
/// Unknown aggregate fields are always tolerated regardless of mode;
/// `strict` (the default) is reserved for tightening how malformed nested
/// structures are treated and currently changes no other behavior.
#[derive(Debug, Clone, Copy)]
pub struct BinaryCodec {
    strict: bool,
}

impl BinaryCodec {
    /// Create a codec with the given strictness.
    #[must_use]
    pub const fn new(strict: bool) -> Self {
        Self { strict }
    }

    /// Whether this codec decodes strictly.
    #[must_use]
    pub const fn strict(&self) -> bool {
        self.strict
    }

    /// Encode a message to bytes.
    #[must_use]
    pub fn encode(&self, message: &Message) -> Bytes {
        writer::encode(message)
    }

    /// Decode one message from the front of `bytes` against a descriptor.
    pub fn decode(&self, bytes: &[u8], descriptor: &Arc<MessageDescriptor>) -> Result<Message> {
        let mut buf = bytes;
        reader::read_message(&mut buf, descriptor, self.strict)
    }
}

impl Default for BinaryCodec {
    fn default() -> Self {
        Self::new(true)
    }
}
