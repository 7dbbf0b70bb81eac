//! RPC call envelope
//!
//! A thin consumer of the message model: a remote call is a request struct
//! (one field per argument) and a response union whose fields are `success`
//! plus one per declared exception type. The envelope carries a method
//! name, a call type and a sequence id around the message payload; the
//! transport around that framing is out of scope here.

use std::fmt;
use std::sync::{
    Arc, LazyLock,
    atomic::{AtomicI32, Ordering},
};

use bytes::{BufMut, Bytes, BytesMut};
use thiserror::Error as ThisError;
use tracing::debug;

use crate::descriptor::{
    Descriptor, EnumDescriptor, EnumValue, Field, MessageDescriptor, Provider, Requirement,
    Variant,
};
use crate::error::{Error, Result};
use crate::model::{Message, MessageException, Value};
use crate::wire::{read_message, write_message};

/// Versioned envelope marker, carried in the high bits of the first i32.
pub const VERSION_1: i32 = 0x8001_0000_u32 as i32;

const VERSION_MASK: i32 = 0xFFFF_0000_u32 as i32;

/// Longest accepted method name on the wire.
pub const MAX_METHOD_NAME_LEN: usize = 255;

/// Call type discriminator for service calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CallType {
    /// Request expecting a reply
    Call = 1,
    /// Response to a call
    Reply = 2,
    /// Application-level exception response
    Exception = 3,
    /// Fire-and-forget request
    Oneway = 4,
}

impl CallType {
    /// Convert from byte.
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Call),
            2 => Some(Self::Reply),
            3 => Some(Self::Exception),
            4 => Some(Self::Oneway),
            _ => None,
        }
    }

    /// Convert to byte.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// True for the request directions.
    #[must_use]
    pub const fn is_request(self) -> bool {
        matches!(self, Self::Call | Self::Oneway)
    }
}

impl fmt::Display for CallType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Call => "call",
            Self::Reply => "reply",
            Self::Exception => "exception",
            Self::Oneway => "oneway",
        })
    }
}

/// Monotonic sequence-id source for a caller.
#[derive(Debug, Default)]
pub struct Sequence(AtomicI32);

impl Sequence {
    /// A sequence starting at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self(AtomicI32::new(0))
    }

    /// The next sequence id.
    pub fn next(&self) -> i32 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

/// A service call envelope: method name, call type, sequence id and the
/// message payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceCall {
    method: String,
    call_type: CallType,
    sequence: i32,
    body: Message,
}

impl ServiceCall {
    /// A request expecting a reply.
    pub fn call<S: Into<String>>(method: S, sequence: i32, request: Message) -> Self {
        Self {
            method: method.into(),
            call_type: CallType::Call,
            sequence,
            body: request,
        }
    }

    /// A fire-and-forget request.
    pub fn oneway<S: Into<String>>(method: S, sequence: i32, request: Message) -> Self {
        Self {
            method: method.into(),
            call_type: CallType::Oneway,
            sequence,
            body: request,
        }
    }

    /// A reply carrying the response union.
    pub fn reply<S: Into<String>>(method: S, sequence: i32, response: Message) -> Self {
        Self {
            method: method.into(),
            call_type: CallType::Reply,
            sequence,
            body: response,
        }
    }

    /// An exception reply carrying a generic application error. This is the
    /// path for *undeclared* failures; declared exceptions travel as fields
    /// of the response union in a normal reply.
    pub fn exception<S: Into<String>>(method: S, sequence: i32, error: &ApplicationError) -> Self {
        Self {
            method: method.into(),
            call_type: CallType::Exception,
            sequence,
            body: error.to_message(),
        }
    }

    /// Method name.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Call type discriminator.
    #[must_use]
    pub const fn call_type(&self) -> CallType {
        self.call_type
    }

    /// Sequence id.
    #[must_use]
    pub const fn sequence(&self) -> i32 {
        self.sequence
    }

    /// The message payload.
    #[must_use]
    pub fn body(&self) -> &Message {
        &self.body
    }
}

/// Write a service call in the versioned envelope framing; returns bytes
/// written.
pub fn write_call<B: BufMut>(buf: &mut B, call: &ServiceCall) -> usize {
    let method = call.method.as_bytes();
    buf.put_i32(VERSION_1 | i32::from(call.call_type.as_u8()));
    buf.put_u32(method.len() as u32);
    buf.put_slice(method);
    buf.put_i32(call.sequence);
    12 + method.len() + write_message(buf, &call.body)
}

/// Encode a service call to bytes.
#[must_use]
pub fn encode_call(call: &ServiceCall) -> Bytes {
    let mut buf = BytesMut::new();
    write_call(&mut buf, call);
    buf.freeze()
}

/// Read a service call, resolving the payload descriptor through `resolve`
/// from the method name and call type.
///
/// The versioned framing is always accepted; the bare legacy layout
/// (`len | name | type-byte | sequence`) only when `strict` is off.
/// `Exception` calls decode against the built-in application error
/// descriptor and need no resolver.
pub fn read_call<F>(buf: &mut &[u8], strict: bool, resolve: F) -> Result<ServiceCall>
where
    F: FnOnce(&str, CallType) -> Option<Arc<MessageDescriptor>>,
{
    let first = read_i32(buf)?;
    let (method, type_byte) = if first < 0 {
        let version = first & VERSION_MASK;
        if version != VERSION_1 {
            return Err(Error::BadProtocolVersion { version });
        }
        let type_byte = (first & 0xFF) as u8;
        (read_method_name(buf)?, type_byte)
    } else {
        if strict {
            return Err(Error::MissingProtocolVersion);
        }
        let method = method_name(buf, first)?;
        let type_byte = read_u8(buf)?;
        (method, type_byte)
    };
    let sequence = read_i32(buf)?;
    let call_type = CallType::from_u8(type_byte).ok_or(Error::InvalidCallType { type_byte })?;
    debug!(method = %method, call_type = %call_type, sequence, "reading service call");

    let body = if call_type == CallType::Exception {
        read_message(buf, application_error_descriptor(), strict)?
    } else {
        let descriptor = resolve(&method, call_type).ok_or_else(|| {
            Error::Application(ApplicationError::new(
                ApplicationErrorKind::UnknownMethod,
                format!("no such method {method}"),
            ))
        })?;
        read_message(buf, &descriptor, strict)?
    };

    Ok(ServiceCall {
        method,
        call_type,
        sequence,
        body,
    })
}

fn read_method_name(buf: &mut &[u8]) -> Result<String> {
    let len = read_i32(buf)?;
    method_name(buf, len)
}

fn method_name(buf: &mut &[u8], len: i32) -> Result<String> {
    if len < 1 || len as usize > MAX_METHOD_NAME_LEN {
        return Err(Error::MethodNameLength {
            length: i64::from(len),
        });
    }
    let mut data = vec![0u8; len as usize];
    if buf.len() < data.len() {
        return Err(Error::UnexpectedEof {
            needed: data.len(),
            remaining: buf.len(),
        });
    }
    data.copy_from_slice(&buf[..len as usize]);
    *buf = &buf[len as usize..];
    Ok(String::from_utf8(data)?)
}

fn read_u8(buf: &mut &[u8]) -> Result<u8> {
    let Some((&first, rest)) = buf.split_first() else {
        return Err(Error::UnexpectedEof {
            needed: 1,
            remaining: 0,
        });
    };
    *buf = rest;
    Ok(first)
}

fn read_i32(buf: &mut &[u8]) -> Result<i32> {
    if buf.len() < 4 {
        return Err(Error::UnexpectedEof {
            needed: 4,
            remaining: buf.len(),
        });
    }
    let value = i32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);
    *buf = &buf[4..];
    Ok(value)
}

/// Kinds of generic application-level failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ApplicationErrorKind {
    /// Unspecified failure
    Unknown = 0,
    /// Method name not known to the service
    UnknownMethod = 1,
    /// Call type not valid in context
    InvalidMessageType = 2,
    /// Reply method name did not match the call
    WrongMethodName = 3,
    /// Reply sequence id did not match the call
    BadSequenceId = 4,
    /// Response union decoded with no field set
    MissingResult = 5,
    /// Undeclared failure inside the server implementation
    InternalError = 6,
    /// Envelope could not be read
    ProtocolError = 7,
    /// Payload transform not supported
    InvalidTransform = 8,
    /// Protocol version not supported
    InvalidProtocol = 9,
    /// Client type not supported
    UnsupportedClientType = 10,
}

impl ApplicationErrorKind {
    /// Convert from the numeric id.
    #[must_use]
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Unknown),
            1 => Some(Self::UnknownMethod),
            2 => Some(Self::InvalidMessageType),
            3 => Some(Self::WrongMethodName),
            4 => Some(Self::BadSequenceId),
            5 => Some(Self::MissingResult),
            6 => Some(Self::InternalError),
            7 => Some(Self::ProtocolError),
            8 => Some(Self::InvalidTransform),
            9 => Some(Self::InvalidProtocol),
            10 => Some(Self::UnsupportedClientType),
            _ => None,
        }
    }

    /// The numeric id.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// The declared name of this kind.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::UnknownMethod => "UNKNOWN_METHOD",
            Self::InvalidMessageType => "INVALID_MESSAGE_TYPE",
            Self::WrongMethodName => "WRONG_METHOD_NAME",
            Self::BadSequenceId => "BAD_SEQUENCE_ID",
            Self::MissingResult => "MISSING_RESULT",
            Self::InternalError => "INTERNAL_ERROR",
            Self::ProtocolError => "PROTOCOL_ERROR",
            Self::InvalidTransform => "INVALID_TRANSFORM",
            Self::InvalidProtocol => "INVALID_PROTOCOL",
            Self::UnsupportedClientType => "UNSUPPORTED_CLIENT_TYPE",
        }
    }
}

impl fmt::Display for ApplicationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A generic application-level RPC failure.
///
/// Not part of any declared response union: it travels as the body of an
/// `Exception` call and models undeclared server failures, protocol
/// breakage and missing results.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
#[error("{kind}: {message}")]
pub struct ApplicationError {
    /// What went wrong
    pub message: String,
    /// Failure classification
    pub kind: ApplicationErrorKind,
}

impl ApplicationError {
    /// Create an application error.
    pub fn new<S: Into<String>>(kind: ApplicationErrorKind, message: S) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    /// The error for a response union that decoded with no field set.
    #[must_use]
    pub fn missing_result(method: &str) -> Self {
        Self::new(
            ApplicationErrorKind::MissingResult,
            format!("no result field set in reply to {method}"),
        )
    }

    /// Freeze into the wire-facing exception message.
    #[must_use]
    pub fn to_message(&self) -> Message {
        let descriptor = application_error_descriptor();
        let mut builder = descriptor.start_builder();
        // The descriptor is static and the field kinds match by
        // construction.
        let _ = builder.set(1, Value::Str(self.message.clone()));
        let _ = builder.set(
            2,
            Value::Enum(EnumValue::new(
                application_error_kind_descriptor().clone(),
                self.kind.as_i32(),
            )),
        );
        builder.build()
    }

    /// Read back from a decoded exception message.
    #[must_use]
    pub fn from_message(message: &Message) -> Self {
        let text = match message.get(1) {
            Some(Value::Str(s)) => s.clone(),
            _ => String::new(),
        };
        let kind = match message.get(2) {
            Some(Value::Enum(e)) => {
                ApplicationErrorKind::from_i32(e.value()).unwrap_or(ApplicationErrorKind::Unknown)
            }
            _ => ApplicationErrorKind::Unknown,
        };
        Self::new(kind, text)
    }
}

static APPLICATION_ERROR_KIND: LazyLock<Arc<EnumDescriptor>> = LazyLock::new(|| {
    EnumDescriptor::new(
        "fieldwire.ApplicationErrorKind",
        [
            (0, "UNKNOWN"),
            (1, "UNKNOWN_METHOD"),
            (2, "INVALID_MESSAGE_TYPE"),
            (3, "WRONG_METHOD_NAME"),
            (4, "BAD_SEQUENCE_ID"),
            (5, "MISSING_RESULT"),
            (6, "INTERNAL_ERROR"),
            (7, "PROTOCOL_ERROR"),
            (8, "INVALID_TRANSFORM"),
            (9, "INVALID_PROTOCOL"),
            (10, "UNSUPPORTED_CLIENT_TYPE"),
        ],
    )
});

static APPLICATION_ERROR: LazyLock<Arc<MessageDescriptor>> = LazyLock::new(|| {
    MessageDescriptor::builder("fieldwire.ApplicationError", Variant::Exception)
        .field(Field::new(
            1,
            "message",
            Requirement::Default,
            Provider::of(Descriptor::Str),
        ))
        .field(
            Field::new(
                2,
                "kind",
                Requirement::Default,
                Provider::of(Descriptor::Enum(APPLICATION_ERROR_KIND.clone())),
            )
            .with_default(Value::Enum(EnumValue::new(APPLICATION_ERROR_KIND.clone(), 0))),
        )
        .build()
});

/// Enum descriptor for [`ApplicationErrorKind`].
#[must_use]
pub fn application_error_kind_descriptor() -> &'static Arc<EnumDescriptor> {
    &APPLICATION_ERROR_KIND
}

/// Exception descriptor for [`ApplicationError`] bodies.
#[must_use]
pub fn application_error_descriptor() -> &'static Arc<MessageDescriptor> {
    &APPLICATION_ERROR
}

/// Build a response union descriptor: `success` (id 0) plus one field per
/// declared exception type.
///
/// A void return uses a `Void` success provider. The success field keeps
/// the conventional id 0.
#[must_use]
pub fn response_union<S: Into<String>>(
    name: S,
    success: Provider,
    exceptions: impl IntoIterator<Item = Field>,
) -> Arc<MessageDescriptor> {
    let mut builder = MessageDescriptor::builder(name, Variant::Union).field(Field::new(
        0,
        "success",
        Requirement::Optional,
        success,
    ));
    for exception in exceptions {
        builder = builder.field(exception);
    }
    builder.build()
}

/// Interpret a decoded response union.
///
/// An active `success` field yields its value; an active exception field
/// yields a [`MessageException`]; no active field is a missing-result
/// application error, reachable only through a malformed server
/// implementation.
pub fn interpret_reply(reply: &Message, method: &str) -> Result<Value> {
    match reply.union_field() {
        Some(field) if field.name() == "success" => {
            Ok(reply.get(field.id()).cloned().unwrap_or(Value::Void))
        }
        Some(field) => match reply.get(field.id()) {
            Some(Value::Message(thrown)) => Err(Error::DeclaredException(MessageException::new(
                thrown.clone(),
            ))),
            _ => Err(Error::Application(ApplicationError::new(
                ApplicationErrorKind::Unknown,
                format!("non-message exception field {} in reply to {method}", field.name()),
            ))),
        },
        None => Err(Error::Application(ApplicationError::missing_result(method))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_type_roundtrip() {
        for call_type in [
            CallType::Call,
            CallType::Reply,
            CallType::Exception,
            CallType::Oneway,
        ] {
            assert_eq!(CallType::from_u8(call_type.as_u8()), Some(call_type));
        }
        assert_eq!(CallType::from_u8(0), None);
        assert_eq!(CallType::from_u8(5), None);
    }

    #[test]
    fn test_sequence_is_monotonic() {
        let sequence = Sequence::new();
        assert_eq!(sequence.next(), 0);
        assert_eq!(sequence.next(), 1);
        assert_eq!(sequence.next(), 2);
    }

    #[test]
    fn test_application_error_message_roundtrip() {
        let error = ApplicationError::new(ApplicationErrorKind::InternalError, "boom");
        let message = error.to_message();
        assert_eq!(ApplicationError::from_message(&message), error);
        assert_eq!(error.to_string(), "INTERNAL_ERROR: boom");
    }
}
