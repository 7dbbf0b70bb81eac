//! FieldWire error types

use thiserror::Error;

use crate::model::MessageException;
use crate::rpc::ApplicationError;
use crate::wire::WireType;

/// FieldWire errors
#[derive(Error, Debug)]
pub enum Error {
    /// Wire type tag on a known field does not match the schema
    #[error("wrong wire type for field `{field}`: expected {expected}, got {actual}")]
    WireTypeMismatch {
        /// Name of the offending field
        field: String,
        /// Tag declared by the schema
        expected: WireType,
        /// Tag found on the wire
        actual: WireType,
    },

    /// Container key or value tag does not match the schema
    #[error("wrong wire type for {context}: expected {expected}, got {actual}")]
    ElementTypeMismatch {
        /// Which container position mismatched
        context: &'static str,
        /// Tag declared by the schema
        expected: WireType,
        /// Tag found on the wire
        actual: WireType,
    },

    /// Byte is not a known wire type tag
    #[error("unknown wire type tag: {tag:#04x}")]
    UnknownWireType {
        /// The unrecognized tag byte
        tag: u8,
    },

    /// Input ended mid-value
    #[error("unexpected end of input: need {needed} bytes, {remaining} remaining")]
    UnexpectedEof {
        /// Bytes the decoder needed
        needed: usize,
        /// Bytes left in the buffer
        remaining: usize,
    },

    /// Value nesting on the wire exceeded the accepted depth
    #[error("value nesting deeper than {limit} levels")]
    DepthLimitExceeded {
        /// The depth cap
        limit: usize,
    },

    /// Strict envelope read found no version marker
    #[error("missing protocol version")]
    MissingProtocolVersion,

    /// String value is not valid UTF-8
    #[error("invalid UTF-8 in string value: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// Method name length outside the accepted range
    #[error("unreasonable method name length: {length}")]
    MethodNameLength {
        /// Length read from the envelope
        length: i64,
    },

    /// Service call envelope carried an unknown protocol version
    #[error("bad protocol version: {version:#010x}")]
    BadProtocolVersion {
        /// The version bits read
        version: i32,
    },

    /// Service call envelope carried an unknown call type
    #[error("invalid call type: {type_byte}")]
    InvalidCallType {
        /// The call type byte read
        type_byte: u8,
    },

    /// Validation found unset required fields; all names are aggregated
    #[error("missing required fields in `{message}`: {}", .fields.join(", "))]
    MissingRequired {
        /// Qualified name of the message type
        message: String,
        /// Every missing required field, not just the first
        fields: Vec<String>,
    },

    /// Validation of a union found no active field
    #[error("no field set on union `{message}`")]
    NoUnionFieldSet {
        /// Qualified name of the union type
        message: String,
    },

    /// Programmatic access with a field id the descriptor does not define
    #[error("no field with id {id} in `{message}`")]
    UnknownField {
        /// Qualified name of the message type
        message: String,
        /// The undefined field id
        id: u16,
    },

    /// A value of the wrong kind was supplied for a field
    #[error("wrong value kind for field `{field}`: expected {expected}, got {actual}")]
    ValueKind {
        /// Name of the field
        field: String,
        /// Kind required by the field descriptor
        expected: &'static str,
        /// Kind of the supplied value
        actual: &'static str,
    },

    /// A declared application exception carried in an RPC response union
    #[error("declared exception: {0}")]
    DeclaredException(#[source] MessageException),

    /// Generic application-level RPC failure
    #[error(transparent)]
    Application(#[from] ApplicationError),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
