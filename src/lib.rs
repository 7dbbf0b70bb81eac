//! FieldWire - IDL-driven structured messages over a compact TLV wire format
//!
//! This library is the runtime every schema-generated type conforms to:
//! reflective type descriptors, immutable field-addressable messages,
//! builder-based mutation with presence tracking, and a self-describing
//! binary codec with forward/backward wire compatibility.
//!
//! # Quick Start
//!
//! ```rust
//! use fieldwire::{Descriptor, Field, MessageDescriptor, Provider, Requirement, Value, Variant};
//! use fieldwire::wire::{decode, encode};
//!
//! // Describe a struct type reflectively
//! let point = MessageDescriptor::builder("geo.Point", Variant::Struct)
//!     .field(Field::new(1, "x", Requirement::Required, Provider::of(Descriptor::I32)))
//!     .field(Field::new(2, "y", Requirement::Required, Provider::of(Descriptor::I32)))
//!     .build();
//!
//! // Build an immutable message
//! let mut builder = point.start_builder();
//! builder.set(1, Value::I32(3))?;
//! builder.set(2, Value::I32(-7))?;
//! let message = builder.build();
//!
//! // Encode to bytes and back
//! let bytes = encode(&message);
//! let decoded = decode(&bytes, &point)?;
//! assert_eq!(decoded, message);
//! # Ok::<(), fieldwire::Error>(())
//! ```
//!
//! # Features
//!
//! - **Reflective descriptors** - structs, unions, exceptions, enums and
//!   parametrized collections, with lazy providers for recursive schemas
//! - **Presence-tracking builders** - is-set and is-modified bit vectors,
//!   recursive merge, explicit validation
//! - **Compatibility-preserving codec** - unknown fields are skipped
//!   generically so old readers survive new writers
//! - **RPC envelope** - request structs and response unions built entirely
//!   from the message model

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod descriptor;
pub mod error;
pub mod model;
pub mod rpc;
pub mod wire;

pub use descriptor::{
    CollectionRepr, Descriptor, EnumDescriptor, EnumValue, Field, MessageDescriptor, Provider,
    Requirement, TypeKind, Variant,
};
pub use error::{Error, Result};
pub use model::{MapValue, Message, MessageBuilder, MessageException, SetValue, Value};
pub use rpc::{ApplicationError, ApplicationErrorKind, CallType, Sequence, ServiceCall};
pub use wire::{BinaryCodec, WireType};

/// FieldWire wire-format version
pub const VERSION: &str = "1.0.0";
