//! The message value model
//!
//! Immutable [`Message`] values with generic field access, their mutable
//! [`MessageBuilder`] staging counterpart, the boxed runtime [`Value`]
//! representation, and the error adapter for exception-variant messages.

mod bits;
mod builder;
mod exception;
mod message;
mod value;

pub use builder::MessageBuilder;
pub use exception::MessageException;
pub use message::Message;
pub use value::{MapValue, SetValue, Value};

pub(crate) use bits::BitSet;
