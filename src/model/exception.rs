//! Error adapter for exception-variant messages
//!
//! Schema exceptions stay plain data structs in the model; this thin
//! wrapper is what crosses an error boundary. The human-readable rendering
//! is fixed at construction so it reflects the field values at throw time.

use std::fmt;

use crate::model::Message;

/// An exception-variant [`Message`] behaving as a Rust error.
#[derive(Clone)]
pub struct MessageException {
    message: Message,
    rendered: String,
}

impl MessageException {
    /// Wrap an exception message; renders the field values immediately.
    #[must_use]
    pub fn new(message: Message) -> Self {
        let rendered = message.to_string();
        Self { message, rendered }
    }

    /// The underlying message data.
    #[must_use]
    pub fn message(&self) -> &Message {
        &self.message
    }

    /// Unwrap back into the message data.
    #[must_use]
    pub fn into_message(self) -> Message {
        self.message
    }
}

impl fmt::Display for MessageException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rendered)
    }
}

impl fmt::Debug for MessageException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MessageException({})", self.rendered)
    }
}

impl std::error::Error for MessageException {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{Descriptor, Field, MessageDescriptor, Provider, Requirement, Variant};
    use crate::model::Value;

    #[test]
    fn test_rendering_fixed_at_construction() {
        let descriptor = MessageDescriptor::builder("test.NotFound", Variant::Exception)
            .field(Field::new(
                1,
                "what",
                Requirement::Required,
                Provider::of(Descriptor::Str),
            ))
            .build();
        let mut builder = descriptor.start_builder();
        builder.set(1, Value::Str("thing".into())).unwrap();
        let err = MessageException::new(builder.build());
        assert_eq!(err.to_string(), "test.NotFound{what:\"thing\"}");
    }
}
