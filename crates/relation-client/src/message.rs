//! See `original_source/client/message.go`.

/// A message delivered from the broker to a receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// `person.created`, `person.deleted`, or `friendship.created`.
    pub kind: String,
    /// The raw JSON-encoded body.
    pub data: Vec<u8>,
}

impl Message {
    pub fn new(kind: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Message { kind: kind.into(), data: data.into() }
    }
}
