use serde::{Deserialize, Serialize};

/// Envelope for an event, carrying the stream metadata it was stored under.
///
/// `sequence_number` is the 1-based position in the aggregate stream; replay relies on
/// it being strictly increasing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    aggregate_type: String,

    /// Monotonically increasing position in the aggregate stream.
    sequence_number: u64,

    payload: E,
}

impl<E> EventEnvelope<E> {
    pub fn new(aggregate_type: impl Into<String>, sequence_number: u64, payload: E) -> Self {
        Self {
            aggregate_type: aggregate_type.into(),
            sequence_number,
            payload,
        }
    }

    pub fn aggregate_type(&self) -> &str {
        &self.aggregate_type
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}
