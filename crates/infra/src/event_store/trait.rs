use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;
use uuid::Uuid;

use bankes_core::{AggregateId, ExpectedVersion};
use bankes_events::EventEnvelope;
use std::sync::Arc;

/// An event ready to be appended to a stream (not yet assigned a sequence number).
///
/// ## Event Lifecycle
///
/// 1. **Domain event**: decided by an aggregate's `handle()`
/// 2. **UncommittedEvent**: serialized and wrapped with stream metadata
/// 3. **StoredEvent**: persisted with an assigned `sequence_number`
/// 4. **EventEnvelope**: decoded back into a typed event during recovery
///
/// Use `UncommittedEvent::from_typed()` to build one from a typed domain event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UncommittedEvent {
    pub event_id: Uuid,
    pub aggregate_id: AggregateId,
    pub aggregate_type: String,

    pub event_type: String,
    pub event_version: u32,
    pub occurred_at: DateTime<Utc>,

    pub payload: JsonValue,
}

/// A stored event in an append-only stream (assigned a sequence number).
///
/// Sequence numbers are assigned by the store during append and are 1-based,
/// gap-free and strictly increasing per stream. Replay order is sequence order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEvent {
    pub event_id: Uuid,
    pub aggregate_id: AggregateId,
    pub aggregate_type: String,

    /// Monotonically increasing position in the aggregate stream.
    pub sequence_number: u64,

    pub event_type: String,
    pub event_version: u32,
    pub occurred_at: DateTime<Utc>,

    pub payload: JsonValue,
}

impl StoredEvent {
    pub fn stream_version(&self) -> u64 {
        self.sequence_number
    }

    /// Decode the JSON payload into a typed envelope.
    ///
    /// A payload that no longer matches its type means the stream cannot be replayed
    /// faithfully, so this is reported as `Corrupt` instead of being skipped.
    pub fn decode<E>(&self) -> Result<EventEnvelope<E>, EventStoreError>
    where
        E: DeserializeOwned,
    {
        let payload: E = serde_json::from_value(self.payload.clone()).map_err(|e| {
            EventStoreError::Corrupt(format!(
                "cannot decode {} #{} of stream {}: {e}",
                self.event_type, self.sequence_number, self.aggregate_id
            ))
        })?;

        Ok(EventEnvelope::new(self.aggregate_type.clone(), self.sequence_number, payload))
    }
}

/// Event store operation error.
///
/// These are **infrastructure errors** as opposed to domain errors. Any of them
/// aborts the in-flight command before its events are applied to memory.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventStoreError {
    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    #[error("aggregate type mismatch: {0}")]
    AggregateTypeMismatch(String),

    #[error("invalid append: {0}")]
    InvalidAppend(String),

    #[error("event store unavailable: {0}")]
    Unavailable(String),

    #[error("corrupt event stream: {0}")]
    Corrupt(String),
}

/// Append-only event store keyed by stream (`AggregateId`).
///
/// ## Append Semantics
///
/// `append()`:
/// - requires every event in the batch to target the same stream and aggregate type
/// - checks `expected_version` against the current stream version
/// - assigns sequence numbers starting at `current_version + 1`
/// - persists the batch atomically (all or nothing)
///
/// ## Load Semantics
///
/// `load_stream()` returns the full stream in sequence order, or an empty vector for a
/// stream that was never written. A completed append is visible to every later load.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Append events to a stream (append-only).
    async fn append(
        &self,
        events: Vec<UncommittedEvent>,
        expected_version: ExpectedVersion,
    ) -> Result<Vec<StoredEvent>, EventStoreError>;

    /// Load the full stream for an aggregate.
    async fn load_stream(&self, aggregate_id: AggregateId) -> Result<Vec<StoredEvent>, EventStoreError>;
}

#[async_trait]
impl<S> EventStore for Arc<S>
where
    S: EventStore + ?Sized,
{
    async fn append(
        &self,
        events: Vec<UncommittedEvent>,
        expected_version: ExpectedVersion,
    ) -> Result<Vec<StoredEvent>, EventStoreError> {
        (**self).append(events, expected_version).await
    }

    async fn load_stream(&self, aggregate_id: AggregateId) -> Result<Vec<StoredEvent>, EventStoreError> {
        (**self).load_stream(aggregate_id).await
    }
}

impl UncommittedEvent {
    /// Convenience constructor from a typed domain event.
    pub fn from_typed<E>(
        aggregate_id: AggregateId,
        aggregate_type: impl Into<String>,
        event_id: Uuid,
        event: &E,
    ) -> Result<Self, EventStoreError>
    where
        E: bankes_events::Event + Serialize,
    {
        let payload = serde_json::to_value(event)
            .map_err(|e| EventStoreError::InvalidAppend(format!("payload serialization failed: {e}")))?;

        Ok(Self {
            event_id,
            aggregate_id,
            aggregate_type: aggregate_type.into(),
            event_type: event.event_type().to_string(),
            event_version: event.version(),
            occurred_at: event.occurred_at(),
            payload,
        })
    }
}

/// Check that a loaded stream belongs to `aggregate_id` and is strictly sequenced.
pub fn validate_loaded_stream(aggregate_id: AggregateId, stream: &[StoredEvent]) -> Result<(), EventStoreError> {
    let mut last = 0u64;
    for (idx, e) in stream.iter().enumerate() {
        if e.aggregate_id != aggregate_id {
            return Err(EventStoreError::Corrupt(format!(
                "loaded stream contains wrong aggregate_id at index {idx}"
            )));
        }
        if e.sequence_number <= last {
            return Err(EventStoreError::Corrupt(format!(
                "non-monotonic sequence_number in loaded stream (last={last}, found={})",
                e.sequence_number
            )));
        }
        last = e.sequence_number;
    }
    Ok(())
}
