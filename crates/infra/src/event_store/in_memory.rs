use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use bankes_core::{AggregateId, ExpectedVersion};

use super::r#trait::{EventStore, EventStoreError, StoredEvent, UncommittedEvent};

/// In-memory append-only event store.
///
/// Intended for tests/dev. Shared through an `Arc`, it outlives any router built on
/// top of it, which is how restarts are exercised without a database.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    streams: RwLock<HashMap<AggregateId, Vec<StoredEvent>>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn current_version(stream: &[StoredEvent]) -> u64 {
        stream.last().map(|e| e.sequence_number).unwrap_or(0)
    }

    /// Number of streams written so far.
    pub fn stream_count(&self) -> usize {
        self.streams.read().map(|s| s.len()).unwrap_or(0)
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(
        &self,
        events: Vec<UncommittedEvent>,
        expected_version: ExpectedVersion,
    ) -> Result<Vec<StoredEvent>, EventStoreError> {
        if events.is_empty() {
            return Ok(vec![]);
        }

        // All events must target the same stream.
        let aggregate_id = events[0].aggregate_id;
        let aggregate_type = events[0].aggregate_type.clone();

        for (idx, e) in events.iter().enumerate() {
            if e.aggregate_id != aggregate_id {
                return Err(EventStoreError::InvalidAppend(format!(
                    "batch contains multiple aggregate_ids (index {idx})"
                )));
            }
            if e.aggregate_type != aggregate_type {
                return Err(EventStoreError::AggregateTypeMismatch(format!(
                    "batch contains multiple aggregate_types (index {idx})"
                )));
            }
        }

        let mut streams = self
            .streams
            .write()
            .map_err(|_| EventStoreError::Unavailable("lock poisoned".to_string()))?;

        let stream = streams.entry(aggregate_id).or_default();
        let current = Self::current_version(stream);

        if !expected_version.matches(current) {
            return Err(EventStoreError::Concurrency(format!(
                "expected {expected_version:?}, found {current}"
            )));
        }

        // Enforce aggregate type stability across the stream.
        if let Some(existing) = stream.first() {
            if existing.aggregate_type != aggregate_type {
                return Err(EventStoreError::AggregateTypeMismatch(format!(
                    "stream aggregate_type is '{}', attempted append with '{}'",
                    existing.aggregate_type, aggregate_type
                )));
            }
        }

        let mut next = current + 1;
        let mut committed = Vec::with_capacity(events.len());
        for e in events {
            let stored = StoredEvent {
                event_id: e.event_id,
                aggregate_id: e.aggregate_id,
                aggregate_type: e.aggregate_type,
                sequence_number: next,
                event_type: e.event_type,
                event_version: e.event_version,
                occurred_at: e.occurred_at,
                payload: e.payload,
            };
            next += 1;
            committed.push(stored);
        }
        stream.extend(committed.iter().cloned());

        Ok(committed)
    }

    async fn load_stream(&self, aggregate_id: AggregateId) -> Result<Vec<StoredEvent>, EventStoreError> {
        let streams = self
            .streams
            .read()
            .map_err(|_| EventStoreError::Unavailable("lock poisoned".to_string()))?;

        Ok(streams.get(&aggregate_id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    fn event(aggregate_id: AggregateId, aggregate_type: &str) -> UncommittedEvent {
        UncommittedEvent {
            event_id: Uuid::now_v7(),
            aggregate_id,
            aggregate_type: aggregate_type.to_string(),
            event_type: "test.happened".to_string(),
            event_version: 1,
            occurred_at: Utc::now(),
            payload: json!({ "n": 1 }),
        }
    }

    #[tokio::test]
    async fn sequence_numbers_start_at_one_and_continue() {
        let store = InMemoryEventStore::new();
        let id = AggregateId::new();

        let first = store
            .append(vec![event(id, "t"), event(id, "t")], ExpectedVersion::Exact(0))
            .await
            .unwrap();
        assert_eq!(first.iter().map(|e| e.sequence_number).collect::<Vec<_>>(), [1, 2]);

        let second = store.append(vec![event(id, "t")], ExpectedVersion::Exact(2)).await.unwrap();
        assert_eq!(second[0].sequence_number, 3);

        let loaded = store.load_stream(id).await.unwrap();
        assert_eq!(loaded.len(), 3);
    }

    #[tokio::test]
    async fn stale_expected_version_is_a_concurrency_error_and_appends_nothing() {
        let store = InMemoryEventStore::new();
        let id = AggregateId::new();
        store.append(vec![event(id, "t")], ExpectedVersion::Exact(0)).await.unwrap();

        let err = store.append(vec![event(id, "t")], ExpectedVersion::Exact(0)).await.unwrap_err();
        assert!(matches!(err, EventStoreError::Concurrency(_)));
        assert_eq!(store.load_stream(id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn mixed_batches_are_rejected_atomically() {
        let store = InMemoryEventStore::new();
        let id = AggregateId::new();

        let err = store
            .append(vec![event(id, "t"), event(AggregateId::new(), "t")], ExpectedVersion::Any)
            .await
            .unwrap_err();
        assert!(matches!(err, EventStoreError::InvalidAppend(_)));
        assert!(store.load_stream(id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn aggregate_type_is_fixed_per_stream() {
        let store = InMemoryEventStore::new();
        let id = AggregateId::new();
        store.append(vec![event(id, "a")], ExpectedVersion::Any).await.unwrap();

        let err = store.append(vec![event(id, "b")], ExpectedVersion::Any).await.unwrap_err();
        assert!(matches!(err, EventStoreError::AggregateTypeMismatch(_)));
    }

    #[tokio::test]
    async fn unknown_stream_loads_empty() {
        let store = InMemoryEventStore::new();
        assert!(store.load_stream(AggregateId::new()).await.unwrap().is_empty());
        assert_eq!(store.stream_count(), 0);
    }
}
