//! Postgres-backed event store implementation.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | EventStoreError |
//! |------------|----------------------|-----------------|
//! | Database (unique violation) | `23505` | `Concurrency` |
//! | Database (other) | Any other | `InvalidAppend` |
//! | PoolClosed / Io / PoolTimedOut | N/A | `Unavailable` |
//! | Other | N/A | `Unavailable` |

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Row, Transaction};
use tracing::instrument;

use bankes_core::{AggregateId, ExpectedVersion};

use super::r#trait::{EventStore, EventStoreError, StoredEvent, UncommittedEvent};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS events (
    event_id        UUID        PRIMARY KEY,
    aggregate_id    UUID        NOT NULL,
    aggregate_type  TEXT        NOT NULL,
    sequence_number BIGINT      NOT NULL CHECK (sequence_number > 0),
    event_type      TEXT        NOT NULL,
    event_version   INTEGER     NOT NULL,
    occurred_at     TIMESTAMPTZ NOT NULL,
    payload         JSONB       NOT NULL,
    created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    UNIQUE (aggregate_id, sequence_number)
)
"#;

/// Postgres-backed append-only event store.
///
/// The unique constraint on `(aggregate_id, sequence_number)` backs the optimistic
/// version check: if another writer commits between the version read and the insert,
/// the insert fails and surfaces as `Concurrency`.
#[derive(Debug, Clone)]
pub struct PostgresEventStore {
    pool: PgPool,
}

impl PostgresEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to `database_url` and make sure the schema exists.
    pub async fn connect(database_url: &str) -> Result<Self, EventStoreError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    /// Create the `events` table if it does not exist yet.
    pub async fn migrate(&self) -> Result<(), EventStoreError> {
        sqlx::query(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        Ok(())
    }

    #[instrument(skip(self, events), fields(aggregate_id = %aggregate_id, event_count = events.len()), err)]
    async fn append_events(
        &self,
        aggregate_id: AggregateId,
        events: Vec<UncommittedEvent>,
        expected_version: ExpectedVersion,
    ) -> Result<Vec<StoredEvent>, EventStoreError> {
        for (idx, e) in events.iter().enumerate() {
            if e.aggregate_id != aggregate_id {
                return Err(EventStoreError::InvalidAppend(format!(
                    "batch contains multiple aggregate_ids (index {idx})"
                )));
            }
        }
        let aggregate_type = events[0].aggregate_type.clone();
        if let Some(idx) = events.iter().position(|e| e.aggregate_type != aggregate_type) {
            return Err(EventStoreError::AggregateTypeMismatch(format!(
                "batch contains multiple aggregate_types (index {idx})"
            )));
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let (current_version, existing_aggregate_type) = check_stream_version(&mut tx, aggregate_id).await?;

        if let Some(existing_type) = existing_aggregate_type {
            if existing_type != aggregate_type {
                return Err(EventStoreError::AggregateTypeMismatch(format!(
                    "stream aggregate_type is '{existing_type}', attempted append with '{aggregate_type}'"
                )));
            }
        }

        if !expected_version.matches(current_version) {
            return Err(EventStoreError::Concurrency(format!(
                "expected {expected_version:?}, found {current_version}"
            )));
        }

        let mut stored_events = Vec::with_capacity(events.len());
        let mut next_sequence = current_version + 1;

        for event in events {
            sqlx::query(
                r#"
                INSERT INTO events (
                    event_id,
                    aggregate_id,
                    aggregate_type,
                    sequence_number,
                    event_type,
                    event_version,
                    occurred_at,
                    payload
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(event.event_id)
            .bind(aggregate_id.as_uuid())
            .bind(&aggregate_type)
            .bind(next_sequence as i64)
            .bind(&event.event_type)
            .bind(event.event_version as i32)
            .bind(event.occurred_at)
            .bind(&event.payload)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_event", e))?;

            stored_events.push(StoredEvent {
                event_id: event.event_id,
                aggregate_id: event.aggregate_id,
                aggregate_type: event.aggregate_type,
                sequence_number: next_sequence,
                event_type: event.event_type,
                event_version: event.event_version,
                occurred_at: event.occurred_at,
                payload: event.payload,
            });
            next_sequence += 1;
        }

        // Dropping `tx` on any early return above rolls the batch back.
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Ok(stored_events)
    }
}

#[async_trait]
impl EventStore for PostgresEventStore {
    async fn append(
        &self,
        events: Vec<UncommittedEvent>,
        expected_version: ExpectedVersion,
    ) -> Result<Vec<StoredEvent>, EventStoreError> {
        if events.is_empty() {
            return Ok(vec![]);
        }
        let aggregate_id = events[0].aggregate_id;
        self.append_events(aggregate_id, events, expected_version).await
    }

    #[instrument(skip(self), fields(aggregate_id = %aggregate_id), err)]
    async fn load_stream(&self, aggregate_id: AggregateId) -> Result<Vec<StoredEvent>, EventStoreError> {
        let rows = sqlx::query(
            r#"
            SELECT
                event_id,
                aggregate_id,
                aggregate_type,
                sequence_number,
                event_type,
                event_version,
                occurred_at,
                payload
            FROM events
            WHERE aggregate_id = $1
            ORDER BY sequence_number ASC
            "#,
        )
        .bind(aggregate_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("load_stream", e))?;

        rows.iter()
            .map(|row| {
                StoredEventRow::from_row(row)
                    .map(StoredEvent::from)
                    .map_err(|e| EventStoreError::Corrupt(format!("failed to read event row: {e}")))
            })
            .collect()
    }
}

/// Returns `(current_version, aggregate_type)`; version 0 and `None` for a new stream.
async fn check_stream_version(
    tx: &mut Transaction<'_, Postgres>,
    aggregate_id: AggregateId,
) -> Result<(u64, Option<String>), EventStoreError> {
    let row = sqlx::query(
        r#"
        SELECT
            COALESCE(MAX(sequence_number), 0) as current_version,
            MAX(aggregate_type) as aggregate_type
        FROM events
        WHERE aggregate_id = $1
        "#,
    )
    .bind(aggregate_id.as_uuid())
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("check_stream_version", e))?;

    let current_version: Option<i64> = row
        .try_get("current_version")
        .map_err(|e| EventStoreError::Corrupt(format!("failed to read current_version: {e}")))?;
    let aggregate_type: Option<String> = row
        .try_get("aggregate_type")
        .map_err(|e| EventStoreError::Corrupt(format!("failed to read aggregate_type: {e}")))?;

    Ok((current_version.unwrap_or(0) as u64, aggregate_type))
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> EventStoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {operation}: {}", db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => EventStoreError::Concurrency(msg),
                _ => EventStoreError::InvalidAppend(msg),
            }
        }
        other => EventStoreError::Unavailable(format!("sqlx error in {operation}: {other}")),
    }
}

#[derive(Debug)]
struct StoredEventRow {
    event_id: uuid::Uuid,
    aggregate_id: uuid::Uuid,
    aggregate_type: String,
    sequence_number: i64,
    event_type: String,
    event_version: i32,
    occurred_at: DateTime<Utc>,
    payload: serde_json::Value,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for StoredEventRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(StoredEventRow {
            event_id: row.try_get("event_id")?,
            aggregate_id: row.try_get("aggregate_id")?,
            aggregate_type: row.try_get("aggregate_type")?,
            sequence_number: row.try_get("sequence_number")?,
            event_type: row.try_get("event_type")?,
            event_version: row.try_get("event_version")?,
            occurred_at: row.try_get("occurred_at")?,
            payload: row.try_get("payload")?,
        })
    }
}

impl From<StoredEventRow> for StoredEvent {
    fn from(row: StoredEventRow) -> Self {
        StoredEvent {
            event_id: row.event_id,
            aggregate_id: AggregateId::from_uuid(row.aggregate_id),
            aggregate_type: row.aggregate_type,
            sequence_number: row.sequence_number as u64,
            event_type: row.event_type,
            event_version: row.event_version as u32,
            occurred_at: row.occurred_at,
            payload: row.payload,
        }
    }
}
