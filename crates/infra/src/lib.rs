//! Infrastructure layer: event log, account entities, router and the client handle.
//!
//! ```text
//! Bank ──► router task ──► entity task (one per account) ──► EventStore
//!              │
//!              └──► directory stream (EventStore)
//! ```

pub mod bank;
pub mod directory;
pub mod entity;
pub mod error;
pub mod event_store;
pub mod router;


pub use bank::{Bank, DEFAULT_ASK_TIMEOUT};
pub use error::BankError;
pub use event_store::{EventStore, EventStoreError, InMemoryEventStore, StoredEvent, UncommittedEvent};
pub use router::AccountRouter;

#[cfg(feature = "postgres")]
pub use event_store::PostgresEventStore;
