//! Append-only event store boundary.
//!
//! The core only relies on "append to a stream" and "load a stream in order". Backends
//! live behind the `EventStore` trait.

pub mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryEventStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresEventStore;
pub use r#trait::{EventStore, EventStoreError, StoredEvent, UncommittedEvent, validate_loaded_stream};
