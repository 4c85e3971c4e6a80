use bankes_core::AggregateId;

/// A command targets a specific aggregate.
///
/// Commands are intent; they are never persisted. An accepted command becomes one or
/// more events, a refused one becomes a reply and nothing else.
///
/// `target_aggregate_id()` is what the router uses to pick the owning entity, which is
/// also the single writer of that aggregate's stream.
pub trait Command: Clone + core::fmt::Debug + Send + Sync + 'static {
    fn target_aggregate_id(&self) -> AggregateId;
}
