use std::time::Duration;

use thiserror::Error;

use bankes_core::DomainError;

use crate::event_store::EventStoreError;

/// Failure of a request sent to the router or to an entity.
///
/// Domain answers that are not failures (unknown id, refused update) travel as
/// `Option`/`UpdateOutcome` values instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BankError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] EventStoreError),

    /// The caller stopped waiting. The command may still complete.
    #[error("no reply within {0:?}")]
    Timeout(Duration),

    /// The addressed queue is closed (router or entity task has stopped).
    #[error("account service unavailable")]
    Unavailable,
}
