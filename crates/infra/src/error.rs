//! Service-level error surface.

use thiserror::Error;

use gudang_core::DomainError;

use crate::event_store::EventStoreError;

/// Error returned by the service facade and the read-side helpers.
///
/// Domain failures (validation, not-found, conflict, insufficient stock)
/// pass through untouched in [`ServiceError::Domain`]; the remaining
/// variants are infrastructure failures.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("event store failure: {0}")]
    Store(#[from] EventStoreError),

    /// A stored payload could not be decoded back into a ledger event.
    #[error("stored event could not be decoded: {0}")]
    Deserialize(String),

    /// Publication failed after a successful append (at-least-once; the
    /// events are persisted, re-publishing is safe).
    #[error("event publication failed: {0}")]
    Publish(String),

    /// The balance read model could not be updated after a commit.
    #[error("projection update failed: {0}")]
    Projection(String),

    /// An internal lock was poisoned by a panicking thread.
    #[error("internal lock poisoned: {0}")]
    Poisoned(&'static str),
}

impl ServiceError {
    /// The domain error, if this is a domain failure.
    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            ServiceError::Domain(e) => Some(e),
            _ => None,
        }
    }
}

impl From<crate::command_dispatcher::DispatchError> for ServiceError {
    fn from(value: crate::command_dispatcher::DispatchError) -> Self {
        use crate::command_dispatcher::DispatchError;

        match value {
            DispatchError::Domain(e) => ServiceError::Domain(e),
            // Under the per-item critical section this cannot happen for
            // movements; surface it as a conflict if a caller bypasses it.
            DispatchError::Concurrency(msg) => ServiceError::Domain(DomainError::conflict(msg)),
            DispatchError::Deserialize(msg) => ServiceError::Deserialize(msg),
            DispatchError::Store(e) => ServiceError::Store(e),
            DispatchError::Publish(msg) => ServiceError::Publish(msg),
        }
    }
}
