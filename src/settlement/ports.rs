//! Port contract for unreconciled capture events.

use super::domain::UnreconciledEvent;
use crate::persistence::RepositoryResult;
use async_trait::async_trait;

/// Store of capture events awaiting manual reconciliation.
#[async_trait]
pub trait UnreconciledEventStore: Send + Sync {
    /// Persists a dropped event.
    async fn record_unreconciled(&self, event: &UnreconciledEvent) -> RepositoryResult<()>;

    /// Lists dropped events, newest first.
    async fn list_unreconciled(&self, limit: usize) -> RepositoryResult<Vec<UnreconciledEvent>>;
}
