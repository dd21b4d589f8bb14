//! Port contract for the activity log.

use super::domain::{ActivityEntry, ActivityQuery};
use crate::persistence::RepositoryResult;
use async_trait::async_trait;

/// Append-only activity log.
#[async_trait]
pub trait ActivityLog: Send + Sync {
    /// Appends an entry.
    async fn append_activity(&self, entry: &ActivityEntry) -> RepositoryResult<()>;

    /// Lists entries matching `query`, newest first.
    async fn list_activity(&self, query: &ActivityQuery) -> RepositoryResult<Vec<ActivityEntry>>;
}
