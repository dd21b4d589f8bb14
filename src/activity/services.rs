//! Activity recording shared by every service.

use crate::activity::domain::{ActivityEntry, ActivityQuery};
use crate::activity::ports::ActivityLog;
use crate::persistence::RepositoryResult;
use std::sync::Arc;
use tracing::{info, warn};

/// Appends activity entries and mirrors them to `tracing`.
///
/// A failed append is logged at `warn` and never fails the caller.
pub struct ActivityRecorder<L>
where
    L: ActivityLog + ?Sized,
{
    log: Arc<L>,
}

impl<L> Clone for ActivityRecorder<L>
where
    L: ActivityLog + ?Sized,
{
    fn clone(&self) -> Self {
        Self {
            log: Arc::clone(&self.log),
        }
    }
}

impl<L> ActivityRecorder<L>
where
    L: ActivityLog + ?Sized,
{
    /// Creates a recorder writing to `log`.
    #[must_use]
    pub const fn new(log: Arc<L>) -> Self {
        Self { log }
    }

    /// Records `entry`.
    pub async fn record(&self, entry: ActivityEntry) {
        info!(
            event = entry.event.as_str(),
            actor_id = ?entry.actor_id,
            task_id = ?entry.task_id,
            offer_id = ?entry.offer_id,
            "activity"
        );
        if let Err(err) = self.log.append_activity(&entry).await {
            warn!(event = entry.event.as_str(), error = %err, "failed to append activity entry");
        }
    }

    /// Lists entries matching `query`, newest first.
    ///
    /// # Errors
    ///
    /// Returns the repository error when the log cannot be read.
    pub async fn list(&self, query: &ActivityQuery) -> RepositoryResult<Vec<ActivityEntry>> {
        self.log.list_activity(query).await
    }
}
