//! Periodic sweep flagging stale open tasks for a price review.

use crate::activity::domain::{ActivityEntry, ActivityEvent};
use crate::activity::services::ActivityRecorder;
use crate::persistence::{MarketplaceStore, RepositoryError, RepositoryResult};
use mockable::Clock;
use std::sync::Arc;
use tracing::{debug, info};

/// Outcome of one sweep run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Tasks returned as due by the store.
    pub examined: usize,
    /// Tasks whose price prompt was switched on.
    pub flagged: usize,
}

/// Turns on the price prompt for open tasks that drew no offers in time.
pub struct PricePromptSweep<S, C>
where
    S: MarketplaceStore,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    clock: Arc<C>,
    activity: ActivityRecorder<S>,
}

impl<S, C> PricePromptSweep<S, C>
where
    S: MarketplaceStore,
    C: Clock + Send + Sync,
{
    /// Creates a sweep over `store`.
    #[must_use]
    pub fn new(store: Arc<S>, clock: Arc<C>) -> Self {
        let activity = ActivityRecorder::new(Arc::clone(&store));
        Self {
            store,
            clock,
            activity,
        }
    }

    /// Flags every due task. Tasks that changed under the sweep are skipped
    /// and picked up by the next run if still due.
    ///
    /// # Errors
    ///
    /// Returns the repository error when listing or a non-conflict update
    /// fails.
    pub async fn run(&self) -> RepositoryResult<SweepReport> {
        let now = self.clock.utc();
        let due = self.store.list_due_price_prompts(now).await?;
        let mut report = SweepReport {
            examined: due.len(),
            flagged: 0,
        };

        for mut task in due {
            let expected = task.revision();
            if !task.flag_price_prompt(now) {
                continue;
            }
            match self.store.update_task(&task, expected).await {
                Ok(()) => {}
                Err(RepositoryError::Conflict { .. }) => {
                    debug!(task_id = %task.id(), "task changed during sweep, skipping");
                    continue;
                }
                Err(err) => return Err(err),
            }
            report.flagged += 1;
            self.activity
                .record(
                    ActivityEntry::new(ActivityEvent::PricePromptTriggered, &*self.clock)
                        .with_actor(task.poster_id())
                        .with_task(task.id()),
                )
                .await;
        }

        info!(
            examined = report.examined,
            flagged = report.flagged,
            "price prompt sweep finished"
        );
        Ok(report)
    }
}
