//! Dispute lookup, evidence and operator resolution.

use super::domain::{Dispute, DisputeDomainError, DisputeResolution};
use crate::activity::domain::{ActivityEntry, ActivityEvent};
use crate::activity::services::ActivityRecorder;
use crate::error::{MarketplaceError, MarketplaceResult};
use crate::ids::{DisputeId, UserId};
use crate::persistence::MarketplaceStore;
use crate::task::domain::{Task, TaskAction};
use mockable::Clock;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

/// Dispute ledger service.
pub struct DisputeLedgerService<S, C>
where
    S: MarketplaceStore,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    clock: Arc<C>,
    activity: ActivityRecorder<S>,
}

impl<S, C> DisputeLedgerService<S, C>
where
    S: MarketplaceStore,
    C: Clock + Send + Sync,
{
    /// Creates a dispute ledger service.
    #[must_use]
    pub fn new(store: Arc<S>, clock: Arc<C>) -> Self {
        let activity = ActivityRecorder::new(Arc::clone(&store));
        Self {
            store,
            clock,
            activity,
        }
    }

    async fn load(&self, dispute_id: DisputeId) -> MarketplaceResult<(Dispute, Task)> {
        let dispute = self
            .store
            .find_dispute(dispute_id)
            .await?
            .ok_or(MarketplaceError::NotFound("dispute"))?;
        let task = self
            .store
            .find_task(dispute.task_id())
            .await?
            .ok_or(MarketplaceError::NotFound("task"))?;
        Ok((dispute, task))
    }

    /// Returns a dispute to one of the task's parties.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError`] when the dispute is unknown or `actor` is
    /// not a party to the task.
    pub async fn get(&self, actor: UserId, dispute_id: DisputeId) -> MarketplaceResult<Dispute> {
        let (dispute, task) = self.load(dispute_id).await?;
        task.require_party(actor, TaskAction::ViewDispute)?;
        Ok(dispute)
    }

    /// Appends photo evidence to the side `actor` plays on the task.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError`] when the dispute is unknown, `actor` is
    /// not a party, or no usable URL was supplied.
    pub async fn append_evidence(
        &self,
        actor: UserId,
        dispute_id: DisputeId,
        photo_urls: Vec<String>,
    ) -> MarketplaceResult<Dispute> {
        let (_, task) = self.load(dispute_id).await?;
        let role = task.require_party(actor, TaskAction::AddEvidence)?;
        let urls: Vec<String> = photo_urls
            .into_iter()
            .map(|url| url.trim().to_owned())
            .filter(|url| !url.is_empty())
            .collect();
        if urls.is_empty() {
            return Err(DisputeDomainError::NoEvidence.into());
        }

        let dispute = self
            .store
            .append_dispute_evidence(dispute_id, role, &urls, self.clock.utc())
            .await?;

        info!(%dispute_id, %role, added = urls.len(), "dispute evidence added");
        self.activity
            .record(
                ActivityEntry::new(ActivityEvent::DisputeEvidenceAdded, &*self.clock)
                    .with_actor(actor)
                    .with_task(task.id())
                    .with_details(json!({
                        "disputeId": dispute_id,
                        "role": role.as_str(),
                        "photoCount": urls.len(),
                    })),
            )
            .await;
        Ok(dispute)
    }

    /// Moves a pending dispute under operator review.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError`] when the dispute is unknown or not
    /// pending.
    pub async fn start_review(&self, dispute_id: DisputeId) -> MarketplaceResult<Dispute> {
        let (mut dispute, _) = self.load(dispute_id).await?;
        let read_status = dispute.status();
        dispute.begin_review(&*self.clock)?;
        let dispute = self.store.update_dispute(&dispute, read_status).await?;
        info!(%dispute_id, "dispute under review");
        Ok(dispute)
    }

    /// Records an operator's decision. Fund movements are carried out
    /// outside the marketplace; only the outcome is stored.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError`] when the dispute is unknown, already
    /// resolved, or an amount is negative.
    pub async fn record_resolution(
        &self,
        dispute_id: DisputeId,
        resolution: DisputeResolution,
    ) -> MarketplaceResult<Dispute> {
        let (mut dispute, task) = self.load(dispute_id).await?;
        let read_status = dispute.status();
        dispute.resolve(resolution, &*self.clock)?;
        let dispute = self.store.update_dispute(&dispute, read_status).await?;

        info!(%dispute_id, status = %dispute.status(), "dispute resolved");
        self.activity
            .record(
                ActivityEntry::new(ActivityEvent::DisputeResolved, &*self.clock)
                    .with_task(task.id())
                    .with_details(json!({
                        "disputeId": dispute_id,
                        "status": dispute.status().as_str(),
                        "resolution": dispute.resolution(),
                    })),
            )
            .await;
        Ok(dispute)
    }
}
