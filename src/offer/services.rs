//! Offer submission and listing.

use super::domain::{Offer, OfferDomainError};
use crate::activity::domain::{ActivityEntry, ActivityEvent};
use crate::activity::services::ActivityRecorder;
use crate::error::{MarketplaceError, MarketplaceResult};
use crate::identity::domain::User;
use crate::ids::{TaskId, UserId};
use crate::payments::domain::Money;
use crate::persistence::{MarketplaceStore, RepositoryError};
use mockable::Clock;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

/// Offer ledger service.
pub struct OfferLedgerService<S, C>
where
    S: MarketplaceStore,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    clock: Arc<C>,
    activity: ActivityRecorder<S>,
}

impl<S, C> Clone for OfferLedgerService<S, C>
where
    S: MarketplaceStore,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
            activity: self.activity.clone(),
        }
    }
}

impl<S, C> OfferLedgerService<S, C>
where
    S: MarketplaceStore,
    C: Clock + Send + Sync,
{
    /// Creates an offer ledger service.
    #[must_use]
    pub fn new(store: Arc<S>, clock: Arc<C>) -> Self {
        let activity = ActivityRecorder::new(Arc::clone(&store));
        Self {
            store,
            clock,
            activity,
        }
    }

    /// Submits `actor`'s offer on an open task. The task is not changed.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError`] when the task is unknown or not open, the
    /// helper is the poster, has no profile photo or already has a pending
    /// offer on the task, or the proposed price is not positive.
    pub async fn submit(
        &self,
        actor: UserId,
        task_id: TaskId,
        note: Option<String>,
        proposed_price: Option<Money>,
    ) -> MarketplaceResult<Offer> {
        let task = self
            .store
            .find_task(task_id)
            .await?
            .ok_or(MarketplaceError::NotFound("task"))?;
        let helper = self
            .store
            .find_user(actor)
            .await?
            .unwrap_or_else(|| User::stub(actor, &*self.clock));
        let offer = Offer::submit(&task, &helper, note, proposed_price, &*self.clock)?;

        match self.store.store_offer(&offer).await {
            Ok(()) => {}
            Err(RepositoryError::Duplicate { .. }) => {
                return Err(OfferDomainError::DuplicatePendingOffer(task_id).into());
            }
            Err(err) => return Err(err.into()),
        }

        info!(offer_id = %offer.id(), %task_id, helper_id = %actor, "offer submitted");
        self.activity
            .record(
                ActivityEntry::new(ActivityEvent::OfferSubmitted, &*self.clock)
                    .with_actor(actor)
                    .with_task(task_id)
                    .with_offer(offer.id())
                    .with_details(json!({ "proposedPrice": offer.proposed_price() })),
            )
            .await;
        Ok(offer)
    }

    /// Lists every offer on a task, newest first, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::NotFound`] for unknown tasks.
    pub async fn list(&self, task_id: TaskId) -> MarketplaceResult<Vec<Offer>> {
        if self.store.find_task(task_id).await?.is_none() {
            return Err(MarketplaceError::NotFound("task"));
        }
        Ok(self.store.list_offers_for_task(task_id).await?)
    }
}
