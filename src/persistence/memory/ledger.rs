//! Offers, activity entries and unreconciled events.

use super::InMemoryMarketplace;
use crate::activity::domain::{ActivityEntry, ActivityQuery};
use crate::activity::ports::ActivityLog;
use crate::ids::{OfferId, TaskId, UserId};
use crate::offer::domain::{Offer, OfferStatus};
use crate::offer::ports::OfferRepository;
use crate::persistence::{RepositoryError, RepositoryResult};
use crate::settlement::domain::UnreconciledEvent;
use crate::settlement::ports::UnreconciledEventStore;
use async_trait::async_trait;

#[async_trait]
impl OfferRepository for InMemoryMarketplace {
    async fn store_offer(&self, offer: &Offer) -> RepositoryResult<()> {
        let mut state = self.write()?;
        if state.offers.iter().any(|existing| existing.id() == offer.id()) {
            return Err(RepositoryError::duplicate("offer", offer.id()));
        }
        if state.offers.iter().any(|existing| {
            existing.task_id() == offer.task_id()
                && existing.helper_id() == offer.helper_id()
                && existing.status() == OfferStatus::Pending
        }) {
            return Err(RepositoryError::duplicate(
                "pending offer",
                format!("{}/{}", offer.task_id(), offer.helper_id()),
            ));
        }
        state.offers.push(offer.clone());
        Ok(())
    }

    async fn find_offer(&self, id: OfferId) -> RepositoryResult<Option<Offer>> {
        let state = self.read()?;
        Ok(state.offers.iter().find(|offer| offer.id() == id).cloned())
    }

    async fn list_offers_for_task(&self, task_id: TaskId) -> RepositoryResult<Vec<Offer>> {
        let state = self.read()?;
        Ok(super::newest_first(
            state
                .offers
                .iter()
                .filter(|offer| offer.task_id() == task_id)
                .cloned(),
            Offer::created_at,
        ))
    }

    async fn count_offers_for_task(&self, task_id: TaskId) -> RepositoryResult<usize> {
        let state = self.read()?;
        Ok(state
            .offers
            .iter()
            .filter(|offer| offer.task_id() == task_id)
            .count())
    }

    async fn find_pending_offer(
        &self,
        task_id: TaskId,
        helper: UserId,
    ) -> RepositoryResult<Option<Offer>> {
        let state = self.read()?;
        Ok(state
            .offers
            .iter()
            .find(|offer| {
                offer.task_id() == task_id
                    && offer.helper_id() == helper
                    && offer.status() == OfferStatus::Pending
            })
            .cloned())
    }
}

#[async_trait]
impl ActivityLog for InMemoryMarketplace {
    async fn append_activity(&self, entry: &ActivityEntry) -> RepositoryResult<()> {
        self.write()?.activity.push(entry.clone());
        Ok(())
    }

    async fn list_activity(&self, query: &ActivityQuery) -> RepositoryResult<Vec<ActivityEntry>> {
        let state = self.read()?;
        let mut entries = super::newest_first(
            state
                .activity
                .iter()
                .filter(|entry| query.matches(entry))
                .cloned(),
            |entry: &ActivityEntry| entry.created_at,
        );
        entries.truncate(query.limit);
        Ok(entries)
    }
}

#[async_trait]
impl UnreconciledEventStore for InMemoryMarketplace {
    async fn record_unreconciled(&self, event: &UnreconciledEvent) -> RepositoryResult<()> {
        self.write()?.unreconciled.push(event.clone());
        Ok(())
    }

    async fn list_unreconciled(&self, limit: usize) -> RepositoryResult<Vec<UnreconciledEvent>> {
        let state = self.read()?;
        let mut events = super::newest_first(
            state.unreconciled.iter().cloned(),
            |event: &UnreconciledEvent| event.received_at,
        );
        events.truncate(limit);
        Ok(events)
    }
}
