//! Port contract for offer persistence.

use super::domain::Offer;
use crate::ids::{OfferId, TaskId, UserId};
use crate::persistence::RepositoryResult;
use async_trait::async_trait;

/// Offer persistence contract.
#[async_trait]
pub trait OfferRepository: Send + Sync {
    /// Stores a new offer.
    ///
    /// # Errors
    ///
    /// Returns [`crate::persistence::RepositoryError::Duplicate`] when the
    /// helper already has a pending offer on the task.
    async fn store_offer(&self, offer: &Offer) -> RepositoryResult<()>;

    /// Finds an offer by identifier.
    async fn find_offer(&self, id: OfferId) -> RepositoryResult<Option<Offer>>;

    /// Lists every offer on a task, newest first.
    async fn list_offers_for_task(&self, task_id: TaskId) -> RepositoryResult<Vec<Offer>>;

    /// Counts every offer on a task, whatever its status.
    async fn count_offers_for_task(&self, task_id: TaskId) -> RepositoryResult<usize>;

    /// Finds `helper`'s pending offer on a task.
    async fn find_pending_offer(
        &self,
        task_id: TaskId,
        helper: UserId,
    ) -> RepositoryResult<Option<Offer>>;
}
