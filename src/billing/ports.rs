//! Port contract for extra-work persistence.

use super::domain::{ExtraWorkRequest, ExtraWorkStatus};
use crate::ids::{ExtraWorkId, TaskId};
use crate::persistence::RepositoryResult;
use async_trait::async_trait;

/// Extra-work persistence contract.
#[async_trait]
pub trait ExtraWorkRepository: Send + Sync {
    /// Stores a new request.
    ///
    /// # Errors
    ///
    /// Returns [`crate::persistence::RepositoryError::Duplicate`] when the
    /// task already has a pending request.
    async fn store_extra_work(&self, request: &ExtraWorkRequest) -> RepositoryResult<()>;

    /// Replaces a request whose stored status equals `expected_status`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown requests and `Conflict` when the status
    /// moved on.
    async fn update_extra_work(
        &self,
        request: &ExtraWorkRequest,
        expected_status: ExtraWorkStatus,
    ) -> RepositoryResult<()>;

    /// Finds a request by identifier.
    async fn find_extra_work(&self, id: ExtraWorkId) -> RepositoryResult<Option<ExtraWorkRequest>>;

    /// Lists a task's requests, newest first.
    async fn list_extra_work_for_task(
        &self,
        task_id: TaskId,
    ) -> RepositoryResult<Vec<ExtraWorkRequest>>;

    /// Atomically marks a request paid and adds its amount to the task's
    /// cumulative extra-work total.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` when the request status moved on; nothing is
    /// written.
    async fn commit_extra_work_payment(
        &self,
        request: &ExtraWorkRequest,
        expected_status: ExtraWorkStatus,
    ) -> RepositoryResult<()>;
}
