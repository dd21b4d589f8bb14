//! Port contract for dispute persistence.

use super::domain::{Dispute, DisputeStatus};
use crate::ids::DisputeId;
use crate::persistence::RepositoryResult;
use crate::task::domain::{PartyRole, Task};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Dispute persistence contract.
#[async_trait]
pub trait DisputeRepository: Send + Sync {
    /// Atomically stores a new dispute and the disputed task.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` when the task revision moved on; nothing is written.
    async fn commit_dispute(
        &self,
        dispute: &Dispute,
        task: &Task,
        expected_revision: u64,
    ) -> RepositoryResult<()>;

    /// Finds a dispute by identifier.
    async fn find_dispute(&self, id: DisputeId) -> RepositoryResult<Option<Dispute>>;

    /// Appends evidence to one side in a single atomic write and returns
    /// the updated dispute.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown disputes.
    async fn append_dispute_evidence(
        &self,
        id: DisputeId,
        role: PartyRole,
        urls: &[String],
        at: DateTime<Utc>,
    ) -> RepositoryResult<Dispute>;

    /// Persists a status or resolution change when the stored status is
    /// still `expected_status`, and returns the stored dispute. Evidence
    /// arrays are never written here.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown disputes and `Conflict` when the
    /// status moved on since the dispute was read.
    async fn update_dispute(
        &self,
        dispute: &Dispute,
        expected_status: DisputeStatus,
    ) -> RepositoryResult<Dispute>;
}
