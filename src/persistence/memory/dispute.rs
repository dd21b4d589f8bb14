use super::InMemoryMarketplace;
use crate::dispute::domain::{Dispute, DisputeStatus};
use crate::dispute::ports::DisputeRepository;
use crate::ids::DisputeId;
use crate::persistence::{RepositoryError, RepositoryResult};
use crate::task::domain::{PartyRole, Task};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
impl DisputeRepository for InMemoryMarketplace {
    async fn commit_dispute(
        &self,
        dispute: &Dispute,
        task: &Task,
        expected_revision: u64,
    ) -> RepositoryResult<()> {
        let mut state = self.write()?;
        if state
            .disputes
            .iter()
            .any(|existing| existing.id() == dispute.id())
        {
            return Err(RepositoryError::duplicate("dispute", dispute.id()));
        }
        let slot = state
            .tasks
            .iter_mut()
            .find(|existing| existing.id() == task.id())
            .ok_or_else(|| RepositoryError::not_found("task", task.id()))?;
        if slot.revision() != expected_revision {
            return Err(RepositoryError::conflict("task", task.id()));
        }
        *slot = task.clone();
        state.disputes.push(dispute.clone());
        Ok(())
    }

    async fn find_dispute(&self, id: DisputeId) -> RepositoryResult<Option<Dispute>> {
        let state = self.read()?;
        Ok(state
            .disputes
            .iter()
            .find(|dispute| dispute.id() == id)
            .cloned())
    }

    async fn append_dispute_evidence(
        &self,
        id: DisputeId,
        role: PartyRole,
        urls: &[String],
        at: DateTime<Utc>,
    ) -> RepositoryResult<Dispute> {
        let mut state = self.write()?;
        let dispute = state
            .disputes
            .iter_mut()
            .find(|dispute| dispute.id() == id)
            .ok_or_else(|| RepositoryError::not_found("dispute", id))?;
        dispute
            .append_evidence(role, urls.to_vec(), at)
            .map_err(|err| RepositoryError::persistence(std::io::Error::other(err.to_string())))?;
        Ok(dispute.clone())
    }

    async fn update_dispute(
        &self,
        dispute: &Dispute,
        expected_status: DisputeStatus,
    ) -> RepositoryResult<Dispute> {
        let mut state = self.write()?;
        let slot = state
            .disputes
            .iter_mut()
            .find(|existing| existing.id() == dispute.id())
            .ok_or_else(|| RepositoryError::not_found("dispute", dispute.id()))?;
        if slot.status() != expected_status {
            return Err(RepositoryError::conflict("dispute", dispute.id()));
        }
        slot.adopt_decision(dispute);
        Ok(slot.clone())
    }
}
