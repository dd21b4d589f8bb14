use super::InMemoryMarketplace;
use crate::billing::domain::{ExtraWorkRequest, ExtraWorkStatus};
use crate::billing::ports::ExtraWorkRepository;
use crate::ids::{ExtraWorkId, TaskId};
use crate::persistence::{RepositoryError, RepositoryResult};
use async_trait::async_trait;

#[async_trait]
impl ExtraWorkRepository for InMemoryMarketplace {
    async fn store_extra_work(&self, request: &ExtraWorkRequest) -> RepositoryResult<()> {
        let mut state = self.write()?;
        if state
            .extra_work
            .iter()
            .any(|existing| existing.id() == request.id())
        {
            return Err(RepositoryError::duplicate("extra-work request", request.id()));
        }
        if state.extra_work.iter().any(|existing| {
            existing.task_id() == request.task_id() && existing.status() == ExtraWorkStatus::Pending
        }) {
            return Err(RepositoryError::duplicate(
                "pending extra-work request",
                request.task_id(),
            ));
        }
        state.extra_work.push(request.clone());
        Ok(())
    }

    async fn update_extra_work(
        &self,
        request: &ExtraWorkRequest,
        expected_status: ExtraWorkStatus,
    ) -> RepositoryResult<()> {
        let mut state = self.write()?;
        let slot = state
            .extra_work
            .iter_mut()
            .find(|existing| existing.id() == request.id())
            .ok_or_else(|| RepositoryError::not_found("extra-work request", request.id()))?;
        if slot.status() != expected_status {
            return Err(RepositoryError::conflict("extra-work request", request.id()));
        }
        *slot = request.clone();
        Ok(())
    }

    async fn find_extra_work(&self, id: ExtraWorkId) -> RepositoryResult<Option<ExtraWorkRequest>> {
        let state = self.read()?;
        Ok(state
            .extra_work
            .iter()
            .find(|request| request.id() == id)
            .cloned())
    }

    async fn list_extra_work_for_task(
        &self,
        task_id: TaskId,
    ) -> RepositoryResult<Vec<ExtraWorkRequest>> {
        let state = self.read()?;
        Ok(super::newest_first(
            state
                .extra_work
                .iter()
                .filter(|request| request.task_id() == task_id)
                .cloned(),
            ExtraWorkRequest::created_at,
        ))
    }

    async fn commit_extra_work_payment(
        &self,
        request: &ExtraWorkRequest,
        expected_status: ExtraWorkStatus,
    ) -> RepositoryResult<()> {
        let mut state = self.write()?;
        let request_index = state
            .extra_work
            .iter()
            .position(|existing| existing.id() == request.id())
            .ok_or_else(|| RepositoryError::not_found("extra-work request", request.id()))?;
        let task_index = state
            .tasks
            .iter()
            .position(|task| task.id() == request.task_id())
            .ok_or_else(|| RepositoryError::not_found("task", request.task_id()))?;
        let slot = state
            .extra_work
            .get_mut(request_index)
            .ok_or_else(|| RepositoryError::not_found("extra-work request", request.id()))?;
        if slot.status() != expected_status {
            return Err(RepositoryError::conflict("extra-work request", request.id()));
        }
        *slot = request.clone();

        let paid_at = request.paid_at().unwrap_or_else(|| request.created_at());
        if let Some(task) = state.tasks.get_mut(task_index) {
            task.record_extra_payment(request.amount(), paid_at);
        }
        Ok(())
    }
}
