use super::{InMemoryMarketplace, MarketplaceState};
use crate::ids::{TaskId, UserId};
use crate::offer::domain::OfferStatus;
use crate::persistence::{RepositoryError, RepositoryResult};
use crate::task::domain::{Task, TaskStatus};
use crate::task::ports::{HireCommit, TaskFilter, TaskRepository};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Returns the index of the stored task, checking its revision.
fn checked_slot(
    state: &MarketplaceState,
    id: TaskId,
    expected_revision: u64,
) -> RepositoryResult<usize> {
    let index = state
        .tasks
        .iter()
        .position(|task| task.id() == id)
        .ok_or_else(|| RepositoryError::not_found("task", id))?;
    let current = state
        .tasks
        .get(index)
        .map(Task::revision)
        .ok_or_else(|| RepositoryError::not_found("task", id))?;
    if current != expected_revision {
        return Err(RepositoryError::conflict("task", id));
    }
    Ok(index)
}

fn replace_task(state: &mut MarketplaceState, index: usize, task: &Task) -> RepositoryResult<()> {
    let slot = state
        .tasks
        .get_mut(index)
        .ok_or_else(|| RepositoryError::not_found("task", task.id()))?;
    *slot = task.clone();
    Ok(())
}

#[async_trait]
impl TaskRepository for InMemoryMarketplace {
    async fn store_task(&self, task: &Task) -> RepositoryResult<()> {
        let mut state = self.write()?;
        if state.tasks.iter().any(|existing| existing.id() == task.id()) {
            return Err(RepositoryError::duplicate("task", task.id()));
        }
        if state
            .tasks
            .iter()
            .any(|existing| existing.confirmation_code() == task.confirmation_code())
        {
            return Err(RepositoryError::duplicate(
                "confirmation code",
                task.confirmation_code(),
            ));
        }
        state.tasks.push(task.clone());
        Ok(())
    }

    async fn update_task(&self, task: &Task, expected_revision: u64) -> RepositoryResult<()> {
        let mut state = self.write()?;
        let index = checked_slot(&state, task.id(), expected_revision)?;
        replace_task(&mut state, index, task)
    }

    async fn commit_price_change(
        &self,
        task: &Task,
        expected_revision: u64,
    ) -> RepositoryResult<()> {
        let mut state = self.write()?;
        let index = checked_slot(&state, task.id(), expected_revision)?;
        if state.offers.iter().any(|offer| offer.task_id() == task.id()) {
            return Err(RepositoryError::conflict("task", task.id()));
        }
        replace_task(&mut state, index, task)
    }

    async fn find_task(&self, id: TaskId) -> RepositoryResult<Option<Task>> {
        let state = self.read()?;
        Ok(state.tasks.iter().find(|task| task.id() == id).cloned())
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> RepositoryResult<Vec<Task>> {
        let state = self.read()?;
        let mut tasks: Vec<Task> = state
            .tasks
            .iter()
            .rev()
            .filter(|task| filter.matches(task))
            .cloned()
            .collect();
        tasks.sort_by(|left, right| filter.compare(left, right));
        Ok(tasks)
    }

    async fn list_due_price_prompts(&self, now: DateTime<Utc>) -> RepositoryResult<Vec<Task>> {
        let state = self.read()?;
        Ok(state
            .tasks
            .iter()
            .filter(|task| {
                task.is_due_price_prompt(now)
                    && !state.offers.iter().any(|offer| offer.task_id() == task.id())
            })
            .cloned()
            .collect())
    }

    async fn list_price_prompted(&self, poster: UserId) -> RepositoryResult<Vec<Task>> {
        let state = self.read()?;
        Ok(super::newest_first(
            state
                .tasks
                .iter()
                .filter(|task| {
                    task.poster_id() == poster
                        && task.status() == TaskStatus::Requested
                        && task.price_prompt_shown()
                        && !state.offers.iter().any(|offer| offer.task_id() == task.id())
                })
                .cloned(),
            Task::created_at,
        ))
    }

    async fn count_active_jobs(&self, helper: UserId) -> RepositoryResult<usize> {
        let state = self.read()?;
        Ok(state
            .tasks
            .iter()
            .filter(|task| task.helper_id() == Some(helper) && task.status().is_active_job())
            .count())
    }

    async fn commit_hire(&self, commit: &HireCommit) -> RepositoryResult<()> {
        let mut state = self.write()?;
        let task = &commit.task;
        let index = checked_slot(&state, task.id(), commit.expected_revision)?;
        let helper_id = task.helper_id();

        let mut resolved_offers = Vec::new();
        for (position, offer) in state.offers.iter().enumerate() {
            if offer.task_id() != task.id() || offer.status() != OfferStatus::Pending {
                continue;
            }
            let mut resolved = offer.clone();
            let outcome = if Some(resolved.helper_id()) == helper_id {
                resolved.accept(commit.at)
            } else {
                resolved.decline(commit.at)
            };
            outcome.map_err(|err| {
                RepositoryError::persistence(std::io::Error::other(err.to_string()))
            })?;
            resolved_offers.push((position, resolved));
        }

        replace_task(&mut state, index, task)?;
        for (position, resolved) in resolved_offers {
            if let Some(slot) = state.offers.get_mut(position) {
                *slot = resolved;
            }
        }
        if !state
            .threads
            .iter()
            .any(|thread| thread.task_id() == task.id())
        {
            state.threads.push(commit.thread.clone());
        }
        Ok(())
    }

    async fn commit_completion(
        &self,
        task: &Task,
        expected_revision: u64,
    ) -> RepositoryResult<()> {
        let mut state = self.write()?;
        let index = checked_slot(&state, task.id(), expected_revision)?;
        replace_task(&mut state, index, task)?;
        if let Some(helper_id) = task.helper_id() {
            if let Some(helper) = state.users.iter_mut().find(|user| user.id() == helper_id) {
                helper.record_completed_job(task.updated_at());
            }
        }
        Ok(())
    }
}
