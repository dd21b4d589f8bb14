//! Repository port for task persistence, discovery and compound commits.

use crate::chat::domain::ChatThread;
use crate::ids::{TaskId, UserId};
use crate::persistence::RepositoryResult;
use crate::task::domain::{Task, TaskCategory, TaskStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// Task persistence contract.
///
/// Updates are check-and-set on the revision the caller loaded; a lost race
/// returns [`crate::persistence::RepositoryError::Conflict`].
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Stores a new task.
    ///
    /// # Errors
    ///
    /// Returns [`crate::persistence::RepositoryError::Duplicate`] when the
    /// identifier or confirmation code is taken.
    async fn store_task(&self, task: &Task) -> RepositoryResult<()>;

    /// Replaces a task whose stored revision equals `expected_revision`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown tasks and `Conflict` when the revision
    /// moved on.
    async fn update_task(&self, task: &Task, expected_revision: u64) -> RepositoryResult<()>;

    /// Replaces a task whose stored revision equals `expected_revision`,
    /// provided no offer exists on it. The offer check and the write happen
    /// in one atomic step.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown tasks and `Conflict` when the revision
    /// moved on or an offer was stored; nothing is written.
    async fn commit_price_change(&self, task: &Task, expected_revision: u64)
    -> RepositoryResult<()>;

    /// Finds a task by identifier.
    async fn find_task(&self, id: TaskId) -> RepositoryResult<Option<Task>>;

    /// Lists tasks matching `filter` in the order it requests.
    async fn list_tasks(&self, filter: &TaskFilter) -> RepositoryResult<Vec<Task>>;

    /// Lists `requested` tasks whose price prompt fell due at or before
    /// `now`, that have no offers and are not showing the prompt yet.
    async fn list_due_price_prompts(&self, now: DateTime<Utc>) -> RepositoryResult<Vec<Task>>;

    /// Lists `poster`'s `requested` tasks that show the price prompt and
    /// still have no offers, newest first.
    async fn list_price_prompted(&self, poster: UserId) -> RepositoryResult<Vec<Task>>;

    /// Counts tasks in an active status assigned to `helper`.
    async fn count_active_jobs(&self, helper: UserId) -> RepositoryResult<usize>;

    /// Atomically applies a confirmed hire: the task update, acceptance of
    /// the helper's pending offer, declining every other pending offer, and
    /// the chat thread (unless one already exists for the task).
    ///
    /// # Errors
    ///
    /// Returns `Conflict` when the task revision moved on; nothing is written.
    async fn commit_hire(&self, commit: &HireCommit) -> RepositoryResult<()>;

    /// Atomically stores a completed task and increments the helper's
    /// completed-job counter.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` when the task revision moved on; nothing is written.
    async fn commit_completion(&self, task: &Task, expected_revision: u64)
    -> RepositoryResult<()>;
}

/// Everything written when a hire capture is confirmed.
#[derive(Debug, Clone)]
pub struct HireCommit {
    /// Task after [`Task::confirm_hire`].
    pub task: Task,
    /// Revision the task was loaded at.
    pub expected_revision: u64,
    /// Thread opened for the pair.
    pub thread: ChatThread,
    /// Capture time.
    pub at: DateTime<Utc>,
}

/// Task listing filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Restrict to a status.
    pub status: Option<TaskStatus>,
    /// Restrict to a ZIP code.
    pub zip_code: Option<String>,
    /// Restrict to a category.
    pub category: Option<TaskCategory>,
    /// Restrict on the tools-required flag.
    pub tools_required: Option<bool>,
    /// Restrict on the tools-provided flag.
    pub tools_provided: Option<bool>,
    /// Restrict to a poster.
    pub poster_id: Option<UserId>,
    /// Restrict to a helper.
    pub helper_id: Option<UserId>,
    /// Exclude tasks that expired at or before this instant.
    pub unexpired_at: Option<DateTime<Utc>>,
    /// List emergency tasks before the rest.
    pub emergency_first: bool,
}

impl TaskFilter {
    /// Tasks posted by `poster`, newest first.
    #[must_use]
    pub fn posted_by(poster: UserId) -> Self {
        Self {
            poster_id: Some(poster),
            ..Self::default()
        }
    }

    /// Tasks `helper` was hired for, newest first.
    #[must_use]
    pub fn assigned_to(helper: UserId) -> Self {
        Self {
            helper_id: Some(helper),
            ..Self::default()
        }
    }

    /// Returns `true` when `task` passes the filter.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        let requirements = task.requirements();
        self.status.is_none_or(|status| task.status() == status)
            && self
                .zip_code
                .as_deref()
                .is_none_or(|zip| task.location().zip_code == zip)
            && self.category.is_none_or(|category| task.category() == category)
            && self
                .tools_required
                .is_none_or(|flag| requirements.tools_required == flag)
            && self
                .tools_provided
                .is_none_or(|flag| requirements.tools_provided == flag)
            && self.poster_id.is_none_or(|poster| task.poster_id() == poster)
            && self
                .helper_id
                .is_none_or(|helper| task.helper_id() == Some(helper))
            && self.unexpired_at.is_none_or(|now| !task.is_expired(now))
    }

    /// Orders two matching tasks.
    #[must_use]
    pub fn compare(&self, left: &Task, right: &Task) -> Ordering {
        let emergency = if self.emergency_first {
            right
                .category()
                .is_emergency()
                .cmp(&left.category().is_emergency())
        } else {
            Ordering::Equal
        };
        emergency.then_with(|| right.created_at().cmp(&left.created_at()))
    }
}
