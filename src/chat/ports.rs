//! Port contract for chat persistence.

use super::domain::{ChatMessage, ChatThread};
use crate::ids::{TaskId, ThreadId, UserId};
use crate::persistence::RepositoryResult;
use async_trait::async_trait;

/// Chat persistence contract. Threads are created by the hire commit.
#[async_trait]
pub trait ChatRepository: Send + Sync {
    /// Finds a thread by identifier.
    async fn find_thread(&self, id: ThreadId) -> RepositoryResult<Option<ChatThread>>;

    /// Finds the thread for a task.
    async fn find_thread_for_task(&self, task_id: TaskId) -> RepositoryResult<Option<ChatThread>>;

    /// Lists threads `user` participates in, newest first.
    async fn list_threads_for_user(&self, user: UserId) -> RepositoryResult<Vec<ChatThread>>;

    /// Stores a message.
    async fn store_message(&self, message: &ChatMessage) -> RepositoryResult<()>;

    /// Lists a thread's messages, oldest first.
    async fn list_messages(&self, thread_id: ThreadId) -> RepositoryResult<Vec<ChatMessage>>;

    /// Returns `true` when the thread holds a proof-of-completion photo.
    async fn has_proof_photo(&self, thread_id: ThreadId) -> RepositoryResult<bool>;
}
