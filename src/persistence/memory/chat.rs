use super::InMemoryMarketplace;
use crate::chat::domain::{ChatMessage, ChatThread};
use crate::chat::ports::ChatRepository;
use crate::ids::{TaskId, ThreadId, UserId};
use crate::persistence::{RepositoryError, RepositoryResult};
use async_trait::async_trait;

#[async_trait]
impl ChatRepository for InMemoryMarketplace {
    async fn find_thread(&self, id: ThreadId) -> RepositoryResult<Option<ChatThread>> {
        let state = self.read()?;
        Ok(state.threads.iter().find(|thread| thread.id() == id).cloned())
    }

    async fn find_thread_for_task(&self, task_id: TaskId) -> RepositoryResult<Option<ChatThread>> {
        let state = self.read()?;
        Ok(state
            .threads
            .iter()
            .find(|thread| thread.task_id() == task_id)
            .cloned())
    }

    async fn list_threads_for_user(&self, user: UserId) -> RepositoryResult<Vec<ChatThread>> {
        let state = self.read()?;
        Ok(super::newest_first(
            state
                .threads
                .iter()
                .filter(|thread| thread.is_participant(user))
                .cloned(),
            ChatThread::created_at,
        ))
    }

    async fn store_message(&self, message: &ChatMessage) -> RepositoryResult<()> {
        let mut state = self.write()?;
        if !state
            .threads
            .iter()
            .any(|thread| thread.id() == message.thread_id())
        {
            return Err(RepositoryError::not_found("chat thread", message.thread_id()));
        }
        state.messages.push(message.clone());
        Ok(())
    }

    async fn list_messages(&self, thread_id: ThreadId) -> RepositoryResult<Vec<ChatMessage>> {
        let state = self.read()?;
        let mut messages: Vec<ChatMessage> = state
            .messages
            .iter()
            .filter(|message| message.thread_id() == thread_id)
            .cloned()
            .collect();
        messages.sort_by_key(ChatMessage::created_at);
        Ok(messages)
    }

    async fn has_proof_photo(&self, thread_id: ThreadId) -> RepositoryResult<bool> {
        let state = self.read()?;
        Ok(state
            .messages
            .iter()
            .any(|message| message.thread_id() == thread_id && message.is_proof_photo()))
    }
}
