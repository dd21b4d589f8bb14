//! Thin chat service over the thread and message store.

use super::domain::{ChatMessage, ChatThread, MessageDraft};
use crate::error::{MarketplaceError, MarketplaceResult};
use crate::identity::domain::User;
use crate::ids::{ThreadId, UserId};
use crate::persistence::MarketplaceStore;
use mockable::Clock;
use std::sync::Arc;
use tracing::debug;

/// Chat service for the two parties of a hired task.
pub struct ChatService<S, C>
where
    S: MarketplaceStore,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    clock: Arc<C>,
}

impl<S, C> Clone for ChatService<S, C>
where
    S: MarketplaceStore,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<S, C> ChatService<S, C>
where
    S: MarketplaceStore,
    C: Clock + Send + Sync,
{
    /// Creates a chat service.
    #[must_use]
    pub const fn new(store: Arc<S>, clock: Arc<C>) -> Self {
        Self { store, clock }
    }

    async fn participant_thread(
        &self,
        actor: UserId,
        thread_id: ThreadId,
    ) -> MarketplaceResult<ChatThread> {
        let thread = self
            .store
            .find_thread(thread_id)
            .await?
            .ok_or(MarketplaceError::NotFound("thread"))?;
        thread.ensure_participant(actor)?;
        Ok(thread)
    }

    /// Lists threads `actor` takes part in, newest first.
    ///
    /// # Errors
    ///
    /// Returns the repository error when the listing fails.
    pub async fn threads_for(&self, actor: UserId) -> MarketplaceResult<Vec<ChatThread>> {
        Ok(self.store.list_threads_for_user(actor).await?)
    }

    /// Lists a thread's messages, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError`] when the thread is unknown or `actor` is
    /// not a participant.
    pub async fn messages(
        &self,
        actor: UserId,
        thread_id: ThreadId,
    ) -> MarketplaceResult<Vec<ChatMessage>> {
        let thread = self.participant_thread(actor, thread_id).await?;
        Ok(self.store.list_messages(thread.id()).await?)
    }

    /// Posts a message into a thread.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError`] when the thread is unknown or closed,
    /// `actor` is not a participant, or the draft is empty.
    pub async fn post(
        &self,
        actor: UserId,
        thread_id: ThreadId,
        draft: MessageDraft,
    ) -> MarketplaceResult<ChatMessage> {
        let thread = self.participant_thread(actor, thread_id).await?;
        let sender = self
            .store
            .find_user(actor)
            .await?
            .unwrap_or_else(|| User::stub(actor, &*self.clock));
        let message = ChatMessage::post(&thread, &sender, draft, &*self.clock)?;
        self.store.store_message(&message).await?;
        debug!(%thread_id, message_id = %message.id(), is_proof = message.is_proof(), "chat message posted");
        Ok(message)
    }
}
