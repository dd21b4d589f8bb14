use super::PostgresMarketplace;
use super::models::{MessageRow, ThreadRow};
use super::schema::{chat_messages, chat_threads};
use crate::chat::domain::{ChatMessage, ChatThread};
use crate::chat::ports::ChatRepository;
use crate::ids::{TaskId, ThreadId, UserId};
use crate::persistence::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use diesel::dsl::exists;
use diesel::prelude::*;

#[async_trait]
impl ChatRepository for PostgresMarketplace {
    async fn find_thread(&self, id: ThreadId) -> RepositoryResult<Option<ChatThread>> {
        self.run_blocking(move |connection| {
            Ok(chat_threads::table
                .filter(chat_threads::id.eq(id.into_inner()))
                .select(ThreadRow::as_select())
                .first::<ThreadRow>(connection)
                .optional()?
                .map(ThreadRow::into_domain))
        })
        .await
    }

    async fn find_thread_for_task(&self, task_id: TaskId) -> RepositoryResult<Option<ChatThread>> {
        self.run_blocking(move |connection| {
            Ok(chat_threads::table
                .filter(chat_threads::task_id.eq(task_id.into_inner()))
                .select(ThreadRow::as_select())
                .first::<ThreadRow>(connection)
                .optional()?
                .map(ThreadRow::into_domain))
        })
        .await
    }

    async fn list_threads_for_user(&self, user: UserId) -> RepositoryResult<Vec<ChatThread>> {
        self.run_blocking(move |connection| {
            let participant = user.into_inner();
            let rows = chat_threads::table
                .filter(
                    chat_threads::poster_id
                        .eq(participant)
                        .or(chat_threads::helper_id.eq(participant)),
                )
                .order(chat_threads::created_at.desc())
                .select(ThreadRow::as_select())
                .load::<ThreadRow>(connection)?;
            Ok(rows.into_iter().map(ThreadRow::into_domain).collect())
        })
        .await
    }

    async fn store_message(&self, message: &ChatMessage) -> RepositoryResult<()> {
        let row = MessageRow::from_domain(message);
        self.run_blocking(move |connection| {
            let thread_exists = diesel::select(exists(
                chat_threads::table.filter(chat_threads::id.eq(row.thread_id)),
            ))
            .get_result::<bool>(connection)?;
            if !thread_exists {
                return Err(RepositoryError::not_found("chat thread", row.thread_id));
            }
            diesel::insert_into(chat_messages::table)
                .values(&row)
                .execute(connection)?;
            Ok(())
        })
        .await
    }

    async fn list_messages(&self, thread_id: ThreadId) -> RepositoryResult<Vec<ChatMessage>> {
        self.run_blocking(move |connection| {
            let rows = chat_messages::table
                .filter(chat_messages::thread_id.eq(thread_id.into_inner()))
                .order(chat_messages::created_at.asc())
                .select(MessageRow::as_select())
                .load::<MessageRow>(connection)?;
            Ok(rows.into_iter().map(MessageRow::into_domain).collect())
        })
        .await
    }

    async fn has_proof_photo(&self, thread_id: ThreadId) -> RepositoryResult<bool> {
        self.run_blocking(move |connection| {
            let found = diesel::select(exists(
                chat_messages::table
                    .filter(chat_messages::thread_id.eq(thread_id.into_inner()))
                    .filter(chat_messages::is_proof.eq(true))
                    .filter(chat_messages::image_url.is_not_null()),
            ))
            .get_result::<bool>(connection)?;
            Ok(found)
        })
        .await
    }
}
