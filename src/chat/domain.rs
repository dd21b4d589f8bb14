//! Chat threads opened between poster and helper at hire time.

use crate::identity::domain::User;
use crate::ids::{MessageId, TaskId, ThreadId, UserId};
use chrono::{DateTime, Duration, Utc};
use mockable::Clock;
use thiserror::Error;

/// Days a chat thread stays open after the hire.
pub const THREAD_LIFETIME_DAYS: i64 = 3;

/// Errors raised by chat rules.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChatDomainError {
    /// The user is not one of the two participants.
    #[error("only the poster and helper can use this chat")]
    NotParticipant(ThreadId),

    /// The thread is past its expiry.
    #[error("this chat has closed")]
    ThreadClosed(ThreadId),

    /// The message carries neither text nor an image.
    #[error("a message needs text or an image")]
    EmptyMessage,

    /// A proof message without an image.
    #[error("a proof message needs an image")]
    ProofWithoutImage,
}

/// Conversation between the poster and the hired helper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatThread {
    id: ThreadId,
    task_id: TaskId,
    poster_id: UserId,
    helper_id: UserId,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

/// Data required to reconstruct a persisted thread.
#[derive(Debug, Clone)]
pub struct PersistedThreadData {
    /// Thread identifier.
    pub id: ThreadId,
    /// Task the thread belongs to.
    pub task_id: TaskId,
    /// Poster participant.
    pub poster_id: UserId,
    /// Helper participant.
    pub helper_id: UserId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Expiry timestamp.
    pub expires_at: DateTime<Utc>,
}

impl ChatThread {
    /// Opens a thread for a freshly hired pair.
    #[must_use]
    pub fn open(
        task_id: TaskId,
        poster_id: UserId,
        helper_id: UserId,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ThreadId::new(),
            task_id,
            poster_id,
            helper_id,
            created_at: at,
            expires_at: at + Duration::days(THREAD_LIFETIME_DAYS),
        }
    }

    /// Reconstructs a thread from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedThreadData) -> Self {
        Self {
            id: data.id,
            task_id: data.task_id,
            poster_id: data.poster_id,
            helper_id: data.helper_id,
            created_at: data.created_at,
            expires_at: data.expires_at,
        }
    }

    /// Returns the thread identifier.
    #[must_use]
    pub const fn id(&self) -> ThreadId {
        self.id
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the poster participant.
    #[must_use]
    pub const fn poster_id(&self) -> UserId {
        self.poster_id
    }

    /// Returns the helper participant.
    #[must_use]
    pub const fn helper_id(&self) -> UserId {
        self.helper_id
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the expiry timestamp.
    #[must_use]
    pub const fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Returns `true` when `user` is a participant.
    #[must_use]
    pub fn is_participant(&self, user: UserId) -> bool {
        user == self.poster_id || user == self.helper_id
    }

    /// Returns `true` once the thread has expired.
    #[must_use]
    pub fn is_closed(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Checks that `user` may read the thread.
    ///
    /// # Errors
    ///
    /// Returns [`ChatDomainError::NotParticipant`] for outsiders.
    pub fn ensure_participant(&self, user: UserId) -> Result<(), ChatDomainError> {
        if self.is_participant(user) {
            Ok(())
        } else {
            Err(ChatDomainError::NotParticipant(self.id))
        }
    }
}

/// Content of a message about to be posted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageDraft {
    /// Message text.
    pub text: Option<String>,
    /// Attached image URL.
    pub image_url: Option<String>,
    /// Marks the image as proof of completion.
    pub is_proof: bool,
}

/// A chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    id: MessageId,
    thread_id: ThreadId,
    sender_id: UserId,
    sender_name: String,
    text: Option<String>,
    image_url: Option<String>,
    is_proof: bool,
    created_at: DateTime<Utc>,
}

/// Data required to reconstruct a persisted message.
#[derive(Debug, Clone)]
pub struct PersistedMessageData {
    /// Message identifier.
    pub id: MessageId,
    /// Thread the message belongs to.
    pub thread_id: ThreadId,
    /// Sender.
    pub sender_id: UserId,
    /// Sender name snapshot.
    pub sender_name: String,
    /// Text.
    pub text: Option<String>,
    /// Image URL.
    pub image_url: Option<String>,
    /// Proof flag.
    pub is_proof: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_owned())
        .filter(|trimmed| !trimmed.is_empty())
}

impl ChatMessage {
    /// Posts a message from `sender` into `thread`.
    ///
    /// # Errors
    ///
    /// Returns [`ChatDomainError`] when the sender is not a participant, the
    /// thread has closed, or the draft is empty.
    pub fn post(
        thread: &ChatThread,
        sender: &User,
        draft: MessageDraft,
        clock: &impl Clock,
    ) -> Result<Self, ChatDomainError> {
        thread.ensure_participant(sender.id())?;
        let now = clock.utc();
        if thread.is_closed(now) {
            return Err(ChatDomainError::ThreadClosed(thread.id()));
        }
        let text = non_blank(draft.text);
        let image_url = non_blank(draft.image_url);
        if text.is_none() && image_url.is_none() {
            return Err(ChatDomainError::EmptyMessage);
        }
        if draft.is_proof && image_url.is_none() {
            return Err(ChatDomainError::ProofWithoutImage);
        }
        Ok(Self {
            id: MessageId::new(),
            thread_id: thread.id(),
            sender_id: sender.id(),
            sender_name: sender.display_name_or("User").to_owned(),
            text,
            image_url,
            is_proof: draft.is_proof,
            created_at: now,
        })
    }

    /// Reconstructs a message from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedMessageData) -> Self {
        Self {
            id: data.id,
            thread_id: data.thread_id,
            sender_id: data.sender_id,
            sender_name: data.sender_name,
            text: data.text,
            image_url: data.image_url,
            is_proof: data.is_proof,
            created_at: data.created_at,
        }
    }

    /// Returns the message identifier.
    #[must_use]
    pub const fn id(&self) -> MessageId {
        self.id
    }

    /// Returns the thread identifier.
    #[must_use]
    pub const fn thread_id(&self) -> ThreadId {
        self.thread_id
    }

    /// Returns the sender.
    #[must_use]
    pub const fn sender_id(&self) -> UserId {
        self.sender_id
    }

    /// Returns the sender name snapshot.
    #[must_use]
    pub fn sender_name(&self) -> &str {
        &self.sender_name
    }

    /// Returns the text.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Returns the image URL.
    #[must_use]
    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    /// Returns the proof flag.
    #[must_use]
    pub const fn is_proof(&self) -> bool {
        self.is_proof
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns `true` for a proof-of-completion photo.
    #[must_use]
    pub const fn is_proof_photo(&self) -> bool {
        self.is_proof && self.image_url.is_some()
    }
}
