//! Port contracts for identity persistence and code delivery.

use super::domain::{Email, OneTimeCode, OtpCode, User, UserChange};
use crate::ids::{OtpCodeId, UserId};
use crate::persistence::RepositoryResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// User persistence contract.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Stores a new user.
    ///
    /// # Errors
    ///
    /// Returns [`crate::persistence::RepositoryError::Duplicate`] when the
    /// identifier or email is taken.
    async fn store_user(&self, user: &User) -> RepositoryResult<()>;

    /// Writes the fields `change` owns from `user` and returns the stored
    /// user. Other columns keep their stored values. A payee account is only
    /// linked while none is stored; otherwise the stored link is returned
    /// untouched.
    ///
    /// # Errors
    ///
    /// Returns [`crate::persistence::RepositoryError::NotFound`] when the
    /// user does not exist.
    async fn update_user(&self, user: &User, change: UserChange) -> RepositoryResult<User>;

    /// Finds a user by identifier.
    async fn find_user(&self, id: UserId) -> RepositoryResult<Option<User>>;

    /// Finds a user by normalized email.
    async fn find_user_by_email(&self, email: &Email) -> RepositoryResult<Option<User>>;
}

/// One-time code persistence contract.
#[async_trait]
pub trait OtpRepository: Send + Sync {
    /// Stores an issued code.
    async fn store_otp(&self, code: &OtpCode) -> RepositoryResult<()>;

    /// Returns the newest unused, unexpired code matching `email` and
    /// `code` at `now`.
    async fn find_usable_otp(
        &self,
        email: &Email,
        code: &OneTimeCode,
        now: DateTime<Utc>,
    ) -> RepositoryResult<Option<OtpCode>>;

    /// Marks a code used. Returns `false` when it was already used.
    async fn consume_otp(&self, id: OtpCodeId) -> RepositoryResult<bool>;
}

/// Out-of-band delivery of login codes.
#[async_trait]
pub trait OtpNotifier: Send + Sync {
    /// Sends `code` to `email`.
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError`] when the message cannot be delivered.
    async fn deliver(
        &self,
        email: &Email,
        code: &OneTimeCode,
        expires_at: DateTime<Utc>,
    ) -> Result<(), NotifierError>;
}

/// Errors returned by code notifiers.
#[derive(Debug, Clone, Error)]
pub enum NotifierError {
    /// The message template failed to render.
    #[error("failed to render login code message: {0}")]
    Render(String),

    /// The transport refused the message.
    #[error("failed to deliver login code: {0}")]
    Delivery(String),
}
