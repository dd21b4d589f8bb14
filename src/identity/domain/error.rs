//! Identity domain errors.

use thiserror::Error;

/// Errors raised by identity domain rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityDomainError {
    /// The email address is malformed.
    #[error("invalid email address '{0}'")]
    InvalidEmail(String),

    /// The submitted code is unknown, used or expired.
    #[error("invalid or expired code")]
    CodeInvalidOrExpired,

    /// A profile photo URL was blank.
    #[error("profile photo URL must not be empty")]
    EmptyProfilePhoto,

    /// The bearer token is malformed or carries a bad signature.
    #[error("invalid session token")]
    InvalidSessionToken,

    /// The bearer token is past its expiry.
    #[error("session token has expired")]
    ExpiredSessionToken,
}
