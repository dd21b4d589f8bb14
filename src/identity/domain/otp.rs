//! One-time login codes.

use super::{Email, IdentityDomainError};
use crate::ids::OtpCodeId;
use chrono::{DateTime, Duration, Utc};
use mockable::Clock;
use rand::Rng;
use std::fmt;

/// How long an issued code stays usable.
pub const OTP_LIFETIME_MINUTES: i64 = 10;

/// A six-digit numeric login code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OneTimeCode(String);

impl OneTimeCode {
    /// Generates a random six-digit code.
    #[must_use]
    pub fn generate(rng: &mut impl Rng) -> Self {
        let value: u32 = rng.gen_range(100_000..1_000_000);
        Self(value.to_string())
    }

    /// Parses a submitted code.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityDomainError::CodeInvalidOrExpired`] unless the input
    /// is exactly six ASCII digits.
    pub fn parse(raw: &str) -> Result<Self, IdentityDomainError> {
        let trimmed = raw.trim();
        if trimmed.len() != 6 || !trimmed.chars().all(|ch| ch.is_ascii_digit()) {
            return Err(IdentityDomainError::CodeInvalidOrExpired);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OneTimeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An issued login code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpCode {
    id: OtpCodeId,
    email: Email,
    code: OneTimeCode,
    expires_at: DateTime<Utc>,
    used: bool,
    created_at: DateTime<Utc>,
}

/// Data required to reconstruct a persisted code.
#[derive(Debug, Clone)]
pub struct PersistedOtpData {
    /// Code identifier.
    pub id: OtpCodeId,
    /// Address the code was sent to.
    pub email: Email,
    /// The code itself.
    pub code: OneTimeCode,
    /// Expiry timestamp.
    pub expires_at: DateTime<Utc>,
    /// Whether the code was consumed.
    pub used: bool,
    /// Issue timestamp.
    pub created_at: DateTime<Utc>,
}

impl OtpCode {
    /// Issues a code for `email` valid for [`OTP_LIFETIME_MINUTES`].
    #[must_use]
    pub fn issue(email: Email, code: OneTimeCode, clock: &impl Clock) -> Self {
        let now = clock.utc();
        Self {
            id: OtpCodeId::new(),
            email,
            code,
            expires_at: now + Duration::minutes(OTP_LIFETIME_MINUTES),
            used: false,
            created_at: now,
        }
    }

    /// Reconstructs a code from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedOtpData) -> Self {
        Self {
            id: data.id,
            email: data.email,
            code: data.code,
            expires_at: data.expires_at,
            used: data.used,
            created_at: data.created_at,
        }
    }

    /// Returns the code identifier.
    #[must_use]
    pub const fn id(&self) -> OtpCodeId {
        self.id
    }

    /// Returns the destination address.
    #[must_use]
    pub const fn email(&self) -> &Email {
        &self.email
    }

    /// Returns the code.
    #[must_use]
    pub const fn code(&self) -> &OneTimeCode {
        &self.code
    }

    /// Returns the expiry timestamp.
    #[must_use]
    pub const fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Returns whether the code was consumed.
    #[must_use]
    pub const fn is_used(&self) -> bool {
        self.used
    }

    /// Returns the issue timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns `true` when the code may still be redeemed at `now`.
    #[must_use]
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        !self.used && now < self.expires_at
    }

    /// Marks the code consumed.
    pub const fn mark_used(&mut self) {
        self.used = true;
    }
}
