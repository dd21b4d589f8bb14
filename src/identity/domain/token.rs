//! Signed bearer tokens.
//!
//! A token is `<user-id>.<expiry-unix-seconds>.<hex hmac-sha256>` where the
//! MAC covers `<user-id>.<expiry-unix-seconds>`.

use super::IdentityDomainError;
use crate::ids::UserId;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;

type HmacSha256 = Hmac<Sha256>;

/// An opaque bearer token handed to clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    /// Returns the token text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Issues and verifies [`SessionToken`]s.
#[derive(Clone)]
pub struct SessionTokenSigner {
    secret: Vec<u8>,
    ttl: Duration,
}

impl fmt::Debug for SessionTokenSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionTokenSigner")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl SessionTokenSigner {
    /// Creates a signer with the given secret and token lifetime.
    #[must_use]
    pub fn new(secret: impl Into<Vec<u8>>, ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            ttl,
        }
    }

    /// Returns the token lifetime.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    fn mac(&self, payload: &str) -> Result<HmacSha256, IdentityDomainError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|_| IdentityDomainError::InvalidSessionToken)?;
        mac.update(payload.as_bytes());
        Ok(mac)
    }

    /// Issues a token for `user_id` valid from `now` for the configured TTL.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityDomainError::InvalidSessionToken`] if the signing key
    /// is unusable.
    pub fn issue(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<SessionToken, IdentityDomainError> {
        let expiry = (now + self.ttl).timestamp();
        let payload = format!("{user_id}.{expiry}");
        let signature = hex::encode(self.mac(&payload)?.finalize().into_bytes());
        Ok(SessionToken(format!("{payload}.{signature}")))
    }

    /// Verifies a token and returns the user it was issued to.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityDomainError::InvalidSessionToken`] for malformed or
    /// forged tokens and [`IdentityDomainError::ExpiredSessionToken`] for
    /// tokens past their expiry.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<UserId, IdentityDomainError> {
        let invalid = || IdentityDomainError::InvalidSessionToken;
        let (payload, signature) = token.trim().rsplit_once('.').ok_or_else(invalid)?;
        let (user_part, expiry_part) = payload.split_once('.').ok_or_else(invalid)?;
        let signature_bytes = hex::decode(signature).map_err(|_| invalid())?;
        self.mac(payload)?
            .verify_slice(&signature_bytes)
            .map_err(|_| invalid())?;

        let expiry: i64 = expiry_part.parse().map_err(|_| invalid())?;
        if now.timestamp() >= expiry {
            return Err(IdentityDomainError::ExpiredSessionToken);
        }
        user_part.parse::<UserId>().map_err(|_| invalid())
    }
}
