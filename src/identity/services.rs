//! Login codes, session tokens and profile maintenance.

use crate::error::{MarketplaceError, MarketplaceResult};
use crate::identity::domain::{
    Email, IdentityDomainError, OneTimeCode, OtpCode, ProfileUpdate, SessionToken,
    SessionTokenSigner, User, UserChange,
};
use crate::identity::ports::{OtpNotifier, OtpRepository, UserRepository};
use crate::ids::UserId;
use crate::persistence::RepositoryError;
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A verified login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// The signed-in user.
    pub user: User,
    /// Bearer token for later requests.
    pub token: SessionToken,
    /// When the token stops being accepted.
    pub expires_at: DateTime<Utc>,
}

/// Identity and session orchestration.
pub struct IdentityService<S, N, C>
where
    S: UserRepository + OtpRepository,
    N: OtpNotifier,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    notifier: Arc<N>,
    clock: Arc<C>,
    signer: SessionTokenSigner,
}

impl<S, N, C> IdentityService<S, N, C>
where
    S: UserRepository + OtpRepository,
    N: OtpNotifier,
    C: Clock + Send + Sync,
{
    /// Creates an identity service.
    #[must_use]
    pub const fn new(
        store: Arc<S>,
        notifier: Arc<N>,
        clock: Arc<C>,
        signer: SessionTokenSigner,
    ) -> Self {
        Self {
            store,
            notifier,
            clock,
            signer,
        }
    }

    /// Issues a login code for `email` and hands it to the notifier. The
    /// response does not reveal whether the email belongs to a user.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityDomainError::InvalidEmail`] for malformed input and
    /// [`MarketplaceError::Internal`] when the code cannot be delivered.
    pub async fn request_code(&self, raw_email: &str) -> MarketplaceResult<()> {
        let email = Email::new(raw_email)?;
        let code = OneTimeCode::generate(&mut rand::thread_rng());
        let otp = OtpCode::issue(email, code, &*self.clock);
        self.store.store_otp(&otp).await?;

        self.notifier
            .deliver(otp.email(), otp.code(), otp.expires_at())
            .await
            .map_err(|err| {
                warn!(email = %otp.email(), error = %err, "login code delivery failed");
                MarketplaceError::Internal(err.to_string())
            })?;
        info!(email = %otp.email(), "login code issued");
        Ok(())
    }

    /// Verifies a login code and signs the user in, registering them on
    /// first login.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityDomainError::CodeInvalidOrExpired`] unless a
    /// matching unused, unexpired code exists.
    pub async fn verify_code(&self, raw_email: &str, raw_code: &str) -> MarketplaceResult<Session> {
        let email = Email::new(raw_email)?;
        let code =
            OneTimeCode::parse(raw_code).map_err(|_| IdentityDomainError::CodeInvalidOrExpired)?;
        let now = self.clock.utc();

        let otp = self
            .store
            .find_usable_otp(&email, &code, now)
            .await?
            .ok_or(IdentityDomainError::CodeInvalidOrExpired)?;
        if !self.store.consume_otp(otp.id()).await? {
            return Err(IdentityDomainError::CodeInvalidOrExpired.into());
        }

        let user = self.find_or_register(email).await?;
        let token = self.signer.issue(user.id(), now)?;
        info!(user_id = %user.id(), "user signed in");
        Ok(Session {
            user,
            token,
            expires_at: now + self.signer.ttl(),
        })
    }

    async fn find_or_register(&self, email: Email) -> MarketplaceResult<User> {
        if let Some(mut existing) = self.store.find_user_by_email(&email).await? {
            if !existing.email_verified() {
                existing.confirm_email(email, &*self.clock);
                return Ok(self
                    .store
                    .update_user(&existing, UserChange::EmailConfirmed)
                    .await?);
            }
            return Ok(existing);
        }

        let user = User::register(email.clone(), &*self.clock);
        match self.store.store_user(&user).await {
            Ok(()) => {
                info!(user_id = %user.id(), "user registered");
                Ok(user)
            }
            Err(RepositoryError::Duplicate { .. }) => {
                debug!(email = %email, "concurrent registration, reloading user");
                self.store
                    .find_user_by_email(&email)
                    .await?
                    .ok_or(MarketplaceError::NotFound("user"))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Resolves a bearer token to a user. A valid token for an id with no
    /// stored row yields a stub user carrying only the id.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::Unauthenticated`] for missing, forged or
    /// expired tokens.
    pub async fn authenticate(&self, token: &str) -> MarketplaceResult<User> {
        let user_id = self
            .signer
            .verify(token, self.clock.utc())
            .map_err(|err| {
                debug!(error = %err, "bearer token rejected");
                MarketplaceError::Unauthenticated
            })?;
        Ok(self
            .store
            .find_user(user_id)
            .await?
            .unwrap_or_else(|| User::stub(user_id, &*self.clock)))
    }

    /// Returns the stored user, or a stub for unknown ids.
    ///
    /// # Errors
    ///
    /// Returns the repository error when the lookup fails.
    pub async fn current_user(&self, user_id: UserId) -> MarketplaceResult<User> {
        Ok(self
            .store
            .find_user(user_id)
            .await?
            .unwrap_or_else(|| User::stub(user_id, &*self.clock)))
    }

    async fn load_own_user(&self, actor: UserId, user_id: UserId) -> MarketplaceResult<User> {
        if actor != user_id {
            return Err(MarketplaceError::Forbidden("you can only update your own profile"));
        }
        self.store
            .find_user(user_id)
            .await?
            .ok_or(MarketplaceError::NotFound("user"))
    }

    /// Updates name, phone and default ZIP code.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::Forbidden`] when `actor` is someone else
    /// and [`MarketplaceError::NotFound`] for unknown users.
    pub async fn update_profile(
        &self,
        actor: UserId,
        user_id: UserId,
        update: ProfileUpdate,
    ) -> MarketplaceResult<User> {
        let mut user = self.load_own_user(actor, user_id).await?;
        user.apply_profile_update(update, &*self.clock);
        Ok(self.store.update_user(&user, UserChange::Profile).await?)
    }

    /// Sets the profile photo.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityDomainError::EmptyProfilePhoto`] for a blank URL,
    /// plus the errors of [`Self::update_profile`].
    pub async fn update_photo(
        &self,
        actor: UserId,
        user_id: UserId,
        photo_url: &str,
    ) -> MarketplaceResult<User> {
        let mut user = self.load_own_user(actor, user_id).await?;
        user.set_profile_photo(photo_url, &*self.clock)?;
        Ok(self.store.update_user(&user, UserChange::Photo).await?)
    }

    /// Returns `true` when the user has a profile photo.
    ///
    /// # Errors
    ///
    /// Returns the repository error when the lookup fails.
    pub async fn has_photo(&self, user_id: UserId) -> MarketplaceResult<bool> {
        Ok(self
            .store
            .find_user(user_id)
            .await?
            .is_some_and(|user| user.has_profile_photo()))
    }
}
