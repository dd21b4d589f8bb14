use super::InMemoryMarketplace;
use crate::identity::domain::{Email, OneTimeCode, OtpCode, User, UserChange};
use crate::identity::ports::{OtpRepository, UserRepository};
use crate::ids::{OtpCodeId, UserId};
use crate::persistence::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
impl UserRepository for InMemoryMarketplace {
    async fn store_user(&self, user: &User) -> RepositoryResult<()> {
        let mut state = self.write()?;
        if state.users.iter().any(|existing| existing.id() == user.id()) {
            return Err(RepositoryError::duplicate("user", user.id()));
        }
        if let Some(email) = user.email() {
            if state.users.iter().any(|existing| existing.email() == Some(email)) {
                return Err(RepositoryError::duplicate("user email", email));
            }
        }
        state.users.push(user.clone());
        Ok(())
    }

    async fn update_user(&self, user: &User, change: UserChange) -> RepositoryResult<User> {
        let mut state = self.write()?;
        let slot = state
            .users
            .iter_mut()
            .find(|existing| existing.id() == user.id())
            .ok_or_else(|| RepositoryError::not_found("user", user.id()))?;
        slot.adopt(user, change);
        Ok(slot.clone())
    }

    async fn find_user(&self, id: UserId) -> RepositoryResult<Option<User>> {
        let state = self.read()?;
        Ok(state.users.iter().find(|user| user.id() == id).cloned())
    }

    async fn find_user_by_email(&self, email: &Email) -> RepositoryResult<Option<User>> {
        let state = self.read()?;
        Ok(state
            .users
            .iter()
            .find(|user| user.email() == Some(email))
            .cloned())
    }
}

#[async_trait]
impl OtpRepository for InMemoryMarketplace {
    async fn store_otp(&self, code: &OtpCode) -> RepositoryResult<()> {
        let mut state = self.write()?;
        let issued_at = code.created_at();
        state.otps.retain(|otp| otp.is_usable(issued_at));
        state.otps.push(code.clone());
        Ok(())
    }

    async fn find_usable_otp(
        &self,
        email: &Email,
        code: &OneTimeCode,
        now: DateTime<Utc>,
    ) -> RepositoryResult<Option<OtpCode>> {
        let state = self.read()?;
        Ok(state
            .otps
            .iter()
            .rev()
            .filter(|otp| otp.email() == email && otp.code() == code && otp.is_usable(now))
            .max_by_key(|otp| otp.created_at())
            .cloned())
    }

    async fn consume_otp(&self, id: OtpCodeId) -> RepositoryResult<bool> {
        let mut state = self.write()?;
        let otp = state
            .otps
            .iter_mut()
            .find(|otp| otp.id() == id)
            .ok_or_else(|| RepositoryError::not_found("otp code", id))?;
        if otp.is_used() {
            return Ok(false);
        }
        otp.mark_used();
        Ok(true)
    }
}
