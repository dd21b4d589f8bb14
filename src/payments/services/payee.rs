//! Payee account onboarding and payout capability checks.

use crate::activity::domain::{ActivityEntry, ActivityEvent};
use crate::activity::ports::ActivityLog;
use crate::activity::services::ActivityRecorder;
use crate::error::{MarketplaceError, MarketplaceResult, PayeeSetupError};
use crate::identity::domain::{User, UserChange};
use crate::identity::ports::UserRepository;
use crate::ids::UserId;
use crate::payments::domain::{
    OnboardingLink, OnboardingUrls, PayeeAccountId, PayeeAccountRequest, PayeeStatus,
};
use crate::payments::ports::PaymentProcessor;
use mockable::Clock;
use std::sync::Arc;
use tracing::{info, warn};

/// Wraps the processor's payee onboarding and account status calls.
pub struct PayeeGatewayService<S, P, C>
where
    S: UserRepository + ActivityLog,
    P: PaymentProcessor,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    processor: Arc<P>,
    clock: Arc<C>,
    urls: OnboardingUrls,
    activity: ActivityRecorder<S>,
}

impl<S, P, C> Clone for PayeeGatewayService<S, P, C>
where
    S: UserRepository + ActivityLog,
    P: PaymentProcessor,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            processor: Arc::clone(&self.processor),
            clock: Arc::clone(&self.clock),
            urls: self.urls.clone(),
            activity: self.activity.clone(),
        }
    }
}

impl<S, P, C> PayeeGatewayService<S, P, C>
where
    S: UserRepository + ActivityLog,
    P: PaymentProcessor,
    C: Clock + Send + Sync,
{
    /// Creates a gateway service.
    #[must_use]
    pub fn new(store: Arc<S>, processor: Arc<P>, clock: Arc<C>, urls: OnboardingUrls) -> Self {
        let activity = ActivityRecorder::new(Arc::clone(&store));
        Self {
            store,
            processor,
            clock,
            urls,
            activity,
        }
    }

    async fn load_user(&self, user_id: UserId) -> MarketplaceResult<User> {
        self.store
            .find_user(user_id)
            .await?
            .ok_or(MarketplaceError::NotFound("user"))
    }

    /// Returns the user's payee account, creating one on first use.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::NotFound`] for unknown users and
    /// [`PayeeSetupError::Processor`] when the processor call fails.
    pub async fn ensure_payee_account(&self, user_id: UserId) -> MarketplaceResult<PayeeAccountId> {
        let mut user = self.load_user(user_id).await?;
        if let Some(existing) = user.payee_account_id() {
            return Ok(existing.clone());
        }

        let request = PayeeAccountRequest {
            email: user.email().map(|email| email.as_str().to_owned()),
        };
        let account = self
            .processor
            .create_payee_account(&request)
            .await
            .map_err(PayeeSetupError::Processor)?;
        user.link_payee_account(account.clone(), &*self.clock);
        let stored = self
            .store
            .update_user(&user, UserChange::PayeeAccount)
            .await?;
        let linked = stored
            .payee_account_id()
            .cloned()
            .ok_or_else(|| MarketplaceError::Internal("payee account was not linked".to_owned()))?;
        if linked != account {
            warn!(
                %user_id,
                payee_account = %linked,
                unused_account = %account,
                "payee account already linked by a concurrent request"
            );
            return Ok(linked);
        }

        info!(%user_id, payee_account = %account, "payee account created");
        self.activity
            .record(
                ActivityEntry::new(ActivityEvent::PayeeAccountCreated, &*self.clock)
                    .with_actor(user_id),
            )
            .await;
        Ok(account)
    }

    /// Starts hosted onboarding for the user's payee account.
    ///
    /// # Errors
    ///
    /// Returns [`PayeeSetupError::Processor`] when either processor call
    /// fails.
    pub async fn start_onboarding(&self, user_id: UserId) -> MarketplaceResult<OnboardingLink> {
        let account = self.ensure_payee_account(user_id).await?;
        let link = self
            .processor
            .create_onboarding_link(&account, &self.urls)
            .await
            .map_err(|err| {
                warn!(%user_id, error = %err, "onboarding link failed");
                PayeeSetupError::Processor(err)
            })?;
        Ok(link)
    }

    /// Reports the user's payout capability. Users without an account are
    /// answered without calling the processor.
    ///
    /// # Errors
    ///
    /// Returns [`PayeeSetupError::Processor`] when the account lookup fails.
    pub async fn payee_status(&self, user_id: UserId) -> MarketplaceResult<PayeeStatus> {
        let Some(user) = self.store.find_user(user_id).await? else {
            return Ok(PayeeStatus::no_account());
        };
        let Some(account) = user.payee_account_id() else {
            return Ok(PayeeStatus::no_account());
        };
        let snapshot = self
            .processor
            .retrieve_payee_account(account)
            .await
            .map_err(PayeeSetupError::Processor)?;
        Ok(PayeeStatus::from_snapshot(snapshot))
    }

    /// Returns `helper`'s payee account when it can receive payouts.
    ///
    /// # Errors
    ///
    /// Returns [`PayeeSetupError`] when the helper has no account, payouts
    /// are disabled, or the lookup fails.
    pub async fn require_payout_ready(&self, helper: &User) -> MarketplaceResult<PayeeAccountId> {
        let account = helper
            .payee_account_id()
            .ok_or(PayeeSetupError::NoPayeeAccount)?;
        let snapshot = self
            .processor
            .retrieve_payee_account(account)
            .await
            .map_err(PayeeSetupError::Processor)?;
        if !snapshot.payouts_enabled {
            return Err(PayeeSetupError::PayoutsDisabled.into());
        }
        Ok(account.clone())
    }
}
