//! Extra-work and tip billing on hired tasks.
//!
//! Both flows open their own escrowed checkout. Nothing is stored when the
//! processor call fails; the captured payment is applied later by the
//! settlement service.

use super::domain::{BillingDomainError, ExtraWorkRequest, ExtraWorkStatus};
use crate::activity::domain::{ActivityEntry, ActivityEvent};
use crate::activity::services::ActivityRecorder;
use crate::error::{MarketplaceError, MarketplaceResult};
use crate::ids::{ExtraWorkId, TaskId, UserId};
use crate::payments::domain::{FeeSplit, HoldSession, Money};
use crate::payments::ports::PaymentProcessor;
use crate::payments::services::EscrowCheckout;
use crate::persistence::{MarketplaceStore, RepositoryError};
use crate::task::domain::{PricingPolicy, Task, TaskAction};
use mockable::Clock;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

/// Extra-work request plus the checkout opened for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraWorkCheckout {
    /// Accepted request.
    pub request: ExtraWorkRequest,
    /// Checkout the poster must complete.
    pub session: HoldSession,
    /// Fee split of the hold.
    pub split: FeeSplit,
}

/// Tip checkout awaiting the poster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TipCheckout {
    /// Task with the pending tip recorded.
    pub task: Task,
    /// Checkout the poster must complete.
    pub session: HoldSession,
}

/// Billing service for extra work and tips.
pub struct BillingService<S, P, C>
where
    S: MarketplaceStore,
    P: PaymentProcessor,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    clock: Arc<C>,
    pricing: PricingPolicy,
    checkout: EscrowCheckout<P>,
    activity: ActivityRecorder<S>,
}

impl<S, P, C> BillingService<S, P, C>
where
    S: MarketplaceStore,
    P: PaymentProcessor,
    C: Clock + Send + Sync,
{
    /// Creates a billing service.
    #[must_use]
    pub fn new(
        store: Arc<S>,
        clock: Arc<C>,
        pricing: PricingPolicy,
        checkout: EscrowCheckout<P>,
    ) -> Self {
        let activity = ActivityRecorder::new(Arc::clone(&store));
        Self {
            store,
            clock,
            pricing,
            checkout,
            activity,
        }
    }

    async fn load_task(&self, task_id: TaskId) -> MarketplaceResult<Task> {
        self.store
            .find_task(task_id)
            .await?
            .ok_or(MarketplaceError::NotFound("task"))
    }

    async fn load_request(
        &self,
        request_id: ExtraWorkId,
    ) -> MarketplaceResult<(ExtraWorkRequest, Task)> {
        let request = self
            .store
            .find_extra_work(request_id)
            .await?
            .ok_or(MarketplaceError::NotFound("extra-work request"))?;
        let task = self.load_task(request.task_id()).await?;
        Ok((request, task))
    }

    /// Files a pending extra-work request from the task's helper.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError`] unless `actor` is the helper, the task is
    /// `accepted` or `in_progress`, the amount is positive, a reason is given
    /// and no other request is pending.
    pub async fn request_extra_work(
        &self,
        actor: UserId,
        task_id: TaskId,
        amount: Money,
        reason: &str,
        photo_urls: Vec<String>,
    ) -> MarketplaceResult<ExtraWorkRequest> {
        let task = self.load_task(task_id).await?;
        let request =
            ExtraWorkRequest::request(&task, actor, amount, reason, photo_urls, &*self.clock)?;
        match self.store.store_extra_work(&request).await {
            Ok(()) => {}
            Err(RepositoryError::Duplicate { .. }) => {
                return Err(BillingDomainError::PendingRequestExists(task_id).into());
            }
            Err(err) => return Err(err.into()),
        }

        info!(%task_id, request_id = %request.id(), %amount, "extra work requested");
        self.activity
            .record(
                ActivityEntry::new(ActivityEvent::ExtraWorkRequested, &*self.clock)
                    .with_actor(actor)
                    .with_task(task_id)
                    .with_details(json!({
                        "extraWorkRequestId": request.id(),
                        "amount": amount,
                        "reason": request.reason(),
                    })),
            )
            .await;
        Ok(request)
    }

    /// Accepts a pending request and opens its checkout. The fee is carved
    /// out only when the helper has a payee account on file.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError`] unless `actor` is the poster, the task is
    /// still hired and the request is pending, or when the processor fails.
    pub async fn accept_extra_work(
        &self,
        actor: UserId,
        request_id: ExtraWorkId,
    ) -> MarketplaceResult<ExtraWorkCheckout> {
        let (mut request, task) = self.load_request(request_id).await?;
        task.ensure_can_respond_to_extra_work(actor)?;
        request.ensure_pending()?;

        let destination = self
            .store
            .find_user(request.helper_id())
            .await?
            .and_then(|helper| helper.payee_account_id().cloned());
        let split = if destination.is_some() {
            self.pricing.split(request.amount())
        } else {
            FeeSplit::without_fee(request.amount())
        };
        let hold = self
            .checkout
            .extra_work_request(&task, &request, destination, split);
        let session = self.checkout.open(&hold).await?;

        request.accept(session.id.clone(), &*self.clock)?;
        self.store
            .update_extra_work(&request, ExtraWorkStatus::Pending)
            .await?;

        info!(task_id = %task.id(), %request_id, session_id = %session.id, "extra work accepted");
        self.activity
            .record(
                ActivityEntry::new(ActivityEvent::ExtraWorkAccepted, &*self.clock)
                    .with_actor(actor)
                    .with_task(task.id())
                    .with_details(json!({
                        "extraWorkRequestId": request_id,
                        "sessionId": session.id,
                    })),
            )
            .await;
        Ok(ExtraWorkCheckout {
            request,
            session,
            split,
        })
    }

    /// Declines a pending request; the task keeps its original price.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError`] unless `actor` is the poster, the task is
    /// still hired and the request is pending.
    pub async fn decline_extra_work(
        &self,
        actor: UserId,
        request_id: ExtraWorkId,
    ) -> MarketplaceResult<ExtraWorkRequest> {
        let (mut request, task) = self.load_request(request_id).await?;
        task.ensure_can_respond_to_extra_work(actor)?;
        request.reject(&*self.clock)?;
        self.store
            .update_extra_work(&request, ExtraWorkStatus::Pending)
            .await?;

        info!(task_id = %task.id(), %request_id, "extra work declined");
        self.activity
            .record(
                ActivityEntry::new(ActivityEvent::ExtraWorkRejected, &*self.clock)
                    .with_actor(actor)
                    .with_task(task.id())
                    .with_details(json!({ "extraWorkRequestId": request_id })),
            )
            .await;
        Ok(request)
    }

    /// Lists a task's extra-work requests, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError`] when the task is unknown or `actor` is not
    /// a party to it.
    pub async fn list_extra_work(
        &self,
        actor: UserId,
        task_id: TaskId,
    ) -> MarketplaceResult<Vec<ExtraWorkRequest>> {
        let task = self.load_task(task_id).await?;
        task.require_party(actor, TaskAction::RespondToExtraWork)?;
        Ok(self.store.list_extra_work_for_task(task_id).await?)
    }

    /// Opens a tip checkout on a completed task. The whole tip goes to the
    /// helper.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError`] unless `actor` is the poster, the task is
    /// completed, no tip was paid yet and the amount is positive, or when the
    /// processor fails.
    pub async fn request_tip(
        &self,
        actor: UserId,
        task_id: TaskId,
        amount: Money,
    ) -> MarketplaceResult<TipCheckout> {
        let mut task = self.load_task(task_id).await?;
        task.ensure_can_tip(actor, amount)?;

        let destination = match task.helper_id() {
            Some(helper_id) => self
                .store
                .find_user(helper_id)
                .await?
                .and_then(|helper| helper.payee_account_id().cloned()),
            None => None,
        };
        let hold = self.checkout.tip_request(&task, amount, destination);
        let session = self.checkout.open(&hold).await?;

        let expected = task.revision();
        task.record_tip_request(session.id.clone(), amount, &*self.clock)?;
        self.store.update_task(&task, expected).await?;

        info!(%task_id, %amount, session_id = %session.id, "tip checkout opened");
        self.activity
            .record(
                ActivityEntry::new(ActivityEvent::TipCreated, &*self.clock)
                    .with_actor(actor)
                    .with_task(task_id)
                    .with_details(json!({ "amount": amount, "sessionId": session.id })),
            )
            .await;
        Ok(TipCheckout { task, session })
    }
}
