//! Service layer for the task lifecycle: posting, discovery, hiring, work
//! progress, cancellation, disputes and price adjustment.

use super::requests::{CreateTaskRequest, HireCheckout, OpenDisputeRequest, TaskListQuery};
use crate::activity::domain::{ActivityEntry, ActivityEvent};
use crate::activity::services::ActivityRecorder;
use crate::dispute::domain::Dispute;
use crate::error::{MarketplaceError, MarketplaceResult};
use crate::identity::domain::User;
use crate::ids::{TaskId, UserId};
use crate::payments::domain::{FeeSplit, Money};
use crate::payments::ports::PaymentProcessor;
use crate::payments::services::{EscrowCheckout, PayeeGatewayService};
use crate::persistence::{MarketplaceStore, RepositoryError};
use crate::task::domain::{
    ConfirmationCode, PartyRole, PricingPolicy, ProofEvidence, Task, TaskDomainError, TaskDraft,
};
use crate::task::ports::TaskFilter;
use mockable::Clock;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

/// Attempts at finding an unused confirmation code before giving up.
const CONFIRMATION_CODE_ATTEMPTS: usize = 5;

/// Task lifecycle orchestration service.
pub struct TaskLifecycleService<S, P, C>
where
    S: MarketplaceStore,
    P: PaymentProcessor,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    clock: Arc<C>,
    pricing: PricingPolicy,
    checkout: EscrowCheckout<P>,
    payees: PayeeGatewayService<S, P, C>,
    activity: ActivityRecorder<S>,
}

impl<S, P, C> TaskLifecycleService<S, P, C>
where
    S: MarketplaceStore,
    P: PaymentProcessor,
    C: Clock + Send + Sync,
{
    /// Creates a task lifecycle service.
    #[must_use]
    pub fn new(
        store: Arc<S>,
        clock: Arc<C>,
        pricing: PricingPolicy,
        checkout: EscrowCheckout<P>,
        payees: PayeeGatewayService<S, P, C>,
    ) -> Self {
        let activity = ActivityRecorder::new(Arc::clone(&store));
        Self {
            store,
            clock,
            pricing,
            checkout,
            payees,
            activity,
        }
    }

    /// Returns the pricing policy.
    #[must_use]
    pub const fn pricing(&self) -> &PricingPolicy {
        &self.pricing
    }

    async fn load_task(&self, task_id: TaskId) -> MarketplaceResult<Task> {
        self.store
            .find_task(task_id)
            .await?
            .ok_or(MarketplaceError::NotFound("task"))
    }

    async fn load_user_or_stub(&self, user_id: UserId) -> MarketplaceResult<User> {
        Ok(self
            .store
            .find_user(user_id)
            .await?
            .unwrap_or_else(|| User::stub(user_id, &*self.clock)))
    }

    async fn proof_evidence(&self, task: &Task) -> MarketplaceResult<ProofEvidence> {
        if !task.requirements().photos_required {
            return Ok(ProofEvidence::default());
        }
        let Some(thread) = self.store.find_thread_for_task(task.id()).await? else {
            return Ok(ProofEvidence::default());
        };
        Ok(ProofEvidence {
            thread_exists: true,
            proof_shared: self.store.has_proof_photo(thread.id()).await?,
        })
    }

    async fn record(&self, event: ActivityEvent, actor: UserId, task: &Task) {
        self.activity
            .record(
                ActivityEntry::new(event, &*self.clock)
                    .with_actor(actor)
                    .with_task(task.id()),
            )
            .await;
    }

    /// Posts a new task for `actor`.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError`] when the poster has no profile photo,
    /// the draft is invalid, the price is under the category minimum, or no
    /// free confirmation code was found.
    pub async fn create_task(
        &self,
        actor: UserId,
        request: CreateTaskRequest,
    ) -> MarketplaceResult<Task> {
        let poster = self.load_user_or_stub(actor).await?;
        let code = ConfirmationCode::generate(&mut rand::thread_rng());
        let mut task = Task::create(
            TaskDraft::from(request),
            &poster,
            code,
            &self.pricing,
            &*self.clock,
        )?;

        let mut attempt = 1;
        loop {
            match self.store.store_task(&task).await {
                Ok(()) => break,
                Err(RepositoryError::Duplicate { entity, .. })
                    if entity == "confirmation code" && attempt < CONFIRMATION_CODE_ATTEMPTS =>
                {
                    debug!(attempt, "confirmation code collision, regenerating");
                    attempt += 1;
                    task.reassign_confirmation_code(ConfirmationCode::generate(
                        &mut rand::thread_rng(),
                    ));
                }
                Err(err) => return Err(err.into()),
            }
        }

        info!(task_id = %task.id(), poster_id = %actor, category = %task.category(), "task created");
        self.activity
            .record(
                ActivityEntry::new(ActivityEvent::TaskCreated, &*self.clock)
                    .with_actor(actor)
                    .with_task(task.id())
                    .with_details(json!({
                        "title": task.title(),
                        "price": task.price(),
                        "category": task.category().as_str(),
                    })),
            )
            .await;
        Ok(task)
    }

    /// Returns a task by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::NotFound`] for unknown tasks.
    pub async fn get_task(&self, task_id: TaskId) -> MarketplaceResult<Task> {
        self.load_task(task_id).await
    }

    /// Lists tasks for discovery: emergencies first, then newest first.
    /// Expired tasks are left out unless the query asks for them.
    ///
    /// # Errors
    ///
    /// Returns the repository error when the listing fails.
    pub async fn list_tasks(&self, query: TaskListQuery) -> MarketplaceResult<Vec<Task>> {
        let filter = query.into_filter(self.clock.utc());
        Ok(self.store.list_tasks(&filter).await?)
    }

    /// Lists tasks posted by `actor`, newest first.
    ///
    /// # Errors
    ///
    /// Returns the repository error when the listing fails.
    pub async fn list_posted(&self, actor: UserId) -> MarketplaceResult<Vec<Task>> {
        Ok(self.store.list_tasks(&TaskFilter::posted_by(actor)).await?)
    }

    /// Lists tasks `actor` was hired for, newest first.
    ///
    /// # Errors
    ///
    /// Returns the repository error when the listing fails.
    pub async fn list_jobs(&self, actor: UserId) -> MarketplaceResult<Vec<Task>> {
        Ok(self
            .store
            .list_tasks(&TaskFilter::assigned_to(actor))
            .await?)
    }

    /// Opens an escrowed checkout to hire `helper_id`. The task stays
    /// `requested` until the processor confirms the capture.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError`] when `actor` is not the poster, the task
    /// is not `requested`, the helper has no pending offer, cannot receive
    /// payouts or is at their active job limit, or the processor fails.
    pub async fn choose_helper(
        &self,
        actor: UserId,
        task_id: TaskId,
        helper_id: UserId,
    ) -> MarketplaceResult<HireCheckout> {
        let mut task = self.load_task(task_id).await?;
        task.ensure_can_choose_helper(actor, helper_id)?;

        let helper = self
            .store
            .find_user(helper_id)
            .await?
            .ok_or(MarketplaceError::NotFound("helper"))?;
        let offer = self
            .store
            .find_pending_offer(task_id, helper_id)
            .await?
            .ok_or_else(|| {
                MarketplaceError::validation("helper has no pending offer on this task")
            })?;
        let destination = self.payees.require_payout_ready(&helper).await?;

        let active_jobs = self.store.count_active_jobs(helper_id).await?;
        let limit = helper.max_active_jobs();
        if u32::try_from(active_jobs).map_or(true, |active| active >= limit) {
            return Err(MarketplaceError::validation(format!(
                "helper already has the maximum of {limit} active jobs"
            )));
        }

        let split = self.pricing.split(task.price());
        let request = self
            .checkout
            .hire_request(&task, helper_id, destination, split);
        let session = self.checkout.open(&request).await?;

        let expected = task.revision();
        task.record_hire_request(session.id.clone(), helper_id, split, &*self.clock)?;
        self.store.update_task(&task, expected).await?;

        info!(%task_id, %helper_id, session_id = %session.id, "hire checkout opened");
        self.activity
            .record(
                ActivityEntry::new(ActivityEvent::HireRequested, &*self.clock)
                    .with_actor(actor)
                    .with_task(task_id)
                    .with_offer(offer.id())
                    .with_details(json!({
                        "helperId": helper_id,
                        "sessionId": session.id,
                        "split": split,
                    })),
            )
            .await;
        Ok(HireCheckout {
            task,
            session,
            split,
        })
    }

    /// Moves an accepted task into progress.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError`] unless `actor` is the helper and the task
    /// is `accepted`.
    pub async fn start_work(&self, actor: UserId, task_id: TaskId) -> MarketplaceResult<Task> {
        let mut task = self.load_task(task_id).await?;
        let expected = task.revision();
        task.start_work(actor, &*self.clock)?;
        self.store.update_task(&task, expected).await?;
        self.record(ActivityEvent::WorkStarted, actor, &task).await;
        Ok(task)
    }

    /// Records the helper's report that the work is done.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError`] unless `actor` is the helper, the task is
    /// `accepted` or `in_progress`, and any required proof photo was shared.
    pub async fn mark_done(&self, actor: UserId, task_id: TaskId) -> MarketplaceResult<Task> {
        let mut task = self.load_task(task_id).await?;
        let evidence = self.proof_evidence(&task).await?;
        let expected = task.revision();
        task.mark_done(actor, evidence, &*self.clock)?;
        self.store.update_task(&task, expected).await?;
        self.record(ActivityEvent::WorkMarkedDone, actor, &task).await;
        Ok(task)
    }

    /// Completes the task and credits the helper with a finished job.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError`] unless `actor` is a party, the task is
    /// hired and unfinished, and any required proof photo was shared.
    pub async fn complete(&self, actor: UserId, task_id: TaskId) -> MarketplaceResult<Task> {
        let mut task = self.load_task(task_id).await?;
        let evidence = self.proof_evidence(&task).await?;
        let expected = task.revision();
        let role = task.complete(actor, evidence, &*self.clock)?;
        self.store.commit_completion(&task, expected).await?;

        info!(%task_id, completed_by = %role, "task completed");
        self.activity
            .record(
                ActivityEntry::new(ActivityEvent::TaskCompleted, &*self.clock)
                    .with_actor(actor)
                    .with_task(task_id)
                    .with_details(json!({ "completedBy": role.as_str() })),
            )
            .await;
        Ok(task)
    }

    /// Cancels the task on behalf of the role `actor` claims.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError`] when the claimed role is not `actor`'s or
    /// the task is past `accepted`.
    pub async fn cancel(
        &self,
        actor: UserId,
        task_id: TaskId,
        claimed_role: PartyRole,
    ) -> MarketplaceResult<Task> {
        let mut task = self.load_task(task_id).await?;
        let expected = task.revision();
        task.cancel(actor, claimed_role, &*self.clock)?;
        self.store.update_task(&task, expected).await?;

        info!(%task_id, canceled_by = %claimed_role, "task canceled");
        self.activity
            .record(
                ActivityEntry::new(ActivityEvent::TaskCanceled, &*self.clock)
                    .with_actor(actor)
                    .with_task(task_id)
                    .with_details(json!({ "canceledBy": claimed_role.as_str() })),
            )
            .await;
        Ok(task)
    }

    /// Opens a dispute, freezing the task.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError`] unless `actor` is a party and the task is
    /// hired and unfinished.
    pub async fn open_dispute(
        &self,
        actor: UserId,
        task_id: TaskId,
        request: OpenDisputeRequest,
    ) -> MarketplaceResult<(Task, Dispute)> {
        let mut task = self.load_task(task_id).await?;
        let role = task.dispute_role(actor)?;
        let dispute = Dispute::open(
            task_id,
            actor,
            role,
            request.reason,
            request.photo_urls,
            &*self.clock,
        );
        let expected = task.revision();
        task.mark_disputed(role, dispute.id(), &*self.clock)?;
        self.store.commit_dispute(&dispute, &task, expected).await?;

        info!(%task_id, dispute_id = %dispute.id(), initiator_role = %role, "dispute opened");
        self.activity
            .record(
                ActivityEntry::new(ActivityEvent::DisputeCreated, &*self.clock)
                    .with_actor(actor)
                    .with_task(task_id)
                    .with_details(json!({
                        "disputeId": dispute.id(),
                        "initiatorRole": role.as_str(),
                    })),
            )
            .await;
        Ok((task, dispute))
    }

    /// Changes the price of an open task with no offers.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError`] unless `actor` is the poster, the task is
    /// `requested`, no offers exist and the price meets the minimum.
    pub async fn adjust_price(
        &self,
        actor: UserId,
        task_id: TaskId,
        new_price: Money,
    ) -> MarketplaceResult<(Task, FeeSplit)> {
        let mut task = self.load_task(task_id).await?;
        let old_price = task.price();
        let offers = self.store.count_offers_for_task(task_id).await?;
        let expected = task.revision();
        let split = task.adjust_price(actor, new_price, offers, &self.pricing, &*self.clock)?;
        match self.store.commit_price_change(&task, expected).await {
            Ok(()) => {}
            Err(RepositoryError::Conflict { .. })
                if self.store.count_offers_for_task(task_id).await? > 0 =>
            {
                return Err(TaskDomainError::OffersExist(task_id).into());
            }
            Err(err) => return Err(err.into()),
        }

        info!(%task_id, %old_price, %new_price, "task price adjusted");
        self.activity
            .record(
                ActivityEntry::new(ActivityEvent::PriceUpdated, &*self.clock)
                    .with_actor(actor)
                    .with_task(task_id)
                    .with_details(json!({ "oldPrice": old_price, "newPrice": new_price })),
            )
            .await;
        Ok((task, split))
    }

    /// Dismisses the price prompt without changing the price.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError`] for anyone but the poster.
    pub async fn acknowledge_price_prompt(
        &self,
        actor: UserId,
        task_id: TaskId,
    ) -> MarketplaceResult<Task> {
        let mut task = self.load_task(task_id).await?;
        let expected = task.revision();
        task.dismiss_price_prompt(actor, &*self.clock)?;
        self.store.update_task(&task, expected).await?;
        self.record(ActivityEvent::PricePromptDismissed, actor, &task)
            .await;
        Ok(task)
    }

    /// Lists `actor`'s open tasks showing the price prompt.
    ///
    /// # Errors
    ///
    /// Returns the repository error when the listing fails.
    pub async fn list_needing_price_adjustment(
        &self,
        actor: UserId,
    ) -> MarketplaceResult<Vec<Task>> {
        Ok(self.store.list_price_prompted(actor).await?)
    }
}
