//! Task aggregate root.

use super::{
    ConfirmationCode, PartyRole, PaidTip, PaymentStatus, PendingHire, PendingTip, PricingPolicy,
    TaskAction, TaskCategory, TaskDomainError, TaskPayment, TaskStatus, TaskTimeline, TaskTip,
};
use crate::identity::domain::User;
use crate::ids::{DisputeId, TaskId, UserId};
use crate::payments::domain::{
    CaptureApplication, ChargeId, FeeSplit, HoldSessionId, Money, PaymentReference,
};
use chrono::{DateTime, Duration, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Days a task stays discoverable after creation.
pub const TASK_LIFETIME_DAYS: i64 = 5;
/// Most photos retained on a task.
pub const MAX_TASK_PHOTOS: usize = 10;
/// Hours without offers before the poster is prompted to raise the price.
pub const PRICE_PROMPT_AFTER_HOURS: i64 = 24;

/// Where the job takes place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskLocation {
    /// ZIP code used for discovery.
    pub zip_code: String,
    /// Free-text neighbourhood description.
    pub area_description: Option<String>,
    /// Precise address.
    pub full_address: Option<String>,
}

/// Requirement flags set by the poster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRequirements {
    /// Completion needs a proof photo in chat.
    pub photos_required: bool,
    /// The helper must bring tools.
    pub tools_required: bool,
    /// The poster provides tools.
    pub tools_provided: bool,
    /// The job needs a licensed helper.
    pub license_required: bool,
}

/// Snapshot of a participant at the time they joined the task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskParty {
    /// User identifier.
    pub id: UserId,
    /// Display name at snapshot time.
    pub name: String,
    /// Profile photo at snapshot time.
    pub photo_url: Option<String>,
}

impl TaskParty {
    /// Snapshots `user`, using `fallback_name` when they have no name.
    #[must_use]
    pub fn snapshot(user: &User, fallback_name: &str) -> Self {
        Self {
            id: user.id(),
            name: user.display_name_or(fallback_name).to_owned(),
            photo_url: user.profile_photo_url().map(str::to_owned),
        }
    }
}

/// Validated input for a new task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    /// Title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Category.
    pub category: TaskCategory,
    /// Location.
    pub location: TaskLocation,
    /// Price.
    pub price: Money,
    /// Requirement flags.
    pub requirements: TaskRequirements,
    /// Photo URLs.
    pub photos: Vec<String>,
}

/// Proof-of-completion facts gathered from the task's chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProofEvidence {
    /// A chat thread exists for the task.
    pub thread_exists: bool,
    /// A proof photo was shared in it.
    pub proof_shared: bool,
}

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    id: TaskId,
    title: String,
    description: Option<String>,
    category: TaskCategory,
    location: TaskLocation,
    price: Money,
    status: TaskStatus,
    poster: TaskParty,
    helper: Option<TaskParty>,
    confirmation_code: ConfirmationCode,
    requirements: TaskRequirements,
    photos: Vec<String>,
    payment: TaskPayment,
    extra_amount_paid: Money,
    tip: TaskTip,
    price_prompt_shown: bool,
    price_prompt_due_at: Option<DateTime<Utc>>,
    dispute_id: Option<DisputeId>,
    timeline: TaskTimeline,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    revision: u64,
}

/// Data required to reconstruct a persisted task.
#[derive(Debug, Clone)]
pub struct PersistedTaskData {
    /// Task identifier.
    pub id: TaskId,
    /// Title.
    pub title: String,
    /// Description.
    pub description: Option<String>,
    /// Category.
    pub category: TaskCategory,
    /// Location.
    pub location: TaskLocation,
    /// Current price.
    pub price: Money,
    /// Status.
    pub status: TaskStatus,
    /// Poster snapshot.
    pub poster: TaskParty,
    /// Helper snapshot.
    pub helper: Option<TaskParty>,
    /// Confirmation code.
    pub confirmation_code: ConfirmationCode,
    /// Requirement flags.
    pub requirements: TaskRequirements,
    /// Photo URLs.
    pub photos: Vec<String>,
    /// Hire payment state.
    pub payment: TaskPayment,
    /// Cumulative paid extra work.
    pub extra_amount_paid: Money,
    /// Tip state.
    pub tip: TaskTip,
    /// Price prompt flag.
    pub price_prompt_shown: bool,
    /// When the price prompt becomes due; `None` once acknowledged.
    pub price_prompt_due_at: Option<DateTime<Utc>>,
    /// Back-reference to the dispute.
    pub dispute_id: Option<DisputeId>,
    /// Lifecycle timestamps.
    pub timeline: TaskTimeline,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Expiry timestamp.
    pub expires_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Optimistic concurrency revision.
    pub revision: u64,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_owned())
        .filter(|trimmed| !trimmed.is_empty())
}

impl Task {
    /// Creates a new `requested` task for `poster`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError`] when the poster has no profile photo, the
    /// title or ZIP code is blank, or the price is below the category
    /// minimum.
    pub fn create(
        draft: TaskDraft,
        poster: &User,
        confirmation_code: ConfirmationCode,
        pricing: &PricingPolicy,
        clock: &impl Clock,
    ) -> Result<Self, TaskDomainError> {
        if !poster.has_profile_photo() {
            return Err(TaskDomainError::ProfilePhotoRequired);
        }
        let title = draft.title.trim().to_owned();
        if title.is_empty() {
            return Err(TaskDomainError::EmptyTitle);
        }
        let zip_code = draft.location.zip_code.trim().to_owned();
        if zip_code.is_empty() {
            return Err(TaskDomainError::EmptyZipCode);
        }
        let minimum = pricing.minimum_for(draft.category);
        if draft.price < minimum {
            return Err(TaskDomainError::PriceBelowMinimum { minimum });
        }

        let now = clock.utc();
        let photos = draft
            .photos
            .into_iter()
            .map(|url| url.trim().to_owned())
            .filter(|url| !url.is_empty())
            .take(MAX_TASK_PHOTOS)
            .collect();
        Ok(Self {
            id: TaskId::new(),
            title,
            description: non_blank(draft.description),
            category: draft.category,
            location: TaskLocation {
                zip_code,
                area_description: non_blank(draft.location.area_description),
                full_address: non_blank(draft.location.full_address),
            },
            price: draft.price,
            status: TaskStatus::Requested,
            poster: TaskParty::snapshot(poster, "Anonymous"),
            helper: None,
            confirmation_code,
            requirements: draft.requirements,
            photos,
            payment: TaskPayment::default(),
            extra_amount_paid: Money::ZERO,
            tip: TaskTip::default(),
            price_prompt_shown: false,
            price_prompt_due_at: Some(now + Duration::hours(PRICE_PROMPT_AFTER_HOURS)),
            dispute_id: None,
            timeline: TaskTimeline::default(),
            created_at: now,
            expires_at: now + Duration::days(TASK_LIFETIME_DAYS),
            updated_at: now,
            revision: 0,
        })
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            title: data.title,
            description: data.description,
            category: data.category,
            location: data.location,
            price: data.price,
            status: data.status,
            poster: data.poster,
            helper: data.helper,
            confirmation_code: data.confirmation_code,
            requirements: data.requirements,
            photos: data.photos,
            payment: data.payment,
            extra_amount_paid: data.extra_amount_paid,
            tip: data.tip,
            price_prompt_shown: data.price_prompt_shown,
            price_prompt_due_at: data.price_prompt_due_at,
            dispute_id: data.dispute_id,
            timeline: data.timeline,
            created_at: data.created_at,
            expires_at: data.expires_at,
            updated_at: data.updated_at,
            revision: data.revision,
        }
    }

    /// Replaces the confirmation code after a uniqueness collision.
    pub fn reassign_confirmation_code(&mut self, code: ConfirmationCode) {
        self.confirmation_code = code;
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the category.
    #[must_use]
    pub const fn category(&self) -> TaskCategory {
        self.category
    }

    /// Returns the location.
    #[must_use]
    pub const fn location(&self) -> &TaskLocation {
        &self.location
    }

    /// Returns the current price.
    #[must_use]
    pub const fn price(&self) -> Money {
        self.price
    }

    /// Returns the status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the poster snapshot.
    #[must_use]
    pub const fn poster(&self) -> &TaskParty {
        &self.poster
    }

    /// Returns the poster identifier.
    #[must_use]
    pub const fn poster_id(&self) -> UserId {
        self.poster.id
    }

    /// Returns the helper snapshot, once hired.
    #[must_use]
    pub const fn helper(&self) -> Option<&TaskParty> {
        self.helper.as_ref()
    }

    /// Returns the helper identifier, once hired.
    #[must_use]
    pub fn helper_id(&self) -> Option<UserId> {
        self.helper.as_ref().map(|helper| helper.id)
    }

    /// Returns the confirmation code.
    #[must_use]
    pub const fn confirmation_code(&self) -> &ConfirmationCode {
        &self.confirmation_code
    }

    /// Returns the requirement flags.
    #[must_use]
    pub const fn requirements(&self) -> TaskRequirements {
        self.requirements
    }

    /// Returns the photo URLs.
    #[must_use]
    pub fn photos(&self) -> &[String] {
        &self.photos
    }

    /// Returns the hire payment state.
    #[must_use]
    pub const fn payment(&self) -> &TaskPayment {
        &self.payment
    }

    /// Returns the cumulative amount paid for extra work.
    #[must_use]
    pub const fn extra_amount_paid(&self) -> Money {
        self.extra_amount_paid
    }

    /// Returns the tip state.
    #[must_use]
    pub const fn tip(&self) -> &TaskTip {
        &self.tip
    }

    /// Returns whether the price prompt is showing.
    #[must_use]
    pub const fn price_prompt_shown(&self) -> bool {
        self.price_prompt_shown
    }

    /// Returns when the price prompt becomes due, or `None` once the poster
    /// acknowledged it.
    #[must_use]
    pub const fn price_prompt_due_at(&self) -> Option<DateTime<Utc>> {
        self.price_prompt_due_at
    }

    /// Returns the dispute back-reference.
    #[must_use]
    pub const fn dispute_id(&self) -> Option<DisputeId> {
        self.dispute_id
    }

    /// Returns the lifecycle timestamps.
    #[must_use]
    pub const fn timeline(&self) -> &TaskTimeline {
        &self.timeline
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

    /// Returns the last update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the optimistic concurrency revision.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Returns `true` once the task is past its expiry.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Returns the role `actor` plays on this task.
    #[must_use]
    pub fn role_of(&self, actor: UserId) -> Option<PartyRole> {
        if actor == self.poster.id {
            Some(PartyRole::Poster)
        } else if self.helper_id() == Some(actor) {
            Some(PartyRole::Helper)
        } else {
            None
        }
    }

    fn guard(&self, action: TaskAction, allowed: &[TaskStatus]) -> Result<(), TaskDomainError> {
        if allowed.contains(&self.status) {
            return Ok(());
        }
        Err(TaskDomainError::InvalidState {
            task_id: self.id,
            action,
            status: self.status,
        })
    }

    fn require_poster(&self, actor: UserId, action: TaskAction) -> Result<(), TaskDomainError> {
        if actor == self.poster.id {
            return Ok(());
        }
        Err(TaskDomainError::NotPoster {
            task_id: self.id,
            action,
        })
    }

    fn require_helper(&self, actor: UserId, action: TaskAction) -> Result<(), TaskDomainError> {
        if self.helper_id() == Some(actor) {
            return Ok(());
        }
        Err(TaskDomainError::NotHelper {
            task_id: self.id,
            action,
        })
    }

    /// Resolves the role `actor` plays, failing for outsiders.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::NotParty`] when `actor` is neither poster
    /// nor helper.
    pub fn require_party(
        &self,
        actor: UserId,
        action: TaskAction,
    ) -> Result<PartyRole, TaskDomainError> {
        self.role_of(actor).ok_or(TaskDomainError::NotParty {
            task_id: self.id,
            action,
        })
    }

    fn ensure_proof(&self, evidence: ProofEvidence) -> Result<(), TaskDomainError> {
        if !self.requirements.photos_required {
            return Ok(());
        }
        if !evidence.thread_exists {
            return Err(TaskDomainError::ChatThreadMissing(self.id));
        }
        if !evidence.proof_shared {
            return Err(TaskDomainError::ProofPhotoRequired(self.id));
        }
        Ok(())
    }

    fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
        self.revision = self.revision.saturating_add(1);
    }

    /// Checks that the task is open for offers.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidState`] unless the task is
    /// `requested`.
    pub fn ensure_open_for_offers(&self) -> Result<(), TaskDomainError> {
        self.guard(TaskAction::SubmitOffer, &[TaskStatus::Requested])
    }

    /// Checks that `actor` may hire `helper_id`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError`] unless `actor` is the poster, the task is
    /// `requested` and the helper is someone else.
    pub fn ensure_can_choose_helper(
        &self,
        actor: UserId,
        helper_id: UserId,
    ) -> Result<(), TaskDomainError> {
        self.require_poster(actor, TaskAction::ChooseHelper)?;
        self.guard(TaskAction::ChooseHelper, &[TaskStatus::Requested])?;
        if helper_id == self.poster.id {
            return Err(TaskDomainError::SelfHire);
        }
        Ok(())
    }

    /// Records an opened hire checkout. The status stays `requested` until
    /// the capture is confirmed; a newer checkout replaces an older one.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidState`] unless the task is
    /// `requested`.
    pub fn record_hire_request(
        &mut self,
        session_id: HoldSessionId,
        helper_id: UserId,
        split: FeeSplit,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        self.guard(TaskAction::ChooseHelper, &[TaskStatus::Requested])?;
        let now = clock.utc();
        self.payment.status = PaymentStatus::AwaitingCapture;
        self.payment.split = Some(split);
        self.payment.pending_hire = Some(PendingHire {
            session_id,
            helper_id,
            requested_at: now,
        });
        self.touch(now);
        Ok(())
    }

    /// Applies a captured hire payment.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError`] when the task is no longer `requested`,
    /// the session is not the pending one, or the helper differs from the
    /// chosen helper.
    pub fn confirm_hire(
        &mut self,
        session_id: &HoldSessionId,
        helper: TaskParty,
        payment_reference: Option<PaymentReference>,
        charge_id: Option<ChargeId>,
        at: DateTime<Utc>,
    ) -> Result<CaptureApplication, TaskDomainError> {
        if self.payment.status == PaymentStatus::Paid
            && self.payment.hold_session_id.as_ref() == Some(session_id)
        {
            return Ok(CaptureApplication::Replayed);
        }
        self.guard(TaskAction::ConfirmHire, &[TaskStatus::Requested])?;
        let pending = self
            .payment
            .pending_hire
            .as_ref()
            .filter(|pending| &pending.session_id == session_id)
            .ok_or_else(|| TaskDomainError::HoldSessionMismatch {
                task_id: self.id,
                session: session_id.to_string(),
            })?;
        if pending.helper_id != helper.id {
            return Err(TaskDomainError::HelperMismatch(self.id));
        }

        self.status = TaskStatus::Accepted;
        self.helper = Some(helper);
        self.timeline.accepted_at = Some(at);
        self.payment.status = PaymentStatus::Paid;
        self.payment.pending_hire = None;
        self.payment.hold_session_id = Some(session_id.clone());
        self.payment.payment_reference = payment_reference;
        self.payment.charge_id = charge_id;
        self.payment.paid_at = Some(at);
        self.touch(at);
        Ok(CaptureApplication::Applied)
    }

    /// Moves an accepted task into progress.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError`] unless `actor` is the helper and the task
    /// is `accepted`.
    pub fn start_work(&mut self, actor: UserId, clock: &impl Clock) -> Result<(), TaskDomainError> {
        self.require_helper(actor, TaskAction::StartWork)?;
        self.guard(TaskAction::StartWork, &[TaskStatus::Accepted])?;
        let now = clock.utc();
        self.status = TaskStatus::InProgress;
        self.timeline.started_at = Some(now);
        self.touch(now);
        Ok(())
    }

    /// Records the helper's report that the work is done.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError`] unless `actor` is the helper, the task is
    /// `accepted` or `in_progress`, and required proof was shared.
    pub fn mark_done(
        &mut self,
        actor: UserId,
        evidence: ProofEvidence,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        self.require_helper(actor, TaskAction::MarkDone)?;
        self.guard(
            TaskAction::MarkDone,
            &[TaskStatus::Accepted, TaskStatus::InProgress],
        )?;
        self.ensure_proof(evidence)?;
        let now = clock.utc();
        self.status = TaskStatus::WorkerMarkedDone;
        self.timeline.marked_done_at = Some(now);
        self.touch(now);
        Ok(())
    }

    /// Completes the task, by poster approval or helper self-report.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError`] unless `actor` is a party, the task is
    /// hired and not yet finished, and required proof was shared.
    pub fn complete(
        &mut self,
        actor: UserId,
        evidence: ProofEvidence,
        clock: &impl Clock,
    ) -> Result<PartyRole, TaskDomainError> {
        let role = self.require_party(actor, TaskAction::Complete)?;
        self.guard(
            TaskAction::Complete,
            &[
                TaskStatus::Accepted,
                TaskStatus::InProgress,
                TaskStatus::WorkerMarkedDone,
            ],
        )?;
        self.ensure_proof(evidence)?;
        let now = clock.utc();
        self.status = TaskStatus::Completed;
        self.timeline.completed_at = Some(now);
        self.touch(now);
        Ok(role)
    }

    /// Cancels the task on behalf of the role `actor` claims.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError`] when the claimed role does not match the
    /// actor or the task is past `accepted`.
    pub fn cancel(
        &mut self,
        actor: UserId,
        claimed_role: PartyRole,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        match claimed_role {
            PartyRole::Poster => self.require_poster(actor, TaskAction::Cancel)?,
            PartyRole::Helper => self.require_helper(actor, TaskAction::Cancel)?,
        }
        self.guard(
            TaskAction::Cancel,
            &[TaskStatus::Requested, TaskStatus::Accepted],
        )?;
        let now = clock.utc();
        self.status = TaskStatus::Canceled;
        self.timeline.canceled_at = Some(now);
        self.timeline.canceled_by = Some(claimed_role);
        self.touch(now);
        Ok(())
    }

    /// Checks that `actor` may open a dispute and returns their role.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError`] unless `actor` is a party and the task is
    /// hired and not finished.
    pub fn dispute_role(&self, actor: UserId) -> Result<PartyRole, TaskDomainError> {
        let role = self.require_party(actor, TaskAction::OpenDispute)?;
        self.guard(
            TaskAction::OpenDispute,
            &[
                TaskStatus::Accepted,
                TaskStatus::InProgress,
                TaskStatus::WorkerMarkedDone,
            ],
        )?;
        Ok(role)
    }

    /// Freezes the task under a dispute.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidState`] when the task cannot be
    /// disputed from its current status.
    pub fn mark_disputed(
        &mut self,
        role: PartyRole,
        dispute_id: DisputeId,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        self.guard(
            TaskAction::OpenDispute,
            &[
                TaskStatus::Accepted,
                TaskStatus::InProgress,
                TaskStatus::WorkerMarkedDone,
            ],
        )?;
        let now = clock.utc();
        self.status = TaskStatus::Disputed;
        self.dispute_id = Some(dispute_id);
        self.timeline.disputed_at = Some(now);
        self.timeline.disputed_by = Some(role);
        self.touch(now);
        Ok(())
    }

    /// Changes the price of an open task that has no offers yet.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError`] unless `actor` is the poster, the task is
    /// `requested`, no offers exist and the price meets the minimum.
    pub fn adjust_price(
        &mut self,
        actor: UserId,
        new_price: Money,
        offer_count: usize,
        pricing: &PricingPolicy,
        clock: &impl Clock,
    ) -> Result<FeeSplit, TaskDomainError> {
        self.require_poster(actor, TaskAction::AdjustPrice)?;
        self.guard(TaskAction::AdjustPrice, &[TaskStatus::Requested])?;
        if offer_count > 0 {
            return Err(TaskDomainError::OffersExist(self.id));
        }
        let minimum = pricing.minimum_for(self.category);
        if new_price < minimum {
            return Err(TaskDomainError::PriceBelowMinimum { minimum });
        }
        let now = clock.utc();
        let split = pricing.split(new_price);
        self.price = new_price;
        self.payment.split = Some(split);
        self.price_prompt_shown = false;
        self.price_prompt_due_at = Some(now + Duration::hours(PRICE_PROMPT_AFTER_HOURS));
        self.timeline.price_adjusted_at = Some(now);
        self.touch(now);
        Ok(split)
    }

    /// Dismisses the price prompt without changing the price. An
    /// acknowledged prompt is not raised again; a later price change starts
    /// a new window.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::NotPoster`] for anyone but the poster.
    pub fn dismiss_price_prompt(
        &mut self,
        actor: UserId,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        self.require_poster(actor, TaskAction::DismissPricePrompt)?;
        self.price_prompt_shown = false;
        self.price_prompt_due_at = None;
        self.touch(clock.utc());
        Ok(())
    }

    /// Returns `true` when the task is due a price prompt at `now`. Offer
    /// counts are checked by the caller.
    #[must_use]
    pub fn is_due_price_prompt(&self, now: DateTime<Utc>) -> bool {
        self.status == TaskStatus::Requested
            && !self.price_prompt_shown
            && self.price_prompt_due_at.is_some_and(|due| due <= now)
    }

    /// Sets the one-shot price prompt. Returns `false` when already set or
    /// not due.
    pub fn flag_price_prompt(&mut self, now: DateTime<Utc>) -> bool {
        if !self.is_due_price_prompt(now) {
            return false;
        }
        self.price_prompt_shown = true;
        self.touch(now);
        true
    }

    /// Checks that `actor` may bill extra work.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError`] unless `actor` is the helper and the task
    /// is `accepted` or `in_progress`.
    pub fn ensure_can_request_extra_work(&self, actor: UserId) -> Result<(), TaskDomainError> {
        self.require_helper(actor, TaskAction::RequestExtraWork)?;
        self.guard(
            TaskAction::RequestExtraWork,
            &[TaskStatus::Accepted, TaskStatus::InProgress],
        )
    }

    /// Checks that `actor` may accept or decline extra work.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError`] unless `actor` is the poster and the task
    /// is hired and not finished.
    pub fn ensure_can_respond_to_extra_work(&self, actor: UserId) -> Result<(), TaskDomainError> {
        self.require_poster(actor, TaskAction::RespondToExtraWork)?;
        self.guard(
            TaskAction::RespondToExtraWork,
            &[
                TaskStatus::Accepted,
                TaskStatus::InProgress,
                TaskStatus::WorkerMarkedDone,
            ],
        )
    }

    /// Adds a captured extra-work payment to the cumulative total.
    pub fn record_extra_payment(&mut self, amount: Money, at: DateTime<Utc>) {
        self.extra_amount_paid = self.extra_amount_paid.saturating_add(amount);
        self.touch(at);
    }

    /// Checks that `actor` may tip `amount`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError`] unless `actor` is the poster, the task is
    /// `completed`, no tip was paid and the amount is positive.
    pub fn ensure_can_tip(&self, actor: UserId, amount: Money) -> Result<(), TaskDomainError> {
        self.require_poster(actor, TaskAction::Tip)?;
        self.guard(TaskAction::Tip, &[TaskStatus::Completed])?;
        if self.tip.paid.is_some() {
            return Err(TaskDomainError::TipAlreadyGiven(self.id));
        }
        if !amount.is_positive() {
            return Err(TaskDomainError::InvalidTipAmount);
        }
        Ok(())
    }

    /// Records an opened tip checkout, replacing any earlier unpaid one.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::TipAlreadyGiven`] once a tip was paid.
    pub fn record_tip_request(
        &mut self,
        session_id: HoldSessionId,
        amount: Money,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        if self.tip.paid.is_some() {
            return Err(TaskDomainError::TipAlreadyGiven(self.id));
        }
        let now = clock.utc();
        self.tip.pending = Some(PendingTip {
            session_id,
            amount,
            requested_at: now,
        });
        self.touch(now);
        Ok(())
    }

    /// Applies a captured tip.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError`] when a different tip was already paid or
    /// the session is not the pending tip checkout.
    pub fn confirm_tip(
        &mut self,
        session_id: &HoldSessionId,
        payment_reference: Option<PaymentReference>,
        at: DateTime<Utc>,
    ) -> Result<CaptureApplication, TaskDomainError> {
        if let Some(paid) = &self.tip.paid {
            if &paid.session_id == session_id {
                return Ok(CaptureApplication::Replayed);
            }
            return Err(TaskDomainError::TipAlreadyGiven(self.id));
        }
        let pending = self
            .tip
            .pending
            .take_if(|pending| &pending.session_id == session_id)
            .ok_or_else(|| TaskDomainError::HoldSessionMismatch {
                task_id: self.id,
                session: session_id.to_string(),
            })?;
        self.tip.paid = Some(PaidTip {
            amount: pending.amount,
            session_id: pending.session_id,
            payment_reference,
            paid_at: at,
        });
        self.touch(at);
        Ok(CaptureApplication::Applied)
    }
}
