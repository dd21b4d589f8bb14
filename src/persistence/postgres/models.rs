//! Diesel row models and their domain mappings.

use super::schema::{
    activity_log, chat_messages, chat_threads, disputes, extra_work_requests, offers, otp_codes,
    tasks, unreconciled_events, users,
};
use crate::activity::domain::{ActivityEntry, ActivityEvent};
use crate::billing::domain::{ExtraWorkRequest, ExtraWorkStatus, PersistedExtraWorkData};
use crate::chat::domain::{ChatMessage, ChatThread, PersistedMessageData, PersistedThreadData};
use crate::dispute::domain::{Dispute, DisputeResolution, DisputeStatus, PersistedDisputeData};
use crate::identity::domain::{
    Email, OneTimeCode, OtpCode, PersistedOtpData, PersistedUserData, User,
};
use crate::ids::{
    ActivityId, DisputeId, ExtraWorkId, MessageId, OfferId, OtpCodeId, TaskId, ThreadId,
    UnreconciledEventId, UserId,
};
use crate::offer::domain::{Offer, OfferStatus, PersistedOfferData};
use crate::payments::domain::{
    HoldPurpose, HoldSessionId, Money, PayeeAccountId, PaymentReference,
};
use crate::persistence::{RepositoryError, RepositoryResult};
use crate::settlement::domain::UnreconciledEvent;
use crate::task::domain::{
    ConfirmationCode, PartyRole, PersistedTaskData, Task, TaskCategory, TaskLocation, TaskParty,
    TaskPayment, TaskRequirements, TaskStatus, TaskTimeline, TaskTip,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

fn corrupt(message: String) -> RepositoryError {
    RepositoryError::persistence(std::io::Error::other(message))
}

fn to_json<T: Serialize>(value: &T) -> RepositoryResult<Value> {
    serde_json::to_value(value).map_err(RepositoryError::persistence)
}

fn from_json<T: for<'de> Deserialize<'de>>(value: Value) -> RepositoryResult<T> {
    serde_json::from_value(value).map_err(RepositoryError::persistence)
}

fn session(value: Option<String>) -> RepositoryResult<Option<HoldSessionId>> {
    value
        .map(HoldSessionId::new)
        .transpose()
        .map_err(RepositoryError::persistence)
}

fn payment(value: Option<String>) -> RepositoryResult<Option<PaymentReference>> {
    value
        .map(PaymentReference::new)
        .transpose()
        .map_err(RepositoryError::persistence)
}

/// Row for `users`.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct UserRow {
    pub id: Uuid,
    pub email: Option<String>,
    pub email_verified: bool,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub phone_verified: bool,
    pub default_zip_code: Option<String>,
    pub payee_account_id: Option<String>,
    pub profile_photo_url: Option<String>,
    pub completed_jobs_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRow {
    pub fn from_domain(user: &User) -> RepositoryResult<Self> {
        Ok(Self {
            id: user.id().into_inner(),
            email: user.email().map(|email| email.as_str().to_owned()),
            email_verified: user.email_verified(),
            name: user.name().map(str::to_owned),
            phone: user.phone().map(str::to_owned),
            phone_verified: user.phone_verified(),
            default_zip_code: user.default_zip_code().map(str::to_owned),
            payee_account_id: user.payee_account_id().map(|id| id.as_str().to_owned()),
            profile_photo_url: user.profile_photo_url().map(str::to_owned),
            completed_jobs_count: i32::try_from(user.completed_jobs_count())
                .map_err(RepositoryError::persistence)?,
            created_at: user.created_at(),
            updated_at: user.updated_at(),
        })
    }

    pub fn into_domain(self) -> RepositoryResult<User> {
        Ok(User::from_persisted(PersistedUserData {
            id: UserId::from_uuid(self.id),
            email: self
                .email
                .as_deref()
                .map(Email::new)
                .transpose()
                .map_err(RepositoryError::persistence)?,
            email_verified: self.email_verified,
            name: self.name,
            phone: self.phone,
            phone_verified: self.phone_verified,
            default_zip_code: self.default_zip_code,
            payee_account_id: self
                .payee_account_id
                .map(PayeeAccountId::new)
                .transpose()
                .map_err(RepositoryError::persistence)?,
            profile_photo_url: self.profile_photo_url,
            completed_jobs_count: u32::try_from(self.completed_jobs_count)
                .map_err(RepositoryError::persistence)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }))
    }
}

/// Row for `otp_codes`.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = otp_codes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OtpRow {
    pub id: Uuid,
    pub email: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub created_at: DateTime<Utc>,
}

impl OtpRow {
    pub fn from_domain(otp: &OtpCode) -> Self {
        Self {
            id: otp.id().into_inner(),
            email: otp.email().as_str().to_owned(),
            code: otp.code().as_str().to_owned(),
            expires_at: otp.expires_at(),
            used: otp.is_used(),
            created_at: otp.created_at(),
        }
    }

    pub fn into_domain(self) -> RepositoryResult<OtpCode> {
        Ok(OtpCode::from_persisted(PersistedOtpData {
            id: OtpCodeId::from_uuid(self.id),
            email: Email::new(&self.email).map_err(RepositoryError::persistence)?,
            code: OneTimeCode::parse(&self.code).map_err(RepositoryError::persistence)?,
            expires_at: self.expires_at,
            used: self.used,
            created_at: self.created_at,
        }))
    }
}

/// Task state kept outside the indexed columns.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskDocument {
    title: String,
    description: Option<String>,
    location: TaskLocation,
    price: Money,
    poster: TaskParty,
    helper: Option<TaskParty>,
    requirements: TaskRequirements,
    photos: Vec<String>,
    payment: TaskPayment,
    extra_amount_paid: Money,
    tip: TaskTip,
    dispute_id: Option<DisputeId>,
    timeline: TaskTimeline,
}

/// Row for `tasks`.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct TaskRow {
    pub id: Uuid,
    pub poster_id: Uuid,
    pub helper_id: Option<Uuid>,
    pub status: String,
    pub category: String,
    pub zip_code: String,
    pub tools_required: bool,
    pub tools_provided: bool,
    pub confirmation_code: String,
    pub price_prompt_shown: bool,
    pub price_prompt_due_at: Option<DateTime<Utc>>,
    pub document: Value,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub revision: i64,
}

impl TaskRow {
    pub fn from_domain(task: &Task) -> RepositoryResult<Self> {
        let requirements = task.requirements();
        let document = TaskDocument {
            title: task.title().to_owned(),
            description: task.description().map(str::to_owned),
            location: task.location().clone(),
            price: task.price(),
            poster: task.poster().clone(),
            helper: task.helper().cloned(),
            requirements,
            photos: task.photos().to_vec(),
            payment: task.payment().clone(),
            extra_amount_paid: task.extra_amount_paid(),
            tip: task.tip().clone(),
            dispute_id: task.dispute_id(),
            timeline: task.timeline().clone(),
        };
        Ok(Self {
            id: task.id().into_inner(),
            poster_id: task.poster_id().into_inner(),
            helper_id: task.helper_id().map(UserId::into_inner),
            status: task.status().as_str().to_owned(),
            category: task.category().as_str().to_owned(),
            zip_code: task.location().zip_code.clone(),
            tools_required: requirements.tools_required,
            tools_provided: requirements.tools_provided,
            confirmation_code: task.confirmation_code().as_str().to_owned(),
            price_prompt_shown: task.price_prompt_shown(),
            price_prompt_due_at: task.price_prompt_due_at(),
            document: to_json(&document)?,
            created_at: task.created_at(),
            expires_at: task.expires_at(),
            updated_at: task.updated_at(),
            revision: revision_column(task.revision())?,
        })
    }

    pub fn into_domain(self) -> RepositoryResult<Task> {
        let document: TaskDocument = from_json(self.document)?;
        Ok(Task::from_persisted(PersistedTaskData {
            id: TaskId::from_uuid(self.id),
            title: document.title,
            description: document.description,
            category: TaskCategory::try_from(self.category.as_str())
                .map_err(RepositoryError::persistence)?,
            location: document.location,
            price: document.price,
            status: TaskStatus::try_from(self.status.as_str())
                .map_err(RepositoryError::persistence)?,
            poster: document.poster,
            helper: document.helper,
            confirmation_code: ConfirmationCode::from_persisted(self.confirmation_code),
            requirements: document.requirements,
            photos: document.photos,
            payment: document.payment,
            extra_amount_paid: document.extra_amount_paid,
            tip: document.tip,
            price_prompt_shown: self.price_prompt_shown,
            price_prompt_due_at: self.price_prompt_due_at,
            dispute_id: document.dispute_id,
            timeline: document.timeline,
            created_at: self.created_at,
            expires_at: self.expires_at,
            updated_at: self.updated_at,
            revision: u64::try_from(self.revision).map_err(RepositoryError::persistence)?,
        }))
    }
}

/// Converts a domain revision to its column value.
pub fn revision_column(revision: u64) -> RepositoryResult<i64> {
    i64::try_from(revision).map_err(RepositoryError::persistence)
}

/// Row for `offers`.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = offers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct OfferRow {
    pub id: Uuid,
    pub task_id: Uuid,
    pub helper_id: Uuid,
    pub helper_name: String,
    pub helper_photo_url: Option<String>,
    pub note: Option<String>,
    pub proposed_price_cents: Option<i64>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OfferRow {
    pub fn from_domain(offer: &Offer) -> Self {
        Self {
            id: offer.id().into_inner(),
            task_id: offer.task_id().into_inner(),
            helper_id: offer.helper_id().into_inner(),
            helper_name: offer.helper_name().to_owned(),
            helper_photo_url: offer.helper_photo_url().map(str::to_owned),
            note: offer.note().map(str::to_owned),
            proposed_price_cents: offer.proposed_price().map(Money::cents),
            status: offer.status().as_str().to_owned(),
            created_at: offer.created_at(),
            updated_at: offer.updated_at(),
        }
    }

    pub fn into_domain(self) -> RepositoryResult<Offer> {
        Ok(Offer::from_persisted(PersistedOfferData {
            id: OfferId::from_uuid(self.id),
            task_id: TaskId::from_uuid(self.task_id),
            helper_id: UserId::from_uuid(self.helper_id),
            helper_name: self.helper_name,
            helper_photo_url: self.helper_photo_url,
            note: self.note,
            proposed_price: self.proposed_price_cents.map(Money::from_cents),
            status: OfferStatus::try_from(self.status.as_str())
                .map_err(RepositoryError::persistence)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }))
    }
}

/// Row for `chat_threads`.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = chat_threads)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ThreadRow {
    pub id: Uuid,
    pub task_id: Uuid,
    pub poster_id: Uuid,
    pub helper_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl ThreadRow {
    pub fn from_domain(thread: &ChatThread) -> Self {
        Self {
            id: thread.id().into_inner(),
            task_id: thread.task_id().into_inner(),
            poster_id: thread.poster_id().into_inner(),
            helper_id: thread.helper_id().into_inner(),
            created_at: thread.created_at(),
            expires_at: thread.expires_at(),
        }
    }

    pub fn into_domain(self) -> ChatThread {
        ChatThread::from_persisted(PersistedThreadData {
            id: ThreadId::from_uuid(self.id),
            task_id: TaskId::from_uuid(self.task_id),
            poster_id: UserId::from_uuid(self.poster_id),
            helper_id: UserId::from_uuid(self.helper_id),
            created_at: self.created_at,
            expires_at: self.expires_at,
        })
    }
}

/// Row for `chat_messages`.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = chat_messages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MessageRow {
    pub id: Uuid,
    pub thread_id: Uuid,
    pub sender_id: Uuid,
    pub sender_name: String,
    pub text: Option<String>,
    pub image_url: Option<String>,
    pub is_proof: bool,
    pub created_at: DateTime<Utc>,
}

impl MessageRow {
    pub fn from_domain(message: &ChatMessage) -> Self {
        Self {
            id: message.id().into_inner(),
            thread_id: message.thread_id().into_inner(),
            sender_id: message.sender_id().into_inner(),
            sender_name: message.sender_name().to_owned(),
            text: message.text().map(str::to_owned),
            image_url: message.image_url().map(str::to_owned),
            is_proof: message.is_proof(),
            created_at: message.created_at(),
        }
    }

    pub fn into_domain(self) -> ChatMessage {
        ChatMessage::from_persisted(PersistedMessageData {
            id: MessageId::from_uuid(self.id),
            thread_id: ThreadId::from_uuid(self.thread_id),
            sender_id: UserId::from_uuid(self.sender_id),
            sender_name: self.sender_name,
            text: self.text,
            image_url: self.image_url,
            is_proof: self.is_proof,
            created_at: self.created_at,
        })
    }
}

/// Row for `extra_work_requests`.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = extra_work_requests)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct ExtraWorkRow {
    pub id: Uuid,
    pub task_id: Uuid,
    pub helper_id: Uuid,
    pub amount_cents: i64,
    pub reason: String,
    pub photo_urls: Value,
    pub status: String,
    pub hold_session_id: Option<String>,
    pub payment_reference: Option<String>,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl ExtraWorkRow {
    pub fn from_domain(request: &ExtraWorkRequest) -> RepositoryResult<Self> {
        Ok(Self {
            id: request.id().into_inner(),
            task_id: request.task_id().into_inner(),
            helper_id: request.helper_id().into_inner(),
            amount_cents: request.amount().cents(),
            reason: request.reason().to_owned(),
            photo_urls: to_json(&request.photo_urls())?,
            status: request.status().as_str().to_owned(),
            hold_session_id: request.hold_session_id().map(|id| id.as_str().to_owned()),
            payment_reference: request
                .payment_reference()
                .map(|reference| reference.as_str().to_owned()),
            created_at: request.created_at(),
            responded_at: request.responded_at(),
            paid_at: request.paid_at(),
        })
    }

    pub fn into_domain(self) -> RepositoryResult<ExtraWorkRequest> {
        Ok(ExtraWorkRequest::from_persisted(PersistedExtraWorkData {
            id: ExtraWorkId::from_uuid(self.id),
            task_id: TaskId::from_uuid(self.task_id),
            helper_id: UserId::from_uuid(self.helper_id),
            amount: Money::from_cents(self.amount_cents),
            reason: self.reason,
            photo_urls: from_json(self.photo_urls)?,
            status: ExtraWorkStatus::try_from(self.status.as_str())
                .map_err(RepositoryError::persistence)?,
            hold_session_id: session(self.hold_session_id)?,
            payment_reference: payment(self.payment_reference)?,
            created_at: self.created_at,
            responded_at: self.responded_at,
            paid_at: self.paid_at,
        }))
    }
}

/// Row for `disputes`.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = disputes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct DisputeRow {
    pub id: Uuid,
    pub task_id: Uuid,
    pub initiator_id: Uuid,
    pub initiator_role: String,
    pub reason: String,
    pub poster_photo_urls: Value,
    pub helper_photo_urls: Value,
    pub status: String,
    pub resolution: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl DisputeRow {
    pub fn from_domain(dispute: &Dispute) -> RepositoryResult<Self> {
        Ok(Self {
            id: dispute.id().into_inner(),
            task_id: dispute.task_id().into_inner(),
            initiator_id: dispute.initiator_id().into_inner(),
            initiator_role: dispute.initiator_role().as_str().to_owned(),
            reason: dispute.reason().to_owned(),
            poster_photo_urls: to_json(&dispute.poster_photo_urls())?,
            helper_photo_urls: to_json(&dispute.helper_photo_urls())?,
            status: dispute.status().as_str().to_owned(),
            resolution: dispute.resolution().map(to_json).transpose()?,
            created_at: dispute.created_at(),
            updated_at: dispute.updated_at(),
            resolved_at: dispute.resolved_at(),
        })
    }

    pub fn into_domain(self) -> RepositoryResult<Dispute> {
        Ok(Dispute::from_persisted(PersistedDisputeData {
            id: DisputeId::from_uuid(self.id),
            task_id: TaskId::from_uuid(self.task_id),
            initiator_id: UserId::from_uuid(self.initiator_id),
            initiator_role: PartyRole::try_from(self.initiator_role.as_str())
                .map_err(RepositoryError::persistence)?,
            reason: self.reason,
            poster_photo_urls: from_json(self.poster_photo_urls)?,
            helper_photo_urls: from_json(self.helper_photo_urls)?,
            status: DisputeStatus::try_from(self.status.as_str())
                .map_err(RepositoryError::persistence)?,
            resolution: self
                .resolution
                .map(from_json::<DisputeResolution>)
                .transpose()?,
            created_at: self.created_at,
            updated_at: self.updated_at,
            resolved_at: self.resolved_at,
        }))
    }
}

/// Status and resolution columns of `disputes`; evidence is left alone.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = disputes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct DisputeDecisionRow {
    pub status: String,
    pub resolution: Option<Value>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl DisputeDecisionRow {
    pub fn from_domain(dispute: &Dispute) -> RepositoryResult<Self> {
        Ok(Self {
            status: dispute.status().as_str().to_owned(),
            resolution: dispute.resolution().map(to_json).transpose()?,
            updated_at: dispute.updated_at(),
            resolved_at: dispute.resolved_at(),
        })
    }
}

/// Row for `activity_log`.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = activity_log)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ActivityRow {
    pub id: Uuid,
    pub event: String,
    pub actor_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
    pub offer_id: Option<Uuid>,
    pub details: Value,
    pub created_at: DateTime<Utc>,
}

impl ActivityRow {
    pub fn from_domain(entry: &ActivityEntry) -> Self {
        Self {
            id: entry.id.into_inner(),
            event: entry.event.as_str().to_owned(),
            actor_id: entry.actor_id.map(UserId::into_inner),
            task_id: entry.task_id.map(TaskId::into_inner),
            offer_id: entry.offer_id.map(OfferId::into_inner),
            details: entry.details.clone(),
            created_at: entry.created_at,
        }
    }

    pub fn into_domain(self) -> RepositoryResult<ActivityEntry> {
        Ok(ActivityEntry {
            id: ActivityId::from_uuid(self.id),
            event: ActivityEvent::try_from(self.event.as_str())
                .map_err(RepositoryError::persistence)?,
            actor_id: self.actor_id.map(UserId::from_uuid),
            task_id: self.task_id.map(TaskId::from_uuid),
            offer_id: self.offer_id.map(OfferId::from_uuid),
            details: self.details,
            created_at: self.created_at,
        })
    }
}

/// Row for `unreconciled_events`.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = unreconciled_events)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UnreconciledRow {
    pub id: Uuid,
    pub event_id: String,
    pub session_id: Option<String>,
    pub task_id: Option<Uuid>,
    pub purpose: Option<String>,
    pub reason: String,
    pub payload: Value,
    pub received_at: DateTime<Utc>,
}

impl UnreconciledRow {
    pub fn from_domain(event: &UnreconciledEvent) -> Self {
        Self {
            id: event.id.into_inner(),
            event_id: event.event_id.clone(),
            session_id: event.session_id.as_ref().map(|id| id.as_str().to_owned()),
            task_id: event.task_id.map(TaskId::into_inner),
            purpose: event.purpose.map(|purpose| purpose.as_str().to_owned()),
            reason: event.reason.clone(),
            payload: event.payload.clone(),
            received_at: event.received_at,
        }
    }

    pub fn into_domain(self) -> RepositoryResult<UnreconciledEvent> {
        Ok(UnreconciledEvent {
            id: UnreconciledEventId::from_uuid(self.id),
            event_id: self.event_id,
            session_id: session(self.session_id)?,
            task_id: self.task_id.map(TaskId::from_uuid),
            purpose: self
                .purpose
                .map(|raw| HoldPurpose::from_discriminator(Some(raw.as_str()))),
            reason: self.reason,
            payload: self.payload,
            received_at: self.received_at,
        })
    }
}

/// Rejects rows whose stored status does not allow the requested write.
pub fn ensure_status(
    entity: &'static str,
    id: impl ToString,
    stored: &str,
    expected: &str,
) -> RepositoryResult<()> {
    if stored == expected {
        Ok(())
    } else {
        Err(RepositoryError::conflict(entity, id))
    }
}

/// Wraps a domain rule violation hit while mutating stored state.
pub fn rule_violation(err: impl std::fmt::Display) -> RepositoryError {
    corrupt(err.to_string())
}
