//! camelCase JSON views of domain records.
//!
//! Task views hide the confirmation code and precise address from anyone
//! who is not a party to the task.

use crate::activity::domain::{ActivityEntry, ActivityEvent};
use crate::billing::domain::{ExtraWorkRequest, ExtraWorkStatus};
use crate::chat::domain::{ChatMessage, ChatThread};
use crate::dispute::domain::{Dispute, DisputeResolution, DisputeStatus};
use crate::identity::domain::User;
use crate::ids::{
    ActivityId, DisputeId, ExtraWorkId, MessageId, OfferId, TaskId, ThreadId, UserId,
};
use crate::offer::domain::{Offer, OfferStatus};
use crate::payments::domain::{FeeSplit, HoldSessionId, Money};
use crate::task::domain::{
    PartyRole, PaymentStatus, Task, TaskCategory, TaskParty, TaskRequirements, TaskStatus,
    TaskTimeline,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct UserView {
    id: UserId,
    email: Option<String>,
    email_verified: bool,
    name: Option<String>,
    phone: Option<String>,
    phone_verified: bool,
    default_zip_code: Option<String>,
    profile_photo_url: Option<String>,
    has_payee_account: bool,
    completed_jobs_count: u32,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id(),
            email: user.email().map(|email| email.as_str().to_owned()),
            email_verified: user.email_verified(),
            name: user.name().map(str::to_owned),
            phone: user.phone().map(str::to_owned),
            phone_verified: user.phone_verified(),
            default_zip_code: user.default_zip_code().map(str::to_owned),
            profile_photo_url: user.profile_photo_url().map(str::to_owned),
            has_payee_account: user.payee_account_id().is_some(),
            completed_jobs_count: user.completed_jobs_count(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct TaskView {
    id: TaskId,
    title: String,
    description: Option<String>,
    category: TaskCategory,
    zip_code: String,
    area_description: Option<String>,
    full_address: Option<String>,
    price: Money,
    status: TaskStatus,
    poster: TaskParty,
    helper: Option<TaskParty>,
    confirmation_code: Option<String>,
    #[serde(flatten)]
    requirements: TaskRequirements,
    photos: Vec<String>,
    payment_status: PaymentStatus,
    platform_fee: Option<Money>,
    helper_amount: Option<Money>,
    extra_amount_paid: Money,
    tip_amount: Option<Money>,
    price_prompt_shown: bool,
    dispute_id: Option<DisputeId>,
    #[serde(flatten)]
    timeline: TaskTimeline,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TaskView {
    pub fn for_viewer(task: &Task, viewer: Option<UserId>) -> Self {
        let is_party = viewer.is_some_and(|user| task.role_of(user).is_some());
        let location = task.location();
        let split = task.payment().split;
        Self {
            id: task.id(),
            title: task.title().to_owned(),
            description: task.description().map(str::to_owned),
            category: task.category(),
            zip_code: location.zip_code.clone(),
            area_description: location.area_description.clone(),
            full_address: location.full_address.clone().filter(|_| is_party),
            price: task.price(),
            status: task.status(),
            poster: task.poster().clone(),
            helper: task.helper().cloned(),
            confirmation_code: is_party.then(|| task.confirmation_code().as_str().to_owned()),
            requirements: task.requirements(),
            photos: task.photos().to_vec(),
            payment_status: task.payment().status,
            platform_fee: split.map(|split| split.platform_fee),
            helper_amount: split.map(|split| split.payee_amount),
            extra_amount_paid: task.extra_amount_paid(),
            tip_amount: task.tip().paid.as_ref().map(|tip| tip.amount),
            price_prompt_shown: task.price_prompt_shown(),
            dispute_id: task.dispute_id(),
            timeline: task.timeline().clone(),
            created_at: task.created_at(),
            expires_at: task.expires_at(),
            updated_at: task.updated_at(),
        }
    }

    pub fn list(tasks: &[Task], viewer: Option<UserId>) -> Vec<Self> {
        tasks
            .iter()
            .map(|task| Self::for_viewer(task, viewer))
            .collect()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct OfferView {
    id: OfferId,
    task_id: TaskId,
    helper_id: UserId,
    helper_name: String,
    helper_photo_url: Option<String>,
    note: Option<String>,
    proposed_price: Option<Money>,
    status: OfferStatus,
    created_at: DateTime<Utc>,
}

impl From<&Offer> for OfferView {
    fn from(offer: &Offer) -> Self {
        Self {
            id: offer.id(),
            task_id: offer.task_id(),
            helper_id: offer.helper_id(),
            helper_name: offer.helper_name().to_owned(),
            helper_photo_url: offer.helper_photo_url().map(str::to_owned),
            note: offer.note().map(str::to_owned),
            proposed_price: offer.proposed_price(),
            status: offer.status(),
            created_at: offer.created_at(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CheckoutView {
    pub checkout_url: String,
    pub session_id: HoldSessionId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub split: Option<FeeSplit>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ThreadView {
    id: ThreadId,
    task_id: TaskId,
    poster_id: UserId,
    helper_id: UserId,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl From<&ChatThread> for ThreadView {
    fn from(thread: &ChatThread) -> Self {
        Self {
            id: thread.id(),
            task_id: thread.task_id(),
            poster_id: thread.poster_id(),
            helper_id: thread.helper_id(),
            created_at: thread.created_at(),
            expires_at: thread.expires_at(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct MessageView {
    id: MessageId,
    thread_id: ThreadId,
    sender_id: UserId,
    sender_name: String,
    text: Option<String>,
    image_url: Option<String>,
    is_proof: bool,
    created_at: DateTime<Utc>,
}

impl From<&ChatMessage> for MessageView {
    fn from(message: &ChatMessage) -> Self {
        Self {
            id: message.id(),
            thread_id: message.thread_id(),
            sender_id: message.sender_id(),
            sender_name: message.sender_name().to_owned(),
            text: message.text().map(str::to_owned),
            image_url: message.image_url().map(str::to_owned),
            is_proof: message.is_proof(),
            created_at: message.created_at(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ExtraWorkView {
    id: ExtraWorkId,
    task_id: TaskId,
    helper_id: UserId,
    amount: Money,
    reason: String,
    photo_urls: Vec<String>,
    status: ExtraWorkStatus,
    created_at: DateTime<Utc>,
    responded_at: Option<DateTime<Utc>>,
    paid_at: Option<DateTime<Utc>>,
}

impl From<&ExtraWorkRequest> for ExtraWorkView {
    fn from(request: &ExtraWorkRequest) -> Self {
        Self {
            id: request.id(),
            task_id: request.task_id(),
            helper_id: request.helper_id(),
            amount: request.amount(),
            reason: request.reason().to_owned(),
            photo_urls: request.photo_urls().to_vec(),
            status: request.status(),
            created_at: request.created_at(),
            responded_at: request.responded_at(),
            paid_at: request.paid_at(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct DisputeView {
    id: DisputeId,
    task_id: TaskId,
    initiator_id: UserId,
    initiator_role: PartyRole,
    reason: String,
    poster_photo_urls: Vec<String>,
    helper_photo_urls: Vec<String>,
    status: DisputeStatus,
    resolution: Option<DisputeResolution>,
    created_at: DateTime<Utc>,
    resolved_at: Option<DateTime<Utc>>,
}

impl From<&Dispute> for DisputeView {
    fn from(dispute: &Dispute) -> Self {
        Self {
            id: dispute.id(),
            task_id: dispute.task_id(),
            initiator_id: dispute.initiator_id(),
            initiator_role: dispute.initiator_role(),
            reason: dispute.reason().to_owned(),
            poster_photo_urls: dispute.poster_photo_urls().to_vec(),
            helper_photo_urls: dispute.helper_photo_urls().to_vec(),
            status: dispute.status(),
            resolution: dispute.resolution().cloned(),
            created_at: dispute.created_at(),
            resolved_at: dispute.resolved_at(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ActivityView {
    id: ActivityId,
    event: ActivityEvent,
    user_id: Option<UserId>,
    task_id: Option<TaskId>,
    offer_id: Option<OfferId>,
    details: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl From<&ActivityEntry> for ActivityView {
    fn from(entry: &ActivityEntry) -> Self {
        Self {
            id: entry.id,
            event: entry.event,
            user_id: entry.actor_id,
            task_id: entry.task_id,
            offer_id: entry.offer_id,
            details: entry.details.clone(),
            created_at: entry.created_at,
        }
    }
}

/// Maps a slice through a `From<&T>` view.
pub(super) fn many<'a, T, V>(items: &'a [T]) -> Vec<V>
where
    V: From<&'a T>,
{
    items.iter().map(V::from).collect()
}
