//! Append-only audit entries.

use crate::ids::{ActivityId, OfferId, TaskId, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Default page size for activity queries.
pub const DEFAULT_ACTIVITY_LIMIT: usize = 50;
/// Largest page size for activity queries.
pub const MAX_ACTIVITY_LIMIT: usize = 200;

/// Kind of state change being recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityEvent {
    /// A task was posted.
    TaskCreated,
    /// A helper submitted an offer.
    OfferSubmitted,
    /// A poster opened a hire checkout.
    HireRequested,
    /// A hire payment was captured.
    HireConfirmed,
    /// The helper started work.
    WorkStarted,
    /// The helper marked the work done.
    WorkMarkedDone,
    /// The task was completed.
    TaskCompleted,
    /// The task was canceled.
    TaskCanceled,
    /// A dispute was opened.
    DisputeCreated,
    /// Dispute evidence was added.
    DisputeEvidenceAdded,
    /// A dispute was resolved.
    DisputeResolved,
    /// The helper requested extra work.
    ExtraWorkRequested,
    /// The poster accepted extra work.
    ExtraWorkAccepted,
    /// The poster declined extra work.
    ExtraWorkRejected,
    /// An extra-work payment was captured.
    ExtraWorkPaid,
    /// The poster opened a tip checkout.
    TipCreated,
    /// A tip was captured.
    TipPaid,
    /// The price changed.
    PriceUpdated,
    /// The price prompt was raised.
    PricePromptTriggered,
    /// The poster dismissed the price prompt.
    PricePromptDismissed,
    /// A payee account was created.
    PayeeAccountCreated,
    /// A capture event was set aside for reconciliation.
    WebhookEventDropped,
}

impl ActivityEvent {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TaskCreated => "task_created",
            Self::OfferSubmitted => "offer_submitted",
            Self::HireRequested => "hire_requested",
            Self::HireConfirmed => "hire_confirmed",
            Self::WorkStarted => "work_started",
            Self::WorkMarkedDone => "work_marked_done",
            Self::TaskCompleted => "task_completed",
            Self::TaskCanceled => "task_canceled",
            Self::DisputeCreated => "dispute_created",
            Self::DisputeEvidenceAdded => "dispute_evidence_added",
            Self::DisputeResolved => "dispute_resolved",
            Self::ExtraWorkRequested => "extra_work_requested",
            Self::ExtraWorkAccepted => "extra_work_accepted",
            Self::ExtraWorkRejected => "extra_work_rejected",
            Self::ExtraWorkPaid => "extra_work_paid",
            Self::TipCreated => "tip_created",
            Self::TipPaid => "tip_paid",
            Self::PriceUpdated => "price_updated",
            Self::PricePromptTriggered => "price_prompt_triggered",
            Self::PricePromptDismissed => "price_prompt_dismissed",
            Self::PayeeAccountCreated => "payee_account_created",
            Self::WebhookEventDropped => "webhook_event_dropped",
        }
    }

    const ALL: [Self; 22] = [
        Self::TaskCreated,
        Self::OfferSubmitted,
        Self::HireRequested,
        Self::HireConfirmed,
        Self::WorkStarted,
        Self::WorkMarkedDone,
        Self::TaskCompleted,
        Self::TaskCanceled,
        Self::DisputeCreated,
        Self::DisputeEvidenceAdded,
        Self::DisputeResolved,
        Self::ExtraWorkRequested,
        Self::ExtraWorkAccepted,
        Self::ExtraWorkRejected,
        Self::ExtraWorkPaid,
        Self::TipCreated,
        Self::TipPaid,
        Self::PriceUpdated,
        Self::PricePromptTriggered,
        Self::PricePromptDismissed,
        Self::PayeeAccountCreated,
        Self::WebhookEventDropped,
    ];
}

impl fmt::Display for ActivityEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ActivityEvent {
    type Error = ParseActivityEventError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|event| event.as_str() == normalized)
            .ok_or_else(|| ParseActivityEventError(value.to_owned()))
    }
}

/// Error returned while parsing activity events.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown activity event: {0}")]
pub struct ParseActivityEventError(pub String);

/// One audit record.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityEntry {
    /// Entry identifier.
    pub id: ActivityId,
    /// What happened.
    pub event: ActivityEvent,
    /// Who did it.
    pub actor_id: Option<UserId>,
    /// Task involved.
    pub task_id: Option<TaskId>,
    /// Offer involved.
    pub offer_id: Option<OfferId>,
    /// Structured detail.
    pub details: serde_json::Value,
    /// When it happened.
    pub created_at: DateTime<Utc>,
}

impl ActivityEntry {
    /// Starts an entry for `event` stamped with the current time.
    #[must_use]
    pub fn new(event: ActivityEvent, clock: &impl Clock) -> Self {
        Self {
            id: ActivityId::new(),
            event,
            actor_id: None,
            task_id: None,
            offer_id: None,
            details: serde_json::Value::Object(serde_json::Map::new()),
            created_at: clock.utc(),
        }
    }

    /// Sets the actor.
    #[must_use]
    pub const fn with_actor(mut self, actor_id: UserId) -> Self {
        self.actor_id = Some(actor_id);
        self
    }

    /// Sets the task.
    #[must_use]
    pub const fn with_task(mut self, task_id: TaskId) -> Self {
        self.task_id = Some(task_id);
        self
    }

    /// Sets the offer.
    #[must_use]
    pub const fn with_offer(mut self, offer_id: OfferId) -> Self {
        self.offer_id = Some(offer_id);
        self
    }

    /// Sets the structured detail.
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }
}

/// Filter for activity queries. Entries are returned newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityQuery {
    /// Restrict to a task.
    pub task_id: Option<TaskId>,
    /// Restrict to an actor.
    pub user_id: Option<UserId>,
    /// Page size, clamped to [`MAX_ACTIVITY_LIMIT`].
    pub limit: usize,
}

impl ActivityQuery {
    /// Builds a query, defaulting and clamping the limit.
    #[must_use]
    pub fn new(task_id: Option<TaskId>, user_id: Option<UserId>, limit: Option<usize>) -> Self {
        Self {
            task_id,
            user_id,
            limit: limit
                .unwrap_or(DEFAULT_ACTIVITY_LIMIT)
                .clamp(1, MAX_ACTIVITY_LIMIT),
        }
    }

    /// Returns `true` when `entry` passes the filter.
    #[must_use]
    pub fn matches(&self, entry: &ActivityEntry) -> bool {
        self.task_id.is_none_or(|task_id| entry.task_id == Some(task_id))
            && self.user_id.is_none_or(|user_id| entry.actor_id == Some(user_id))
    }
}
