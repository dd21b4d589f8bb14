//! Extra-work requests billed on top of a hired task.

use crate::ids::{ExtraWorkId, TaskId, UserId};
use crate::payments::domain::{CaptureApplication, HoldSessionId, Money, PaymentReference};
use crate::task::domain::{Task, TaskDomainError};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Extra-work request status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtraWorkStatus {
    /// Awaiting the poster's answer.
    Pending,
    /// Poster agreed; checkout opened.
    Accepted,
    /// Poster declined.
    Rejected,
    /// Funds captured.
    Paid,
}

impl ExtraWorkStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Paid => "paid",
        }
    }
}

impl fmt::Display for ExtraWorkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ExtraWorkStatus {
    type Error = ParseExtraWorkStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "rejected" | "declined" => Ok(Self::Rejected),
            "paid" => Ok(Self::Paid),
            _ => Err(ParseExtraWorkStatusError(value.to_owned())),
        }
    }
}

/// Error returned while parsing extra-work statuses.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown extra-work status: {0}")]
pub struct ParseExtraWorkStatusError(pub String);

/// Errors raised by billing rules.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BillingDomainError {
    /// A task rule rejected the action.
    #[error(transparent)]
    Task(#[from] TaskDomainError),

    /// The amount is not positive.
    #[error("extra-work amount must be greater than zero")]
    InvalidAmount,

    /// The reason is blank.
    #[error("a reason is required for extra work")]
    EmptyReason,

    /// Another request is still awaiting an answer.
    #[error("an extra-work request is already pending for this task")]
    PendingRequestExists(TaskId),

    /// The request is not in a status that allows the action.
    #[error("extra-work request is already {status}")]
    InvalidStatus {
        /// Request identifier.
        request_id: ExtraWorkId,
        /// Current status.
        status: ExtraWorkStatus,
    },

    /// A capture referenced a session other than the one on file.
    #[error("hold session {session} does not match extra-work request {request_id}")]
    HoldSessionMismatch {
        /// Request identifier.
        request_id: ExtraWorkId,
        /// Session reported by the capture.
        session: String,
    },
}

/// A helper's request to be paid for work beyond the original scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraWorkRequest {
    id: ExtraWorkId,
    task_id: TaskId,
    helper_id: UserId,
    amount: Money,
    reason: String,
    photo_urls: Vec<String>,
    status: ExtraWorkStatus,
    hold_session_id: Option<HoldSessionId>,
    payment_reference: Option<PaymentReference>,
    created_at: DateTime<Utc>,
    responded_at: Option<DateTime<Utc>>,
    paid_at: Option<DateTime<Utc>>,
}

/// Data required to reconstruct a persisted request.
#[derive(Debug, Clone)]
pub struct PersistedExtraWorkData {
    /// Request identifier.
    pub id: ExtraWorkId,
    /// Task being billed.
    pub task_id: TaskId,
    /// Requesting helper.
    pub helper_id: UserId,
    /// Requested amount.
    pub amount: Money,
    /// Why the extra work was needed.
    pub reason: String,
    /// Photo evidence.
    pub photo_urls: Vec<String>,
    /// Status.
    pub status: ExtraWorkStatus,
    /// Checkout session, once accepted.
    pub hold_session_id: Option<HoldSessionId>,
    /// Processor payment, once paid.
    pub payment_reference: Option<PaymentReference>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// When the poster answered.
    pub responded_at: Option<DateTime<Utc>>,
    /// When the funds were captured.
    pub paid_at: Option<DateTime<Utc>>,
}

impl ExtraWorkRequest {
    /// Creates a pending request from the helper of `task`.
    ///
    /// # Errors
    ///
    /// Returns [`BillingDomainError`] unless `actor` is the helper, the task
    /// is `accepted` or `in_progress`, the amount is positive and a reason is
    /// given.
    pub fn request(
        task: &Task,
        actor: UserId,
        amount: Money,
        reason: &str,
        photo_urls: Vec<String>,
        clock: &impl Clock,
    ) -> Result<Self, BillingDomainError> {
        task.ensure_can_request_extra_work(actor)?;
        if !amount.is_positive() {
            return Err(BillingDomainError::InvalidAmount);
        }
        let trimmed = reason.trim();
        if trimmed.is_empty() {
            return Err(BillingDomainError::EmptyReason);
        }
        Ok(Self {
            id: ExtraWorkId::new(),
            task_id: task.id(),
            helper_id: actor,
            amount,
            reason: trimmed.to_owned(),
            photo_urls: photo_urls
                .into_iter()
                .map(|url| url.trim().to_owned())
                .filter(|url| !url.is_empty())
                .collect(),
            status: ExtraWorkStatus::Pending,
            hold_session_id: None,
            payment_reference: None,
            created_at: clock.utc(),
            responded_at: None,
            paid_at: None,
        })
    }

    /// Reconstructs a request from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedExtraWorkData) -> Self {
        Self {
            id: data.id,
            task_id: data.task_id,
            helper_id: data.helper_id,
            amount: data.amount,
            reason: data.reason,
            photo_urls: data.photo_urls,
            status: data.status,
            hold_session_id: data.hold_session_id,
            payment_reference: data.payment_reference,
            created_at: data.created_at,
            responded_at: data.responded_at,
            paid_at: data.paid_at,
        }
    }

    /// Returns the request identifier.
    #[must_use]
    pub const fn id(&self) -> ExtraWorkId {
        self.id
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the requesting helper.
    #[must_use]
    pub const fn helper_id(&self) -> UserId {
        self.helper_id
    }

    /// Returns the amount.
    #[must_use]
    pub const fn amount(&self) -> Money {
        self.amount
    }

    /// Returns the reason.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Returns the photo evidence.
    #[must_use]
    pub fn photo_urls(&self) -> &[String] {
        &self.photo_urls
    }

    /// Returns the status.
    #[must_use]
    pub const fn status(&self) -> ExtraWorkStatus {
        self.status
    }

    /// Returns the checkout session.
    #[must_use]
    pub const fn hold_session_id(&self) -> Option<&HoldSessionId> {
        self.hold_session_id.as_ref()
    }

    /// Returns the processor payment.
    #[must_use]
    pub const fn payment_reference(&self) -> Option<&PaymentReference> {
        self.payment_reference.as_ref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the poster answered.
    #[must_use]
    pub const fn responded_at(&self) -> Option<DateTime<Utc>> {
        self.responded_at
    }

    /// Returns when the funds were captured.
    #[must_use]
    pub const fn paid_at(&self) -> Option<DateTime<Utc>> {
        self.paid_at
    }

    /// Checks that the request still awaits an answer.
    ///
    /// # Errors
    ///
    /// Returns [`BillingDomainError::InvalidStatus`] unless pending.
    pub fn ensure_pending(&self) -> Result<(), BillingDomainError> {
        if self.status == ExtraWorkStatus::Pending {
            return Ok(());
        }
        Err(BillingDomainError::InvalidStatus {
            request_id: self.id,
            status: self.status,
        })
    }

    /// Accepts the request with the checkout opened for it.
    ///
    /// # Errors
    ///
    /// Returns [`BillingDomainError::InvalidStatus`] unless pending.
    pub fn accept(
        &mut self,
        session_id: HoldSessionId,
        clock: &impl Clock,
    ) -> Result<(), BillingDomainError> {
        self.ensure_pending()?;
        self.status = ExtraWorkStatus::Accepted;
        self.hold_session_id = Some(session_id);
        self.responded_at = Some(clock.utc());
        Ok(())
    }

    /// Declines the request.
    ///
    /// # Errors
    ///
    /// Returns [`BillingDomainError::InvalidStatus`] unless pending.
    pub fn reject(&mut self, clock: &impl Clock) -> Result<(), BillingDomainError> {
        self.ensure_pending()?;
        self.status = ExtraWorkStatus::Rejected;
        self.responded_at = Some(clock.utc());
        Ok(())
    }

    /// Applies a captured extra-work payment.
    ///
    /// # Errors
    ///
    /// Returns [`BillingDomainError`] unless the request was accepted with
    /// the same session.
    pub fn confirm_payment(
        &mut self,
        session_id: &HoldSessionId,
        payment_reference: Option<PaymentReference>,
        at: DateTime<Utc>,
    ) -> Result<CaptureApplication, BillingDomainError> {
        let session_matches = self.hold_session_id.as_ref() == Some(session_id);
        match self.status {
            ExtraWorkStatus::Paid if session_matches => Ok(CaptureApplication::Replayed),
            ExtraWorkStatus::Accepted if session_matches => {
                self.status = ExtraWorkStatus::Paid;
                self.payment_reference = payment_reference;
                self.paid_at = Some(at);
                Ok(CaptureApplication::Applied)
            }
            ExtraWorkStatus::Accepted | ExtraWorkStatus::Paid => {
                Err(BillingDomainError::HoldSessionMismatch {
                    request_id: self.id,
                    session: session_id.to_string(),
                })
            }
            ExtraWorkStatus::Pending | ExtraWorkStatus::Rejected => {
                Err(BillingDomainError::InvalidStatus {
                    request_id: self.id,
                    status: self.status,
                })
            }
        }
    }
}
