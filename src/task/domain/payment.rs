//! Money and timeline records carried by a task.

use super::PartyRole;
use crate::ids::UserId;
use crate::payments::domain::{ChargeId, FeeSplit, HoldSessionId, Money, PaymentReference};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where the hire payment stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// No checkout opened yet.
    #[default]
    Pending,
    /// Checkout opened; waiting for the processor to confirm the capture.
    AwaitingCapture,
    /// Funds captured.
    Paid,
}

impl PaymentStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::AwaitingCapture => "awaiting_capture",
            Self::Paid => "paid",
        }
    }
}

/// A hire checkout that has been opened but not yet captured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingHire {
    /// Session the capture must reference.
    pub session_id: HoldSessionId,
    /// Helper the poster chose.
    pub helper_id: UserId,
    /// When the checkout was opened.
    pub requested_at: DateTime<Utc>,
}

/// Hire payment state of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TaskPayment {
    /// Payment status.
    pub status: PaymentStatus,
    /// Fee split for the current price.
    pub split: Option<FeeSplit>,
    /// Open checkout, while awaiting capture.
    pub pending_hire: Option<PendingHire>,
    /// Session whose capture paid for the hire.
    pub hold_session_id: Option<HoldSessionId>,
    /// Processor payment created by the capture.
    pub payment_reference: Option<PaymentReference>,
    /// Charge backing the payment.
    pub charge_id: Option<ChargeId>,
    /// When the capture was confirmed.
    pub paid_at: Option<DateTime<Utc>>,
}

/// A tip checkout that has been opened but not yet captured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingTip {
    /// Session the capture must reference.
    pub session_id: HoldSessionId,
    /// Tip amount.
    pub amount: Money,
    /// When the checkout was opened.
    pub requested_at: DateTime<Utc>,
}

/// A captured tip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaidTip {
    /// Tip amount.
    pub amount: Money,
    /// Session that captured the tip.
    pub session_id: HoldSessionId,
    /// Processor payment for the tip.
    pub payment_reference: Option<PaymentReference>,
    /// When the tip was captured.
    pub paid_at: DateTime<Utc>,
}

/// Tip state of a task. At most one tip is ever paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TaskTip {
    /// Open tip checkout.
    pub pending: Option<PendingTip>,
    /// Captured tip.
    pub paid: Option<PaidTip>,
}

/// Lifecycle timestamps of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TaskTimeline {
    /// Hire confirmed.
    pub accepted_at: Option<DateTime<Utc>>,
    /// Work started.
    pub started_at: Option<DateTime<Utc>>,
    /// Helper marked the work done.
    pub marked_done_at: Option<DateTime<Utc>>,
    /// Task completed.
    pub completed_at: Option<DateTime<Utc>>,
    /// Task canceled.
    pub canceled_at: Option<DateTime<Utc>>,
    /// Who canceled.
    pub canceled_by: Option<PartyRole>,
    /// Dispute opened.
    pub disputed_at: Option<DateTime<Utc>>,
    /// Who opened the dispute.
    pub disputed_by: Option<PartyRole>,
    /// Price last adjusted.
    pub price_adjusted_at: Option<DateTime<Utc>>,
}
