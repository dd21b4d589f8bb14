//! Task status, party roles and the actions guarded by status.

use super::{ParsePartyRoleError, ParseTaskStatusError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Open for offers.
    Requested,
    /// Helper hired and payment held.
    Accepted,
    /// Work underway.
    InProgress,
    /// Helper reported the work done.
    WorkerMarkedDone,
    /// Work approved.
    Completed,
    /// Task withdrawn.
    Canceled,
    /// Frozen pending manual resolution.
    Disputed,
}

impl TaskStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::Accepted => "accepted",
            Self::InProgress => "in_progress",
            Self::WorkerMarkedDone => "worker_marked_done",
            Self::Completed => "completed",
            Self::Canceled => "canceled",
            Self::Disputed => "disputed",
        }
    }

    /// Returns `true` for statuses that count against a helper's job limit.
    #[must_use]
    pub const fn is_active_job(self) -> bool {
        matches!(
            self,
            Self::Accepted | Self::InProgress | Self::WorkerMarkedDone
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "requested" | "unpaid" | "paid_waiting" => Ok(Self::Requested),
            "accepted" | "assigned" => Ok(Self::Accepted),
            "in_progress" => Ok(Self::InProgress),
            "worker_marked_done" => Ok(Self::WorkerMarkedDone),
            "completed" => Ok(Self::Completed),
            "canceled" | "cancelled" => Ok(Self::Canceled),
            "disputed" => Ok(Self::Disputed),
            _ => Err(ParseTaskStatusError(value.to_owned())),
        }
    }
}

/// Side of a task a participant is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartyRole {
    /// The user who posted the task.
    Poster,
    /// The hired helper.
    Helper,
}

impl PartyRole {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Poster => "poster",
            Self::Helper => "helper",
        }
    }
}

impl fmt::Display for PartyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for PartyRole {
    type Error = ParsePartyRoleError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "poster" => Ok(Self::Poster),
            "helper" => Ok(Self::Helper),
            _ => Err(ParsePartyRoleError(value.to_owned())),
        }
    }
}

/// Status-guarded task actions, named for error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskAction {
    /// Submit an offer.
    SubmitOffer,
    /// Choose a helper.
    ChooseHelper,
    /// Start work.
    StartWork,
    /// Mark work done.
    MarkDone,
    /// Complete the task.
    Complete,
    /// Cancel the task.
    Cancel,
    /// Open a dispute.
    OpenDispute,
    /// Add dispute evidence.
    AddEvidence,
    /// Read a dispute.
    ViewDispute,
    /// Request extra work.
    RequestExtraWork,
    /// Respond to an extra-work request.
    RespondToExtraWork,
    /// Leave a tip.
    Tip,
    /// Adjust the price.
    AdjustPrice,
    /// Dismiss the price prompt.
    DismissPricePrompt,
    /// Confirm a captured hire payment.
    ConfirmHire,
    /// Read the chat.
    ReadChat,
}

impl TaskAction {
    /// Returns a human-readable description.
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::SubmitOffer => "submit an offer",
            Self::ChooseHelper => "choose a helper",
            Self::StartWork => "start work",
            Self::MarkDone => "mark work done",
            Self::Complete => "complete the task",
            Self::Cancel => "cancel the task",
            Self::OpenDispute => "open a dispute",
            Self::AddEvidence => "add dispute evidence",
            Self::ViewDispute => "view this dispute",
            Self::RequestExtraWork => "request extra work",
            Self::RespondToExtraWork => "respond to extra work",
            Self::Tip => "leave a tip",
            Self::AdjustPrice => "adjust the price",
            Self::DismissPricePrompt => "dismiss the price prompt",
            Self::ConfirmHire => "confirm the hire",
            Self::ReadChat => "read this chat",
        }
    }
}

impl fmt::Display for TaskAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}
