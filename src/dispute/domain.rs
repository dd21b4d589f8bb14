//! Disputes freeze a task and collect evidence from both sides.

use crate::ids::{DisputeId, TaskId, UserId};
use crate::payments::domain::Money;
use crate::task::domain::PartyRole;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

const DEFAULT_REASON: &str = "Dispute filed";

/// Dispute status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisputeStatus {
    /// Filed, not yet looked at.
    Pending,
    /// Under operator review.
    InReview,
    /// Resolved in the helper's favour.
    ResolvedHelper,
    /// Resolved in the poster's favour.
    ResolvedPoster,
    /// Resolved with a split.
    ResolvedSplit,
}

impl DisputeStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InReview => "in_review",
            Self::ResolvedHelper => "resolved_helper",
            Self::ResolvedPoster => "resolved_poster",
            Self::ResolvedSplit => "resolved_split",
        }
    }

    /// Returns `true` while the dispute is unresolved.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Pending | Self::InReview)
    }
}

impl fmt::Display for DisputeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for DisputeStatus {
    type Error = ParseDisputeStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "in_review" => Ok(Self::InReview),
            "resolved_helper" => Ok(Self::ResolvedHelper),
            "resolved_poster" => Ok(Self::ResolvedPoster),
            "resolved_split" => Ok(Self::ResolvedSplit),
            _ => Err(ParseDisputeStatusError(value.to_owned())),
        }
    }
}

/// Error returned while parsing dispute statuses.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown dispute status: {0}")]
pub struct ParseDisputeStatusError(pub String);

/// Who a resolution favours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionOutcome {
    /// Funds go to the helper.
    Helper,
    /// Funds go back to the poster.
    Poster,
    /// Funds are split.
    Split,
}

impl ResolutionOutcome {
    /// Returns the resolved status for this outcome.
    #[must_use]
    pub const fn status(self) -> DisputeStatus {
        match self {
            Self::Helper => DisputeStatus::ResolvedHelper,
            Self::Poster => DisputeStatus::ResolvedPoster,
            Self::Split => DisputeStatus::ResolvedSplit,
        }
    }
}

/// Operator decision recorded on a dispute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisputeResolution {
    /// Who the decision favours.
    pub outcome: ResolutionOutcome,
    /// Operator note.
    pub note: Option<String>,
    /// Amount released to the helper.
    pub amount_released: Money,
    /// Amount refunded to the poster.
    pub amount_refunded: Money,
}

/// Errors raised by dispute rules.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DisputeDomainError {
    /// The dispute was already resolved.
    #[error("dispute {0} is already resolved")]
    AlreadyResolved(DisputeId),

    /// The dispute is not awaiting review.
    #[error("dispute {0} is not pending")]
    NotPending(DisputeId),

    /// A resolution amount was negative.
    #[error("resolution amounts must not be negative")]
    NegativeAmount,

    /// No evidence URLs were supplied.
    #[error("at least one photo URL is required")]
    NoEvidence,
}

/// A dispute over a hired task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispute {
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
    updated_at: DateTime<Utc>,
    resolved_at: Option<DateTime<Utc>>,
}

/// Data required to reconstruct a persisted dispute.
#[derive(Debug, Clone)]
pub struct PersistedDisputeData {
    /// Dispute identifier.
    pub id: DisputeId,
    /// Disputed task.
    pub task_id: TaskId,
    /// Filing user.
    pub initiator_id: UserId,
    /// Filing user's role.
    pub initiator_role: PartyRole,
    /// Reason.
    pub reason: String,
    /// Poster evidence.
    pub poster_photo_urls: Vec<String>,
    /// Helper evidence.
    pub helper_photo_urls: Vec<String>,
    /// Status.
    pub status: DisputeStatus,
    /// Recorded resolution.
    pub resolution: Option<DisputeResolution>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Resolution timestamp.
    pub resolved_at: Option<DateTime<Utc>>,
}

fn clean_urls(urls: Vec<String>) -> Vec<String> {
    urls.into_iter()
        .map(|url| url.trim().to_owned())
        .filter(|url| !url.is_empty())
        .collect()
}

impl Dispute {
    /// Files a dispute seeded with the initiator's evidence.
    #[must_use]
    pub fn open(
        task_id: TaskId,
        initiator_id: UserId,
        initiator_role: PartyRole,
        reason: Option<String>,
        photo_urls: Vec<String>,
        clock: &impl Clock,
    ) -> Self {
        let now = clock.utc();
        let evidence = clean_urls(photo_urls);
        let (poster_photo_urls, helper_photo_urls) = match initiator_role {
            PartyRole::Poster => (evidence, Vec::new()),
            PartyRole::Helper => (Vec::new(), evidence),
        };
        Self {
            id: DisputeId::new(),
            task_id,
            initiator_id,
            initiator_role,
            reason: reason
                .map(|raw| raw.trim().to_owned())
                .filter(|trimmed| !trimmed.is_empty())
                .unwrap_or_else(|| DEFAULT_REASON.to_owned()),
            poster_photo_urls,
            helper_photo_urls,
            status: DisputeStatus::Pending,
            resolution: None,
            created_at: now,
            updated_at: now,
            resolved_at: None,
        }
    }

    /// Reconstructs a dispute from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedDisputeData) -> Self {
        Self {
            id: data.id,
            task_id: data.task_id,
            initiator_id: data.initiator_id,
            initiator_role: data.initiator_role,
            reason: data.reason,
            poster_photo_urls: data.poster_photo_urls,
            helper_photo_urls: data.helper_photo_urls,
            status: data.status,
            resolution: data.resolution,
            created_at: data.created_at,
            updated_at: data.updated_at,
            resolved_at: data.resolved_at,
        }
    }

    /// Returns the dispute identifier.
    #[must_use]
    pub const fn id(&self) -> DisputeId {
        self.id
    }

    /// Returns the disputed task.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the filing user.
    #[must_use]
    pub const fn initiator_id(&self) -> UserId {
        self.initiator_id
    }

    /// Returns the filing user's role.
    #[must_use]
    pub const fn initiator_role(&self) -> PartyRole {
        self.initiator_role
    }

    /// Returns the reason.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Returns the poster's evidence.
    #[must_use]
    pub fn poster_photo_urls(&self) -> &[String] {
        &self.poster_photo_urls
    }

    /// Returns the helper's evidence.
    #[must_use]
    pub fn helper_photo_urls(&self) -> &[String] {
        &self.helper_photo_urls
    }

    /// Returns the status.
    #[must_use]
    pub const fn status(&self) -> DisputeStatus {
        self.status
    }

    /// Returns the recorded resolution.
    #[must_use]
    pub const fn resolution(&self) -> Option<&DisputeResolution> {
        self.resolution.as_ref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the resolution timestamp.
    #[must_use]
    pub const fn resolved_at(&self) -> Option<DateTime<Utc>> {
        self.resolved_at
    }

    /// Appends evidence to `role`'s array. The other side is untouched.
    ///
    /// # Errors
    ///
    /// Returns [`DisputeDomainError::NoEvidence`] when `urls` holds nothing
    /// usable.
    pub fn append_evidence(
        &mut self,
        role: PartyRole,
        urls: Vec<String>,
        at: DateTime<Utc>,
    ) -> Result<(), DisputeDomainError> {
        let evidence = clean_urls(urls);
        if evidence.is_empty() {
            return Err(DisputeDomainError::NoEvidence);
        }
        match role {
            PartyRole::Poster => self.poster_photo_urls.extend(evidence),
            PartyRole::Helper => self.helper_photo_urls.extend(evidence),
        }
        self.updated_at = at;
        Ok(())
    }

    /// Moves a pending dispute under review.
    ///
    /// # Errors
    ///
    /// Returns [`DisputeDomainError::NotPending`] unless pending.
    pub fn begin_review(&mut self, clock: &impl Clock) -> Result<(), DisputeDomainError> {
        if self.status != DisputeStatus::Pending {
            return Err(DisputeDomainError::NotPending(self.id));
        }
        self.status = DisputeStatus::InReview;
        self.updated_at = clock.utc();
        Ok(())
    }

    /// Records the operator's decision.
    ///
    /// # Errors
    ///
    /// Returns [`DisputeDomainError`] when already resolved or an amount is
    /// negative.
    pub fn resolve(
        &mut self,
        resolution: DisputeResolution,
        clock: &impl Clock,
    ) -> Result<(), DisputeDomainError> {
        if !self.status.is_open() {
            return Err(DisputeDomainError::AlreadyResolved(self.id));
        }
        if resolution.amount_released < Money::ZERO || resolution.amount_refunded < Money::ZERO {
            return Err(DisputeDomainError::NegativeAmount);
        }
        let now = clock.utc();
        self.status = resolution.outcome.status();
        self.resolution = Some(resolution);
        self.resolved_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Takes status, resolution and timestamps from `decided`. Evidence on
    /// both sides is kept as stored.
    pub(crate) fn adopt_decision(&mut self, decided: &Self) {
        self.status = decided.status;
        self.resolution.clone_from(&decided.resolution);
        self.resolved_at = decided.resolved_at;
        self.updated_at = self.updated_at.max(decided.updated_at);
    }
}
