//! Helper offers on open tasks.

use crate::identity::domain::User;
use crate::ids::{OfferId, TaskId, UserId};
use crate::payments::domain::Money;
use crate::task::domain::{Task, TaskDomainError};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Offer status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferStatus {
    /// Awaiting the poster's choice.
    Pending,
    /// Another helper was hired.
    Declined,
    /// This helper was hired.
    Accepted,
}

impl OfferStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Declined => "declined",
            Self::Accepted => "accepted",
        }
    }
}

impl fmt::Display for OfferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for OfferStatus {
    type Error = ParseOfferStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "declined" => Ok(Self::Declined),
            "accepted" => Ok(Self::Accepted),
            _ => Err(ParseOfferStatusError(value.to_owned())),
        }
    }
}

/// Error returned while parsing offer statuses.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown offer status: {0}")]
pub struct ParseOfferStatusError(pub String);

/// Errors raised by offer rules.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OfferDomainError {
    /// The task no longer accepts offers.
    #[error("this task is no longer accepting offers")]
    TaskNotOpen(TaskId),

    /// The helper has no profile photo.
    #[error("a profile photo is required before making offers")]
    ProfilePhotoRequired,

    /// The poster tried to bid on their own task.
    #[error("you cannot make an offer on your own task")]
    OwnTask(TaskId),

    /// The helper already has a pending offer on the task.
    #[error("you already have a pending offer on this task")]
    DuplicatePendingOffer(TaskId),

    /// The proposed price is not positive.
    #[error("proposed price must be greater than zero")]
    InvalidProposedPrice,

    /// The offer is no longer pending.
    #[error("offer {0} is already {1}")]
    AlreadyResolved(OfferId, OfferStatus),
}

/// A helper's bid on a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Offer {
    id: OfferId,
    task_id: TaskId,
    helper_id: UserId,
    helper_name: String,
    helper_photo_url: Option<String>,
    note: Option<String>,
    proposed_price: Option<Money>,
    status: OfferStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Data required to reconstruct a persisted offer.
#[derive(Debug, Clone)]
pub struct PersistedOfferData {
    /// Offer identifier.
    pub id: OfferId,
    /// Task the offer is for.
    pub task_id: TaskId,
    /// Bidding helper.
    pub helper_id: UserId,
    /// Helper name snapshot.
    pub helper_name: String,
    /// Helper photo snapshot.
    pub helper_photo_url: Option<String>,
    /// Optional note to the poster.
    pub note: Option<String>,
    /// Optional counter price.
    pub proposed_price: Option<Money>,
    /// Status.
    pub status: OfferStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Offer {
    /// Creates a pending offer from `helper` on `task`.
    ///
    /// # Errors
    ///
    /// Returns [`OfferDomainError`] when the task is not open, the helper is
    /// the poster or has no profile photo, or the proposed price is not
    /// positive.
    pub fn submit(
        task: &Task,
        helper: &User,
        note: Option<String>,
        proposed_price: Option<Money>,
        clock: &impl Clock,
    ) -> Result<Self, OfferDomainError> {
        task.ensure_open_for_offers()
            .map_err(|_: TaskDomainError| OfferDomainError::TaskNotOpen(task.id()))?;
        if helper.id() == task.poster_id() {
            return Err(OfferDomainError::OwnTask(task.id()));
        }
        if !helper.has_profile_photo() {
            return Err(OfferDomainError::ProfilePhotoRequired);
        }
        if proposed_price.is_some_and(|price| !price.is_positive()) {
            return Err(OfferDomainError::InvalidProposedPrice);
        }
        let now = clock.utc();
        Ok(Self {
            id: OfferId::new(),
            task_id: task.id(),
            helper_id: helper.id(),
            helper_name: helper.display_name_or("Anonymous").to_owned(),
            helper_photo_url: helper.profile_photo_url().map(str::to_owned),
            note: note
                .map(|raw| raw.trim().to_owned())
                .filter(|trimmed| !trimmed.is_empty()),
            proposed_price,
            status: OfferStatus::Pending,
            created_at: now,
            updated_at: now,
        })
    }

    /// Reconstructs an offer from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedOfferData) -> Self {
        Self {
            id: data.id,
            task_id: data.task_id,
            helper_id: data.helper_id,
            helper_name: data.helper_name,
            helper_photo_url: data.helper_photo_url,
            note: data.note,
            proposed_price: data.proposed_price,
            status: data.status,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the offer identifier.
    #[must_use]
    pub const fn id(&self) -> OfferId {
        self.id
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the bidding helper.
    #[must_use]
    pub const fn helper_id(&self) -> UserId {
        self.helper_id
    }

    /// Returns the helper name snapshot.
    #[must_use]
    pub fn helper_name(&self) -> &str {
        &self.helper_name
    }

    /// Returns the helper photo snapshot.
    #[must_use]
    pub fn helper_photo_url(&self) -> Option<&str> {
        self.helper_photo_url.as_deref()
    }

    /// Returns the note.
    #[must_use]
    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    /// Returns the proposed price.
    #[must_use]
    pub const fn proposed_price(&self) -> Option<Money> {
        self.proposed_price
    }

    /// Returns the status.
    #[must_use]
    pub const fn status(&self) -> OfferStatus {
        self.status
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

    fn resolve(&mut self, next: OfferStatus, at: DateTime<Utc>) -> Result<(), OfferDomainError> {
        if self.status != OfferStatus::Pending {
            return Err(OfferDomainError::AlreadyResolved(self.id, self.status));
        }
        self.status = next;
        self.updated_at = at;
        Ok(())
    }

    /// Marks the offer as the hired one.
    ///
    /// # Errors
    ///
    /// Returns [`OfferDomainError::AlreadyResolved`] unless pending.
    pub fn accept(&mut self, at: DateTime<Utc>) -> Result<(), OfferDomainError> {
        self.resolve(OfferStatus::Accepted, at)
    }

    /// Marks the offer as passed over.
    ///
    /// # Errors
    ///
    /// Returns [`OfferDomainError::AlreadyResolved`] unless pending.
    pub fn decline(&mut self, at: DateTime<Utc>) -> Result<(), OfferDomainError> {
        self.resolve(OfferStatus::Declined, at)
    }
}
