//! Error types for task domain validation and parsing.

use super::{TaskAction, TaskStatus};
use crate::ids::TaskId;
use crate::payments::domain::Money;
use thiserror::Error;

/// Errors returned by task domain rules.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// The ZIP code is empty after trimming.
    #[error("task ZIP code must not be empty")]
    EmptyZipCode,

    /// The poster has not uploaded a profile photo.
    #[error("a profile photo is required before posting a task")]
    ProfilePhotoRequired,

    /// The price is below the category minimum.
    #[error("minimum job price is ${minimum}")]
    PriceBelowMinimum {
        /// Applicable minimum.
        minimum: Money,
    },

    /// The action was attempted from a status that does not permit it.
    #[error("cannot {action} while the task is {status}")]
    InvalidState {
        /// Task identifier.
        task_id: TaskId,
        /// Attempted action.
        action: TaskAction,
        /// Current status.
        status: TaskStatus,
    },

    /// The actor is not the task poster.
    #[error("only the task poster can {action}")]
    NotPoster {
        /// Task identifier.
        task_id: TaskId,
        /// Attempted action.
        action: TaskAction,
    },

    /// The actor is not the assigned helper.
    #[error("only the assigned helper can {action}")]
    NotHelper {
        /// Task identifier.
        task_id: TaskId,
        /// Attempted action.
        action: TaskAction,
    },

    /// The actor is neither poster nor assigned helper.
    #[error("only the poster or the assigned helper can {action}")]
    NotParty {
        /// Task identifier.
        task_id: TaskId,
        /// Attempted action.
        action: TaskAction,
    },

    /// The poster tried to hire themselves.
    #[error("posters cannot hire themselves")]
    SelfHire,

    /// Proof is required but no chat thread exists yet.
    #[error("no chat thread exists for this task")]
    ChatThreadMissing(TaskId),

    /// Proof is required but no proof photo was shared.
    #[error("a proof photo must be shared in chat first")]
    ProofPhotoRequired(TaskId),

    /// The price cannot change once offers exist.
    #[error("cannot adjust the price after offers exist")]
    OffersExist(TaskId),

    /// A tip was already paid for this task.
    #[error("tip already given")]
    TipAlreadyGiven(TaskId),

    /// Tip amounts must be positive.
    #[error("tip amount must be greater than zero")]
    InvalidTipAmount,

    /// A capture referenced a hold session other than the one on file.
    #[error("hold session {session} does not match the pending checkout")]
    HoldSessionMismatch {
        /// Task identifier.
        task_id: TaskId,
        /// Session reported by the capture.
        session: String,
    },

    /// A hire capture named a helper other than the one chosen.
    #[error("captured helper does not match the chosen helper")]
    HelperMismatch(TaskId),
}

/// Error returned while parsing task statuses.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);

/// Error returned while parsing task categories.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task category: {0}")]
pub struct ParseTaskCategoryError(pub String);

/// Error returned while parsing party roles.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown party role: {0}")]
pub struct ParsePartyRoleError(pub String);
