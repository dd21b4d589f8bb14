//! Service-level error type and its classification.

use crate::billing::domain::BillingDomainError;
use crate::chat::domain::ChatDomainError;
use crate::dispute::domain::DisputeDomainError;
use crate::identity::domain::IdentityDomainError;
use crate::offer::domain::OfferDomainError;
use crate::payments::domain::{MoneyError, PaymentsDomainError};
use crate::payments::ports::PaymentProcessorError;
use crate::persistence::RepositoryError;
use crate::task::domain::TaskDomainError;
use thiserror::Error;

/// Result type for marketplace services.
pub type MarketplaceResult<T> = Result<T, MarketplaceError>;

/// Broad error classes, each with a fixed transport status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Missing or out-of-range input.
    Validation,
    /// A referenced record does not exist.
    NotFound,
    /// The actor is not the party the action requires.
    Authorization,
    /// The action is not allowed from the current state.
    InvalidState,
    /// A payee cannot receive funds, or onboarding failed.
    PayeeSetup,
    /// The payment processor failed.
    Payment,
    /// A webhook signature did not verify.
    WebhookSignature,
    /// No valid caller identity.
    Unauthenticated,
    /// Anything else.
    Internal,
}

/// Why a payee cannot be paid or set up.
#[derive(Debug, Clone, Error)]
pub enum PayeeSetupError {
    /// The helper never connected a payee account.
    #[error("helper has not set up a payout account")]
    NoPayeeAccount,

    /// The helper's account cannot receive payouts yet.
    #[error("helper has not completed payout onboarding")]
    PayoutsDisabled,

    /// The processor call failed.
    #[error("payout account setup failed: {0}")]
    Processor(PaymentProcessorError),
}

/// Errors returned by marketplace services.
#[derive(Debug, Clone, Error)]
pub enum MarketplaceError {
    /// Identity rule violation.
    #[error(transparent)]
    Identity(#[from] IdentityDomainError),

    /// Task rule violation.
    #[error(transparent)]
    Task(#[from] TaskDomainError),

    /// Offer rule violation.
    #[error(transparent)]
    Offer(#[from] OfferDomainError),

    /// Chat rule violation.
    #[error(transparent)]
    Chat(#[from] ChatDomainError),

    /// Billing rule violation.
    #[error(transparent)]
    Billing(#[from] BillingDomainError),

    /// Dispute rule violation.
    #[error(transparent)]
    Dispute(#[from] DisputeDomainError),

    /// Payment value error.
    #[error(transparent)]
    Payments(#[from] PaymentsDomainError),

    /// Malformed amount.
    #[error(transparent)]
    Money(#[from] MoneyError),

    /// Storage failure or conflict.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// A referenced record does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Malformed request input.
    #[error("{0}")]
    Validation(String),

    /// The actor may not touch the resource.
    #[error("{0}")]
    Forbidden(&'static str),

    /// Payee account problem.
    #[error(transparent)]
    PayeeSetup(#[from] PayeeSetupError),

    /// The payment processor failed.
    #[error("payment processing failed: {0}")]
    Payment(#[from] PaymentProcessorError),

    /// A webhook signature did not verify.
    #[error("webhook signature verification failed: {0}")]
    WebhookSignature(String),

    /// No valid caller identity.
    #[error("authentication required")]
    Unauthenticated,

    /// Unexpected internal failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl MarketplaceError {
    /// Builds a [`MarketplaceError::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Classifies the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Identity(err) => identity_kind(err),
            Self::Task(err) => task_kind(err),
            Self::Offer(err) => match err {
                OfferDomainError::AlreadyResolved(..) => ErrorKind::InvalidState,
                _ => ErrorKind::Validation,
            },
            Self::Chat(err) => match err {
                ChatDomainError::NotParticipant(_) => ErrorKind::Authorization,
                ChatDomainError::ThreadClosed(_) => ErrorKind::InvalidState,
                ChatDomainError::EmptyMessage | ChatDomainError::ProofWithoutImage => {
                    ErrorKind::Validation
                }
            },
            Self::Billing(err) => match err {
                BillingDomainError::Task(inner) => task_kind(inner),
                BillingDomainError::InvalidStatus { .. }
                | BillingDomainError::HoldSessionMismatch { .. } => ErrorKind::InvalidState,
                BillingDomainError::InvalidAmount
                | BillingDomainError::EmptyReason
                | BillingDomainError::PendingRequestExists(_) => ErrorKind::Validation,
            },
            Self::Dispute(err) => match err {
                DisputeDomainError::AlreadyResolved(_) | DisputeDomainError::NotPending(_) => {
                    ErrorKind::InvalidState
                }
                DisputeDomainError::NegativeAmount | DisputeDomainError::NoEvidence => {
                    ErrorKind::Validation
                }
            },
            Self::Payments(err) => match err {
                PaymentsDomainError::EmptyReference(_) => ErrorKind::Payment,
                PaymentsDomainError::MissingMetadata(_)
                | PaymentsDomainError::InvalidMetadata { .. } => ErrorKind::Validation,
            },
            Self::Money(_) | Self::Validation(_) => ErrorKind::Validation,
            Self::Repository(err) => match err {
                RepositoryError::NotFound { .. } => ErrorKind::NotFound,
                RepositoryError::Conflict { .. } => ErrorKind::InvalidState,
                RepositoryError::Duplicate { .. } => ErrorKind::Validation,
                RepositoryError::Persistence(_) => ErrorKind::Internal,
            },
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Forbidden(_) => ErrorKind::Authorization,
            Self::PayeeSetup(_) => ErrorKind::PayeeSetup,
            Self::Payment(_) => ErrorKind::Payment,
            Self::WebhookSignature(_) => ErrorKind::WebhookSignature,
            Self::Unauthenticated => ErrorKind::Unauthenticated,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Returns `true` when an external dependency, not the caller, failed.
    #[must_use]
    pub const fn is_upstream_failure(&self) -> bool {
        matches!(
            self,
            Self::Payment(_)
                | Self::PayeeSetup(PayeeSetupError::Processor(_))
                | Self::Payments(PaymentsDomainError::EmptyReference(_))
        )
    }
}

const fn identity_kind(err: &IdentityDomainError) -> ErrorKind {
    match err {
        IdentityDomainError::InvalidEmail(_)
        | IdentityDomainError::CodeInvalidOrExpired
        | IdentityDomainError::EmptyProfilePhoto => ErrorKind::Validation,
        IdentityDomainError::InvalidSessionToken | IdentityDomainError::ExpiredSessionToken => {
            ErrorKind::Unauthenticated
        }
    }
}

const fn task_kind(err: &TaskDomainError) -> ErrorKind {
    match err {
        TaskDomainError::EmptyTitle
        | TaskDomainError::EmptyZipCode
        | TaskDomainError::ProfilePhotoRequired
        | TaskDomainError::PriceBelowMinimum { .. }
        | TaskDomainError::SelfHire
        | TaskDomainError::ChatThreadMissing(_)
        | TaskDomainError::ProofPhotoRequired(_)
        | TaskDomainError::TipAlreadyGiven(_)
        | TaskDomainError::InvalidTipAmount => ErrorKind::Validation,
        TaskDomainError::NotPoster { .. }
        | TaskDomainError::NotHelper { .. }
        | TaskDomainError::NotParty { .. } => ErrorKind::Authorization,
        TaskDomainError::InvalidState { .. }
        | TaskDomainError::OffersExist(_)
        | TaskDomainError::HoldSessionMismatch { .. }
        | TaskDomainError::HelperMismatch(_) => ErrorKind::InvalidState,
    }
}
