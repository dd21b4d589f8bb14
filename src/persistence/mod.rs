//! Storage adapters shared by every marketplace context.
//!
//! Each context declares its own repository port; the adapters here
//! implement all of them over one backing store so that compound
//! transitions (hire confirmation, dispute opening, extra-work payment,
//! completion) commit atomically.

pub mod error;
pub mod memory;
pub mod postgres;

pub use error::{RepositoryError, RepositoryResult};

use crate::activity::ports::ActivityLog;
use crate::billing::ports::ExtraWorkRepository;
use crate::chat::ports::ChatRepository;
use crate::dispute::ports::DisputeRepository;
use crate::identity::ports::{OtpRepository, UserRepository};
use crate::offer::ports::OfferRepository;
use crate::settlement::ports::UnreconciledEventStore;
use crate::task::ports::TaskRepository;

/// A backing store implementing every repository port.
pub trait MarketplaceStore:
    UserRepository
    + OtpRepository
    + TaskRepository
    + OfferRepository
    + ChatRepository
    + ExtraWorkRepository
    + DisputeRepository
    + ActivityLog
    + UnreconciledEventStore
    + 'static
{
}

impl<T> MarketplaceStore for T where
    T: UserRepository
        + OtpRepository
        + TaskRepository
        + OfferRepository
        + ChatRepository
        + ExtraWorkRepository
        + DisputeRepository
        + ActivityLog
        + UnreconciledEventStore
        + 'static
{
}
