//! In-memory store for tests and local development.

mod billing;
mod chat;
mod dispute;
mod identity;
mod ledger;
mod task;

use crate::activity::domain::ActivityEntry;
use crate::billing::domain::ExtraWorkRequest;
use crate::chat::domain::{ChatMessage, ChatThread};
use crate::dispute::domain::Dispute;
use crate::identity::domain::{OtpCode, User};
use crate::offer::domain::Offer;
use crate::persistence::{RepositoryError, RepositoryResult};
use crate::settlement::domain::UnreconciledEvent;
use crate::task::domain::Task;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Thread-safe in-memory implementation of every repository port.
///
/// Records are kept in insertion order so that listings with equal
/// timestamps come back newest-inserted first.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMarketplace {
    state: Arc<RwLock<MarketplaceState>>,
}

#[derive(Debug, Default)]
struct MarketplaceState {
    users: Vec<User>,
    otps: Vec<OtpCode>,
    tasks: Vec<Task>,
    offers: Vec<Offer>,
    threads: Vec<ChatThread>,
    messages: Vec<ChatMessage>,
    extra_work: Vec<ExtraWorkRequest>,
    disputes: Vec<Dispute>,
    activity: Vec<ActivityEntry>,
    unreconciled: Vec<UnreconciledEvent>,
}

impl InMemoryMarketplace {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RepositoryResult<RwLockReadGuard<'_, MarketplaceState>> {
        self.state
            .read()
            .map_err(|err| RepositoryError::persistence(std::io::Error::other(err.to_string())))
    }

    fn write(&self) -> RepositoryResult<RwLockWriteGuard<'_, MarketplaceState>> {
        self.state
            .write()
            .map_err(|err| RepositoryError::persistence(std::io::Error::other(err.to_string())))
    }
}

/// Newest-first copy of `items` ordered by `key`, ties broken by insertion.
fn newest_first<T: Clone, K: Ord>(
    items: impl DoubleEndedIterator<Item = T>,
    key: impl Fn(&T) -> K,
) -> Vec<T> {
    let mut listed: Vec<T> = items.rev().collect();
    listed.sort_by(|left, right| key(right).cmp(&key(left)));
    listed
}
