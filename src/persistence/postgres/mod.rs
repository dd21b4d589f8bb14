//! `PostgreSQL` store implementing every repository port.
//!
//! Diesel is synchronous, so each operation checks a connection out of the
//! r2d2 pool inside [`tokio::task::spawn_blocking`]. Compound commits run in
//! a single transaction. Optimistic concurrency is enforced with
//! `UPDATE ... WHERE revision = $expected`; zero affected rows means the
//! task changed (or vanished) since it was read.

mod billing;
mod chat;
mod dispute;
mod identity;
mod ledger;
mod models;
mod schema;
mod task;

use crate::persistence::{RepositoryError, RepositoryResult};
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool used by [`PostgresMarketplace`].
pub type MarketplacePgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed marketplace store.
#[derive(Debug, Clone)]
pub struct PostgresMarketplace {
    pool: MarketplacePgPool,
}

impl From<DieselError> for RepositoryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

impl PostgresMarketplace {
    /// Creates a store from an existing pool.
    #[must_use]
    pub const fn new(pool: MarketplacePgPool) -> Self {
        Self { pool }
    }

    /// Builds a pool for `database_url` holding at most `max_size`
    /// connections.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Persistence`] when the pool cannot open its
    /// initial connection.
    pub fn connect(database_url: &str, max_size: u32) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(database_url);
        let pool = Pool::builder()
            .max_size(max_size)
            .build(manager)
            .map_err(RepositoryError::persistence)?;
        Ok(Self::new(pool))
    }

    async fn run_blocking<F, T>(&self, f: F) -> RepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(RepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(RepositoryError::persistence)?
    }
}

/// Maps a unique violation on `constraint` to [`RepositoryError::Duplicate`].
fn unique_violation(
    err: DieselError,
    constraint: &str,
    entity: &'static str,
    key: impl ToString,
) -> RepositoryError {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
            if constraint_is(info.as_ref(), constraint) =>
        {
            RepositoryError::duplicate(entity, key)
        }
        other => RepositoryError::from(other),
    }
}

fn constraint_is(info: &dyn DatabaseErrorInformation, constraint: &str) -> bool {
    info.constraint_name().is_some_and(|name| name == constraint)
}

/// Fails with [`RepositoryError::Conflict`] when an update touched no rows.
fn expect_one_row(affected: usize, entity: &'static str, id: impl ToString) -> RepositoryResult<()> {
    if affected == 0 {
        Err(RepositoryError::conflict(entity, id))
    } else {
        Ok(())
    }
}
