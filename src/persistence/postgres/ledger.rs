//! Offers, activity entries and unreconciled events.

use super::models::{ActivityRow, OfferRow, UnreconciledRow};
use super::schema::{activity_log, offers, unreconciled_events};
use super::{PostgresMarketplace, constraint_is, unique_violation};
use crate::activity::domain::{ActivityEntry, ActivityQuery};
use crate::activity::ports::ActivityLog;
use crate::ids::{OfferId, TaskId, UserId};
use crate::offer::domain::{Offer, OfferStatus};
use crate::offer::ports::OfferRepository;
use crate::persistence::{RepositoryError, RepositoryResult};
use crate::settlement::domain::UnreconciledEvent;
use crate::settlement::ports::UnreconciledEventStore;
use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

fn page_size(limit: usize) -> RepositoryResult<i64> {
    i64::try_from(limit).map_err(RepositoryError::persistence)
}

#[async_trait]
impl OfferRepository for PostgresMarketplace {
    async fn store_offer(&self, offer: &Offer) -> RepositoryResult<()> {
        let row = OfferRow::from_domain(offer);
        self.run_blocking(move |connection| {
            let id = row.id;
            let key = format!("{}/{}", row.task_id, row.helper_id);
            diesel::insert_into(offers::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
                        if constraint_is(info.as_ref(), "idx_offers_one_pending_per_helper") =>
                    {
                        RepositoryError::duplicate("pending offer", &key)
                    }
                    other => unique_violation(other, "offers_pkey", "offer", id),
                })?;
            Ok(())
        })
        .await
    }

    async fn find_offer(&self, id: OfferId) -> RepositoryResult<Option<Offer>> {
        self.run_blocking(move |connection| {
            offers::table
                .filter(offers::id.eq(id.into_inner()))
                .select(OfferRow::as_select())
                .first::<OfferRow>(connection)
                .optional()?
                .map(OfferRow::into_domain)
                .transpose()
        })
        .await
    }

    async fn list_offers_for_task(&self, task_id: TaskId) -> RepositoryResult<Vec<Offer>> {
        self.run_blocking(move |connection| {
            offers::table
                .filter(offers::task_id.eq(task_id.into_inner()))
                .order(offers::created_at.desc())
                .select(OfferRow::as_select())
                .load::<OfferRow>(connection)?
                .into_iter()
                .map(OfferRow::into_domain)
                .collect()
        })
        .await
    }

    async fn count_offers_for_task(&self, task_id: TaskId) -> RepositoryResult<usize> {
        self.run_blocking(move |connection| {
            let count = offers::table
                .filter(offers::task_id.eq(task_id.into_inner()))
                .count()
                .get_result::<i64>(connection)?;
            usize::try_from(count).map_err(RepositoryError::persistence)
        })
        .await
    }

    async fn find_pending_offer(
        &self,
        task_id: TaskId,
        helper: UserId,
    ) -> RepositoryResult<Option<Offer>> {
        self.run_blocking(move |connection| {
            offers::table
                .filter(offers::task_id.eq(task_id.into_inner()))
                .filter(offers::helper_id.eq(helper.into_inner()))
                .filter(offers::status.eq(OfferStatus::Pending.as_str()))
                .select(OfferRow::as_select())
                .first::<OfferRow>(connection)
                .optional()?
                .map(OfferRow::into_domain)
                .transpose()
        })
        .await
    }
}

#[async_trait]
impl ActivityLog for PostgresMarketplace {
    async fn append_activity(&self, entry: &ActivityEntry) -> RepositoryResult<()> {
        let row = ActivityRow::from_domain(entry);
        self.run_blocking(move |connection| {
            diesel::insert_into(activity_log::table)
                .values(&row)
                .execute(connection)?;
            Ok(())
        })
        .await
    }

    async fn list_activity(&self, query: &ActivityQuery) -> RepositoryResult<Vec<ActivityEntry>> {
        let criteria = *query;
        self.run_blocking(move |connection| {
            let mut select = activity_log::table.into_boxed();
            if let Some(task_id) = criteria.task_id {
                select = select.filter(activity_log::task_id.eq(task_id.into_inner()));
            }
            if let Some(user_id) = criteria.user_id {
                select = select.filter(activity_log::actor_id.eq(user_id.into_inner()));
            }
            select
                .order(activity_log::created_at.desc())
                .limit(page_size(criteria.limit)?)
                .select(ActivityRow::as_select())
                .load::<ActivityRow>(connection)?
                .into_iter()
                .map(ActivityRow::into_domain)
                .collect()
        })
        .await
    }
}

#[async_trait]
impl UnreconciledEventStore for PostgresMarketplace {
    async fn record_unreconciled(&self, event: &UnreconciledEvent) -> RepositoryResult<()> {
        let row = UnreconciledRow::from_domain(event);
        self.run_blocking(move |connection| {
            diesel::insert_into(unreconciled_events::table)
                .values(&row)
                .execute(connection)?;
            Ok(())
        })
        .await
    }

    async fn list_unreconciled(&self, limit: usize) -> RepositoryResult<Vec<UnreconciledEvent>> {
        self.run_blocking(move |connection| {
            unreconciled_events::table
                .order(unreconciled_events::received_at.desc())
                .limit(page_size(limit)?)
                .select(UnreconciledRow::as_select())
                .load::<UnreconciledRow>(connection)?
                .into_iter()
                .map(UnreconciledRow::into_domain)
                .collect()
        })
        .await
    }
}
