use super::models::{OfferRow, TaskRow, ThreadRow, revision_column, rule_violation};
use super::schema::{chat_threads, offers, tasks, users};
use super::{PostgresMarketplace, constraint_is, expect_one_row, unique_violation};
use crate::ids::{TaskId, UserId};
use crate::offer::domain::OfferStatus;
use crate::persistence::{RepositoryError, RepositoryResult};
use crate::task::domain::{Task, TaskStatus};
use crate::task::ports::{HireCommit, TaskFilter, TaskRepository};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::dsl::{exists, not};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

const ACTIVE_JOB_STATUSES: [TaskStatus; 3] = [
    TaskStatus::Accepted,
    TaskStatus::InProgress,
    TaskStatus::WorkerMarkedDone,
];

/// Replaces a task row if its stored revision still equals `expected`.
pub(super) fn write_task(
    connection: &mut PgConnection,
    task: &Task,
    expected_revision: u64,
) -> RepositoryResult<()> {
    let row = TaskRow::from_domain(task)?;
    let affected = diesel::update(
        tasks::table
            .filter(tasks::id.eq(row.id))
            .filter(tasks::revision.eq(revision_column(expected_revision)?)),
    )
    .set(&row)
    .execute(connection)?;
    if affected > 0 {
        return Ok(());
    }
    let present = diesel::select(exists(tasks::table.filter(tasks::id.eq(row.id))))
        .get_result::<bool>(connection)?;
    if present {
        Err(RepositoryError::conflict("task", task.id()))
    } else {
        Err(RepositoryError::not_found("task", task.id()))
    }
}

/// Loads and locks a task row for the rest of the transaction.
pub(super) fn lock_task(connection: &mut PgConnection, id: TaskId) -> RepositoryResult<Task> {
    tasks::table
        .filter(tasks::id.eq(id.into_inner()))
        .select(TaskRow::as_select())
        .for_update()
        .first::<TaskRow>(connection)
        .optional()?
        .ok_or_else(|| RepositoryError::not_found("task", id))?
        .into_domain()
}

fn load_tasks(rows: Vec<TaskRow>) -> RepositoryResult<Vec<Task>> {
    rows.into_iter().map(TaskRow::into_domain).collect()
}

#[async_trait]
impl TaskRepository for PostgresMarketplace {
    async fn store_task(&self, task: &Task) -> RepositoryResult<()> {
        let row = TaskRow::from_domain(task)?;
        self.run_blocking(move |connection| {
            let id = row.id;
            let code = row.confirmation_code.clone();
            diesel::insert_into(tasks::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
                        if constraint_is(info.as_ref(), "idx_tasks_confirmation_code_unique") =>
                    {
                        RepositoryError::duplicate("confirmation code", &code)
                    }
                    other => unique_violation(other, "tasks_pkey", "task", id),
                })?;
            Ok(())
        })
        .await
    }

    async fn update_task(&self, task: &Task, expected_revision: u64) -> RepositoryResult<()> {
        let updated = task.clone();
        self.run_blocking(move |connection| write_task(connection, &updated, expected_revision))
            .await
    }

    async fn commit_price_change(
        &self,
        task: &Task,
        expected_revision: u64,
    ) -> RepositoryResult<()> {
        let changed = task.clone();
        self.run_blocking(move |connection| {
            connection.transaction::<_, RepositoryError, _>(|tx| {
                lock_task(tx, changed.id())?;
                let has_offers = diesel::select(exists(
                    offers::table.filter(offers::task_id.eq(changed.id().into_inner())),
                ))
                .get_result::<bool>(tx)?;
                if has_offers {
                    return Err(RepositoryError::conflict("task", changed.id()));
                }
                write_task(tx, &changed, expected_revision)
            })
        })
        .await
    }

    async fn find_task(&self, id: TaskId) -> RepositoryResult<Option<Task>> {
        self.run_blocking(move |connection| {
            tasks::table
                .filter(tasks::id.eq(id.into_inner()))
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()?
                .map(TaskRow::into_domain)
                .transpose()
        })
        .await
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> RepositoryResult<Vec<Task>> {
        let criteria = filter.clone();
        self.run_blocking(move |connection| {
            let mut query = tasks::table.into_boxed();
            if let Some(status) = criteria.status {
                query = query.filter(tasks::status.eq(status.as_str()));
            }
            if let Some(zip_code) = criteria.zip_code.as_deref() {
                query = query.filter(tasks::zip_code.eq(zip_code.to_owned()));
            }
            if let Some(category) = criteria.category {
                query = query.filter(tasks::category.eq(category.as_str()));
            }
            if let Some(flag) = criteria.tools_required {
                query = query.filter(tasks::tools_required.eq(flag));
            }
            if let Some(flag) = criteria.tools_provided {
                query = query.filter(tasks::tools_provided.eq(flag));
            }
            if let Some(poster) = criteria.poster_id {
                query = query.filter(tasks::poster_id.eq(poster.into_inner()));
            }
            if let Some(helper) = criteria.helper_id {
                query = query.filter(tasks::helper_id.eq(helper.into_inner()));
            }
            if let Some(now) = criteria.unexpired_at {
                query = query.filter(tasks::expires_at.gt(now));
            }
            let rows = query
                .order(tasks::created_at.desc())
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)?;
            let mut listed = load_tasks(rows)?;
            listed.sort_by(|left, right| criteria.compare(left, right));
            Ok(listed)
        })
        .await
    }

    async fn list_due_price_prompts(&self, now: DateTime<Utc>) -> RepositoryResult<Vec<Task>> {
        self.run_blocking(move |connection| {
            let rows = tasks::table
                .filter(tasks::status.eq(TaskStatus::Requested.as_str()))
                .filter(tasks::price_prompt_shown.eq(false))
                .filter(tasks::price_prompt_due_at.le(now))
                .filter(not(exists(
                    offers::table.filter(offers::task_id.eq(tasks::id)),
                )))
                .order(tasks::created_at.asc())
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)?;
            load_tasks(rows)
        })
        .await
    }

    async fn list_price_prompted(&self, poster: UserId) -> RepositoryResult<Vec<Task>> {
        self.run_blocking(move |connection| {
            let rows = tasks::table
                .filter(tasks::poster_id.eq(poster.into_inner()))
                .filter(tasks::status.eq(TaskStatus::Requested.as_str()))
                .filter(tasks::price_prompt_shown.eq(true))
                .filter(not(exists(
                    offers::table.filter(offers::task_id.eq(tasks::id)),
                )))
                .order(tasks::created_at.desc())
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)?;
            load_tasks(rows)
        })
        .await
    }

    async fn count_active_jobs(&self, helper: UserId) -> RepositoryResult<usize> {
        self.run_blocking(move |connection| {
            let count = tasks::table
                .filter(tasks::helper_id.eq(helper.into_inner()))
                .filter(tasks::status.eq_any(ACTIVE_JOB_STATUSES.map(TaskStatus::as_str).to_vec()))
                .count()
                .get_result::<i64>(connection)?;
            usize::try_from(count).map_err(RepositoryError::persistence)
        })
        .await
    }

    async fn commit_hire(&self, commit: &HireCommit) -> RepositoryResult<()> {
        let staged = commit.clone();
        self.run_blocking(move |connection| {
            connection.transaction::<_, RepositoryError, _>(|tx| {
                let task = &staged.task;
                write_task(tx, task, staged.expected_revision)?;

                let pending: Vec<OfferRow> = offers::table
                    .filter(offers::task_id.eq(task.id().into_inner()))
                    .filter(offers::status.eq(OfferStatus::Pending.as_str()))
                    .select(OfferRow::as_select())
                    .for_update()
                    .load(tx)?;
                for row in pending {
                    let mut offer = row.into_domain()?;
                    let resolved = if Some(offer.helper_id()) == task.helper_id() {
                        offer.accept(staged.at)
                    } else {
                        offer.decline(staged.at)
                    };
                    resolved.map_err(rule_violation)?;
                    let updated = OfferRow::from_domain(&offer);
                    let affected =
                        diesel::update(offers::table.filter(offers::id.eq(updated.id)))
                            .set(&updated)
                            .execute(tx)?;
                    expect_one_row(affected, "offer", offer.id())?;
                }

                diesel::insert_into(chat_threads::table)
                    .values(&ThreadRow::from_domain(&staged.thread))
                    .on_conflict(chat_threads::task_id)
                    .do_nothing()
                    .execute(tx)?;
                Ok(())
            })
        })
        .await
    }

    async fn commit_completion(
        &self,
        task: &Task,
        expected_revision: u64,
    ) -> RepositoryResult<()> {
        let completed = task.clone();
        self.run_blocking(move |connection| {
            connection.transaction::<_, RepositoryError, _>(|tx| {
                write_task(tx, &completed, expected_revision)?;
                if let Some(helper_id) = completed.helper_id() {
                    diesel::update(users::table.filter(users::id.eq(helper_id.into_inner())))
                        .set((
                            users::completed_jobs_count.eq(users::completed_jobs_count + 1),
                            users::updated_at.eq(completed.updated_at()),
                        ))
                        .execute(tx)?;
                }
                Ok(())
            })
        })
        .await
    }
}
