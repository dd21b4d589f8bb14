use super::models::{ExtraWorkRow, ensure_status};
use super::schema::extra_work_requests;
use super::task::{lock_task, write_task};
use super::{PostgresMarketplace, constraint_is, unique_violation};
use crate::billing::domain::{ExtraWorkRequest, ExtraWorkStatus};
use crate::billing::ports::ExtraWorkRepository;
use crate::ids::{ExtraWorkId, TaskId};
use crate::persistence::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// Writes `row` if the stored status still equals `expected`.
fn replace_request(
    connection: &mut PgConnection,
    row: &ExtraWorkRow,
    expected: ExtraWorkStatus,
) -> RepositoryResult<()> {
    let stored = extra_work_requests::table
        .filter(extra_work_requests::id.eq(row.id))
        .select(extra_work_requests::status)
        .for_update()
        .first::<String>(connection)
        .optional()?
        .ok_or_else(|| RepositoryError::not_found("extra-work request", row.id))?;
    ensure_status("extra-work request", row.id, &stored, expected.as_str())?;
    diesel::update(extra_work_requests::table.filter(extra_work_requests::id.eq(row.id)))
        .set(row)
        .execute(connection)?;
    Ok(())
}

#[async_trait]
impl ExtraWorkRepository for PostgresMarketplace {
    async fn store_extra_work(&self, request: &ExtraWorkRequest) -> RepositoryResult<()> {
        let row = ExtraWorkRow::from_domain(request)?;
        self.run_blocking(move |connection| {
            let id = row.id;
            let task_id = row.task_id;
            diesel::insert_into(extra_work_requests::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
                        if constraint_is(info.as_ref(), "idx_extra_work_one_pending_per_task") =>
                    {
                        RepositoryError::duplicate("pending extra-work request", task_id)
                    }
                    other => unique_violation(
                        other,
                        "extra_work_requests_pkey",
                        "extra-work request",
                        id,
                    ),
                })?;
            Ok(())
        })
        .await
    }

    async fn update_extra_work(
        &self,
        request: &ExtraWorkRequest,
        expected_status: ExtraWorkStatus,
    ) -> RepositoryResult<()> {
        let row = ExtraWorkRow::from_domain(request)?;
        self.run_blocking(move |connection| {
            connection.transaction::<_, RepositoryError, _>(|tx| {
                replace_request(tx, &row, expected_status)
            })
        })
        .await
    }

    async fn find_extra_work(&self, id: ExtraWorkId) -> RepositoryResult<Option<ExtraWorkRequest>> {
        self.run_blocking(move |connection| {
            extra_work_requests::table
                .filter(extra_work_requests::id.eq(id.into_inner()))
                .select(ExtraWorkRow::as_select())
                .first::<ExtraWorkRow>(connection)
                .optional()?
                .map(ExtraWorkRow::into_domain)
                .transpose()
        })
        .await
    }

    async fn list_extra_work_for_task(
        &self,
        task_id: TaskId,
    ) -> RepositoryResult<Vec<ExtraWorkRequest>> {
        self.run_blocking(move |connection| {
            extra_work_requests::table
                .filter(extra_work_requests::task_id.eq(task_id.into_inner()))
                .order(extra_work_requests::created_at.desc())
                .select(ExtraWorkRow::as_select())
                .load::<ExtraWorkRow>(connection)?
                .into_iter()
                .map(ExtraWorkRow::into_domain)
                .collect()
        })
        .await
    }

    async fn commit_extra_work_payment(
        &self,
        request: &ExtraWorkRequest,
        expected_status: ExtraWorkStatus,
    ) -> RepositoryResult<()> {
        let row = ExtraWorkRow::from_domain(request)?;
        let task_id = request.task_id();
        let amount = request.amount();
        let paid_at = request.paid_at().unwrap_or_else(|| request.created_at());
        self.run_blocking(move |connection| {
            connection.transaction::<_, RepositoryError, _>(|tx| {
                let mut task = lock_task(tx, task_id)?;
                replace_request(tx, &row, expected_status)?;
                let expected_revision = task.revision();
                task.record_extra_payment(amount, paid_at);
                write_task(tx, &task, expected_revision)
            })
        })
        .await
    }
}
