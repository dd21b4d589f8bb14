use super::models::{DisputeDecisionRow, DisputeRow, rule_violation};
use super::schema::disputes;
use super::task::write_task;
use super::{PostgresMarketplace, expect_one_row, unique_violation};
use crate::dispute::domain::{Dispute, DisputeStatus};
use crate::dispute::ports::DisputeRepository;
use crate::ids::DisputeId;
use crate::persistence::{RepositoryError, RepositoryResult};
use crate::task::domain::{PartyRole, Task};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

#[async_trait]
impl DisputeRepository for PostgresMarketplace {
    async fn commit_dispute(
        &self,
        dispute: &Dispute,
        task: &Task,
        expected_revision: u64,
    ) -> RepositoryResult<()> {
        let row = DisputeRow::from_domain(dispute)?;
        let disputed = task.clone();
        self.run_blocking(move |connection| {
            connection.transaction::<_, RepositoryError, _>(|tx| {
                write_task(tx, &disputed, expected_revision)?;
                diesel::insert_into(disputes::table)
                    .values(&row)
                    .execute(tx)
                    .map_err(|err| unique_violation(err, "disputes_pkey", "dispute", row.id))?;
                Ok(())
            })
        })
        .await
    }

    async fn find_dispute(&self, id: DisputeId) -> RepositoryResult<Option<Dispute>> {
        self.run_blocking(move |connection| {
            disputes::table
                .filter(disputes::id.eq(id.into_inner()))
                .select(DisputeRow::as_select())
                .first::<DisputeRow>(connection)
                .optional()?
                .map(DisputeRow::into_domain)
                .transpose()
        })
        .await
    }

    async fn append_dispute_evidence(
        &self,
        id: DisputeId,
        role: PartyRole,
        urls: &[String],
        at: DateTime<Utc>,
    ) -> RepositoryResult<Dispute> {
        let evidence = urls.to_vec();
        self.run_blocking(move |connection| {
            connection.transaction::<_, RepositoryError, _>(|tx| {
                let mut dispute = disputes::table
                    .filter(disputes::id.eq(id.into_inner()))
                    .select(DisputeRow::as_select())
                    .for_update()
                    .first::<DisputeRow>(tx)
                    .optional()?
                    .ok_or_else(|| RepositoryError::not_found("dispute", id))?
                    .into_domain()?;
                dispute
                    .append_evidence(role, evidence, at)
                    .map_err(rule_violation)?;
                let row = DisputeRow::from_domain(&dispute)?;
                diesel::update(disputes::table.filter(disputes::id.eq(row.id)))
                    .set(&row)
                    .execute(tx)?;
                Ok(dispute)
            })
        })
        .await
    }

    async fn update_dispute(
        &self,
        dispute: &Dispute,
        expected_status: DisputeStatus,
    ) -> RepositoryResult<Dispute> {
        let id = dispute.id();
        let decision = DisputeDecisionRow::from_domain(dispute)?;
        self.run_blocking(move |connection| {
            connection.transaction::<_, RepositoryError, _>(|tx| {
                let affected = diesel::update(
                    disputes::table
                        .filter(disputes::id.eq(id.into_inner()))
                        .filter(disputes::status.eq(expected_status.as_str())),
                )
                .set(&decision)
                .execute(tx)?;
                let stored = disputes::table
                    .filter(disputes::id.eq(id.into_inner()))
                    .select(DisputeRow::as_select())
                    .first::<DisputeRow>(tx)
                    .optional()?
                    .ok_or_else(|| RepositoryError::not_found("dispute", id))?;
                expect_one_row(affected, "dispute", id)?;
                stored.into_domain()
            })
        })
        .await
    }
}
