use super::models::{OtpRow, UserRow};
use super::schema::{otp_codes, users};
use super::{PostgresMarketplace, constraint_is, unique_violation};
use crate::identity::domain::{Email, OneTimeCode, OtpCode, User, UserChange};
use crate::identity::ports::{OtpRepository, UserRepository};
use crate::ids::{OtpCodeId, UserId};
use crate::persistence::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

#[async_trait]
impl UserRepository for PostgresMarketplace {
    async fn store_user(&self, user: &User) -> RepositoryResult<()> {
        let row = UserRow::from_domain(user)?;
        self.run_blocking(move |connection| {
            let id = row.id;
            let email = row.email.clone().unwrap_or_default();
            diesel::insert_into(users::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
                        if constraint_is(info.as_ref(), "idx_users_email_unique") =>
                    {
                        RepositoryError::duplicate("user email", &email)
                    }
                    other => unique_violation(other, "users_pkey", "user", id),
                })?;
            Ok(())
        })
        .await
    }

    async fn update_user(&self, user: &User, change: UserChange) -> RepositoryResult<User> {
        let row = UserRow::from_domain(user)?;
        self.run_blocking(move |connection| {
            connection.transaction::<_, RepositoryError, _>(|tx| {
                let target = users::table.filter(users::id.eq(row.id));
                match change {
                    UserChange::Profile => diesel::update(target)
                        .set((
                            users::name.eq(row.name),
                            users::phone.eq(row.phone),
                            users::phone_verified.eq(row.phone_verified),
                            users::default_zip_code.eq(row.default_zip_code),
                            users::updated_at.eq(row.updated_at),
                        ))
                        .execute(tx)?,
                    UserChange::Photo => diesel::update(target)
                        .set((
                            users::profile_photo_url.eq(row.profile_photo_url),
                            users::updated_at.eq(row.updated_at),
                        ))
                        .execute(tx)?,
                    UserChange::EmailConfirmed => diesel::update(target)
                        .set((
                            users::email.eq(row.email),
                            users::email_verified.eq(row.email_verified),
                            users::updated_at.eq(row.updated_at),
                        ))
                        .execute(tx)?,
                    UserChange::PayeeAccount => {
                        diesel::update(target.filter(users::payee_account_id.is_null()))
                            .set((
                                users::payee_account_id.eq(row.payee_account_id),
                                users::updated_at.eq(row.updated_at),
                            ))
                            .execute(tx)?
                    }
                };
                users::table
                    .filter(users::id.eq(row.id))
                    .select(UserRow::as_select())
                    .first::<UserRow>(tx)
                    .optional()?
                    .ok_or_else(|| RepositoryError::not_found("user", row.id))?
                    .into_domain()
            })
        })
        .await
    }

    async fn find_user(&self, id: UserId) -> RepositoryResult<Option<User>> {
        self.run_blocking(move |connection| {
            users::table
                .filter(users::id.eq(id.into_inner()))
                .select(UserRow::as_select())
                .first::<UserRow>(connection)
                .optional()?
                .map(UserRow::into_domain)
                .transpose()
        })
        .await
    }

    async fn find_user_by_email(&self, email: &Email) -> RepositoryResult<Option<User>> {
        let lookup = email.as_str().to_owned();
        self.run_blocking(move |connection| {
            users::table
                .filter(users::email.eq(lookup))
                .select(UserRow::as_select())
                .first::<UserRow>(connection)
                .optional()?
                .map(UserRow::into_domain)
                .transpose()
        })
        .await
    }
}

#[async_trait]
impl OtpRepository for PostgresMarketplace {
    async fn store_otp(&self, code: &OtpCode) -> RepositoryResult<()> {
        let row = OtpRow::from_domain(code);
        let issued_at = code.created_at();
        self.run_blocking(move |connection| {
            connection.transaction::<_, RepositoryError, _>(|tx| {
                diesel::delete(
                    otp_codes::table.filter(
                        otp_codes::used
                            .eq(true)
                            .or(otp_codes::expires_at.le(issued_at)),
                    ),
                )
                .execute(tx)?;
                diesel::insert_into(otp_codes::table)
                    .values(&row)
                    .execute(tx)?;
                Ok(())
            })
        })
        .await
    }

    async fn find_usable_otp(
        &self,
        email: &Email,
        code: &OneTimeCode,
        now: DateTime<Utc>,
    ) -> RepositoryResult<Option<OtpCode>> {
        let lookup_email = email.as_str().to_owned();
        let lookup_code = code.as_str().to_owned();
        self.run_blocking(move |connection| {
            otp_codes::table
                .filter(otp_codes::email.eq(lookup_email))
                .filter(otp_codes::code.eq(lookup_code))
                .filter(otp_codes::used.eq(false))
                .filter(otp_codes::expires_at.gt(now))
                .order(otp_codes::created_at.desc())
                .select(OtpRow::as_select())
                .first::<OtpRow>(connection)
                .optional()?
                .map(OtpRow::into_domain)
                .transpose()
        })
        .await
    }

    async fn consume_otp(&self, id: OtpCodeId) -> RepositoryResult<bool> {
        self.run_blocking(move |connection| {
            let affected = diesel::update(
                otp_codes::table
                    .filter(otp_codes::id.eq(id.into_inner()))
                    .filter(otp_codes::used.eq(false)),
            )
            .set(otp_codes::used.eq(true))
            .execute(connection)?;
            if affected > 0 {
                return Ok(true);
            }
            let exists = diesel::select(diesel::dsl::exists(
                otp_codes::table.filter(otp_codes::id.eq(id.into_inner())),
            ))
            .get_result::<bool>(connection)?;
            if exists {
                Ok(false)
            } else {
                Err(RepositoryError::not_found("otp code", id))
            }
        })
        .await
    }
}
