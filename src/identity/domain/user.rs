//! User aggregate root.

use super::{Email, IdentityDomainError};
use crate::ids::UserId;
use crate::payments::domain::PayeeAccountId;
use chrono::{DateTime, Utc};
use mockable::Clock;

const SENIOR_COMPLETED_JOBS: u32 = 100;
const ESTABLISHED_COMPLETED_JOBS: u32 = 20;

/// A marketplace participant. The same user may post tasks and work as a
/// helper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    email: Option<Email>,
    email_verified: bool,
    name: Option<String>,
    phone: Option<String>,
    phone_verified: bool,
    default_zip_code: Option<String>,
    payee_account_id: Option<PayeeAccountId>,
    profile_photo_url: Option<String>,
    completed_jobs_count: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Data required to reconstruct a persisted user.
#[derive(Debug, Clone)]
pub struct PersistedUserData {
    /// User identifier.
    pub id: UserId,
    /// Verified login email, absent for stub users.
    pub email: Option<Email>,
    /// Whether the email was confirmed by code.
    pub email_verified: bool,
    /// Display name.
    pub name: Option<String>,
    /// Contact phone.
    pub phone: Option<String>,
    /// Whether the phone was verified.
    pub phone_verified: bool,
    /// Default ZIP code for new tasks.
    pub default_zip_code: Option<String>,
    /// Connected payee account.
    pub payee_account_id: Option<PayeeAccountId>,
    /// Profile photo URL.
    pub profile_photo_url: Option<String>,
    /// Number of completed jobs as helper.
    pub completed_jobs_count: u32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Field group written by a user update. Each variant names the only
/// columns that update may touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserChange {
    /// Name, phone, phone verification and default ZIP code.
    Profile,
    /// Profile photo.
    Photo,
    /// Login email and its verification flag.
    EmailConfirmed,
    /// Payee account, linked only while none is stored.
    PayeeAccount,
}

/// Partial profile update. `None` leaves a field unchanged; a blank string
/// clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    name: Option<String>,
    phone: Option<String>,
    default_zip_code: Option<String>,
}

impl ProfileUpdate {
    /// Creates an empty update.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the phone number.
    #[must_use]
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// Sets the default ZIP code.
    #[must_use]
    pub fn with_default_zip_code(mut self, zip: impl Into<String>) -> Self {
        self.default_zip_code = Some(zip.into());
        self
    }
}

fn normalized(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

impl User {
    /// Registers a user whose email has just been verified.
    #[must_use]
    pub fn register(email: Email, clock: &impl Clock) -> Self {
        let now = clock.utc();
        Self {
            id: UserId::new(),
            email: Some(email),
            email_verified: true,
            name: None,
            phone: None,
            phone_verified: false,
            default_zip_code: None,
            payee_account_id: None,
            profile_photo_url: None,
            completed_jobs_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// A placeholder profile for an authenticated identifier with no stored
    /// record.
    #[must_use]
    pub fn stub(id: UserId, clock: &impl Clock) -> Self {
        let now = clock.utc();
        Self {
            id,
            email: None,
            email_verified: false,
            name: None,
            phone: None,
            phone_verified: false,
            default_zip_code: None,
            payee_account_id: None,
            profile_photo_url: None,
            completed_jobs_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Reconstructs a user from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedUserData) -> Self {
        Self {
            id: data.id,
            email: data.email,
            email_verified: data.email_verified,
            name: data.name,
            phone: data.phone,
            phone_verified: data.phone_verified,
            default_zip_code: data.default_zip_code,
            payee_account_id: data.payee_account_id,
            profile_photo_url: data.profile_photo_url,
            completed_jobs_count: data.completed_jobs_count,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the user identifier.
    #[must_use]
    pub const fn id(&self) -> UserId {
        self.id
    }

    /// Returns the login email.
    #[must_use]
    pub const fn email(&self) -> Option<&Email> {
        self.email.as_ref()
    }

    /// Returns whether the email was verified.
    #[must_use]
    pub const fn email_verified(&self) -> bool {
        self.email_verified
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the display name or `fallback` when unset.
    #[must_use]
    pub fn display_name_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.name.as_deref().unwrap_or(fallback)
    }

    /// Returns the phone number.
    #[must_use]
    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    /// Returns whether the phone number was verified.
    #[must_use]
    pub const fn phone_verified(&self) -> bool {
        self.phone_verified
    }

    /// Returns the default ZIP code.
    #[must_use]
    pub fn default_zip_code(&self) -> Option<&str> {
        self.default_zip_code.as_deref()
    }

    /// Returns the connected payee account.
    #[must_use]
    pub const fn payee_account_id(&self) -> Option<&PayeeAccountId> {
        self.payee_account_id.as_ref()
    }

    /// Returns the profile photo URL.
    #[must_use]
    pub fn profile_photo_url(&self) -> Option<&str> {
        self.profile_photo_url.as_deref()
    }

    /// Returns `true` when a profile photo is set.
    #[must_use]
    pub const fn has_profile_photo(&self) -> bool {
        self.profile_photo_url.is_some()
    }

    /// Returns the number of jobs completed as helper.
    #[must_use]
    pub const fn completed_jobs_count(&self) -> u32 {
        self.completed_jobs_count
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Maximum number of simultaneously active jobs this helper may hold.
    #[must_use]
    pub const fn max_active_jobs(&self) -> u32 {
        if self.completed_jobs_count >= SENIOR_COMPLETED_JOBS {
            5
        } else if self.completed_jobs_count >= ESTABLISHED_COMPLETED_JOBS {
            3
        } else {
            2
        }
    }

    /// Applies a partial profile update. Changing the phone number clears its
    /// verification flag.
    pub fn apply_profile_update(&mut self, update: ProfileUpdate, clock: &impl Clock) {
        if let Some(name) = update.name {
            self.name = normalized(&name);
        }
        if let Some(phone) = update.phone {
            let next = normalized(&phone);
            if next != self.phone {
                self.phone_verified = false;
            }
            self.phone = next;
        }
        if let Some(zip) = update.default_zip_code {
            self.default_zip_code = normalized(&zip);
        }
        self.updated_at = clock.utc();
    }

    /// Sets the profile photo.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityDomainError::EmptyProfilePhoto`] for a blank URL.
    pub fn set_profile_photo(
        &mut self,
        url: &str,
        clock: &impl Clock,
    ) -> Result<(), IdentityDomainError> {
        let photo = normalized(url).ok_or(IdentityDomainError::EmptyProfilePhoto)?;
        self.profile_photo_url = Some(photo);
        self.updated_at = clock.utc();
        Ok(())
    }

    /// Marks the login email as verified, adopting it if the user had none.
    pub fn confirm_email(&mut self, email: Email, clock: &impl Clock) {
        self.email = Some(email);
        self.email_verified = true;
        self.updated_at = clock.utc();
    }

    /// Links a processor payee account.
    pub fn link_payee_account(&mut self, account: PayeeAccountId, clock: &impl Clock) {
        self.payee_account_id = Some(account);
        self.updated_at = clock.utc();
    }

    /// Counts one more completed job.
    pub fn record_completed_job(&mut self, at: DateTime<Utc>) {
        self.completed_jobs_count = self.completed_jobs_count.saturating_add(1);
        self.updated_at = at;
    }

    /// Copies the fields `change` owns from `source`. Returns `false`, and
    /// copies nothing, when a payee account is already linked.
    pub(crate) fn adopt(&mut self, source: &Self, change: UserChange) -> bool {
        match change {
            UserChange::Profile => {
                self.name.clone_from(&source.name);
                self.phone.clone_from(&source.phone);
                self.phone_verified = source.phone_verified;
                self.default_zip_code.clone_from(&source.default_zip_code);
            }
            UserChange::Photo => self.profile_photo_url.clone_from(&source.profile_photo_url),
            UserChange::EmailConfirmed => {
                self.email.clone_from(&source.email);
                self.email_verified = source.email_verified;
            }
            UserChange::PayeeAccount => {
                if self.payee_account_id.is_some() {
                    return false;
                }
                self.payee_account_id.clone_from(&source.payee_account_id);
            }
        }
        self.updated_at = self.updated_at.max(source.updated_at);
        true
    }
}
