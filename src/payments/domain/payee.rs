//! Payee accounts at the payment processor.

use super::PaymentsDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Processor identifier of a connected payee account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PayeeAccountId(String);

impl PayeeAccountId {
    /// Wraps a processor account identifier.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentsDomainError::EmptyReference`] when the value is blank.
    pub fn new(value: impl Into<String>) -> Result<Self, PaymentsDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PaymentsDomainError::EmptyReference("payee account id"));
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PayeeAccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Capability flags reported by the processor for a payee account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PayeeAccountSnapshot {
    /// The payee finished submitting onboarding details.
    pub details_submitted: bool,
    /// The account may accept charges.
    pub charges_enabled: bool,
    /// The account may receive payouts.
    pub payouts_enabled: bool,
}

/// Payee readiness as presented to the account owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayeeStatus {
    /// A processor account exists.
    pub has_account: bool,
    /// Onboarding details were submitted.
    pub is_onboarded: bool,
    /// Charges are enabled.
    pub charges_enabled: bool,
    /// Payouts are enabled.
    pub payouts_enabled: bool,
}

impl PayeeStatus {
    /// Status for a user with no processor account.
    #[must_use]
    pub const fn no_account() -> Self {
        Self {
            has_account: false,
            is_onboarded: false,
            charges_enabled: false,
            payouts_enabled: false,
        }
    }

    /// Status derived from a processor snapshot.
    #[must_use]
    pub const fn from_snapshot(snapshot: PayeeAccountSnapshot) -> Self {
        Self {
            has_account: true,
            is_onboarded: snapshot.details_submitted,
            charges_enabled: snapshot.charges_enabled,
            payouts_enabled: snapshot.payouts_enabled,
        }
    }
}

/// Input for creating a payee account.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PayeeAccountRequest {
    /// Contact email for the account, when the user has one.
    pub email: Option<String>,
}

/// Redirect targets for hosted onboarding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnboardingUrls {
    /// Where the processor sends the payee if the link expires.
    pub refresh_url: String,
    /// Where the processor sends the payee after onboarding.
    pub return_url: String,
}

/// A hosted onboarding link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OnboardingLink {
    /// URL the payee should visit.
    pub url: String,
}
