//! Escrow holds: the checkout sessions that capture a payer's funds and the
//! capture notifications that come back for them.

use super::{FeeSplit, Money, PayeeAccountId, PaymentsDomainError};
use crate::ids::{ExtraWorkId, TaskId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

macro_rules! define_reference {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps a processor-issued reference.
            ///
            /// # Errors
            ///
            /// Returns [`PaymentsDomainError::EmptyReference`] when the value
            /// is blank.
            pub fn new(value: impl Into<String>) -> Result<Self, PaymentsDomainError> {
                let raw = value.into();
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Err(PaymentsDomainError::EmptyReference($label));
                }
                Ok(Self(trimmed.to_owned()))
            }

            /// Returns the reference as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

define_reference!(
    /// Processor identifier of a checkout (hold) session.
    HoldSessionId,
    "hold session id"
);
define_reference!(
    /// Processor identifier of the payment created by a captured hold.
    PaymentReference,
    "payment reference"
);
define_reference!(
    /// Processor identifier of the charge backing a captured payment.
    ChargeId,
    "charge id"
);

/// What a hold pays for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoldPurpose {
    /// The task price, paid when the poster hires a helper.
    Hire,
    /// An accepted extra-work request.
    ExtraWork,
    /// A tip after completion.
    Tip,
}

impl HoldPurpose {
    /// Returns the metadata discriminator for this purpose.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hire => "hire",
            Self::ExtraWork => "extra_work",
            Self::Tip => "tip",
        }
    }

    /// Interprets a metadata discriminator. Anything other than a tip or an
    /// extra-work marker is a hire.
    #[must_use]
    pub fn from_discriminator(value: Option<&str>) -> Self {
        match value.map(|raw| raw.trim().to_ascii_lowercase()).as_deref() {
            Some("tip") => Self::Tip,
            Some("extra_work") => Self::ExtraWork,
            _ => Self::Hire,
        }
    }
}

impl fmt::Display for HoldPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Correlation data attached to a hold and echoed back on capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoldMetadata {
    /// What the hold pays for.
    pub purpose: HoldPurpose,
    /// Task the hold belongs to.
    pub task_id: TaskId,
    /// Paying poster.
    pub poster_id: Option<UserId>,
    /// Helper being paid.
    pub helper_id: Option<UserId>,
    /// Extra-work request being paid, for extra-work holds.
    pub extra_work_id: Option<ExtraWorkId>,
    /// Tip amount, for tip holds.
    pub tip_amount: Option<Money>,
}

impl HoldMetadata {
    /// Metadata for a hire hold.
    #[must_use]
    pub const fn hire(task_id: TaskId, poster_id: UserId, helper_id: UserId) -> Self {
        Self {
            purpose: HoldPurpose::Hire,
            task_id,
            poster_id: Some(poster_id),
            helper_id: Some(helper_id),
            extra_work_id: None,
            tip_amount: None,
        }
    }

    /// Metadata for an extra-work hold.
    #[must_use]
    pub const fn extra_work(task_id: TaskId, extra_work_id: ExtraWorkId) -> Self {
        Self {
            purpose: HoldPurpose::ExtraWork,
            task_id,
            poster_id: None,
            helper_id: None,
            extra_work_id: Some(extra_work_id),
            tip_amount: None,
        }
    }

    /// Metadata for a tip hold.
    #[must_use]
    pub const fn tip(task_id: TaskId, amount: Money) -> Self {
        Self {
            purpose: HoldPurpose::Tip,
            task_id,
            poster_id: None,
            helper_id: None,
            extra_work_id: None,
            tip_amount: Some(amount),
        }
    }

    /// Flattens the metadata into the processor's string map.
    #[must_use]
    pub fn to_pairs(&self) -> BTreeMap<String, String> {
        let mut pairs = BTreeMap::new();
        pairs.insert("type".to_owned(), self.purpose.as_str().to_owned());
        pairs.insert("taskId".to_owned(), self.task_id.to_string());
        if let Some(poster_id) = self.poster_id {
            pairs.insert("posterId".to_owned(), poster_id.to_string());
        }
        if let Some(helper_id) = self.helper_id {
            pairs.insert("helperId".to_owned(), helper_id.to_string());
        }
        if let Some(extra_work_id) = self.extra_work_id {
            pairs.insert("extraWorkRequestId".to_owned(), extra_work_id.to_string());
        }
        if let Some(amount) = self.tip_amount {
            pairs.insert("tipAmount".to_owned(), amount.to_decimal_string());
        }
        pairs
    }

    /// Rebuilds metadata from the processor's string map.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentsDomainError::MissingMetadata`] when a key the
    /// purpose needs is absent and [`PaymentsDomainError::InvalidMetadata`]
    /// when a value does not parse.
    pub fn from_pairs(pairs: &BTreeMap<String, String>) -> Result<Self, PaymentsDomainError> {
        let purpose = HoldPurpose::from_discriminator(pairs.get("type").map(String::as_str));
        let task_id = required(pairs, "taskId")?;
        let poster_id = optional(pairs, "posterId")?;
        let helper_id = optional(pairs, "helperId")?;
        let extra_work_id = optional(pairs, "extraWorkRequestId")?;
        let tip_amount = optional(pairs, "tipAmount")?;

        match purpose {
            HoldPurpose::Hire if poster_id.is_none() => {
                return Err(PaymentsDomainError::MissingMetadata("posterId"));
            }
            HoldPurpose::Hire if helper_id.is_none() => {
                return Err(PaymentsDomainError::MissingMetadata("helperId"));
            }
            HoldPurpose::ExtraWork if extra_work_id.is_none() => {
                return Err(PaymentsDomainError::MissingMetadata("extraWorkRequestId"));
            }
            HoldPurpose::Tip if tip_amount.is_none() => {
                return Err(PaymentsDomainError::MissingMetadata("tipAmount"));
            }
            _ => {}
        }

        Ok(Self {
            purpose,
            task_id,
            poster_id,
            helper_id,
            extra_work_id,
            tip_amount,
        })
    }
}

fn required<T: std::str::FromStr>(
    pairs: &BTreeMap<String, String>,
    key: &'static str,
) -> Result<T, PaymentsDomainError> {
    optional(pairs, key)?.ok_or(PaymentsDomainError::MissingMetadata(key))
}

fn optional<T: std::str::FromStr>(
    pairs: &BTreeMap<String, String>,
    key: &'static str,
) -> Result<Option<T>, PaymentsDomainError> {
    pairs
        .get(key)
        .filter(|value| !value.trim().is_empty())
        .map(|value| {
            value
                .trim()
                .parse::<T>()
                .map_err(|_| PaymentsDomainError::InvalidMetadata {
                    key,
                    value: value.clone(),
                })
        })
        .transpose()
}

/// Transfer routing for a hold: who receives the funds and what the
/// platform keeps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoldTransfer {
    /// Payee account receiving the transfer.
    pub destination: PayeeAccountId,
    /// Platform fee withheld, if any.
    pub platform_fee: Option<Money>,
}

/// Everything the processor needs to open a checkout session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoldRequest {
    /// Amount to capture.
    pub amount: Money,
    /// ISO currency code (lowercase).
    pub currency: String,
    /// Line-item title shown to the payer.
    pub product_name: String,
    /// Line-item description shown to the payer.
    pub description: String,
    /// Transfer routing; `None` leaves the funds with the platform.
    pub transfer: Option<HoldTransfer>,
    /// Correlation data echoed on capture.
    pub metadata: HoldMetadata,
    /// Redirect after a successful checkout.
    pub success_url: String,
    /// Redirect after an abandoned checkout.
    pub cancel_url: String,
}

impl HoldRequest {
    /// The fee split this request implies.
    #[must_use]
    pub fn split(&self) -> FeeSplit {
        match self.transfer.as_ref().and_then(|transfer| transfer.platform_fee) {
            Some(fee) => FeeSplit {
                total: self.amount,
                platform_fee: fee,
                payee_amount: self.amount.saturating_sub(fee),
            },
            None => FeeSplit::without_fee(self.amount),
        }
    }
}

/// A checkout session opened by the processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoldSession {
    /// Session identifier used to correlate the capture.
    pub id: HoldSessionId,
    /// URL the payer is redirected to.
    pub checkout_url: String,
}

/// A verified notification that a hold's funds were captured.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureEvent {
    /// Processor event identifier.
    pub event_id: String,
    /// Session that was captured.
    pub session_id: HoldSessionId,
    /// Payment created by the capture, when reported.
    pub payment: Option<PaymentReference>,
    /// Correlation metadata.
    pub metadata: HoldMetadata,
    /// Full event payload, kept for reconciliation.
    pub payload: serde_json::Value,
}

/// Result of applying a capture to an aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureApplication {
    /// The capture changed state.
    Applied,
    /// The capture was already applied; nothing changed.
    Replayed,
}

/// A verified notification from the processor.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessorEvent {
    /// A checkout completed and its funds were captured.
    Capture(CaptureEvent),
    /// A completed checkout whose correlation metadata did not parse.
    Malformed {
        /// Processor event identifier.
        event_id: String,
        /// What was wrong with it.
        reason: String,
        /// Full event payload.
        payload: serde_json::Value,
    },
    /// Any other event type.
    Other {
        /// Processor event identifier.
        event_id: String,
        /// Processor event type.
        event_type: String,
    },
}
