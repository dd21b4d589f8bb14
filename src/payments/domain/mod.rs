//! Payment domain values: money, fee splits, payee accounts and holds.

mod error;
mod hold;
mod money;
mod payee;

pub use error::PaymentsDomainError;
pub use hold::{
    CaptureApplication, CaptureEvent, ChargeId, HoldMetadata, HoldPurpose, HoldRequest,
    HoldSession, HoldSessionId, HoldTransfer, PaymentReference, ProcessorEvent,
};
pub use money::{FeeRate, FeeSplit, Money, MoneyError};
pub use payee::{
    OnboardingLink, OnboardingUrls, PayeeAccountId, PayeeAccountRequest, PayeeAccountSnapshot,
    PayeeStatus,
};
