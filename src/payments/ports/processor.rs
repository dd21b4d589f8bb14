//! Port for the external payment processor.

use crate::payments::domain::{
    ChargeId, HoldRequest, HoldSession, OnboardingLink, OnboardingUrls, PayeeAccountId,
    PayeeAccountRequest, PayeeAccountSnapshot, PaymentReference,
};
use async_trait::async_trait;
use thiserror::Error;

/// Result type for payment processor calls.
pub type PaymentProcessorResult<T> = Result<T, PaymentProcessorError>;

/// Operations the marketplace needs from a payment processor.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Creates a connected payee account.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentProcessorError`] when the processor rejects the
    /// request or cannot be reached.
    async fn create_payee_account(
        &self,
        request: &PayeeAccountRequest,
    ) -> PaymentProcessorResult<PayeeAccountId>;

    /// Creates a hosted onboarding link for an account.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentProcessorError`] on processor failure.
    async fn create_onboarding_link(
        &self,
        account: &PayeeAccountId,
        urls: &OnboardingUrls,
    ) -> PaymentProcessorResult<OnboardingLink>;

    /// Fetches an account's capability flags.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentProcessorError`] on processor failure.
    async fn retrieve_payee_account(
        &self,
        account: &PayeeAccountId,
    ) -> PaymentProcessorResult<PayeeAccountSnapshot>;

    /// Opens a checkout session that captures funds into escrow.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentProcessorError`] on processor failure.
    async fn create_hold(&self, request: &HoldRequest) -> PaymentProcessorResult<HoldSession>;

    /// Looks up the charge behind a captured payment.
    ///
    /// Returns `None` when the payment has no charge yet.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentProcessorError`] on processor failure.
    async fn latest_charge(
        &self,
        payment: &PaymentReference,
    ) -> PaymentProcessorResult<Option<ChargeId>>;
}

/// Errors returned by payment processor adapters.
#[derive(Debug, Clone, Error)]
pub enum PaymentProcessorError {
    /// The processor could not be reached or timed out.
    #[error("payment processor unavailable: {0}")]
    Unavailable(String),

    /// The processor refused the request.
    #[error("payment processor rejected the request ({status}): {message}")]
    Rejected {
        /// HTTP status returned by the processor.
        status: u16,
        /// Processor-supplied message.
        message: String,
    },

    /// The processor answered with something that could not be interpreted.
    #[error("unexpected payment processor response: {0}")]
    UnexpectedResponse(String),
}
