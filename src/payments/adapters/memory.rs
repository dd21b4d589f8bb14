//! Scriptable in-memory payment processor.

use crate::payments::domain::{
    CaptureEvent, ChargeId, HoldRequest, HoldSession, HoldSessionId, OnboardingLink,
    OnboardingUrls, PayeeAccountId, PayeeAccountRequest, PayeeAccountSnapshot, PaymentReference,
};
use crate::payments::ports::{PaymentProcessor, PaymentProcessorError, PaymentProcessorResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

#[derive(Debug, Default)]
struct ProcessorState {
    accounts: HashMap<PayeeAccountId, PayeeAccountSnapshot>,
    holds: Vec<(HoldSession, HoldRequest)>,
    charges: HashMap<PaymentReference, ChargeId>,
    next_failure: Option<PaymentProcessorError>,
}

/// Processor fake that records holds and lets tests simulate captures.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentProcessor {
    state: Arc<Mutex<ProcessorState>>,
}

fn reference(prefix: &str) -> String {
    format!("{prefix}_{}", Uuid::new_v4().simple())
}

fn invalid(err: impl std::fmt::Display) -> PaymentProcessorError {
    PaymentProcessorError::UnexpectedResponse(err.to_string())
}

impl InMemoryPaymentProcessor {
    /// Creates a processor with no accounts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> PaymentProcessorResult<MutexGuard<'_, ProcessorState>> {
        self.state
            .lock()
            .map_err(|err| PaymentProcessorError::Unavailable(err.to_string()))
    }

    fn take_failure(&self) -> PaymentProcessorResult<MutexGuard<'_, ProcessorState>> {
        let mut state = self.lock()?;
        match state.next_failure.take() {
            Some(failure) => Err(failure),
            None => Ok(state),
        }
    }

    /// Makes the next processor call fail with `failure`.
    pub fn fail_next(&self, failure: PaymentProcessorError) {
        if let Ok(mut state) = self.lock() {
            state.next_failure = Some(failure);
        }
    }

    /// Registers or replaces an account's capability flags.
    pub fn set_account(&self, account: &PayeeAccountId, snapshot: PayeeAccountSnapshot) {
        if let Ok(mut state) = self.lock() {
            state.accounts.insert(account.clone(), snapshot);
        }
    }

    /// Marks an account fully onboarded with payouts enabled.
    pub fn enable_payouts(&self, account: &PayeeAccountId) {
        self.set_account(
            account,
            PayeeAccountSnapshot {
                details_submitted: true,
                charges_enabled: true,
                payouts_enabled: true,
            },
        );
    }

    /// Returns every hold opened so far, oldest first.
    #[must_use]
    pub fn holds(&self) -> Vec<(HoldSession, HoldRequest)> {
        self.lock()
            .map(|state| state.holds.clone())
            .unwrap_or_default()
    }

    /// Simulates the payer completing the checkout for `session_id`.
    ///
    /// Returns the capture notification the processor would deliver, or
    /// `None` for an unknown session.
    #[must_use]
    pub fn capture(&self, session_id: &HoldSessionId) -> Option<CaptureEvent> {
        let mut state = self.lock().ok()?;
        let request = state
            .holds
            .iter()
            .find(|(session, _)| &session.id == session_id)
            .map(|(_, request)| request.clone())?;
        let payment = PaymentReference::new(reference("pi")).ok()?;
        let charge = ChargeId::new(reference("ch")).ok()?;
        state.charges.insert(payment.clone(), charge);
        let event_id = reference("evt");
        Some(CaptureEvent {
            payload: serde_json::json!({
                "id": event_id,
                "type": "checkout.session.completed",
                "data": { "object": {
                    "id": session_id.as_str(),
                    "payment_intent": payment.as_str(),
                    "metadata": request.metadata.to_pairs(),
                }},
            }),
            event_id,
            session_id: session_id.clone(),
            payment: Some(payment),
            metadata: request.metadata,
        })
    }
}

#[async_trait]
impl PaymentProcessor for InMemoryPaymentProcessor {
    async fn create_payee_account(
        &self,
        _request: &PayeeAccountRequest,
    ) -> PaymentProcessorResult<PayeeAccountId> {
        let mut state = self.take_failure()?;
        let account = PayeeAccountId::new(reference("acct")).map_err(invalid)?;
        state
            .accounts
            .insert(account.clone(), PayeeAccountSnapshot::default());
        Ok(account)
    }

    async fn create_onboarding_link(
        &self,
        account: &PayeeAccountId,
        urls: &OnboardingUrls,
    ) -> PaymentProcessorResult<OnboardingLink> {
        let state = self.take_failure()?;
        if !state.accounts.contains_key(account) {
            return Err(PaymentProcessorError::Rejected {
                status: 404,
                message: format!("no such account: {account}"),
            });
        }
        Ok(OnboardingLink {
            url: format!("https://connect.test/setup/{account}?return={}", urls.return_url),
        })
    }

    async fn retrieve_payee_account(
        &self,
        account: &PayeeAccountId,
    ) -> PaymentProcessorResult<PayeeAccountSnapshot> {
        let state = self.take_failure()?;
        state
            .accounts
            .get(account)
            .copied()
            .ok_or_else(|| PaymentProcessorError::Rejected {
                status: 404,
                message: format!("no such account: {account}"),
            })
    }

    async fn create_hold(&self, request: &HoldRequest) -> PaymentProcessorResult<HoldSession> {
        let mut state = self.take_failure()?;
        let id = HoldSessionId::new(reference("cs")).map_err(invalid)?;
        let session = HoldSession {
            checkout_url: format!("https://checkout.test/pay/{id}"),
            id,
        };
        state.holds.push((session.clone(), request.clone()));
        Ok(session)
    }

    async fn latest_charge(
        &self,
        payment: &PaymentReference,
    ) -> PaymentProcessorResult<Option<ChargeId>> {
        let state = self.take_failure()?;
        Ok(state.charges.get(payment).cloned())
    }
}
