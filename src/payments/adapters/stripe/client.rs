//! HTTP client for the processor's REST API.

use super::form::{self, FormBody};
use crate::payments::domain::{
    ChargeId, HoldRequest, HoldSession, HoldSessionId, OnboardingLink, OnboardingUrls,
    PayeeAccountId, PayeeAccountRequest, PayeeAccountSnapshot, PaymentReference,
};
use crate::payments::ports::{PaymentProcessor, PaymentProcessorError, PaymentProcessorResult};
use async_trait::async_trait;
use reqwest::{Client, Response, header};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Connection settings for [`StripeClient`].
#[derive(Clone)]
pub struct StripeSettings {
    /// API base URL, e.g. `https://api.stripe.com/v1`.
    pub api_base: String,
    /// Secret API key.
    pub secret_key: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl fmt::Debug for StripeSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StripeSettings")
            .field("api_base", &self.api_base)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// [`PaymentProcessor`] backed by the Stripe REST API.
#[derive(Clone)]
pub struct StripeClient {
    http: Client,
    api_base: String,
    secret_key: String,
}

impl fmt::Debug for StripeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StripeClient")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct AccountResponse {
    id: String,
    #[serde(default)]
    details_submitted: bool,
    #[serde(default)]
    charges_enabled: bool,
    #[serde(default)]
    payouts_enabled: bool,
}

#[derive(Debug, Deserialize)]
struct AccountLinkResponse {
    url: String,
}

#[derive(Debug, Deserialize)]
struct CheckoutSessionResponse {
    id: String,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ExpandableId {
    Id(String),
    Object { id: String },
}

impl ExpandableId {
    fn into_id(self) -> String {
        match self {
            Self::Id(id) | Self::Object { id } => id,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PaymentIntentResponse {
    latest_charge: Option<ExpandableId>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

fn transport_error(err: &reqwest::Error) -> PaymentProcessorError {
    if err.is_timeout() {
        PaymentProcessorError::Unavailable("request timed out".to_owned())
    } else {
        PaymentProcessorError::Unavailable(err.to_string())
    }
}

fn unexpected(err: impl fmt::Display) -> PaymentProcessorError {
    PaymentProcessorError::UnexpectedResponse(err.to_string())
}

impl StripeClient {
    /// Builds a client with the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentProcessorError::Unavailable`] when the HTTP client
    /// cannot be constructed.
    pub fn new(settings: StripeSettings) -> PaymentProcessorResult<Self> {
        let http = Client::builder()
            .timeout(settings.timeout)
            .user_agent(concat!("taskmarket/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| transport_error(&err))?;
        Ok(Self {
            http,
            api_base: settings.api_base.trim_end_matches('/').to_owned(),
            secret_key: settings.secret_key,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }

    async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &FormBody,
    ) -> PaymentProcessorResult<T> {
        debug!(path, "processor POST");
        let response = self
            .http
            .post(self.endpoint(path))
            .bearer_auth(&self.secret_key)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body.encode())
            .send()
            .await
            .map_err(|err| transport_error(&err))?;
        Self::decode(response).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> PaymentProcessorResult<T> {
        debug!(path, "processor GET");
        let response = self
            .http
            .get(self.endpoint(path))
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|err| transport_error(&err))?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> PaymentProcessorResult<T> {
        let status = response.status();
        let text = response.text().await.map_err(|err| transport_error(&err))?;
        if status.is_success() {
            return serde_json::from_str(&text).map_err(unexpected);
        }
        let message = serde_json::from_str::<ErrorEnvelope>(&text)
            .ok()
            .and_then(|envelope| envelope.error.message)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_owned());
        Err(PaymentProcessorError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl PaymentProcessor for StripeClient {
    async fn create_payee_account(
        &self,
        request: &PayeeAccountRequest,
    ) -> PaymentProcessorResult<PayeeAccountId> {
        let account: AccountResponse = self
            .post_form("accounts", &form::payee_account(request))
            .await?;
        PayeeAccountId::new(account.id).map_err(unexpected)
    }

    async fn create_onboarding_link(
        &self,
        account: &PayeeAccountId,
        urls: &OnboardingUrls,
    ) -> PaymentProcessorResult<OnboardingLink> {
        let link: AccountLinkResponse = self
            .post_form("account_links", &form::onboarding_link(account, urls))
            .await?;
        Ok(OnboardingLink { url: link.url })
    }

    async fn retrieve_payee_account(
        &self,
        account: &PayeeAccountId,
    ) -> PaymentProcessorResult<PayeeAccountSnapshot> {
        let fetched: AccountResponse = self.get(&format!("accounts/{account}")).await?;
        Ok(PayeeAccountSnapshot {
            details_submitted: fetched.details_submitted,
            charges_enabled: fetched.charges_enabled,
            payouts_enabled: fetched.payouts_enabled,
        })
    }

    async fn create_hold(&self, request: &HoldRequest) -> PaymentProcessorResult<HoldSession> {
        let session: CheckoutSessionResponse = self
            .post_form("checkout/sessions", &form::checkout_session(request))
            .await?;
        let checkout_url = session
            .url
            .ok_or_else(|| unexpected("checkout session has no url"))?;
        Ok(HoldSession {
            id: HoldSessionId::new(session.id).map_err(unexpected)?,
            checkout_url,
        })
    }

    async fn latest_charge(
        &self,
        payment: &PaymentReference,
    ) -> PaymentProcessorResult<Option<ChargeId>> {
        let intent: PaymentIntentResponse = self.get(&format!("payment_intents/{payment}")).await?;
        intent
            .latest_charge
            .map(|charge| ChargeId::new(charge.into_id()).map_err(unexpected))
            .transpose()
    }
}
