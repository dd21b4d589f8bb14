//! Builds and opens escrowed checkout sessions for hires, extra work and
//! tips.

use crate::billing::domain::ExtraWorkRequest;
use crate::payments::domain::{
    FeeSplit, HoldMetadata, HoldRequest, HoldSession, HoldTransfer, Money, PayeeAccountId,
};
use crate::payments::ports::{PaymentProcessor, PaymentProcessorResult};
use crate::task::domain::Task;
use crate::ids::UserId;
use std::sync::Arc;
use tracing::{info, warn};

/// Redirect bases and currency for checkout sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSettings {
    frontend_url: String,
    app_url: String,
    currency: String,
}

impl CheckoutSettings {
    /// Creates settings from the frontend and app base URLs.
    #[must_use]
    pub fn new(
        frontend_url: impl Into<String>,
        app_url: impl Into<String>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            frontend_url: trim_base(frontend_url.into()),
            app_url: trim_base(app_url.into()),
            currency: currency.into().trim().to_lowercase(),
        }
    }

    /// Returns the frontend base URL.
    #[must_use]
    pub fn frontend_url(&self) -> &str {
        &self.frontend_url
    }

    /// Returns the app base URL.
    #[must_use]
    pub fn app_url(&self) -> &str {
        &self.app_url
    }

    /// Returns the lowercase currency code.
    #[must_use]
    pub fn currency(&self) -> &str {
        &self.currency
    }
}

fn trim_base(url: String) -> String {
    url.trim().trim_end_matches('/').to_owned()
}

/// Opens escrowed checkout sessions through the payment processor.
pub struct EscrowCheckout<P>
where
    P: PaymentProcessor + ?Sized,
{
    processor: Arc<P>,
    settings: CheckoutSettings,
}

impl<P> Clone for EscrowCheckout<P>
where
    P: PaymentProcessor + ?Sized,
{
    fn clone(&self) -> Self {
        Self {
            processor: Arc::clone(&self.processor),
            settings: self.settings.clone(),
        }
    }
}

impl<P> EscrowCheckout<P>
where
    P: PaymentProcessor + ?Sized,
{
    /// Creates a checkout adapter.
    #[must_use]
    pub const fn new(processor: Arc<P>, settings: CheckoutSettings) -> Self {
        Self {
            processor,
            settings,
        }
    }

    /// Returns the settings.
    #[must_use]
    pub const fn settings(&self) -> &CheckoutSettings {
        &self.settings
    }

    /// Hold for hiring `helper_id` on `task`, split per `split`.
    #[must_use]
    pub fn hire_request(
        &self,
        task: &Task,
        helper_id: UserId,
        destination: PayeeAccountId,
        split: FeeSplit,
    ) -> HoldRequest {
        HoldRequest {
            amount: split.total,
            currency: self.settings.currency.clone(),
            product_name: task.title().to_owned(),
            description: task.description().unwrap_or("Task payment").to_owned(),
            transfer: Some(HoldTransfer {
                destination,
                platform_fee: Some(split.platform_fee),
            }),
            metadata: HoldMetadata::hire(task.id(), task.poster_id(), helper_id),
            success_url: format!(
                "{}/payment/success?session_id={{CHECKOUT_SESSION_ID}}",
                self.settings.frontend_url
            ),
            cancel_url: format!(
                "{}/payment/cancel?task_id={}",
                self.settings.frontend_url,
                task.id()
            ),
        }
    }

    /// Hold for an accepted extra-work request. Without a payee account the
    /// full amount stays with the platform and no fee is carved out.
    #[must_use]
    pub fn extra_work_request(
        &self,
        task: &Task,
        request: &ExtraWorkRequest,
        destination: Option<PayeeAccountId>,
        split: FeeSplit,
    ) -> HoldRequest {
        HoldRequest {
            amount: request.amount(),
            currency: self.settings.currency.clone(),
            product_name: format!("Extra Work: {}", task.title()),
            description: request.reason().chars().take(500).collect(),
            transfer: destination.map(|account| HoldTransfer {
                destination: account,
                platform_fee: Some(split.platform_fee),
            }),
            metadata: HoldMetadata::extra_work(task.id(), request.id()),
            success_url: format!("{}/task/{}?extra_paid=true", self.settings.app_url, task.id()),
            cancel_url: format!(
                "{}/task/{}?extra_cancelled=true",
                self.settings.app_url,
                task.id()
            ),
        }
    }

    /// Hold for a tip. Tips carry no platform fee.
    #[must_use]
    pub fn tip_request(
        &self,
        task: &Task,
        amount: Money,
        destination: Option<PayeeAccountId>,
    ) -> HoldRequest {
        HoldRequest {
            amount,
            currency: self.settings.currency.clone(),
            product_name: format!("Tip for: {}", task.title()),
            description: "Thank you tip for a job well done!".to_owned(),
            transfer: destination.map(|account| HoldTransfer {
                destination: account,
                platform_fee: None,
            }),
            metadata: HoldMetadata::tip(task.id(), amount),
            success_url: format!("{}/task/{}?tip_paid=true", self.settings.app_url, task.id()),
            cancel_url: format!(
                "{}/task/{}?tip_cancelled=true",
                self.settings.app_url,
                task.id()
            ),
        }
    }

    /// Opens the checkout session for `request`.
    ///
    /// # Errors
    ///
    /// Returns the processor error unchanged.
    pub async fn open(&self, request: &HoldRequest) -> PaymentProcessorResult<HoldSession> {
        let purpose = request.metadata.purpose.as_str();
        let task_id = request.metadata.task_id;
        match self.processor.create_hold(request).await {
            Ok(session) => {
                info!(
                    %task_id,
                    purpose,
                    session_id = %session.id,
                    amount_cents = request.amount.cents(),
                    "checkout session opened"
                );
                Ok(session)
            }
            Err(err) => {
                warn!(%task_id, purpose, error = %err, "checkout session failed");
                Err(err)
            }
        }
    }
}
