//! Service wiring over one store, one processor and one clock.

use crate::activity::services::ActivityRecorder;
use crate::billing::services::BillingService;
use crate::chat::services::ChatService;
use crate::config::{ConfigError, MarketplaceConfig};
use crate::dispute::services::DisputeLedgerService;
use crate::identity::domain::SessionTokenSigner;
use crate::identity::ports::OtpNotifier;
use crate::identity::services::IdentityService;
use crate::offer::services::OfferLedgerService;
use crate::payments::domain::OnboardingUrls;
use crate::payments::ports::PaymentProcessor;
use crate::payments::services::{CheckoutSettings, EscrowCheckout, PayeeGatewayService};
use crate::persistence::MarketplaceStore;
use crate::settlement::services::SettlementService;
use crate::task::domain::PricingPolicy;
use crate::task::services::{PricePromptSweep, TaskLifecycleService};
use mockable::Clock;
use std::sync::Arc;

/// Values the services need beyond their collaborators.
#[derive(Debug, Clone)]
pub struct MarketplaceSettings {
    /// Fee rate and price floors.
    pub pricing: PricingPolicy,
    /// Checkout redirect bases and currency.
    pub checkout: CheckoutSettings,
    /// Payee onboarding redirects.
    pub onboarding: OnboardingUrls,
    /// Session token signer.
    pub signer: SessionTokenSigner,
}

impl MarketplaceSettings {
    /// Derives settings from loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when `SESSION_SECRET` is unset.
    pub fn from_config(config: &MarketplaceConfig) -> Result<Self, ConfigError> {
        let secret = config.require_session_secret()?;
        Ok(Self {
            pricing: config.pricing,
            checkout: config.checkout_settings(),
            onboarding: config.onboarding_urls(),
            signer: SessionTokenSigner::new(secret.as_bytes(), config.session_ttl),
        })
    }
}

/// Every marketplace service, sharing one store, processor and clock.
pub struct Marketplace<S, P, N, C>
where
    S: MarketplaceStore,
    P: PaymentProcessor,
    N: OtpNotifier,
    C: Clock + Send + Sync,
{
    identity: IdentityService<S, N, C>,
    payees: PayeeGatewayService<S, P, C>,
    tasks: TaskLifecycleService<S, P, C>,
    offers: OfferLedgerService<S, C>,
    chat: ChatService<S, C>,
    billing: BillingService<S, P, C>,
    disputes: DisputeLedgerService<S, C>,
    settlement: SettlementService<S, P, C>,
    activity: ActivityRecorder<S>,
    sweep: PricePromptSweep<S, C>,
}

impl<S, P, N, C> Marketplace<S, P, N, C>
where
    S: MarketplaceStore,
    P: PaymentProcessor,
    N: OtpNotifier,
    C: Clock + Send + Sync,
{
    /// Wires every service.
    #[must_use]
    pub fn new(
        store: Arc<S>,
        processor: Arc<P>,
        notifier: Arc<N>,
        clock: Arc<C>,
        settings: MarketplaceSettings,
    ) -> Self {
        let checkout = EscrowCheckout::new(Arc::clone(&processor), settings.checkout);
        let payees = PayeeGatewayService::new(
            Arc::clone(&store),
            Arc::clone(&processor),
            Arc::clone(&clock),
            settings.onboarding,
        );
        Self {
            identity: IdentityService::new(
                Arc::clone(&store),
                notifier,
                Arc::clone(&clock),
                settings.signer,
            ),
            tasks: TaskLifecycleService::new(
                Arc::clone(&store),
                Arc::clone(&clock),
                settings.pricing,
                checkout.clone(),
                payees.clone(),
            ),
            payees,
            offers: OfferLedgerService::new(Arc::clone(&store), Arc::clone(&clock)),
            chat: ChatService::new(Arc::clone(&store), Arc::clone(&clock)),
            billing: BillingService::new(
                Arc::clone(&store),
                Arc::clone(&clock),
                settings.pricing,
                checkout,
            ),
            disputes: DisputeLedgerService::new(Arc::clone(&store), Arc::clone(&clock)),
            settlement: SettlementService::new(
                Arc::clone(&store),
                processor,
                Arc::clone(&clock),
            ),
            activity: ActivityRecorder::new(Arc::clone(&store)),
            sweep: PricePromptSweep::new(store, clock),
        }
    }

    /// Login codes, sessions and profiles.
    #[must_use]
    pub const fn identity(&self) -> &IdentityService<S, N, C> {
        &self.identity
    }

    /// Payee onboarding and status.
    #[must_use]
    pub const fn payees(&self) -> &PayeeGatewayService<S, P, C> {
        &self.payees
    }

    /// Task lifecycle.
    #[must_use]
    pub const fn tasks(&self) -> &TaskLifecycleService<S, P, C> {
        &self.tasks
    }

    /// Offers.
    #[must_use]
    pub const fn offers(&self) -> &OfferLedgerService<S, C> {
        &self.offers
    }

    /// Chat threads and messages.
    #[must_use]
    pub const fn chat(&self) -> &ChatService<S, C> {
        &self.chat
    }

    /// Extra work and tips.
    #[must_use]
    pub const fn billing(&self) -> &BillingService<S, P, C> {
        &self.billing
    }

    /// Dispute evidence and resolution.
    #[must_use]
    pub const fn disputes(&self) -> &DisputeLedgerService<S, C> {
        &self.disputes
    }

    /// Capture handling.
    #[must_use]
    pub const fn settlement(&self) -> &SettlementService<S, P, C> {
        &self.settlement
    }

    /// Activity log.
    #[must_use]
    pub const fn activity(&self) -> &ActivityRecorder<S> {
        &self.activity
    }

    /// Price prompt sweep.
    #[must_use]
    pub const fn sweep(&self) -> &PricePromptSweep<S, C> {
        &self.sweep
    }
}
