//! Shared wiring for integration and behaviour tests: a settable clock and
//! a marketplace over the in-memory store and processor.

use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use mockable::Clock;
use std::sync::{Arc, Mutex};
use taskmarket::app::{Marketplace, MarketplaceSettings};
use taskmarket::identity::adapters::RecordingOtpNotifier;
use taskmarket::identity::domain::SessionTokenSigner;
use taskmarket::payments::adapters::InMemoryPaymentProcessor;
use taskmarket::payments::domain::OnboardingUrls;
use taskmarket::payments::services::CheckoutSettings;
use taskmarket::persistence::memory::InMemoryMarketplace;
use taskmarket::task::domain::PricingPolicy;

/// Clock whose time only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self
            .now
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        let start = Utc
            .with_ymd_and_hms(2025, 6, 2, 9, 0, 0)
            .single()
            .unwrap_or_else(Utc::now);
        Self {
            now: Mutex::new(start),
        }
    }
}

impl Clock for ManualClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self
            .now
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Marketplace type wired by [`wire`].
pub type TestMarketplace =
    Marketplace<InMemoryMarketplace, InMemoryPaymentProcessor, RecordingOtpNotifier, ManualClock>;

/// A wired marketplace plus handles on the collaborators tests steer.
pub struct Wired {
    pub market: Arc<TestMarketplace>,
    pub processor: Arc<InMemoryPaymentProcessor>,
    pub notifier: Arc<RecordingOtpNotifier>,
    pub clock: Arc<ManualClock>,
}

/// Builds a marketplace with default pricing and a 12-hour session TTL.
pub fn wire() -> Wired {
    let processor = Arc::new(InMemoryPaymentProcessor::new());
    let notifier = Arc::new(RecordingOtpNotifier::new());
    let clock = Arc::new(ManualClock::default());
    let settings = MarketplaceSettings {
        pricing: PricingPolicy::default(),
        checkout: CheckoutSettings::new("https://app.test", "https://api.test", "usd"),
        onboarding: OnboardingUrls {
            refresh_url: "https://app.test/payee/refresh".to_owned(),
            return_url: "https://app.test/payee/complete".to_owned(),
        },
        signer: SessionTokenSigner::new(b"integration-secret".to_vec(), Duration::hours(12)),
    };
    let market = Arc::new(Marketplace::new(
        Arc::new(InMemoryMarketplace::new()),
        Arc::clone(&processor),
        Arc::clone(&notifier),
        Arc::clone(&clock),
        settings,
    ));
    Wired {
        market,
        processor,
        notifier,
        clock,
    }
}
