//! Shared fixtures for unit tests: a settable clock and a fully wired
//! in-memory marketplace.

use crate::app::{Marketplace, MarketplaceSettings};
use crate::identity::adapters::RecordingOtpNotifier;
use crate::identity::domain::SessionTokenSigner;
use crate::identity::services::Session;
use crate::ids::{TaskId, UserId};
use crate::payments::adapters::InMemoryPaymentProcessor;
use crate::payments::domain::{HoldSessionId, Money, OnboardingUrls, ProcessorEvent};
use crate::payments::services::CheckoutSettings;
use crate::persistence::memory::InMemoryMarketplace;
use crate::settlement::domain::SettlementOutcome;
use crate::task::domain::{PricingPolicy, Task, TaskCategory};
use crate::task::services::CreateTaskRequest;
use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use mockable::Clock;
use std::sync::{Arc, Mutex};

/// Clock whose time only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn starting_at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("clock lock");
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::starting_at(
            Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0)
                .single()
                .expect("valid start time"),
        )
    }
}

impl Clock for ManualClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock")
    }
}

pub type TestMarketplace =
    Marketplace<InMemoryMarketplace, InMemoryPaymentProcessor, RecordingOtpNotifier, ManualClock>;

pub fn test_settings() -> MarketplaceSettings {
    MarketplaceSettings {
        pricing: PricingPolicy::default(),
        checkout: CheckoutSettings::new("https://app.test", "https://api.test", "usd"),
        onboarding: OnboardingUrls {
            refresh_url: "https://app.test/payee/refresh".to_owned(),
            return_url: "https://app.test/payee/complete".to_owned(),
        },
        signer: SessionTokenSigner::new(b"unit-test-secret".to_vec(), Duration::hours(12)),
    }
}

/// In-memory marketplace with handles on every collaborator.
pub struct Harness {
    pub store: Arc<InMemoryMarketplace>,
    pub processor: Arc<InMemoryPaymentProcessor>,
    pub notifier: Arc<RecordingOtpNotifier>,
    pub clock: Arc<ManualClock>,
    pub market: TestMarketplace,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryMarketplace::new());
        let processor = Arc::new(InMemoryPaymentProcessor::new());
        let notifier = Arc::new(RecordingOtpNotifier::new());
        let clock = Arc::new(ManualClock::default());
        let market = Marketplace::new(
            Arc::clone(&store),
            Arc::clone(&processor),
            Arc::clone(&notifier),
            Arc::clone(&clock),
            test_settings(),
        );
        Self {
            store,
            processor,
            notifier,
            clock,
            market,
        }
    }

    pub async fn sign_in(&self, email: &str) -> Session {
        self.market
            .identity()
            .request_code(email)
            .await
            .expect("code request should succeed");
        let code = self.notifier.latest_code(email).expect("code delivered");
        self.market
            .identity()
            .verify_code(email, &code)
            .await
            .expect("code verification should succeed")
    }

    /// Signs in and sets a profile photo.
    pub async fn member(&self, email: &str) -> UserId {
        let user_id = self.sign_in(email).await.user.id();
        self.market
            .identity()
            .update_photo(user_id, user_id, "https://img.test/face.jpg")
            .await
            .expect("photo update should succeed");
        user_id
    }

    /// A member whose payee account can receive payouts.
    pub async fn payee(&self, email: &str) -> UserId {
        let user_id = self.member(email).await;
        self.market
            .payees()
            .start_onboarding(user_id)
            .await
            .expect("onboarding should start");
        let account = self
            .market
            .identity()
            .current_user(user_id)
            .await
            .expect("user exists")
            .payee_account_id()
            .cloned()
            .expect("payee account linked");
        self.processor.enable_payouts(&account);
        user_id
    }

    pub async fn post_task(&self, poster: UserId, price: Money) -> Task {
        self.post(
            poster,
            CreateTaskRequest::new("Assemble a bookshelf", TaskCategory::FurnitureAssembly, "94110", price),
        )
        .await
    }

    pub async fn post(&self, poster: UserId, request: CreateTaskRequest) -> Task {
        self.market
            .tasks()
            .create_task(poster, request)
            .await
            .expect("task creation should succeed")
    }

    pub async fn capture(&self, session_id: &HoldSessionId) -> SettlementOutcome {
        let event = self.processor.capture(session_id).expect("known session");
        self.market
            .settlement()
            .handle(ProcessorEvent::Capture(event))
            .await
            .expect("capture should be handled")
    }

    /// Offer, choose and capture: leaves the task `accepted`.
    pub async fn hire(&self, poster: UserId, helper: UserId, task_id: TaskId) -> Task {
        self.market
            .offers()
            .submit(helper, task_id, None, None)
            .await
            .expect("offer should be accepted");
        let checkout = self
            .market
            .tasks()
            .choose_helper(poster, task_id, helper)
            .await
            .expect("hire checkout should open");
        self.capture(&checkout.session.id).await;
        self.market
            .tasks()
            .get_task(task_id)
            .await
            .expect("task exists")
    }
}
