//! Shared world state for hire flow BDD scenarios.

use crate::test_helpers::{Wired, wire};
use eyre::WrapErr;
use rstest::fixture;
use taskmarket::error::MarketplaceResult;
use taskmarket::ids::{TaskId, UserId};
use taskmarket::payments::domain::{HoldSessionId, Money, ProcessorEvent};
use taskmarket::task::domain::{Task, TaskCategory};
use taskmarket::task::services::{CreateTaskRequest, HireCheckout};

/// Scenario world for hire flow behaviour tests.
pub struct HireFlowWorld {
    pub wired: Wired,
    pub poster: Option<UserId>,
    pub helper: Option<UserId>,
    pub task: Option<TaskId>,
    pub checkout: Option<HireCheckout>,
    pub last_result: Option<MarketplaceResult<Task>>,
}

impl HireFlowWorld {
    /// Creates a world over a freshly wired marketplace.
    #[must_use]
    pub fn new() -> Self {
        Self {
            wired: wire(),
            poster: None,
            helper: None,
            task: None,
            checkout: None,
            last_result: None,
        }
    }

    pub fn poster(&self) -> Result<UserId, eyre::Report> {
        self.poster
            .ok_or_else(|| eyre::eyre!("missing poster in scenario world"))
    }

    pub fn helper(&self) -> Result<UserId, eyre::Report> {
        self.helper
            .ok_or_else(|| eyre::eyre!("missing helper in scenario world"))
    }

    pub fn task(&self) -> Result<TaskId, eyre::Report> {
        self.task
            .ok_or_else(|| eyre::eyre!("missing task in scenario world"))
    }

    /// Signs `email` in and gives them a profile photo.
    pub async fn member(&self, email: &str) -> Result<UserId, eyre::Report> {
        let identity = self.wired.market.identity();
        identity
            .request_code(email)
            .await
            .wrap_err("request login code")?;
        let code = self
            .wired
            .notifier
            .latest_code(email)
            .ok_or_else(|| eyre::eyre!("no code delivered to {email}"))?;
        let session = identity
            .verify_code(email, &code)
            .await
            .wrap_err("verify login code")?;
        let user_id = session.user.id();
        identity
            .update_photo(user_id, user_id, "https://img.test/face.jpg")
            .await
            .wrap_err("set profile photo")?;
        Ok(user_id)
    }

    /// Links a payee account for `user_id` and enables payouts on it.
    pub async fn make_payout_ready(&self, user_id: UserId) -> Result<(), eyre::Report> {
        self.wired
            .market
            .payees()
            .start_onboarding(user_id)
            .await
            .wrap_err("start payee onboarding")?;
        let user = self
            .wired
            .market
            .identity()
            .current_user(user_id)
            .await
            .wrap_err("load payee")?;
        let account = user
            .payee_account_id()
            .ok_or_else(|| eyre::eyre!("payee account not linked"))?;
        self.wired.processor.enable_payouts(account);
        Ok(())
    }

    pub async fn post_task(&mut self, dollars: i64) -> Result<(), eyre::Report> {
        let request = CreateTaskRequest::new(
            "Patch a drywall hole",
            TaskCategory::RepairsGeneral,
            "94110",
            Money::from_units(dollars),
        );
        let task = self
            .wired
            .market
            .tasks()
            .create_task(self.poster()?, request)
            .await
            .wrap_err("post task")?;
        self.task = Some(task.id());
        Ok(())
    }

    pub async fn submit_offer(&self) -> Result<(), eyre::Report> {
        self.wired
            .market
            .offers()
            .submit(self.helper()?, self.task()?, None, None)
            .await
            .wrap_err("submit offer")?;
        Ok(())
    }

    pub async fn choose_helper(&mut self) -> Result<(), eyre::Report> {
        let checkout = self
            .wired
            .market
            .tasks()
            .choose_helper(self.poster()?, self.task()?, self.helper()?)
            .await
            .wrap_err("choose helper")?;
        self.checkout = Some(checkout);
        Ok(())
    }

    pub async fn confirm_checkout(&self) -> Result<(), eyre::Report> {
        let session: &HoldSessionId = &self
            .checkout
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing checkout in scenario world"))?
            .session
            .id;
        let event = self
            .wired
            .processor
            .capture(session)
            .ok_or_else(|| eyre::eyre!("processor does not know session {session}"))?;
        self.wired
            .market
            .settlement()
            .handle(ProcessorEvent::Capture(event))
            .await
            .wrap_err("settle capture")?;
        Ok(())
    }

    pub async fn current_task(&self) -> Result<Task, eyre::Report> {
        self.wired
            .market
            .tasks()
            .get_task(self.task()?)
            .await
            .wrap_err("load task")
    }
}

impl Default for HireFlowWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> HireFlowWorld {
    HireFlowWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
