//! Payee gateway tests.

use crate::error::{MarketplaceError, PayeeSetupError};
use crate::identity::domain::UserChange;
use crate::ids::UserId;
use crate::identity::ports::UserRepository;
use crate::payments::domain::{PayeeAccountId, PayeeStatus};
use crate::payments::ports::PaymentProcessorError;
use crate::testing::Harness;
use rstest::{fixture, rstest};

#[fixture]
fn harness() -> Harness {
    Harness::new()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn users_without_accounts_report_no_account(harness: Harness) {
    let user = harness.member("fresh@example.com").await;
    let payees = harness.market.payees();

    let known = payees.payee_status(user).await.expect("status reported");
    let unknown = payees
        .payee_status(UserId::new())
        .await
        .expect("status reported");

    assert_eq!(known, PayeeStatus::no_account());
    assert_eq!(unknown, PayeeStatus::no_account());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn onboarding_reuses_the_linked_account(harness: Harness) {
    let user = harness.member("payee@example.com").await;
    let payees = harness.market.payees();

    let first = payees
        .ensure_payee_account(user)
        .await
        .expect("account created");
    let link = payees
        .start_onboarding(user)
        .await
        .expect("link created");
    let status = payees.payee_status(user).await.expect("status reported");

    assert!(link.url.contains(first.as_str()));
    assert!(status.has_account);
    assert!(!status.payouts_enabled);
    let linked = harness
        .market
        .identity()
        .current_user(user)
        .await
        .expect("user exists");
    assert_eq!(linked.payee_account_id(), Some(&first));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn enabled_accounts_report_payouts(harness: Harness) {
    let user = harness.payee("ready@example.com").await;

    let status = harness
        .market
        .payees()
        .payee_status(user)
        .await
        .expect("status reported");

    assert!(status.is_onboarded);
    assert!(status.payouts_enabled);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn processor_outage_is_an_upstream_setup_failure(harness: Harness) {
    let user = harness.member("outage@example.com").await;
    harness
        .processor
        .fail_next(PaymentProcessorError::Unavailable("connect timeout".to_owned()));

    let result = harness.market.payees().start_onboarding(user).await;

    let err = result.expect_err("outage surfaces");
    assert!(matches!(
        err,
        MarketplaceError::PayeeSetup(PayeeSetupError::Processor(_))
    ));
    assert!(err.is_upstream_failure());
    let untouched = harness
        .market
        .identity()
        .current_user(user)
        .await
        .expect("user exists");
    assert!(untouched.payee_account_id().is_none());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn onboarding_unknown_users_is_not_found(harness: Harness) {
    let result = harness.market.payees().start_onboarding(UserId::new()).await;

    assert!(matches!(result, Err(MarketplaceError::NotFound("user"))));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn an_earlier_read_cannot_relink_the_payee_account(harness: Harness) {
    let user = harness.member("relink@example.com").await;
    let mut earlier = harness
        .store
        .find_user(user)
        .await
        .expect("store read")
        .expect("user stored");
    let first = harness
        .market
        .payees()
        .ensure_payee_account(user)
        .await
        .expect("account created");

    earlier.link_payee_account(
        PayeeAccountId::new("acct_second").expect("valid account id"),
        &*harness.clock,
    );
    let stored = harness
        .store
        .update_user(&earlier, UserChange::PayeeAccount)
        .await
        .expect("update applied");

    assert_eq!(stored.payee_account_id(), Some(&first));
    assert!(stored.has_profile_photo());
}
