//! Extra-work and tip billing tests.

use crate::billing::domain::{BillingDomainError, ExtraWorkStatus};
use crate::error::{ErrorKind, MarketplaceError};
use crate::ids::UserId;
use crate::payments::domain::{HoldPurpose, Money};
use crate::settlement::domain::SettlementOutcome;
use crate::task::domain::{Task, TaskDomainError};
use crate::testing::Harness;

struct Job {
    harness: Harness,
    poster: UserId,
    helper: UserId,
    task: Task,
}

async fn hired_job() -> Job {
    let harness = Harness::new();
    let poster = harness.member("poster@example.com").await;
    let helper = harness.payee("helper@example.com").await;
    let posted = harness.post_task(poster, Money::from_units(50)).await;
    let task = harness.hire(poster, helper, posted.id()).await;
    Job {
        harness,
        poster,
        helper,
        task,
    }
}

async fn completed_job() -> Job {
    let job = hired_job().await;
    job.harness
        .market
        .tasks()
        .complete(job.poster, job.task.id())
        .await
        .expect("poster completes");
    job
}

#[tokio::test(flavor = "multi_thread")]
async fn accepted_extra_work_is_paid_on_capture() {
    let Job {
        harness,
        poster,
        helper,
        task,
    } = hired_job().await;
    let billing = harness.market.billing();
    let request = billing
        .request_extra_work(
            helper,
            task.id(),
            Money::from_units(20),
            "Second shelf was missing",
            vec!["https://img.test/shelf.jpg".to_owned()],
        )
        .await
        .expect("request filed");

    let checkout = billing
        .accept_extra_work(poster, request.id())
        .await
        .expect("poster accepts");
    let outcome = harness.capture(&checkout.session.id).await;

    assert_eq!(checkout.request.status(), ExtraWorkStatus::Accepted);
    assert_eq!(checkout.split.platform_fee, Money::from_units(3));
    assert_eq!(outcome, SettlementOutcome::Applied(HoldPurpose::ExtraWork));
    let listed = billing
        .list_extra_work(poster, task.id())
        .await
        .expect("requests listed");
    assert!(
        listed
            .iter()
            .all(|stored| stored.status() == ExtraWorkStatus::Paid)
    );
    let updated = harness
        .market
        .tasks()
        .get_task(task.id())
        .await
        .expect("task exists");
    assert_eq!(updated.extra_amount_paid(), Money::from_units(20));
}

#[tokio::test(flavor = "multi_thread")]
async fn only_one_request_may_be_pending() {
    let Job {
        harness,
        helper,
        task,
        ..
    } = hired_job().await;
    let billing = harness.market.billing();
    billing
        .request_extra_work(helper, task.id(), Money::from_units(10), "Extra trip", Vec::new())
        .await
        .expect("first request filed");

    let result = billing
        .request_extra_work(helper, task.id(), Money::from_units(15), "Another", Vec::new())
        .await;

    assert!(matches!(
        result,
        Err(MarketplaceError::Billing(
            BillingDomainError::PendingRequestExists(_)
        ))
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn extra_work_needs_a_reason_and_a_positive_amount() {
    let Job {
        harness,
        helper,
        task,
        ..
    } = hired_job().await;
    let billing = harness.market.billing();

    let no_reason = billing
        .request_extra_work(helper, task.id(), Money::from_units(10), "  ", Vec::new())
        .await;
    let no_amount = billing
        .request_extra_work(helper, task.id(), Money::ZERO, "Extra trip", Vec::new())
        .await;

    assert!(matches!(
        no_reason,
        Err(MarketplaceError::Billing(BillingDomainError::EmptyReason))
    ));
    assert!(matches!(
        no_amount,
        Err(MarketplaceError::Billing(BillingDomainError::InvalidAmount))
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn declined_requests_cannot_be_accepted_later() {
    let Job {
        harness,
        poster,
        helper,
        task,
    } = hired_job().await;
    let billing = harness.market.billing();
    let request = billing
        .request_extra_work(helper, task.id(), Money::from_units(10), "Extra trip", Vec::new())
        .await
        .expect("request filed");

    let declined = billing
        .decline_extra_work(poster, request.id())
        .await
        .expect("poster declines");
    let result = billing.accept_extra_work(poster, request.id()).await;

    assert_eq!(declined.status(), ExtraWorkStatus::Rejected);
    assert_eq!(
        result.expect_err("declined request stays declined").kind(),
        ErrorKind::InvalidState
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn helpers_cannot_answer_their_own_request() {
    let Job {
        harness,
        helper,
        task,
        ..
    } = hired_job().await;
    let billing = harness.market.billing();
    let request = billing
        .request_extra_work(helper, task.id(), Money::from_units(10), "Extra trip", Vec::new())
        .await
        .expect("request filed");

    let result = billing.accept_extra_work(helper, request.id()).await;

    assert_eq!(
        result.expect_err("helper rejected").kind(),
        ErrorKind::Authorization
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn tips_go_wholly_to_the_helper_once() {
    let Job {
        harness,
        poster,
        task,
        ..
    } = completed_job().await;
    let billing = harness.market.billing();

    let checkout = billing
        .request_tip(poster, task.id(), Money::from_units(10))
        .await
        .expect("tip checkout opens");
    let outcome = harness.capture(&checkout.session.id).await;
    let again = billing
        .request_tip(poster, task.id(), Money::from_units(5))
        .await;

    assert_eq!(outcome, SettlementOutcome::Applied(HoldPurpose::Tip));
    let holds = harness.processor.holds();
    let tip_hold = holds
        .iter()
        .find(|(session, _)| session.id == checkout.session.id)
        .map(|(_, request)| request)
        .expect("tip hold recorded");
    assert_eq!(tip_hold.split().platform_fee, Money::ZERO);
    assert!(matches!(
        again,
        Err(MarketplaceError::Task(TaskDomainError::TipAlreadyGiven(_)))
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn tips_wait_for_completion() {
    let Job {
        harness,
        poster,
        task,
        ..
    } = hired_job().await;

    let result = harness
        .market
        .billing()
        .request_tip(poster, task.id(), Money::from_units(10))
        .await;

    assert_eq!(
        result.expect_err("tip before completion").kind(),
        ErrorKind::InvalidState
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn replayed_extra_work_capture_is_counted_once() {
    let Job {
        harness,
        poster,
        helper,
        task,
    } = hired_job().await;
    let billing = harness.market.billing();
    let request = billing
        .request_extra_work(helper, task.id(), Money::from_units(20), "Extra trip", Vec::new())
        .await
        .expect("request filed");
    let checkout = billing
        .accept_extra_work(poster, request.id())
        .await
        .expect("poster accepts");

    let first = harness.capture(&checkout.session.id).await;
    let replay = harness.capture(&checkout.session.id).await;

    assert_eq!(first, SettlementOutcome::Applied(HoldPurpose::ExtraWork));
    assert_eq!(replay, SettlementOutcome::Replayed(HoldPurpose::ExtraWork));
    let updated = harness
        .market
        .tasks()
        .get_task(task.id())
        .await
        .expect("task exists");
    assert_eq!(updated.extra_amount_paid(), Money::from_units(20));
}

#[tokio::test(flavor = "multi_thread")]
async fn replayed_tip_capture_is_counted_once() {
    let Job {
        harness,
        poster,
        task,
        ..
    } = completed_job().await;
    let checkout = harness
        .market
        .billing()
        .request_tip(poster, task.id(), Money::from_units(10))
        .await
        .expect("tip checkout opens");

    let first = harness.capture(&checkout.session.id).await;
    let after_first = harness
        .market
        .tasks()
        .get_task(task.id())
        .await
        .expect("task exists");
    let replay = harness.capture(&checkout.session.id).await;

    assert_eq!(first, SettlementOutcome::Applied(HoldPurpose::Tip));
    assert_eq!(replay, SettlementOutcome::Replayed(HoldPurpose::Tip));
    let after_replay = harness
        .market
        .tasks()
        .get_task(task.id())
        .await
        .expect("task exists");
    assert_eq!(after_replay.revision(), after_first.revision());
    assert_eq!(
        after_replay.tip().paid.as_ref().map(|tip| tip.amount),
        Some(Money::from_units(10))
    );
}
