//! Posting, discovery and hiring through the lifecycle service.

use crate::chat::domain::ChatThread;
use crate::error::{ErrorKind, MarketplaceError, PayeeSetupError};
use crate::offer::domain::OfferStatus;
use crate::offer::ports::OfferRepository;
use crate::payments::domain::{HoldPurpose, Money, PayeeAccountSnapshot};
use crate::payments::ports::PaymentProcessorError;
use crate::persistence::RepositoryError;
use crate::settlement::domain::SettlementOutcome;
use crate::task::domain::{
    PaymentStatus, TASK_LIFETIME_DAYS, TaskCategory, TaskDomainError, TaskStatus,
};
use crate::task::ports::{HireCommit, TaskRepository};
use crate::task::services::{CreateTaskRequest, TaskListQuery};
use crate::testing::Harness;
use chrono::Duration;
use mockable::Clock;
use rstest::{fixture, rstest};

#[fixture]
fn harness() -> Harness {
    Harness::new()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn posting_requires_a_profile_photo(harness: Harness) {
    let poster = harness.sign_in("nophoto@example.com").await.user.id();

    let result = harness
        .market
        .tasks()
        .create_task(
            poster,
            CreateTaskRequest::new("Mow lawn", TaskCategory::YardWork, "94110", Money::from_units(30)),
        )
        .await;

    assert!(matches!(
        result,
        Err(MarketplaceError::Task(TaskDomainError::ProfilePhotoRequired))
    ));
}

#[rstest]
#[case(TaskCategory::Cleaning, 500, 7)]
#[case(TaskCategory::Cleaning, 699, 7)]
#[case(TaskCategory::Emergency, 6_000, 100)]
#[case(TaskCategory::Emergency, 9_999, 100)]
#[tokio::test(flavor = "multi_thread")]
async fn posting_enforces_the_category_minimum(
    harness: Harness,
    #[case] category: TaskCategory,
    #[case] price_cents: i64,
    #[case] minimum: i64,
) {
    let poster = harness.member("cheap@example.com").await;

    let result = harness
        .market
        .tasks()
        .create_task(
            poster,
            CreateTaskRequest::new("Quick job", category, "94110", Money::from_cents(price_cents)),
        )
        .await;

    let Err(MarketplaceError::Task(TaskDomainError::PriceBelowMinimum { minimum: reported })) =
        result
    else {
        panic!("expected a minimum price rejection, got {result:?}");
    };
    assert_eq!(reported, Money::from_units(minimum));
}

#[rstest]
#[case(TaskCategory::Cleaning, 700)]
#[case(TaskCategory::Emergency, 10_000)]
#[tokio::test(flavor = "multi_thread")]
async fn posting_at_the_category_minimum_is_accepted(
    harness: Harness,
    #[case] category: TaskCategory,
    #[case] price_cents: i64,
) {
    let poster = harness.member("exact@example.com").await;

    let task = harness
        .post(
            poster,
            CreateTaskRequest::new("Quick job", category, "94110", Money::from_cents(price_cents)),
        )
        .await;

    assert_eq!(task.price(), Money::from_cents(price_cents));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn odd_cent_prices_survive_posting_and_adjustment(harness: Harness) {
    let poster = harness.member("cents@example.com").await;
    let price = Money::parse_decimal("37.33").expect("valid amount");
    let posted = harness.post_task(poster, price).await;
    let tasks = harness.market.tasks();

    let stored = tasks.get_task(posted.id()).await.expect("task exists");
    let (adjusted, split) = tasks
        .adjust_price(poster, posted.id(), Money::from_cents(4_999))
        .await
        .expect("price adjusted");

    assert_eq!(stored.price().cents(), 3_733);
    assert_eq!(stored.price().to_decimal_string(), "37.33");
    assert_eq!(adjusted.price().cents(), 4_999);
    assert_eq!(split.platform_fee, Money::from_cents(750));
    assert_eq!(split.payee_amount, Money::from_cents(4_249));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn blank_titles_are_rejected(harness: Harness) {
    let poster = harness.member("blank@example.com").await;

    let result = harness
        .market
        .tasks()
        .create_task(
            poster,
            CreateTaskRequest::new("   ", TaskCategory::Other, "94110", Money::from_units(20)),
        )
        .await;

    let err = result.expect_err("blank title should fail");
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn posted_tasks_open_for_five_days(harness: Harness) {
    let poster = harness.member("poster@example.com").await;

    let task = harness.post_task(poster, Money::from_units(40)).await;

    assert_eq!(task.status(), TaskStatus::Requested);
    assert_eq!(task.poster_id(), poster);
    assert!(task.helper().is_none());
    assert_eq!(task.payment().status, PaymentStatus::Pending);
    assert_eq!(
        task.expires_at() - task.created_at(),
        Duration::days(TASK_LIFETIME_DAYS)
    );
    let fetched = harness
        .market
        .tasks()
        .get_task(task.id())
        .await
        .expect("task exists");
    assert_eq!(fetched.id(), task.id());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn discovery_lists_emergencies_first(harness: Harness) {
    let poster = harness.member("poster@example.com").await;
    let early = harness.post_task(poster, Money::from_units(40)).await;
    harness.clock.advance(Duration::minutes(5));
    let urgent = harness
        .post(
            poster,
            CreateTaskRequest::new("Burst pipe", TaskCategory::Emergency, "94110", Money::from_units(150)),
        )
        .await;
    harness.clock.advance(Duration::minutes(5));
    let late = harness.post_task(poster, Money::from_units(45)).await;

    let listed = harness
        .market
        .tasks()
        .list_tasks(TaskListQuery::default())
        .await
        .expect("listing succeeds");

    let ids: Vec<_> = listed.iter().map(crate::task::domain::Task::id).collect();
    assert_eq!(ids, vec![urgent.id(), late.id(), early.id()]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn discovery_hides_expired_tasks_unless_asked(harness: Harness) {
    let poster = harness.member("poster@example.com").await;
    harness.post_task(poster, Money::from_units(40)).await;
    harness.clock.advance(Duration::days(6));
    let tasks = harness.market.tasks();

    let open = tasks
        .list_tasks(TaskListQuery::default())
        .await
        .expect("listing succeeds");
    let all = tasks
        .list_tasks(TaskListQuery {
            include_expired: true,
            ..TaskListQuery::default()
        })
        .await
        .expect("listing succeeds");

    assert!(open.is_empty());
    assert_eq!(all.len(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn choosing_a_helper_needs_their_pending_offer(harness: Harness) {
    let poster = harness.member("poster@example.com").await;
    let helper = harness.payee("helper@example.com").await;
    let task = harness.post_task(poster, Money::from_units(40)).await;

    let result = harness
        .market
        .tasks()
        .choose_helper(poster, task.id(), helper)
        .await;

    assert!(matches!(result, Err(MarketplaceError::Validation(_))));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn choosing_a_helper_without_payee_account_fails(harness: Harness) {
    let poster = harness.member("poster@example.com").await;
    let helper = harness.member("helper@example.com").await;
    let task = harness.post_task(poster, Money::from_units(40)).await;
    harness
        .market
        .offers()
        .submit(helper, task.id(), None, None)
        .await
        .expect("offer accepted");

    let result = harness
        .market
        .tasks()
        .choose_helper(poster, task.id(), helper)
        .await;

    assert!(matches!(
        result,
        Err(MarketplaceError::PayeeSetup(PayeeSetupError::NoPayeeAccount))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn choosing_a_helper_with_payouts_disabled_fails(harness: Harness) {
    let poster = harness.member("poster@example.com").await;
    let helper = harness.payee("helper@example.com").await;
    let account = harness
        .market
        .identity()
        .current_user(helper)
        .await
        .expect("helper exists")
        .payee_account_id()
        .cloned()
        .expect("account linked");
    harness.processor.set_account(
        &account,
        PayeeAccountSnapshot {
            details_submitted: true,
            charges_enabled: true,
            payouts_enabled: false,
        },
    );
    let task = harness.post_task(poster, Money::from_units(40)).await;
    harness
        .market
        .offers()
        .submit(helper, task.id(), None, None)
        .await
        .expect("offer accepted");

    let result = harness
        .market
        .tasks()
        .choose_helper(poster, task.id(), helper)
        .await;

    assert!(matches!(
        result,
        Err(MarketplaceError::PayeeSetup(PayeeSetupError::PayoutsDisabled))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn posters_cannot_hire_themselves(harness: Harness) {
    let poster = harness.payee("poster@example.com").await;
    let task = harness.post_task(poster, Money::from_units(40)).await;

    let result = harness
        .market
        .tasks()
        .choose_helper(poster, task.id(), poster)
        .await;

    assert!(matches!(
        result,
        Err(MarketplaceError::Task(TaskDomainError::SelfHire))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn only_the_poster_chooses_a_helper(harness: Harness) {
    let poster = harness.member("poster@example.com").await;
    let helper = harness.payee("helper@example.com").await;
    let task = harness.post_task(poster, Money::from_units(40)).await;

    let result = harness
        .market
        .tasks()
        .choose_helper(helper, task.id(), helper)
        .await;

    let err = result.expect_err("helper cannot choose themselves");
    assert_eq!(err.kind(), ErrorKind::Authorization);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn hire_checkout_leaves_the_task_requested(harness: Harness) {
    let poster = harness.member("poster@example.com").await;
    let helper = harness.payee("helper@example.com").await;
    let task = harness.post_task(poster, Money::from_units(100)).await;
    harness
        .market
        .offers()
        .submit(helper, task.id(), Some("On my way".to_owned()), None)
        .await
        .expect("offer accepted");

    let checkout = harness
        .market
        .tasks()
        .choose_helper(poster, task.id(), helper)
        .await
        .expect("checkout opens");

    assert_eq!(checkout.task.status(), TaskStatus::Requested);
    assert_eq!(checkout.task.payment().status, PaymentStatus::AwaitingCapture);
    assert!(checkout.task.helper().is_none());
    assert_eq!(checkout.split.platform_fee, Money::from_units(15));
    assert_eq!(checkout.split.payee_amount, Money::from_units(85));
    let holds = harness.processor.holds();
    let [(session, request)] = holds.as_slice() else {
        panic!("expected exactly one hold, got {}", holds.len());
    };
    assert_eq!(session.id, checkout.session.id);
    assert_eq!(request.amount, Money::from_units(100));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn capture_confirms_the_hire_and_opens_chat(harness: Harness) {
    let poster = harness.member("poster@example.com").await;
    let chosen = harness.payee("chosen@example.com").await;
    let other = harness.member("other@example.com").await;
    let task = harness.post_task(poster, Money::from_units(60)).await;
    harness
        .market
        .offers()
        .submit(other, task.id(), None, None)
        .await
        .expect("offer accepted");

    let hired = harness.hire(poster, chosen, task.id()).await;

    assert_eq!(hired.status(), TaskStatus::Accepted);
    assert_eq!(hired.helper_id(), Some(chosen));
    assert_eq!(hired.payment().status, PaymentStatus::Paid);
    assert!(hired.timeline().accepted_at.is_some());
    let offers = harness
        .market
        .offers()
        .list(task.id())
        .await
        .expect("offers listed");
    for offer in &offers {
        let expected = if offer.helper_id() == chosen {
            OfferStatus::Accepted
        } else {
            OfferStatus::Declined
        };
        assert_eq!(offer.status(), expected);
    }
    let threads = harness
        .market
        .chat()
        .threads_for(poster)
        .await
        .expect("threads listed");
    assert_eq!(threads.len(), 1);
    assert!(threads.iter().all(|thread| thread.helper_id() == chosen));
    let jobs = harness
        .market
        .tasks()
        .list_jobs(chosen)
        .await
        .expect("jobs listed");
    assert_eq!(jobs.len(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn replayed_capture_changes_nothing(harness: Harness) {
    let poster = harness.member("poster@example.com").await;
    let helper = harness.payee("helper@example.com").await;
    let task = harness.post_task(poster, Money::from_units(60)).await;
    let hired = harness.hire(poster, helper, task.id()).await;
    let session = hired
        .payment()
        .hold_session_id
        .clone()
        .expect("hire session recorded");

    let outcome = harness.capture(&session).await;

    assert_eq!(outcome, SettlementOutcome::Replayed(HoldPurpose::Hire));
    let after = harness
        .market
        .tasks()
        .get_task(task.id())
        .await
        .expect("task exists");
    assert_eq!(after.revision(), hired.revision());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn a_stale_hire_commit_writes_nothing(harness: Harness) {
    let poster = harness.member("poster@example.com").await;
    let helper = harness.payee("helper@example.com").await;
    let task = harness.post_task(poster, Money::from_units(60)).await;
    harness
        .market
        .offers()
        .submit(helper, task.id(), None, None)
        .await
        .expect("offer accepted");
    let at = harness.clock.utc();
    let commit = HireCommit {
        task: task.clone(),
        expected_revision: task.revision() + 1,
        thread: ChatThread::open(task.id(), poster, helper, at),
        at,
    };

    let result = harness.store.commit_hire(&commit).await;

    assert!(matches!(result, Err(RepositoryError::Conflict { .. })));
    let offers = harness
        .store
        .list_offers_for_task(task.id())
        .await
        .expect("offers listed");
    assert!(offers.iter().all(|offer| offer.status() == OfferStatus::Pending));
    let threads = harness
        .market
        .chat()
        .threads_for(poster)
        .await
        .expect("threads listed");
    assert!(threads.is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn helpers_are_limited_to_two_active_jobs_at_first(harness: Harness) {
    let poster = harness.member("poster@example.com").await;
    let helper = harness.payee("busy@example.com").await;
    for _ in 0..2 {
        let task = harness.post_task(poster, Money::from_units(40)).await;
        harness.hire(poster, helper, task.id()).await;
    }
    let third = harness.post_task(poster, Money::from_units(40)).await;
    harness
        .market
        .offers()
        .submit(helper, third.id(), None, None)
        .await
        .expect("offer accepted");

    let result = harness
        .market
        .tasks()
        .choose_helper(poster, third.id(), helper)
        .await;

    let err = result.expect_err("job limit reached");
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(err.to_string().contains('2'));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn processor_outage_during_checkout_leaves_the_task_untouched(harness: Harness) {
    let poster = harness.member("poster@example.com").await;
    let helper = harness.payee("helper@example.com").await;
    let task = harness.post_task(poster, Money::from_units(40)).await;
    harness
        .market
        .offers()
        .submit(helper, task.id(), None, None)
        .await
        .expect("offer accepted");
    harness
        .processor
        .fail_next(PaymentProcessorError::Unavailable("timeout".to_owned()));

    let result = harness
        .market
        .tasks()
        .choose_helper(poster, task.id(), helper)
        .await;

    let err = result.expect_err("processor failure surfaces");
    assert!(err.is_upstream_failure());
    let unchanged = harness
        .market
        .tasks()
        .get_task(task.id())
        .await
        .expect("task exists");
    assert_eq!(unchanged.payment().status, PaymentStatus::Pending);
    assert!(harness.processor.holds().is_empty());
}
