//! Capture settlement tests.

use crate::payments::domain::{HoldPurpose, Money, ProcessorEvent};
use crate::settlement::domain::SettlementOutcome;
use crate::settlement::ports::UnreconciledEventStore;
use crate::task::domain::{PaymentStatus, TaskStatus};
use crate::testing::Harness;
use rstest::{fixture, rstest};
use serde_json::json;

#[fixture]
fn harness() -> Harness {
    Harness::new()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unrelated_events_are_ignored(harness: Harness) {
    let outcome = harness
        .market
        .settlement()
        .handle(ProcessorEvent::Other {
            event_id: "evt_1".to_owned(),
            event_type: "payout.paid".to_owned(),
        })
        .await
        .expect("event handled");

    assert_eq!(
        outcome,
        SettlementOutcome::Ignored {
            event_type: "payout.paid".to_owned()
        }
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn malformed_captures_are_set_aside(harness: Harness) {
    let outcome = harness
        .market
        .settlement()
        .handle(ProcessorEvent::Malformed {
            event_id: "evt_2".to_owned(),
            reason: "missing taskId".to_owned(),
            payload: json!({ "id": "evt_2" }),
        })
        .await
        .expect("event handled");

    assert_eq!(
        outcome,
        SettlementOutcome::Dropped {
            purpose: None,
            reason: "missing taskId".to_owned()
        }
    );
    let parked = harness
        .store
        .list_unreconciled(10)
        .await
        .expect("unreconciled listed");
    assert_eq!(parked.len(), 1);
    assert!(parked.iter().all(|event| event.event_id == "evt_2"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn superseded_hire_checkouts_are_dropped(harness: Harness) {
    let poster = harness.member("poster@example.com").await;
    let helper = harness.payee("helper@example.com").await;
    let task = harness.post_task(poster, Money::from_units(40)).await;
    harness
        .market
        .offers()
        .submit(helper, task.id(), None, None)
        .await
        .expect("offer accepted");
    let tasks = harness.market.tasks();
    let stale = tasks
        .choose_helper(poster, task.id(), helper)
        .await
        .expect("first checkout opens");
    let current = tasks
        .choose_helper(poster, task.id(), helper)
        .await
        .expect("second checkout opens");

    let dropped = harness.capture(&stale.session.id).await;
    let applied = harness.capture(&current.session.id).await;

    assert!(matches!(
        dropped,
        SettlementOutcome::Dropped {
            purpose: Some(HoldPurpose::Hire),
            ..
        }
    ));
    assert_eq!(applied, SettlementOutcome::Applied(HoldPurpose::Hire));
    let hired = tasks.get_task(task.id()).await.expect("task exists");
    assert_eq!(hired.status(), TaskStatus::Accepted);
    assert_eq!(hired.payment().status, PaymentStatus::Paid);
    assert_eq!(hired.payment().hold_session_id.as_ref(), Some(&current.session.id));
    assert!(hired.payment().charge_id.is_some());
    let parked = harness
        .store
        .list_unreconciled(10)
        .await
        .expect("unreconciled listed");
    assert!(
        parked
            .iter()
            .any(|event| event.session_id.as_ref() == Some(&stale.session.id))
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn captures_for_a_canceled_task_are_dropped(harness: Harness) {
    let poster = harness.member("poster@example.com").await;
    let helper = harness.payee("helper@example.com").await;
    let task = harness.post_task(poster, Money::from_units(40)).await;
    harness
        .market
        .offers()
        .submit(helper, task.id(), None, None)
        .await
        .expect("offer accepted");
    let checkout = harness
        .market
        .tasks()
        .choose_helper(poster, task.id(), helper)
        .await
        .expect("checkout opens");
    harness
        .market
        .tasks()
        .cancel(poster, task.id(), crate::task::domain::PartyRole::Poster)
        .await
        .expect("poster cancels");

    let outcome = harness.capture(&checkout.session.id).await;

    assert!(matches!(outcome, SettlementOutcome::Dropped { .. }));
}
