//! Activity recorder tests.

use crate::activity::domain::{ActivityEntry, ActivityEvent, ActivityQuery, MAX_ACTIVITY_LIMIT};
use crate::activity::ports::ActivityLog;
use crate::activity::services::ActivityRecorder;
use crate::payments::domain::Money;
use crate::persistence::{RepositoryError, RepositoryResult};
use crate::testing::{Harness, ManualClock};
use async_trait::async_trait;
use mockall::mock;
use std::sync::Arc;

mock! {
    Log {}

    #[async_trait]
    impl ActivityLog for Log {
        async fn append_activity(&self, entry: &ActivityEntry) -> RepositoryResult<()>;
        async fn list_activity(&self, query: &ActivityQuery) -> RepositoryResult<Vec<ActivityEntry>>;
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_appends_do_not_reach_the_caller() {
    let mut log = MockLog::new();
    log.expect_append_activity()
        .times(1)
        .returning(|_| Err(RepositoryError::persistence(std::io::Error::other("disk full"))));
    let recorder = ActivityRecorder::new(Arc::new(log));
    let clock = ManualClock::default();

    recorder
        .record(ActivityEntry::new(ActivityEvent::TaskCreated, &clock))
        .await;
}

#[test]
fn query_limits_are_clamped() {
    assert_eq!(ActivityQuery::new(None, None, Some(0)).limit, 1);
    assert_eq!(
        ActivityQuery::new(None, None, Some(10_000)).limit,
        MAX_ACTIVITY_LIMIT
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn task_history_is_listed_newest_first() {
    let harness = Harness::new();
    let poster = harness.member("poster@example.com").await;
    let helper = harness.payee("helper@example.com").await;
    let task = harness.post_task(poster, Money::from_units(40)).await;
    harness.clock.advance(chrono::Duration::minutes(1));
    harness.hire(poster, helper, task.id()).await;

    let entries = harness
        .market
        .activity()
        .list(&ActivityQuery::new(Some(task.id()), None, None))
        .await
        .expect("activity listed");

    let events: Vec<_> = entries.iter().map(|entry| entry.event).collect();
    assert_eq!(events.last(), Some(&ActivityEvent::TaskCreated));
    assert!(events.contains(&ActivityEvent::OfferSubmitted));
    assert!(events.contains(&ActivityEvent::HireRequested));
    assert!(events.contains(&ActivityEvent::HireConfirmed));
}

#[tokio::test(flavor = "multi_thread")]
async fn activity_filters_by_actor() {
    let harness = Harness::new();
    let poster = harness.member("poster@example.com").await;
    let helper = harness.member("helper@example.com").await;
    let task = harness.post_task(poster, Money::from_units(40)).await;
    harness
        .market
        .offers()
        .submit(helper, task.id(), None, None)
        .await
        .expect("offer accepted");

    let entries = harness
        .market
        .activity()
        .list(&ActivityQuery::new(None, Some(helper), None))
        .await
        .expect("activity listed");

    assert_eq!(entries.len(), 1);
    assert!(
        entries
            .iter()
            .all(|entry| entry.event == ActivityEvent::OfferSubmitted)
    );
}

#[test]
fn event_names_round_trip() {
    for name in ["task_created", "hire_confirmed", "price_prompt_triggered"] {
        let event = ActivityEvent::try_from(name).expect("known event");
        assert_eq!(event.as_str(), name);
    }
}
