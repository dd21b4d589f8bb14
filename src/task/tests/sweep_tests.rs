//! Price prompt sweep over stale open tasks.

use crate::payments::domain::Money;
use crate::task::domain::PRICE_PROMPT_AFTER_HOURS;
use crate::task::services::SweepReport;
use crate::testing::Harness;
use chrono::Duration;
use rstest::{fixture, rstest};

#[fixture]
fn harness() -> Harness {
    Harness::new()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn fresh_tasks_are_left_alone(harness: Harness) {
    let poster = harness.member("poster@example.com").await;
    harness.post_task(poster, Money::from_units(20)).await;
    harness
        .clock
        .advance(Duration::hours(PRICE_PROMPT_AFTER_HOURS - 1));

    let report = harness.market.sweep().run().await.expect("sweep runs");

    assert_eq!(report, SweepReport::default());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stale_tasks_without_offers_get_one_prompt(harness: Harness) {
    let poster = harness.member("poster@example.com").await;
    let task = harness.post_task(poster, Money::from_units(20)).await;
    harness
        .clock
        .advance(Duration::hours(PRICE_PROMPT_AFTER_HOURS));
    let sweep = harness.market.sweep();

    let first = sweep.run().await.expect("sweep runs");
    let second = sweep.run().await.expect("sweep runs");

    assert_eq!(first.flagged, 1);
    assert_eq!(second.flagged, 0);
    let prompted = harness
        .market
        .tasks()
        .list_needing_price_adjustment(poster)
        .await
        .expect("listing succeeds");
    assert_eq!(prompted.len(), 1);
    assert!(prompted.iter().all(|listed| listed.id() == task.id()));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn tasks_with_offers_are_not_prompted(harness: Harness) {
    let poster = harness.member("poster@example.com").await;
    let helper = harness.member("helper@example.com").await;
    let task = harness.post_task(poster, Money::from_units(20)).await;
    harness
        .market
        .offers()
        .submit(helper, task.id(), None, None)
        .await
        .expect("offer accepted");
    harness.clock.advance(Duration::hours(48));

    let report = harness.market.sweep().run().await.expect("sweep runs");

    assert_eq!(report.flagged, 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn acknowledging_hides_the_prompt(harness: Harness) {
    let poster = harness.member("poster@example.com").await;
    let task = harness.post_task(poster, Money::from_units(20)).await;
    harness.clock.advance(Duration::hours(30));
    harness.market.sweep().run().await.expect("sweep runs");
    let tasks = harness.market.tasks();

    let acknowledged = tasks
        .acknowledge_price_prompt(poster, task.id())
        .await
        .expect("poster acknowledges");

    assert!(!acknowledged.price_prompt_shown());
    let prompted = tasks
        .list_needing_price_adjustment(poster)
        .await
        .expect("listing succeeds");
    assert!(prompted.is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn adjusting_the_price_clears_the_prompt(harness: Harness) {
    let poster = harness.member("poster@example.com").await;
    let task = harness.post_task(poster, Money::from_units(20)).await;
    harness.clock.advance(Duration::hours(30));
    harness.market.sweep().run().await.expect("sweep runs");

    let (adjusted, _) = harness
        .market
        .tasks()
        .adjust_price(poster, task.id(), Money::from_units(35))
        .await
        .expect("price adjusted");

    assert!(!adjusted.price_prompt_shown());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn acknowledged_prompts_stay_dismissed(harness: Harness) {
    let poster = harness.member("poster@example.com").await;
    let task = harness.post_task(poster, Money::from_units(20)).await;
    harness.clock.advance(Duration::hours(30));
    let sweep = harness.market.sweep();
    let first = sweep.run().await.expect("sweep runs");
    harness
        .market
        .tasks()
        .acknowledge_price_prompt(poster, task.id())
        .await
        .expect("poster acknowledges");

    harness.clock.advance(Duration::hours(1));
    let second = sweep.run().await.expect("sweep runs");
    harness.clock.advance(Duration::days(3));
    let later = sweep.run().await.expect("sweep runs");

    assert_eq!(first.flagged, 1);
    assert_eq!(second, SweepReport::default());
    assert_eq!(later, SweepReport::default());
    let prompted = harness
        .market
        .tasks()
        .list_needing_price_adjustment(poster)
        .await
        .expect("listing succeeds");
    assert!(prompted.is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn a_new_price_gets_a_fresh_window(harness: Harness) {
    let poster = harness.member("poster@example.com").await;
    let task = harness.post_task(poster, Money::from_units(20)).await;
    harness.clock.advance(Duration::hours(30));
    let sweep = harness.market.sweep();
    sweep.run().await.expect("sweep runs");
    harness
        .market
        .tasks()
        .adjust_price(poster, task.id(), Money::from_units(35))
        .await
        .expect("price adjusted");

    let right_after = sweep.run().await.expect("sweep runs");
    harness
        .clock
        .advance(Duration::hours(PRICE_PROMPT_AFTER_HOURS));
    let next_day = sweep.run().await.expect("sweep runs");

    assert_eq!(right_after.flagged, 0);
    assert_eq!(next_day.flagged, 1);
}
