//! Offer submission tests.

use crate::error::MarketplaceError;
use crate::ids::TaskId;
use crate::offer::domain::{OfferDomainError, OfferStatus};
use crate::payments::domain::Money;
use crate::testing::Harness;
use rstest::{fixture, rstest};

#[fixture]
fn harness() -> Harness {
    Harness::new()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn offers_snapshot_the_helper_and_leave_the_task_open(harness: Harness) {
    let poster = harness.member("poster@example.com").await;
    let helper = harness.member("helper@example.com").await;
    let task = harness.post_task(poster, Money::from_units(30)).await;

    let offer = harness
        .market
        .offers()
        .submit(
            helper,
            task.id(),
            Some("  Can come at noon  ".to_owned()),
            Some(Money::from_units(35)),
        )
        .await
        .expect("offer accepted");

    assert_eq!(offer.status(), OfferStatus::Pending);
    assert_eq!(offer.note(), Some("Can come at noon"));
    assert_eq!(offer.helper_photo_url(), Some("https://img.test/face.jpg"));
    assert_eq!(offer.proposed_price(), Some(Money::from_units(35)));
    let unchanged = harness
        .market
        .tasks()
        .get_task(task.id())
        .await
        .expect("task exists");
    assert_eq!(unchanged.revision(), task.revision());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn helpers_need_a_profile_photo(harness: Harness) {
    let poster = harness.member("poster@example.com").await;
    let helper = harness.sign_in("faceless@example.com").await.user.id();
    let task = harness.post_task(poster, Money::from_units(30)).await;

    let result = harness
        .market
        .offers()
        .submit(helper, task.id(), None, None)
        .await;

    assert!(matches!(
        result,
        Err(MarketplaceError::Offer(OfferDomainError::ProfilePhotoRequired))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn posters_cannot_bid_on_their_own_task(harness: Harness) {
    let poster = harness.member("poster@example.com").await;
    let task = harness.post_task(poster, Money::from_units(30)).await;

    let result = harness
        .market
        .offers()
        .submit(poster, task.id(), None, None)
        .await;

    assert!(matches!(
        result,
        Err(MarketplaceError::Offer(OfferDomainError::OwnTask(_)))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn one_pending_offer_per_helper_and_task(harness: Harness) {
    let poster = harness.member("poster@example.com").await;
    let helper = harness.member("helper@example.com").await;
    let task = harness.post_task(poster, Money::from_units(30)).await;
    let offers = harness.market.offers();
    offers
        .submit(helper, task.id(), None, None)
        .await
        .expect("first offer accepted");

    let result = offers.submit(helper, task.id(), None, None).await;

    assert!(matches!(
        result,
        Err(MarketplaceError::Offer(OfferDomainError::DuplicatePendingOffer(_)))
    ));
}

#[rstest]
#[case(0)]
#[case(-500)]
#[tokio::test(flavor = "multi_thread")]
async fn proposed_prices_must_be_positive(harness: Harness, #[case] cents: i64) {
    let poster = harness.member("poster@example.com").await;
    let helper = harness.member("helper@example.com").await;
    let task = harness.post_task(poster, Money::from_units(30)).await;

    let result = harness
        .market
        .offers()
        .submit(helper, task.id(), None, Some(Money::from_cents(cents)))
        .await;

    assert!(matches!(
        result,
        Err(MarketplaceError::Offer(OfferDomainError::InvalidProposedPrice))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn hired_tasks_take_no_more_offers(harness: Harness) {
    let poster = harness.member("poster@example.com").await;
    let helper = harness.payee("helper@example.com").await;
    let late = harness.member("late@example.com").await;
    let task = harness.post_task(poster, Money::from_units(30)).await;
    harness.hire(poster, helper, task.id()).await;

    let result = harness
        .market
        .offers()
        .submit(late, task.id(), None, None)
        .await;

    assert!(matches!(
        result,
        Err(MarketplaceError::Offer(OfferDomainError::TaskNotOpen(_)))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn listing_offers_of_an_unknown_task_is_not_found(harness: Harness) {
    let result = harness.market.offers().list(TaskId::new()).await;

    assert!(matches!(result, Err(MarketplaceError::NotFound("task"))));
}
