//! Dispute ledger tests.

use crate::dispute::domain::{
    Dispute, DisputeDomainError, DisputeResolution, DisputeStatus, ResolutionOutcome,
};
use crate::dispute::ports::DisputeRepository;
use crate::error::{ErrorKind, MarketplaceError};
use crate::ids::UserId;
use crate::payments::domain::Money;
use crate::persistence::RepositoryError;
use crate::task::domain::{TaskAction, TaskDomainError};
use crate::task::services::OpenDisputeRequest;
use crate::testing::Harness;

struct Disputed {
    harness: Harness,
    poster: UserId,
    helper: UserId,
    dispute: Dispute,
}

async fn disputed() -> Disputed {
    let harness = Harness::new();
    let poster = harness.member("poster@example.com").await;
    let helper = harness.payee("helper@example.com").await;
    let posted = harness.post_task(poster, Money::from_units(80)).await;
    let task = harness.hire(poster, helper, posted.id()).await;
    let (_, dispute) = harness
        .market
        .tasks()
        .open_dispute(
            poster,
            task.id(),
            OpenDisputeRequest {
                reason: None,
                photo_urls: vec!["https://img.test/crooked.jpg".to_owned()],
            },
        )
        .await
        .expect("dispute opens");
    Disputed {
        harness,
        poster,
        helper,
        dispute,
    }
}

fn resolution(outcome: ResolutionOutcome, released: i64, refunded: i64) -> DisputeResolution {
    DisputeResolution {
        outcome,
        note: Some("Reviewed photos".to_owned()),
        amount_released: Money::from_units(released),
        amount_refunded: Money::from_units(refunded),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn each_party_adds_evidence_to_their_side() {
    let Disputed {
        harness,
        poster,
        helper,
        dispute,
    } = disputed().await;
    let disputes = harness.market.disputes();

    disputes
        .append_evidence(helper, dispute.id(), vec!["https://img.test/level.jpg".to_owned()])
        .await
        .expect("helper adds evidence");
    let updated = disputes
        .append_evidence(poster, dispute.id(), vec![" https://img.test/gap.jpg ".to_owned()])
        .await
        .expect("poster adds evidence");

    assert_eq!(dispute.status(), DisputeStatus::Pending);
    assert_eq!(
        updated.poster_photo_urls(),
        ["https://img.test/crooked.jpg", "https://img.test/gap.jpg"]
    );
    assert_eq!(updated.helper_photo_urls(), ["https://img.test/level.jpg"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn evidence_needs_at_least_one_url() {
    let Disputed {
        harness,
        poster,
        dispute,
        ..
    } = disputed().await;

    let result = harness
        .market
        .disputes()
        .append_evidence(poster, dispute.id(), vec!["  ".to_owned()])
        .await;

    assert!(matches!(
        result,
        Err(MarketplaceError::Dispute(DisputeDomainError::NoEvidence))
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn outsiders_cannot_see_disputes() {
    let Disputed {
        harness, dispute, ..
    } = disputed().await;
    let outsider = harness.member("outsider@example.com").await;

    let result = harness.market.disputes().get(outsider, dispute.id()).await;

    let err = result.expect_err("outsider rejected");
    assert_eq!(err.kind(), ErrorKind::Authorization);
    assert!(matches!(
        err,
        MarketplaceError::Task(TaskDomainError::NotParty {
            action: TaskAction::ViewDispute,
            ..
        })
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn operators_review_then_resolve_once() {
    let Disputed {
        harness,
        helper,
        dispute,
        ..
    } = disputed().await;
    let disputes = harness.market.disputes();

    let reviewing = disputes
        .start_review(dispute.id())
        .await
        .expect("review starts");
    let resolved = disputes
        .record_resolution(dispute.id(), resolution(ResolutionOutcome::Split, 40, 40))
        .await
        .expect("resolution recorded");
    let again = disputes
        .record_resolution(dispute.id(), resolution(ResolutionOutcome::Helper, 80, 0))
        .await;

    assert_eq!(reviewing.status(), DisputeStatus::InReview);
    assert_eq!(resolved.status(), DisputeStatus::ResolvedSplit);
    assert!(resolved.resolved_at().is_some());
    assert!(matches!(
        again,
        Err(MarketplaceError::Dispute(DisputeDomainError::AlreadyResolved(_)))
    ));
    let seen = disputes
        .get(helper, dispute.id())
        .await
        .expect("helper reads the dispute");
    assert_eq!(seen.resolution().map(|decision| decision.outcome), Some(ResolutionOutcome::Split));
}

#[tokio::test(flavor = "multi_thread")]
async fn negative_amounts_are_rejected() {
    let Disputed {
        harness, dispute, ..
    } = disputed().await;

    let result = harness
        .market
        .disputes()
        .record_resolution(dispute.id(), resolution(ResolutionOutcome::Poster, -1, 80))
        .await;

    assert!(matches!(
        result,
        Err(MarketplaceError::Dispute(DisputeDomainError::NegativeAmount))
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn resolving_an_earlier_read_keeps_later_evidence() {
    let Disputed {
        harness,
        helper,
        dispute,
        ..
    } = disputed().await;
    let mut earlier = harness
        .store
        .find_dispute(dispute.id())
        .await
        .expect("store read")
        .expect("dispute stored");
    harness
        .market
        .disputes()
        .append_evidence(helper, dispute.id(), vec!["https://img.test/level.jpg".to_owned()])
        .await
        .expect("helper adds evidence");

    earlier
        .resolve(resolution(ResolutionOutcome::Helper, 80, 0), &*harness.clock)
        .expect("resolution applies");
    let stored = harness
        .store
        .update_dispute(&earlier, DisputeStatus::Pending)
        .await
        .expect("decision stored");

    assert_eq!(stored.status(), DisputeStatus::ResolvedHelper);
    assert_eq!(stored.helper_photo_urls(), ["https://img.test/level.jpg"]);
    assert_eq!(stored.poster_photo_urls(), ["https://img.test/crooked.jpg"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn decisions_from_a_stale_status_conflict() {
    let Disputed {
        harness,
        poster,
        dispute,
        ..
    } = disputed().await;
    let mut earlier = harness
        .store
        .find_dispute(dispute.id())
        .await
        .expect("store read")
        .expect("dispute stored");
    harness
        .market
        .disputes()
        .record_resolution(dispute.id(), resolution(ResolutionOutcome::Poster, 0, 80))
        .await
        .expect("first resolution recorded");

    earlier
        .resolve(resolution(ResolutionOutcome::Helper, 80, 0), &*harness.clock)
        .expect("stale copy still looks open");
    let result = harness
        .store
        .update_dispute(&earlier, DisputeStatus::Pending)
        .await;

    assert!(matches!(result, Err(RepositoryError::Conflict { .. })));
    let stored = harness
        .market
        .disputes()
        .get(poster, dispute.id())
        .await
        .expect("poster reads the dispute");
    assert_eq!(stored.status(), DisputeStatus::ResolvedPoster);
}
