//! Login code, session and profile tests.

use crate::error::{ErrorKind, MarketplaceError};
use crate::identity::adapters::LoggingOtpNotifier;
use crate::identity::domain::{Email, IdentityDomainError, OneTimeCode, ProfileUpdate};
use crate::ids::UserId;
use crate::testing::Harness;
use chrono::{Duration, TimeZone, Utc};
use rstest::{fixture, rstest};

#[fixture]
fn harness() -> Harness {
    Harness::new()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn first_login_registers_a_verified_user(harness: Harness) {
    let session = harness.sign_in("  Dana@Example.com ").await;

    assert!(session.user.email_verified());
    assert_eq!(
        session.user.email().map(Email::as_str),
        Some("dana@example.com")
    );
    let resolved = harness
        .market
        .identity()
        .authenticate(session.token.as_str())
        .await
        .expect("fresh token should authenticate");
    assert_eq!(resolved.id(), session.user.id());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn later_logins_return_the_same_user(harness: Harness) {
    let first = harness.sign_in("sam@example.com").await;
    let second = harness.sign_in("SAM@example.com").await;

    assert_eq!(first.user.id(), second.user.id());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn codes_are_single_use(harness: Harness) {
    harness.sign_in("once@example.com").await;
    let code = harness
        .notifier
        .latest_code("once@example.com")
        .expect("code delivered");

    let replay = harness
        .market
        .identity()
        .verify_code("once@example.com", &code)
        .await;

    assert!(matches!(
        replay,
        Err(MarketplaceError::Identity(
            IdentityDomainError::CodeInvalidOrExpired
        ))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn codes_expire_after_ten_minutes(harness: Harness) {
    let identity = harness.market.identity();
    identity
        .request_code("late@example.com")
        .await
        .expect("code request should succeed");
    let code = harness
        .notifier
        .latest_code("late@example.com")
        .expect("code delivered");

    harness.clock.advance(Duration::minutes(11));
    let result = identity.verify_code("late@example.com", &code).await;

    assert!(matches!(
        result,
        Err(MarketplaceError::Identity(
            IdentityDomainError::CodeInvalidOrExpired
        ))
    ));
}

#[rstest]
#[case("")]
#[case("no-at-sign")]
#[case("two@@example.com")]
#[case("user@localhost")]
#[tokio::test(flavor = "multi_thread")]
async fn malformed_emails_are_rejected(harness: Harness, #[case] email: &str) {
    let result = harness.market.identity().request_code(email).await;

    let err = result.expect_err("malformed email should fail");
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn tokens_stop_working_after_their_lifetime(harness: Harness) {
    let session = harness.sign_in("ttl@example.com").await;

    harness.clock.advance(Duration::hours(13));
    let result = harness
        .market
        .identity()
        .authenticate(session.token.as_str())
        .await;

    assert!(matches!(result, Err(MarketplaceError::Unauthenticated)));
}

#[rstest]
#[case("")]
#[case("not-a-token")]
#[tokio::test(flavor = "multi_thread")]
async fn forged_tokens_are_unauthenticated(harness: Harness, #[case] token: &str) {
    let result = harness.market.identity().authenticate(token).await;

    assert!(matches!(result, Err(MarketplaceError::Unauthenticated)));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn profile_updates_are_limited_to_the_owner(harness: Harness) {
    let owner = harness.sign_in("owner@example.com").await.user.id();
    let intruder = harness.sign_in("intruder@example.com").await.user.id();

    let result = harness
        .market
        .identity()
        .update_profile(intruder, owner, ProfileUpdate::new().with_name("Mallory"))
        .await;

    assert!(matches!(result, Err(MarketplaceError::Forbidden(_))));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn profile_update_changes_only_supplied_fields(harness: Harness) {
    let user_id = harness.sign_in("pat@example.com").await.user.id();
    let identity = harness.market.identity();
    identity
        .update_profile(
            user_id,
            user_id,
            ProfileUpdate::new()
                .with_name("Pat")
                .with_default_zip_code("94110"),
        )
        .await
        .expect("first update should succeed");

    let updated = identity
        .update_profile(user_id, user_id, ProfileUpdate::new().with_phone("555-0100"))
        .await
        .expect("second update should succeed");

    assert_eq!(updated.name(), Some("Pat"));
    assert_eq!(updated.default_zip_code(), Some("94110"));
    assert_eq!(updated.phone(), Some("555-0100"));
    assert!(!updated.phone_verified());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn blank_photo_urls_are_rejected(harness: Harness) {
    let user_id = harness.sign_in("blank@example.com").await.user.id();

    let result = harness
        .market
        .identity()
        .update_photo(user_id, user_id, "   ")
        .await;

    assert!(matches!(
        result,
        Err(MarketplaceError::Identity(IdentityDomainError::EmptyProfilePhoto))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn has_photo_reflects_the_stored_profile(harness: Harness) {
    let member = harness.member("photo@example.com").await;
    let bare = harness.sign_in("bare@example.com").await.user.id();
    let identity = harness.market.identity();

    assert!(identity.has_photo(member).await.expect("lookup succeeds"));
    assert!(!identity.has_photo(bare).await.expect("lookup succeeds"));
    assert!(!identity.has_photo(UserId::new()).await.expect("lookup succeeds"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unknown_token_subjects_resolve_to_stub_users(harness: Harness) {
    let stranger = UserId::new();

    let user = harness
        .market
        .identity()
        .current_user(stranger)
        .await
        .expect("lookup succeeds");

    assert_eq!(user.id(), stranger);
    assert!(user.email().is_none());
    assert!(!user.has_profile_photo());
}

#[test]
fn login_message_names_the_code_and_app() {
    let notifier = LoggingOtpNotifier::new("Taskmarket").expect("template compiles");
    let code = OneTimeCode::parse("123456").expect("six digits");
    let expires_at = Utc
        .with_ymd_and_hms(2025, 6, 2, 9, 10, 0)
        .single()
        .expect("valid time");

    let body = notifier.render(&code, expires_at).expect("render succeeds");

    assert!(body.contains("123456"));
    assert!(body.contains("Taskmarket"));
}
