//! Login, session tokens and transport-level behaviour.

use super::support::{Api, Caller, PUBLISHABLE_KEY, api};
use chrono::Duration;
use lambda_http::http::{Method, StatusCode};
use rstest::rstest;
use serde_json::json;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn health_needs_no_session(api: Api) {
    let reply = api.call(Method::GET, "/health", None, None).await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["status"], "ok");
    assert_eq!(reply.allow_origin.as_deref(), Some("*"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn processor_config_serves_the_publishable_key(api: Api) {
    let reply = api.call(Method::GET, "/api/stripe/config", None, None).await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, json!({ "publishableKey": PUBLISHABLE_KEY }));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn preflight_is_answered_without_routing(api: Api) {
    let reply = api
        .call(Method::OPTIONS, "/api/tasks/anything/at/all", None, None)
        .await;

    assert_eq!(reply.status, StatusCode::NO_CONTENT);
    assert_eq!(reply.allow_origin.as_deref(), Some("*"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn otp_login_returns_a_usable_session(api: Api) {
    let caller = api.login("Rosa@Example.com").await;

    let me = api.get("/api/users/me", &caller).await;

    assert_eq!(me.status, StatusCode::OK, "{}", me.body);
    assert_eq!(me.body["email"], "rosa@example.com");
    assert_eq!(me.body["emailVerified"], true);
    assert_eq!(me.body["completedJobsCount"], 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn wrong_code_is_a_bad_request(api: Api) {
    api.call(
        Method::POST,
        "/api/auth/send-otp",
        None,
        Some(json!({ "email": "rosa@example.com" })),
    )
    .await;

    let reply = api
        .call(
            Method::POST,
            "/api/auth/verify-otp",
            None,
            Some(json!({ "email": "rosa@example.com", "code": "000000x" })),
        )
        .await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert!(reply.body["error"].is_string());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn protected_routes_require_a_bearer_token(api: Api) {
    let reply = api.call(Method::GET, "/api/my-tasks", None, None).await;

    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn forged_and_expired_tokens_are_rejected(api: Api) {
    let caller = api.login("rosa@example.com").await;
    let forged = Caller {
        id: caller.id,
        token: format!("{}x", caller.token),
    };

    assert_eq!(
        api.get("/api/users/me", &forged).await.status,
        StatusCode::UNAUTHORIZED
    );

    api.clock.advance(Duration::hours(13));
    assert_eq!(
        api.get("/api/users/me", &caller).await.status,
        StatusCode::UNAUTHORIZED
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn editing_someone_elses_profile_is_forbidden(api: Api) {
    let rosa = api.login("rosa@example.com").await;
    let sam = api.login("sam@example.com").await;

    let reply = api
        .call(
            Method::PUT,
            &format!("/api/users/{}", rosa.id),
            Some(&sam),
            Some(json!({ "name": "Not Rosa" })),
        )
        .await;

    assert_eq!(reply.status, StatusCode::FORBIDDEN);
}

#[rstest]
#[case(Method::GET, "/api/nothing-here", StatusCode::NOT_FOUND)]
#[case(Method::GET, "/api/tasks/not-a-uuid", StatusCode::NOT_FOUND)]
#[case(Method::DELETE, "/api/tasks", StatusCode::METHOD_NOT_ALLOWED)]
#[tokio::test(flavor = "multi_thread")]
async fn unmatched_requests_get_json_errors(
    api: Api,
    #[case] method: Method,
    #[case] path: &str,
    #[case] expected: StatusCode,
) {
    let reply = api.call(method, path, None, None).await;

    assert_eq!(reply.status, expected);
    assert!(reply.body["error"].is_string());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn malformed_json_is_a_validation_error(api: Api) {
    let caller = api.login("rosa@example.com").await;
    let request = lambda_http::http::Request::builder()
        .method(Method::POST)
        .uri("/api/tasks")
        .header("Authorization", format!("Bearer {}", caller.token))
        .body(lambda_http::Body::from("{\"title\":"))
        .expect("valid request");

    let reply = api.send(request).await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}
