//! Posting, offering, hiring and capture through the HTTP surface.

use super::support::{Api, api};
use lambda_http::http::{Method, StatusCode};
use rstest::rstest;
use serde_json::json;
use taskmarket::api::SIGNATURE_HEADER;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn posting_requires_a_profile_photo(api: Api) {
    let poster = api.login("poster@example.com").await;

    let reply = api
        .post(
            "/api/tasks",
            &poster,
            json!({ "title": "Rake leaves", "zipCode": "94110", "price": 40 }),
        )
        .await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn discovery_hides_private_fields_from_non_parties(api: Api) {
    let poster = api.member("poster@example.com").await;
    let browser = api.member("browser@example.com").await;
    let task = api.post_task(&poster, 80.0).await;

    let own = api.get(&format!("/api/tasks/{task}"), &poster).await;
    let listed = api.get("/api/tasks?zipCode=94110", &browser).await;

    assert_eq!(own.body["fullAddress"], "12 Valencia St");
    assert!(own.body["confirmationCode"].is_string());
    let tasks = listed.body.as_array().expect("task list");
    assert_eq!(tasks.len(), 1);
    let seen = tasks.first().expect("listed task");
    assert!(seen["fullAddress"].is_null());
    assert!(seen["confirmationCode"].is_null());
    assert_eq!(seen["status"], "requested");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn discovery_rejects_unparseable_filter_values(api: Api) {
    let browser = api.member("browser@example.com").await;

    let reply = api.get("/api/tasks?toolsRequired=maybe", &browser).await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}

#[rstest]
#[case(100.0, 15.0, 85.0)]
#[case(37.33, 5.6, 31.73)]
#[tokio::test(flavor = "multi_thread")]
async fn checkout_opens_with_a_fee_split(
    api: Api,
    #[case] price: f64,
    #[case] platform_fee: f64,
    #[case] payee_amount: f64,
) {
    let poster = api.member("poster@example.com").await;
    let helper = api.payee("helper@example.com").await;
    let task = api.post_task(&poster, price).await;
    api.post(&format!("/api/tasks/{task}/offers"), &helper, json!({ "note": "Today works" }))
        .await;

    let checkout = api
        .post(
            &format!("/api/tasks/{task}/choose-helper"),
            &poster,
            json!({ "helperId": helper.id }),
        )
        .await;

    assert_eq!(checkout.status, StatusCode::OK, "{}", checkout.body);
    assert!(checkout.body["checkoutUrl"].is_string());
    assert_eq!(checkout.body["split"]["total"].as_f64(), Some(price));
    assert_eq!(checkout.body["split"]["platformFee"].as_f64(), Some(platform_fee));
    assert_eq!(checkout.body["split"]["payeeAmount"].as_f64(), Some(payee_amount));
    let task_view = api.get(&format!("/api/tasks/{task}"), &poster).await;
    assert_eq!(task_view.body["status"], "requested");
    assert_eq!(task_view.body["price"].as_f64(), Some(price));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn price_changes_keep_cent_precision(api: Api) {
    let poster = api.member("poster@example.com").await;
    let task = api.post_task(&poster, 20.0).await;

    let reply = api
        .call(
            Method::PATCH,
            &format!("/api/tasks/{task}/price"),
            Some(&poster),
            Some(json!({ "newPrice": 37.33 })),
        )
        .await;

    assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
    assert_eq!(reply.body["task"]["price"].as_f64(), Some(37.33));
    assert_eq!(reply.body["split"]["platformFee"].as_f64(), Some(5.6));
    assert_eq!(reply.body["split"]["payeeAmount"].as_f64(), Some(31.73));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn signed_capture_accepts_the_task(api: Api) {
    let poster = api.member("poster@example.com").await;
    let helper = api.payee("helper@example.com").await;
    let task = api.post_task(&poster, 60.0).await;

    api.hire(&poster, &helper, &task).await;

    let view = api.get(&format!("/api/tasks/{task}"), &helper).await;
    assert_eq!(view.body["status"], "accepted");
    assert_eq!(view.body["helper"]["id"], json!(helper.id));
    let offers = api.get(&format!("/api/tasks/{task}/offers"), &poster).await;
    assert_eq!(offers.body[0]["status"], "accepted");
    let jobs = api.get("/api/my-jobs", &helper).await;
    assert_eq!(jobs.body.as_array().map(Vec::len), Some(1));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unsigned_webhook_is_rejected(api: Api) {
    let request = lambda_http::http::Request::builder()
        .method(Method::POST)
        .uri("/api/payments/webhook")
        .header(SIGNATURE_HEADER, "t=1,v1=deadbeef")
        .body(lambda_http::Body::from("{\"id\":\"evt_1\",\"type\":\"checkout.session.completed\"}"))
        .expect("valid request");

    let reply = api.send(request).await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn hiring_an_unready_payee_is_rejected(api: Api) {
    let poster = api.member("poster@example.com").await;
    let helper = api.member("helper@example.com").await;
    let task = api.post_task(&poster, 60.0).await;
    api.post(&format!("/api/tasks/{task}/offers"), &helper, json!({}))
        .await;

    let reply = api
        .post(
            &format!("/api/tasks/{task}/choose-helper"),
            &poster,
            json!({ "helperId": helper.id }),
        )
        .await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert!(api.processor.holds().is_empty());
}
