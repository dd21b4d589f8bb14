//! Shared wiring for driving the API handler in-process.

use crate::test_helpers::{ManualClock, TestMarketplace, wire};
use chrono::Duration;
use lambda_http::http::{Method, StatusCode};
use lambda_http::{Body, Request};
use mockable::Clock;
use rstest::fixture;
use serde_json::{Value, json};
use std::sync::Arc;
use taskmarket::api::{ApiHandler, SIGNATURE_HEADER};
use taskmarket::identity::adapters::RecordingOtpNotifier;
use taskmarket::ids::UserId;
use taskmarket::payments::adapters::InMemoryPaymentProcessor;
use taskmarket::payments::adapters::stripe::WebhookVerifier;
use taskmarket::payments::domain::HoldSessionId;
use taskmarket::persistence::memory::InMemoryMarketplace;

const WEBHOOK_SECRET: &str = "whsec_integration";
pub const PUBLISHABLE_KEY: &str = "pk_test_integration";

/// A decoded handler response.
#[derive(Debug)]
pub struct Reply {
    pub status: StatusCode,
    pub body: Value,
    pub allow_origin: Option<String>,
}

/// A signed-in caller.
#[derive(Debug, Clone)]
pub struct Caller {
    pub id: UserId,
    pub token: String,
}

/// The API handler plus handles on its collaborators.
pub struct Api {
    pub handler: ApiHandler<InMemoryMarketplace, InMemoryPaymentProcessor, RecordingOtpNotifier, ManualClock>,
    pub market: Arc<TestMarketplace>,
    pub processor: Arc<InMemoryPaymentProcessor>,
    pub notifier: Arc<RecordingOtpNotifier>,
    pub clock: Arc<ManualClock>,
    signer: WebhookVerifier,
}

#[fixture]
pub fn api() -> Api {
    let wired = wire();
    let verifier = WebhookVerifier::new(WEBHOOK_SECRET, Duration::minutes(5));
    let handler = ApiHandler::new(
        Arc::clone(&wired.market),
        verifier.clone(),
        Arc::clone(&wired.clock),
    )
    .with_publishable_key(PUBLISHABLE_KEY);
    Api {
        handler,
        market: wired.market,
        processor: wired.processor,
        notifier: wired.notifier,
        clock: wired.clock,
        signer: verifier,
    }
}

impl Api {
    pub async fn send(&self, request: Request) -> Reply {
        let response = self
            .handler
            .handle(&request)
            .await
            .expect("response should build");
        let status = response.status();
        let allow_origin = response
            .headers()
            .get("Access-Control-Allow-Origin")
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let raw: &[u8] = response.body().as_ref();
        let body = if raw.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(raw).expect("JSON response body")
        };
        Reply {
            status,
            body,
            allow_origin,
        }
    }

    pub async fn call(
        &self,
        method: Method,
        path: &str,
        caller: Option<&Caller>,
        body: Option<Value>,
    ) -> Reply {
        let mut builder = lambda_http::http::Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json");
        if let Some(caller) = caller {
            builder = builder.header("Authorization", format!("Bearer {}", caller.token));
        }
        let body = body.map_or(Body::Empty, |value| Body::from(value.to_string()));
        self.send(builder.body(body).expect("valid request")).await
    }

    pub async fn get(&self, path: &str, caller: &Caller) -> Reply {
        self.call(Method::GET, path, Some(caller), None).await
    }

    pub async fn post(&self, path: &str, caller: &Caller, body: Value) -> Reply {
        self.call(Method::POST, path, Some(caller), Some(body)).await
    }

    /// Logs in through the OTP endpoints.
    pub async fn login(&self, email: &str) -> Caller {
        let sent = self
            .call(Method::POST, "/api/auth/send-otp", None, Some(json!({ "email": email })))
            .await;
        assert_eq!(sent.status, StatusCode::OK);
        let code = self.notifier.latest_code(email).expect("code delivered");
        let verified = self
            .call(
                Method::POST,
                "/api/auth/verify-otp",
                None,
                Some(json!({ "email": email, "code": code })),
            )
            .await;
        assert_eq!(verified.status, StatusCode::OK, "{}", verified.body);
        let id = verified.body["user"]["id"]
            .as_str()
            .expect("user id")
            .parse()
            .expect("uuid user id");
        Caller {
            id,
            token: verified.body["token"].as_str().expect("token").to_owned(),
        }
    }

    /// Logs in and uploads a profile photo.
    pub async fn member(&self, email: &str) -> Caller {
        let caller = self.login(email).await;
        let reply = self
            .call(
                Method::PUT,
                &format!("/api/users/{}/photo", caller.id),
                Some(&caller),
                Some(json!({ "photoUrl": "https://img.test/face.jpg" })),
            )
            .await;
        assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
        caller
    }

    /// A member whose payee account can receive payouts.
    pub async fn payee(&self, email: &str) -> Caller {
        let caller = self.member(email).await;
        let reply = self.post("/api/payee/onboard", &caller, json!({})).await;
        assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
        let account = self
            .market
            .identity()
            .current_user(caller.id)
            .await
            .expect("user exists")
            .payee_account_id()
            .cloned()
            .expect("payee account linked");
        self.processor.enable_payouts(&account);
        caller
    }

    pub async fn post_task(&self, poster: &Caller, price: f64) -> String {
        let reply = self
            .post(
                "/api/tasks",
                poster,
                json!({
                    "title": "Mount a television",
                    "category": "handyman",
                    "zipCode": "94110",
                    "fullAddress": "12 Valencia St",
                    "price": price,
                }),
            )
            .await;
        assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
        reply.body["id"].as_str().expect("task id").to_owned()
    }

    /// Delivers a signed capture webhook for `session_id`.
    pub async fn deliver_capture(&self, session_id: &str) -> Reply {
        let session = HoldSessionId::new(session_id).expect("session id");
        let event = self.processor.capture(&session).expect("known session");
        let payload = event.payload.to_string();
        let header = self
            .signer
            .sign(payload.as_bytes(), self.clock.utc().timestamp());
        let request = lambda_http::http::Request::builder()
            .method(Method::POST)
            .uri("/api/payments/webhook")
            .header(SIGNATURE_HEADER, header)
            .body(Body::from(payload))
            .expect("valid request");
        self.send(request).await
    }

    /// Offer, choose and capture through the API.
    pub async fn hire(&self, poster: &Caller, helper: &Caller, task: &str) {
        let offer = self
            .post(&format!("/api/tasks/{task}/offers"), helper, json!({}))
            .await;
        assert_eq!(offer.status, StatusCode::CREATED, "{}", offer.body);
        let checkout = self
            .post(
                &format!("/api/tasks/{task}/choose-helper"),
                poster,
                json!({ "helperId": helper.id }),
            )
            .await;
        assert_eq!(checkout.status, StatusCode::OK, "{}", checkout.body);
        let session = checkout.body["sessionId"].as_str().expect("session id");
        let captured = self.deliver_capture(session).await;
        assert_eq!(captured.status, StatusCode::OK, "{}", captured.body);
    }
}
