//! Lambda HTTP handler dispatching resolved routes onto the services.

use super::payloads::{
    AmountBody, CancelBody, ChooseHelperBody, CreateTaskBody, DisputeBody, EvidenceBody,
    ExtraWorkBody, MessageBody, OfferBody, PhotoBody, PriceBody, ProfileBody, Query, SendCodeBody,
    VerifyCodeBody, decode,
};
use super::response::Reply;
use super::routes::{
    AccountRoute, ChatRoute, DisputeRoute, ExtraWorkRoute, Route, RouteMiss, TaskRoute,
    TasksRoute,
};
use super::views::{
    ActivityView, CheckoutView, DisputeView, ExtraWorkView, MessageView, OfferView, TaskView, ThreadView,
    UserView, many,
};
use crate::activity::domain::ActivityQuery;
use crate::app::Marketplace;
use crate::error::{MarketplaceError, MarketplaceResult};
use crate::identity::ports::OtpNotifier;
use crate::ids::{DisputeId, ExtraWorkId, TaskId, UserId};
use crate::payments::adapters::stripe::WebhookVerifier;
use crate::payments::ports::PaymentProcessor;
use crate::persistence::MarketplaceStore;
use lambda_http::http::header::{AUTHORIZATION, HeaderValue};
use lambda_http::http::{Method, StatusCode};
use lambda_http::{Body, Error, Request, Response};
use mockable::Clock;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

/// Header carrying the processor's webhook signature.
pub const SIGNATURE_HEADER: &str = "Stripe-Signature";

fn with_cors_headers(mut resp: Response<Body>) -> Response<Body> {
    let headers = resp.headers_mut();
    headers.insert(
        "Access-Control-Allow-Origin",
        HeaderValue::from_static("*"),
    );
    headers.insert(
        "Access-Control-Allow-Methods",
        HeaderValue::from_static("GET,POST,PUT,PATCH,OPTIONS"),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        HeaderValue::from_static("Content-Type,Authorization"),
    );
    resp
}

/// Serves the marketplace JSON API.
pub struct ApiHandler<S, P, N, C>
where
    S: MarketplaceStore,
    P: PaymentProcessor,
    N: OtpNotifier,
    C: Clock + Send + Sync,
{
    marketplace: Arc<Marketplace<S, P, N, C>>,
    verifier: WebhookVerifier,
    clock: Arc<C>,
    publishable_key: Option<String>,
}

impl<S, P, N, C> ApiHandler<S, P, N, C>
where
    S: MarketplaceStore,
    P: PaymentProcessor,
    N: OtpNotifier,
    C: Clock + Send + Sync,
{
    /// Creates a handler over wired services.
    #[must_use]
    pub const fn new(
        marketplace: Arc<Marketplace<S, P, N, C>>,
        verifier: WebhookVerifier,
        clock: Arc<C>,
    ) -> Self {
        Self {
            marketplace,
            verifier,
            clock,
            publishable_key: None,
        }
    }

    /// Serves `key` from the unauthenticated processor config endpoint.
    #[must_use]
    pub fn with_publishable_key(mut self, key: impl Into<String>) -> Self {
        self.publishable_key = Some(key.into());
        self
    }

    /// Handles one request. Service failures become JSON error replies;
    /// only response construction can fail.
    ///
    /// # Errors
    ///
    /// Returns the transport error when the response cannot be built.
    pub async fn handle(&self, request: &Request) -> Result<Response<Body>, Error> {
        let method = request.method().clone();
        let path = request.uri().path().to_owned();
        debug!(%method, %path, "request received");

        if method == Method::OPTIONS {
            let resp = Response::builder()
                .status(StatusCode::NO_CONTENT)
                .body(Body::Empty)
                .map_err(Box::new)?;
            return Ok(with_cors_headers(resp));
        }

        let reply = match Route::resolve(&method, &path) {
            Ok(route) => self
                .dispatch(route, request)
                .await
                .unwrap_or_else(|err| Reply::from_error(&err)),
            Err(RouteMiss::NotFound) => Reply::message(StatusCode::NOT_FOUND, "route not found"),
            Err(RouteMiss::MethodNotAllowed) => {
                Reply::message(StatusCode::METHOD_NOT_ALLOWED, "method not allowed")
            }
        };
        reply.into_response().map(with_cors_headers)
    }

    async fn dispatch(&self, route: Route, request: &Request) -> MarketplaceResult<Reply> {
        let body: &[u8] = request.body().as_ref();
        match route {
            Route::Health => Reply::ok(&json!({ "status": "ok" })),
            Route::SendCode => self.send_code(body).await,
            Route::VerifyCode => self.verify_code(body).await,
            Route::Webhook => self.webhook(request).await,
            Route::ProcessorConfig => {
                let key = self
                    .publishable_key
                    .as_deref()
                    .ok_or(MarketplaceError::NotFound("publishable key"))?;
                Reply::ok(&json!({ "publishableKey": key }))
            }
            Route::Account(account) => {
                let actor = self.authenticate(request).await?;
                self.account(actor, account, body).await
            }
            Route::Tasks(tasks) => {
                let actor = self.authenticate(request).await?;
                self.tasks(actor, tasks, request).await
            }
            Route::Task(task_id, action) => {
                let actor = self.authenticate(request).await?;
                self.task(actor, task_id, action, body).await
            }
            Route::ExtraWork(request_id, action) => {
                let actor = self.authenticate(request).await?;
                self.extra_work(actor, request_id, action).await
            }
            Route::Dispute(dispute_id, action) => {
                let actor = self.authenticate(request).await?;
                self.dispute(actor, dispute_id, action, body).await
            }
            Route::Chat(chat) => {
                let actor = self.authenticate(request).await?;
                self.chat(actor, chat, body).await
            }
            Route::ActivityLogs => {
                self.authenticate(request).await?;
                let (task_id, user_id, limit) =
                    Query::parse(request.uri().query()).activity_filter()?;
                let entries = self
                    .marketplace
                    .activity()
                    .list(&ActivityQuery::new(task_id, user_id, limit))
                    .await?;
                Reply::ok(&many::<_, ActivityView>(&entries))
            }
        }
    }

    async fn authenticate(&self, request: &Request) -> MarketplaceResult<UserId> {
        let token = request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(MarketplaceError::Unauthenticated)?;
        let user = self.marketplace.identity().authenticate(token).await?;
        Ok(user.id())
    }

    async fn send_code(&self, body: &[u8]) -> MarketplaceResult<Reply> {
        let payload: SendCodeBody = decode(body)?;
        self.marketplace
            .identity()
            .request_code(&payload.email)
            .await?;
        Reply::ok(&json!({ "success": true }))
    }

    async fn verify_code(&self, body: &[u8]) -> MarketplaceResult<Reply> {
        let payload: VerifyCodeBody = decode(body)?;
        let session = self
            .marketplace
            .identity()
            .verify_code(&payload.email, &payload.code)
            .await?;
        Reply::ok(&json!({
            "token": session.token.as_str(),
            "expiresAt": session.expires_at,
            "user": UserView::from(&session.user),
        }))
    }

    async fn webhook(&self, request: &Request) -> MarketplaceResult<Reply> {
        let header = request
            .headers()
            .get(SIGNATURE_HEADER)
            .and_then(|value| value.to_str().ok());
        let event = self
            .verifier
            .verify_and_parse(request.body().as_ref(), header, self.clock.utc())
            .map_err(|err| MarketplaceError::WebhookSignature(err.to_string()))?;
        let outcome = self.marketplace.settlement().handle(event).await?;
        info!(?outcome, "webhook processed");
        Reply::ok(&json!({ "received": true }))
    }

    async fn account(
        &self,
        actor: UserId,
        route: AccountRoute,
        body: &[u8],
    ) -> MarketplaceResult<Reply> {
        let identity = self.marketplace.identity();
        match route {
            AccountRoute::Me => Reply::ok(&UserView::from(&identity.current_user(actor).await?)),
            AccountRoute::UpdateProfile(user_id) => {
                let payload: ProfileBody = decode(body)?;
                let user = identity
                    .update_profile(actor, user_id, payload.into())
                    .await?;
                Reply::ok(&UserView::from(&user))
            }
            AccountRoute::UpdatePhoto(user_id) => {
                let payload: PhotoBody = decode(body)?;
                let user = identity
                    .update_photo(actor, user_id, &payload.photo_url)
                    .await?;
                Reply::ok(&UserView::from(&user))
            }
            AccountRoute::HasPhoto(user_id) => {
                Reply::ok(&json!({ "hasPhoto": identity.has_photo(user_id).await? }))
            }
            AccountRoute::PayeeOnboard => {
                let link = self.marketplace.payees().start_onboarding(actor).await?;
                Reply::ok(&json!({ "url": link.url }))
            }
            AccountRoute::PayeeStatus => {
                Reply::ok(&self.marketplace.payees().payee_status(actor).await?)
            }
        }
    }

    async fn tasks(
        &self,
        actor: UserId,
        route: TasksRoute,
        request: &Request,
    ) -> MarketplaceResult<Reply> {
        let tasks = self.marketplace.tasks();
        let viewer = Some(actor);
        match route {
            TasksRoute::Create => {
                let payload: CreateTaskBody = decode(request.body().as_ref())?;
                let task = tasks.create_task(actor, payload.into_request()?).await?;
                Reply::created(&TaskView::for_viewer(&task, viewer))
            }
            TasksRoute::Discover => {
                let query = Query::parse(request.uri().query()).task_list()?;
                Reply::ok(&TaskView::list(&tasks.list_tasks(query).await?, viewer))
            }
            TasksRoute::Posted => Reply::ok(&TaskView::list(&tasks.list_posted(actor).await?, viewer)),
            TasksRoute::Jobs => Reply::ok(&TaskView::list(&tasks.list_jobs(actor).await?, viewer)),
            TasksRoute::NeedingPriceAdjustment => Reply::ok(&TaskView::list(
                &tasks.list_needing_price_adjustment(actor).await?,
                viewer,
            )),
        }
    }

    async fn task(
        &self,
        actor: UserId,
        task_id: TaskId,
        route: TaskRoute,
        body: &[u8],
    ) -> MarketplaceResult<Reply> {
        match route {
            TaskRoute::SubmitOffer | TaskRoute::ListOffers | TaskRoute::ChooseHelper => {
                self.hiring(actor, task_id, route, body).await
            }
            TaskRoute::Tip | TaskRoute::RequestExtraWork | TaskRoute::ListExtraWork => {
                self.billing(actor, task_id, route, body).await
            }
            TaskRoute::Get
            | TaskRoute::Start
            | TaskRoute::MarkDone
            | TaskRoute::Complete
            | TaskRoute::Cancel => self.progress(actor, task_id, route, body).await,
            TaskRoute::Dispute | TaskRoute::AdjustPrice | TaskRoute::AcknowledgePricePrompt => {
                self.amendments(actor, task_id, route, body).await
            }
        }
    }

    async fn hiring(
        &self,
        actor: UserId,
        task_id: TaskId,
        route: TaskRoute,
        body: &[u8],
    ) -> MarketplaceResult<Reply> {
        match route {
            TaskRoute::SubmitOffer => {
                let payload: OfferBody = decode(body)?;
                let offer = self
                    .marketplace
                    .offers()
                    .submit(actor, task_id, payload.note, payload.proposed_price)
                    .await?;
                Reply::created(&OfferView::from(&offer))
            }
            TaskRoute::ListOffers => {
                let offers = self.marketplace.offers().list(task_id).await?;
                Reply::ok(&many::<_, OfferView>(&offers))
            }
            _ => {
                let payload: ChooseHelperBody = decode(body)?;
                let helper_id = payload
                    .helper_id
                    .ok_or_else(|| MarketplaceError::validation("helperId is required"))?;
                let hire = self
                    .marketplace
                    .tasks()
                    .choose_helper(actor, task_id, helper_id)
                    .await?;
                Reply::ok(&CheckoutView {
                    checkout_url: hire.session.checkout_url,
                    session_id: hire.session.id,
                    split: Some(hire.split),
                })
            }
        }
    }

    async fn progress(
        &self,
        actor: UserId,
        task_id: TaskId,
        route: TaskRoute,
        body: &[u8],
    ) -> MarketplaceResult<Reply> {
        let tasks = self.marketplace.tasks();
        let task = match route {
            TaskRoute::Start => tasks.start_work(actor, task_id).await?,
            TaskRoute::MarkDone => tasks.mark_done(actor, task_id).await?,
            TaskRoute::Complete => tasks.complete(actor, task_id).await?,
            TaskRoute::Cancel => {
                let payload: CancelBody = decode(body)?;
                tasks.cancel(actor, task_id, payload.role()?).await?
            }
            _ => tasks.get_task(task_id).await?,
        };
        Reply::ok(&TaskView::for_viewer(&task, Some(actor)))
    }

    async fn amendments(
        &self,
        actor: UserId,
        task_id: TaskId,
        route: TaskRoute,
        body: &[u8],
    ) -> MarketplaceResult<Reply> {
        let tasks = self.marketplace.tasks();
        match route {
            TaskRoute::Dispute => {
                let payload: DisputeBody = decode(body)?;
                let (task, dispute) = tasks.open_dispute(actor, task_id, payload.into()).await?;
                Reply::created(&json!({
                    "task": TaskView::for_viewer(&task, Some(actor)),
                    "dispute": DisputeView::from(&dispute),
                }))
            }
            TaskRoute::AdjustPrice => {
                let payload: PriceBody = decode(body)?;
                let new_price = payload
                    .new_price
                    .ok_or_else(|| MarketplaceError::validation("newPrice is required"))?;
                let (task, split) = tasks.adjust_price(actor, task_id, new_price).await?;
                Reply::ok(&json!({
                    "task": TaskView::for_viewer(&task, Some(actor)),
                    "split": split,
                }))
            }
            _ => {
                let task = tasks.acknowledge_price_prompt(actor, task_id).await?;
                Reply::ok(&TaskView::for_viewer(&task, Some(actor)))
            }
        }
    }

    async fn billing(
        &self,
        actor: UserId,
        task_id: TaskId,
        route: TaskRoute,
        body: &[u8],
    ) -> MarketplaceResult<Reply> {
        let billing = self.marketplace.billing();
        match route {
            TaskRoute::Tip => {
                let payload: AmountBody = decode(body)?;
                let tip = billing.request_tip(actor, task_id, payload.amount()?).await?;
                Reply::ok(&CheckoutView {
                    checkout_url: tip.session.checkout_url,
                    session_id: tip.session.id,
                    split: None,
                })
            }
            TaskRoute::RequestExtraWork => {
                let payload: ExtraWorkBody = decode(body)?;
                let amount = payload
                    .amount
                    .ok_or_else(|| MarketplaceError::validation("amount is required"))?;
                let request = billing
                    .request_extra_work(actor, task_id, amount, &payload.reason, payload.photo_urls)
                    .await?;
                Reply::created(&ExtraWorkView::from(&request))
            }
            _ => {
                let requests = billing.list_extra_work(actor, task_id).await?;
                Reply::ok(&many::<_, ExtraWorkView>(&requests))
            }
        }
    }

    async fn extra_work(
        &self,
        actor: UserId,
        request_id: ExtraWorkId,
        route: ExtraWorkRoute,
    ) -> MarketplaceResult<Reply> {
        let billing = self.marketplace.billing();
        match route {
            ExtraWorkRoute::Accept => {
                let accepted = billing.accept_extra_work(actor, request_id).await?;
                Reply::ok(&json!({
                    "request": ExtraWorkView::from(&accepted.request),
                    "checkout": CheckoutView {
                        checkout_url: accepted.session.checkout_url,
                        session_id: accepted.session.id,
                        split: Some(accepted.split),
                    },
                }))
            }
            ExtraWorkRoute::Decline => {
                let declined = billing.decline_extra_work(actor, request_id).await?;
                Reply::ok(&ExtraWorkView::from(&declined))
            }
        }
    }

    async fn dispute(
        &self,
        actor: UserId,
        dispute_id: DisputeId,
        route: DisputeRoute,
        body: &[u8],
    ) -> MarketplaceResult<Reply> {
        let disputes = self.marketplace.disputes();
        let dispute = match route {
            DisputeRoute::Get => disputes.get(actor, dispute_id).await?,
            DisputeRoute::AddEvidence => {
                let payload: EvidenceBody = decode(body)?;
                disputes
                    .append_evidence(actor, dispute_id, payload.photo_urls)
                    .await?
            }
        };
        Reply::ok(&DisputeView::from(&dispute))
    }

    async fn chat(&self, actor: UserId, route: ChatRoute, body: &[u8]) -> MarketplaceResult<Reply> {
        let chat = self.marketplace.chat();
        match route {
            ChatRoute::Threads => Reply::ok(&many::<_, ThreadView>(&chat.threads_for(actor).await?)),
            ChatRoute::Messages(thread_id) => {
                Reply::ok(&many::<_, MessageView>(&chat.messages(actor, thread_id).await?))
            }
            ChatRoute::Post(thread_id) => {
                let payload: MessageBody = decode(body)?;
                let message = chat.post(actor, thread_id, payload.into()).await?;
                Reply::created(&MessageView::from(&message))
            }
        }
    }
}
