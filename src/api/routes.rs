//! Request path and method to route resolution.

use crate::ids::{DisputeId, ExtraWorkId, TaskId, ThreadId, UserId};
use lambda_http::http::Method;
use std::str::FromStr;

/// A resolved endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Route {
    Health,
    SendCode,
    VerifyCode,
    Webhook,
    ProcessorConfig,
    Account(AccountRoute),
    Tasks(TasksRoute),
    Task(TaskId, TaskRoute),
    ExtraWork(ExtraWorkId, ExtraWorkRoute),
    Dispute(DisputeId, DisputeRoute),
    Chat(ChatRoute),
    ActivityLogs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum AccountRoute {
    Me,
    UpdateProfile(UserId),
    UpdatePhoto(UserId),
    HasPhoto(UserId),
    PayeeOnboard,
    PayeeStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum TasksRoute {
    Create,
    Discover,
    Posted,
    Jobs,
    NeedingPriceAdjustment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum TaskRoute {
    Get,
    SubmitOffer,
    ListOffers,
    ChooseHelper,
    Start,
    MarkDone,
    Complete,
    Cancel,
    Dispute,
    Tip,
    AdjustPrice,
    AcknowledgePricePrompt,
    RequestExtraWork,
    ListExtraWork,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ExtraWorkRoute {
    Accept,
    Decline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum DisputeRoute {
    Get,
    AddEvidence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ChatRoute {
    Threads,
    Messages(ThreadId),
    Post(ThreadId),
}

/// Why no route matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum RouteMiss {
    NotFound,
    MethodNotAllowed,
}

type Resolved = Result<Route, RouteMiss>;

fn only<R>(method: &Method, expected: &Method, route: R) -> Result<R, RouteMiss> {
    if method == expected {
        Ok(route)
    } else {
        Err(RouteMiss::MethodNotAllowed)
    }
}

fn get_or_post<R>(method: &Method, get: R, post: R) -> Result<R, RouteMiss> {
    match *method {
        Method::GET => Ok(get),
        Method::POST => Ok(post),
        _ => Err(RouteMiss::MethodNotAllowed),
    }
}

fn id<T: FromStr>(raw: &str) -> Result<T, RouteMiss> {
    raw.parse().map_err(|_| RouteMiss::NotFound)
}

impl Route {
    /// Resolves `method` and `path`.
    pub fn resolve(method: &Method, path: &str) -> Resolved {
        let segments: Vec<&str> = path.split('/').filter(|part| !part.is_empty()).collect();
        match segments.as_slice() {
            ["health"] | ["api", "health"] => only(method, &Method::GET, Self::Health),
            ["api", "auth", "send-otp"] => only(method, &Method::POST, Self::SendCode),
            ["api", "auth", "verify-otp"] => only(method, &Method::POST, Self::VerifyCode),
            ["api", "payments", "webhook"] => only(method, &Method::POST, Self::Webhook),
            ["api", "stripe", "config"] => only(method, &Method::GET, Self::ProcessorConfig),
            ["api", "users", ..] | ["api", "payee", ..] => Self::account(method, &segments),
            ["api", "tasks"] => get_or_post(
                method,
                Self::Tasks(TasksRoute::Discover),
                Self::Tasks(TasksRoute::Create),
            ),
            ["api", "my-tasks"] => only(method, &Method::GET, Self::Tasks(TasksRoute::Posted)),
            ["api", "my-jobs"] => only(method, &Method::GET, Self::Tasks(TasksRoute::Jobs)),
            ["api", "tasks", "needing-price-adjustment"] => only(
                method,
                &Method::GET,
                Self::Tasks(TasksRoute::NeedingPriceAdjustment),
            ),
            ["api", "tasks", task, rest @ ..] => {
                let task_id = id(task)?;
                Self::task(method, rest).map(|route| Self::Task(task_id, route))
            }
            ["api", "extra-work", request, "accept"] => only(
                method,
                &Method::POST,
                Self::ExtraWork(id(request)?, ExtraWorkRoute::Accept),
            ),
            ["api", "extra-work", request, "decline"] => only(
                method,
                &Method::POST,
                Self::ExtraWork(id(request)?, ExtraWorkRoute::Decline),
            ),
            ["api", "disputes", dispute] => only(
                method,
                &Method::GET,
                Self::Dispute(id(dispute)?, DisputeRoute::Get),
            ),
            ["api", "disputes", dispute, "evidence"] => only(
                method,
                &Method::POST,
                Self::Dispute(id(dispute)?, DisputeRoute::AddEvidence),
            ),
            ["api", "chat", "threads"] => {
                only(method, &Method::GET, Self::Chat(ChatRoute::Threads))
            }
            ["api", "chat", "threads", thread, "messages"] => {
                let thread_id = id(thread)?;
                get_or_post(
                    method,
                    Self::Chat(ChatRoute::Messages(thread_id)),
                    Self::Chat(ChatRoute::Post(thread_id)),
                )
            }
            ["api", "activity-logs"] => only(method, &Method::GET, Self::ActivityLogs),
            _ => Err(RouteMiss::NotFound),
        }
    }

    fn account(method: &Method, segments: &[&str]) -> Resolved {
        let route: Result<AccountRoute, RouteMiss> = match segments {
            ["api", "users", "me"] => only(method, &Method::GET, AccountRoute::Me),
            ["api", "users", user] => {
                only(method, &Method::PUT, AccountRoute::UpdateProfile(id(user)?))
            }
            ["api", "users", user, "photo"] => {
                only(method, &Method::PUT, AccountRoute::UpdatePhoto(id(user)?))
            }
            ["api", "users", user, "has-photo"] => {
                only(method, &Method::GET, AccountRoute::HasPhoto(id(user)?))
            }
            ["api", "payee", "onboard"] => only(method, &Method::POST, AccountRoute::PayeeOnboard),
            ["api", "payee", "status"] => only(method, &Method::GET, AccountRoute::PayeeStatus),
            _ => Err(RouteMiss::NotFound),
        };
        route.map(Self::Account)
    }

    fn task(method: &Method, rest: &[&str]) -> Result<TaskRoute, RouteMiss> {
        match rest {
            [] => only(method, &Method::GET, TaskRoute::Get),
            ["offers"] => get_or_post(method, TaskRoute::ListOffers, TaskRoute::SubmitOffer),
            ["choose-helper"] => only(method, &Method::POST, TaskRoute::ChooseHelper),
            ["start"] => only(method, &Method::POST, TaskRoute::Start),
            ["mark-done"] => only(method, &Method::POST, TaskRoute::MarkDone),
            ["complete"] => only(method, &Method::POST, TaskRoute::Complete),
            ["cancel"] => only(method, &Method::POST, TaskRoute::Cancel),
            ["dispute"] => only(method, &Method::POST, TaskRoute::Dispute),
            ["tip"] => only(method, &Method::POST, TaskRoute::Tip),
            ["price"] => only(method, &Method::PATCH, TaskRoute::AdjustPrice),
            ["price-adjustment", "acknowledge"] => {
                only(method, &Method::POST, TaskRoute::AcknowledgePricePrompt)
            }
            ["extra-work"] => {
                get_or_post(method, TaskRoute::ListExtraWork, TaskRoute::RequestExtraWork)
            }
            _ => Err(RouteMiss::NotFound),
        }
    }
}
