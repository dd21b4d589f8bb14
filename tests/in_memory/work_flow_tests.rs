//! Work progress, chat, extra work, tips and the activity trail over HTTP.

use super::support::{Api, Caller, api};
use lambda_http::http::StatusCode;
use rstest::rstest;
use serde_json::{Value, json};

struct Job {
    poster: Caller,
    helper: Caller,
    task: String,
}

async fn hired_job(api: &Api) -> Job {
    let poster = api.member("poster@example.com").await;
    let helper = api.payee("helper@example.com").await;
    let task = api.post_task(&poster, 100.0).await;
    api.hire(&poster, &helper, &task).await;
    Job {
        poster,
        helper,
        task,
    }
}

fn events(reply: &Value) -> Vec<String> {
    reply
        .as_array()
        .expect("activity list")
        .iter()
        .filter_map(|entry| entry["event"].as_str().map(str::to_owned))
        .collect()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn work_progresses_to_completion(api: Api) {
    let job = hired_job(&api).await;
    let base = format!("/api/tasks/{}", job.task);

    let started = api.post(&format!("{base}/start"), &job.helper, json!({})).await;
    let done = api
        .post(&format!("{base}/mark-done"), &job.helper, json!({}))
        .await;
    let completed = api
        .post(&format!("{base}/complete"), &job.poster, json!({}))
        .await;

    assert_eq!(started.body["status"], "in_progress");
    assert_eq!(done.body["status"], "worker_marked_done");
    assert_eq!(completed.status, StatusCode::OK, "{}", completed.body);
    assert_eq!(completed.body["status"], "completed");
    let helper = api.get("/api/users/me", &job.helper).await;
    assert_eq!(helper.body["completedJobsCount"], 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn poster_cannot_start_the_work(api: Api) {
    let job = hired_job(&api).await;

    let reply = api
        .post(&format!("/api/tasks/{}/start", job.task), &job.poster, json!({}))
        .await;

    assert_eq!(reply.status, StatusCode::FORBIDDEN);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn parties_chat_on_the_hire_thread(api: Api) {
    let job = hired_job(&api).await;
    let outsider = api.member("outsider@example.com").await;

    let threads = api.get("/api/chat/threads", &job.helper).await;
    let thread = threads.body[0]["id"].as_str().expect("thread id").to_owned();
    let path = format!("/api/chat/threads/{thread}/messages");
    let posted = api
        .post(&path, &job.helper, json!({ "text": "On my way" }))
        .await;
    let read = api.get(&path, &job.poster).await;
    let snooped = api.get(&path, &outsider).await;

    assert_eq!(posted.status, StatusCode::CREATED, "{}", posted.body);
    assert_eq!(read.body[0]["text"], "On my way");
    assert_eq!(snooped.status, StatusCode::FORBIDDEN);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn accepted_extra_work_is_paid_on_capture(api: Api) {
    let job = hired_job(&api).await;
    let requested = api
        .post(
            &format!("/api/tasks/{}/extra-work", job.task),
            &job.helper,
            json!({ "amount": 20, "reason": "Second bracket needed" }),
        )
        .await;
    assert_eq!(requested.status, StatusCode::CREATED, "{}", requested.body);
    let request_id = requested.body["id"].as_str().expect("request id");

    let accepted = api
        .post(
            &format!("/api/extra-work/{request_id}/accept"),
            &job.poster,
            json!({}),
        )
        .await;
    let session = accepted.body["checkout"]["sessionId"]
        .as_str()
        .expect("session id");
    let captured = api.deliver_capture(session).await;

    assert_eq!(captured.status, StatusCode::OK, "{}", captured.body);
    let listed = api
        .get(&format!("/api/tasks/{}/extra-work", job.task), &job.poster)
        .await;
    assert_eq!(listed.body[0]["status"], "paid");
    let task = api
        .get(&format!("/api/tasks/{}", job.task), &job.poster)
        .await;
    assert_eq!(task.body["extraAmountPaid"].as_f64(), Some(20.0));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn tip_lands_after_completion(api: Api) {
    let job = hired_job(&api).await;
    let base = format!("/api/tasks/{}", job.task);
    api.post(&format!("{base}/complete"), &job.helper, json!({}))
        .await;

    let tip = api
        .post(&format!("{base}/tip"), &job.poster, json!({ "amount": 10 }))
        .await;
    let session = tip.body["sessionId"].as_str().expect("session id");
    api.deliver_capture(session).await;

    let task = api.get(&base, &job.poster).await;
    assert_eq!(task.body["tipAmount"].as_f64(), Some(10.0));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn activity_trail_lists_task_history_newest_first(api: Api) {
    let job = hired_job(&api).await;

    let trail = api
        .get(&format!("/api/activity-logs?taskId={}", job.task), &job.poster)
        .await;

    let names = events(&trail.body);
    assert_eq!(names.last().map(String::as_str), Some("task_created"));
    for expected in ["offer_submitted", "hire_requested", "hire_confirmed"] {
        assert!(names.iter().any(|name| name == expected), "missing {expected}");
    }
}
