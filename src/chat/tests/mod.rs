//! Chat thread tests.

use crate::chat::domain::{ChatDomainError, MessageDraft, THREAD_LIFETIME_DAYS};
use crate::error::{ErrorKind, MarketplaceError};
use crate::ids::{ThreadId, UserId};
use crate::payments::domain::Money;
use crate::testing::Harness;
use chrono::Duration;

struct Conversation {
    harness: Harness,
    poster: UserId,
    helper: UserId,
    thread: ThreadId,
}

async fn conversation() -> Conversation {
    let harness = Harness::new();
    let poster = harness.member("poster@example.com").await;
    let helper = harness.payee("helper@example.com").await;
    let task = harness.post_task(poster, Money::from_units(30)).await;
    harness.hire(poster, helper, task.id()).await;
    let thread = harness
        .market
        .chat()
        .threads_for(poster)
        .await
        .expect("threads listed")
        .first()
        .map(crate::chat::domain::ChatThread::id)
        .expect("thread opened at hire");
    Conversation {
        harness,
        poster,
        helper,
        thread,
    }
}

fn text(body: &str) -> MessageDraft {
    MessageDraft {
        text: Some(body.to_owned()),
        ..MessageDraft::default()
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn participants_exchange_messages_in_order() {
    let Conversation {
        harness,
        poster,
        helper,
        thread,
    } = conversation().await;
    let chat = harness.market.chat();

    chat.post(poster, thread, text("Gate code is 1234"))
        .await
        .expect("poster posts");
    harness.clock.advance(Duration::minutes(1));
    chat.post(helper, thread, text("Thanks, on my way"))
        .await
        .expect("helper posts");

    let messages = chat.messages(helper, thread).await.expect("messages listed");
    let bodies: Vec<_> = messages.iter().filter_map(|message| message.text()).collect();
    assert_eq!(bodies, ["Gate code is 1234", "Thanks, on my way"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn outsiders_cannot_read_or_post() {
    let Conversation {
        harness, thread, ..
    } = conversation().await;
    let outsider = harness.member("outsider@example.com").await;
    let chat = harness.market.chat();

    let read = chat.messages(outsider, thread).await;
    let post = chat.post(outsider, thread, text("hello")).await;

    assert_eq!(
        read.expect_err("read rejected").kind(),
        ErrorKind::Authorization
    );
    assert_eq!(
        post.expect_err("post rejected").kind(),
        ErrorKind::Authorization
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn blank_messages_are_rejected() {
    let Conversation {
        harness,
        poster,
        thread,
        ..
    } = conversation().await;

    let result = harness
        .market
        .chat()
        .post(
            poster,
            thread,
            MessageDraft {
                text: Some("   ".to_owned()),
                image_url: None,
                is_proof: false,
            },
        )
        .await;

    assert!(matches!(
        result,
        Err(MarketplaceError::Chat(ChatDomainError::EmptyMessage))
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn proof_messages_need_an_image() {
    let Conversation {
        harness,
        helper,
        thread,
        ..
    } = conversation().await;

    let result = harness
        .market
        .chat()
        .post(
            helper,
            thread,
            MessageDraft {
                text: Some("done".to_owned()),
                image_url: None,
                is_proof: true,
            },
        )
        .await;

    assert!(matches!(
        result,
        Err(MarketplaceError::Chat(ChatDomainError::ProofWithoutImage))
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn threads_close_after_their_lifetime() {
    let Conversation {
        harness,
        poster,
        thread,
        ..
    } = conversation().await;
    harness
        .clock
        .advance(Duration::days(THREAD_LIFETIME_DAYS) + Duration::minutes(1));

    let result = harness
        .market
        .chat()
        .post(poster, thread, text("still there?"))
        .await;

    assert!(matches!(
        result,
        Err(MarketplaceError::Chat(ChatDomainError::ThreadClosed(_)))
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_threads_are_not_found() {
    let harness = Harness::new();
    let user = harness.member("someone@example.com").await;

    let result = harness.market.chat().messages(user, ThreadId::new()).await;

    assert!(matches!(result, Err(MarketplaceError::NotFound("thread"))));
}
