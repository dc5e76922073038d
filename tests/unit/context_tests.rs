//! Unit tests for the request context and its scoped storage views.

use std::sync::Arc;

use agent_relay::models::message::Message;
use agent_relay::orchestrator::{CallContext, RequestContext, ScopedMessageStore};
use agent_relay::persistence::{InMemoryMessageStore, InMemoryTaskStore, MessageStore};

#[tokio::test]
async fn scoped_store_stamps_the_conversation_id() {
    let store: Arc<dyn MessageStore> = Arc::new(InMemoryMessageStore::new());
    let scoped = ScopedMessageStore::new("c-1", Arc::clone(&store));

    scoped
        .append(Message::user_text("hello").with_context_id("c-other"))
        .await
        .expect("append");

    let listed = scoped.list().await.expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].context_id.as_deref(), Some("c-1"));
}

#[tokio::test]
async fn scoped_store_only_sees_its_own_conversation() {
    let store: Arc<dyn MessageStore> = Arc::new(InMemoryMessageStore::new());
    let mine = ScopedMessageStore::new("c-1", Arc::clone(&store));
    let theirs = ScopedMessageStore::new("c-2", Arc::clone(&store));

    mine.append(Message::user_text("mine")).await.expect("append");
    theirs
        .append(Message::user_text("theirs"))
        .await
        .expect("append");

    let listed = mine.list().await.expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].text(), "mine");
}

#[tokio::test]
async fn request_context_exposes_user_input() {
    let context = RequestContext::new(
        "c-1",
        "t-1",
        Some(Message::user_text("find the answer")),
        None,
        CallContext::for_principal("alice"),
        Arc::new(InMemoryMessageStore::new()),
        Arc::new(InMemoryTaskStore::new()),
    );

    assert_eq!(context.context_id(), "c-1");
    assert_eq!(context.task_id(), "t-1");
    assert_eq!(context.user_input(), "find the answer");
    assert_eq!(context.call().principal.as_deref(), Some("alice"));
    assert!(context.task().is_none());
}

#[tokio::test]
async fn cancellation_context_has_no_message() {
    let context = RequestContext::new(
        "c-1",
        "t-1",
        None,
        None,
        CallContext::anonymous(),
        Arc::new(InMemoryMessageStore::new()),
        Arc::new(InMemoryTaskStore::new()),
    );

    assert!(context.message().is_none());
    assert_eq!(context.user_input(), "");
    assert!(context.call().principal.is_none());
}
