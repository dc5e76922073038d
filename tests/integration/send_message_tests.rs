//! Integration tests for the non-streaming send-message operation.

use std::sync::Arc;

use agent_relay::models::message::Message;
use agent_relay::models::task::TaskState;
use agent_relay::orchestrator::CallContext;
use agent_relay::protocol::{MessageSendConfiguration, MessageSendParams, SendMessageResult};
use agent_relay::AppError;

use super::test_helpers::{
    harness, wait_for_idle, BadFirstEventExecutor, CompletingExecutor, HelloExecutor,
    SilentExecutor,
};

fn blocking(message: Message) -> MessageSendParams {
    MessageSendParams {
        message,
        configuration: Some(MessageSendConfiguration {
            blocking: true,
            history_length: None,
        }),
    }
}

fn non_blocking(message: Message) -> MessageSendParams {
    MessageSendParams {
        message,
        configuration: None,
    }
}

#[tokio::test]
async fn plain_message_reply_resolves_to_the_message() {
    let harness = harness(Arc::new(HelloExecutor));
    let result = harness
        .server
        .send_message(
            non_blocking(Message::user_text("hello world")),
            &CallContext::anonymous(),
        )
        .await
        .expect("send");

    let SendMessageResult::Message(message) = result else {
        panic!("expected a message result, got {result:?}");
    };
    assert_eq!(message.text(), "Hello World");
    wait_for_idle(harness.server.manager()).await;
}

#[tokio::test]
async fn non_blocking_resolves_the_first_task_snapshot() {
    let harness = harness(Arc::new(CompletingExecutor));
    let result = harness
        .server
        .send_message(
            non_blocking(Message::user_text("do task")),
            &CallContext::anonymous(),
        )
        .await
        .expect("send");

    let SendMessageResult::Task(task) = result else {
        panic!("expected a task result, got {result:?}");
    };
    // First event is the freshly submitted snapshot; the session keeps
    // running in the background.
    assert_eq!(task.status.state, TaskState::Submitted);
    wait_for_idle(harness.server.manager()).await;
}

#[tokio::test]
async fn blocking_resolves_the_final_task_snapshot() {
    let harness = harness(Arc::new(CompletingExecutor));
    let result = harness
        .server
        .send_message(
            blocking(Message::user_text("do task")),
            &CallContext::anonymous(),
        )
        .await
        .expect("send");

    let SendMessageResult::Task(task) = result else {
        panic!("expected a task result, got {result:?}");
    };
    assert_eq!(task.status.state, TaskState::Completed);
    wait_for_idle(harness.server.manager()).await;
}

#[tokio::test]
async fn unexpected_first_event_shape_is_an_internal_error() {
    let harness = harness(Arc::new(BadFirstEventExecutor));
    let err = harness
        .server
        .send_message(
            non_blocking(Message::user_text("go")),
            &CallContext::anonymous(),
        )
        .await
        .expect_err("must fail");
    assert!(matches!(err, AppError::Internal(_)), "got {err:?}");
    wait_for_idle(harness.server.manager()).await;
}

#[tokio::test]
async fn empty_stream_is_an_internal_error() {
    let harness = harness(Arc::new(SilentExecutor));

    let err = harness
        .server
        .send_message(
            blocking(Message::user_text("go")),
            &CallContext::anonymous(),
        )
        .await
        .expect_err("must fail");
    assert!(matches!(err, AppError::Internal(_)), "got {err:?}");

    let err = harness
        .server
        .send_message(
            non_blocking(Message::user_text("again")),
            &CallContext::anonymous(),
        )
        .await
        .expect_err("must fail");
    assert!(matches!(err, AppError::Internal(_)), "got {err:?}");

    wait_for_idle(harness.server.manager()).await;
}
