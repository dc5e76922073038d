//! Integration tests for attaching to a running task's event stream.

use std::sync::Arc;

use agent_relay::models::event::{Event, TaskEvent};
use agent_relay::models::message::Message;
use agent_relay::models::task::TaskState;
use agent_relay::orchestrator::CallContext;
use agent_relay::protocol::{MessageSendParams, TaskIdParams};
use agent_relay::AppError;
use tokio::sync::Notify;

use super::test_helpers::{harness, wait_for_idle, GatedExecutor};

fn params(message: Message) -> MessageSendParams {
    MessageSendParams {
        message,
        configuration: None,
    }
}

#[tokio::test]
async fn resubscriber_sees_only_events_from_attachment_onward() {
    let release = Arc::new(Notify::new());
    let harness = harness(Arc::new(GatedExecutor {
        release: Arc::clone(&release),
    }));

    let mut original = harness
        .server
        .send_message_streaming(params(Message::user_text("go")), &CallContext::anonymous())
        .await
        .expect("stream");

    // Drain the two pre-gate events; their delivery proves they were
    // published before the resubscription below.
    let first = original.recv().await.expect("snapshot");
    let task_id = first.task_id().expect("task event").to_owned();
    assert!(matches!(original.recv().await, Some(Event::Task(_))));

    let mut attached = harness
        .server
        .resubscribe_task(&TaskIdParams {
            id: task_id.clone(),
        })
        .await
        .expect("resubscribe");

    release.notify_one();

    // The original subscriber sees the completion; the late subscriber
    // sees only the completion — no replay of the earlier events.
    let mut original_states = Vec::new();
    while let Some(event) = original.recv().await {
        if let Event::Task(TaskEvent::Status(update)) = event {
            original_states.push(update.status.state);
        }
    }
    assert_eq!(original_states, vec![TaskState::Completed]);

    let mut attached_events = Vec::new();
    while let Some(event) = attached.recv().await {
        attached_events.push(event);
    }
    assert_eq!(attached_events.len(), 1);
    assert!(matches!(
        &attached_events[0],
        Event::Task(TaskEvent::Status(update)) if update.status.state == TaskState::Completed
    ));

    wait_for_idle(harness.server.manager()).await;
}

#[tokio::test]
async fn resubscribing_a_finished_task_is_rejected() {
    let release = Arc::new(Notify::new());
    let harness = harness(Arc::new(GatedExecutor {
        release: Arc::clone(&release),
    }));

    let mut events = harness
        .server
        .send_message_streaming(params(Message::user_text("go")), &CallContext::anonymous())
        .await
        .expect("stream");
    let first = events.recv().await.expect("snapshot");
    let task_id = first.task_id().expect("task event").to_owned();

    release.notify_one();
    while events.recv().await.is_some() {}
    wait_for_idle(harness.server.manager()).await;

    let err = harness
        .server
        .resubscribe_task(&TaskIdParams { id: task_id })
        .await
        .expect_err("no live session anymore");
    assert!(
        matches!(err, AppError::UnsupportedOperation(_)),
        "got {err:?}"
    );
}

#[tokio::test]
async fn resubscribing_an_unknown_task_is_rejected() {
    let release = Arc::new(Notify::new());
    let harness = harness(Arc::new(GatedExecutor { release }));
    let err = harness
        .server
        .resubscribe_task(&TaskIdParams { id: "nope".into() })
        .await
        .expect_err("must fail");
    assert!(
        matches!(err, AppError::UnsupportedOperation(_)),
        "got {err:?}"
    );
}
