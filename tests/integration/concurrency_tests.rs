//! Integration tests for races the concurrency core must survive.

use std::sync::Arc;

use agent_relay::models::event::{Event, TaskEvent};
use agent_relay::models::message::Message;
use agent_relay::models::task::TaskState;
use agent_relay::orchestrator::{CallContext, EventProcessor, Session};
use agent_relay::persistence::{InMemoryPushConfigStore, InMemoryTaskStore};
use agent_relay::protocol::{MessageSendParams, TaskIdParams};
use agent_relay::AppError;
use tokio::sync::Notify;

use super::test_helpers::{
    harness, wait_for_idle, CompletingExecutor, GatedExecutor, RecordingSender,
};

fn params(message: Message) -> MessageSendParams {
    MessageSendParams {
        message,
        configuration: None,
    }
}

#[tokio::test]
async fn concurrent_duplicate_registration_admits_exactly_one() {
    let task_store = Arc::new(InMemoryTaskStore::new());
    let manager = Arc::new(agent_relay::orchestrator::SessionManager::new(
        task_store.clone(),
        Arc::new(InMemoryPushConfigStore::new()),
        Arc::new(RecordingSender::default()),
    ));

    let make_session = || {
        let processor = Arc::new(EventProcessor::new("c-1", "t-1", task_store.clone()));
        Arc::new(Session::new(
            "c-1",
            "t-1",
            processor,
            futures_util::future::pending::<()>(),
        ))
    };
    let first = make_session();
    let second = make_session();

    let (a, b) = tokio::join!(
        manager.add_session(Arc::clone(&first)),
        manager.add_session(Arc::clone(&second)),
    );
    assert_eq!(
        u32::from(a.is_ok()) + u32::from(b.is_ok()),
        1,
        "exactly one registration wins"
    );
    assert_eq!(manager.active_sessions().await, 1);

    // Neither job ever started; closing both tears everything down.
    first.close().await;
    second.close().await;
    wait_for_idle(&manager).await;
}

#[tokio::test]
async fn parallel_sessions_keep_their_own_event_order() {
    let harness = harness(Arc::new(CompletingExecutor));

    let ctx = CallContext::anonymous();
    let (left, right) = tokio::join!(
        harness
            .server
            .send_message_streaming(params(Message::user_text("one")), &ctx),
        harness
            .server
            .send_message_streaming(params(Message::user_text("two")), &ctx),
    );
    let mut left = left.expect("left stream");
    let mut right = right.expect("right stream");

    let mut left_task = None;
    let mut right_task = None;
    for (stream, seen_task) in [(&mut left, &mut left_task), (&mut right, &mut right_task)] {
        let mut states = Vec::new();
        while let Some(event) = stream.recv().await {
            match event {
                Event::Task(TaskEvent::Snapshot(task)) => {
                    *seen_task = Some(task.id.clone());
                    states.push(task.status.state);
                }
                Event::Task(TaskEvent::Status(update)) => states.push(update.status.state),
                other => panic!("unexpected event {other:?}"),
            }
        }
        assert_eq!(
            states,
            vec![TaskState::Submitted, TaskState::Working, TaskState::Completed]
        );
    }
    assert_ne!(
        left_task.expect("left task id"),
        right_task.expect("right task id"),
        "each request got its own task"
    );

    wait_for_idle(harness.server.manager()).await;
}

#[tokio::test]
async fn cancel_racing_completion_finalizes_exactly_once() {
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

    // Release the gate and cancel at the same moment: the completion
    // monitor and the explicit cancel now race to finalize the task.
    let cancel_params = TaskIdParams {
        id: task_id.clone(),
    };
    let call = CallContext::anonymous();
    let ((), cancel_result) = tokio::join!(
        async {
            release.notify_one();
        },
        harness.server.cancel_task(&cancel_params, &call),
    );

    // Whichever side won, the loser observed already-cleaned-up state:
    // either the cancel went through, or it found a task that had just
    // completed and correctly refused.
    match cancel_result {
        Ok(_) | Err(AppError::UnsupportedOperation(_)) => {}
        Err(other) => panic!("unexpected cancel outcome {other:?}"),
    }

    while events.recv().await.is_some() {}
    wait_for_idle(harness.server.manager()).await;
    assert!(harness
        .server
        .manager()
        .session_for_task(&task_id)
        .await
        .is_none());
}
