//! Session lifecycle: one event processor bound to one background job.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::event_processor::EventProcessor;

/// Explicit job lifecycle. A lazily-started job moves Idle → Running →
/// Finished exactly once; `start` is single-shot.
enum JobState {
    Idle(Pin<Box<dyn Future<Output = ()> + Send>>),
    Running,
    Finished,
}

/// The live pairing of one task's event stream with its executing job.
///
/// Created per client send-message call, registered with the session
/// manager, started explicitly, observed to completion by the manager's
/// monitor, and closed exactly once by whichever of the monitor or an
/// explicit cancel gets there first.
pub struct Session {
    context_id: String,
    task_id: String,
    processor: Arc<EventProcessor>,
    job: Mutex<JobState>,
    done: watch::Sender<bool>,
    cancel: CancellationToken,
}

impl Session {
    /// Bind a processor to a not-yet-started job.
    #[must_use]
    pub fn new(
        context_id: impl Into<String>,
        task_id: impl Into<String>,
        processor: Arc<EventProcessor>,
        job: impl Future<Output = ()> + Send + 'static,
    ) -> Self {
        let (done, _) = watch::channel(false);
        Self {
            context_id: context_id.into(),
            task_id: task_id.into(),
            processor,
            job: Mutex::new(JobState::Idle(Box::pin(job))),
            done,
            cancel: CancellationToken::new(),
        }
    }

    /// Conversation this session belongs to.
    #[must_use]
    pub fn context_id(&self) -> &str {
        &self.context_id
    }

    /// Task this session executes.
    #[must_use]
    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// The session's event processor.
    #[must_use]
    pub fn processor(&self) -> &Arc<EventProcessor> {
        &self.processor
    }

    /// Begin executing the job. Idempotent: calling on an already-started
    /// or finished session does nothing — the job is never re-launched.
    ///
    /// The processor is closed before the session is marked finished, so
    /// once [`join`](Self::join) returns no events remain in flight.
    pub fn start(self: &Arc<Self>) {
        let job = {
            let mut state = self.job.lock();
            match std::mem::replace(&mut *state, JobState::Running) {
                JobState::Idle(job) => Some(job),
                finished @ JobState::Finished => {
                    *state = finished;
                    None
                }
                JobState::Running => None,
            }
        };
        let Some(job) = job else {
            return;
        };
        let session = Arc::clone(self);
        tokio::spawn(async move {
            tokio::select! {
                () = session.cancel.cancelled() => {
                    debug!(task_id = %session.task_id, "session job canceled");
                }
                () = job => {}
            }
            session.finish();
        });
    }

    /// Wait until the job has finished, whatever its outcome. Never
    /// itself fails; blocks until [`start`](Self::start) has been called
    /// and the job has run to completion or been canceled.
    pub async fn join(&self) {
        let mut done = self.done.subscribe();
        // The sender lives in self, so the channel cannot close here.
        let _ = done.wait_for(|finished| *finished).await;
    }

    /// Whether the job has finished (any outcome).
    #[must_use]
    pub fn is_finished(&self) -> bool {
        *self.done.borrow()
    }

    /// Cancel the job if it is still running, wait for it to wind down,
    /// and close the event processor. Idempotent; a never-started session
    /// is marked finished without running its job.
    pub async fn close(&self) {
        let was_idle = {
            let mut state = self.job.lock();
            if matches!(*state, JobState::Idle(_)) {
                *state = JobState::Finished;
                true
            } else {
                false
            }
        };
        if was_idle {
            self.processor.close();
            self.done.send_replace(true);
            return;
        }
        self.cancel.cancel();
        self.join().await;
        // Belt for the close-after-finish path; closing twice is a no-op.
        self.processor.close();
    }

    fn finish(&self) {
        self.processor.close();
        *self.job.lock() = JobState::Finished;
        self.done.send_replace(true);
    }
}
