//! Pluggable agent execution seam.
//!
//! The [`AgentExecutor`] performs the actual unit of work for a request,
//! publishing events into the session's processor as it goes. The
//! concurrency core never interprets its errors; they propagate to the
//! caller or end the event stream unchanged.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::orchestrator::{EventProcessor, RequestContext, Session};
use crate::Result;

/// The unit that performs the actual work behind a task.
pub trait AgentExecutor: Send + Sync {
    /// Run the agent for one request. Runs to completion or voluntary
    /// yield (e.g. the task reaching input-required), publishing events
    /// into `events` along the way. May suspend indefinitely; the core
    /// imposes no timeout.
    ///
    /// # Errors
    ///
    /// Any error ends the event stream; it is surfaced to blocking
    /// callers unchanged and never translated by the protocol layer.
    fn execute(
        &self,
        context: RequestContext,
        events: Arc<EventProcessor>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Cancel the running work for a task.
    ///
    /// The default accepts every cancellation without doing anything; the
    /// protocol layer then closes the session itself. Implementations may
    /// close the session before returning, or publish a final canceled
    /// status first.
    ///
    /// # Errors
    ///
    /// Returning an error signals the task cannot be canceled; the
    /// session is left untouched and the error propagates to the caller
    /// unchanged.
    fn cancel(
        &self,
        context: RequestContext,
        session: Arc<Session>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let _ = (context, session);
        Box::pin(async { Ok(()) })
    }
}
