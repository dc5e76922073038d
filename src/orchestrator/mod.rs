//! Session and task concurrency core.
//!
//! Turns a stateless request into a registered, cancelable,
//! exactly-once-cleaned-up unit of background work: the
//! [`EventProcessor`](event_processor::EventProcessor) fans events out to
//! subscribers and mirrors task state into storage, a
//! [`Session`](session::Session) binds one processor to one background
//! job, and the [`SessionManager`](session_manager::SessionManager) owns
//! the registry, the per-task lock table, and the completion monitors.

pub mod context;
pub mod event_processor;
pub mod session;
pub mod session_manager;

pub use context::{CallContext, RequestContext, ScopedMessageStore};
pub use event_processor::{EventProcessor, EventStream};
pub use session::Session;
pub use session_manager::SessionManager;
