//! Storage contracts consumed by the concurrency core.
//!
//! The engine only ever reads and merges through these traits; durable
//! backends live behind them. Each trait ships with an in-memory
//! reference implementation used as the default and throughout the test
//! suite.

pub mod message_store;
pub mod push_store;
pub mod task_store;

pub use message_store::{InMemoryMessageStore, MessageStore};
pub use push_store::{InMemoryPushConfigStore, PushConfigStore};
pub use task_store::{InMemoryTaskStore, TaskStore};
