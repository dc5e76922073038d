//! Protocol operations composed from the concurrency core.
//!
//! Transport-agnostic: a wire layer (HTTP+SSE, JSON-RPC, …) maps its
//! envelope onto [`ProtocolServer`](handler::ProtocolServer) calls and
//! encodes the results.

pub mod handler;
pub mod params;

pub use handler::ProtocolServer;
pub use params::{
    DeletePushConfigParams, GetPushConfigParams, MessageSendConfiguration, MessageSendParams,
    SendMessageResult, TaskIdParams, TaskQueryParams,
};
