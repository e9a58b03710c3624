//! Dashboard WebSocket endpoint.
//!
//! Subscriber bookkeeping lives in [`floodwatch_events::Broadcaster`]; this
//! module only bridges it to axum sockets and keeps connections alive.

mod handler;
mod heartbeat;

pub use handler::ws_handler;
pub use heartbeat::start_heartbeat;
