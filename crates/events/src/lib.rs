//! Floodwatch real-time delivery.
//!
//! This crate provides the subscriber-facing half of the system:
//!
//! - [`Envelope`]: the `{ "type", "data": { "status", "message", <payload> } }`
//!   message every dashboard receives.
//! - [`Broadcaster`]: per-location subscriber sets with best-effort fan-out
//!   and pruning of dead connections.

pub mod broadcaster;
pub mod envelope;

pub use broadcaster::{
    Broadcaster, ConnId, Connection, ConnectionState, DeliveryReport, Outbound, SendFailure,
};
pub use envelope::{DeliveryStatus, Envelope, EventKind};
