use std::sync::Arc;
use std::time::Duration;

use floodwatch_events::Broadcaster;

/// Interval between heartbeat pings (in seconds).
const HEARTBEAT_INTERVAL_SECS: u64 = 30;

/// Spawn a background task that pings every subscriber periodically.
///
/// Pings never wait on a slow client: a full queue skips that round. A
/// connection whose receiver is gone is pruned from the broadcaster and
/// evicted, which closes its socket. Runs until aborted during shutdown.
pub fn start_heartbeat(broadcaster: Arc<Broadcaster>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(HEARTBEAT_INTERVAL_SECS));

        loop {
            interval.tick().await;
            let before = broadcaster.connection_count().await;
            broadcaster.ping_all().await;
            let after = broadcaster.connection_count().await;
            tracing::debug!(
                connections = after,
                pruned = before.saturating_sub(after),
                "WebSocket heartbeat",
            );
        }
    })
}
