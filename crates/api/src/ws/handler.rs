use axum::body::Bytes;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use floodwatch_core::types::{DbId, LocationId};
use floodwatch_engine::snapshot::initial_envelopes;
use floodwatch_engine::LocationDevices;
use floodwatch_events::{Connection, Outbound};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::state::AppState;

type WsSink = SplitSink<WebSocket, Message>;

/// GET /ws/locations/{location_id}
///
/// Upgrades to a WebSocket subscribed to one location's updates.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(location_id): Path<DbId>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, LocationId(location_id)))
}

fn to_message(frame: Outbound) -> Message {
    match frame {
        Outbound::Text(text) => Message::Text((&*text).into()),
        Outbound::Ping => Message::Ping(Bytes::new()),
        Outbound::Close => Message::Close(None),
    }
}

/// Manage a single dashboard connection after upgrade.
///
/// 1. Subscribes, so live updates start queueing immediately.
/// 2. Reads the persisted snapshot and writes it straight to the socket;
///    queued live frames follow it and are never older than it.
/// 3. Forwards the queue to the socket until the client leaves or the
///    broadcaster evicts the connection, whichever comes first.
/// 4. Unsubscribes.
async fn handle_socket(socket: WebSocket, state: AppState, location_id: LocationId) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, location_id = %location_id, "WebSocket connected");

    let (conn, rx) = Connection::channel(conn_id.clone(), state.fusion.subscriber_queue_capacity);
    let eviction = conn.eviction();
    let (mut sink, mut stream) = socket.split();

    state.broadcaster.subscribe(conn, location_id).await;

    if let Err(e) = send_snapshot(&mut sink, &state, location_id).await {
        tracing::debug!(conn_id = %conn_id, error = %e, "Failed to send snapshot");
        state.broadcaster.unsubscribe(&conn_id, location_id).await;
        return;
    }

    let mut send_task = tokio::spawn(forward(sink, rx, eviction, conn_id.clone()));

    let receive = async {
        while let Some(result) = stream.next().await {
            match result {
                Ok(Message::Close(_)) => break,
                Ok(Message::Pong(_)) => {
                    tracing::trace!(conn_id = %conn_id, "Pong received");
                }
                Ok(_msg) => {}
                Err(e) => {
                    tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                    break;
                }
            }
        }
    };

    tokio::select! {
        () = receive => {}
        _ = &mut send_task => {
            tracing::debug!(conn_id = %conn_id, "Sender finished, closing WebSocket");
        }
    }

    state.broadcaster.unsubscribe(&conn_id, location_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, location_id = %location_id, "WebSocket disconnected");
}

/// One envelope per source, from the latest persisted readings.
///
/// Unregistered locations still get a snapshot; weather is keyed by
/// location and may exist without devices.
async fn send_snapshot(
    sink: &mut WsSink,
    state: &AppState,
    location_id: LocationId,
) -> Result<(), axum::Error> {
    let devices = state
        .registry
        .devices(location_id)
        .await
        .unwrap_or_else(|_| LocationDevices::unmapped(location_id));
    let envelopes = initial_envelopes(
        state.store.as_ref(),
        &devices,
        &state.fusion.windows,
        chrono::Utc::now(),
    )
    .await;

    for envelope in envelopes {
        sink.send(Message::Text(envelope.to_text().into())).await?;
    }
    Ok(())
}

/// Drain the connection's queue into the socket.
///
/// Eviction, or every sender being dropped, ends with a Close frame.
async fn forward(
    mut sink: WsSink,
    mut rx: mpsc::Receiver<Outbound>,
    eviction: CancellationToken,
    conn_id: String,
) {
    loop {
        let frame = tokio::select! {
            biased;
            () = eviction.cancelled() => {
                tracing::debug!(conn_id = %conn_id, "Connection evicted by broadcaster");
                Outbound::Close
            }
            frame = rx.recv() => frame.unwrap_or(Outbound::Close),
        };

        let closing = frame == Outbound::Close;
        if sink.send(to_message(frame)).await.is_err() {
            tracing::debug!(conn_id = %conn_id, "WebSocket sink closed");
            break;
        }
        if closing {
            break;
        }
    }
}
