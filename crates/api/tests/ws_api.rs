//! WebSocket tests over a real listener: snapshot ordering and eviction.

mod common;

use std::net::SocketAddr;
use std::time::Duration;

use common::{build_test_app, TestApp};
use floodwatch_core::types::LocationId;
use floodwatch_events::{Envelope, EventKind};
use futures::StreamExt;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

async fn serve(app: &TestApp) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = app.router.clone();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

async fn connect(addr: SocketAddr, location_id: i64) -> Client {
    let url = format!("ws://{addr}/api/v1/ws/locations/{location_id}");
    let (socket, _response) = connect_async(&url).await.unwrap();
    socket
}

/// Next non-ping frame from the server.
async fn next_frame(socket: &mut Client) -> Message {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(2), socket.next())
            .await
            .expect("frame within 2s")
            .expect("socket open")
            .unwrap();
        if !matches!(frame, Message::Ping(_) | Message::Pong(_)) {
            return frame;
        }
    }
}

async fn next_json(socket: &mut Client) -> Value {
    match next_frame(socket).await {
        Message::Text(text) => serde_json::from_str(&text).unwrap(),
        other => panic!("expected a text frame, got {other:?}"),
    }
}

async fn wait_for_subscriber(app: &TestApp, location_id: LocationId) {
    for _ in 0..100 {
        if app.broadcaster.subscriber_count(location_id).await == 1 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("connection never subscribed");
}

// ---------------------------------------------------------------------------
// GET /api/v1/ws/locations/{id}
// ---------------------------------------------------------------------------

#[tokio::test]
async fn initial_envelopes_arrive_before_live_updates() {
    let app = build_test_app();
    let addr = serve(&app).await;
    let mut socket = connect(addr, 1).await;

    // Publish as soon as the connection is registered, before reading
    // anything, so the live frame races the snapshot.
    wait_for_subscriber(&app, LocationId(1)).await;
    let live = Envelope::success(
        EventKind::WeatherUpdate,
        json!({ "precipitation_mm": 3.0, "condition": "Rain" }),
    );
    app.broadcaster.publish(LocationId(1), &live).await;

    let expected = ["sensor_update", "blockage_detection_update", "weather_update"];
    for kind in expected {
        let envelope = next_json(&mut socket).await;
        assert_eq!(envelope["type"], kind);
        assert_eq!(envelope["data"]["status"], "error", "nothing persisted yet");
    }

    let envelope = next_json(&mut socket).await;
    assert_eq!(envelope["type"], "weather_update");
    assert_eq!(envelope["data"]["status"], "success");
    assert_eq!(envelope["data"]["weather_condition"]["precipitation_mm"], 3.0);
}

#[tokio::test]
async fn evicted_connection_receives_close_frame() {
    let app = build_test_app();
    let addr = serve(&app).await;
    let mut socket = connect(addr, 2).await;
    wait_for_subscriber(&app, LocationId(2)).await;

    for _ in 0..3 {
        next_json(&mut socket).await;
    }

    app.broadcaster.shutdown_all().await;

    assert!(matches!(next_frame(&mut socket).await, Message::Close(_)));
    assert_eq!(app.broadcaster.subscriber_count(LocationId(2)).await, 0);
}

#[tokio::test]
async fn client_close_unsubscribes() {
    let app = build_test_app();
    let addr = serve(&app).await;
    let mut socket = connect(addr, 3).await;
    wait_for_subscriber(&app, LocationId(3)).await;

    socket.close(None).await.unwrap();

    for _ in 0..100 {
        if app.broadcaster.subscriber_count(LocationId(3)).await == 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("closed connection still subscribed");
}
