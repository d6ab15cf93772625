//! End-to-end tests: a real relay bound to an ephemeral port, driven by
//! WebSocket and HTTP clients.

#![allow(clippy::panic)]

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use room_relay::config::RelayConfig;
use room_relay::server;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WAIT: Duration = Duration::from_secs(5);

async fn start(rooms: &str) -> SocketAddr {
    let Ok(config) = RelayConfig::from_lookup(|key| match key {
        "ROOM_IDS" => Some(rooms.to_string()),
        "LISTEN_ADDR" => Some("127.0.0.1:0".to_string()),
        _ => None,
    }) else {
        panic!("test config");
    };
    let Ok(state) = server::build_state(&config) else {
        panic!("room registry");
    };
    let Ok(listener) = TcpListener::bind(config.listen_addr).await else {
        panic!("bind ephemeral port");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("local addr");
    };
    tokio::spawn(server::serve(listener, state));
    addr
}

async fn connect(addr: SocketAddr, room: &str) -> Client {
    let Ok((ws, _response)) = connect_async(format!("ws://{addr}/ws/{room}")).await else {
        panic!("websocket handshake for room {room}");
    };
    ws
}

async fn members(addr: SocketAddr, room: &str) -> Option<u64> {
    let response = reqwest::get(format!("http://{addr}/rooms/{room}")).await.ok()?;
    let body: serde_json::Value = response.json().await.ok()?;
    body.get("members").and_then(serde_json::Value::as_u64)
}

async fn wait_for_members(addr: SocketAddr, room: &str, expected: u64) {
    for _ in 0..250 {
        if members(addr, room).await == Some(expected) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("room {room} never reached {expected} members");
}

async fn next_data(ws: &mut Client) -> Message {
    loop {
        let Ok(Some(Ok(msg))) = timeout(WAIT, ws.next()).await else {
            panic!("expected a frame");
        };
        if !matches!(msg, Message::Ping(_) | Message::Pong(_)) {
            return msg;
        }
    }
}

async fn assert_silent(ws: &mut Client) {
    let pending = timeout(Duration::from_millis(200), ws.next()).await;
    assert!(pending.is_err(), "expected no frame, got {pending:?}");
}

#[tokio::test]
async fn broadcast_reaches_room_members_only() {
    let addr = start("A,B").await;
    let mut c1 = connect(addr, "A").await;
    let mut c2 = connect(addr, "A").await;
    let mut c3 = connect(addr, "A").await;
    let mut c4 = connect(addr, "B").await;
    wait_for_members(addr, "A", 3).await;
    wait_for_members(addr, "B", 1).await;

    assert!(c1.send(Message::text("hello")).await.is_ok());

    for ws in [&mut c1, &mut c2, &mut c3] {
        let msg = next_data(ws).await;
        assert_eq!(msg, Message::text("hello"));
    }
    for ws in [&mut c1, &mut c2, &mut c3, &mut c4] {
        assert_silent(ws).await;
    }
}

#[tokio::test]
async fn binary_frames_pass_through_unchanged() {
    let addr = start("A").await;
    let mut sender = connect(addr, "A").await;
    let mut receiver = connect(addr, "A").await;
    wait_for_members(addr, "A", 2).await;

    assert!(sender.send(Message::binary(vec![0u8, 159, 146, 150])).await.is_ok());

    assert_eq!(
        next_data(&mut receiver).await,
        Message::binary(vec![0u8, 159, 146, 150])
    );
    assert_eq!(
        next_data(&mut sender).await,
        Message::binary(vec![0u8, 159, 146, 150])
    );
}

#[tokio::test]
async fn disconnect_removes_member() {
    let addr = start("A").await;
    let mut stay = connect(addr, "A").await;
    let mut go = connect(addr, "A").await;
    wait_for_members(addr, "A", 2).await;

    assert!(go.close(None).await.is_ok());
    wait_for_members(addr, "A", 1).await;

    assert!(stay.send(Message::text("still here")).await.is_ok());
    assert_eq!(next_data(&mut stay).await, Message::text("still here"));
}

#[tokio::test]
async fn unknown_room_is_closed_without_membership() {
    let addr = start("A").await;
    let mut ws = connect(addr, "missing").await;

    match next_data(&mut ws).await {
        Message::Close(Some(frame)) => assert_eq!(frame.code, CloseCode::Policy),
        other => panic!("expected policy close, got {other:?}"),
    }

    let Ok(response) = reqwest::get(format!("http://{addr}/rooms")).await else {
        panic!("GET /rooms");
    };
    let Ok(body) = response.json::<serde_json::Value>().await else {
        panic!("json body");
    };
    assert_eq!(
        body.get("total_members").and_then(serde_json::Value::as_u64),
        Some(0)
    );
}

#[tokio::test]
async fn unknown_room_lookup_is_404() {
    let addr = start("A").await;
    let Ok(response) = reqwest::get(format!("http://{addr}/rooms/nope")).await else {
        panic!("GET /rooms/nope");
    };
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
    let Ok(body) = response.json::<serde_json::Value>().await else {
        panic!("json body");
    };
    let code = body
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(serde_json::Value::as_u64);
    assert_eq!(code, Some(2001));
}

#[tokio::test]
async fn health_reports_room_count() {
    let addr = start("channel-1,channel-2,channel-3").await;
    let Ok(response) = reqwest::get(format!("http://{addr}/health")).await else {
        panic!("GET /health");
    };
    assert!(response.status().is_success());
    let Ok(body) = response.json::<serde_json::Value>().await else {
        panic!("json body");
    };
    assert_eq!(
        body.get("status").and_then(serde_json::Value::as_str),
        Some("healthy")
    );
    assert_eq!(body.get("rooms").and_then(serde_json::Value::as_u64), Some(3));
}
