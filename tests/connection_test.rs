/// Connection manager lifecycle against an in-memory transport.
///
/// All tests run on a paused clock, so delays are exact and instant.
mod common;

use std::time::Duration;

use common::MockTransport;
use serde_json::json;
use spectator::connection::{self, ConnectionSettings};
use spectator::protocol::PING_FRAME;
use spectator::{ConnectionState, ConnectionUpdate, SpectatorEvent};
use tokio::sync::mpsc;
use tokio::time::{sleep, Instant};

fn settings() -> ConnectionSettings {
    ConnectionSettings {
        reconnect_delay: Duration::from_millis(3000),
        keepalive_interval: Duration::from_millis(30_000),
    }
}

async fn next_state(updates: &mut mpsc::UnboundedReceiver<ConnectionUpdate>) -> ConnectionState {
    loop {
        match updates.recv().await {
            Some(ConnectionUpdate::State(state)) => return state,
            Some(ConnectionUpdate::Event(_)) => continue,
            None => panic!("connection task ended"),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_unclean_close_reconnects_once_after_delay() {
    let (transport, mut peers) = MockTransport::new();
    let (handle, mut updates) =
        connection::open(transport.clone(), "ws://test/watch/g1".into(), settings());

    assert_eq!(next_state(&mut updates).await, ConnectionState::Connecting);
    assert_eq!(next_state(&mut updates).await, ConnectionState::Open);

    // Stream ends without a close frame
    let first = peers.recv().await.unwrap();
    drop(first);

    assert_eq!(next_state(&mut updates).await, ConnectionState::Closed);
    assert_eq!(next_state(&mut updates).await, ConnectionState::Reconnecting);
    assert_eq!(next_state(&mut updates).await, ConnectionState::Connecting);

    let _second = peers.recv().await.unwrap();
    assert_eq!(next_state(&mut updates).await, ConnectionState::Open);

    let attempts = transport.attempts();
    assert_eq!(attempts.len(), 2);
    let gap = attempts[1] - attempts[0];
    assert!(gap >= Duration::from_millis(3000) && gap < Duration::from_millis(3010), "gap was {gap:?}");

    // Healthy connection: no further attempts
    sleep(Duration::from_secs(20)).await;
    assert_eq!(transport.attempts().len(), 2);

    handle.close().await;
}

#[tokio::test(start_paused = true)]
async fn test_unclean_close_code_reconnects() {
    let (transport, mut peers) = MockTransport::new();
    let (handle, _updates) =
        connection::open(transport.clone(), "ws://test/watch/g1".into(), settings());

    let first = peers.recv().await.unwrap();
    first.close(1011);

    let _second = peers.recv().await.unwrap();
    assert_eq!(transport.attempts().len(), 2);

    handle.close().await;
}

#[tokio::test(start_paused = true)]
async fn test_teardown_cancels_pending_reconnect() {
    let (transport, mut peers) = MockTransport::new();
    let (handle, mut updates) =
        connection::open(transport.clone(), "ws://test/watch/g1".into(), settings());

    drop(peers.recv().await.unwrap());
    while next_state(&mut updates).await != ConnectionState::Reconnecting {}

    sleep(Duration::from_millis(1000)).await;
    handle.close().await;

    sleep(Duration::from_secs(60)).await;
    assert_eq!(transport.attempts().len(), 1);

    let mut rest = Vec::new();
    while let Some(update) = updates.recv().await {
        rest.push(update);
    }
    assert_eq!(rest, vec![ConnectionUpdate::State(ConnectionState::TornDown)]);
}

#[tokio::test(start_paused = true)]
async fn test_failed_connect_is_retried() {
    let (transport, mut peers) = MockTransport::new();
    transport.refuse_next(2);
    let (handle, _updates) =
        connection::open(transport.clone(), "ws://test/watch/g1".into(), settings());

    let _peer = peers.recv().await.unwrap();
    let attempts = transport.attempts();
    assert_eq!(attempts.len(), 3);
    assert!(attempts[2] - attempts[0] >= Duration::from_millis(6000));

    handle.close().await;
}

#[tokio::test(start_paused = true)]
async fn test_keepalive_while_open() {
    let (transport, mut peers) = MockTransport::new();
    let (handle, _updates) = connection::open(transport, "ws://test/watch/g1".into(), settings());

    let mut peer = peers.recv().await.unwrap();
    let opened = Instant::now();

    assert_eq!(peer.sent.recv().await.as_deref(), Some(PING_FRAME));
    assert!(opened.elapsed() >= Duration::from_secs(30));

    // The server's pong is not an event
    peer.push(json!({"event": "pong"}));

    assert_eq!(peer.sent.recv().await.as_deref(), Some(PING_FRAME));
    assert!(opened.elapsed() >= Duration::from_secs(60));

    handle.close().await;
}

#[tokio::test(start_paused = true)]
async fn test_clean_close_waits_for_teardown() {
    let (transport, mut peers) = MockTransport::new();
    let (handle, mut updates) =
        connection::open(transport.clone(), "ws://test/watch/g1".into(), settings());

    let peer = peers.recv().await.unwrap();
    peer.push(json!({"event": "error", "message": "Game not found or has ended"}));
    peer.close(1000);

    let mut seen = Vec::new();
    loop {
        let update = updates.recv().await.unwrap();
        let done = update == ConnectionUpdate::State(ConnectionState::Closed);
        seen.push(update);
        if done {
            break;
        }
    }
    assert!(seen.contains(&ConnectionUpdate::Event(SpectatorEvent::Error {
        message: "Game not found or has ended".into()
    })));

    sleep(Duration::from_secs(30)).await;
    assert_eq!(transport.attempts().len(), 1);
    assert!(updates.try_recv().is_err());

    handle.close().await;
    assert_eq!(
        updates.recv().await,
        Some(ConnectionUpdate::State(ConnectionState::TornDown))
    );
}

#[tokio::test(start_paused = true)]
async fn test_undecodable_frames_are_dropped() {
    let (transport, mut peers) = MockTransport::new();
    let (handle, mut updates) = connection::open(transport, "ws://test/watch/g1".into(), settings());

    let peer = peers.recv().await.unwrap();
    peer.push_raw("{not json");
    peer.push(json!({"event": "spectator_joined"}));
    peer.push(json!({"event": "error", "message": "after garbage"}));

    let event = loop {
        match updates.recv().await.unwrap() {
            ConnectionUpdate::Event(event) => break event,
            ConnectionUpdate::State(_) => continue,
        }
    };
    assert_eq!(
        event,
        SpectatorEvent::Error {
            message: "after garbage".into()
        }
    );

    handle.close().await;
}
