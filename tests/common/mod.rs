#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;

use spectator::error::TransportError;
use spectator::transport::{Connection, Frame, Transport};
use spectator::{Config, LiveView};

/// In-memory transport. Every accepted connection is handed to the test as a
/// [`MockPeer`] playing the server side.
#[derive(Clone)]
pub struct MockTransport {
    shared: Arc<Shared>,
}

struct Shared {
    log: Mutex<Log>,
    peers: mpsc::UnboundedSender<MockPeer>,
}

#[derive(Default)]
struct Log {
    attempts: Vec<Instant>,
    refuse: usize,
    client_closes: usize,
}

pub struct MockPeer {
    frames: mpsc::UnboundedSender<Frame>,
    /// Frames the client sent on this connection.
    pub sent: mpsc::UnboundedReceiver<String>,
}

pub struct MockConnection {
    frames: mpsc::UnboundedReceiver<Frame>,
    sent: mpsc::UnboundedSender<String>,
    shared: Arc<Shared>,
}

impl MockTransport {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<MockPeer>) {
        let (peers_tx, peers_rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            log: Mutex::new(Log::default()),
            peers: peers_tx,
        });
        (Self { shared }, peers_rx)
    }

    /// Fail the next `n` connect attempts.
    pub fn refuse_next(&self, n: usize) {
        self.shared.log.lock().unwrap().refuse = n;
    }

    /// Instants at which connect was called.
    pub fn attempts(&self) -> Vec<Instant> {
        self.shared.log.lock().unwrap().attempts.clone()
    }

    pub fn client_closes(&self) -> usize {
        self.shared.log.lock().unwrap().client_closes
    }
}

impl Transport for MockTransport {
    type Connection = MockConnection;

    async fn connect(&self, _url: &str) -> Result<MockConnection, TransportError> {
        {
            let mut log = self.shared.log.lock().unwrap();
            log.attempts.push(Instant::now());
            if log.refuse > 0 {
                log.refuse -= 1;
                return Err(TransportError::Connect("connection refused".into()));
            }
        }

        let (frames_tx, frames_rx) = mpsc::unbounded_channel();
        let (sent_tx, sent_rx) = mpsc::unbounded_channel();
        let _ = self.shared.peers.send(MockPeer {
            frames: frames_tx,
            sent: sent_rx,
        });

        Ok(MockConnection {
            frames: frames_rx,
            sent: sent_tx,
            shared: self.shared.clone(),
        })
    }
}

impl Connection for MockConnection {
    async fn recv(&mut self) -> Option<Result<Frame, TransportError>> {
        self.frames.recv().await.map(Ok)
    }

    async fn send(&mut self, text: String) -> Result<(), TransportError> {
        self.sent
            .send(text)
            .map_err(|_| TransportError::Send("peer gone".into()))
    }

    async fn close(&mut self) {
        self.shared.log.lock().unwrap().client_closes += 1;
    }
}

impl MockPeer {
    pub fn push(&self, value: serde_json::Value) {
        let _ = self.frames.send(Frame::Text(value.to_string()));
    }

    pub fn push_raw(&self, text: &str) {
        let _ = self.frames.send(Frame::Text(text.to_string()));
    }

    pub fn close(&self, code: u16) {
        let _ = self.frames.send(Frame::Close(Some(code)));
    }
}

pub fn state_frame(fen: &str, white: f64, black: f64, to_move: &str, move_number: u32) -> serde_json::Value {
    json!({
        "event": "state",
        "game_id": "g1",
        "fen": fen,
        "last_move": null,
        "clock_white": white,
        "clock_black": black,
        "to_move": to_move,
        "move_number": move_number,
    })
}

pub fn test_config() -> Config {
    Config {
        reconnect_delay: Duration::from_millis(3000),
        keepalive_interval: Duration::from_millis(30_000),
        clock_tick: Duration::from_millis(100),
        ..Config::default()
    }
}

/// Wait until the published view satisfies `pred`, returning that view.
pub async fn wait_for<F>(view: &mut watch::Receiver<LiveView>, pred: F) -> LiveView
where
    F: Fn(&LiveView) -> bool,
{
    loop {
        {
            let current = view.borrow_and_update();
            if pred(&*current) {
                return (*current).clone();
            }
        }
        view.changed().await.expect("session ended before condition held");
    }
}
