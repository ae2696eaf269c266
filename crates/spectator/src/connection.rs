//! Connection manager: one live channel per spectated game.
//!
//! The manager runs as a single spawned task. It connects, pumps frames into
//! an unbounded channel, sends keepalives while open and reconnects after a
//! fixed delay whenever the channel drops uncleanly. All timers live inside
//! the task, so closing the handle cancels them with it.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::protocol::{decode_frame, SpectatorEvent, PING_FRAME};
use crate::transport::{Connection, Frame, Transport, NORMAL_CLOSE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
    Reconnecting,
    /// Terminal; nothing is emitted after this.
    TornDown,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionUpdate {
    State(ConnectionState),
    Event(SpectatorEvent),
}

#[derive(Debug, Clone, Copy)]
pub struct ConnectionSettings {
    pub reconnect_delay: Duration,
    pub keepalive_interval: Duration,
}

impl From<&Config> for ConnectionSettings {
    fn from(config: &Config) -> Self {
        Self {
            reconnect_delay: config.reconnect_delay,
            keepalive_interval: config.keepalive_interval,
        }
    }
}

/// Owner of a running connection task.
pub struct ConnectionHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl ConnectionHandle {
    /// Tear the connection down and wait until the task has exited.
    /// Any pending reconnect or keepalive is cancelled.
    pub async fn close(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for ConnectionHandle {
    fn drop(&mut self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}

/// Start connecting to `url` in the background.
///
/// Returns immediately; progress arrives on the returned receiver, starting
/// with `Connecting`.
pub fn open<T: Transport>(
    transport: T,
    url: String,
    settings: ConnectionSettings,
) -> (ConnectionHandle, mpsc::UnboundedReceiver<ConnectionUpdate>) {
    let (updates_tx, updates_rx) = mpsc::unbounded_channel();
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let task = tokio::spawn(run(transport, url, settings, updates_tx, shutdown_rx));

    let handle = ConnectionHandle {
        shutdown: Some(shutdown_tx),
        task: Some(task),
    };
    (handle, updates_rx)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    Shutdown,
    /// Peer closed with code 1000.
    Clean,
    Unclean,
}

async fn run<T: Transport>(
    transport: T,
    url: String,
    settings: ConnectionSettings,
    updates: mpsc::UnboundedSender<ConnectionUpdate>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let emit = |state: ConnectionState| {
        let _ = updates.send(ConnectionUpdate::State(state));
    };
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        emit(ConnectionState::Connecting);

        let connected = tokio::select! {
            biased;
            _ = &mut shutdown => break,
            result = transport.connect(&url) => result,
        };

        let exit = match connected {
            Ok(mut conn) => {
                info!(url = %url, attempt, "Spectator channel open");
                emit(ConnectionState::Open);
                let exit = pump(&mut conn, &settings, &updates, &mut shutdown).await;
                if exit == Exit::Shutdown {
                    conn.close().await;
                }
                exit
            }
            Err(e) => {
                warn!(url = %url, attempt, error = %e, "Spectator channel connect failed");
                Exit::Unclean
            }
        };

        match exit {
            Exit::Shutdown => break,
            Exit::Clean => {
                info!(url = %url, "Spectator channel closed by server");
                emit(ConnectionState::Closed);
                let _ = (&mut shutdown).await;
                break;
            }
            Exit::Unclean => {
                emit(ConnectionState::Closed);
                emit(ConnectionState::Reconnecting);
                debug!(delay_ms = settings.reconnect_delay.as_millis() as u64, "Reconnect scheduled");
                tokio::select! {
                    biased;
                    _ = &mut shutdown => break,
                    _ = sleep(settings.reconnect_delay) => {}
                }
            }
        }
    }

    emit(ConnectionState::TornDown);
}

async fn pump<C: Connection>(
    conn: &mut C,
    settings: &ConnectionSettings,
    updates: &mpsc::UnboundedSender<ConnectionUpdate>,
    shutdown: &mut oneshot::Receiver<()>,
) -> Exit {
    let period = settings.keepalive_interval;
    let mut keepalive = interval_at(Instant::now() + period, period);
    keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = &mut *shutdown => return Exit::Shutdown,
            frame = conn.recv() => match frame {
                Some(Ok(Frame::Text(text))) => match decode_frame(&text) {
                    Ok(Some(event)) => {
                        let _ = updates.send(ConnectionUpdate::Event(event));
                    }
                    Ok(None) => debug!(frame = %text, "Ignoring frame"),
                    Err(e) => warn!(error = %e, "Dropping undecodable frame"),
                },
                Some(Ok(Frame::Close(code))) => {
                    if code == Some(NORMAL_CLOSE) {
                        return Exit::Clean;
                    }
                    warn!(code = ?code, "Spectator channel closed uncleanly");
                    return Exit::Unclean;
                }
                Some(Err(e)) => {
                    warn!(error = %e, "Spectator channel read failed");
                    return Exit::Unclean;
                }
                None => {
                    warn!("Spectator channel ended without close frame");
                    return Exit::Unclean;
                }
            },
            _ = keepalive.tick() => {
                if let Err(e) = conn.send(PING_FRAME.to_string()).await {
                    warn!(error = %e, "Keepalive failed");
                    return Exit::Unclean;
                }
            }
        }
    }
}
