//! A spectator session: connection manager plus projector, published as one
//! read-only [`LiveView`].

use std::time::Duration;

use chess_core::Side;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::clock::ProjectedClock;
use crate::config::Config;
use crate::connection::{self, ConnectionHandle, ConnectionSettings, ConnectionState, ConnectionUpdate};
use crate::projector::GameProjector;
use crate::protocol::{GameStateSnapshot, TerminalResult};
use crate::transport::Transport;

/// Everything presentation needs to draw a live game.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveView {
    pub connection: ConnectionState,
    pub snapshot: Option<GameStateSnapshot>,
    pub terminal: Option<TerminalResult>,
    pub error: Option<String>,
    pub white_clock: ProjectedClock,
    pub black_clock: ProjectedClock,
    /// Side whose clock is currently running, if any.
    pub ticking: Option<Side>,
}

impl LiveView {
    fn project(connection: ConnectionState, projector: &GameProjector, ticking: Option<Side>) -> Self {
        Self {
            connection,
            snapshot: projector.snapshot().cloned(),
            terminal: projector.terminal().cloned(),
            error: projector.error().map(str::to_string),
            white_clock: projector.clock(Side::White),
            black_clock: projector.clock(Side::Black),
            ticking,
        }
    }

    pub fn clock(&self, side: Side) -> ProjectedClock {
        match side {
            Side::White => self.white_clock,
            Side::Black => self.black_clock,
        }
    }

    pub fn is_over(&self) -> bool {
        self.terminal.is_some()
    }
}

pub struct SpectatorSession {
    game_id: String,
    view: watch::Receiver<LiveView>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl SpectatorSession {
    /// Start watching `game_id`. Never blocks; the first view is
    /// `Connecting` with no snapshot.
    pub fn open<T: Transport>(transport: T, config: &Config, game_id: &str) -> Self {
        let (connection, updates) = connection::open(
            transport,
            config.watch_url(game_id),
            ConnectionSettings::from(config),
        );

        let projector = GameProjector::new(config.clock_tick);
        let (view_tx, view_rx) = watch::channel(LiveView::project(
            ConnectionState::Connecting,
            &projector,
            None,
        ));
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        info!(game_id, "Opening spectator session");
        let task = tokio::spawn(drive(
            connection,
            updates,
            projector,
            config.clock_tick,
            view_tx,
            shutdown_rx,
        ));

        Self {
            game_id: game_id.to_string(),
            view: view_rx,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }

    pub fn game_id(&self) -> &str {
        &self.game_id
    }

    /// Subscribe to view changes.
    pub fn view(&self) -> watch::Receiver<LiveView> {
        self.view.clone()
    }

    pub fn current(&self) -> LiveView {
        self.view.borrow().clone()
    }

    /// Tear down the session. The final published view is `TornDown` and
    /// nothing changes after that.
    pub async fn close(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
        info!(game_id = %self.game_id, "Spectator session closed");
    }
}

impl Drop for SpectatorSession {
    fn drop(&mut self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}

async fn drive(
    connection: ConnectionHandle,
    mut updates: mpsc::UnboundedReceiver<ConnectionUpdate>,
    mut projector: GameProjector,
    tick_period: Duration,
    view: watch::Sender<LiveView>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let mut state = ConnectionState::Connecting;
    let mut ticking: Option<Side> = None;
    let mut ticker = interval_at(Instant::now() + tick_period, tick_period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            update = updates.recv() => {
                let Some(update) = update else { break };
                let changed = match update {
                    ConnectionUpdate::State(next) => {
                        debug!(state = ?next, "Connection state");
                        state = next;
                        if next == ConnectionState::Open {
                            projector.clear_error();
                        }
                        true
                    }
                    ConnectionUpdate::Event(event) => projector.apply(event),
                };

                let live = state == ConnectionState::Open && !projector.is_frozen();
                let next_ticking = projector.active_side().filter(|_| live);
                if next_ticking != ticking {
                    ticking = next_ticking;
                    ticker.reset();
                }

                if changed {
                    view.send_replace(LiveView::project(state, &projector, ticking));
                }
            }
            _ = ticker.tick(), if ticking.is_some() => {
                if projector.tick(true) {
                    view.send_replace(LiveView::project(state, &projector, ticking));
                }
            }
        }
    }

    connection.close().await;
    view.send_modify(|v| {
        v.connection = ConnectionState::TornDown;
        v.ticking = None;
    });
}
