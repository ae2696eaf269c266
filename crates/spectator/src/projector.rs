//! Game state projector: folds decoded events into one coherent view.

use std::time::Duration;

use chess_core::Side;
use tracing::{debug, info};

use crate::clock::{ClockTicker, ProjectedClock};
use crate::protocol::{GameStateSnapshot, SpectatorEvent, TerminalResult};

#[derive(Debug, Clone)]
pub struct GameProjector {
    snapshot: Option<GameStateSnapshot>,
    terminal: Option<TerminalResult>,
    error: Option<String>,
    clock: ClockTicker,
}

impl GameProjector {
    pub fn new(tick_period: Duration) -> Self {
        Self {
            snapshot: None,
            terminal: None,
            error: None,
            clock: ClockTicker::new(tick_period),
        }
    }

    /// Apply one event. Returns true if anything visible changed.
    pub fn apply(&mut self, event: SpectatorEvent) -> bool {
        match event {
            SpectatorEvent::State(snapshot) => {
                if self.is_frozen() {
                    debug!(move_number = snapshot.move_number, "Ignoring state after game end");
                    return false;
                }
                self.clock.reseed(snapshot.clock_white, snapshot.clock_black);
                self.clock.set_active(Some(snapshot.to_move));
                self.snapshot = Some(snapshot);
                true
            }
            SpectatorEvent::GameEnd(result) => {
                if self.is_frozen() {
                    return false;
                }
                info!(
                    result = result.result.score_text(),
                    termination = %result.termination,
                    "Game ended"
                );
                self.clock.stop();
                self.terminal = Some(result);
                true
            }
            SpectatorEvent::Error { message } => {
                self.error = Some(message);
                true
            }
        }
    }

    pub fn clear_error(&mut self) -> bool {
        self.error.take().is_some()
    }

    pub fn tick(&mut self, live: bool) -> bool {
        self.clock.tick(live)
    }

    pub fn is_frozen(&self) -> bool {
        self.terminal.is_some()
    }

    pub fn active_side(&self) -> Option<Side> {
        self.clock.active()
    }

    pub fn snapshot(&self) -> Option<&GameStateSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn terminal(&self) -> Option<&TerminalResult> {
        self.terminal.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clock(&self, side: Side) -> ProjectedClock {
        self.clock.projected(side)
    }
}
