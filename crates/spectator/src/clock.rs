//! Local clock projection between authoritative updates.
//!
//! Displayed time is `authoritative - ticks * step`, floored at zero. A
//! reseed resets the tick count.

use std::time::Duration;

use chess_core::Side;
use serde::Serialize;

const LOW_SECS: f64 = 30.0;
const CRITICAL_SECS: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProjectedClock {
    pub authoritative: f64,
    pub displayed: f64,
}

impl ProjectedClock {
    pub fn is_low(&self) -> bool {
        self.displayed < LOW_SECS
    }

    pub fn is_critical(&self) -> bool {
        self.displayed < CRITICAL_SECS
    }

    pub fn formatted(&self) -> String {
        format_clock(self.displayed)
    }
}

#[derive(Debug, Clone)]
pub struct ClockTicker {
    authoritative: [f64; 2],
    ticks: [u32; 2],
    active: Option<Side>,
    step: f64,
}

fn slot(side: Side) -> usize {
    match side {
        Side::White => 0,
        Side::Black => 1,
    }
}

impl ClockTicker {
    /// `tick_period` is both the tick interval and the amount taken off the
    /// active side per tick.
    pub fn new(tick_period: Duration) -> Self {
        Self {
            authoritative: [0.0; 2],
            ticks: [0; 2],
            active: None,
            step: tick_period.as_secs_f64(),
        }
    }

    /// Replace both authoritative values; displayed values jump to them.
    pub fn reseed(&mut self, white: f64, black: f64) {
        self.authoritative = [white, black];
        self.ticks = [0; 2];
    }

    /// Returns true if the active side changed.
    pub fn set_active(&mut self, side: Option<Side>) -> bool {
        let changed = self.active != side;
        self.active = side;
        changed
    }

    pub fn active(&self) -> Option<Side> {
        self.active
    }

    pub fn stop(&mut self) {
        self.active = None;
    }

    /// Advance the active side by one step when the session is live.
    /// Returns true if a displayed value changed.
    pub fn tick(&mut self, live: bool) -> bool {
        let Some(side) = self.active.filter(|_| live) else {
            return false;
        };
        if self.displayed(side) <= 0.0 {
            return false;
        }
        self.ticks[slot(side)] += 1;
        true
    }

    pub fn displayed(&self, side: Side) -> f64 {
        let i = slot(side);
        (self.authoritative[i] - f64::from(self.ticks[i]) * self.step).max(0.0)
    }

    pub fn projected(&self, side: Side) -> ProjectedClock {
        ProjectedClock {
            authoritative: self.authoritative[slot(side)],
            displayed: self.displayed(side),
        }
    }
}

/// `m:ss.t` below ten seconds, `m:ss` otherwise.
pub fn format_clock(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    // Nudge so 9.9 stored as 9.8999… still shows tenths of 9
    let tenths_total = (seconds * 10.0 + 1e-6).floor() as u64;
    let whole = tenths_total / 10;
    let mins = whole / 60;
    let secs = whole % 60;

    if seconds < CRITICAL_SECS {
        format!("{}:{:02}.{}", mins, secs, tenths_total % 10)
    } else {
        format!("{}:{:02}", mins, secs)
    }
}
