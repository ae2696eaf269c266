//! Replay view over a finished game.

use chess_core::{GameDetail, Position, ReplayCursor, ReplayTimeline, Side};
use serde::Serialize;
use tracing::{info, warn};

use crate::clients::arena::ArenaClient;
use crate::error::SpectatorError;

/// One row of the move list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveEntry {
    /// Timeline index reached by this move (1-based).
    pub ply: usize,
    /// Full-move number, as in `12.` / `12...`
    pub number: u32,
    pub side: Side,
    pub uci: String,
    pub san: Option<String>,
}

impl MoveEntry {
    pub fn label(&self) -> String {
        let dots = match self.side {
            Side::White => ".",
            Side::Black => "...",
        };
        format!("{}{} {}", self.number, dots, self.san.as_deref().unwrap_or(&self.uci))
    }
}

pub struct ReplayView {
    detail: GameDetail,
    timeline: ReplayTimeline,
    cursor: ReplayCursor,
}

impl ReplayView {
    pub async fn load(client: &ArenaClient, game_id: &str) -> Result<Self, SpectatorError> {
        let detail = client.fetch_game(game_id).await?;
        Ok(Self::from_detail(detail))
    }

    pub fn from_detail(detail: GameDetail) -> Self {
        let move_text = detail.move_text.as_deref();
        let timeline = match ReplayTimeline::try_reconstruct(move_text, None) {
            Ok(timeline) => timeline,
            Err(e) => {
                warn!(game_id = %detail.id, error = %e, "Move text not replayable, showing start only");
                ReplayTimeline::reconstruct(move_text, None)
            }
        };
        info!(game_id = %detail.id, plies = timeline.ply_count(), "Replay loaded");

        let cursor = timeline.cursor();
        Self {
            detail,
            timeline,
            cursor,
        }
    }

    pub fn detail(&self) -> &GameDetail {
        &self.detail
    }

    pub fn timeline(&self) -> &ReplayTimeline {
        &self.timeline
    }

    pub fn cursor_index(&self) -> usize {
        self.cursor.index()
    }

    pub fn current(&self) -> &Position {
        &self.timeline.positions()[self.cursor.index()]
    }

    /// Move that produced the current position, for highlighting.
    pub fn last_move(&self) -> Option<&str> {
        self.current().reached_by.as_deref()
    }

    pub fn first(&mut self) -> &Position {
        self.cursor.first();
        self.current()
    }

    pub fn prev(&mut self) -> &Position {
        self.cursor.prev();
        self.current()
    }

    pub fn next(&mut self) -> &Position {
        self.cursor.next();
        self.current()
    }

    pub fn last(&mut self) -> &Position {
        self.cursor.last();
        self.current()
    }

    pub fn at_end(&self) -> bool {
        self.cursor.at_end()
    }

    pub fn jump_to(&mut self, index: i64) -> &Position {
        self.cursor.jump_to(index);
        self.current()
    }

    pub fn move_list(&self) -> Vec<MoveEntry> {
        self.timeline
            .positions()
            .windows(2)
            .enumerate()
            .filter_map(|(i, pair)| {
                let uci = pair[1].reached_by.clone()?;
                let (side, number) = turn_of(&pair[0].fen);
                Some(MoveEntry {
                    ply: i + 1,
                    number,
                    side,
                    uci,
                    san: pair[1].san.clone(),
                })
            })
            .collect()
    }

    pub fn result_text(&self) -> &'static str {
        self.detail.result.map_or("*", |r| r.score_text())
    }

    pub fn elo_delta(&self, side: Side) -> Option<i32> {
        self.detail.elo_delta(side)
    }
}

/// Side to move and full-move number from a FEN's trailing fields.
fn turn_of(fen: &str) -> (Side, u32) {
    let fields: Vec<&str> = fen.split_whitespace().collect();
    let side = match fields.get(1) {
        Some(&"b") => Side::Black,
        _ => Side::White,
    };
    let number = fields.get(5).and_then(|n| n.parse().ok()).unwrap_or(1);
    (side, number)
}
