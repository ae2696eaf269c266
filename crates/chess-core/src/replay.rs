//! Replay reconstruction: recorded move text → indexable list of positions.

use serde::Serialize;
use shakmaty::{fen::Fen, CastlingMode, Chess, EnPassantMode, Position as _};

use crate::error::MovetextError;
use crate::pgn;

pub const STANDARD_START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// One board position in a replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Position {
    pub fen: String,
    /// Move that produced this position, in coordinate form (`e2e4`, `e7e8q`).
    pub reached_by: Option<String>,
    /// Same move in SAN, as written in the record.
    pub san: Option<String>,
}

impl Position {
    fn initial(fen: String) -> Self {
        Self {
            fen,
            reached_by: None,
            san: None,
        }
    }
}

/// Every position of a finished game; index 0 is the starting position.
///
/// The list is fixed at construction. Navigation happens through
/// [`ReplayCursor`], never by editing the timeline.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayTimeline {
    positions: Vec<Position>,
    degraded: bool,
}

impl ReplayTimeline {
    /// Build a timeline, falling back to a single starting position when the
    /// move text is missing or cannot be replayed.
    pub fn reconstruct(move_text: Option<&str>, start_fen: Option<&str>) -> Self {
        match Self::try_reconstruct(move_text, start_fen) {
            Ok(timeline) => timeline,
            Err(_) => Self::fallback(move_text, start_fen),
        }
    }

    /// Like [`ReplayTimeline::reconstruct`] but reports why replay failed.
    pub fn try_reconstruct(
        move_text: Option<&str>,
        start_fen: Option<&str>,
    ) -> Result<Self, MovetextError> {
        let text = move_text
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(MovetextError::Missing)?;

        let mut pos = resolve_start(Some(text), start_fen)?;
        let mut positions = vec![Position::initial(fen_of(&pos))];

        for (i, token) in pgn::tokenize_movetext(text)?.into_iter().enumerate() {
            let ply = i + 1;
            let san_plus = match pgn::parse_san_token(&token) {
                Some(s) => s,
                None => return Err(MovetextError::InvalidToken { ply, token }),
            };

            let mv = san_plus
                .san
                .to_move(&pos)
                .map_err(|e| MovetextError::IllegalMove {
                    ply,
                    san: token.clone(),
                    reason: e.to_string(),
                })?;

            let uci = mv.to_uci(CastlingMode::Standard).to_string();
            pos.play_unchecked(mv);

            positions.push(Position {
                fen: fen_of(&pos),
                reached_by: Some(uci),
                san: Some(san_plus.to_string()),
            });
        }

        Ok(Self {
            positions,
            degraded: false,
        })
    }

    fn fallback(move_text: Option<&str>, start_fen: Option<&str>) -> Self {
        let start = resolve_start(move_text, start_fen)
            .or_else(|_| resolve_start(None, start_fen))
            .unwrap_or_default();

        Self {
            positions: vec![Position::initial(fen_of(&start))],
            degraded: true,
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Never true: a timeline always holds its starting position.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn ply_count(&self) -> usize {
        self.positions.len() - 1
    }

    /// True when the move text could not be replayed and only the starting
    /// position is available.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn get(&self, index: usize) -> Option<&Position> {
        self.positions.get(index)
    }

    /// Coordinate-form moves in play order (`len() - 1` entries).
    pub fn moves(&self) -> Vec<&str> {
        self.positions
            .iter()
            .filter_map(|p| p.reached_by.as_deref())
            .collect()
    }

    pub fn cursor(&self) -> ReplayCursor {
        ReplayCursor::new(self.len())
    }
}

/// Index into a [`ReplayTimeline`]. Every move clamps to `[0, len - 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayCursor {
    index: usize,
    last: usize,
}

impl ReplayCursor {
    pub fn new(len: usize) -> Self {
        Self {
            index: 0,
            last: len.saturating_sub(1),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn at_end(&self) -> bool {
        self.index == self.last
    }

    pub fn first(&mut self) -> usize {
        self.index = 0;
        self.index
    }

    pub fn prev(&mut self) -> usize {
        self.index = self.index.saturating_sub(1);
        self.index
    }

    pub fn next(&mut self) -> usize {
        self.index = (self.index + 1).min(self.last);
        self.index
    }

    pub fn last(&mut self) -> usize {
        self.index = self.last;
        self.index
    }

    /// Accepts any signed target so callers can pass `current - n` freely.
    pub fn jump_to(&mut self, target: i64) -> usize {
        self.index = target.clamp(0, self.last as i64) as usize;
        self.index
    }
}

fn resolve_start(move_text: Option<&str>, start_fen: Option<&str>) -> Result<Chess, MovetextError> {
    let declared = move_text.and_then(pgn::declared_start_fen);
    let Some(fen_str) = start_fen.map(str::to_string).or(declared) else {
        return Ok(Chess::default());
    };

    let invalid = |reason: String| MovetextError::InvalidStart {
        fen: fen_str.clone(),
        reason,
    };
    let fen: Fen = fen_str.trim().parse().map_err(|e| invalid(format!("{e}")))?;
    fen.into_position(CastlingMode::Standard)
        .map_err(|e| invalid(format!("{e}")))
}

fn fen_of(pos: &Chess) -> String {
    Fen::from_position(pos, EnPassantMode::Legal).to_string()
}
