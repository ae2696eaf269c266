use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Side::White => "white",
            Side::Black => "black",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final outcome of a game as reported by the arena.
/// The server sends `"unknown"` when a game ended without a recorded result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameResult {
    WhiteWin,
    BlackWin,
    Draw,
    #[serde(other)]
    Unknown,
}

impl GameResult {
    /// PGN-style score line ("1-0", "0-1", "½-½", "*").
    pub fn score_text(self) -> &'static str {
        match self {
            GameResult::WhiteWin => "1-0",
            GameResult::BlackWin => "0-1",
            GameResult::Draw => "½-½",
            GameResult::Unknown => "*",
        }
    }

    pub fn winner(self) -> Option<Side> {
        match self {
            GameResult::WhiteWin => Some(Side::White),
            GameResult::BlackWin => Some(Side::Black),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Bullet,
    Blitz,
    Rapid,
}

impl Category {
    pub fn label(self) -> &'static str {
        match self {
            Category::Bullet => "Bullet (2+1)",
            Category::Blitz => "Blitz (3+2)",
            Category::Rapid => "Rapid (10+5)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Pending,
    Active,
    Ended,
}

/// Game record returned by `GET /games/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameDetail {
    pub id: String,
    pub white_name: String,
    pub black_name: String,
    pub category: Category,
    pub status: GameStatus,
    #[serde(default)]
    pub result: Option<GameResult>,
    #[serde(default)]
    pub termination: Option<String>,
    /// Recorded move text; older records call it `pgn`.
    #[serde(default, alias = "pgn")]
    pub move_text: Option<String>,
    #[serde(default)]
    pub elo_white_before: Option<i32>,
    #[serde(default)]
    pub elo_black_before: Option<i32>,
    #[serde(default)]
    pub elo_white_after: Option<i32>,
    #[serde(default)]
    pub elo_black_after: Option<i32>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub ended_at: Option<String>,
}

impl GameDetail {
    /// Rating change for one side, when both before and after are known.
    pub fn elo_delta(&self, side: Side) -> Option<i32> {
        let (before, after) = match side {
            Side::White => (self.elo_white_before, self.elo_white_after),
            Side::Black => (self.elo_black_before, self.elo_black_after),
        };
        Some(after? - before?)
    }

    pub fn name(&self, side: Side) -> &str {
        match side {
            Side::White => &self.white_name,
            Side::Black => &self.black_name,
        }
    }
}
