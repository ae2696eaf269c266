//! Chess primitives shared by the spectator: game records, PGN move text
//! handling and replay reconstruction.

pub mod error;
pub mod game_data;
pub mod pgn;
pub mod replay;

pub use error::MovetextError;
pub use game_data::{Category, GameDetail, GameResult, GameStatus, Side};
pub use replay::{Position, ReplayCursor, ReplayTimeline, STANDARD_START_FEN};
