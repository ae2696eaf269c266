//! Move text errors

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MovetextError {
    #[error("No move text recorded")]
    Missing,

    #[error("Invalid starting position '{fen}': {reason}")]
    InvalidStart { fen: String, reason: String },

    #[error("Unreadable token '{token}' at ply {ply}")]
    InvalidToken { ply: usize, token: String },

    #[error("Illegal move '{san}' at ply {ply}: {reason}")]
    IllegalMove { ply: usize, san: String, reason: String },

    #[error("Unbalanced {0} in move text")]
    Unbalanced(&'static str),

    #[error("Pattern error: {0}")]
    Pattern(String),
}
