//! Live channel wire format.

use chess_core::{GameResult, Side};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProtocolError;

/// Keepalive sent while the channel is open. The server answers `pong`,
/// which decodes to nothing.
pub const PING_FRAME: &str = r#"{"action":"ping"}"#;

/// Server-authoritative game state carried by a `state` frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameStateSnapshot {
    pub fen: String,
    #[serde(default)]
    pub last_move: Option<String>,
    pub clock_white: f64,
    pub clock_black: f64,
    pub to_move: Side,
    pub move_number: u32,
    #[serde(default)]
    pub spectator_count: Option<u32>,
}

impl GameStateSnapshot {
    pub fn clock(&self, side: Side) -> f64 {
        match side {
            Side::White => self.clock_white,
            Side::Black => self.clock_black,
        }
    }
}

/// Outcome carried by a `game_end` frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminalResult {
    pub result: GameResult,
    #[serde(default)]
    pub termination: String,
    #[serde(default)]
    pub white_elo_change: Option<i32>,
    #[serde(default)]
    pub black_elo_change: Option<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SpectatorEvent {
    State(GameStateSnapshot),
    GameEnd(TerminalResult),
    Error { message: String },
}

#[derive(Deserialize)]
struct ErrorFrame {
    #[serde(default)]
    message: String,
}

/// Decode one text frame.
///
/// Returns `Ok(None)` for event kinds outside the closed set (`pong` and
/// anything the server adds later); those are dropped without complaint.
pub fn decode_frame(text: &str) -> Result<Option<SpectatorEvent>, ProtocolError> {
    let value: Value = serde_json::from_str(text)?;
    let kind = value
        .get("event")
        .and_then(Value::as_str)
        .ok_or(ProtocolError::MissingEvent)?
        .to_string();

    let event = match kind.as_str() {
        "state" => SpectatorEvent::State(serde_json::from_value(value)?),
        "game_end" => SpectatorEvent::GameEnd(serde_json::from_value(value)?),
        "error" => {
            let frame: ErrorFrame = serde_json::from_value(value)?;
            SpectatorEvent::Error {
                message: frame.message,
            }
        }
        _ => return Ok(None),
    };

    Ok(Some(event))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_state() {
        let frame = r#"{"event":"state","game_id":"g1","fen":"8/8/8/8/8/8/8/K6k w - - 0 40",
            "last_move":"e2e4","clock_white":125.0,"clock_black":98.4,
            "to_move":"white","move_number":40,"spectator_count":3}"#;

        let Some(SpectatorEvent::State(snapshot)) = decode_frame(frame).unwrap() else {
            panic!("expected state event");
        };
        assert_eq!(snapshot.to_move, Side::White);
        assert_eq!(snapshot.clock(Side::Black), 98.4);
        assert_eq!(snapshot.last_move.as_deref(), Some("e2e4"));
        assert_eq!(snapshot.spectator_count, Some(3));
    }

    #[test]
    fn test_decode_game_end_and_error() {
        let end = decode_frame(
            r#"{"event":"game_end","result":"black_win","termination":"timeout","white_elo_change":-12}"#,
        )
        .unwrap();
        assert_eq!(
            end,
            Some(SpectatorEvent::GameEnd(TerminalResult {
                result: GameResult::BlackWin,
                termination: "timeout".into(),
                white_elo_change: Some(-12),
                black_elo_change: None,
            }))
        );

        let err = decode_frame(r#"{"event":"error","message":"Game not found or has ended"}"#).unwrap();
        assert_eq!(
            err,
            Some(SpectatorEvent::Error {
                message: "Game not found or has ended".into()
            })
        );
    }

    #[test]
    fn test_unknown_events_are_dropped() {
        assert_eq!(decode_frame(r#"{"event":"pong"}"#).unwrap(), None);
        assert_eq!(decode_frame(r#"{"event":"move_made","uci":"e2e4"}"#).unwrap(), None);
    }

    #[test]
    fn test_malformed_frames_error() {
        assert!(decode_frame("not json").is_err());
        assert!(matches!(
            decode_frame(r#"{"fen":"x"}"#),
            Err(ProtocolError::MissingEvent)
        ));
        assert!(decode_frame(r#"{"event":"state","fen":"x"}"#).is_err());
    }
}
