//! Spectator error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpectatorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Game not found: {0}")]
    NotFound(String),

    #[error("Arena API error: {0}")]
    Api(String),

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure of the live transport. Always recovered by reconnecting.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Connect failed: {0}")]
    Connect(String),

    #[error("Read failed: {0}")]
    Read(String),

    #[error("Send failed: {0}")]
    Send(String),
}

/// An inbound frame that could not be decoded. The frame is discarded.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Frame has no event field")]
    MissingEvent,
}
