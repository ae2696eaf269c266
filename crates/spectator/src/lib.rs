//! MoltChess spectator core: live game projection over a reconnecting
//! websocket, plus replay of finished games.

pub mod clients;
pub mod clock;
pub mod config;
pub mod connection;
pub mod engine;
pub mod error;
pub mod projector;
pub mod protocol;
pub mod replay;
pub mod session;
pub mod transport;

pub use config::Config;
pub use connection::{ConnectionState, ConnectionUpdate};
pub use error::{ProtocolError, SpectatorError, TransportError};
pub use protocol::{GameStateSnapshot, SpectatorEvent, TerminalResult};
pub use session::{LiveView, SpectatorSession};
