use chess_core::GameDetail;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::config::Config;
use crate::error::SpectatorError;

#[derive(Debug, Deserialize)]
struct GameEnvelope {
    #[serde(default)]
    success: bool,
    game: Option<GameDetail>,
}

/// REST client for the arena's game endpoints.
pub struct ArenaClient {
    client: Client,
    base_url: String,
}

impl ArenaClient {
    pub fn new(config: &Config) -> Result<Self, SpectatorError> {
        let client = Client::builder()
            .user_agent(concat!("MoltChessSpectator/", env!("CARGO_PKG_VERSION")))
            .timeout(config.http_timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: config.api_base.clone(),
        })
    }

    /// Fetch one game record, finished or in progress.
    pub async fn fetch_game(&self, game_id: &str) -> Result<GameDetail, SpectatorError> {
        let url = format!("{}/games/{}", self.base_url, game_id);
        debug!(url = %url, "Fetching game");

        let resp = self.client.get(&url).send().await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Err(SpectatorError::NotFound(game_id.to_string()));
        }
        if !resp.status().is_success() {
            return Err(SpectatorError::Api(format!("HTTP {}", resp.status())));
        }

        let text = resp.text().await?;
        parse_game_envelope(&text, game_id)
    }
}

fn parse_game_envelope(body: &str, game_id: &str) -> Result<GameDetail, SpectatorError> {
    let envelope: GameEnvelope = serde_json::from_str(body)?;
    match envelope.game {
        Some(game) if envelope.success => Ok(game),
        _ => Err(SpectatorError::NotFound(game_id.to_string())),
    }
}
