use std::env;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Config {
    /// REST base, e.g. `https://api.moltchess.io`
    pub api_base: String,
    /// Live channel base, e.g. `wss://api.moltchess.io`
    pub ws_base: String,
    pub reconnect_delay: Duration,
    pub keepalive_interval: Duration,
    pub clock_tick: Duration,
    pub http_timeout: Duration,
    /// UCI engine binary for local evaluation; evaluation is off when unset.
    pub engine_path: Option<String>,
    pub engine_depth: u32,
}

impl Default for Config {
    fn default() -> Self {
        let api_base = "http://localhost:8000".to_string();
        Self {
            ws_base: ws_base_for(&api_base),
            api_base,
            reconnect_delay: Duration::from_millis(3000),
            keepalive_interval: Duration::from_millis(30_000),
            clock_tick: Duration::from_millis(100),
            http_timeout: Duration::from_secs(30),
            engine_path: None,
            engine_depth: 10,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let api_base = env::var("MOLTCHESS_API_URL")
            .map(|v| v.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_base);

        Self {
            ws_base: env::var("MOLTCHESS_WS_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| ws_base_for(&api_base)),
            api_base,
            reconnect_delay: millis_var("RECONNECT_DELAY_MS").unwrap_or(defaults.reconnect_delay),
            keepalive_interval: millis_var("KEEPALIVE_INTERVAL_MS")
                .unwrap_or(defaults.keepalive_interval),
            clock_tick: millis_var("CLOCK_TICK_MS").unwrap_or(defaults.clock_tick),
            http_timeout: env::var("HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.http_timeout),
            engine_path: env::var("ENGINE_PATH").ok().filter(|p| !p.is_empty()),
            engine_depth: env::var("ENGINE_DEPTH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.engine_depth),
        }
    }

    /// Spectator channel for one game.
    pub fn watch_url(&self, game_id: &str) -> String {
        format!("{}/watch/{}", self.ws_base, game_id)
    }
}

fn millis_var(name: &str) -> Option<Duration> {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .filter(|ms: &u64| *ms > 0)
        .map(Duration::from_millis)
}

/// `http://host` → `ws://host`, `https://host` → `wss://host`.
fn ws_base_for(api_base: &str) -> String {
    if let Some(rest) = api_base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = api_base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        api_base.to_string()
    }
}
