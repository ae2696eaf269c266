//! Local UCI engine evaluator (async I/O over a child process).
//!
//! The evaluator is owned by whoever opened it and released with it; there is
//! no shared engine.

use std::process::Stdio;

use shakmaty::fen::Fen;
use shakmaty::Color;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, info};

use crate::error::SpectatorError;

/// Score of a position from white's point of view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    /// Pawns; positive favours white.
    pub pawns: Option<f64>,
    /// Moves to mate; positive means white mates.
    pub mate_in: Option<i32>,
    pub depth: u32,
    pub best_move: Option<String>,
}

impl Evaluation {
    /// Fold one engine `info` line into the evaluation. Lines below the
    /// target depth, or without a score, are ignored.
    fn absorb(&mut self, line: &str, target_depth: u32, black_to_move: bool) {
        let Some(depth) = parse_field::<u32>(line, "depth") else {
            return;
        };
        if depth < target_depth {
            return;
        }
        let flip = if black_to_move { -1 } else { 1 };

        if let Some(cp) = parse_score(line, "cp") {
            self.pawns = Some(f64::from(cp * flip) / 100.0);
            self.mate_in = None;
            self.depth = depth;
        } else if let Some(mate) = parse_score(line, "mate") {
            self.mate_in = Some(mate * flip);
            self.pawns = None;
            self.depth = depth;
        }
    }
}

pub struct LocalEvaluator {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl LocalEvaluator {
    /// Start the engine and complete the UCI handshake.
    pub async fn spawn(path: &str) -> Result<Self, SpectatorError> {
        let mut process = Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| SpectatorError::Engine(format!("Failed to spawn engine '{path}': {e}")))?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| SpectatorError::Engine("Engine stdin unavailable".into()))?;
        let stdout = process
            .stdout
            .take()
            .map(BufReader::new)
            .ok_or_else(|| SpectatorError::Engine("Engine stdout unavailable".into()))?;

        let mut engine = Self {
            process,
            stdin,
            stdout,
        };

        engine.send("uci").await?;
        engine.wait_for("uciok").await?;
        engine.send("isready").await?;
        engine.wait_for("readyok").await?;

        info!(path, "Engine ready");
        Ok(engine)
    }

    async fn send(&mut self, cmd: &str) -> Result<(), SpectatorError> {
        debug!(cmd, "engine <");
        self.stdin
            .write_all(format!("{cmd}\n").as_bytes())
            .await
            .map_err(|e| SpectatorError::Engine(format!("Failed to write to engine: {e}")))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| SpectatorError::Engine(format!("Failed to flush engine stdin: {e}")))
    }

    async fn read_line(&mut self, line: &mut String) -> Result<(), SpectatorError> {
        line.clear();
        let n = self
            .stdout
            .read_line(line)
            .await
            .map_err(|e| SpectatorError::Engine(format!("Failed to read from engine: {e}")))?;
        if n == 0 {
            return Err(SpectatorError::Engine("Engine exited".into()));
        }
        Ok(())
    }

    async fn wait_for(&mut self, expected: &str) -> Result<(), SpectatorError> {
        let mut line = String::new();
        loop {
            self.read_line(&mut line).await?;
            let trimmed = line.trim();
            debug!(line = trimmed, "engine >");
            if trimmed == expected {
                return Ok(());
            }
        }
    }

    /// Search `fen` to `depth` plies and report the score for white.
    pub async fn evaluate(&mut self, fen: &str, depth: u32) -> Result<Evaluation, SpectatorError> {
        let black_to_move = black_to_move(fen)?;

        self.send("stop").await?;
        self.send(&format!("position fen {fen}")).await?;
        self.send(&format!("go depth {depth}")).await?;

        let mut eval = Evaluation::default();
        let mut line = String::new();
        loop {
            self.read_line(&mut line).await?;
            let trimmed = line.trim();

            if trimmed.starts_with("info") {
                eval.absorb(trimmed, depth, black_to_move);
            } else if let Some(rest) = trimmed.strip_prefix("bestmove") {
                eval.best_move = rest
                    .split_whitespace()
                    .next()
                    .filter(|m| *m != "(none)")
                    .map(str::to_string);
                break;
            }
        }

        Ok(eval)
    }

    /// Ask the engine to exit and wait for it.
    pub async fn quit(mut self) {
        let _ = self.send("quit").await;
        let _ = self.process.wait().await;
    }
}

impl Drop for LocalEvaluator {
    fn drop(&mut self) {
        let _ = self.process.start_kill();
    }
}

fn black_to_move(fen: &str) -> Result<bool, SpectatorError> {
    let parsed: Fen = fen
        .trim()
        .parse()
        .map_err(|e| SpectatorError::Engine(format!("Invalid FEN '{fen}': {e}")))?;
    Ok(parsed.as_setup().turn == Color::Black)
}

/// Value following `key` in an info line.
fn parse_field<T: std::str::FromStr>(line: &str, key: &str) -> Option<T> {
    let mut parts = line.split_whitespace();
    while let Some(part) = parts.next() {
        if part == key {
            return parts.next()?.parse().ok();
        }
    }
    None
}

/// `score cp N` / `score mate N`.
fn parse_score(line: &str, kind: &str) -> Option<i32> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    parts
        .windows(3)
        .find(|w| w[0] == "score" && w[1] == kind)
        .and_then(|w| w[2].parse().ok())
}
