//! Spectator CLI
//!
//! Terminal front end for the live view and the replay view.

mod cli;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use chess_core::{GameResult, Side};
use spectator::clients::arena::ArenaClient;
use spectator::engine::LocalEvaluator;
use spectator::replay::ReplayView;
use spectator::transport::WsTransport;
use spectator::{Config, ConnectionState, LiveView, SpectatorSession};

use crate::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    match cli.command {
        Commands::Watch { game_id } => watch(&config, &game_id).await,
        Commands::Replay {
            game_id,
            ply,
            evaluate,
        } => replay(&config, &game_id, ply, evaluate).await,
    }
}

async fn watch(config: &Config, game_id: &str) -> anyhow::Result<()> {
    let client = ArenaClient::new(config)?;
    match client.fetch_game(game_id).await {
        Ok(game) => println!(
            "{} vs {} · {}",
            game.white_name,
            game.black_name,
            game.category.label()
        ),
        // Names are cosmetic; the live channel is still worth opening
        Err(e) => warn!(game_id, error = %e, "Could not fetch game header"),
    }

    let session = SpectatorSession::open(WsTransport, config, game_id);
    let mut view = session.view();
    let mut last_line = String::new();

    loop {
        tokio::select! {
            changed = view.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = view.borrow_and_update().clone();
                let line = render_live(&current);
                if line != last_line {
                    println!("{line}");
                    last_line = line;
                }
                if current.is_over() {
                    break;
                }
                if current.connection == ConnectionState::Closed && current.error.is_some() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    session.close().await;
    Ok(())
}

fn render_live(view: &LiveView) -> String {
    if let Some(terminal) = &view.terminal {
        return format!(
            "Game over: {} {} ({})",
            terminal.result.score_text(),
            outcome_text(terminal.result),
            terminal.termination
        );
    }
    if let Some(error) = &view.error {
        return format!("[{:?}] error: {}", view.connection, error);
    }

    let Some(snapshot) = &view.snapshot else {
        return format!("[{:?}] waiting for game state", view.connection);
    };

    let marker = |side: Side| {
        let running = if view.ticking == Some(side) { "*" } else { "" };
        let clock = view.clock(side);
        let urgency = if clock.is_critical() {
            "!!"
        } else if clock.is_low() {
            "!"
        } else {
            ""
        };
        format!("{running}{urgency}")
    };
    format!(
        "[{:?}] move {} · {} to move · last {} · white {}{} · black {}{} · {}",
        view.connection,
        snapshot.move_number,
        snapshot.to_move,
        snapshot.last_move.as_deref().unwrap_or("-"),
        view.white_clock.formatted(),
        marker(Side::White),
        view.black_clock.formatted(),
        marker(Side::Black),
        snapshot.fen,
    )
}

fn outcome_text(result: GameResult) -> &'static str {
    match result.winner() {
        Some(Side::White) => "white wins",
        Some(Side::Black) => "black wins",
        None if result == GameResult::Draw => "draw",
        None => "result unknown",
    }
}

async fn replay(
    config: &Config,
    game_id: &str,
    ply: Option<i64>,
    evaluate: bool,
) -> anyhow::Result<()> {
    let client = ArenaClient::new(config)?;
    let mut view = ReplayView::load(&client, game_id)
        .await
        .with_context(|| format!("Failed to load game {game_id}"))?;

    let game = view.detail();
    println!(
        "{} vs {} · {} · {} {}",
        game.white_name,
        game.black_name,
        game.category.label(),
        view.result_text(),
        game.result.map_or("", outcome_text)
    );
    for side in [Side::White, Side::Black] {
        if let Some(delta) = view.elo_delta(side) {
            println!("  {} {:+}", view.detail().name(side), delta);
        }
    }

    let moves = view.move_list();
    if moves.is_empty() {
        println!("No moves");
    }
    for entry in &moves {
        println!("  {:>4} {}", entry.ply, entry.label());
    }

    match ply {
        Some(target) => view.jump_to(target),
        None => view.last(),
    };
    let fen = view.current().fen.clone();
    println!(
        "Position {}/{}: {}",
        view.cursor_index(),
        view.timeline().ply_count(),
        fen
    );
    if let Some(last) = view.last_move() {
        println!("Last move: {last}");
    }
    if view.at_end() && view.timeline().is_degraded() {
        println!("Move text could not be replayed; showing the starting position");
    }

    if evaluate {
        let path = config
            .engine_path
            .as_deref()
            .context("ENGINE_PATH is not set")?;
        let mut engine = LocalEvaluator::spawn(path).await?;
        let eval = engine.evaluate(&fen, config.engine_depth).await?;
        engine.quit().await;

        match (eval.pawns, eval.mate_in) {
            (_, Some(mate)) => println!("Eval: mate in {mate} (depth {})", eval.depth),
            (Some(pawns), None) => println!("Eval: {pawns:+.2} (depth {})", eval.depth),
            (None, None) => println!("Eval: unavailable"),
        }
        if let Some(best) = eval.best_move {
            println!("Best: {best}");
        }
    }

    Ok(())
}
