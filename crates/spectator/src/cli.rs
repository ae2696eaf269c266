use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "spectator",
    about = "Watch MoltChess games live or step through finished ones",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Follow a game in progress until it ends.
    Watch {
        game_id: String,
    },
    /// Print a finished game's moves and one position from it.
    Replay {
        game_id: String,
        /// Position to show (0 = start). Defaults to the final position.
        #[arg(long, allow_negative_numbers = true)]
        ply: Option<i64>,
        /// Evaluate the shown position with the engine at ENGINE_PATH.
        #[arg(long)]
        evaluate: bool,
    },
}
