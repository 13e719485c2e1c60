//! Command-line interface for strictly_chess.

use clap::{Parser, Subcommand};
use strictly_chess::PlayerColor;

/// Strictly Chess - play chess against a language model
#[derive(Parser, Debug)]
#[command(name = "strictly_chess")]
#[command(about = "Chess against a language-model opponent with strict move validation", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the game configuration file
    #[arg(short, long, global = true, default_value = "strictly_chess.toml")]
    pub config: std::path::PathBuf,

    /// Subcommand to run (defaults to `play`)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play a game in the terminal
    Play(PlayArgs),

    /// Check that the suggestion service is reachable
    Health {
        /// URL to probe (defaults to the configured base URL)
        #[arg(long)]
        url: Option<String>,
    },

    /// Send a free-form prompt to the configured model and print the reply
    Ask {
        /// Prompt text
        #[arg(short, long)]
        prompt: String,
    },
}

/// Options for `play`
#[derive(clap::Args, Debug, Default)]
pub struct PlayArgs {
    /// Start from this FEN instead of the standard position
    #[arg(long)]
    pub fen: Option<String>,

    /// Colour the human plays
    #[arg(long)]
    pub human_color: Option<PlayerColor>,

    /// Keep records of earlier sessions
    #[arg(long)]
    pub keep_records: bool,

    /// Override the configured model
    #[arg(long)]
    pub model: Option<String>,
}
