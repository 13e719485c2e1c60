//! Strictly Chess - Unified CLI
//!
//! Plays chess against a language model in the terminal, and probes the
//! suggestion service.

#![warn(missing_docs)]

mod cli;
mod tui;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command, PlayArgs};
use std::path::Path;
use std::sync::Arc;
use strictly_chess::{
    AgentTurnRunner, FsRecordStore, GameConfig, GameSession, LlmClient, LlmConfig,
    MoveNegotiator, Position,
};
use tracing::{info, instrument};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const ASK_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command.unwrap_or_else(|| Command::Play(PlayArgs::default())) {
        Command::Play(args) => run_play(&cli.config, args).await,
        Command::Health { url } => run_health(&cli.config, url).await,
        Command::Ask { prompt } => run_ask(&cli.config, prompt).await,
    }
}

/// Play one game in the terminal
#[instrument(skip_all, fields(config_path = %config_path.display()))]
async fn run_play(config_path: &Path, args: PlayArgs) -> Result<()> {
    tui::init_file_logging()?;

    let mut config = GameConfig::load_or_default(config_path)?;
    if let Some(color) = args.human_color {
        config = config.with_human_color(color);
    }
    if let Some(model) = args.model {
        config = config.with_model(model);
    }
    if args.keep_records {
        config = config.with_reset_on_start(false);
    }

    let position = match &args.fen {
        Some(fen) => Position::from_fen(fen)?,
        None => Position::new(),
    };

    let client = LlmClient::new(config.create_llm_config()?);
    let negotiator = MoveNegotiator::new(Arc::new(client), config.agent().timeout());

    let store = FsRecordStore::new(config.records().dir());
    info!(records = %store.dir().display(), "Record store ready");
    let session = GameSession::from_config(&config, position, Box::new(store));
    info!(state = ?session.state(), "Session ready");

    tui::run_tui(
        session,
        AgentTurnRunner::new(negotiator),
        config.players().human_label().clone(),
        config.players().agent_label().clone(),
    )
    .await
}

/// Check that the suggestion service answers
#[instrument(skip_all)]
async fn run_health(config_path: &Path, url: Option<String>) -> Result<()> {
    initialize_stderr_tracing();

    let mut config = GameConfig::load_or_default(config_path)?;
    if let Some(url) = url {
        config = config.with_base_url(url);
    }

    // The health endpoint takes no credentials.
    let agent = config.agent();
    let client = LlmClient::new(LlmConfig::new(
        *agent.provider(),
        agent.resolved_base_url(),
        None,
        agent.model().clone(),
        *agent.max_tokens(),
        *agent.temperature(),
    ));
    let url = client.config().base_url().to_string();

    info!(url = %url, "Checking service health");
    if client.health_check().await {
        println!("Service at {} is healthy", url);
        Ok(())
    } else {
        anyhow::bail!("Service at {} is not healthy", url)
    }
}

/// Send a free-form prompt and print the reply
#[instrument(skip_all)]
async fn run_ask(config_path: &Path, prompt: String) -> Result<()> {
    initialize_stderr_tracing();

    let config = GameConfig::load_or_default(config_path)?;
    let client = LlmClient::new(config.create_llm_config()?);

    info!(model = %client.config().model(), "Sending prompt");
    let reply = client.generate(ASK_SYSTEM_PROMPT, &prompt).await?;
    println!("{}", reply.trim());
    Ok(())
}

fn initialize_stderr_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,strictly_chess=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
