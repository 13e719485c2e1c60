//! Game configuration loaded from TOML.

use crate::chess::{PlayerColor, PromotionPiece};
use crate::llm_client::{LlmConfig, LlmProvider};
use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Full configuration for a chess session.
#[derive(Debug, Clone, Default, PartialEq, Getters, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Names and colours of the participants.
    players: PlayersConfig,
    /// Suggestion service settings.
    agent: AgentSettings,
    /// Where match records go.
    records: RecordsConfig,
    /// Board geometry and input preferences.
    board: BoardConfig,
}

/// `[players]` section.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayersConfig {
    /// Record label for the human.
    human_label: String,
    /// Record label for the agent.
    agent_label: String,
    /// Colour the human plays.
    human_color: PlayerColor,
}

impl Default for PlayersConfig {
    fn default() -> Self {
        Self {
            human_label: "Player".to_string(),
            agent_label: "AI".to_string(),
            human_color: PlayerColor::White,
        }
    }
}

/// `[agent]` section.
#[derive(Debug, Clone, PartialEq, Getters, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Service provider.
    provider: LlmProvider,
    /// Model name.
    model: String,
    /// Service base URL; the provider default when absent.
    base_url: Option<String>,
    /// Reply length cap.
    max_tokens: u32,
    /// Sampling temperature.
    temperature: f32,
    /// Deadline for one suggestion, in seconds.
    timeout_secs: u64,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Ollama,
            model: "llama3.2".to_string(),
            base_url: None,
            max_tokens: 16,
            temperature: 0.1,
            timeout_secs: 10,
        }
    }
}

impl AgentSettings {
    /// Base URL after applying the provider default.
    pub fn resolved_base_url(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| self.provider.default_base_url().to_string())
    }

    /// Deadline for one suggestion.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// `[records]` section.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordsConfig {
    /// Directory for `.pgn` files.
    dir: PathBuf,
    /// Delete records of earlier sessions before the first move.
    reset_on_start: bool,
}

impl Default for RecordsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("games"),
            reset_on_start: true,
        }
    }
}

/// `[board]` section.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Piece chosen when a pawn reaches the last rank.
    promotion: PromotionPiece,
    /// Cells per square, horizontally.
    square_width: u32,
    /// Cells per square, vertically.
    square_height: u32,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            promotion: PromotionPiece::Queen,
            square_width: 6,
            square_height: 3,
        }
    }
}

impl GameConfig {
    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        let config = Self::from_toml(&content)?;
        info!(
            provider = %config.agent.provider,
            model = %config.agent.model,
            "Config loaded successfully"
        );
        Ok(config)
    }

    /// Parses configuration text. Missing keys take their defaults.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))
    }

    /// Loads `path` when it exists, defaults otherwise.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            info!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Overrides the human's colour.
    pub fn with_human_color(mut self, color: PlayerColor) -> Self {
        self.players.human_color = color;
        self
    }

    /// Overrides the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.agent.model = model.into();
        self
    }

    /// Overrides the service base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.agent.base_url = Some(url.into());
        self
    }

    /// Overrides the record directory.
    pub fn with_records_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.records.dir = dir.into();
        self
    }

    /// Overrides whether earlier records are deleted at start.
    pub fn with_reset_on_start(mut self, reset: bool) -> Self {
        self.records.reset_on_start = reset;
        self
    }

    /// Creates the LLM client configuration.
    ///
    /// OpenAI and Anthropic need `OPENAI_API_KEY` or `ANTHROPIC_API_KEY`;
    /// Ollama needs no key.
    #[instrument(skip(self), fields(provider = %self.agent.provider, model = %self.agent.model))]
    pub fn create_llm_config(&self) -> Result<LlmConfig, ConfigError> {
        debug!("Creating LLM config");
        let api_key = match self.agent.provider {
            LlmProvider::Ollama => None,
            LlmProvider::OpenAI => Some(std::env::var("OPENAI_API_KEY").map_err(|_| {
                ConfigError::new("OPENAI_API_KEY environment variable not set")
            })?),
            LlmProvider::Anthropic => Some(std::env::var("ANTHROPIC_API_KEY").map_err(|_| {
                ConfigError::new("ANTHROPIC_API_KEY environment variable not set")
            })?),
        };

        Ok(LlmConfig::new(
            self.agent.provider,
            self.agent.resolved_base_url(),
            api_key,
            self.agent.model.clone(),
            self.agent.max_tokens,
            self.agent.temperature,
        ))
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}
