//! LLM API client for Ollama, OpenAI and Anthropic.

use crate::negotiator::{SuggestionPrompt, SuggestionService};
use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client as OpenAIClient,
};
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

/// LLM provider selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, strum::Display, strum::EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LlmProvider {
    /// Local Ollama server (`/api/generate`).
    #[default]
    Ollama,
    /// OpenAI (GPT models).
    OpenAI,
    /// Anthropic (Claude models).
    Anthropic,
}

impl LlmProvider {
    /// Base URL used when the configuration names none.
    pub fn default_base_url(self) -> &'static str {
        match self {
            Self::Ollama => "http://localhost:11434",
            Self::OpenAI => "https://api.openai.com/v1",
            Self::Anthropic => "https://api.anthropic.com",
        }
    }
}

/// Configuration for LLM client.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    provider: LlmProvider,
    base_url: String,
    api_key: Option<String>,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl LlmConfig {
    /// Creates a new LLM configuration.
    #[instrument(skip(api_key), fields(provider = %provider, model = %model))]
    pub fn new(
        provider: LlmProvider,
        base_url: String,
        api_key: Option<String>,
        model: String,
        max_tokens: u32,
        temperature: f32,
    ) -> Self {
        debug!("Creating LLM config");
        Self {
            provider,
            base_url,
            api_key,
            model,
            max_tokens,
            temperature,
        }
    }

    /// Gets the provider.
    pub fn provider(&self) -> LlmProvider {
        self.provider
    }

    /// Gets the service base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Gets the API key, if the provider needs one.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// Gets the model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Gets the max tokens.
    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    /// Gets the sampling temperature.
    pub fn temperature(&self) -> f32 {
        self.temperature
    }
}

/// LLM client that abstracts over multiple providers.
#[derive(Debug, Clone)]
pub struct LlmClient {
    config: LlmConfig,
    http: reqwest::Client,
}

impl LlmClient {
    /// Creates a new LLM client.
    #[instrument(skip(config), fields(provider = %config.provider()))]
    pub fn new(config: LlmConfig) -> Self {
        info!("Creating LLM client");
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Gets the client configuration.
    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Generates a completion from a system prompt and user message.
    #[instrument(skip(self, system_prompt, user_message), fields(provider = %self.config.provider, model = %self.config.model))]
    pub async fn generate(
        &self,
        system_prompt: &str,
        user_message: &str,
    ) -> Result<String, LlmError> {
        debug!("Generating completion");
        match self.config.provider {
            LlmProvider::Ollama => self.generate_ollama(system_prompt, user_message).await,
            LlmProvider::OpenAI => self.generate_openai(system_prompt, user_message).await,
            LlmProvider::Anthropic => self.generate_anthropic(system_prompt, user_message).await,
        }
    }

    /// Checks whether the service answers at its base URL.
    #[instrument(skip(self), fields(url = %self.config.base_url))]
    pub async fn health_check(&self) -> bool {
        check_health(&self.http, &self.config.base_url).await
    }

    /// Generates a completion using a local Ollama server.
    #[instrument(skip(self, system_prompt, user_message))]
    async fn generate_ollama(
        &self,
        system_prompt: &str,
        user_message: &str,
    ) -> Result<String, LlmError> {
        let url = format!("{}/api/generate", self.config.base_url.trim_end_matches('/'));

        debug!(url = %url, "Building Ollama request");
        let request_body = serde_json::json!({
            "model": self.config.model,
            "prompt": user_message,
            "system": system_prompt,
            "stream": false,
            "options": {
                "temperature": self.config.temperature,
                "num_predict": self.config.max_tokens,
            }
        });

        let response_json = self.post_json(&url, &request_body, &[]).await?;

        let content = response_json["response"]
            .as_str()
            .ok_or_else(|| {
                error!(response = %response_json, "No response field in Ollama reply");
                LlmError::new(
                    LlmErrorKind::Decode,
                    "No response field in Ollama reply".to_string(),
                )
            })?
            .to_string();

        info!(content_length = content.len(), "Generated completion");
        Ok(content)
    }

    /// Generates a completion using Anthropic Claude.
    #[instrument(skip(self, system_prompt, user_message))]
    async fn generate_anthropic(
        &self,
        system_prompt: &str,
        user_message: &str,
    ) -> Result<String, LlmError> {
        let api_key = self.config.api_key.clone().ok_or_else(|| {
            LlmError::new(
                LlmErrorKind::Config,
                "Anthropic requires an API key".to_string(),
            )
        })?;
        let url = format!("{}/v1/messages", self.config.base_url.trim_end_matches('/'));

        debug!("Building Anthropic API request");
        let request_body = serde_json::json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "system": system_prompt,
            "messages": [
                {
                    "role": "user",
                    "content": user_message
                }
            ]
        });

        let response_json = self
            .post_json(
                &url,
                &request_body,
                &[("x-api-key", api_key.as_str()), ("anthropic-version", "2023-06-01")],
            )
            .await?;

        let content = response_json["content"][0]["text"]
            .as_str()
            .ok_or_else(|| {
                error!(response = %response_json, "No text content in Anthropic response");
                LlmError::new(
                    LlmErrorKind::Decode,
                    "No text content in Anthropic response".to_string(),
                )
            })?
            .to_string();

        info!(content_length = content.len(), "Generated completion");
        Ok(content)
    }

    /// Generates a completion using OpenAI.
    #[instrument(skip(self, system_prompt, user_message))]
    async fn generate_openai(
        &self,
        system_prompt: &str,
        user_message: &str,
    ) -> Result<String, LlmError> {
        debug!("Creating OpenAI client");

        let api_key = self.config.api_key.clone().ok_or_else(|| {
            LlmError::new(LlmErrorKind::Config, "OpenAI requires an API key".to_string())
        })?;
        let client = OpenAIClient::with_config(
            OpenAIConfig::new()
                .with_api_key(api_key)
                .with_api_base(self.config.base_url.clone()),
        );

        debug!("Building chat completion request");
        let messages = vec![
            ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system_prompt)
                    .build()
                    .map_err(|e| {
                        error!(error = ?e, "Failed to build system message");
                        LlmError::new(
                            LlmErrorKind::Request,
                            format!("Failed to build system message: {}", e),
                        )
                    })?,
            ),
            ChatCompletionRequestMessage::User(
                ChatCompletionRequestUserMessageArgs::default()
                    .content(user_message)
                    .build()
                    .map_err(|e| {
                        error!(error = ?e, "Failed to build user message");
                        LlmError::new(
                            LlmErrorKind::Request,
                            format!("Failed to build user message: {}", e),
                        )
                    })?,
            ),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.config.model)
            .messages(messages)
            .max_tokens(self.config.max_tokens)
            .temperature(self.config.temperature)
            .build()
            .map_err(|e| {
                error!(error = ?e, "Failed to build request");
                LlmError::new(
                    LlmErrorKind::Request,
                    format!("Failed to build request: {}", e),
                )
            })?;

        debug!("Sending request to OpenAI");
        let response = client.chat().create(request).await.map_err(|e| {
            error!(error = ?e, "OpenAI API error");
            LlmError::new(LlmErrorKind::Transport, format!("OpenAI API error: {}", e))
        })?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| {
                error!("No content in OpenAI response");
                LlmError::new(
                    LlmErrorKind::Decode,
                    "No content in OpenAI response".to_string(),
                )
            })?;

        info!(content_length = content.len(), "Generated completion");
        Ok(content)
    }

    /// Posts a JSON body and decodes a JSON reply, mapping every failure to
    /// an [`LlmError`] of the matching kind.
    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
        headers: &[(&str, &str)],
    ) -> Result<serde_json::Value, LlmError> {
        let mut request = self
            .http
            .post(url)
            .header("content-type", "application/json")
            .json(body);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        debug!(url, "Sending request");
        let response = request.send().await.map_err(|e| {
            error!(error = ?e, "API request failed");
            LlmError::new(
                LlmErrorKind::Transport,
                format!("API request failed: {}", e),
            )
        })?;

        let status = response.status();
        let response_text = response.text().await.map_err(|e| {
            error!(error = ?e, "Failed to read response");
            LlmError::new(
                LlmErrorKind::Transport,
                format!("Failed to read response: {}", e),
            )
        })?;

        if !status.is_success() {
            error!(status = %status, response = %response_text, "API error status");
            return Err(LlmError::new(
                LlmErrorKind::Status(status.as_u16()),
                format!("API error {}: {}", status, response_text),
            ));
        }

        debug!(response_length = response_text.len(), "Parsing response");
        serde_json::from_str(&response_text).map_err(|e| {
            error!(error = ?e, response = %response_text, "Failed to parse response");
            LlmError::new(
                LlmErrorKind::Decode,
                format!("Failed to parse response: {}", e),
            )
        })
    }
}

#[async_trait::async_trait]
impl SuggestionService for LlmClient {
    async fn request_suggestion(&self, prompt: &SuggestionPrompt) -> Result<String, LlmError> {
        self.generate(prompt.system(), prompt.user()).await
    }
}

/// Returns true when `url` answers a GET with status 200.
#[instrument(skip(http))]
async fn check_health(http: &reqwest::Client, url: &str) -> bool {
    match http.get(url).send().await {
        Ok(response) if response.status() == reqwest::StatusCode::OK => {
            info!("Service is healthy");
            true
        }
        Ok(response) => {
            warn!(status = %response.status(), "Service answered with non-OK status");
            false
        }
        Err(e) => {
            warn!(error = %e, "Service unreachable");
            false
        }
    }
}

/// Broad category of an [`LlmError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum LlmErrorKind {
    /// Missing key or unusable configuration.
    #[display("config")]
    Config,
    /// The request could not be built.
    #[display("request")]
    Request,
    /// The service could not be reached or the body could not be read.
    #[display("transport")]
    Transport,
    /// The service answered with a non-success status.
    #[display("status {}", _0)]
    Status(u16),
    /// The reply did not have the expected shape.
    #[display("decode")]
    Decode,
}

/// LLM client error.
#[derive(Debug, Clone, Display, Error)]
#[display("LLM {} error: {} at {}:{}", kind, message, file, line)]
pub struct LlmError {
    /// Error category.
    pub kind: LlmErrorKind,
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl LlmError {
    /// Creates a new LLM error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(kind: LlmErrorKind, message: String) -> Self {
        let loc = std::panic::Location::caller();
        error!(error_message = %message, "LLM error created");
        Self {
            kind,
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
