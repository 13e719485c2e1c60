//! Request/validate cycle for the agent's move.

use super::parse::{parse_suggestion, ParseError, ParsedMove};
use crate::chess::{ChessMove, LegalMoves};
use crate::llm_client::LlmError;
use derive_getters::Getters;
use derive_more::Display;
use shakmaty::Color;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

const SYSTEM_PROMPT: &str = "You are a chess engine. You answer with exactly one move in UCI notation.";

/// Everything the agent is told about the position it must move in.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct SuggestionRequest {
    /// FEN of the position.
    fen: String,
    /// Moves the agent may choose from.
    legal_moves: LegalMoves,
    /// Colour the agent plays.
    turn: Color,
}

impl SuggestionRequest {
    /// Creates a request from a position snapshot.
    pub fn new(fen: String, legal_moves: LegalMoves, turn: Color) -> Self {
        Self {
            fen,
            legal_moves,
            turn,
        }
    }
}

/// Prompt text handed to the suggestion service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionPrompt {
    system: String,
    user: String,
}

impl SuggestionPrompt {
    /// Creates a prompt from raw parts.
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }

    /// Builds the move-selection prompt for `request`.
    pub fn for_request(request: &SuggestionRequest) -> Self {
        let user = format!(
            "Current chess position FEN: {}\n\n\
             Legal moves in UCI format: {}\n\n\
             You are a chess engine. Choose one move from the legal moves list above.\n\
             Rules:\n\
             1. Respond ONLY with a single UCI move from the legal moves list\n\
             2. Do not add any explanation or analysis\n\
             3. The move must be exactly as shown in the legal moves list\n\
             4. Do not make up moves - use only moves from the provided list\n\n\
             Choose one move:",
            request.fen,
            request.legal_moves.to_uci().join(", "),
        );
        Self::new(SYSTEM_PROMPT, user)
    }

    /// System instruction.
    pub fn system(&self) -> &str {
        &self.system
    }

    /// User message.
    pub fn user(&self) -> &str {
        &self.user
    }
}

/// External service that answers a prompt with free text.
#[async_trait::async_trait]
pub trait SuggestionService: Send + Sync {
    /// Sends the prompt and returns the raw reply text.
    async fn request_suggestion(&self, prompt: &SuggestionPrompt) -> Result<String, LlmError>;
}

/// Why the agent's move was refused.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum RejectReason {
    /// The position offered no move to choose.
    #[display("no legal moves to choose from")]
    NoLegalMoves,
    /// The service could not be reached or answered with an error.
    #[display("transport error: {}", _0)]
    Transport(String),
    /// The service did not answer within the deadline.
    #[display("no reply within {:?}", _0)]
    Timeout(Duration),
    /// The reply did not start with a UCI move.
    #[display("unparseable reply: {}", _0)]
    Unparseable(ParseError),
    /// The reply named a move that is not legal here.
    #[display("illegal suggestion {}", _0)]
    Illegal(ChessMove),
}

/// Result of one negotiation round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NegotiationOutcome {
    /// The agent named a legal move.
    Accepted(ChessMove),
    /// The agent's turn failed; the session cannot continue.
    Rejected(RejectReason),
}

/// Obtains exactly one validated move per agent turn.
///
/// One request, one deadline, no retries.
#[derive(Clone)]
pub struct MoveNegotiator {
    service: Arc<dyn SuggestionService>,
    timeout: Duration,
}

impl std::fmt::Debug for MoveNegotiator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MoveNegotiator")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl MoveNegotiator {
    /// Creates a negotiator bounded by `timeout`.
    #[instrument(skip(service))]
    pub fn new(service: Arc<dyn SuggestionService>, timeout: Duration) -> Self {
        Self { service, timeout }
    }

    /// Deadline applied to each request.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Asks the service for a move and validates it against the request's
    /// legal moves by exact value.
    #[instrument(skip(self, request), fields(fen = %request.fen, legal = request.legal_moves.len()))]
    pub async fn suggest(&self, request: &SuggestionRequest) -> NegotiationOutcome {
        if request.legal_moves.is_empty() {
            warn!("Asked to move in a position without legal moves");
            return NegotiationOutcome::Rejected(RejectReason::NoLegalMoves);
        }

        let prompt = SuggestionPrompt::for_request(request);
        let raw = match tokio::time::timeout(self.timeout, self.service.request_suggestion(&prompt)).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                error!(error = %e, "Suggestion request failed");
                return NegotiationOutcome::Rejected(RejectReason::Transport(format!(
                    "{}: {}",
                    e.kind, e.message
                )));
            }
            Err(_) => {
                error!(timeout = ?self.timeout, "Suggestion request timed out");
                return NegotiationOutcome::Rejected(RejectReason::Timeout(self.timeout));
            }
        };

        info!(raw = %raw.trim(), "Raw agent reply");
        validate(&raw, request.legal_moves())
    }
}

/// Parses `raw` and checks the move against `legal_moves`.
fn validate(raw: &str, legal_moves: &LegalMoves) -> NegotiationOutcome {
    match parse_suggestion(raw) {
        Ok(ParsedMove(mv)) if legal_moves.contains(&mv) => {
            info!(%mv, "Agent move accepted");
            NegotiationOutcome::Accepted(mv)
        }
        Ok(ParsedMove(mv)) => {
            error!(%mv, legal = ?legal_moves.to_uci(), "Agent suggested a move outside the legal set");
            NegotiationOutcome::Rejected(RejectReason::Illegal(mv))
        }
        Err(e) => {
            error!(error = %e, "Agent reply is not a move");
            NegotiationOutcome::Rejected(RejectReason::Unparseable(e))
        }
    }
}
