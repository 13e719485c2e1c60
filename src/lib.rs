//! Strictly Chess library - chess against a language-model opponent
//!
//! The human plays with the pointer, the agent plays through a suggestion
//! service, and every move from either side passes the rules engine before it
//! touches the board.
//!
//! # Architecture
//!
//! - **Chess**: position adapter over `shakmaty` (legal moves, status, FEN/SAN)
//! - **Interaction**: pointer gestures to candidate moves
//! - **Negotiator**: one validated move per agent turn, with a deadline
//! - **Record**: append-only PGN record, written after every move
//! - **Session**: turn order and the single apply path
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use strictly_chess::{
//!     FsRecordStore, GameConfig, GameSession, LlmClient, MoveNegotiator, Position,
//! };
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = GameConfig::default();
//! let client = LlmClient::new(config.create_llm_config()?);
//! let negotiator = MoveNegotiator::new(Arc::new(client), config.agent().timeout());
//!
//! let store = FsRecordStore::new(config.records().dir());
//! let mut session = GameSession::from_config(&config, Position::new(), Box::new(store));
//! session.play_agent_turn(&negotiator).await;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod chess;
mod config;
mod interaction;
mod llm_client;
mod negotiator;
mod record;
mod session;

// Crate-level exports - Chess
pub use chess::{
    ChessMove, DrawReason, GameStatus, LegalMoves, MoveParseError, PlayerColor, Position,
    PositionError, PromotionPiece, Side,
};

// Crate-level exports - Configuration
pub use config::{AgentSettings, BoardConfig, ConfigError, GameConfig, PlayersConfig, RecordsConfig};

// Crate-level exports - Interaction
pub use interaction::{
    BoardProjection, InteractionController, InteractionEvent, ScreenPos, Selection,
    SelectionState, MAX_SQUARE_SIZE,
};

// Crate-level exports - LLM client
pub use llm_client::{LlmClient, LlmConfig, LlmError, LlmErrorKind, LlmProvider};

// Crate-level exports - Negotiation
pub use negotiator::{
    parse_suggestion, MoveNegotiator, NegotiationOutcome, ParseError, ParsedMove, RejectReason,
    SuggestionPrompt, SuggestionRequest, SuggestionService,
};

// Crate-level exports - Records
pub use record::{
    FsRecordStore, MatchRecord, RecordError, RecordHeaders, RecordStore, RecordedMove,
    SessionRecorder, StartPosition, RECORD_EXTENSION,
};

// Crate-level exports - Session
pub use session::{
    AgentTurnRunner, GameSession, MoveDisposition, OutcomeKind, PendingSuggestion,
    SessionOutcome, SessionState,
};
