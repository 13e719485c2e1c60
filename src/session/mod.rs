//! Game session: turn order, move application and agent turns.

mod game;
mod pending;
mod setup;

pub use game::{GameSession, MoveDisposition, OutcomeKind, SessionOutcome, SessionState};
pub use pending::{AgentTurnRunner, PendingSuggestion};
