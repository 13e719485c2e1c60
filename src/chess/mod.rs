//! Chess value types and the rules-engine adapter.

mod position;
mod types;

pub use position::{DrawReason, GameStatus, LegalMoves, Position, PositionError};
pub use types::{ChessMove, MoveParseError, PlayerColor, PromotionPiece, Side};
