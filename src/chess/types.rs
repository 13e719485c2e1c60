//! Core value types for the chess session.

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Color, Role, Square};
use std::fmt;
use std::str::FromStr;
use tracing::instrument;

/// Which participant controls a colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// The person at the board.
    Human,
    /// The language-model opponent.
    Agent,
}

/// Colour selection as it appears in configuration files.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PlayerColor {
    /// Moves first from the standard position.
    #[default]
    White,
    /// Moves second from the standard position.
    Black,
}

impl From<PlayerColor> for Color {
    fn from(color: PlayerColor) -> Self {
        match color {
            PlayerColor::White => Color::White,
            PlayerColor::Black => Color::Black,
        }
    }
}

/// Piece a pawn becomes when the human drops it on the last rank.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PromotionPiece {
    /// Promote to a queen.
    #[default]
    Queen,
    /// Promote to a rook.
    Rook,
    /// Promote to a bishop.
    Bishop,
    /// Promote to a knight.
    Knight,
}

impl From<PromotionPiece> for Role {
    fn from(piece: PromotionPiece) -> Self {
        match piece {
            PromotionPiece::Queen => Role::Queen,
            PromotionPiece::Rook => Role::Rook,
            PromotionPiece::Bishop => Role::Bishop,
            PromotionPiece::Knight => Role::Knight,
        }
    }
}

/// A move from one square to another, with optional promotion.
///
/// Castling is expressed as the king's own displacement (`e1g1`), which is
/// what standard UCI uses and what a player drags on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChessMove {
    from: Square,
    to: Square,
    promotion: Option<Role>,
}

impl ChessMove {
    /// Creates a move without promotion.
    pub fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
        }
    }

    /// Creates a promoting move.
    pub fn with_promotion(from: Square, to: Square, promotion: Role) -> Self {
        Self {
            from,
            to,
            promotion: Some(promotion),
        }
    }

    /// Origin square.
    pub fn from(&self) -> Square {
        self.from
    }

    /// Destination square.
    pub fn to(&self) -> Square {
        self.to
    }

    /// Promotion role, if any.
    pub fn promotion(&self) -> Option<Role> {
        self.promotion
    }

    /// Parses a UCI token such as `e2e4` or `e7e8q`.
    ///
    /// # Errors
    ///
    /// Returns [`MoveParseError`] if the token is not a from/to UCI move.
    #[instrument]
    pub fn from_uci(token: &str) -> Result<Self, MoveParseError> {
        match token.parse::<UciMove>() {
            Ok(UciMove::Normal {
                from,
                to,
                promotion,
            }) => Ok(Self {
                from,
                to,
                promotion,
            }),
            Ok(_) => Err(MoveParseError::Unsupported(token.to_string())),
            Err(_) => Err(MoveParseError::Malformed(token.to_string())),
        }
    }

    /// Converts a rules-engine move into the session's move type.
    ///
    /// Drops (crazyhouse) and null moves have no from square and yield `None`.
    pub(crate) fn from_engine(m: &shakmaty::Move) -> Option<Self> {
        match m.to_uci(CastlingMode::Standard) {
            UciMove::Normal {
                from,
                to,
                promotion,
            } => Some(Self {
                from,
                to,
                promotion,
            }),
            _ => None,
        }
    }
}

impl fmt::Display for ChessMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(role) = self.promotion {
            write!(f, "{}", role.char())?;
        }
        Ok(())
    }
}

impl FromStr for ChessMove {
    type Err = MoveParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_uci(s)
    }
}

/// Failure to read a UCI move token.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum MoveParseError {
    /// Not UCI syntax at all.
    #[display("'{}' is not a UCI move", _0)]
    Malformed(#[error(not(source))] String),
    /// Valid UCI but not a from/to move (drop or null move).
    #[display("'{}' is not a from/to move", _0)]
    Unsupported(#[error(not(source))] String),
}
