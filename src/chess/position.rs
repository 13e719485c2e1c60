//! Rules-engine adapter.
//!
//! [`Position`] wraps a [`shakmaty::Chess`] and exposes only what the session
//! needs: legal moves, apply, side to move, terminal status and the FEN/SAN
//! text forms. Nothing here knows about pointers, agents or records.

use super::types::ChessMove;
use derive_more::{Display, Error};
use shakmaty::fen::Fen;
use shakmaty::san::SanPlus;
use shakmaty::zobrist::{Zobrist64, ZobristHash};
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, Piece, Position as _, Square};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, instrument, warn};

/// Halfmove clock at which the seventy-five-move rule ends the game.
const SEVENTY_FIVE_MOVE_PLIES: u32 = 150;

/// Occurrences of one position that end the game by repetition.
const FIVEFOLD: u32 = 5;

/// Why a game ended drawn without stalemate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum DrawReason {
    /// Neither side can deliver mate.
    #[display("insufficient material")]
    InsufficientMaterial,
    /// 75 moves by each side without capture or pawn move.
    #[display("seventy-five-move rule")]
    SeventyFiveMoveRule,
    /// The same position occurred five times.
    #[display("fivefold repetition")]
    FivefoldRepetition,
}

/// Terminal status of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum GameStatus {
    /// The side to move has legal moves and no draw applies.
    #[display("in progress")]
    Ongoing,
    /// The side to move is mated.
    #[display("checkmate, {:?} wins", winner)]
    Checkmate {
        /// Colour that delivered mate.
        winner: Color,
    },
    /// The side to move has no legal move and is not in check.
    #[display("stalemate")]
    Stalemate,
    /// Drawn for another reason.
    #[display("draw by {}", _0)]
    Draw(DrawReason),
}

impl GameStatus {
    /// Returns true once no further moves may be played.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Ongoing)
    }

    /// PGN result token for this status.
    pub fn result_tag(&self) -> &'static str {
        match self {
            Self::Ongoing => "*",
            Self::Checkmate {
                winner: Color::White,
            } => "1-0",
            Self::Checkmate {
                winner: Color::Black,
            } => "0-1",
            Self::Stalemate | Self::Draw(_) => "1/2-1/2",
        }
    }
}

/// The legal moves of one position, in engine generation order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LegalMoves(Vec<ChessMove>);

impl LegalMoves {
    /// Exact-value membership.
    pub fn contains(&self, mv: &ChessMove) -> bool {
        self.0.contains(mv)
    }

    /// Moves whose origin is `square`.
    pub fn from_square(&self, square: Square) -> Vec<ChessMove> {
        self.0
            .iter()
            .filter(|mv| mv.from() == square)
            .copied()
            .collect()
    }

    /// Destination squares reachable from `square`.
    pub fn destinations(&self, square: Square) -> BTreeSet<Square> {
        self.0
            .iter()
            .filter(|mv| mv.from() == square)
            .map(|mv| mv.to())
            .collect()
    }

    /// Number of legal moves.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the side to move has no move at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// UCI tokens, in generation order.
    pub fn to_uci(&self) -> Vec<String> {
        self.0.iter().map(ChessMove::to_string).collect()
    }
}

impl FromIterator<ChessMove> for LegalMoves {
    fn from_iter<I: IntoIterator<Item = ChessMove>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Authoritative board state of a session.
#[derive(Debug, Clone)]
pub struct Position {
    chess: Chess,
    repetitions: HashMap<Zobrist64, u32>,
}

impl Position {
    /// Creates the standard starting position.
    #[instrument]
    pub fn new() -> Self {
        Self::from_chess(Chess::default())
    }

    /// Loads a position from FEN.
    ///
    /// # Errors
    ///
    /// Returns [`PositionError`] if the FEN is malformed or describes an
    /// illegal setup.
    #[instrument]
    pub fn from_fen(fen: &str) -> Result<Self, PositionError> {
        let parsed: Fen = fen
            .parse()
            .map_err(|e| PositionError::new(format!("Invalid FEN '{}': {}", fen, e)))?;
        let chess: Chess = parsed
            .into_position(CastlingMode::Standard)
            .map_err(|e| PositionError::new(format!("Illegal position '{}': {}", fen, e)))?;
        debug!("Position loaded from FEN");
        Ok(Self::from_chess(chess))
    }

    fn from_chess(chess: Chess) -> Self {
        let mut position = Self {
            chess,
            repetitions: HashMap::new(),
        };
        position.count_repetition();
        position
    }

    /// Canonical FEN of the current position.
    pub fn fen(&self) -> String {
        Fen::from_position(self.chess.clone(), EnPassantMode::Legal).to_string()
    }

    /// Colour to move.
    pub fn turn(&self) -> Color {
        self.chess.turn()
    }

    /// Piece on `square`, if any.
    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.chess.board().piece_at(square)
    }

    /// True if the side to move is in check.
    pub fn is_check(&self) -> bool {
        self.chess.is_check()
    }

    /// Full move number as written in FEN.
    pub fn fullmoves(&self) -> u32 {
        self.chess.fullmoves().get()
    }

    /// Enumerates the legal moves of the side to move.
    pub fn legal_moves(&self) -> LegalMoves {
        self.chess
            .legal_moves()
            .iter()
            .filter_map(ChessMove::from_engine)
            .collect()
    }

    /// True if `mv` is one of the legal moves.
    pub fn is_legal(&self, mv: &ChessMove) -> bool {
        self.engine_move(mv).is_some()
    }

    /// Standard algebraic notation of `mv`, with check or mate suffix.
    ///
    /// # Errors
    ///
    /// Returns [`PositionError`] if `mv` is not legal here.
    #[instrument(skip(self), fields(mv = %mv))]
    pub fn san(&self, mv: &ChessMove) -> Result<String, PositionError> {
        let engine_move = self
            .engine_move(mv)
            .ok_or_else(|| PositionError::new(format!("Move {} is not legal", mv)))?;
        let mut after = self.chess.clone();
        Ok(SanPlus::from_move_and_play_unchecked(&mut after, &engine_move).to_string())
    }

    /// Plays `mv`, replacing the current position.
    ///
    /// # Errors
    ///
    /// Returns [`PositionError`] if `mv` is not legal; the position is left
    /// untouched in that case.
    #[instrument(skip(self), fields(mv = %mv, turn = ?self.turn()))]
    pub fn apply(&mut self, mv: &ChessMove) -> Result<(), PositionError> {
        let engine_move = self.engine_move(mv).ok_or_else(|| {
            warn!("Rejected illegal move at the rules boundary");
            PositionError::new(format!("Move {} is not legal", mv))
        })?;
        self.chess.play_unchecked(&engine_move);
        self.count_repetition();
        debug!(fen = %self.fen(), "Move applied");
        Ok(())
    }

    /// Terminal status of the current position.
    pub fn status(&self) -> GameStatus {
        if self.chess.is_checkmate() {
            GameStatus::Checkmate {
                winner: !self.chess.turn(),
            }
        } else if self.chess.is_stalemate() {
            GameStatus::Stalemate
        } else if self.chess.is_insufficient_material() {
            GameStatus::Draw(DrawReason::InsufficientMaterial)
        } else if self.chess.halfmoves() >= SEVENTY_FIVE_MOVE_PLIES {
            GameStatus::Draw(DrawReason::SeventyFiveMoveRule)
        } else if self.repetitions.values().any(|count| *count >= FIVEFOLD) {
            GameStatus::Draw(DrawReason::FivefoldRepetition)
        } else {
            GameStatus::Ongoing
        }
    }

    /// True once the game is over.
    pub fn is_terminal(&self) -> bool {
        self.status().is_terminal()
    }

    /// PGN result token of the current position.
    pub fn result(&self) -> &'static str {
        self.status().result_tag()
    }

    fn engine_move(&self, mv: &ChessMove) -> Option<shakmaty::Move> {
        self.chess
            .legal_moves()
            .into_iter()
            .find(|candidate| ChessMove::from_engine(candidate).as_ref() == Some(mv))
    }

    fn count_repetition(&mut self) {
        let key = self.chess.zobrist_hash::<Zobrist64>(EnPassantMode::Legal);
        *self.repetitions.entry(key).or_insert(0) += 1;
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new()
    }
}

/// Rules adapter error.
#[derive(Debug, Clone, Display, Error)]
#[display("Position error: {} at {}:{}", message, file, line)]
pub struct PositionError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl PositionError {
    /// Creates a new position error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
