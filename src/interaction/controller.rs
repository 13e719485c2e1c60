//! Pointer-event state machine for the human side.

use super::projection::{BoardProjection, ScreenPos};
use crate::chess::{ChessMove, Position, PromotionPiece};
use shakmaty::{Piece, Role, Square};
use std::collections::BTreeSet;
use tracing::{debug, instrument};

/// A piece picked up by the human, with its legal moves at pick-up time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    square: Square,
    piece: Piece,
    moves: Vec<ChessMove>,
    legal_destinations: BTreeSet<Square>,
}

impl Selection {
    /// Square the piece was picked up from.
    pub fn square(&self) -> Square {
        self.square
    }

    /// The selected piece.
    pub fn piece(&self) -> Piece {
        self.piece
    }

    /// Squares the piece may move to.
    pub fn legal_destinations(&self) -> &BTreeSet<Square> {
        &self.legal_destinations
    }

    /// Legal moves starting on the selected square.
    pub fn moves(&self) -> &[ChessMove] {
        &self.moves
    }
}

/// Current interaction state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SelectionState {
    /// Nothing picked up.
    #[default]
    Idle,
    /// A piece is selected and waits for a destination click.
    Selected(Selection),
    /// A piece is held under the pointer.
    Dragging {
        /// The held piece.
        selection: Selection,
        /// Last known pointer position.
        pointer: ScreenPos,
    },
}

impl SelectionState {
    /// The active selection, whether held or not.
    pub fn selection(&self) -> Option<&Selection> {
        match self {
            Self::Idle => None,
            Self::Selected(selection) | Self::Dragging { selection, .. } => Some(selection),
        }
    }
}

/// What a pointer event amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionEvent {
    /// Nothing changed.
    NoOp,
    /// The selection was made, dropped or cleared.
    SelectionChanged,
    /// The human committed this move.
    MoveAttempted(ChessMove),
}

/// Turns pointer events into move attempts.
///
/// The controller never mutates the position; it only reads it to decide
/// which pieces may be picked up and where they may go.
#[derive(Debug, Clone)]
pub struct InteractionController {
    projection: BoardProjection,
    promotion: PromotionPiece,
    state: SelectionState,
}

impl InteractionController {
    /// Creates an idle controller.
    #[instrument]
    pub fn new(projection: BoardProjection, promotion: PromotionPiece) -> Self {
        Self {
            projection,
            promotion,
            state: SelectionState::Idle,
        }
    }

    /// Current selection state.
    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    /// Board projection used for hit-testing.
    pub fn projection(&self) -> &BoardProjection {
        &self.projection
    }

    /// Replaces the projection, e.g. after a terminal resize.
    pub fn set_projection(&mut self, projection: BoardProjection) {
        self.projection = projection;
    }

    /// Drops any selection.
    pub fn reset(&mut self) {
        self.state = SelectionState::Idle;
    }

    /// Handles a button press at `pos`.
    #[instrument(skip(self, position), fields(x = pos.x, y = pos.y))]
    pub fn on_pointer_down(&mut self, pos: ScreenPos, position: &Position) -> InteractionEvent {
        let Some(square) = self.projection.square_at(pos) else {
            debug!("Press outside the board");
            return InteractionEvent::NoOp;
        };

        match std::mem::take(&mut self.state) {
            SelectionState::Idle => match select(square, position) {
                Some(selection) => {
                    debug!(%square, destinations = selection.legal_destinations.len(), "Piece picked up");
                    self.state = SelectionState::Dragging {
                        selection,
                        pointer: pos,
                    };
                    InteractionEvent::SelectionChanged
                }
                None => {
                    debug!(%square, "Square holds no piece of the side to move");
                    InteractionEvent::NoOp
                }
            },
            SelectionState::Selected(selection) | SelectionState::Dragging { selection, .. } => {
                self.commit(&selection, square)
            }
        }
    }

    /// Tracks the pointer while a piece is held.
    pub fn on_pointer_move(&mut self, pos: ScreenPos) -> InteractionEvent {
        match &mut self.state {
            SelectionState::Dragging { pointer, .. } => {
                *pointer = pos;
                InteractionEvent::NoOp
            }
            _ => InteractionEvent::NoOp,
        }
    }

    /// Handles a button release at `pos`.
    ///
    /// Releasing a held piece is a second press at the release position.
    /// Letting go over the origin square clears the selection; letting go off
    /// the board changes nothing.
    #[instrument(skip(self, position), fields(x = pos.x, y = pos.y))]
    pub fn on_pointer_up(&mut self, pos: ScreenPos, position: &Position) -> InteractionEvent {
        match self.state {
            SelectionState::Dragging { .. } => self.on_pointer_down(pos, position),
            _ => InteractionEvent::NoOp,
        }
    }

    fn commit(&mut self, selection: &Selection, target: Square) -> InteractionEvent {
        self.state = SelectionState::Idle;
        match resolve_move(selection, target, self.promotion.into()) {
            Some(mv) => {
                debug!(%mv, "Move attempted");
                InteractionEvent::MoveAttempted(mv)
            }
            None => {
                debug!(from = %selection.square, to = %target, "Not a legal destination, selection cleared");
                InteractionEvent::SelectionChanged
            }
        }
    }
}

/// Builds a fresh selection if `square` holds a piece of the side to move.
fn select(square: Square, position: &Position) -> Option<Selection> {
    let piece = position.piece_at(square)?;
    if piece.color != position.turn() {
        return None;
    }
    let legal = position.legal_moves();
    Some(Selection {
        square,
        piece,
        moves: legal.from_square(square),
        legal_destinations: legal.destinations(square),
    })
}

/// Picks the selection's move to `target`, preferring `promotion` when the
/// move promotes.
fn resolve_move(selection: &Selection, target: Square, promotion: Role) -> Option<ChessMove> {
    let plain = ChessMove::new(selection.square, target);
    if selection.moves.contains(&plain) {
        return Some(plain);
    }
    let promoting = ChessMove::with_promotion(selection.square, target, promotion);
    selection.moves.contains(&promoting).then_some(promoting)
}
