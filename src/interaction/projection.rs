//! Fixed mapping between screen coordinates and board squares.

use serde::{Deserialize, Serialize};
use shakmaty::{Color, Square};

/// Largest square edge a projection accepts, in screen units.
pub const MAX_SQUARE_SIZE: u32 = 64;

/// A point in screen space (terminal cells for the TUI).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ScreenPos {
    /// Column, growing to the right.
    pub x: i32,
    /// Row, growing downward.
    pub y: i32,
}

impl ScreenPos {
    /// Creates a screen position.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Projection of the 8x8 board onto screen space.
///
/// Square `(0, 0)` of the grid is the top-left square as seen by the player
/// whose colour sits at the bottom (`orientation`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardProjection {
    origin: ScreenPos,
    square_width: u32,
    square_height: u32,
    orientation: Color,
}

impl BoardProjection {
    /// Creates a projection. Square edges are clamped to
    /// `1..=MAX_SQUARE_SIZE`.
    pub fn new(origin: ScreenPos, square_width: u32, square_height: u32, orientation: Color) -> Self {
        Self {
            origin,
            square_width: square_width.clamp(1, MAX_SQUARE_SIZE),
            square_height: square_height.clamp(1, MAX_SQUARE_SIZE),
            orientation,
        }
    }

    /// Top-left corner of the board.
    pub fn origin(&self) -> ScreenPos {
        self.origin
    }

    /// Width of one square.
    pub fn square_width(&self) -> u32 {
        self.square_width
    }

    /// Height of one square.
    pub fn square_height(&self) -> u32 {
        self.square_height
    }

    /// Colour drawn at the bottom of the board.
    pub fn orientation(&self) -> Color {
        self.orientation
    }

    /// Moves the board without changing its geometry.
    pub fn with_origin(self, origin: ScreenPos) -> Self {
        Self { origin, ..self }
    }

    /// Total board size as `(width, height)`.
    pub fn extent(&self) -> (u32, u32) {
        (self.square_width * 8, self.square_height * 8)
    }

    /// Square under `pos`, or `None` outside the board.
    pub fn square_at(&self, pos: ScreenPos) -> Option<Square> {
        let dx = pos.x.saturating_sub(self.origin.x);
        let dy = pos.y.saturating_sub(self.origin.y);
        if dx < 0 || dy < 0 {
            return None;
        }
        let col = dx as u32 / self.square_width;
        let row = dy as u32 / self.square_height;
        if col > 7 || row > 7 {
            return None;
        }
        let (file, rank) = match self.orientation {
            Color::White => (col, 7 - row),
            Color::Black => (7 - col, row),
        };
        Some(Square::new(rank * 8 + file))
    }

    /// Top-left screen corner of `square`.
    pub fn square_origin(&self, square: Square) -> ScreenPos {
        let index = u32::from(square);
        let (file, rank) = (index % 8, index / 8);
        let (col, row) = match self.orientation {
            Color::White => (file, 7 - rank),
            Color::Black => (7 - file, rank),
        };
        ScreenPos::new(
            self.origin.x.saturating_add((col * self.square_width) as i32),
            self.origin.y.saturating_add((row * self.square_height) as i32),
        )
    }
}
