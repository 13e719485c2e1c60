//! Pointer interaction for the human side.

mod controller;
mod projection;

pub use controller::{InteractionController, InteractionEvent, Selection, SelectionState};
pub use projection::{BoardProjection, ScreenPos, MAX_SQUARE_SIZE};
