//! Assembles a session from configuration.

use super::game::GameSession;
use crate::chess::Position;
use crate::config::GameConfig;
use crate::interaction::{BoardProjection, InteractionController, ScreenPos};
use crate::record::{RecordHeaders, RecordStore, SessionRecorder, StartPosition};
use shakmaty::Color;
use tracing::{error, info, instrument};

impl GameSession {
    /// Builds a session for `position` with records going to `store`.
    ///
    /// When the configuration asks for it, records of earlier sessions are
    /// deleted before the session starts. A failed cleanup is logged and the
    /// session starts anyway.
    #[instrument(skip_all, fields(fen = %position.fen()))]
    pub fn from_config(
        config: &GameConfig,
        position: Position,
        store: Box<dyn RecordStore>,
    ) -> Self {
        let players = config.players();
        let human_color = Color::from(*players.human_color());
        let (white, black) = match human_color {
            Color::White => (players.human_label(), players.agent_label()),
            Color::Black => (players.agent_label(), players.human_label()),
        };
        let headers = RecordHeaders::today(white.as_str(), black.as_str());

        let start = (position.fen() != Position::new().fen()).then(|| {
            StartPosition::new(position.fen(), position.fullmoves(), position.turn())
        });

        let mut recorder = SessionRecorder::new(headers, start, store);
        if *config.records().reset_on_start() {
            if let Err(e) = recorder.reset_for_new_session() {
                error!(error = %e, "Failed to clear earlier records, continuing");
            }
        } else {
            info!("Keeping records of earlier sessions");
        }

        let board = config.board();
        let projection = BoardProjection::new(
            ScreenPos::new(0, 0),
            *board.square_width(),
            *board.square_height(),
            human_color,
        );
        let controller = InteractionController::new(projection, *board.promotion());

        Self::new(position, human_color, controller, recorder)
    }
}
