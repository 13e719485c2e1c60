//! Session state machine.
//!
//! [`GameSession`] is the single owner of the [`Position`]. Human moves arrive
//! through the [`InteractionController`], agent moves through a
//! [`SuggestionRequest`]/[`NegotiationOutcome`] round trip, and both go
//! through the same validated apply path, which records and persists every
//! move and checks for the end of the game.

use crate::chess::{ChessMove, GameStatus, LegalMoves, Position, Side};
use crate::interaction::{
    BoardProjection, InteractionController, InteractionEvent, ScreenPos, SelectionState,
};
use crate::negotiator::{
    MoveNegotiator, NegotiationOutcome, RejectReason, SuggestionRequest,
};
use crate::record::{MatchRecord, RecordedMove, SessionRecorder};
use derive_more::Display;
use shakmaty::Color;
use tracing::{debug, error, info, instrument, warn};

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum SessionOutcome {
    /// The game reached a terminal position.
    #[display("{}", _0)]
    Finished(GameStatus),
    /// The agent's turn failed and play stopped without a result.
    #[display("aborted: {}", _0)]
    Aborted(RejectReason),
}

/// Coarse classification of a [`SessionOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum OutcomeKind {
    /// One side was mated.
    Checkmate,
    /// The side to move had no move and was not in check.
    Stalemate,
    /// Drawn by rule.
    Draw,
    /// Ended without a game result.
    Aborted,
}

impl SessionOutcome {
    /// Classifies the outcome.
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Self::Finished(GameStatus::Checkmate { .. }) => OutcomeKind::Checkmate,
            Self::Finished(GameStatus::Stalemate) => OutcomeKind::Stalemate,
            Self::Finished(GameStatus::Draw(_)) => OutcomeKind::Draw,
            // An ongoing status is never stored as finished.
            Self::Finished(GameStatus::Ongoing) | Self::Aborted(_) => OutcomeKind::Aborted,
        }
    }

    /// PGN result token; aborted games stay `*`.
    pub fn result_tag(&self) -> &'static str {
        match self {
            Self::Finished(status) => status.result_tag(),
            Self::Aborted(_) => "*",
        }
    }

    /// Winning side, if the game was decided.
    pub fn winner(&self, human_color: Color) -> Option<Side> {
        match self {
            Self::Finished(GameStatus::Checkmate { winner }) if *winner == human_color => {
                Some(Side::Human)
            }
            Self::Finished(GameStatus::Checkmate { .. }) => Some(Side::Agent),
            _ => None,
        }
    }
}

/// Session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Pointer input may commit a move.
    AwaitingHumanMove,
    /// The agent owes a move.
    AwaitingAgentMove,
    /// The session is over; absorbing.
    Terminated(SessionOutcome),
}

/// What happened to a submitted move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDisposition {
    /// The move was applied and recorded.
    Applied,
    /// The move was dropped; nothing changed.
    Ignored,
    /// The agent's turn failed and the session terminated.
    SessionAborted,
}

/// One game between the human and the agent.
#[derive(Debug)]
pub struct GameSession {
    position: Position,
    controller: InteractionController,
    recorder: SessionRecorder,
    human_color: Color,
    state: SessionState,
    suggestion_pending: bool,
}

impl GameSession {
    /// Starts a session from `position`.
    ///
    /// The first state follows the side to move. A position that is already
    /// over terminates the session at once, without asking the agent.
    #[instrument(skip_all, fields(fen = %position.fen(), human = ?human_color))]
    pub fn new(
        position: Position,
        human_color: Color,
        controller: InteractionController,
        recorder: SessionRecorder,
    ) -> Self {
        let mut session = Self {
            position,
            controller,
            recorder,
            human_color,
            state: SessionState::AwaitingHumanMove,
            suggestion_pending: false,
        };
        session.advance();
        info!(state = ?session.state, "Session started");
        session
    }

    /// Current state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Read-only view of the authoritative position.
    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Legal moves of the side to move.
    pub fn legal_moves(&self) -> LegalMoves {
        self.position.legal_moves()
    }

    /// Colour the human plays.
    pub fn human_color(&self) -> Color {
        self.human_color
    }

    /// Participant whose turn it is on the board.
    pub fn side_to_move(&self) -> Side {
        if self.position.turn() == self.human_color {
            Side::Human
        } else {
            Side::Agent
        }
    }

    /// Interaction state for drawing.
    pub fn selection(&self) -> &SelectionState {
        self.controller.state()
    }

    /// Board projection used for hit-testing.
    pub fn projection(&self) -> &BoardProjection {
        self.controller.projection()
    }

    /// Replaces the board projection.
    pub fn set_projection(&mut self, projection: BoardProjection) {
        self.controller.set_projection(projection);
    }

    /// The match record so far.
    pub fn record(&self) -> &MatchRecord {
        self.recorder.record()
    }

    /// The recorder, for persistence statistics.
    pub fn recorder(&self) -> &SessionRecorder {
        &self.recorder
    }

    /// Outcome once terminated.
    pub fn outcome(&self) -> Option<&SessionOutcome> {
        match &self.state {
            SessionState::Terminated(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// True once the session is over.
    pub fn is_terminated(&self) -> bool {
        matches!(self.state, SessionState::Terminated(_))
    }

    /// True while a suggestion request is outstanding.
    pub fn has_pending_suggestion(&self) -> bool {
        self.suggestion_pending
    }

    /// Routes a button press to the controller.
    pub fn pointer_down(&mut self, pos: ScreenPos) -> InteractionEvent {
        if self.state != SessionState::AwaitingHumanMove {
            return InteractionEvent::NoOp;
        }
        let event = self.controller.on_pointer_down(pos, &self.position);
        self.dispatch(event)
    }

    /// Routes pointer motion to the controller.
    pub fn pointer_move(&mut self, pos: ScreenPos) -> InteractionEvent {
        self.controller.on_pointer_move(pos)
    }

    /// Routes a button release to the controller.
    pub fn pointer_up(&mut self, pos: ScreenPos) -> InteractionEvent {
        if self.state != SessionState::AwaitingHumanMove {
            return InteractionEvent::NoOp;
        }
        let event = self.controller.on_pointer_up(pos, &self.position);
        self.dispatch(event)
    }

    fn dispatch(&mut self, event: InteractionEvent) -> InteractionEvent {
        if let InteractionEvent::MoveAttempted(mv) = event {
            self.attempt_move(mv);
        }
        event
    }

    /// Submits a move for the human side.
    ///
    /// Moves outside the human's turn or outside the legal set are ignored
    /// and leave position and record unchanged.
    #[instrument(skip(self), fields(mv = %mv))]
    pub fn attempt_move(&mut self, mv: ChessMove) -> MoveDisposition {
        if self.state != SessionState::AwaitingHumanMove {
            warn!(state = ?self.state, "Human move outside the human's turn");
            return MoveDisposition::Ignored;
        }
        if !self.position.is_legal(&mv) {
            debug!("Illegal human move ignored");
            self.controller.reset();
            return MoveDisposition::Ignored;
        }
        self.apply(mv)
    }

    /// Claims the single suggestion slot and describes the position the agent
    /// must move in.
    ///
    /// Returns `None` when it is not the agent's turn or a request is already
    /// outstanding.
    #[instrument(skip(self))]
    pub fn begin_agent_turn(&mut self) -> Option<SuggestionRequest> {
        if self.state != SessionState::AwaitingAgentMove {
            return None;
        }
        if self.suggestion_pending {
            debug!("Suggestion already pending");
            return None;
        }
        self.suggestion_pending = true;
        let request = SuggestionRequest::new(
            self.position.fen(),
            self.position.legal_moves(),
            self.position.turn(),
        );
        debug!(fen = %request.fen(), "Agent turn started");
        Some(request)
    }

    /// Applies the result of the outstanding suggestion.
    ///
    /// An accepted move is re-checked against the current position; a
    /// rejection ends the session as aborted.
    #[instrument(skip(self))]
    pub fn complete_agent_turn(&mut self, outcome: NegotiationOutcome) -> MoveDisposition {
        if !self.suggestion_pending {
            warn!("Completion without an outstanding suggestion");
            return MoveDisposition::Ignored;
        }
        self.suggestion_pending = false;
        if self.state != SessionState::AwaitingAgentMove {
            warn!(state = ?self.state, "Completion arrived outside the agent's turn");
            return MoveDisposition::Ignored;
        }

        match outcome {
            NegotiationOutcome::Accepted(mv) if self.position.is_legal(&mv) => self.apply(mv),
            NegotiationOutcome::Accepted(mv) => {
                error!(%mv, "Accepted move is not legal in the current position");
                self.terminate(SessionOutcome::Aborted(RejectReason::Illegal(mv)));
                MoveDisposition::SessionAborted
            }
            NegotiationOutcome::Rejected(reason) => {
                error!(%reason, "Agent returned an invalid move. Ending game.");
                self.terminate(SessionOutcome::Aborted(reason));
                MoveDisposition::SessionAborted
            }
        }
    }

    /// Releases the suggestion slot without applying anything.
    pub fn cancel_agent_turn(&mut self) {
        if self.suggestion_pending {
            info!("Pending suggestion cancelled");
            self.suggestion_pending = false;
        }
    }

    /// Runs one complete agent turn in place.
    #[instrument(skip_all)]
    pub async fn play_agent_turn(&mut self, negotiator: &MoveNegotiator) -> MoveDisposition {
        let Some(request) = self.begin_agent_turn() else {
            return MoveDisposition::Ignored;
        };
        let outcome = negotiator.suggest(&request).await;
        self.complete_agent_turn(outcome)
    }

    /// The only path that mutates the position.
    fn apply(&mut self, mv: ChessMove) -> MoveDisposition {
        let side = self.side_to_move();
        let san = self.position.san(&mv).unwrap_or_else(|e| {
            warn!(error = %e, "No SAN for move, recording UCI");
            mv.to_string()
        });
        if let Err(e) = self.position.apply(&mv) {
            error!(error = %e, "Validated move failed to apply");
            return MoveDisposition::Ignored;
        }
        self.controller.reset();
        self.recorder.append(RecordedMove::new(mv, san));
        info!(%mv, side = %side, ply = self.recorder.len(), "Move applied");
        self.persist();
        self.advance();
        MoveDisposition::Applied
    }

    /// Moves to the state implied by the position.
    fn advance(&mut self) {
        let status = self.position.status();
        if status.is_terminal() {
            self.terminate(SessionOutcome::Finished(status));
            return;
        }
        self.state = match self.side_to_move() {
            Side::Human => SessionState::AwaitingHumanMove,
            Side::Agent => SessionState::AwaitingAgentMove,
        };
    }

    fn terminate(&mut self, outcome: SessionOutcome) {
        if self.is_terminated() {
            return;
        }
        info!(%outcome, result = outcome.result_tag(), "Game over");
        self.recorder.set_result(outcome.result_tag());
        self.state = SessionState::Terminated(outcome);
        self.suggestion_pending = false;
        self.controller.reset();
        self.persist();
    }

    fn persist(&mut self) {
        if let Err(e) = self.recorder.persist() {
            error!(error = %e, "Failed to save game");
        }
    }
}
