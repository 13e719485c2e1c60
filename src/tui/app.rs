//! Application state and input handling.

use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use shakmaty::Color;
use strictly_chess::{
    AgentTurnRunner, GameSession, InteractionEvent, MoveDisposition, ScreenPos, SessionOutcome,
    SessionState, Side,
};
use tracing::{debug, info};

/// Main application state.
pub struct App {
    session: GameSession,
    runner: AgentTurnRunner,
    agent_label: String,
    human_label: String,
    notice: Option<String>,
    should_quit: bool,
}

impl App {
    /// Creates the application around a started session.
    pub fn new(
        session: GameSession,
        runner: AgentTurnRunner,
        human_label: String,
        agent_label: String,
    ) -> Self {
        Self {
            session,
            runner,
            agent_label,
            human_label,
            notice: None,
            should_quit: false,
        }
    }

    /// Gets the session.
    pub fn session(&self) -> &GameSession {
        &self.session
    }

    /// True once the user asked to leave.
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Centres the board in `area` and updates hit-testing to match.
    pub fn fit_board(&mut self, area: Rect) {
        let projection = *self.session.projection();
        let (width, height) = projection.extent();
        let x = i32::from(area.x) + (i32::from(area.width) - width as i32).max(0) / 2;
        let y = i32::from(area.y) + (i32::from(area.height) - height as i32).max(0) / 2;
        let origin = ScreenPos::new(x, y);
        if origin != projection.origin() {
            debug!(x, y, "Board moved");
            self.session.set_projection(projection.with_origin(origin));
        }
    }

    /// Lets the agent side make progress.
    pub fn tick(&mut self) {
        match self.runner.tick(&mut self.session) {
            Some(MoveDisposition::Applied) => {
                if let Some(last) = self.session.record().moves().last() {
                    self.notice = Some(format!("{} played {}", self.agent_label, last.san()));
                }
            }
            Some(MoveDisposition::SessionAborted) => {
                self.notice = Some(format!("{} returned an invalid move", self.agent_label));
            }
            Some(MoveDisposition::Ignored) | None => {}
        }
    }

    /// Handles a key press.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
            info!("User quit");
            self.runner.cancel(&mut self.session);
            self.should_quit = true;
        }
    }

    /// Routes left-button gestures to the session.
    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        let pos = ScreenPos::new(i32::from(mouse.column), i32::from(mouse.row));
        let plies = self.session.record().len();
        let event = match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => self.session.pointer_down(pos),
            MouseEventKind::Drag(MouseButton::Left) => self.session.pointer_move(pos),
            MouseEventKind::Up(MouseButton::Left) => self.session.pointer_up(pos),
            _ => return,
        };
        if let InteractionEvent::MoveAttempted(mv) = event {
            self.notice = if self.session.record().len() > plies {
                None
            } else {
                Some(format!("{} is not legal here", mv))
            };
        }
    }

    /// Text for the status line.
    pub fn status_line(&self) -> String {
        let status = match self.session.state() {
            SessionState::Terminated(outcome) => self.outcome_text(outcome),
            SessionState::AwaitingAgentMove if self.runner.is_thinking() => {
                format!("{} is thinking...", self.agent_label)
            }
            SessionState::AwaitingAgentMove => format!("{} to move", self.agent_label),
            SessionState::AwaitingHumanMove => {
                let check = if self.session.position().is_check() { " (check)" } else { "" };
                format!("Your move as {}{}", color_name(self.session.human_color()), check)
            }
        };
        match &self.notice {
            Some(notice) => format!("{} | {}", notice, status),
            None => status,
        }
    }

    fn outcome_text(&self, outcome: &SessionOutcome) -> String {
        let verdict = match outcome.winner(self.session.human_color()) {
            Some(Side::Human) => format!("{} wins", self.human_label),
            Some(Side::Agent) => format!("{} wins", self.agent_label),
            None => outcome.to_string(),
        };
        format!("Game over: {} ({}). Press q to quit.", verdict, outcome.result_tag())
    }
}

fn color_name(color: Color) -> &'static str {
    match color {
        Color::White => "white",
        Color::Black => "black",
    }
}
