//! Terminal UI for Strictly Chess

mod app;
mod ui;

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};
use std::io;
use std::time::Duration;
use strictly_chess::{AgentTurnRunner, GameSession};
use tracing::{error, info, instrument};

use app::App;

/// File the TUI logs to, so logging does not draw over the board.
pub const LOG_FILE: &str = "strictly_chess.log";

const FRAME: Duration = Duration::from_millis(16);

/// Routes tracing output to [`LOG_FILE`].
pub fn init_file_logging() -> Result<()> {
    let log_file = std::fs::File::create(LOG_FILE)?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,strictly_chess=debug")),
        )
        .with_writer(std::sync::Arc::new(log_file))
        .with_ansi(false)
        .try_init();
    Ok(())
}

/// Runs a session in the terminal until the user quits.
pub async fn run_tui(
    session: GameSession,
    runner: AgentTurnRunner,
    human_label: String,
    agent_label: String,
) -> Result<()> {
    info!("Starting Strictly Chess TUI");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(session, runner, human_label, agent_label);
    let res = run_app(&mut terminal, &mut app).await;

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = &res {
        error!(error = ?err, "Game loop error");
    }
    info!(plies = app.session().record().len(), "TUI closed");
    res
}

#[instrument(skip_all)]
async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        app.tick();

        let size = terminal.size()?;
        let [_, board_area, _] = ui::layout(Rect::new(0, 0, size.width, size.height));
        app.fit_board(board_area);

        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(FRAME)? {
            match event::read()? {
                Event::Key(key) => app.handle_key(key),
                Event::Mouse(mouse) => app.handle_mouse(mouse),
                _ => {}
            }
        }

        if app.should_quit() {
            return Ok(());
        }

        // Let the suggestion task run between frames.
        tokio::task::yield_now().await;
    }
}
