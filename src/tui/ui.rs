//! Stateless UI rendering for the chess board.

use super::app::App;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use shakmaty::{Piece, Role, Square};
use strictly_chess::{BoardProjection, ScreenPos, SelectionState};

const LIGHT_SQUARE: Color = Color::Rgb(240, 217, 181);
const DARK_SQUARE: Color = Color::Rgb(181, 136, 99);
const SELECTED_SQUARE: Color = Color::Rgb(246, 246, 105);
const LIGHT_TARGET: Color = Color::Rgb(170, 210, 140);
const DARK_TARGET: Color = Color::Rgb(120, 165, 90);

/// Splits the screen into title, board and status areas.
pub fn layout(area: Rect) -> [Rect; 3] {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(area);
    [chunks[0], chunks[1], chunks[2]]
}

/// Draws the main UI.
pub fn draw(f: &mut Frame, app: &App) {
    let [title_area, board_area, status_area] = layout(f.area());

    let title = Paragraph::new("Strictly Chess")
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, title_area);

    draw_board(f, board_area, app);

    let status = Paragraph::new(app.status_line())
        .style(Style::default().fg(Color::Yellow))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Status")
                .title_bottom("Drag a piece to move | Q: Quit"),
        );
    f.render_widget(status, status_area);
}

fn draw_board(f: &mut Frame, area: Rect, app: &App) {
    let session = app.session();
    let projection = session.projection();
    let selection = session.selection();
    let held = match selection {
        SelectionState::Dragging { selection, .. } => Some(selection.square()),
        _ => None,
    };

    for square in Square::ALL {
        let Some(rect) = square_rect(projection, square, area) else {
            continue;
        };
        let index = u32::from(square);
        let light = (index % 8 + index / 8) % 2 == 1;
        let background = match selection.selection() {
            Some(s) if s.square() == square => SELECTED_SQUARE,
            Some(s) if s.legal_destinations().contains(&square) => {
                if light { LIGHT_TARGET } else { DARK_TARGET }
            }
            _ if light => LIGHT_SQUARE,
            _ => DARK_SQUARE,
        };

        let piece = session
            .position()
            .piece_at(square)
            .filter(|_| held != Some(square));
        f.render_widget(square_widget(piece, background, rect.height), rect);
    }

    if let SelectionState::Dragging { selection, pointer } = selection {
        draw_held_piece(f, area, selection.piece(), *pointer);
    }
}

fn square_widget(piece: Option<Piece>, background: Color, height: u16) -> Paragraph<'static> {
    let mut lines = vec![Line::default(); usize::from(height / 2)];
    lines.push(match piece {
        Some(piece) => Line::from(Span::styled(
            glyph(piece).to_string(),
            piece_style(piece).bg(background),
        )),
        None => Line::default(),
    });
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .style(Style::default().bg(background))
}

fn draw_held_piece(f: &mut Frame, area: Rect, piece: Piece, pointer: ScreenPos) {
    let (Ok(x), Ok(y)) = (u16::try_from(pointer.x), u16::try_from(pointer.y)) else {
        return;
    };
    let cell = Rect::new(x, y, 1, 1);
    if area.intersection(cell) != cell {
        return;
    }
    let span = Span::styled(glyph(piece).to_string(), piece_style(piece));
    f.render_widget(Paragraph::new(Line::from(span)), cell);
}

/// Screen rectangle of `square`, clipped away when it leaves `area`.
fn square_rect(projection: &BoardProjection, square: Square, area: Rect) -> Option<Rect> {
    let origin = projection.square_origin(square);
    let rect = Rect::new(
        u16::try_from(origin.x).ok()?,
        u16::try_from(origin.y).ok()?,
        u16::try_from(projection.square_width()).ok()?,
        u16::try_from(projection.square_height()).ok()?,
    );
    (area.intersection(rect) == rect).then_some(rect)
}

fn piece_style(piece: Piece) -> Style {
    let fg = match piece.color {
        shakmaty::Color::White => Color::White,
        shakmaty::Color::Black => Color::Black,
    };
    Style::default().fg(fg).add_modifier(Modifier::BOLD)
}

/// Filled glyphs for both colours; colour comes from the style.
fn glyph(piece: Piece) -> char {
    match piece.role {
        Role::King => '♚',
        Role::Queen => '♛',
        Role::Rook => '♜',
        Role::Bishop => '♝',
        Role::Knight => '♞',
        Role::Pawn => '♟',
    }
}
