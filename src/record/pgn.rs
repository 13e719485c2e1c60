//! Match record and its PGN rendering.

use crate::chess::ChessMove;
use derive_getters::Getters;
use derive_new::new;
use shakmaty::Color;
use std::fmt::Write as _;

/// Movetext is wrapped before this column.
const LINE_WIDTH: usize = 80;

/// Seven-tag roster header values.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct RecordHeaders {
    event: String,
    site: String,
    date: String,
    round: String,
    white: String,
    black: String,
    result: String,
}

impl RecordHeaders {
    /// Headers for a new game between `white` and `black` dated `date`
    /// (`YYYY.MM.DD`). Unknown tags use `?` and the result starts as `*`.
    pub fn new(date: impl Into<String>, white: impl Into<String>, black: impl Into<String>) -> Self {
        Self {
            event: "?".to_string(),
            site: "?".to_string(),
            date: date.into(),
            round: "?".to_string(),
            white: white.into(),
            black: black.into(),
            result: "*".to_string(),
        }
    }

    /// Headers dated today in local time.
    pub fn today(white: impl Into<String>, black: impl Into<String>) -> Self {
        Self::new(chrono::Local::now().format("%Y.%m.%d").to_string(), white, black)
    }
}

/// Where the game started when it is not the standard position.
#[derive(Debug, Clone, PartialEq, Eq, Getters, new)]
pub struct StartPosition {
    fen: String,
    fullmoves: u32,
    turn: Color,
}

/// One applied move with its algebraic notation.
#[derive(Debug, Clone, PartialEq, Eq, Getters, new)]
pub struct RecordedMove {
    mv: ChessMove,
    san: String,
}

/// Ordered, append-only log of a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    headers: RecordHeaders,
    start: Option<StartPosition>,
    moves: Vec<RecordedMove>,
}

impl MatchRecord {
    /// Creates an empty record.
    pub fn new(headers: RecordHeaders, start: Option<StartPosition>) -> Self {
        Self {
            headers,
            start,
            moves: Vec::new(),
        }
    }

    /// Header values.
    pub fn headers(&self) -> &RecordHeaders {
        &self.headers
    }

    /// Custom start position, if any.
    pub fn start(&self) -> Option<&StartPosition> {
        self.start.as_ref()
    }

    /// Moves in play order.
    pub fn moves(&self) -> &[RecordedMove] {
        &self.moves
    }

    /// Number of recorded plies.
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    /// True before the first move.
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub(super) fn push(&mut self, mv: RecordedMove) {
        self.moves.push(mv);
    }

    pub(super) fn set_result(&mut self, result: &str) {
        self.headers.result = result.to_string();
    }

    /// Renders the record as PGN text.
    pub fn to_pgn(&self) -> String {
        let mut out = String::new();
        let h = &self.headers;
        for (tag, value) in [
            ("Event", &h.event),
            ("Site", &h.site),
            ("Date", &h.date),
            ("Round", &h.round),
            ("White", &h.white),
            ("Black", &h.black),
            ("Result", &h.result),
        ] {
            push_tag(&mut out, tag, value);
        }
        if let Some(start) = &self.start {
            push_tag(&mut out, "SetUp", "1");
            push_tag(&mut out, "FEN", &start.fen);
        }
        out.push('\n');
        out.push_str(&wrap(&self.movetext_tokens(), LINE_WIDTH));
        out.push('\n');
        out
    }

    fn movetext_tokens(&self) -> Vec<String> {
        let (mut number, mut turn) = self
            .start
            .as_ref()
            .map(|s| (s.fullmoves, s.turn))
            .unwrap_or((1, Color::White));

        let mut tokens = Vec::with_capacity(self.moves.len() * 2 + 1);
        for (index, recorded) in self.moves.iter().enumerate() {
            match turn {
                Color::White => tokens.push(format!("{}.", number)),
                Color::Black if index == 0 => tokens.push(format!("{}...", number)),
                Color::Black => {}
            }
            tokens.push(recorded.san.clone());
            if turn == Color::Black {
                number += 1;
            }
            turn = !turn;
        }
        tokens.push(self.headers.result.clone());
        tokens
    }
}

fn push_tag(out: &mut String, tag: &str, value: &str) {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    let _ = writeln!(out, "[{} \"{}\"]", tag, escaped);
}

/// Joins tokens with spaces, breaking lines so none reaches `width`.
fn wrap(tokens: &[String], width: usize) -> String {
    let mut out = String::new();
    let mut line_len = 0;
    for token in tokens {
        if line_len > 0 && line_len + 1 + token.len() >= width {
            out.push('\n');
            line_len = 0;
        }
        if line_len > 0 {
            out.push(' ');
            line_len += 1;
        }
        out.push_str(token);
        line_len += token.len();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use shakmaty::Square;

    fn recorded(from: Square, to: Square, san: &str) -> RecordedMove {
        RecordedMove::new(ChessMove::new(from, to), san.to_string())
    }

    #[test]
    fn renders_seven_tag_roster_and_movetext() {
        let mut record = MatchRecord::new(RecordHeaders::new("2026.10.16", "Player", "AI"), None);
        record.push(recorded(Square::E2, Square::E4, "e4"));
        record.push(recorded(Square::E7, Square::E5, "e5"));
        record.push(recorded(Square::G1, Square::F3, "Nf3"));

        let pgn = record.to_pgn();
        assert!(pgn.starts_with("[Event \"?\"]\n[Site \"?\"]\n[Date \"2026.10.16\"]\n"));
        assert!(pgn.contains("[White \"Player\"]\n[Black \"AI\"]\n[Result \"*\"]\n\n"));
        assert!(pgn.ends_with("1. e4 e5 2. Nf3 *\n"));
    }

    #[test]
    fn black_to_move_start_uses_ellipsis() {
        let start = StartPosition::new("fen".to_string(), 12, Color::Black);
        let mut record = MatchRecord::new(RecordHeaders::new("2026.10.16", "AI", "Player"), Some(start));
        record.push(recorded(Square::G8, Square::F6, "Nf6"));
        record.push(recorded(Square::B1, Square::C3, "Nc3"));
        record.set_result("1/2-1/2");

        let pgn = record.to_pgn();
        assert!(pgn.contains("[SetUp \"1\"]\n[FEN \"fen\"]\n"));
        assert!(pgn.ends_with("12... Nf6 13. Nc3 1/2-1/2\n"));
    }

    #[test]
    fn long_movetext_wraps_below_line_width() {
        let tokens: Vec<String> = (0..60).map(|i| format!("tok{}", i)).collect();
        let wrapped = wrap(&tokens, LINE_WIDTH);
        assert!(wrapped.lines().count() > 1);
        assert!(wrapped.lines().all(|line| line.len() < LINE_WIDTH));
    }

    #[test]
    fn header_values_are_escaped() {
        let record = MatchRecord::new(RecordHeaders::new("2026.10.16", "A \"quoted\" name", "AI"), None);
        assert!(record.to_pgn().contains("[White \"A \\\"quoted\\\" name\"]"));
    }
}
