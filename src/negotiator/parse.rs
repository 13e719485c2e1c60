//! Strict extraction of a move token from free-form agent text.

use crate::chess::{ChessMove, MoveParseError};
use derive_more::{Display, Error};
use tracing::instrument;

/// A move read from agent text. Parsing says nothing about legality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedMove(pub ChessMove);

/// Why agent text did not yield a move.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum ParseError {
    /// The reply held no token at all.
    #[display("empty reply")]
    Empty,
    /// The first token is not a UCI move.
    #[display("{}", _0)]
    NotAMove(MoveParseError),
}

/// Reads the first whitespace-delimited token, lower-cased, as a UCI move.
///
/// # Errors
///
/// Returns [`ParseError::Empty`] for blank text and
/// [`ParseError::NotAMove`] when the token is not a from/to UCI move.
#[instrument(skip(raw), fields(raw_len = raw.len()))]
pub fn parse_suggestion(raw: &str) -> Result<ParsedMove, ParseError> {
    let token = raw
        .split_whitespace()
        .next()
        .ok_or(ParseError::Empty)?
        .to_lowercase();
    ChessMove::from_uci(&token)
        .map(ParsedMove)
        .map_err(ParseError::NotAMove)
}
