//! Negotiation of the agent's move with an external suggestion service.

mod negotiate;
mod parse;

pub use negotiate::{
    MoveNegotiator, NegotiationOutcome, RejectReason, SuggestionPrompt, SuggestionRequest,
    SuggestionService,
};
pub use parse::{parse_suggestion, ParseError, ParsedMove};
