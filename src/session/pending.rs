//! Background agent turns.
//!
//! A front end cannot block its event loop on the suggestion service, so the
//! negotiation runs as a spawned task and the loop polls for its outcome once
//! per frame.

use super::game::{GameSession, MoveDisposition};
use crate::negotiator::{MoveNegotiator, NegotiationOutcome, RejectReason, SuggestionRequest};
use tokio::sync::oneshot::{self, error::TryRecvError};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// A negotiation running on the tokio runtime.
///
/// Dropping the handle aborts the task.
#[derive(Debug)]
pub struct PendingSuggestion {
    task: JoinHandle<()>,
    outcome: oneshot::Receiver<NegotiationOutcome>,
}

impl PendingSuggestion {
    /// Spawns `negotiator.suggest(request)`.
    #[instrument(skip_all, fields(fen = %request.fen()))]
    pub fn spawn(negotiator: MoveNegotiator, request: SuggestionRequest) -> Self {
        let (tx, outcome) = oneshot::channel();
        let task = tokio::spawn(async move {
            let result = negotiator.suggest(&request).await;
            if tx.send(result).is_err() {
                debug!("Suggestion finished after its receiver was dropped");
            }
        });
        Self { task, outcome }
    }

    /// Returns the outcome once the task has finished.
    pub fn poll(&mut self) -> Option<NegotiationOutcome> {
        match self.outcome.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(task_lost()),
        }
    }

    /// Stops the task without producing an outcome.
    pub fn cancel(self) {
        self.task.abort();
    }
}

impl Drop for PendingSuggestion {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn task_lost() -> NegotiationOutcome {
    warn!("Suggestion task ended without a reply");
    NegotiationOutcome::Rejected(RejectReason::Transport(
        "suggestion task ended without a reply".to_string(),
    ))
}

/// Drives agent turns for a session from a polling loop.
#[derive(Debug)]
pub struct AgentTurnRunner {
    negotiator: MoveNegotiator,
    pending: Option<PendingSuggestion>,
}

impl AgentTurnRunner {
    /// Creates a runner with no turn in flight.
    pub fn new(negotiator: MoveNegotiator) -> Self {
        Self {
            negotiator,
            pending: None,
        }
    }

    /// True while a suggestion is in flight.
    pub fn is_thinking(&self) -> bool {
        self.pending.is_some()
    }

    /// Advances the agent side by one step.
    ///
    /// Starts a negotiation when the session owes an agent move, or hands a
    /// finished outcome back to the session. Returns the disposition when an
    /// outcome was delivered.
    pub fn tick(&mut self, session: &mut GameSession) -> Option<MoveDisposition> {
        if session.is_terminated() {
            if self.pending.is_some() {
                self.cancel(session);
            }
            return None;
        }

        if let Some(pending) = self.pending.as_mut() {
            let outcome = pending.poll()?;
            self.pending = None;
            return Some(session.complete_agent_turn(outcome));
        }

        if let Some(request) = session.begin_agent_turn() {
            info!(legal = request.legal_moves().len(), "Agent is thinking");
            self.pending = Some(PendingSuggestion::spawn(self.negotiator.clone(), request));
        }
        None
    }

    /// Abandons the turn in flight, if any.
    #[instrument(skip_all)]
    pub fn cancel(&mut self, session: &mut GameSession) {
        if let Some(pending) = self.pending.take() {
            pending.cancel();
            session.cancel_agent_turn();
        }
    }
}
