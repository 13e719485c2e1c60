//! Append-only match log with persistence after each move.

use super::pgn::{MatchRecord, RecordHeaders, RecordedMove, StartPosition};
use super::store::{RecordStore, RECORD_EXTENSION};
use super::RecordError;
use std::path::PathBuf;
use tracing::{debug, info, instrument, warn};

/// Owns the [`MatchRecord`] of one session and writes it out.
pub struct SessionRecorder {
    record: MatchRecord,
    store: Box<dyn RecordStore>,
    persisted: usize,
}

impl std::fmt::Debug for SessionRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRecorder")
            .field("moves", &self.record.len())
            .field("persisted", &self.persisted)
            .finish_non_exhaustive()
    }
}

impl SessionRecorder {
    /// Creates a recorder with an empty record.
    #[instrument(skip(store), fields(white = %headers.white(), black = %headers.black()))]
    pub fn new(
        headers: RecordHeaders,
        start: Option<StartPosition>,
        store: Box<dyn RecordStore>,
    ) -> Self {
        debug!("Creating session recorder");
        Self {
            record: MatchRecord::new(headers, start),
            store,
            persisted: 0,
        }
    }

    /// The record so far.
    pub fn record(&self) -> &MatchRecord {
        &self.record
    }

    /// Number of recorded plies.
    pub fn len(&self) -> usize {
        self.record.len()
    }

    /// True before the first move.
    pub fn is_empty(&self) -> bool {
        self.record.is_empty()
    }

    /// Successful `persist` calls so far.
    pub fn persisted(&self) -> usize {
        self.persisted
    }

    /// Appends one applied move.
    #[instrument(skip(self), fields(mv = %mv.mv(), san = %mv.san()))]
    pub fn append(&mut self, mv: RecordedMove) {
        self.record.push(mv);
        debug!(len = self.record.len(), "Move recorded");
    }

    /// Sets the result header. Moves are untouched.
    pub fn set_result(&mut self, result: &str) {
        self.record.set_result(result);
    }

    /// Writes the full record under a fresh timestamped name.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError`] if the store fails; the in-memory record is
    /// unaffected and a later call still writes the complete history.
    #[instrument(skip(self), fields(len = self.record.len()))]
    pub fn persist(&mut self) -> Result<PathBuf, RecordError> {
        let name = format!(
            "game_{}.{}",
            chrono::Local::now().format("%Y%m%d_%H%M%S_%3f"),
            RECORD_EXTENSION
        );
        let path = self.store.write(&name, &self.record.to_pgn())?;
        self.persisted += 1;
        info!(path = %path.display(), "Game saved");
        Ok(path)
    }

    /// Deletes every record left by earlier sessions.
    ///
    /// This destroys history on purpose and is only valid before the first
    /// move of this session.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError`] if moves were already recorded or the store
    /// cannot be listed.
    #[instrument(skip(self))]
    pub fn reset_for_new_session(&mut self) -> Result<usize, RecordError> {
        if !self.record.is_empty() {
            warn!(len = self.record.len(), "Refusing to reset after play started");
            return Err(RecordError::new(
                "Records can only be reset before the first move",
            ));
        }
        let removed = self.store.clear()?;
        info!(removed, "Cleared records of previous sessions");
        Ok(removed)
    }
}
