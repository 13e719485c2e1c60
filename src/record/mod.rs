//! Match records and their persistence.

mod error;
mod pgn;
mod recorder;
mod store;

pub use error::RecordError;
pub use pgn::{MatchRecord, RecordHeaders, RecordedMove, StartPosition};
pub use recorder::SessionRecorder;
pub use store::{FsRecordStore, RecordStore, RECORD_EXTENSION};
