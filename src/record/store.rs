//! Durable storage for rendered match records.

use super::RecordError;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, instrument};

/// File extension of persisted records.
pub const RECORD_EXTENSION: &str = "pgn";

/// Destination for rendered records.
pub trait RecordStore: Send {
    /// Writes `contents` as the artifact `name`, returning where it landed.
    fn write(&mut self, name: &str, contents: &str) -> Result<PathBuf, RecordError>;

    /// Removes every record artifact, returning how many were removed.
    fn clear(&mut self) -> Result<usize, RecordError>;
}

/// Stores records as `.pgn` files in one directory.
#[derive(Debug, Clone)]
pub struct FsRecordStore {
    dir: PathBuf,
}

impl FsRecordStore {
    /// Creates a store rooted at `dir`. The directory is created on first write.
    #[instrument(skip(dir), fields(dir = %dir.as_ref().display()))]
    pub fn new(dir: impl AsRef<Path>) -> Self {
        debug!("Creating record store");
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Directory holding the records.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl RecordStore for FsRecordStore {
    #[instrument(skip(self, contents), fields(dir = %self.dir.display()))]
    fn write(&mut self, name: &str, contents: &str) -> Result<PathBuf, RecordError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            RecordError::new(format!("Failed to create '{}': {}", self.dir.display(), e))
        })?;
        let path = self.dir.join(name);
        std::fs::write(&path, contents)
            .map_err(|e| RecordError::new(format!("Failed to write '{}': {}", path.display(), e)))?;
        debug!(path = %path.display(), bytes = contents.len(), "Record written");
        Ok(path)
    }

    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    fn clear(&mut self) -> Result<usize, RecordError> {
        if !self.dir.exists() {
            debug!("No record directory, nothing to clear");
            return Ok(0);
        }

        let mut removed = 0;
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_record = path.is_file()
                && path.extension().and_then(|ext| ext.to_str()) == Some(RECORD_EXTENSION);
            if !is_record {
                continue;
            }
            match std::fs::remove_file(&path) {
                Ok(()) => {
                    info!(path = %path.display(), "Removed previous game file");
                    removed += 1;
                }
                Err(e) => error!(path = %path.display(), error = %e, "Error removing game file"),
            }
        }
        Ok(removed)
    }
}
