//! Shared fakes for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use strictly_chess::{
    BoardProjection, LlmError, LlmErrorKind, RecordError, RecordStore, ScreenPos,
    SuggestionPrompt, SuggestionService,
};

/// How the fake service answers.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Answer immediately with this text.
    Text(String),
    /// Answer with this text after a delay.
    Delayed(Duration, String),
    /// Fail with a transport error.
    Fail,
}

/// Suggestion service with a canned reply.
#[derive(Debug, Clone)]
pub struct FakeService {
    reply: Reply,
    calls: Arc<AtomicUsize>,
    answered: Arc<AtomicUsize>,
    prompts: Arc<Mutex<Vec<SuggestionPrompt>>>,
}

impl FakeService {
    pub fn new(reply: Reply) -> Self {
        Self {
            reply,
            calls: Arc::new(AtomicUsize::new(0)),
            answered: Arc::new(AtomicUsize::new(0)),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn text(text: &str) -> Self {
        Self::new(Reply::Text(text.to_string()))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests that ran to the end and produced a reply or an error.
    pub fn answered(&self) -> usize {
        self.answered.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<SuggestionPrompt> {
        self.prompts.lock().expect("prompt lock").last().cloned()
    }
}

#[async_trait::async_trait]
impl SuggestionService for FakeService {
    async fn request_suggestion(&self, prompt: &SuggestionPrompt) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().expect("prompt lock").push(prompt.clone());
        let reply = match &self.reply {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Delayed(delay, text) => {
                tokio::time::sleep(*delay).await;
                Ok(text.clone())
            }
            Reply::Fail => Err(LlmError::new(
                LlmErrorKind::Transport,
                "connection refused".to_string(),
            )),
        };
        self.answered.fetch_add(1, Ordering::SeqCst);
        reply
    }
}

/// Everything a [`MemoryStore`] was asked to do.
#[derive(Debug, Default)]
pub struct StoreLog {
    pub writes: Vec<(String, String)>,
    pub clears: usize,
}

/// In-memory record store whose log outlives the session that owns it.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    log: Arc<Mutex<StoreLog>>,
    fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub fn writes(&self) -> Vec<(String, String)> {
        self.log.lock().expect("store lock").writes.clone()
    }

    pub fn write_count(&self) -> usize {
        self.log.lock().expect("store lock").writes.len()
    }

    pub fn clears(&self) -> usize {
        self.log.lock().expect("store lock").clears
    }

    pub fn last_contents(&self) -> Option<String> {
        self.writes().last().map(|(_, contents)| contents.clone())
    }
}

impl RecordStore for MemoryStore {
    fn write(&mut self, name: &str, contents: &str) -> Result<std::path::PathBuf, RecordError> {
        if self.fail_writes {
            return Err(RecordError::new("disk full"));
        }
        self.log
            .lock()
            .expect("store lock")
            .writes
            .push((name.to_string(), contents.to_string()));
        Ok(std::path::PathBuf::from(name))
    }

    fn clear(&mut self) -> Result<usize, RecordError> {
        self.log.lock().expect("store lock").clears += 1;
        Ok(0)
    }
}

/// A point inside `square` under `projection`.
pub fn click(projection: &BoardProjection, square: shakmaty::Square) -> ScreenPos {
    let corner = projection.square_origin(square);
    ScreenPos::new(corner.x + 1, corner.y + 1)
}
