/*!
 * Mock transcriber for testing.
 *
 * Returns scripted words instead of running a model:
 * - `MockTranscriber::working(words)` - always succeeds in the preferred mode
 * - `MockTranscriber::gpu_fallback(words)` - reports a CPU run after a failed GPU attempt
 * - `MockTranscriber::failing()` - always fails with an error
 */

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::app_config::ExecutionMode;
use crate::errors::TranscriptionError;
use crate::transcript::Word;

use super::{Transcriber, Transcription};

/// Behavior mode for the mock transcriber
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Returns the scripted words
    Working,
    /// Returns the scripted words as if the GPU run had failed
    GpuFallback,
    /// Always fails
    Failing,
}

/// Mock transcriber with scripted output
#[derive(Debug, Clone)]
pub struct MockTranscriber {
    behavior: MockBehavior,
    words: Vec<Word>,
    /// Number of transcription requests served
    call_count: Arc<AtomicUsize>,
    /// Audio paths received, in order
    requests: Arc<Mutex<Vec<PathBuf>>>,
}

impl MockTranscriber {
    pub fn new(behavior: MockBehavior, words: Vec<Word>) -> Self {
        Self {
            behavior,
            words,
            call_count: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn working(words: Vec<Word>) -> Self {
        Self::new(MockBehavior::Working, words)
    }

    pub fn gpu_fallback(words: Vec<Word>) -> Self {
        Self::new(MockBehavior::GpuFallback, words)
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing, Vec::new())
    }

    /// Number of times `transcribe` was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Audio files passed to `transcribe`
    pub fn requested_audio(&self) -> Vec<PathBuf> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Transcriber for MockTranscriber {
    async fn transcribe(&self, audio: &Path) -> Result<Transcription, TranscriptionError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(audio.to_path_buf());
        }

        match self.behavior {
            MockBehavior::Working => Ok(Transcription {
                words: self.words.clone(),
                execution: ExecutionMode::Gpu,
                fell_back: false,
            }),
            MockBehavior::GpuFallback => Ok(Transcription {
                words: self.words.clone(),
                execution: ExecutionMode::Cpu,
                fell_back: true,
            }),
            MockBehavior::Failing => Err(TranscriptionError::Failed("mock transcriber failure".to_string())),
        }
    }

    fn describe(&self) -> String {
        format!("mock transcriber ({:?})", self.behavior)
    }
}
