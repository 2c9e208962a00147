/*!
 * Speech-to-text backends.
 *
 * A `Transcriber` turns an audio file into word-level timestamps. It is a
 * capability object: constructed once at startup (which is when the model
 * is located and validated) and then borrowed for every transcription.
 * - `whisper_cpp`: the whisper.cpp command-line tool
 * - `mock`: scripted transcriber for tests
 */

use async_trait::async_trait;
use std::fmt::Debug;
use std::path::Path;

use crate::app_config::ExecutionMode;
use crate::errors::TranscriptionError;
use crate::transcript::Word;

pub mod mock;
pub mod whisper_cpp;

pub use whisper_cpp::WhisperCppTranscriber;

/// Output of a transcription run
#[derive(Debug, Clone, PartialEq)]
pub struct Transcription {
    /// Words as recognized, before normalization
    pub words: Vec<Word>,
    /// Mode the model actually ran in
    pub execution: ExecutionMode,
    /// Whether the preferred mode failed and the run was repeated in a
    /// fallback mode
    pub fell_back: bool,
}

/// Common trait for all speech-to-text backends
#[async_trait]
pub trait Transcriber: Send + Sync + Debug {
    /// Transcribe an audio file into word-level timestamps
    ///
    /// # Arguments
    /// * `audio` - 16 kHz mono WAV file
    ///
    /// # Returns
    /// * `Result<Transcription, TranscriptionError>` - recognized words or an error
    async fn transcribe(&self, audio: &Path) -> Result<Transcription, TranscriptionError>;

    /// Short human-readable description for log messages
    fn describe(&self) -> String;
}
