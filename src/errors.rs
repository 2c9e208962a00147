/*!
 * Error types for the autocaption application.
 *
 * Each concern of the pipeline has its own error enum, using the thiserror
 * crate for ergonomic error definitions. `AppError` wraps all of them and
 * knows which pipeline stage produced the failure, so callers can report
 * where the run stopped and retry or fix their configuration.
 */

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Pipeline stage in which an error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Configuration,
    Input,
    AudioExtraction,
    Transcription,
    Layout,
    Compositing,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Configuration => "configuration",
            Stage::Input => "input",
            Stage::AudioExtraction => "audio extraction",
            Stage::Transcription => "transcription",
            Stage::Layout => "layout",
            Stage::Compositing => "compositing",
        };
        write!(f, "{}", name)
    }
}

/// Errors raised while validating the caption configuration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A field holds a value outside its allowed range or set
    #[error("invalid value for '{field}': {message}")]
    InvalidValue {
        /// Name of the offending field
        field: &'static str,
        /// What is wrong with it
        message: String,
    },

    /// Right-to-left text was requested with a face that cannot shape it
    #[error("right-to-left captions are not supported by font '{font}' (use one of: {supported})")]
    UnsupportedDirection {
        font: String,
        supported: String,
    },
}

/// Errors raised while reading, writing or validating a transcript
#[derive(Error, Debug)]
pub enum TranscriptError {
    /// Reading or writing the transcript file failed
    #[error("transcript file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The transcript is not valid JSON of the expected shape
    #[error("malformed transcript: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A word violates the timing invariants
    #[error("invalid word #{index} '{word}': {message}")]
    InvalidWord {
        index: usize,
        word: String,
        message: String,
    },
}

/// Errors raised by the speech-to-text backend
#[derive(Error, Debug)]
pub enum TranscriptionError {
    /// The backend binary or model could not be found
    #[error("transcription backend unavailable: {0}")]
    Unavailable(String),

    /// The backend ran but failed
    #[error("transcription failed: {0}")]
    Failed(String),

    /// The backend output could not be parsed
    #[error("failed to parse transcription output: {0}")]
    ParseError(String),

    /// The backend did not finish in time
    #[error("transcription timed out after {0} seconds")]
    Timeout(u64),
}

/// Errors raised while laying out a subtitle line
#[derive(Error, Debug)]
pub enum LayoutError {
    /// The text measurer could not measure a word
    #[error("failed to measure word '{word}': {message}")]
    Measure { word: String, message: String },

    /// A font face could not be loaded
    #[error("failed to load font {path:?}: {message}")]
    FontLoad { path: PathBuf, message: String },

    /// Right-to-left rows were requested with a left-to-right face
    #[error("font '{font}' cannot be laid out right to left")]
    UnsupportedDirection { font: String },
}

/// Errors raised by ffmpeg/ffprobe
#[derive(Error, Debug)]
pub enum MediaError {
    /// The tool could not be started
    #[error("failed to run {tool}: {message}")]
    Spawn { tool: &'static str, message: String },

    /// The tool exited with a failure status
    #[error("{tool} failed: {message}")]
    Failed { tool: &'static str, message: String },

    /// The tool did not finish in time
    #[error("{tool} timed out after {secs} seconds")]
    Timeout { tool: &'static str, secs: u64 },

    /// The tool produced output we could not interpret
    #[error("unexpected {tool} output: {message}")]
    Unexpected { tool: &'static str, message: String },
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Invalid or unreadable input
    #[error("Input error: {0}")]
    Input(String),

    /// Transcript file problem
    #[error("Transcript error: {0}")]
    Transcript(#[from] TranscriptError),

    /// Speech-to-text problem
    #[error("Transcription error: {0}")]
    Transcription(#[from] TranscriptionError),

    /// Layout problem
    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    /// Media tool problem, tagged with the stage that invoked it
    #[error("Media error during {stage}: {source}")]
    Media {
        stage: Stage,
        #[source]
        source: MediaError,
    },
}

impl AppError {
    /// Wrap a media error raised while running the given stage
    pub fn media(stage: Stage, source: MediaError) -> Self {
        Self::Media { stage, source }
    }

    /// The pipeline stage this error belongs to
    pub fn stage(&self) -> Stage {
        match self {
            Self::Config(_) => Stage::Configuration,
            Self::Input(_) | Self::Transcript(_) => Stage::Input,
            Self::Transcription(_) => Stage::Transcription,
            Self::Layout(_) => Stage::Layout,
            Self::Media { stage, .. } => *stage,
        }
    }
}
