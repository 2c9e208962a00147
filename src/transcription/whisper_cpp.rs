use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error, warn};
use serde_json::Value;
use tokio::process::Command;

use crate::app_config::{ExecutionMode, TranscriptionConfig};
use crate::errors::TranscriptionError;
use crate::language_utils;
use crate::transcript::Word;

use super::{Transcriber, Transcription};

/// Binary names whisper.cpp is installed under
const BINARY_NAMES: [&str; 3] = ["whisper-cli", "whisper-cpp", "whisper"];

/// whisper.cpp command-line transcriber
///
/// Construction locates the binary and the model file, so a missing model
/// is reported before any audio is extracted.
#[derive(Debug, Clone)]
pub struct WhisperCppTranscriber {
    binary: PathBuf,
    model_path: PathBuf,
    language: String,
    execution: ExecutionMode,
    timeout: Duration,
}

impl WhisperCppTranscriber {
    /// Locate the binary and model for the given configuration
    pub fn initialize(config: &TranscriptionConfig) -> Result<Self, TranscriptionError> {
        let binary = find_binary().ok_or_else(|| {
            TranscriptionError::Unavailable(format!(
                "whisper.cpp binary not found in PATH (looked for {})",
                BINARY_NAMES.join(", ")
            ))
        })?;

        let model_path = match &config.model_path {
            Some(path) => path.clone(),
            None => default_model_path(&config.model)?,
        };
        if !model_path.is_file() {
            return Err(TranscriptionError::Unavailable(format!(
                "model file not found: {}",
                model_path.display()
            )));
        }

        let language = language_utils::normalize_for_model(&config.language)
            .map_err(|e| TranscriptionError::Unavailable(e.to_string()))?;

        debug!(
            "Using whisper.cpp binary {} with model {}",
            binary.display(),
            model_path.display()
        );

        Ok(Self {
            binary,
            model_path,
            language,
            execution: config.execution,
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    /// Arguments for one run writing `<output_base>.json`
    pub fn command_args(&self, audio: &Path, output_base: &Path, execution: ExecutionMode) -> Vec<String> {
        let mut args = vec![
            "-m".to_string(),
            self.model_path.to_string_lossy().into_owned(),
            "-f".to_string(),
            audio.to_string_lossy().into_owned(),
            "-l".to_string(),
            self.language.clone(),
            // One word per segment
            "-ml".to_string(),
            "1".to_string(),
            "-sow".to_string(),
            "-oj".to_string(),
            "-of".to_string(),
            output_base.to_string_lossy().into_owned(),
        ];
        if execution == ExecutionMode::Cpu {
            args.push("-ng".to_string());
        }
        args
    }

    async fn run(&self, audio: &Path, execution: ExecutionMode) -> Result<Vec<Word>, TranscriptionError> {
        let output_base = audio.with_extension("");
        let json_path = output_base.with_extension("json");
        let args = self.command_args(audio, &output_base, execution);
        debug!("Running {} {}", self.binary.display(), args.join(" "));

        let future = Command::new(&self.binary).args(&args).kill_on_drop(true).output();
        let output = tokio::select! {
            result = future => {
                result.map_err(|e| TranscriptionError::Failed(format!("failed to run whisper.cpp: {}", e)))?
            },
            _ = tokio::time::sleep(self.timeout) => {
                return Err(TranscriptionError::Timeout(self.timeout.as_secs()));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let last_lines: Vec<&str> = stderr.lines().rev().take(5).collect();
            let message = last_lines.into_iter().rev().collect::<Vec<_>>().join("\n");
            error!("whisper.cpp ({}) failed: {}", execution, message);
            return Err(TranscriptionError::Failed(message));
        }

        let content = tokio::fs::read_to_string(&json_path).await.map_err(|e| {
            TranscriptionError::ParseError(format!("failed to read {}: {}", json_path.display(), e))
        })?;
        parse_whisper_json(&content)
    }
}

#[async_trait]
impl Transcriber for WhisperCppTranscriber {
    async fn transcribe(&self, audio: &Path) -> Result<Transcription, TranscriptionError> {
        match self.run(audio, self.execution).await {
            Ok(words) => Ok(Transcription {
                words,
                execution: self.execution,
                fell_back: false,
            }),
            // Timeouts are not retried, a CPU run would only take longer
            Err(e) if self.execution == ExecutionMode::Gpu && !matches!(e, TranscriptionError::Timeout(_)) => {
                warn!("GPU transcription failed ({}), retrying on CPU", e);
                let words = self.run(audio, ExecutionMode::Cpu).await?;
                Ok(Transcription {
                    words,
                    execution: ExecutionMode::Cpu,
                    fell_back: true,
                })
            }
            Err(e) => Err(e),
        }
    }

    fn describe(&self) -> String {
        let model = self
            .model_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let language = language_utils::get_language_name(&self.language).unwrap_or_else(|_| self.language.clone());
        format!("whisper.cpp ({}, {}, {})", model, self.execution, language)
    }
}

fn find_binary() -> Option<PathBuf> {
    BINARY_NAMES.iter().find_map(|name| which::which(name).ok())
}

/// `~/.cache/whisper.cpp/ggml-<model>.bin`
pub fn default_model_path(model: &str) -> Result<PathBuf, TranscriptionError> {
    let cache = dirs::cache_dir()
        .ok_or_else(|| TranscriptionError::Unavailable("no cache directory on this system".to_string()))?;
    Ok(cache.join("whisper.cpp").join(format!("ggml-{}.bin", model)))
}

fn is_special_token(text: &str) -> bool {
    text.starts_with('[') || text.starts_with('<')
}

/// Parse whisper.cpp JSON output (`-oj`) into words
///
/// Segments carry millisecond offsets. A segment holding several words has
/// its span divided evenly between them.
pub fn parse_whisper_json(content: &str) -> Result<Vec<Word>, TranscriptionError> {
    let json: Value = serde_json::from_str(content).map_err(|e| TranscriptionError::ParseError(e.to_string()))?;
    let segments = json
        .get("transcription")
        .and_then(|t| t.as_array())
        .ok_or_else(|| TranscriptionError::ParseError("missing 'transcription' array".to_string()))?;

    let mut words = Vec::new();
    for segment in segments {
        let text = segment.get("text").and_then(|t| t.as_str()).unwrap_or_default();
        let offset = |key: &str| {
            segment
                .get("offsets")
                .and_then(|o| o.get(key))
                .and_then(|v| v.as_i64())
                .map(|ms| ms.max(0) as f64 / 1000.0)
        };
        let (Some(start), Some(end)) = (offset("from"), offset("to")) else {
            debug!("Skipping segment without offsets: {:?}", text);
            continue;
        };

        let tokens: Vec<&str> = text.split_whitespace().filter(|t| !is_special_token(t)).collect();
        if tokens.is_empty() {
            continue;
        }

        let end = end.max(start);
        let step = (end - start) / tokens.len() as f64;
        for (i, token) in tokens.iter().enumerate() {
            let word_start = start + i as f64 * step;
            let word_end = if i + 1 == tokens.len() { end } else { word_start + step };
            words.push(Word::new(*token, word_start, word_end));
        }
    }

    Ok(words)
}
