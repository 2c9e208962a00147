/*!
 * Word-level transcripts.
 *
 * A transcript is the time-ordered list of spoken words produced by the
 * speech model, or loaded verbatim from a transcript file written by an
 * earlier run. The JSON form is an array of `{"word", "start", "end"}`
 * objects so that users can edit it by hand and feed it back in.
 */

use std::fs;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::errors::TranscriptError;

/// A single spoken word with its timing in seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    #[serde(rename = "word")]
    pub text: String,
    pub start: f64,
    pub end: f64,
}

impl Word {
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            text: text.into(),
            start,
            end,
        }
    }

    /// Spoken duration of the word
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Validated, immutable sequence of words
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Transcript {
    words: Vec<Word>,
}

impl Transcript {
    /// Create a transcript, checking the timing invariants of every word
    pub fn new(words: Vec<Word>) -> Result<Self, TranscriptError> {
        Self::validate(&words)?;
        Ok(Self { words })
    }

    /// Create a transcript from raw recognizer output
    ///
    /// Recognizers emit words with surrounding whitespace and sometimes
    /// empty tokens; those are trimmed and dropped here. Inverted spans are
    /// collapsed to their start and words are put back in start order.
    pub fn from_recognized(words: Vec<Word>, uppercase: bool) -> Result<Self, TranscriptError> {
        let mut words: Vec<Word> = words
            .into_iter()
            .filter_map(|word| {
                let text = word.text.trim();
                if text.is_empty() {
                    return None;
                }
                let text = if uppercase { text.to_uppercase() } else { text.to_string() };
                Some(Word {
                    text,
                    start: word.start,
                    end: word.end.max(word.start),
                })
            })
            .collect();
        words.sort_by(|a, b| a.start.total_cmp(&b.start));
        Self::new(words)
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Parse a transcript from its JSON form
    pub fn parse(json: &str) -> Result<Self, TranscriptError> {
        let words: Vec<Word> = serde_json::from_str(json)?;
        Self::new(words)
    }

    /// Load a transcript file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, TranscriptError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| TranscriptError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let transcript = Self::parse(&content)?;
        debug!("Loaded {} words from {}", transcript.len(), path.display());
        Ok(transcript)
    }

    /// Serialize to JSON with 4-space indentation
    pub fn to_json(&self) -> Result<String, TranscriptError> {
        let mut buffer = Vec::new();
        let mut serializer = Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"    "));
        self.words.serialize(&mut serializer)?;
        // serde_json only ever writes valid UTF-8
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    /// Write the transcript file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), TranscriptError> {
        let path = path.as_ref();
        let json = self.to_json()?;
        fs::write(path, json).map_err(|source| TranscriptError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    fn validate(words: &[Word]) -> Result<(), TranscriptError> {
        let invalid = |index: usize, word: &Word, message: String| TranscriptError::InvalidWord {
            index,
            word: word.text.clone(),
            message,
        };

        for (index, word) in words.iter().enumerate() {
            if !word.start.is_finite() || !word.end.is_finite() || word.start < 0.0 {
                return Err(invalid(
                    index,
                    word,
                    format!("timestamps must be finite and non-negative ({} - {})", word.start, word.end),
                ));
            }

            if word.end < word.start {
                return Err(invalid(
                    index,
                    word,
                    format!("end {} is before start {}", word.end, word.start),
                ));
            }

            if index > 0 && word.start < words[index - 1].start {
                return Err(invalid(
                    index,
                    word,
                    format!(
                        "start {} is earlier than the previous word's start {}",
                        word.start,
                        words[index - 1].start
                    ),
                ));
            }
        }

        Ok(())
    }
}
