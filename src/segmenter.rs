/*!
 * Line segmentation.
 *
 * Groups a word-level transcript into subtitle lines with a single greedy
 * forward pass. A line is closed before the word that would push it over
 * the spoken-duration limit, the character limit, or that follows a long
 * silence; that word then opens the next line. Every input word lands in
 * exactly one line, in input order.
 */

use log::trace;
use serde::{Deserialize, Serialize};

use crate::transcript::Word;

/// Maximum summed spoken duration of a line, in seconds
pub const MAX_DURATION: f64 = 2.5;

/// Silence between two words that forces a line break, in seconds
pub const MAX_GAP: f64 = 1.5;

/// One subtitle line: a run of consecutive words shown together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleLine {
    /// Words joined by single spaces
    pub text: String,
    /// Start of the first word
    pub start: f64,
    /// End of the last word
    pub end: f64,
    pub words: Vec<Word>,
}

impl SubtitleLine {
    /// Build a line from a non-empty run of words
    pub fn from_words(words: Vec<Word>) -> Option<Self> {
        let start = words.first()?.start;
        let end = words.last()?.end;
        let text = words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        Some(Self { text, start, end, words })
    }

    /// Summed spoken duration of the words
    pub fn spoken_duration(&self) -> f64 {
        self.words.iter().map(Word::duration).sum()
    }

    /// Rendered length in characters
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Limits that close a line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineLimits {
    pub max_chars: usize,
    pub max_duration: f64,
    pub max_gap: f64,
}

impl LineLimits {
    pub fn new(max_chars: usize) -> Self {
        Self {
            max_chars,
            max_duration: MAX_DURATION,
            max_gap: MAX_GAP,
        }
    }
}

// @struct: Words collected for the line being built
#[derive(Default)]
struct LineBuffer {
    words: Vec<Word>,
    spoken: f64,
    chars: usize,
}

impl LineBuffer {
    fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    fn chars_with(&self, word: &Word) -> usize {
        let word_chars = word.text.chars().count();
        if self.is_empty() {
            word_chars
        } else {
            self.chars + 1 + word_chars
        }
    }

    fn push(&mut self, word: &Word) {
        self.chars = self.chars_with(word);
        self.spoken += word.duration();
        self.words.push(word.clone());
    }

    fn flush(&mut self) -> Option<SubtitleLine> {
        let buffer = std::mem::take(self);
        SubtitleLine::from_words(buffer.words)
    }
}

/// Greedy line segmenter
#[derive(Debug, Clone, Copy)]
pub struct LineSegmenter {
    limits: LineLimits,
}

impl LineSegmenter {
    pub fn new(limits: LineLimits) -> Self {
        Self { limits }
    }

    /// Split the words into subtitle lines
    pub fn segment(&self, words: &[Word]) -> Vec<SubtitleLine> {
        let mut lines = Vec::new();
        let mut buffer = LineBuffer::default();

        for word in words {
            if self.breaks_before(&buffer, word) {
                lines.extend(buffer.flush());
            }
            buffer.push(word);
        }
        lines.extend(buffer.flush());

        if log::max_level() >= log::LevelFilter::Trace {
            for line in &lines {
                trace!("[{:.2} - {:.2}] {}", line.start, line.end, line.text);
            }
        }

        lines
    }

    // A word that alone breaks a limit still joins the empty buffer, so it
    // ends up on a line of its own.
    fn breaks_before(&self, buffer: &LineBuffer, word: &Word) -> bool {
        let Some(previous) = buffer.words.last() else {
            return false;
        };

        let duration_exceeded = buffer.spoken + word.duration() > self.limits.max_duration;
        let chars_exceeded = buffer.chars_with(word) > self.limits.max_chars;
        let gap_exceeded = word.start - previous.end > self.limits.max_gap;

        duration_exceeded || chars_exceeded || gap_exceeded
    }
}

/// Split words into lines using the default duration and gap limits
pub fn segment(words: &[Word], max_chars: usize) -> Vec<SubtitleLine> {
    LineSegmenter::new(LineLimits::new(max_chars)).segment(words)
}
