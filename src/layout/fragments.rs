use serde::Serialize;

use crate::app_config::Color;

use super::PositionedWord;

/// Half-open time interval `[start, end)` in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeWindow {
    pub start: f64,
    pub end: f64,
}

impl TimeWindow {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, other: &TimeWindow) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// What a fragment draws
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FragmentKind {
    /// Word in the base color, visible for the whole line
    Word,
    /// Zero-size space after a word, visible for the whole line
    Space,
    /// Word in the highlight color, visible while it is spoken
    Highlight,
}

/// Glyph outline
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Stroke {
    pub color: Color,
    pub width: f32,
}

/// A timed, positioned piece of text, in line-local pixel coordinates
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptionFragment {
    pub kind: FragmentKind,
    pub text: String,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub window: TimeWindow,
    pub fill: Color,
    pub stroke: Option<Stroke>,
}

/// Colors and outline used to paint a line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinePaint {
    pub color: Color,
    pub highlight_color: Color,
    pub stroke: Stroke,
}

/// Time windows during which each word is highlighted
///
/// A word is highlighted from its start for its spoken duration, clipped to
/// the line window and cut at the start of the following word, so windows
/// never leave the line window and never overlap each other.
pub fn highlight_windows(words: &[PositionedWord], line: TimeWindow) -> Vec<TimeWindow> {
    words
        .iter()
        .enumerate()
        .map(|(i, word)| {
            let start = word.start.clamp(line.start, line.end);
            let mut end = (word.start + word.duration).min(line.end);
            if let Some(next) = words.get(i + 1) {
                end = end.min(next.start);
            }
            TimeWindow::new(start, end.max(start))
        })
        .collect()
}

/// Text, x and width of each drawn piece of a word: the whole word, or one
/// piece per character when glyph offsets are given
fn word_pieces(word: &PositionedWord, offsets: Option<&[u32]>) -> Vec<(String, u32, u32)> {
    let Some(offsets) = offsets.filter(|o| o.len() == word.text.chars().count() && o.len() > 1) else {
        return vec![(word.text.clone(), word.x, word.width)];
    };

    word.text
        .chars()
        .zip(offsets)
        .enumerate()
        .map(|(i, (c, &offset))| {
            let next = offsets.get(i + 1).copied().unwrap_or(word.width);
            (c.to_string(), word.x + offset, next.saturating_sub(offset))
        })
        .collect()
}

/// Fragments for a laid-out line: base word and space per word, then one
/// highlight per word
///
/// With `glyph_offsets` (one list per word) each word and highlight is split
/// into per-character fragments placed at the measured offsets, so spacing
/// that the font itself would not produce is drawn as measured.
pub fn build_fragments(
    words: &[PositionedWord],
    line: TimeWindow,
    paint: &LinePaint,
    glyph_offsets: Option<&[Vec<u32>]>,
) -> Vec<CaptionFragment> {
    let offsets_of = |i: usize| glyph_offsets.and_then(|all| all.get(i)).map(Vec::as_slice);
    let mut fragments = Vec::with_capacity(words.len() * 3);

    for (i, word) in words.iter().enumerate() {
        for (text, x, width) in word_pieces(word, offsets_of(i)) {
            fragments.push(CaptionFragment {
                kind: FragmentKind::Word,
                text,
                x,
                y: word.y,
                width,
                height: word.height,
                window: line,
                fill: paint.color,
                stroke: Some(paint.stroke),
            });
        }
        fragments.push(CaptionFragment {
            kind: FragmentKind::Space,
            text: " ".to_string(),
            x: word.x + word.width,
            y: word.y,
            width: 0,
            height: 0,
            window: line,
            fill: paint.color,
            stroke: None,
        });
    }

    for (i, (word, window)) in words.iter().zip(highlight_windows(words, line)).enumerate() {
        for (text, x, width) in word_pieces(word, offsets_of(i)) {
            fragments.push(CaptionFragment {
                kind: FragmentKind::Highlight,
                text,
                x,
                y: word.y,
                width,
                height: word.height,
                window,
                fill: paint.highlight_color,
                stroke: Some(paint.stroke),
            });
        }
    }

    fragments
}
