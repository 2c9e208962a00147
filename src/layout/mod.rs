/*!
 * Caption layout engine.
 *
 * Turns one subtitle line into positioned, timed text fragments:
 * - `metrics`: the glyph-measuring seam and its fontdue implementation
 * - `wrap`: greedy row wrapping of the measured words
 * - `fragments`: base, space and highlight fragments with their time windows
 *
 * Coordinates are local to the line; the compositor offsets the whole block.
 */

pub mod fragments;
pub mod metrics;
pub mod wrap;

use serde::Serialize;

use crate::app_config::CaptionStyle;
use crate::errors::LayoutError;
use crate::segmenter::SubtitleLine;

pub use fragments::{CaptionFragment, FragmentKind, LinePaint, Stroke, TimeWindow};
pub use metrics::{FontdueMeasurer, GlyphBox, GlyphStyle, TextMeasurer};

/// Pixel dimensions of the video frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// A word with its position in the line's coordinate frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionedWord {
    pub text: String,
    pub start: f64,
    pub end: f64,
    pub duration: f64,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Result of laying out one subtitle line
#[derive(Debug, Clone, PartialEq)]
pub struct LineLayout {
    pub fragments: Vec<CaptionFragment>,
    pub positions: Vec<PositionedWord>,
    /// Time window of the whole line
    pub window: TimeWindow,
    /// Font size in pixels
    pub font_size: u32,
    /// Usable row width in pixels
    pub max_line_width: f64,
}

/// Font size in pixels for a size given in percent of the frame height
pub fn resolve_font_size(frame_height: u32, font_size_percent: f32) -> u32 {
    (f64::from(frame_height) * f64::from(font_size_percent) / 100.0).round() as u32
}

/// Row width left after a 10% margin on each side
pub fn max_line_width(frame_width: u32) -> f64 {
    let margin = f64::from(frame_width) / 10.0;
    f64::from(frame_width) - 2.0 * margin
}

/// Lay out one line for the given frame and style
pub fn layout_line(
    line: &SubtitleLine,
    frame: FrameSize,
    style: &CaptionStyle,
    measurer: &dyn TextMeasurer,
) -> Result<LineLayout, LayoutError> {
    if style.right_to_left && !style.font.supports_rtl() {
        return Err(LayoutError::UnsupportedDirection {
            font: style.font.to_string(),
        });
    }

    let font_size = resolve_font_size(frame.height, style.font_size);
    let max_line_width = max_line_width(frame.width);
    // Joined scripts are drawn a word at a time, so extra spacing is not
    // applied to right-to-left lines
    let kerning = if style.right_to_left { 0.0 } else { style.kerning };
    let glyph_style = GlyphStyle {
        font: style.font,
        size: font_size,
        stroke_width: style.stroke_width,
        kerning,
    };

    let boxes = line
        .words
        .iter()
        .map(|word| measurer.measure(&word.text, &glyph_style))
        .collect::<Result<Vec<_>, _>>()?;

    let placements = wrap::wrap(&boxes, max_line_width);
    let placements = if style.right_to_left {
        wrap::mirror_rows(&placements, &boxes)
    } else {
        placements
    };

    let positions: Vec<PositionedWord> = line
        .words
        .iter()
        .zip(placements.iter().zip(&boxes))
        .map(|(word, (placement, glyph))| PositionedWord {
            text: word.text.clone(),
            start: word.start,
            end: word.end,
            duration: word.duration(),
            x: placement.x,
            y: placement.y,
            width: glyph.width,
            height: glyph.height,
        })
        .collect();

    let window = TimeWindow::new(line.start, line.end);
    let paint = LinePaint {
        color: style.color,
        highlight_color: style.highlight_color,
        stroke: Stroke {
            color: style.stroke_color,
            width: style.stroke_width,
        },
    };
    // The drawing backend only knows the font's own spacing, so kerned words
    // are drawn glyph by glyph at the measured offsets
    let glyph_offsets = if kerning != 0.0 {
        let offsets = line
            .words
            .iter()
            .map(|word| measurer.glyph_offsets(&word.text, &glyph_style))
            .collect::<Result<Vec<_>, _>>()?;
        Some(offsets)
    } else {
        None
    };
    let fragments = fragments::build_fragments(&positions, window, &paint, glyph_offsets.as_deref());

    Ok(LineLayout {
        fragments,
        positions,
        window,
        font_size,
        max_line_width,
    })
}
