/*!
 * Compositing of laid-out lines onto the video.
 *
 * Each line becomes a `CaptionBlock`: its fragments plus a padded bounding
 * box. Blocks are anchored on the frame according to the configured
 * subtitle position and compiled into an ffmpeg filter graph by
 * `filtergraph`.
 */

pub mod filtergraph;

use crate::app_config::SubsPosition;
use crate::layout::{FrameSize, LineLayout, PositionedWord, TimeWindow};

pub use filtergraph::{compile_filter_graph, RenderSettings, OUTPUT_LABEL};

/// Padding factor applied to the bounding box of a line
pub const BOX_PADDING: f64 = 1.1;

/// Background box color, drawn with the configured opacity
pub const BACKGROUND_COLOR: &str = "0x404040";

/// A laid-out line ready to be drawn
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionBlock {
    pub layout: LineLayout,
    /// Padded block width in pixels
    pub width: u32,
    /// Padded block height in pixels
    pub height: u32,
}

impl CaptionBlock {
    pub fn from_layout(layout: LineLayout) -> Self {
        let (width, height) = bounding_box(&layout.positions);
        Self { layout, width, height }
    }

    pub fn window(&self) -> TimeWindow {
        self.layout.window
    }

    /// Top-left corner of the block on the frame
    pub fn origin(&self, position: SubsPosition, frame: FrameSize) -> (i64, i64) {
        anchor(position, frame, self.width, self.height)
    }
}

/// Padded size of the area covered by the words
pub fn bounding_box(positions: &[PositionedWord]) -> (u32, u32) {
    let (max_x, max_y) = positions.iter().fold((0u32, 0u32), |(w, h), word| {
        (w.max(word.x + word.width), h.max(word.y + word.height))
    });
    (
        (f64::from(max_x) * BOX_PADDING) as u32,
        (f64::from(max_y) * BOX_PADDING) as u32,
    )
}

/// Top-left corner of a block of the given size for a subtitle position
pub fn anchor(position: SubsPosition, frame: FrameSize, width: u32, height: u32) -> (i64, i64) {
    let frame_w = i64::from(frame.width);
    let frame_h = i64::from(frame.height);
    let (w, h) = (i64::from(width), i64::from(height));
    let centered_x = (frame_w - w) / 2;
    let centered_y = (frame_h - h) / 2;

    match position {
        SubsPosition::Bottom75 => (centered_x, (frame_h as f64 * 0.75) as i64),
        SubsPosition::Center => (centered_x, centered_y),
        SubsPosition::Top => (centered_x, 0),
        SubsPosition::Bottom => (centered_x, frame_h - h),
        SubsPosition::Left => (0, centered_y),
        SubsPosition::Right => (frame_w - w, centered_y),
    }
}
