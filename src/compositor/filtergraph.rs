use std::path::PathBuf;

use crate::app_config::SubsPosition;
use crate::layout::{CaptionFragment, FragmentKind, FrameSize, TimeWindow};

use super::{BACKGROUND_COLOR, CaptionBlock};

/// Label of the captioned video stream produced by the graph
pub const OUTPUT_LABEL: &str = "captioned";

/// Frame-level settings shared by every block
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    pub frame: FrameSize,
    pub position: SubsPosition,
    /// Background box opacity, 0.0 draws no box
    pub opacity: f32,
    pub font_file: PathBuf,
}

/// Escape a value for use inside a filter option (`key=value`)
fn escape_option_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '\'' | ':') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Escape a filter description for the filtergraph parser
fn escape_graph(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '\'' | '[' | ']' | ',' | ';') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Escape a literal for both levels at once
pub fn escape_literal(value: &str) -> String {
    escape_graph(&escape_option_value(value))
}

fn enable_expression(window: &TimeWindow) -> String {
    escape_literal(&format!("gte(t,{:.3})*lt(t,{:.3})", window.start, window.end))
}

fn background_filter(block: &CaptionBlock, origin: (i64, i64), opacity: f32) -> String {
    format!(
        "drawbox=x={}:y={}:w={}:h={}:color={}@{:.2}:t=fill:enable={}",
        origin.0,
        origin.1,
        block.width,
        block.height,
        BACKGROUND_COLOR,
        opacity,
        enable_expression(&block.window())
    )
}

fn text_filter(
    fragment: &CaptionFragment,
    origin: (i64, i64),
    font_size: u32,
    font_file: &str,
) -> String {
    let mut filter = format!(
        "drawtext=fontfile={}:text={}:expansion=none:fontsize={}:fontcolor={}",
        font_file,
        escape_literal(&fragment.text),
        font_size,
        fragment.fill.to_ffmpeg()
    );
    if let Some(stroke) = fragment.stroke.filter(|s| s.width > 0.0) {
        filter.push_str(&format!(
            ":borderw={}:bordercolor={}",
            stroke.width.round() as u32,
            stroke.color.to_ffmpeg()
        ));
    }
    filter.push_str(&format!(
        ":x={}:y={}:enable={}",
        origin.0 + i64::from(fragment.x),
        origin.1 + i64::from(fragment.y),
        enable_expression(&fragment.window)
    ));
    filter
}

/// Compile the blocks into a filter graph reading `[0:v]` and writing
/// `[captioned]`
///
/// Per block the background box comes first, then the base words, then the
/// highlights, so highlights paint over the base glyphs.
pub fn compile_filter_graph(blocks: &[CaptionBlock], settings: &RenderSettings) -> String {
    let font_file = escape_literal(&settings.font_file.to_string_lossy());
    let mut filters = Vec::new();

    for block in blocks {
        let origin = block.origin(settings.position, settings.frame);

        if settings.opacity > 0.0 {
            filters.push(background_filter(block, origin, settings.opacity));
        }

        // Space fragments are zero-sized and draw nothing
        filters.extend(
            block
                .layout
                .fragments
                .iter()
                .filter(|fragment| fragment.kind != FragmentKind::Space)
                .map(|fragment| text_filter(fragment, origin, block.layout.font_size, &font_file)),
        );
    }

    if filters.is_empty() {
        return format!("[0:v]null[{}]", OUTPUT_LABEL);
    }

    format!("[0:v]{}[{}]", filters.join(",\n"), OUTPUT_LABEL)
}
