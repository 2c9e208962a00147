/*!
 * Glyph metrics.
 *
 * The layout engine never rasterizes text itself; it asks a `TextMeasurer`
 * for the pixel box a word occupies once rendered with a given face, size
 * and outline. `FontdueMeasurer` answers from the TTF files in the fonts
 * directory.
 */

use std::collections::HashMap;
use std::fmt::Debug;
use std::fs;
use std::path::Path;

use fontdue::{Font, FontSettings};
use log::debug;

use crate::app_config::CaptionFont;
use crate::errors::LayoutError;

/// Rendered size of a piece of text in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GlyphBox {
    pub width: u32,
    pub height: u32,
}

impl GlyphBox {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// How a word is rendered, as far as its size is concerned
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphStyle {
    pub font: CaptionFont,
    /// Font size in pixels
    pub size: u32,
    /// Outline width in pixels, drawn on both sides of each glyph
    pub stroke_width: f32,
    /// Extra spacing between neighbouring glyphs in pixels
    pub kerning: f32,
}

/// Measures rendered text
pub trait TextMeasurer: Send + Sync + Debug {
    /// Pixel box of `text` rendered with `style`
    fn measure(&self, text: &str, style: &GlyphStyle) -> Result<GlyphBox, LayoutError>;

    /// Horizontal offset of each character of `text` from the start of the word
    ///
    /// The default derives each offset from two measurements: the text up to
    /// and including the character, minus the character alone.
    fn glyph_offsets(&self, text: &str, style: &GlyphStyle) -> Result<Vec<u32>, LayoutError> {
        let mut offsets = Vec::new();
        for (index, (byte, c)) in text.char_indices().enumerate() {
            if index == 0 {
                offsets.push(0);
                continue;
            }
            let through = &text[..byte + c.len_utf8()];
            let mut buf = [0u8; 4];
            let alone = self.measure(c.encode_utf8(&mut buf), style)?.width;
            let total = self.measure(through, style)?.width;
            offsets.push(total.saturating_sub(alone));
        }
        Ok(offsets)
    }
}

/// Measurer backed by fontdue
pub struct FontdueMeasurer {
    fonts: HashMap<CaptionFont, Font>,
}

impl Debug for FontdueMeasurer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontdueMeasurer")
            .field("fonts", &self.fonts.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl FontdueMeasurer {
    /// Load the given faces from `fonts_dir`
    pub fn load(fonts_dir: &Path, faces: &[CaptionFont]) -> Result<Self, LayoutError> {
        let mut fonts = HashMap::new();

        for face in faces {
            if fonts.contains_key(face) {
                continue;
            }
            let path = fonts_dir.join(face.file_name());
            let bytes = fs::read(&path).map_err(|e| LayoutError::FontLoad {
                path: path.clone(),
                message: e.to_string(),
            })?;
            let font = Font::from_bytes(bytes, FontSettings::default()).map_err(|e| {
                LayoutError::FontLoad {
                    path: path.clone(),
                    message: e.to_string(),
                }
            })?;
            debug!("Loaded font {} from {}", face, path.display());
            fonts.insert(*face, font);
        }

        Ok(Self { fonts })
    }
}

impl FontdueMeasurer {
    fn font(&self, text: &str, style: &GlyphStyle) -> Result<&Font, LayoutError> {
        self.fonts.get(&style.font).ok_or_else(|| LayoutError::Measure {
            word: text.to_string(),
            message: format!("font {} is not loaded", style.font),
        })
    }

    /// Pen position before each character, and the total advance
    fn pen_positions(font: &Font, text: &str, style: &GlyphStyle) -> (Vec<f32>, f32) {
        let px = style.size as f32;
        let mut starts = Vec::new();
        let mut advance = 0.0f32;
        let mut previous: Option<char> = None;
        for c in text.chars() {
            if let Some(prev) = previous {
                advance += font.horizontal_kern(prev, c, px).unwrap_or(0.0) + style.kerning;
            }
            starts.push(advance);
            advance += font.metrics(c, px).advance_width;
            previous = Some(c);
        }
        (starts, advance)
    }
}

impl TextMeasurer for FontdueMeasurer {
    fn measure(&self, text: &str, style: &GlyphStyle) -> Result<GlyphBox, LayoutError> {
        let font = self.font(text, style)?;

        let px = style.size as f32;
        let line_metrics = font.horizontal_line_metrics(px).ok_or_else(|| LayoutError::Measure {
            word: text.to_string(),
            message: format!("font {} has no horizontal metrics", style.font),
        })?;

        let (_, advance) = Self::pen_positions(font, text, style);
        let outline = 2.0 * style.stroke_width;
        let width = (advance + outline).max(0.0).ceil() as u32;
        let height = (line_metrics.ascent - line_metrics.descent + outline).max(0.0).ceil() as u32;

        Ok(GlyphBox { width, height })
    }

    fn glyph_offsets(&self, text: &str, style: &GlyphStyle) -> Result<Vec<u32>, LayoutError> {
        let font = self.font(text, style)?;
        let (starts, _) = Self::pen_positions(font, text, style);
        Ok(starts.into_iter().map(|x| x.max(0.0).round() as u32).collect())
    }
}
