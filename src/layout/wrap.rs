/*!
 * Greedy row wrapping.
 *
 * Words are placed left to right on a visual row until the next word would
 * overflow the usable width; it then starts a new row below. The whole pass
 * is a fold over the measured boxes, so it holds no state between lines.
 */

use super::metrics::GlyphBox;

/// Vertical gap between two visual rows in pixels
pub const ROW_GUTTER: u32 = 10;

/// Where a word was put
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: u32,
    pub y: u32,
    /// Index of the visual row
    pub row: usize,
}

#[derive(Debug, Clone, Copy, Default)]
struct Cursor {
    x: u32,
    y: u32,
    row: usize,
    row_width: u32,
}

impl Cursor {
    fn place(self, glyph: GlyphBox, max_line_width: f64) -> (Placement, Cursor) {
        let fits = f64::from(self.row_width) + f64::from(glyph.width) <= max_line_width;

        // An overlong word on a still-empty row stays there instead of
        // leaving the row blank.
        if fits || self.row_width == 0 {
            let placement = Placement { x: self.x, y: self.y, row: self.row };
            let next = Cursor {
                x: self.x + glyph.width,
                row_width: self.row_width + glyph.width,
                ..self
            };
            return (placement, next);
        }

        let y = self.y + glyph.height + ROW_GUTTER;
        let row = self.row + 1;
        let placement = Placement { x: 0, y, row };
        let next = Cursor {
            x: glyph.width,
            y,
            row,
            row_width: glyph.width,
        };
        (placement, next)
    }
}

/// Place every box, wrapping rows at `max_line_width`
pub fn wrap(boxes: &[GlyphBox], max_line_width: f64) -> Vec<Placement> {
    let (placements, _) = boxes.iter().fold(
        (Vec::with_capacity(boxes.len()), Cursor::default()),
        |(mut placements, cursor), glyph| {
            let (placement, next) = cursor.place(*glyph, max_line_width);
            placements.push(placement);
            (placements, next)
        },
    );
    placements
}

/// Mirror the rows horizontally so words read right to left
///
/// Every row is flipped against the right edge of the widest row, so the
/// first word of each row ends at the same x.
pub fn mirror_rows(placements: &[Placement], boxes: &[GlyphBox]) -> Vec<Placement> {
    let edge = placements
        .iter()
        .zip(boxes)
        .map(|(placement, glyph)| placement.x + glyph.width)
        .max()
        .unwrap_or(0);

    placements
        .iter()
        .zip(boxes)
        .map(|(placement, glyph)| Placement {
            x: edge - placement.x - glyph.width,
            ..*placement
        })
        .collect()
}
