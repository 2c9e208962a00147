/*!
 * Tests for the caption layout engine
 */

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use autocaption::app_config::{CaptionFont, CaptionStyle, Color};
use autocaption::errors::LayoutError;
use autocaption::layout::{layout_line, FragmentKind, FrameSize, GlyphBox, GlyphStyle, TextMeasurer, TimeWindow};
use autocaption::segmenter::{segment, SubtitleLine};
use autocaption::transcript::Word;

use crate::common::mock_measurer::FixedAdvanceMeasurer;
use crate::common::{sample_words, word};

/// 1000 px wide frame, so rows are 800 px wide
const FRAME: FrameSize = FrameSize { width: 1000, height: 500 };

fn line_of(words: Vec<Word>) -> SubtitleLine {
    SubtitleLine::from_words(words).unwrap()
}

/// A word `chars` characters long, 10 px per character with the default measurer
fn wide_word(chars: usize, start: f64) -> Word {
    word(&"M".repeat(chars), start, start + 0.2)
}

/// Test that two words filling the row exactly stay on one row
#[test]
fn test_layout_line_withWordsFillingRowExactly_shouldNotWrap() {
    let line = line_of(vec![wide_word(30, 0.0), wide_word(50, 0.2)]);
    let layout = layout_line(&line, FRAME, &CaptionStyle::default(), &FixedAdvanceMeasurer::default()).unwrap();

    assert_eq!(layout.max_line_width, 800.0);
    assert_eq!((layout.positions[1].x, layout.positions[1].y), (300, 0));
}

/// Test that one extra pixel wraps onto a new row below
#[test]
fn test_layout_line_withOverflow_shouldWrapBelowWithGutter() {
    let measurer = FixedAdvanceMeasurer::new(1, 20);
    let line = line_of(vec![wide_word(300, 0.0), wide_word(501, 0.2)]);
    let layout = layout_line(&line, FRAME, &CaptionStyle::default(), &measurer).unwrap();

    assert_eq!((layout.positions[1].x, layout.positions[1].y), (0, 30));
}

/// Test that a word wider than the row gets a row of its own without blank rows
#[test]
fn test_layout_line_withOverlongWord_shouldPlaceItAloneWithoutBlankRow() {
    let line = line_of(vec![wide_word(90, 0.0), wide_word(5, 0.2)]);
    let layout = layout_line(&line, FRAME, &CaptionStyle::default(), &FixedAdvanceMeasurer::default()).unwrap();

    assert_eq!((layout.positions[0].x, layout.positions[0].y), (0, 0));
    assert_eq!((layout.positions[1].x, layout.positions[1].y), (0, 30));
}

/// Test that every word stays inside the row unless it is alone at a row start
#[test]
fn test_layout_line_withRandomWords_shouldKeepWordsInsideRows() {
    let mut rng = StdRng::seed_from_u64(3);
    let measurer = FixedAdvanceMeasurer::default();
    for _ in 0..200 {
        let count = rng.random_range(1..12);
        let words: Vec<Word> = (0..count)
            .map(|i| wide_word(rng.random_range(1..100), i as f64 * 0.2))
            .collect();
        let layout = layout_line(&line_of(words), FRAME, &CaptionStyle::default(), &measurer).unwrap();

        for position in &layout.positions {
            let inside = f64::from(position.x + position.width) <= layout.max_line_width;
            assert!(inside || position.x == 0, "word escapes its row at x={}", position.x);
        }
        for pair in layout.positions.windows(2) {
            assert!(pair[1].y >= pair[0].y);
        }
    }
}

/// Test the order and timing of fragments
#[test]
fn test_layout_line_shouldEmitBaseAndSpaceThenHighlights() {
    let line = line_of(vec![word("HELLO", 0.0, 0.5), word("WORLD", 0.6, 1.0)]);
    let style = CaptionStyle::default();
    let layout = layout_line(&line, FRAME, &style, &FixedAdvanceMeasurer::default()).unwrap();

    let kinds: Vec<FragmentKind> = layout.fragments.iter().map(|f| f.kind).collect();
    assert_eq!(
        kinds,
        vec![
            FragmentKind::Word,
            FragmentKind::Space,
            FragmentKind::Word,
            FragmentKind::Space,
            FragmentKind::Highlight,
            FragmentKind::Highlight,
        ]
    );

    let base = &layout.fragments[0];
    assert_eq!(base.window, TimeWindow::new(0.0, 1.0));
    assert_eq!(base.fill, style.color);

    let space = &layout.fragments[1];
    assert_eq!((space.x, space.width, space.height), (50, 0, 0));

    let highlight = &layout.fragments[5];
    assert_eq!(highlight.text, "WORLD");
    assert_eq!(highlight.window, TimeWindow::new(0.6, 1.0));
    assert_eq!(highlight.fill, style.highlight_color);
}

/// Test that highlight windows sit inside the line window and never overlap
#[test]
fn test_layout_line_withSegmentedLines_shouldKeepHighlightsDisjointAndInsideLine() {
    let measurer = FixedAdvanceMeasurer::default();
    for line in segment(&sample_words(), 20) {
        let layout = layout_line(&line, FRAME, &CaptionStyle::default(), &measurer).unwrap();
        let highlights: Vec<TimeWindow> = layout
            .fragments
            .iter()
            .filter(|f| f.kind == FragmentKind::Highlight)
            .map(|f| f.window)
            .collect();

        assert_eq!(highlights.len(), line.words.len());
        for window in &highlights {
            assert!(layout.window.contains(window));
        }
        for (i, a) in highlights.iter().enumerate() {
            for b in &highlights[i + 1..] {
                assert!(!a.overlaps(b));
            }
        }
    }
}

/// Test that right-to-left rows start at the right edge
#[test]
fn test_layout_line_withRightToLeft_shouldMirrorEachRow() {
    let style = CaptionStyle {
        font: CaptionFont::NotoSansArabicBold,
        right_to_left: true,
        ..CaptionStyle::default()
    };
    let line = line_of(vec![wide_word(10, 0.0), wide_word(20, 0.2)]);
    let layout = layout_line(&line, FRAME, &style, &FixedAdvanceMeasurer::default()).unwrap();

    // Row is 300 px wide: first word on the right, second on the left
    assert_eq!(layout.positions[0].x, 200);
    assert_eq!(layout.positions[1].x, 0);
}

/// Test that wrapped right-to-left rows all start at the same right edge
#[test]
fn test_layout_line_withRightToLeftWrappedRows_shouldShareRightEdge() {
    let style = CaptionStyle {
        font: CaptionFont::NotoSansHebrewBold,
        right_to_left: true,
        ..CaptionStyle::default()
    };
    // 100 + 200 px on the first row, 700 px wraps onto the second
    let line = line_of(vec![wide_word(10, 0.0), wide_word(20, 0.2), wide_word(70, 0.4)]);
    let layout = layout_line(&line, FRAME, &style, &FixedAdvanceMeasurer::default()).unwrap();
    let right_edge = |i: usize| layout.positions[i].x + layout.positions[i].width;

    assert_eq!(layout.positions[0].y, layout.positions[1].y);
    assert!(layout.positions[2].y > layout.positions[0].y);
    assert_eq!(right_edge(0), right_edge(2));
    assert_eq!(layout.positions[1].x, 400);
    assert_eq!(layout.positions[2].x, 0);
}

/// Test that right-to-left layout is refused for a Latin-only face
#[test]
fn test_layout_line_withRightToLeftAndLatinFont_shouldFail() {
    let style = CaptionStyle {
        font: CaptionFont::RobotoBold,
        right_to_left: true,
        ..CaptionStyle::default()
    };
    let line = line_of(vec![word("HI", 0.0, 0.5)]);
    let err = layout_line(&line, FRAME, &style, &FixedAdvanceMeasurer::default()).unwrap_err();
    assert!(matches!(err, LayoutError::UnsupportedDirection { .. }));
}

/// Test that kerned words are drawn glyph by glyph inside their measured box
#[test]
fn test_layout_line_withNegativeKerning_shouldDrawGlyphsAtMeasuredOffsets() {
    let style = CaptionStyle {
        kerning: -2.0,
        ..CaptionStyle::default()
    };
    let line = line_of(vec![word("HELLO", 0.0, 0.5), word("WORLD", 0.5, 1.0)]);
    let layout = layout_line(&line, FRAME, &style, &FixedAdvanceMeasurer::default()).unwrap();

    // 5 glyphs of 10 px pulled together by 4 * 2 px
    assert_eq!(layout.positions[0].width, 42);
    assert_eq!(layout.positions[1].x, 42);

    let hello: Vec<_> = layout
        .fragments
        .iter()
        .filter(|f| f.kind == FragmentKind::Word && f.y == 0 && f.x < 42)
        .collect();
    let texts: Vec<&str> = hello.iter().map(|f| f.text.as_str()).collect();
    let xs: Vec<u32> = hello.iter().map(|f| f.x).collect();
    assert_eq!(texts, vec!["H", "E", "L", "L", "O"]);
    assert_eq!(xs, vec![0, 8, 16, 24, 32]);

    // No drawn glyph crosses into the next word
    for fragment in layout.fragments.iter().filter(|f| f.kind != FragmentKind::Space) {
        let owner = layout
            .positions
            .iter()
            .find(|p| p.y == fragment.y && p.x <= fragment.x && fragment.x < p.x + p.width)
            .unwrap();
        assert!(fragment.x + fragment.width <= owner.x + owner.width);
    }

    let highlights = layout.fragments.iter().filter(|f| f.kind == FragmentKind::Highlight).count();
    assert_eq!(highlights, 10);
}

/// Test that right-to-left lines keep whole words and ignore extra spacing
#[test]
fn test_layout_line_withRightToLeftAndKerning_shouldKeepWholeWords() {
    let style = CaptionStyle {
        font: CaptionFont::NotoSansArabicBold,
        right_to_left: true,
        kerning: -2.0,
        ..CaptionStyle::default()
    };
    let line = line_of(vec![word("ABC", 0.0, 0.5)]);
    let layout = layout_line(&line, FRAME, &style, &FixedAdvanceMeasurer::default()).unwrap();

    assert_eq!(layout.positions[0].width, 30);
    let words: Vec<&str> = layout
        .fragments
        .iter()
        .filter(|f| f.kind == FragmentKind::Word)
        .map(|f| f.text.as_str())
        .collect();
    assert_eq!(words, vec!["ABC"]);
}

/// Test that the font size follows the frame height
#[test]
fn test_layout_line_shouldResolveFontSizeFromFrameHeight() {
    let line = line_of(vec![word("HI", 0.0, 0.5)]);
    let style = CaptionStyle {
        font_size: 4.0,
        ..CaptionStyle::default()
    };
    let layout = layout_line(&line, FrameSize::new(1080, 1920), &style, &FixedAdvanceMeasurer::default()).unwrap();
    assert_eq!(layout.font_size, 77);
}

#[derive(Debug)]
struct BrokenMeasurer;

impl TextMeasurer for BrokenMeasurer {
    fn measure(&self, text: &str, _style: &GlyphStyle) -> Result<GlyphBox, LayoutError> {
        Err(LayoutError::Measure {
            word: text.to_string(),
            message: "missing glyph".to_string(),
        })
    }
}

/// Test that measuring failures name the word
#[test]
fn test_layout_line_withFailingMeasurer_shouldReportWord() {
    let line = line_of(vec![word("HELLO", 0.0, 0.5)]);
    let err = layout_line(&line, FRAME, &CaptionStyle::default(), &BrokenMeasurer).unwrap_err();
    assert!(err.to_string().contains("HELLO"));
}

/// Test that the stroke is carried by word glyphs only
#[test]
fn test_layout_line_shouldStrokeWordsButNotSpaces() {
    let style = CaptionStyle {
        stroke_color: Color::rgb(1, 2, 3),
        ..CaptionStyle::default()
    };
    let line = line_of(vec![word("HI", 0.0, 0.5)]);
    let layout = layout_line(&line, FRAME, &style, &FixedAdvanceMeasurer::default()).unwrap();

    for fragment in &layout.fragments {
        match fragment.kind {
            FragmentKind::Space => assert!(fragment.stroke.is_none()),
            _ => assert_eq!(fragment.stroke.map(|s| s.color), Some(Color::rgb(1, 2, 3))),
        }
    }
}
