/*!
 * Tests for line segmentation
 */

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use autocaption::segmenter::{segment, LineLimits, LineSegmenter, SubtitleLine, MAX_DURATION, MAX_GAP};
use autocaption::transcript::Word;

use crate::common::{sample_words, word};

/// Random transcript with sorted, non-overlapping words
fn random_words(rng: &mut StdRng, count: usize) -> Vec<Word> {
    let mut words = Vec::with_capacity(count);
    let mut time = 0.0;
    for _ in 0..count {
        let len = rng.random_range(1..=12);
        let text: String = (0..len).map(|_| rng.random_range(b'A'..=b'Z') as char).collect();
        time += if rng.random_bool(0.1) { rng.random_range(1.0..3.0) } else { rng.random_range(0.0..0.3) };
        let duration = rng.random_range(0.05..1.2);
        words.push(word(&text, time, time + duration));
        time += duration;
    }
    words
}

fn gap(previous: &Word, next: &Word) -> f64 {
    next.start - previous.end
}

fn texts(lines: &[SubtitleLine]) -> Vec<&str> {
    lines.iter().map(|l| l.text.as_str()).collect()
}

/// Test the silence scenario: a long pause starts a new line
#[test]
fn test_segment_withPauseLongerThanMaxGap_shouldStartNewLine() {
    let lines = segment(&sample_words(), 20);

    assert_eq!(texts(&lines), vec!["HELLO WORLD", "THIS IS A TEST"]);
    assert_eq!(lines[0].start, 0.0);
    assert_eq!(lines[0].end, 1.0);
    assert_eq!(lines[1].start, 3.0);
    assert_eq!(lines[1].end, 4.3);
}

/// Test that a gap of exactly MAX_GAP does not break
#[test]
fn test_segment_withGapEqualToMaxGap_shouldKeepWordsTogether() {
    let words = vec![word("ONE", 0.0, 0.5), word("TWO", 2.0, 2.5)];
    assert_eq!(texts(&segment(&words, 20)), vec!["ONE TWO"]);
}

/// Test that characters, not bytes, count towards the limit
#[test]
fn test_segment_withMultibyteText_shouldCountCharacters() {
    // "ÉTÉ ÇA" is 6 characters but 9 bytes
    let words = vec![word("ÉTÉ", 0.0, 0.3), word("ÇA", 0.3, 0.5)];
    assert_eq!(texts(&segment(&words, 6)), vec!["ÉTÉ ÇA"]);
    assert_eq!(texts(&segment(&words, 5)), vec!["ÉTÉ", "ÇA"]);
}

/// Test custom limits through the segmenter type
#[test]
fn test_line_segmenter_withCustomLimits_shouldApplyThem() {
    let limits = LineLimits {
        max_chars: 100,
        max_duration: 1.0,
        max_gap: 0.1,
    };
    let words = vec![word("A", 0.0, 0.4), word("B", 0.4, 0.8), word("C", 1.0, 1.2)];
    let lines = LineSegmenter::new(limits).segment(&words);
    assert_eq!(texts(&lines), vec!["A B", "C"]);
}

/// Test that every input word appears exactly once, in order
#[test]
fn test_segment_withRandomTranscripts_shouldCoverEveryWordInOrder() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..200 {
        let count = rng.random_range(0..60);
        let words = random_words(&mut rng, count);
        let max_chars = rng.random_range(1..=30);

        let lines = segment(&words, max_chars);
        let flattened: Vec<Word> = lines.iter().flat_map(|l| l.words.clone()).collect();
        assert_eq!(flattened, words);
        assert!(lines.iter().all(|l| !l.words.is_empty()));
    }
}

/// Test that line windows are well formed and ordered
#[test]
fn test_segment_withRandomTranscripts_shouldProduceMonotonicLines() {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..200 {
        let count = rng.random_range(1..60);
        let words = random_words(&mut rng, count);
        let lines = segment(&words, rng.random_range(1..=30));

        for line in &lines {
            assert!(line.start <= line.end);
            assert_eq!(line.start, line.words[0].start);
            assert_eq!(line.end, line.words[line.words.len() - 1].end);
        }
        for pair in lines.windows(2) {
            assert!(pair[0].end <= pair[1].start);
        }
    }
}

/// Test that multi-word lines respect every limit and that each break was needed
#[test]
fn test_segment_withRandomTranscripts_shouldRespectLimitsAndBreakOnlyWhenNeeded() {
    let mut rng = StdRng::seed_from_u64(23);
    for _ in 0..200 {
        let count = rng.random_range(1..60);
        let words = random_words(&mut rng, count);
        let max_chars = rng.random_range(1..=30);
        let lines = segment(&words, max_chars);

        for line in lines.iter().filter(|l| l.words.len() > 1) {
            assert!(line.char_count() <= max_chars, "line too long: {}", line.text);
            assert!(line.spoken_duration() <= MAX_DURATION, "line too slow: {}", line.text);
            for pair in line.words.windows(2) {
                assert!(gap(&pair[0], &pair[1]) <= MAX_GAP);
            }
        }

        for pair in lines.windows(2) {
            let (current, next) = (&pair[0], &pair[1]);
            let first = &next.words[0];
            let last = &current.words[current.words.len() - 1];
            let needed = current.spoken_duration() + first.duration() > MAX_DURATION
                || current.char_count() + 1 + first.text.chars().count() > max_chars
                || gap(last, first) > MAX_GAP;
            assert!(needed, "unneeded break between '{}' and '{}'", current.text, next.text);
        }
    }
}

/// Test that re-segmenting the words of a line reproduces that line
#[test]
fn test_segment_withWordsOfOneLine_shouldReturnSameLine() {
    let lines = segment(&sample_words(), 20);
    for line in &lines {
        assert_eq!(segment(&line.words, 20), vec![line.clone()]);
    }
}
