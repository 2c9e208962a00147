/*!
 * Common test utilities for the autocaption test suite
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use autocaption::transcript::Word;


/// Routes library logs to the test output, shown with `--nocapture`
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Creates a placeholder video file; the mock media backend never reads it
pub fn create_test_video(dir: &Path, filename: &str) -> Result<PathBuf> {
    create_test_file(dir, filename, "not really a video")
}

/// Shorthand for building words
pub fn word(text: &str, start: f64, end: f64) -> Word {
    Word::new(text, start, end)
}

/// Words of a short spoken sentence, with a long pause before "THIS"
pub fn sample_words() -> Vec<Word> {
    vec![
        word("HELLO", 0.0, 0.5),
        word("WORLD", 0.5, 1.0),
        word("THIS", 3.0, 3.5),
        word("IS", 3.5, 3.7),
        word("A", 3.7, 3.8),
        word("TEST", 3.8, 4.3),
    ]
}

/// Creates a transcript file holding the given words
pub fn create_test_transcript(dir: &Path, filename: &str, words: &[Word]) -> Result<PathBuf> {
    let content = serde_json::to_string_pretty(words)?;
    create_test_file(dir, filename, &content)
}
