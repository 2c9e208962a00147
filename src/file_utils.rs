use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

// @module: File and directory utilities

/// Suffix of the captioned video, `talk.mp4` becomes `talk.captioned.mp4`
pub const VIDEO_SUFFIX: &str = "captioned";

/// Suffix of the transcript, `talk.mp4` becomes `talk.transcript.json`
pub const TRANSCRIPT_SUFFIX: &str = "transcript";

/// Start of a transcript document: an array of word objects, or an empty one
static TRANSCRIPT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*\[\s*(\]|\{\s*"(word|start|end)"\s*:)"#).unwrap()
});

// Common video container extensions supported by ffmpeg
const VIDEO_EXTENSIONS: [&str; 14] = [
    "mp4", "mkv", "avi", "mov", "wmv", "flv", "webm", "m4v", "mpg", "mpeg", "ogv", "ts", "mts", "m2ts",
];

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !Self::dir_exists(path) {
            fs::create_dir_all(path).with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    // @generates: Output path next to the input name, in the output directory
    // @params: input_file, output_dir, suffix, extension
    pub fn generate_output_path<P1: AsRef<Path>, P2: AsRef<Path>>(
        input_file: P1,
        output_dir: P2,
        suffix: &str,
        extension: &str,
    ) -> PathBuf {
        let stem = input_file.as_ref().file_stem().unwrap_or_default();

        let mut output_filename = stem.to_string_lossy().to_string();
        output_filename.push('.');
        output_filename.push_str(suffix);
        output_filename.push('.');
        output_filename.push_str(extension);

        output_dir.as_ref().join(output_filename)
    }

    /// Fresh per-run directory for intermediate files
    ///
    /// The directory is kept after the run so intermediate files can be
    /// inspected.
    pub fn create_work_dir() -> Result<PathBuf> {
        let dir = tempfile::Builder::new()
            .prefix("autocaption-")
            .tempdir()
            .context("Failed to create work directory")?;
        Ok(dir.keep())
    }

    /// Whether two paths name the same file
    pub fn same_file<P1: AsRef<Path>, P2: AsRef<Path>>(a: P1, b: P2) -> bool {
        match (fs::canonicalize(a.as_ref()), fs::canonicalize(b.as_ref())) {
            (Ok(a), Ok(b)) => a == b,
            _ => a.as_ref() == b.as_ref(),
        }
    }

    /// Detect whether a file is a video or a word-level transcript
    pub fn detect_file_type<P: AsRef<Path>>(path: P) -> Result<FileType> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(anyhow::anyhow!("File does not exist: {:?}", path));
        }

        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            return Ok(FileType::Video);
        }

        if ext == "json" {
            let content = fs::read_to_string(path).with_context(|| format!("Failed to read file: {:?}", path))?;
            if TRANSCRIPT_PATTERN.is_match(&content) {
                return Ok(FileType::Transcript);
            }
        }

        Ok(FileType::Unknown)
    }
}

/// Enum representing different file types
#[derive(Debug, PartialEq, Eq)]
pub enum FileType {
    /// Word-level transcript (JSON)
    Transcript,
    /// Video file supported by ffmpeg
    Video,
    /// Unknown file type
    Unknown,
}
