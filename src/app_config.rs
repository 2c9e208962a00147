use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::errors::ConfigError;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings. Every caption style field
/// has an enumerated or range-checked set of valid values, checked eagerly by
/// `Config::validate` before any media work starts.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Caption style
    #[serde(default)]
    pub caption: CaptionStyle,

    /// Speech-to-text settings
    #[serde(default)]
    pub transcription: TranscriptionConfig,

    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Where the caption block is anchored on the frame
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SubsPosition {
    // @position: horizontally centered, top edge at 75% of the frame height
    #[default]
    Bottom75,
    Center,
    Top,
    Bottom,
    Left,
    Right,
}

impl SubsPosition {
    // @returns: Lowercase position identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bottom75 => "bottom75",
            Self::Center => "center",
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

impl fmt::Display for SubsPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SubsPosition {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bottom75" => Ok(Self::Bottom75),
            "center" => Ok(Self::Center),
            "top" => Ok(Self::Top),
            "bottom" => Ok(Self::Bottom),
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            _ => Err(ConfigError::InvalidValue {
                field: "subs_position",
                message: format!("unknown position '{}'", s),
            }),
        }
    }
}

/// Font faces shipped with the application
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CaptionFont {
    #[default]
    PoppinsExtraBold,
    RobotoBold,
    NotoSansArabicBold,
    NotoSansHebrewBold,
}

impl CaptionFont {
    pub const ALL: [CaptionFont; 4] = [
        Self::PoppinsExtraBold,
        Self::RobotoBold,
        Self::NotoSansArabicBold,
        Self::NotoSansHebrewBold,
    ];

    // @returns: Identifier used in the config file and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PoppinsExtraBold => "poppins-extrabold",
            Self::RobotoBold => "roboto-bold",
            Self::NotoSansArabicBold => "noto-sans-arabic-bold",
            Self::NotoSansHebrewBold => "noto-sans-hebrew-bold",
        }
    }

    /// Path of the TTF file, relative to the fonts directory
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::PoppinsExtraBold => "Poppins/Poppins-ExtraBold.ttf",
            Self::RobotoBold => "Roboto/Roboto-Bold.ttf",
            Self::NotoSansArabicBold => "NotoSansArabic/NotoSansArabic-Bold.ttf",
            Self::NotoSansHebrewBold => "NotoSansHebrew/NotoSansHebrew-Bold.ttf",
        }
    }

    /// Whether the face covers a right-to-left script
    pub fn supports_rtl(&self) -> bool {
        matches!(self, Self::NotoSansArabicBold | Self::NotoSansHebrewBold)
    }
}

impl fmt::Display for CaptionFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CaptionFont {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|font| font.as_str() == wanted)
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "font",
                message: format!("unknown font '{}'", s),
            })
    }
}

// @const: Named colors accepted in the configuration
const NAMED_COLORS: [(&str, (u8, u8, u8)); 12] = [
    ("white", (0xFF, 0xFF, 0xFF)),
    ("black", (0x00, 0x00, 0x00)),
    ("yellow", (0xFF, 0xFF, 0x00)),
    ("red", (0xFF, 0x00, 0x00)),
    ("green", (0x00, 0x80, 0x00)),
    ("blue", (0x00, 0x00, 0xFF)),
    ("orange", (0xFF, 0xA5, 0x00)),
    ("purple", (0x80, 0x00, 0x80)),
    ("pink", (0xFF, 0xC0, 0xCB)),
    ("cyan", (0x00, 0xFF, 0xFF)),
    ("magenta", (0xFF, 0x00, 0xFF)),
    ("gray", (0x80, 0x80, 0x80)),
];

/// An RGB color, written as a palette name or `#RRGGBB`
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const WHITE: Color = Color::rgb(0xFF, 0xFF, 0xFF);
    pub const BLACK: Color = Color::rgb(0x00, 0x00, 0x00);
    pub const YELLOW: Color = Color::rgb(0xFF, 0xFF, 0x00);

    /// Color in ffmpeg's `0xRRGGBB` notation
    pub fn to_ffmpeg(&self) -> String {
        format!("0x{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    fn name(&self) -> Option<&'static str> {
        NAMED_COLORS
            .iter()
            .find(|(_, rgb)| *rgb == (self.r, self.g, self.b))
            .map(|(name, _)| *name)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b),
        }
    }
}

impl FromStr for Color {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().to_lowercase();
        if let Some((_, (r, g, b))) = NAMED_COLORS.iter().find(|(name, _)| *name == value) {
            return Ok(Color::rgb(*r, *g, *b));
        }

        let invalid = || ConfigError::InvalidValue {
            field: "color",
            message: format!("'{}' is neither a known color name nor #RRGGBB", s),
        };

        let hex = value.strip_prefix('#').ok_or_else(invalid)?;
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        Ok(Color::rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl TryFrom<String> for Color {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

/// Caption style settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CaptionStyle {
    /// Anchor of the caption block on the frame
    #[serde(default)]
    pub subs_position: SubsPosition,

    /// Base word color
    #[serde(default = "default_color")]
    pub color: Color,

    /// Color of the word currently spoken
    #[serde(default = "default_highlight_color")]
    pub highlight_color: Color,

    /// Font size in percent of the frame height
    /// 7.0 suits landscape videos, 4.0 suits reels
    #[serde(default = "default_font_size")]
    pub font_size: f32,

    /// Maximum rendered characters per subtitle line
    /// 20 suits landscape videos, 10 suits reels
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,

    /// Opacity of the background box (0.0 disables it)
    #[serde(default)]
    pub opacity: f32,

    /// Font face
    #[serde(default)]
    pub font: CaptionFont,

    /// Outline color
    #[serde(default = "default_stroke_color")]
    pub stroke_color: Color,

    /// Outline width in pixels
    #[serde(default = "default_stroke_width")]
    pub stroke_width: f32,

    /// Extra spacing between glyphs in pixels (may be negative)
    #[serde(default)]
    pub kerning: f32,

    /// Lay out words right to left
    #[serde(default)]
    pub right_to_left: bool,
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            subs_position: SubsPosition::default(),
            color: default_color(),
            highlight_color: default_highlight_color(),
            font_size: default_font_size(),
            max_chars: default_max_chars(),
            opacity: 0.0,
            font: CaptionFont::default(),
            stroke_color: default_stroke_color(),
            stroke_width: default_stroke_width(),
            kerning: 0.0,
            right_to_left: false,
        }
    }
}

impl CaptionStyle {
    /// Validate every style field, including the font/direction combination
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.font_size.is_finite() || self.font_size <= 0.0 || self.font_size > 100.0 {
            return Err(ConfigError::InvalidValue {
                field: "font_size",
                message: format!("{} is not within (0, 100] percent of the frame height", self.font_size),
            });
        }

        if self.max_chars == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_chars",
                message: "must be at least 1".to_string(),
            });
        }

        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(ConfigError::InvalidValue {
                field: "opacity",
                message: format!("{} is not within 0.0..=1.0", self.opacity),
            });
        }

        if !self.stroke_width.is_finite() || self.stroke_width < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "stroke_width",
                message: format!("{} must be a non-negative number", self.stroke_width),
            });
        }

        if !self.kerning.is_finite() {
            return Err(ConfigError::InvalidValue {
                field: "kerning",
                message: "must be a finite number".to_string(),
            });
        }

        if self.right_to_left && self.kerning != 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "kerning",
                message: "must be 0 for right-to-left captions, joined scripts are drawn whole words at a time"
                    .to_string(),
            });
        }

        if self.right_to_left && !self.font.supports_rtl() {
            let supported = CaptionFont::ALL
                .iter()
                .filter(|font| font.supports_rtl())
                .map(|font| font.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            return Err(ConfigError::UnsupportedDirection {
                font: self.font.to_string(),
                supported,
            });
        }

        Ok(())
    }
}

/// Preferred execution mode of the speech model
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    #[default]
    Gpu,
    Cpu,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gpu => write!(f, "gpu"),
            Self::Cpu => write!(f, "cpu"),
        }
    }
}

/// Speech-to-text configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TranscriptionConfig {
    /// Whisper model name (e.g., "base", "small", "medium")
    #[serde(default = "default_model")]
    pub model: String,

    /// Explicit ggml model file, overrides the model cache lookup
    #[serde(default)]
    pub model_path: Option<PathBuf>,

    /// Spoken language (ISO 639 code) or "auto"
    #[serde(default = "default_language")]
    pub language: String,

    /// Preferred execution mode, falls back to CPU on failure
    #[serde(default)]
    pub execution: ExecutionMode,

    /// Upper-case transcribed words
    #[serde(default = "default_true")]
    pub uppercase: bool,

    /// Timeout for a single transcription run in seconds
    #[serde(default = "default_transcription_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            model_path: None,
            language: default_language(),
            execution: ExecutionMode::default(),
            uppercase: true,
            timeout_secs: default_transcription_timeout_secs(),
        }
    }
}

/// Output configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OutputConfig {
    /// Write the captioned video
    #[serde(default = "default_true")]
    pub video: bool,

    /// Write the transcript JSON for editing and re-use
    #[serde(default = "default_true")]
    pub transcript: bool,

    /// Directory holding the font files
    #[serde(default = "default_fonts_dir")]
    pub fonts_dir: PathBuf,

    /// Output frame rate
    #[serde(default = "default_fps")]
    pub fps: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            video: true,
            transcript: true,
            fonts_dir: default_fonts_dir(),
            fps: default_fps(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_color() -> Color {
    Color::WHITE
}

fn default_highlight_color() -> Color {
    Color::YELLOW
}

fn default_stroke_color() -> Color {
    Color::BLACK
}

fn default_font_size() -> f32 {
    7.0
}

fn default_max_chars() -> usize {
    20
}

fn default_stroke_width() -> f32 {
    2.6
}

fn default_model() -> String {
    "base".to_string()
}

fn default_language() -> String {
    "auto".to_string()
}

fn default_transcription_timeout_secs() -> u64 {
    1800
}

fn default_fonts_dir() -> PathBuf {
    PathBuf::from("fonts")
}

fn default_fps() -> u32 {
    24
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.caption.validate()?;

        if self.transcription.model.trim().is_empty() && self.transcription.model_path.is_none() {
            return Err(ConfigError::InvalidValue {
                field: "model",
                message: "a model name or model_path is required".to_string(),
            });
        }

        if !self.transcription.language.eq_ignore_ascii_case("auto") {
            crate::language_utils::validate_language_code(&self.transcription.language).map_err(
                |e| ConfigError::InvalidValue {
                    field: "language",
                    message: e.to_string(),
                },
            )?;
        }

        if self.output.fps == 0 {
            return Err(ConfigError::InvalidValue {
                field: "fps",
                message: "must be greater than zero".to_string(),
            });
        }

        Ok(())
    }

    /// Load a configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;

        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Write this configuration as pretty JSON
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let config_json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;

        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write config to file: {}", path.display()))
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            caption: CaptionStyle::default(),
            transcription: TranscriptionConfig::default(),
            output: OutputConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
