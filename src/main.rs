// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, error, info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use autocaption::app_config::{self, CaptionFont, Color, Config, ExecutionMode, SubsPosition};
use autocaption::errors::{AppError, ConfigError};
use autocaption::layout::FontdueMeasurer;
use autocaption::media::FfmpegBackend;
use autocaption::transcription::WhisperCppTranscriber;
use autocaption::{CaptionRequest, Controller, Stage, Transcript, segment};

/// CLI Wrapper for SubsPosition to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliSubsPosition {
    Bottom75,
    Center,
    Top,
    Bottom,
    Left,
    Right,
}

impl From<CliSubsPosition> for SubsPosition {
    fn from(cli_position: CliSubsPosition) -> Self {
        match cli_position {
            CliSubsPosition::Bottom75 => SubsPosition::Bottom75,
            CliSubsPosition::Center => SubsPosition::Center,
            CliSubsPosition::Top => SubsPosition::Top,
            CliSubsPosition::Bottom => SubsPosition::Bottom,
            CliSubsPosition::Left => SubsPosition::Left,
            CliSubsPosition::Right => SubsPosition::Right,
        }
    }
}

/// CLI Wrapper for CaptionFont to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliFont {
    #[value(name = "poppins-extrabold")]
    PoppinsExtraBold,
    RobotoBold,
    NotoSansArabicBold,
    NotoSansHebrewBold,
}

impl From<CliFont> for CaptionFont {
    fn from(cli_font: CliFont) -> Self {
        match cli_font {
            CliFont::PoppinsExtraBold => CaptionFont::PoppinsExtraBold,
            CliFont::RobotoBold => CaptionFont::RobotoBold,
            CliFont::NotoSansArabicBold => CaptionFont::NotoSansArabicBold,
            CliFont::NotoSansHebrewBold => CaptionFont::NotoSansHebrewBold,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

fn level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

fn parse_color(value: &str) -> Result<Color, ConfigError> {
    value.parse()
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Caption a video (default command)
    Caption(CaptionArgs),

    /// Print the subtitle lines of a transcript as JSON
    Lines(LinesArgs),

    /// Generate shell completions for autocaption
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Options shared by the default command and `caption`
#[derive(Args, Debug, Clone, Default)]
struct RunOptions {
    /// Use this transcript instead of transcribing the audio
    #[arg(long, value_name = "TRANSCRIPT")]
    transcript: Option<PathBuf>,

    /// Do not write the captioned video
    #[arg(long)]
    no_video: bool,

    /// Do not write the transcript JSON
    #[arg(long)]
    no_transcript: bool,

    /// Output directory (defaults to the directory of the video)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    #[command(flatten)]
    style: StyleOptions,

    #[command(flatten)]
    speech: SpeechOptions,
}

/// Caption style overrides
#[derive(Args, Debug, Clone, Default)]
struct StyleOptions {
    /// Where the captions are anchored
    #[arg(long, value_enum)]
    position: Option<CliSubsPosition>,

    /// Text color (palette name or #RRGGBB)
    #[arg(long, value_parser = parse_color)]
    color: Option<Color>,

    /// Color of the word being spoken
    #[arg(long, value_parser = parse_color)]
    highlight_color: Option<Color>,

    /// Font size in percent of the frame height
    #[arg(long)]
    font_size: Option<f32>,

    /// Maximum characters per subtitle line
    #[arg(long)]
    max_chars: Option<usize>,

    /// Background box opacity (0.0 - 1.0)
    #[arg(long)]
    opacity: Option<f32>,

    /// Font face
    #[arg(long, value_enum)]
    font: Option<CliFont>,

    /// Outline color
    #[arg(long, value_parser = parse_color)]
    stroke_color: Option<Color>,

    /// Outline width in pixels
    #[arg(long)]
    stroke_width: Option<f32>,

    /// Extra spacing between glyphs in pixels
    #[arg(long)]
    kerning: Option<f32>,

    /// Lay rows out right to left (Arabic and Hebrew faces only)
    #[arg(long)]
    rtl: bool,

    /// Directory holding the font files
    #[arg(long)]
    fonts_dir: Option<PathBuf>,

    /// Output frame rate
    #[arg(long)]
    fps: Option<u32>,
}

/// Speech-to-text overrides
#[derive(Args, Debug, Clone, Default)]
struct SpeechOptions {
    /// Whisper model name (e.g., 'base', 'small', 'medium')
    #[arg(short, long)]
    model: Option<String>,

    /// Explicit ggml model file
    #[arg(long)]
    model_path: Option<PathBuf>,

    /// Spoken language code (e.g., 'en', 'fr') or 'auto'
    #[arg(long)]
    language: Option<String>,

    /// Run the speech model on the CPU only
    #[arg(long)]
    cpu: bool,

    /// Keep the recognized casing instead of upper-casing words
    #[arg(long)]
    keep_case: bool,
}

#[derive(Args, Debug)]
struct CaptionArgs {
    /// Input video file
    #[arg(value_name = "VIDEO")]
    input_video: PathBuf,

    #[command(flatten)]
    options: RunOptions,
}

#[derive(Args, Debug)]
struct LinesArgs {
    /// Transcript JSON file
    #[arg(value_name = "TRANSCRIPT")]
    transcript: PathBuf,

    /// Maximum characters per subtitle line
    #[arg(long)]
    max_chars: Option<usize>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,
}

/// autocaption - word-highlighted captions for spoken-word video
///
/// Transcribes a video, groups the words into short lines and burns them
/// into the video with the spoken word highlighted.
#[derive(Parser, Debug)]
#[command(name = "autocaption")]
#[command(version)]
#[command(about = "Burn word-highlighted captions into spoken-word videos")]
#[command(args_conflicts_with_subcommands = true)]
#[command(long_about = "autocaption transcribes a video with whisper.cpp and burns karaoke-style captions into it.

EXAMPLES:
    autocaption talk.mp4                               # Transcribe and caption
    autocaption -f talk.mp4                            # Force overwrite existing files
    autocaption --no-video talk.mp4                    # Only write talk.transcript.json
    autocaption --transcript talk.transcript.json talk.mp4   # Re-use an edited transcript
    autocaption --position center --highlight-color red talk.mp4
    autocaption lines talk.transcript.json             # Preview the subtitle lines
    autocaption completions bash > autocaption.bash    # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically. Command line flags override the file.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input video file
    #[arg(value_name = "VIDEO")]
    input_video: Option<PathBuf>,

    #[command(flatten)]
    options: RunOptions,
}

// @struct: Custom logger implementation, filtered by the global max level
struct CustomLogger;

impl CustomLogger {
    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color and emoji for log level
    fn decoration(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("1;31", "❌ "),
            Level::Warn => ("1;33", "🚧 "),
            Level::Info => ("1;32", " "),
            Level::Debug => ("1;36", "🔍 "),
            Level::Trace => ("1;35", "📋 "),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let now = chrono::Local::now().format("%H:%M:%S.%3f");
        let (color, emoji) = Self::decoration(record.level());
        let _ = writeln!(
            std::io::stderr(),
            "\x1B[{}m{} {} {}\x1B[0m",
            color,
            now,
            emoji,
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Info until the configuration is known
    if let Err(e) = CustomLogger::init(LevelFilter::Info) {
        eprintln!("Failed to initialize logger: {}", e);
        return ExitCode::FAILURE;
    }

    let cli = CommandLineOptions::parse();

    let result = match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "autocaption", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Lines(args)) => run_lines(args),
        Some(Commands::Caption(args)) => run_caption(args.input_video, args.options).await,
        None => match cli.input_video {
            Some(input_video) => run_caption(input_video, cli.options).await,
            None => Err(anyhow!("VIDEO is required when no subcommand is specified")),
        },
    };

    // Reported once here, the error is not handed back to the runtime
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", failure_message(&e));
            ExitCode::FAILURE
        }
    }
}

/// One-line report of a failed run, naming the stage when known
///
/// Causes already spelled out at the end of the previous message are
/// skipped, since the error enums embed their source in their own text.
fn failure_message(e: &anyhow::Error) -> String {
    let mut parts: Vec<String> = Vec::new();
    for cause in e.chain() {
        let text = cause.to_string();
        if parts.last().is_some_and(|last| last.ends_with(&text)) {
            continue;
        }
        parts.push(text);
    }
    let message = parts.join(": ");

    match e.downcast_ref::<AppError>() {
        Some(app_error) => format!("{} failed: {}", app_error.stage(), message),
        None => message,
    }
}

/// Load the configuration file, writing a default one when missing
fn load_or_create_config(config_path: &str) -> Result<Config> {
    if Path::new(config_path).exists() {
        return Config::from_file(config_path);
    }

    warn!("Config file not found at '{}', creating default config.", config_path);
    let config = Config::default();
    config.write_to_file(config_path)?;
    Ok(config)
}

fn apply_overrides(config: &mut Config, options: &RunOptions) {
    let style = &options.style;
    let caption = &mut config.caption;

    if let Some(position) = style.position {
        caption.subs_position = position.into();
    }
    if let Some(color) = style.color {
        caption.color = color;
    }
    if let Some(color) = style.highlight_color {
        caption.highlight_color = color;
    }
    if let Some(size) = style.font_size {
        caption.font_size = size;
    }
    if let Some(max_chars) = style.max_chars {
        caption.max_chars = max_chars;
    }
    if let Some(opacity) = style.opacity {
        caption.opacity = opacity;
    }
    if let Some(font) = style.font {
        caption.font = font.into();
    }
    if let Some(color) = style.stroke_color {
        caption.stroke_color = color;
    }
    if let Some(width) = style.stroke_width {
        caption.stroke_width = width;
    }
    if let Some(kerning) = style.kerning {
        caption.kerning = kerning;
    }
    if style.rtl {
        caption.right_to_left = true;
    }
    if let Some(dir) = &style.fonts_dir {
        config.output.fonts_dir = dir.clone();
    }
    if let Some(fps) = style.fps {
        config.output.fps = fps;
    }

    let speech = &options.speech;
    let transcription = &mut config.transcription;
    if let Some(model) = &speech.model {
        transcription.model = model.clone();
    }
    if let Some(path) = &speech.model_path {
        transcription.model_path = Some(path.clone());
    }
    if let Some(language) = &speech.language {
        transcription.language = language.clone();
    }
    if speech.cpu {
        transcription.execution = ExecutionMode::Cpu;
    }
    if speech.keep_case {
        transcription.uppercase = false;
    }

    if options.no_video {
        config.output.video = false;
    }
    if options.no_transcript {
        config.output.transcript = false;
    }
    if let Some(level) = options.log_level {
        config.log_level = level.into();
    }
}

async fn run_caption(input_video: PathBuf, options: RunOptions) -> Result<()> {
    // Apply the command line level before anything is logged
    if let Some(level) = options.log_level {
        let level: app_config::LogLevel = level.into();
        log::set_max_level(level_filter(&level));
    }

    let mut config = load_or_create_config(&options.config_path)?;
    apply_overrides(&mut config, &options);
    config
        .validate()
        .map_err(AppError::from)
        .context("Configuration validation failed")?;
    log::set_max_level(level_filter(&config.log_level));

    if config.output.video || options.transcript.is_none() {
        FfmpegBackend::check_available().map_err(|e| AppError::media(Stage::Configuration, e))?;
    }
    let mut controller = Controller::new(config.clone(), Arc::new(FfmpegBackend::new()));

    if options.transcript.is_none() {
        let transcriber = WhisperCppTranscriber::initialize(&config.transcription).map_err(AppError::from)?;
        controller = controller.with_transcriber(Arc::new(transcriber));
    }

    if config.output.video {
        let measurer =
            FontdueMeasurer::load(&config.output.fonts_dir, &[config.caption.font]).map_err(AppError::from)?;
        controller = controller.with_measurer(Arc::new(measurer));
    }

    let output_dir = options.output_dir.clone().unwrap_or_else(|| {
        input_video
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
            .to_path_buf()
    });

    let request = CaptionRequest {
        input_video,
        transcript_input: options.transcript.clone(),
        output_dir,
        force_overwrite: options.force_overwrite,
    };

    let outputs = controller.run(&request).await?;
    if let Some(path) = &outputs.transcript {
        info!("Transcript: {:?}", path);
    }
    if let Some(path) = &outputs.video {
        info!("Captioned video ({} lines): {:?}", outputs.line_count, path);
    }
    Ok(())
}

fn run_lines(args: LinesArgs) -> Result<()> {
    let mut config = load_or_create_config(&args.config_path)?;
    if let Some(max_chars) = args.max_chars {
        config.caption.max_chars = max_chars;
    }
    config
        .validate()
        .map_err(AppError::from)
        .context("Configuration validation failed")?;

    let transcript = Transcript::load(&args.transcript).map_err(AppError::from)?;
    let lines = segment(transcript.words(), config.caption.max_chars);

    let json = serde_json::to_string_pretty(&lines).context("Failed to serialize subtitle lines")?;
    println!("{}", json);
    Ok(())
}
