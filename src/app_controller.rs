use anyhow::{Context, Result};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::app_config::{Config, ExecutionMode};
use crate::compositor::{self, CaptionBlock, RenderSettings};
use crate::errors::{AppError, Stage};
use crate::file_utils::{FileManager, FileType, TRANSCRIPT_SUFFIX, VIDEO_SUFFIX};
use crate::layout::{self, TextMeasurer};
use crate::media::{MediaBackend, RenderJob};
use crate::segmenter;
use crate::transcript::Transcript;
use crate::transcription::Transcriber;

// @module: Application controller for the captioning pipeline

/// One captioning run
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionRequest {
    /// Source video
    pub input_video: PathBuf,
    /// Existing transcript to use instead of transcribing
    pub transcript_input: Option<PathBuf>,
    /// Directory receiving the outputs
    pub output_dir: PathBuf,
    /// Overwrite existing outputs
    pub force_overwrite: bool,
}

/// Files produced by a run
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionOutputs {
    /// Captioned video, if written
    pub video: Option<PathBuf>,
    /// Transcript JSON, if written
    pub transcript: Option<PathBuf>,
    /// Per-run directory holding the intermediate files
    pub work_dir: PathBuf,
    /// Number of subtitle lines drawn
    pub line_count: usize,
    /// Mode the speech model ran in, when the run transcribed audio
    pub execution: Option<ExecutionMode>,
}

/// Main application controller for video captioning
pub struct Controller {
    // @field: App configuration
    config: Config,
    media: Arc<dyn MediaBackend>,
    transcriber: Option<Arc<dyn Transcriber>>,
    measurer: Option<Arc<dyn TextMeasurer>>,
    progress: MultiProgress,
}

impl Controller {
    // @method: Create a new controller with the given configuration and media backend
    pub fn new(config: Config, media: Arc<dyn MediaBackend>) -> Self {
        Self {
            config,
            media,
            transcriber: None,
            measurer: None,
            progress: MultiProgress::new(),
        }
    }

    /// Speech model used when no transcript is supplied
    pub fn with_transcriber(mut self, transcriber: Arc<dyn Transcriber>) -> Self {
        self.transcriber = Some(transcriber);
        self
    }

    /// Glyph measurer used to lay out lines
    pub fn with_measurer(mut self, measurer: Arc<dyn TextMeasurer>) -> Self {
        self.measurer = Some(measurer);
        self
    }

    /// Use a custom progress container (hidden in tests)
    pub fn with_progress(mut self, progress: MultiProgress) -> Self {
        self.progress = progress;
        self
    }

    /// Run the whole pipeline for one video
    pub async fn run(&self, request: &CaptionRequest) -> Result<CaptionOutputs> {
        let start_time = Instant::now();

        self.config.validate().map_err(AppError::from)?;
        self.check_request(request)?;

        FileManager::ensure_dir(&request.output_dir)?;
        let work_dir = FileManager::create_work_dir()?;
        debug!("Work directory: {:?}", work_dir);

        let (transcript, execution) = match &request.transcript_input {
            Some(path) => {
                info!("Using transcript {:?}", path);
                let transcript = Transcript::load(path).map_err(AppError::from)?;
                (transcript, None)
            }
            None => {
                let (transcript, execution) = self.transcribe(&request.input_video, &work_dir).await?;
                (transcript, Some(execution))
            }
        };
        info!("Transcript holds {} words", transcript.len());

        let transcript_path = if self.config.output.transcript {
            self.save_transcript(&transcript, request)?
        } else {
            None
        };

        let mut outputs = CaptionOutputs {
            video: None,
            transcript: transcript_path,
            work_dir: work_dir.clone(),
            line_count: 0,
            execution,
        };

        if self.config.output.video {
            let output_video = FileManager::generate_output_path(&request.input_video, &request.output_dir, VIDEO_SUFFIX, "mp4");
            if output_video.exists() && !request.force_overwrite {
                warn!("Skipping video, {:?} already exists (use -f to force overwrite)", output_video);
            } else {
                outputs.line_count = self
                    .caption_video(&request.input_video, &output_video, &transcript, &work_dir)
                    .await?;
                outputs.video = Some(output_video);
            }
        }

        info!("Done in {}.", Self::format_duration(start_time.elapsed()));
        Ok(outputs)
    }

    fn check_request(&self, request: &CaptionRequest) -> Result<()> {
        if !self.config.output.video && !self.config.output.transcript {
            return Err(AppError::Input("both video and transcript output are disabled".to_string()).into());
        }

        let needs_video = self.config.output.video || request.transcript_input.is_none();
        if needs_video && !FileManager::file_exists(&request.input_video) {
            return Err(AppError::Input(format!("input video does not exist: {:?}", request.input_video)).into());
        }

        if needs_video && FileManager::detect_file_type(&request.input_video)? != FileType::Video {
            warn!("{:?} does not have a known video extension, trying anyway", request.input_video);
        }

        if let Some(path) = &request.transcript_input {
            if !FileManager::file_exists(path) {
                return Err(AppError::Input(format!("transcript does not exist: {:?}", path)).into());
            }
            if FileManager::detect_file_type(path)? != FileType::Transcript {
                warn!("{:?} does not look like a word-level transcript", path);
            }
        } else if self.transcriber.is_none() {
            return Err(AppError::Input("no transcript given and no speech model configured".to_string()).into());
        }

        if self.config.output.video && self.measurer.is_none() {
            return Err(AppError::Input("video output requires a text measurer".to_string()).into());
        }

        Ok(())
    }

    async fn transcribe(&self, input_video: &Path, work_dir: &Path) -> Result<(Transcript, ExecutionMode)> {
        let transcriber = self
            .transcriber
            .as_ref()
            .ok_or_else(|| AppError::Input("no speech model configured".to_string()))?;

        let audio_path = work_dir.join("audio.wav");
        let spinner = self.spinner("Extracting audio");
        let extracted = self.media.extract_audio(input_video, &audio_path).await;
        spinner.finish_and_clear();
        extracted.map_err(|e| AppError::media(Stage::AudioExtraction, e))?;

        info!("Transcribing with {}, please wait…", transcriber.describe());
        let spinner = self.spinner("Transcribing");
        let transcribe_start = Instant::now();
        let result = transcriber.transcribe(&audio_path).await;
        spinner.finish_and_clear();
        let transcription = result.map_err(AppError::from)?;

        if transcription.fell_back {
            warn!("Speech model fell back to {} execution", transcription.execution);
        }
        info!(
            "Transcription finished in {} ({} execution)",
            Self::format_duration(transcribe_start.elapsed()),
            transcription.execution
        );

        let transcript = Transcript::from_recognized(transcription.words, self.config.transcription.uppercase)
            .map_err(AppError::from)?;
        Ok((transcript, transcription.execution))
    }

    fn save_transcript(&self, transcript: &Transcript, request: &CaptionRequest) -> Result<Option<PathBuf>> {
        let path = FileManager::generate_output_path(&request.input_video, &request.output_dir, TRANSCRIPT_SUFFIX, "json");

        if let Some(input) = &request.transcript_input {
            if FileManager::same_file(input, &path) {
                debug!("Transcript output is the input transcript, leaving it untouched");
                return Ok(Some(path));
            }
        }

        if path.exists() && !request.force_overwrite {
            warn!("Skipping transcript, {:?} already exists (use -f to force overwrite)", path);
            return Ok(None);
        }

        transcript.save(&path).map_err(AppError::from)?;
        info!("Transcript written to {:?}", path);
        Ok(Some(path))
    }

    async fn caption_video(
        &self,
        input_video: &Path,
        output_video: &Path,
        transcript: &Transcript,
        work_dir: &Path,
    ) -> Result<usize> {
        let measurer = self
            .measurer
            .as_ref()
            .ok_or_else(|| AppError::Input("video output requires a text measurer".to_string()))?;
        let style = &self.config.caption;

        let frame = self
            .media
            .probe_frame_size(input_video)
            .await
            .map_err(|e| AppError::media(Stage::Input, e))?;
        debug!("Frame size {}x{}", frame.width, frame.height);

        let lines = segmenter::segment(transcript.words(), style.max_chars);
        info!("Segmented {} words into {} lines", transcript.len(), lines.len());

        let progress_bar = self.progress.add(ProgressBar::new(lines.len() as u64));
        let bar_style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} lines ({percent}%) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(bar_style.progress_chars("█▓▒░"));
        progress_bar.set_message("Laying out");

        let mut blocks = Vec::with_capacity(lines.len());
        for (index, line) in lines.iter().enumerate() {
            let layout = layout::layout_line(line, frame, style, &**measurer)
                .map_err(AppError::from)
                .with_context(|| format!("Failed to lay out line {} '{}'", index + 1, line.text))?;
            blocks.push(CaptionBlock::from_layout(layout));
            progress_bar.inc(1);
        }
        progress_bar.finish_and_clear();

        let settings = RenderSettings {
            frame,
            position: style.subs_position,
            opacity: style.opacity,
            font_file: self.config.output.fonts_dir.join(style.font.file_name()),
        };
        let job = RenderJob {
            input_video: input_video.to_path_buf(),
            output_video: output_video.to_path_buf(),
            filter_graph: compositor::compile_filter_graph(&blocks, &settings),
            output_label: compositor::OUTPUT_LABEL.to_string(),
            work_dir: work_dir.to_path_buf(),
            fps: self.config.output.fps,
        };

        let spinner = self.spinner("Rendering captioned video");
        let render_start = Instant::now();
        let rendered = self.media.render(&job).await;
        spinner.finish_and_clear();
        rendered.map_err(|e| AppError::media(Stage::Compositing, e))?;

        info!(
            "Captioned video written to {:?} in {}",
            output_video,
            Self::format_duration(render_start.elapsed())
        );
        Ok(blocks.len())
    }

    fn spinner(&self, message: &str) -> ProgressBar {
        let spinner = self.progress.add(ProgressBar::new_spinner());
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        spinner.set_style(style);
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(120));
        spinner
    }

    /// Format a duration for log messages
    pub fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
