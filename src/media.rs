/*!
 * Media tooling: probing, audio extraction and final encoding.
 *
 * The pipeline talks to a `MediaBackend`; `FfmpegBackend` implements it
 * with the ffprobe/ffmpeg command-line tools.
 */

use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error};
use serde_json::Value;
use tokio::process::Command;

use crate::errors::MediaError;
use crate::layout::FrameSize;

/// Everything needed to burn captions into a video
#[derive(Debug, Clone, PartialEq)]
pub struct RenderJob {
    pub input_video: PathBuf,
    pub output_video: PathBuf,
    /// Filter graph reading `[0:v]` and writing the captioned stream label
    pub filter_graph: String,
    /// Label of the captioned video stream
    pub output_label: String,
    /// Directory for intermediate files
    pub work_dir: PathBuf,
    pub fps: u32,
}

/// Media operations the pipeline depends on
#[async_trait]
pub trait MediaBackend: Send + Sync + Debug {
    /// Pixel size of the first video stream, as displayed
    async fn probe_frame_size(&self, video: &Path) -> Result<FrameSize, MediaError>;

    /// Extract the audio track as 16 kHz mono PCM WAV
    async fn extract_audio(&self, video: &Path, audio: &Path) -> Result<(), MediaError>;

    /// Encode the captioned video with the original audio
    async fn render(&self, job: &RenderJob) -> Result<(), MediaError>;
}

/// ffmpeg/ffprobe implementation of `MediaBackend`
#[derive(Debug, Clone)]
pub struct FfmpegBackend {
    probe_timeout: Duration,
    audio_timeout: Duration,
    render_timeout: Duration,
}

impl Default for FfmpegBackend {
    fn default() -> Self {
        Self {
            probe_timeout: Duration::from_secs(60),
            audio_timeout: Duration::from_secs(600),
            render_timeout: Duration::from_secs(6 * 3600),
        }
    }
}

impl FfmpegBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail early if the tools are not installed
    pub fn check_available() -> Result<(), MediaError> {
        for tool in ["ffmpeg", "ffprobe"] {
            which::which(tool).map_err(|e| MediaError::Spawn {
                tool,
                message: format!("not found in PATH: {}", e),
            })?;
        }
        Ok(())
    }

    async fn run_tool(tool: &'static str, args: Vec<String>, timeout: Duration) -> Result<Output, MediaError> {
        debug!("Running {} {}", tool, args.join(" "));

        let future = Command::new(tool).args(&args).kill_on_drop(true).output();
        let output = tokio::select! {
            result = future => {
                result.map_err(|e| MediaError::Spawn { tool, message: e.to_string() })?
            },
            _ = tokio::time::sleep(timeout) => {
                return Err(MediaError::Timeout { tool, secs: timeout.as_secs() });
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let filtered = filter_ffmpeg_stderr(&stderr);
            error!("{} failed: {}", tool, filtered);
            return Err(MediaError::Failed { tool, message: filtered });
        }

        Ok(output)
    }
}

#[async_trait]
impl MediaBackend for FfmpegBackend {
    async fn probe_frame_size(&self, video: &Path) -> Result<FrameSize, MediaError> {
        let args = vec![
            "-v".to_string(),
            "quiet".to_string(),
            "-print_format".to_string(),
            "json".to_string(),
            "-show_streams".to_string(),
            "-select_streams".to_string(),
            "v:0".to_string(),
            video.to_string_lossy().into_owned(),
        ];
        let output = Self::run_tool("ffprobe", args, self.probe_timeout).await?;
        parse_probe_output(&String::from_utf8_lossy(&output.stdout))
    }

    async fn extract_audio(&self, video: &Path, audio: &Path) -> Result<(), MediaError> {
        let args = vec![
            "-y".to_string(),
            "-hide_banner".to_string(),
            "-i".to_string(),
            video.to_string_lossy().into_owned(),
            "-vn".to_string(),
            "-ar".to_string(),
            "16000".to_string(),
            "-ac".to_string(),
            "1".to_string(),
            "-c:a".to_string(),
            "pcm_s16le".to_string(),
            audio.to_string_lossy().into_owned(),
        ];
        Self::run_tool("ffmpeg", args, self.audio_timeout).await?;
        Ok(())
    }

    async fn render(&self, job: &RenderJob) -> Result<(), MediaError> {
        // Graphs with hundreds of drawtext filters overflow command lines
        let script_path = job.work_dir.join("captions.filtergraph");
        tokio::fs::write(&script_path, &job.filter_graph)
            .await
            .map_err(|e| MediaError::Spawn {
                tool: "ffmpeg",
                message: format!("failed to write filter script {}: {}", script_path.display(), e),
            })?;

        Self::run_tool("ffmpeg", render_args(job, &script_path), self.render_timeout).await?;
        Ok(())
    }
}

/// ffmpeg arguments for a render job whose graph is stored in `script_path`
pub fn render_args(job: &RenderJob, script_path: &Path) -> Vec<String> {
    let mut args = Vec::new();

    args.push("-y".to_string());
    args.push("-hide_banner".to_string());
    args.push("-i".to_string());
    args.push(job.input_video.to_string_lossy().into_owned());

    args.push("-filter_complex_script".to_string());
    args.push(script_path.to_string_lossy().into_owned());

    args.push("-map".to_string());
    args.push(format!("[{}]", job.output_label));
    args.push("-map".to_string());
    args.push("0:a?".to_string());

    // Encoding settings
    args.push("-r".to_string());
    args.push(job.fps.to_string());
    args.push("-c:v".to_string());
    args.push("libx264".to_string());
    args.push("-pix_fmt".to_string());
    args.push("yuv420p".to_string());
    args.push("-c:a".to_string());
    args.push("aac".to_string());
    args.push("-movflags".to_string());
    args.push("+faststart".to_string());
    args.push(job.output_video.to_string_lossy().into_owned());

    args
}

/// Read the displayed frame size from ffprobe's JSON output
///
/// Streams rotated by a quarter turn are displayed with width and height
/// swapped.
pub fn parse_probe_output(stdout: &str) -> Result<FrameSize, MediaError> {
    let unexpected = |message: String| MediaError::Unexpected { tool: "ffprobe", message };

    let json: Value = serde_json::from_str(stdout).map_err(|e| unexpected(e.to_string()))?;
    let stream = json
        .get("streams")
        .and_then(|s| s.as_array())
        .and_then(|s| s.first())
        .ok_or_else(|| unexpected("no video stream found".to_string()))?;

    let dimension = |key: &str| {
        stream
            .get(key)
            .and_then(|v| v.as_u64())
            .and_then(|v| u32::try_from(v).ok())
            .filter(|v| *v > 0)
            .ok_or_else(|| unexpected(format!("video stream has no valid {}", key)))
    };
    let width = dimension("width")?;
    let height = dimension("height")?;

    let rotation = stream
        .get("side_data_list")
        .and_then(|list| list.as_array())
        .and_then(|list| list.iter().find_map(|data| data.get("rotation").and_then(|r| r.as_i64())))
        .or_else(|| {
            stream
                .get("tags")
                .and_then(|t| t.get("rotate"))
                .and_then(|r| r.as_str())
                .and_then(|r| r.parse::<i64>().ok())
        })
        .unwrap_or(0);

    if rotation.rem_euclid(180) == 90 {
        Ok(FrameSize::new(height, width))
    } else {
        Ok(FrameSize::new(width, height))
    }
}

/// Filter ffmpeg stderr to only show meaningful error lines, stripping the
/// version banner, build configuration, and stream metadata noise.
pub fn filter_ffmpeg_stderr(stderr: &str) -> String {
    let noise_prefixes = [
        "ffmpeg version",
        "ffprobe version",
        "built with",
        "configuration:",
        "lib",
        "Input #",
        "Metadata:",
        "Duration:",
        "Stream #",
        "major_brand",
        "minor_version",
        "compatible_brands",
        "encoder",
        "handler_name",
        "creation_time",
        "Output #",
        "Stream mapping:",
        "Press [q]",
    ];

    let meaningful: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !noise_prefixes.iter().any(|p| line.starts_with(p)))
        .collect();

    if meaningful.is_empty() {
        "unknown ffmpeg error (stderr was empty after filtering)".to_string()
    } else {
        meaningful.join("\n")
    }
}
