/*!
 * Integration tests for the captioning pipeline
 */

use anyhow::Result;
use indicatif::{MultiProgress, ProgressDrawTarget};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use autocaption::app_config::{CaptionStyle, Config, ExecutionMode};
use autocaption::errors::{AppError, Stage};
use autocaption::layout::FrameSize;
use autocaption::transcript::Transcript;
use autocaption::transcription::mock::MockTranscriber;
use autocaption::{CaptionOutputs, CaptionRequest, Controller};

use crate::common::mock_measurer::FixedAdvanceMeasurer;
use crate::common::mock_media::RecordingMediaBackend;
use crate::common::{self, sample_words, word};

const FRAME: FrameSize = FrameSize { width: 1280, height: 720 };

fn controller(config: Config, media: &Arc<RecordingMediaBackend>) -> Controller {
    common::init_test_logging();
    Controller::new(config, media.clone())
        .with_measurer(Arc::new(FixedAdvanceMeasurer::default()))
        .with_progress(MultiProgress::with_draw_target(ProgressDrawTarget::hidden()))
}

fn request(dir: &Path, transcript: Option<&Path>, force_overwrite: bool) -> Result<CaptionRequest> {
    Ok(CaptionRequest {
        input_video: common::create_test_video(dir, "talk.mp4")?,
        transcript_input: transcript.map(Path::to_path_buf),
        output_dir: dir.join("out"),
        force_overwrite,
    })
}

fn stage_of(err: &anyhow::Error) -> Option<Stage> {
    err.downcast_ref::<AppError>().map(AppError::stage)
}

fn cleanup(outputs: &CaptionOutputs) {
    let _ = fs::remove_dir_all(&outputs.work_dir);
}

/// Test a full run from an existing transcript
#[tokio::test]
async fn test_run_withTranscriptInput_shouldRenderWithoutTranscribing() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let transcript = common::create_test_transcript(temp_dir.path(), "edited.json", &sample_words())?;
    let media = Arc::new(RecordingMediaBackend::new(FRAME));

    let outputs = controller(Config::default(), &media)
        .run(&request(temp_dir.path(), Some(&transcript), false)?)
        .await?;

    assert_eq!(media.calls(), vec!["probe", "render"]);
    assert_eq!(outputs.line_count, 2);
    assert_eq!(outputs.execution, None);

    let video = outputs.video.clone().unwrap();
    assert_eq!(video, temp_dir.path().join("out").join("talk.captioned.mp4"));
    assert!(video.exists());

    let job = &media.jobs()[0];
    assert_eq!(job.fps, 24);
    assert!(job.filter_graph.starts_with("[0:v]"));
    assert!(job.filter_graph.contains("text=HELLO:"));
    assert!(job.filter_graph.contains("text=TEST:"));
    assert!(job.filter_graph.ends_with(&format!("[{}]", job.output_label)));

    // The transcript is re-written next to the video
    let written = Transcript::load(outputs.transcript.clone().unwrap())?;
    assert_eq!(written.words(), sample_words().as_slice());

    cleanup(&outputs);
    Ok(())
}

/// Test a full run that transcribes the audio first
#[tokio::test]
async fn test_run_withoutTranscript_shouldExtractAudioAndTranscribe() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let media = Arc::new(RecordingMediaBackend::new(FRAME));
    let transcriber = Arc::new(MockTranscriber::working(vec![
        word(" hello", 0.0, 0.5),
        word(" world", 0.6, 1.0),
    ]));

    let outputs = controller(Config::default(), &media)
        .with_transcriber(transcriber.clone())
        .run(&request(temp_dir.path(), None, false)?)
        .await?;

    assert_eq!(media.calls(), vec!["extract_audio", "probe", "render"]);
    assert_eq!(transcriber.call_count(), 1);
    assert_eq!(transcriber.requested_audio(), vec![outputs.work_dir.join("audio.wav")]);
    assert_eq!(outputs.execution, Some(ExecutionMode::Gpu));
    assert_eq!(outputs.line_count, 1);

    let written = Transcript::load(outputs.transcript.clone().unwrap())?;
    let texts: Vec<&str> = written.words().iter().map(|w| w.text.as_str()).collect();
    assert_eq!(texts, vec!["HELLO", "WORLD"]);

    cleanup(&outputs);
    Ok(())
}

/// Test that a CPU fallback is reported
#[tokio::test]
async fn test_run_withGpuFallback_shouldReportCpuExecution() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let media = Arc::new(RecordingMediaBackend::new(FRAME));

    let outputs = controller(Config::default(), &media)
        .with_transcriber(Arc::new(MockTranscriber::gpu_fallback(sample_words())))
        .run(&request(temp_dir.path(), None, false)?)
        .await?;

    assert_eq!(outputs.execution, Some(ExecutionMode::Cpu));
    assert!(outputs.video.is_some());
    cleanup(&outputs);
    Ok(())
}

/// Test that only the transcript is produced when video output is off
#[tokio::test]
async fn test_run_withVideoDisabled_shouldOnlyWriteTranscript() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let media = Arc::new(RecordingMediaBackend::new(FRAME));
    let mut config = Config::default();
    config.output.video = false;

    let outputs = Controller::new(config, media.clone())
        .with_progress(MultiProgress::with_draw_target(ProgressDrawTarget::hidden()))
        .with_transcriber(Arc::new(MockTranscriber::working(sample_words())))
        .run(&request(temp_dir.path(), None, false)?)
        .await?;

    assert_eq!(media.calls(), vec!["extract_audio"]);
    assert!(outputs.video.is_none());
    assert!(outputs.transcript.unwrap().exists());
    let _ = fs::remove_dir_all(&outputs.work_dir);
    Ok(())
}

/// Test that existing outputs survive unless overwriting is forced
#[tokio::test]
async fn test_run_withExistingOutputs_shouldSkipUnlessForced() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let transcript = common::create_test_transcript(temp_dir.path(), "edited.json", &sample_words())?;
    let out_dir = temp_dir.path().join("out");
    fs::create_dir_all(&out_dir)?;
    let existing_video = common::create_test_file(&out_dir, "talk.captioned.mp4", "old video")?;
    let existing_transcript = common::create_test_file(&out_dir, "talk.transcript.json", "[]")?;

    let media = Arc::new(RecordingMediaBackend::new(FRAME));
    let outputs = controller(Config::default(), &media)
        .run(&request(temp_dir.path(), Some(&transcript), false)?)
        .await?;

    assert!(outputs.video.is_none());
    assert!(outputs.transcript.is_none());
    assert!(media.calls().is_empty());
    assert_eq!(fs::read_to_string(&existing_video)?, "old video");
    assert_eq!(fs::read_to_string(&existing_transcript)?, "[]");
    cleanup(&outputs);

    let outputs = controller(Config::default(), &media)
        .run(&request(temp_dir.path(), Some(&transcript), true)?)
        .await?;

    assert_eq!(fs::read_to_string(&existing_video)?, "captioned");
    assert_eq!(Transcript::load(&existing_transcript)?.len(), sample_words().len());
    cleanup(&outputs);
    Ok(())
}

/// Test that the input transcript is never rewritten onto itself
#[tokio::test]
async fn test_run_withTranscriptAtOutputPath_shouldLeaveItUntouched() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let out_dir = temp_dir.path().join("out");
    fs::create_dir_all(&out_dir)?;
    let hand_written = r#"[{"word": "HELLO", "start": 0, "end": 0.5}]"#;
    let transcript = common::create_test_file(&out_dir, "talk.transcript.json", hand_written)?;

    let media = Arc::new(RecordingMediaBackend::new(FRAME));
    let outputs = controller(Config::default(), &media)
        .run(&request(temp_dir.path(), Some(&transcript), true)?)
        .await?;

    assert_eq!(outputs.transcript.as_deref(), Some(transcript.as_path()));
    assert_eq!(fs::read_to_string(&transcript)?, hand_written);
    cleanup(&outputs);
    Ok(())
}

/// Test that an invalid style aborts before any media work
#[tokio::test]
async fn test_run_withRtlAndLatinFont_shouldFailInConfiguration() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let transcript = common::create_test_transcript(temp_dir.path(), "edited.json", &sample_words())?;
    let media = Arc::new(RecordingMediaBackend::new(FRAME));
    let mut config = Config::default();
    config.caption = CaptionStyle {
        right_to_left: true,
        ..CaptionStyle::default()
    };

    let err = controller(config, &media)
        .run(&request(temp_dir.path(), Some(&transcript), false)?)
        .await
        .unwrap_err();

    assert_eq!(stage_of(&err), Some(Stage::Configuration));
    assert!(media.calls().is_empty());
    Ok(())
}

/// Test that a missing input video is an input error
#[tokio::test]
async fn test_run_withMissingVideo_shouldFailWithInputError() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let media = Arc::new(RecordingMediaBackend::new(FRAME));
    let request = CaptionRequest {
        input_video: temp_dir.path().join("missing.mp4"),
        transcript_input: None,
        output_dir: temp_dir.path().to_path_buf(),
        force_overwrite: false,
    };

    let err = controller(Config::default(), &media)
        .with_transcriber(Arc::new(MockTranscriber::working(sample_words())))
        .run(&request)
        .await
        .unwrap_err();

    assert_eq!(stage_of(&err), Some(Stage::Input));
    assert!(err.to_string().contains("missing.mp4"));
    Ok(())
}

/// Test that a transcription failure names its stage
#[tokio::test]
async fn test_run_withFailingTranscriber_shouldFailInTranscription() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let media = Arc::new(RecordingMediaBackend::new(FRAME));

    let err = controller(Config::default(), &media)
        .with_transcriber(Arc::new(MockTranscriber::failing()))
        .run(&request(temp_dir.path(), None, false)?)
        .await
        .unwrap_err();

    assert_eq!(stage_of(&err), Some(Stage::Transcription));
    Ok(())
}

/// Test that an encoder failure names the compositing stage
#[tokio::test]
async fn test_run_withFailingRender_shouldFailInCompositing() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let transcript = common::create_test_transcript(temp_dir.path(), "edited.json", &sample_words())?;
    let media = Arc::new(RecordingMediaBackend::failing_render(FRAME));

    let err = controller(Config::default(), &media)
        .run(&request(temp_dir.path(), Some(&transcript), false)?)
        .await
        .unwrap_err();

    assert_eq!(stage_of(&err), Some(Stage::Compositing));
    assert!(err.to_string().contains("Invalid argument"));
    Ok(())
}

/// Test that an empty transcript still produces a video without captions
#[test]
fn test_run_withEmptyTranscript_shouldPassVideoThrough() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let transcript = common::create_test_transcript(temp_dir.path(), "empty.json", &[])?;
    let media = Arc::new(RecordingMediaBackend::new(FRAME));
    let request = request(temp_dir.path(), Some(&transcript), false)?;

    let outputs = tokio_test::block_on(async { controller(Config::default(), &media).run(&request).await })?;

    assert_eq!(outputs.line_count, 0);
    assert_eq!(media.jobs()[0].filter_graph, "[0:v]null[captioned]");
    cleanup(&outputs);
    Ok(())
}
