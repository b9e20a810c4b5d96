//! Conversation composer: bubble images + speech clips → one muxed clip with alpha.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::{
    audio::concat::{concat_clips, list_numbered_clips},
    encode::ffmpeg::Ffmpeg,
    foundation::{
        error::{BubblecastError, BubblecastResult},
        fs::{ensure_parent_dir, remove_stale},
    },
};

/// One bubble per second.
pub const BUBBLES_PER_SECOND: u32 = 1;

#[derive(Clone, Debug)]
pub struct ComposeOpts {
    pub bubbles_dir: PathBuf,
    pub audio_dir: PathBuf,
    /// Intermediate image-only video; removed before it is regenerated.
    pub silent_video: PathBuf,
    /// Intermediate concatenated speech.
    pub combined_audio: PathBuf,
    pub output: PathBuf,
    pub fps: u32,
    /// Script line count, when known. Bubble and clip counts must then match it exactly.
    pub expected_lines: Option<usize>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ComposeReport {
    /// Bubble images picked up by the encoder.
    pub frames: usize,
    /// Audio clips concatenated.
    pub clips: usize,
    pub audio_sec: f64,
    pub output: PathBuf,
}

impl ComposeReport {
    pub fn video_sec(&self, fps: u32) -> f64 {
        if fps == 0 {
            0.0
        } else {
            self.frames as f64 / f64::from(fps)
        }
    }
}

/// Count `1.png, 2.png, ...` up to the first gap, which is where the image-sequence demuxer
/// stops reading.
pub fn count_sequence_frames(dir: &Path) -> usize {
    (1..)
        .take_while(|i| dir.join(format!("{i}.png")).is_file())
        .count()
}

/// Build the conversation clip.
///
/// 1. numbered PNGs → silent VP9/yuva420p video at `fps` (stale file removed first)
/// 2. numbered WAVs, in numeric order → one MP3
/// 3. mux: video copied, audio to AAC, cut to the shorter stream
#[tracing::instrument(skip_all, fields(output = %opts.output.display()))]
pub fn compose_conversation(
    ffmpeg: &Ffmpeg,
    opts: &ComposeOpts,
) -> BubblecastResult<ComposeReport> {
    if opts.fps == 0 {
        return Err(BubblecastError::validation("compose fps must be non-zero"));
    }
    let frames = count_sequence_frames(&opts.bubbles_dir);
    if frames == 0 {
        return Err(BubblecastError::resource(format!(
            "no bubble images ('1.png', ...) in '{}'",
            opts.bubbles_dir.display()
        )));
    }

    let clips = list_numbered_clips(&opts.audio_dir)?;
    if let Some(lines) = opts.expected_lines
        && (frames != lines || clips.len() != lines)
    {
        return Err(BubblecastError::validation(format!(
            "script has {lines} lines but found {frames} bubble images and {} clips",
            clips.len()
        )));
    }

    if remove_stale(&opts.silent_video)? {
        info!(path = %opts.silent_video.display(), "removed stale intermediate video");
    }
    ensure_parent_dir(&opts.silent_video)?;
    ffmpeg.run(
        ffmpeg.image_sequence_cmd(&opts.bubbles_dir, opts.fps, &opts.silent_video),
        "image sequence",
    )?;
    info!(frames, path = %opts.silent_video.display(), "encoded bubble video");

    let pcm = concat_clips(clips.iter().map(|c| c.path.as_path()))?;
    ffmpeg.encode_pcm_mp3(&pcm, &opts.combined_audio)?;
    info!(
        clips = clips.len(),
        seconds = pcm.duration_sec(),
        path = %opts.combined_audio.display(),
        "encoded combined speech"
    );

    ensure_parent_dir(&opts.output)?;
    ffmpeg.run(
        ffmpeg.mux_cmd(&opts.silent_video, &opts.combined_audio, &opts.output),
        "mux",
    )?;

    let report = ComposeReport {
        frames,
        clips: clips.len(),
        audio_sec: pcm.duration_sec(),
        output: opts.output.clone(),
    };
    if clips.len() != frames {
        warn!(
            frames,
            clips = clips.len(),
            "bubble and clip counts differ; speech and bubbles will drift apart"
        );
    }
    let video_sec = report.video_sec(opts.fps);
    if report.audio_sec > video_sec {
        warn!(
            audio_sec = report.audio_sec,
            video_sec, "speech outlasts the bubble slideshow and is cut at the end"
        );
    }
    info!(path = %opts.output.display(), "muxed conversation video");
    Ok(report)
}
