use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{
    cast::Cast,
    foundation::error::{BubblecastError, BubblecastResult},
};

/// Paths, tools and cast for one pipeline run.
///
/// Defaults reproduce the fixed working-directory layout (`script.txt`, `chat_bubbles/`,
/// `audio/`, `gameplay.mp4` → `final_video.mp4`). A JSON file may override any subset of fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub script: PathBuf,
    pub bubbles_dir: PathBuf,
    pub audio_dir: PathBuf,
    /// Intermediate image-only video (must be an alpha-capable container).
    pub silent_video: PathBuf,
    /// Intermediate concatenated speech.
    pub combined_audio: PathBuf,
    pub conversation_video: PathBuf,
    pub background_video: PathBuf,
    pub final_video: PathBuf,

    pub font: PathBuf,
    pub font_size: f32,
    pub canvas_width: u32,
    pub canvas_height: u32,

    /// Speech program invoked once per line.
    pub tts_program: String,
    pub ffmpeg_program: String,
    pub ffprobe_program: String,

    pub cast: Cast,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            script: PathBuf::from("script.txt"),
            bubbles_dir: PathBuf::from("chat_bubbles"),
            audio_dir: PathBuf::from("audio"),
            silent_video: PathBuf::from("conversation_video_no_audio.webm"),
            combined_audio: PathBuf::from("conversation.mp3"),
            conversation_video: PathBuf::from("conversation_video.mkv"),
            background_video: PathBuf::from("gameplay.mp4"),
            final_video: PathBuf::from("final_video.mp4"),
            font: PathBuf::from("OpenSans-Regular.ttf"),
            font_size: 24.0,
            canvas_width: 800,
            canvas_height: 100,
            tts_program: "espeak".to_string(),
            ffmpeg_program: "ffmpeg".to_string(),
            ffprobe_program: "ffprobe".to_string(),
            cast: Cast::default(),
        }
    }
}

impl PipelineConfig {
    /// Load a (possibly partial) JSON config file.
    pub fn from_json_file(path: &Path) -> BubblecastResult<Self> {
        let f = File::open(path).map_err(|e| {
            BubblecastError::resource(format!("failed to open config '{}': {e}", path.display()))
        })?;
        let cfg: Self = serde_json::from_reader(BufReader::new(f)).map_err(|e| {
            BubblecastError::validation(format!("invalid config '{}': {e}", path.display()))
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Rebase every relative path onto `root`. Absolute paths are kept.
    pub fn rooted_at(mut self, root: &Path) -> Self {
        for p in [
            &mut self.script,
            &mut self.bubbles_dir,
            &mut self.audio_dir,
            &mut self.silent_video,
            &mut self.combined_audio,
            &mut self.conversation_video,
            &mut self.background_video,
            &mut self.final_video,
            &mut self.font,
        ] {
            if p.is_relative() {
                *p = root.join(&*p);
            }
        }
        self
    }

    pub fn validate(&self) -> BubblecastResult<()> {
        if self.canvas_width == 0 || self.canvas_height == 0 {
            return Err(BubblecastError::validation(
                "canvas width/height must be non-zero",
            ));
        }
        if self.canvas_width > u32::from(u16::MAX) || self.canvas_height > u32::from(u16::MAX) {
            return Err(BubblecastError::validation(
                "canvas width/height must fit in 16 bits",
            ));
        }
        if !self.canvas_width.is_multiple_of(2) || !self.canvas_height.is_multiple_of(2) {
            // yuva420p subsamples chroma 2x2.
            return Err(BubblecastError::validation(
                "canvas width/height must be even (required for yuva420p output)",
            ));
        }
        if !self.font_size.is_finite() || self.font_size <= 0.0 {
            return Err(BubblecastError::validation(
                "font_size must be finite and > 0",
            ));
        }
        for (name, program) in [
            ("tts_program", &self.tts_program),
            ("ffmpeg_program", &self.ffmpeg_program),
            ("ffprobe_program", &self.ffprobe_program),
        ] {
            if program.trim().is_empty() {
                return Err(BubblecastError::validation(format!(
                    "{name} must be non-empty"
                )));
            }
        }
        Ok(())
    }
}
