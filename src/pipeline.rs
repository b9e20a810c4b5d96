use std::{path::PathBuf, time::Instant};

use tracing::info;

use crate::{
    compose::{BUBBLES_PER_SECOND, ComposeOpts, ComposeReport, compose_conversation},
    config::PipelineConfig,
    encode::ffmpeg::Ffmpeg,
    foundation::error::{BubblecastError, BubblecastResult},
    overlay::overlay_conversation,
    render::bubble::{BubbleOpts, render_bubbles},
    script::Script,
    speech::{CommandSpeechEngine, SpeechEngine, synthesize_script},
};

/// Pipeline stages, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Bubbles,
    Speech,
    Compose,
    Overlay,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Bubbles, Stage::Speech, Stage::Compose, Stage::Overlay];

    pub fn name(self) -> &'static str {
        match self {
            Stage::Bubbles => "bubbles",
            Stage::Speech => "speech",
            Stage::Compose => "compose",
            Stage::Overlay => "overlay",
        }
    }
}

/// What a run produced.
#[derive(Clone, Debug, Default)]
pub struct RunReport {
    pub bubbles: Vec<PathBuf>,
    pub clips: Vec<PathBuf>,
    pub compose: Option<ComposeReport>,
    pub final_video: Option<PathBuf>,
}

/// One configured run: config, encoder and speech engine.
pub struct Pipeline<'a> {
    cfg: &'a PipelineConfig,
    ffmpeg: Ffmpeg,
    speech: Box<dyn SpeechEngine + 'a>,
}

impl<'a> Pipeline<'a> {
    pub fn new(cfg: &'a PipelineConfig) -> Self {
        Self {
            cfg,
            ffmpeg: Ffmpeg::new(&cfg.ffmpeg_program),
            speech: Box::new(CommandSpeechEngine::new(&cfg.tts_program)),
        }
    }

    /// Replace the speech engine (e.g. a different TTS backend).
    pub fn with_speech_engine(mut self, engine: impl SpeechEngine + 'a) -> Self {
        self.speech = Box::new(engine);
        self
    }

    fn load_script(&self) -> BubblecastResult<Script> {
        let script = Script::read(&self.cfg.script)?;
        if script.is_empty() {
            return Err(BubblecastError::validation(format!(
                "script '{}' has no lines",
                self.cfg.script.display()
            )));
        }
        Ok(script)
    }

    /// Run the given stages in order. The script is parsed up front, so a malformed line stops
    /// the run before any stage writes a file.
    pub fn run_stages(&mut self, stages: &[Stage]) -> BubblecastResult<RunReport> {
        self.cfg.validate()?;
        let needs_script = stages
            .iter()
            .any(|s| matches!(s, Stage::Bubbles | Stage::Speech));
        let script = if needs_script {
            Some(self.load_script()?)
        } else {
            None
        };

        let mut report = RunReport::default();
        for &stage in stages {
            let started = Instant::now();
            match (stage, script.as_ref()) {
                (Stage::Bubbles, Some(script)) => {
                    report.bubbles = render_bubbles(script, &self.cfg.cast, &self.bubble_opts())?;
                }
                (Stage::Speech, Some(script)) => {
                    report.clips = synthesize_script(
                        script,
                        &self.cfg.cast,
                        self.speech.as_mut(),
                        &self.cfg.audio_dir,
                    )?;
                }
                (Stage::Bubbles | Stage::Speech, None) => {
                    return Err(BubblecastError::validation("script was not loaded (bug)"));
                }
                (Stage::Compose, script) => {
                    let opts = self.compose_opts(script.map(Script::len));
                    report.compose = Some(compose_conversation(&self.ffmpeg, &opts)?);
                }
                (Stage::Overlay, _) => {
                    overlay_conversation(
                        &self.ffmpeg,
                        &self.cfg.background_video,
                        &self.cfg.conversation_video,
                        &self.cfg.final_video,
                    )?;
                    report.final_video = Some(self.cfg.final_video.clone());
                }
            }
            info!(
                stage = stage.name(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "stage finished"
            );
        }
        Ok(report)
    }

    pub fn run(&mut self) -> BubblecastResult<RunReport> {
        self.run_stages(&Stage::ALL)
    }

    fn bubble_opts(&self) -> BubbleOpts {
        BubbleOpts {
            out_dir: self.cfg.bubbles_dir.clone(),
            font: self.cfg.font.clone(),
            font_size: self.cfg.font_size,
            width: self.cfg.canvas_width,
            height: self.cfg.canvas_height,
        }
    }

    fn compose_opts(&self, expected_lines: Option<usize>) -> ComposeOpts {
        ComposeOpts {
            bubbles_dir: self.cfg.bubbles_dir.clone(),
            audio_dir: self.cfg.audio_dir.clone(),
            silent_video: self.cfg.silent_video.clone(),
            combined_audio: self.cfg.combined_audio.clone(),
            output: self.cfg.conversation_video.clone(),
            fps: BUBBLES_PER_SECOND,
            expected_lines,
        }
    }
}

/// Run all four stages with the configured tools.
pub fn run(cfg: &PipelineConfig) -> BubblecastResult<RunReport> {
    Pipeline::new(cfg).run()
}
