use std::path::{Path, PathBuf};

use anyhow::Context as _;
use bubblecast::{Ffprobe, Pipeline, PipelineConfig, Stage};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "bubblecast",
    version,
    about = "Render a chat-bubble conversation video from a `Speaker: text` script"
)]
struct Cli {
    #[command(flatten)]
    paths: PathArgs,

    /// Log per-line and per-command detail (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Stage to run. Without one, the whole pipeline runs.
    #[command(subcommand)]
    cmd: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run all stages: bubbles, speech, compose, overlay.
    Run,
    /// Render one chat-bubble PNG per script line.
    Bubbles,
    /// Synthesize one speech WAV per script line.
    Speak,
    /// Mux bubbles and speech into the conversation video (requires `ffmpeg`).
    Compose,
    /// Overlay the conversation video on the background video (requires `ffmpeg`).
    Overlay,
    /// Print duration and streams of a media file (requires `ffprobe`).
    Probe {
        /// Media file to inspect.
        file: PathBuf,
    },
}

#[derive(Args, Debug)]
struct PathArgs {
    /// JSON config file; flags below override its fields.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory that relative paths are resolved against.
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Input script.
    #[arg(long, global = true)]
    script: Option<PathBuf>,

    /// Output directory for bubble images.
    #[arg(long, global = true)]
    bubbles_dir: Option<PathBuf>,

    /// Output directory for speech clips.
    #[arg(long, global = true)]
    audio_dir: Option<PathBuf>,

    /// Conversation video (compose output, overlay input).
    #[arg(long, global = true)]
    conversation: Option<PathBuf>,

    /// Background video.
    #[arg(long, global = true)]
    background: Option<PathBuf>,

    /// Final composited video.
    #[arg(long, short = 'o', global = true)]
    out: Option<PathBuf>,

    /// Font file used for bubble text.
    #[arg(long, global = true)]
    font: Option<PathBuf>,

    /// Text-to-speech program (espeak-compatible arguments).
    #[arg(long, global = true)]
    tts: Option<String>,

    /// ffmpeg executable.
    #[arg(long, global = true)]
    ffmpeg: Option<String>,
}

impl PathArgs {
    fn resolve(&self) -> anyhow::Result<PipelineConfig> {
        let mut cfg = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)?,
            None => PipelineConfig::default(),
        };

        let overrides = [
            (&self.script, &mut cfg.script),
            (&self.bubbles_dir, &mut cfg.bubbles_dir),
            (&self.audio_dir, &mut cfg.audio_dir),
            (&self.conversation, &mut cfg.conversation_video),
            (&self.background, &mut cfg.background_video),
            (&self.out, &mut cfg.final_video),
            (&self.font, &mut cfg.font),
        ];
        for (arg, field) in overrides {
            if let Some(v) = arg {
                *field = v.clone();
            }
        }
        if let Some(tts) = &self.tts {
            cfg.tts_program = tts.clone();
        }
        if let Some(ffmpeg) = &self.ffmpeg {
            cfg.ffmpeg_program = ffmpeg.clone();
        }

        if let Some(root) = &self.root {
            cfg = cfg.rooted_at(root);
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cfg = cli.paths.resolve().context("resolve configuration")?;

    let stages: &[Stage] = match cli.cmd {
        None | Some(Command::Run) => &Stage::ALL,
        Some(Command::Bubbles) => &[Stage::Bubbles],
        Some(Command::Speak) => &[Stage::Speech],
        Some(Command::Compose) => &[Stage::Compose],
        Some(Command::Overlay) => &[Stage::Overlay],
        Some(Command::Probe { file }) => return cmd_probe(&cfg, &file),
    };

    let report = Pipeline::new(&cfg)
        .run_stages(stages)
        .with_context(|| {
            let names: Vec<_> = stages.iter().map(|s| s.name()).collect();
            format!("bubblecast {}", names.join(" → "))
        })?;

    if !report.bubbles.is_empty() {
        eprintln!(
            "wrote {} bubbles to {}",
            report.bubbles.len(),
            cfg.bubbles_dir.display()
        );
    }
    if !report.clips.is_empty() {
        eprintln!(
            "wrote {} clips to {}",
            report.clips.len(),
            cfg.audio_dir.display()
        );
    }
    if let Some(compose) = &report.compose {
        eprintln!("wrote {}", compose.output.display());
    }
    if let Some(out) = &report.final_video {
        eprintln!("wrote {}", out.display());
    }
    Ok(())
}

fn cmd_probe(cfg: &PipelineConfig, file: &Path) -> anyhow::Result<()> {
    let info = Ffprobe::new(&cfg.ffprobe_program)
        .probe(file)
        .with_context(|| format!("probe '{}'", file.display()))?;
    println!("{}: {:.3}s", info.source_path.display(), info.duration_sec);
    for (i, s) in info.streams.iter().enumerate() {
        let size = match (s.width, s.height) {
            (Some(w), Some(h)) => format!(" {w}x{h}"),
            _ => String::new(),
        };
        println!(
            "  #{i} {} {}{size}",
            s.codec_type,
            s.codec_name.as_deref().unwrap_or("?")
        );
    }
    Ok(())
}
