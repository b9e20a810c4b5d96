//! Per-line speech synthesis through an external text-to-speech program.
//!
//! Text is always passed as a single argv element, never through a shell, so quotes, `$`,
//! backticks and `;` reach the speech tool verbatim.

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use tracing::{debug, info};

use crate::{
    cast::Cast,
    foundation::{
        error::{BubblecastError, BubblecastResult},
        fs::{ensure_dir, prune_numbered_above, remove_stale},
    },
    script::{Script, ScriptLine},
};

/// Something that turns text into a WAV file.
pub trait SpeechEngine {
    fn synthesize(&mut self, voice: &str, text: &str, out: &Path) -> BubblecastResult<()>;
}

/// Runs an espeak-compatible program: `<program> -v <voice> -w <out.wav> <text>`.
#[derive(Clone, Debug)]
pub struct CommandSpeechEngine {
    program: OsString,
}

impl CommandSpeechEngine {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn espeak() -> Self {
        Self::new("espeak")
    }

    pub fn command(&self, voice: &str, text: &str, out: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(["-v", voice, "-w"])
            .arg(out)
            // End of options: a leading `-` in the utterance is spoken, not parsed.
            .arg("--")
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd
    }
}

impl SpeechEngine for CommandSpeechEngine {
    fn synthesize(&mut self, voice: &str, text: &str, out: &Path) -> BubblecastResult<()> {
        let program = self.program.to_string_lossy().into_owned();
        remove_stale(out)?;
        let output = self.command(voice, text, out).output().map_err(|e| {
            BubblecastError::tool(format!(
                "failed to spawn {program} (is it installed and on PATH?): {e}"
            ))
        })?;
        if !output.status.success() {
            return Err(BubblecastError::tool(format!(
                "{program} exited with status {} for '{}': {}",
                output.status,
                out.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        if !out.is_file() {
            return Err(BubblecastError::tool(format!(
                "{program} exited successfully but wrote no clip to '{}'",
                out.display()
            )));
        }
        Ok(())
    }
}

/// Path of the speech clip for a script line.
pub fn clip_path(dir: &Path, line: &ScriptLine) -> PathBuf {
    dir.join(format!("{}.wav", line.index))
}

/// Synthesize `<out_dir>/<index>.wav` for every script line, one process at a time.
///
/// The first failure aborts the stage; clips already written are left in place. Once every line
/// has a clip, clips numbered past the last line are removed.
#[tracing::instrument(skip_all, fields(lines = script.len(), out_dir = %out_dir.display()))]
pub fn synthesize_script(
    script: &Script,
    cast: &Cast,
    engine: &mut dyn SpeechEngine,
    out_dir: &Path,
) -> BubblecastResult<Vec<PathBuf>> {
    ensure_dir(out_dir)?;

    let mut written = Vec::with_capacity(script.len());
    for line in script {
        let voice = &cast.profile_of(&line.speaker).voice;
        let path = clip_path(out_dir, line);
        debug!(index = line.index, speaker = %line.speaker, %voice, "synthesizing");
        engine.synthesize(voice, &line.text, &path)?;
        written.push(path);
    }

    let pruned = prune_numbered_above(out_dir, "wav", written.len())?;
    info!(count = written.len(), pruned, "synthesized speech clips");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<(String, String, PathBuf)>,
        fail_on: Option<usize>,
    }

    impl SpeechEngine for Recorder {
        fn synthesize(&mut self, voice: &str, text: &str, out: &Path) -> BubblecastResult<()> {
            if self.fail_on == Some(self.calls.len() + 1) {
                return Err(BubblecastError::tool("boom"));
            }
            self.calls
                .push((voice.to_string(), text.to_string(), out.to_path_buf()));
            std::fs::write(out, b"RIFF").unwrap();
            Ok(())
        }
    }

    #[test]
    fn command_passes_text_as_one_argument() {
        let engine = CommandSpeechEngine::espeak();
        let nasty = r#"he said "hi"; rm -rf $HOME `whoami`"#;
        let cmd = engine.command("en-us", nasty, Path::new("audio/1.wav"));
        assert_eq!(cmd.get_program(), "espeak");
        let args: Vec<_> = cmd.get_args().collect();
        assert_eq!(args, ["-v", "en-us", "-w", "audio/1.wav", "--", nasty]);
    }

    #[test]
    fn leading_dash_text_follows_the_option_terminator() {
        let engine = CommandSpeechEngine::espeak();
        let cmd = engine.command("en-uk-rp", "-h is what I typed", Path::new("2.wav"));
        let args: Vec<_> = cmd.get_args().collect();
        assert_eq!(args, ["-v", "en-uk-rp", "-w", "2.wav", "--", "-h is what I typed"]);
    }

    #[cfg(unix)]
    #[test]
    fn clean_exit_without_a_clip_is_a_tool_error() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("2.wav");
        // Left over from an earlier run; must not count as this run's clip.
        std::fs::write(&out, b"RIFF").unwrap();

        // `true` accepts any arguments, exits 0 and writes nothing.
        let mut engine = CommandSpeechEngine::new("true");
        let err = engine
            .synthesize("en-uk-rp", "-h is what I typed", &out)
            .unwrap_err();
        match err {
            BubblecastError::Tool(msg) => assert!(msg.contains("wrote no clip"), "{msg}"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(!out.exists());
    }

    #[cfg(unix)]
    #[test]
    fn script_stage_fails_when_the_tool_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let script = Script::parse("Zoe: hello\nSam: -h is what I typed\nZoe: bye").unwrap();
        let mut engine = CommandSpeechEngine::new("true");
        let err =
            synthesize_script(&script, &Cast::default(), &mut engine, dir.path()).unwrap_err();
        assert!(matches!(err, BubblecastError::Tool(_)));
        assert!(!dir.path().join("1.wav").exists());
    }

    #[test]
    fn voices_follow_the_cast_and_files_follow_the_index() {
        let dir = tempfile::tempdir().unwrap();
        let script = Script::parse("Zoe: hello\nSam: hi there\nZOE: bye").unwrap();
        let mut rec = Recorder::default();

        let out = synthesize_script(&script, &Cast::default(), &mut rec, dir.path()).unwrap();

        assert_eq!(out.len(), 3);
        let voices: Vec<_> = rec.calls.iter().map(|c| c.0.as_str()).collect();
        assert_eq!(voices, ["en-us", "en-uk-rp", "en-us"]);
        assert_eq!(rec.calls[1].1, "hi there");
        for (i, p) in out.iter().enumerate() {
            assert_eq!(p, &dir.path().join(format!("{}.wav", i + 1)));
            assert!(p.is_file());
        }
    }

    #[test]
    fn first_failure_stops_later_lines() {
        let dir = tempfile::tempdir().unwrap();
        let script = Script::parse("Zoe: a\nSam: b\nZoe: c").unwrap();
        let mut rec = Recorder {
            fail_on: Some(2),
            ..Recorder::default()
        };

        assert!(synthesize_script(&script, &Cast::default(), &mut rec, dir.path()).is_err());
        assert_eq!(rec.calls.len(), 1);
        assert!(!dir.path().join("3.wav").exists());
    }

    #[test]
    fn clips_from_a_longer_earlier_run_are_removed() {
        let dir = tempfile::tempdir().unwrap();
        for n in 1..=4 {
            std::fs::write(dir.path().join(format!("{n}.wav")), b"old").unwrap();
        }
        let script = Script::parse("Zoe: a\nSam: b").unwrap();

        synthesize_script(&script, &Cast::default(), &mut Recorder::default(), dir.path())
            .unwrap();

        assert!(dir.path().join("2.wav").exists());
        assert!(!dir.path().join("3.wav").exists());
        assert!(!dir.path().join("4.wav").exists());
    }

    #[test]
    fn missing_program_is_a_tool_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = CommandSpeechEngine::new("bubblecast-no-such-tts-program");
        let err = engine
            .synthesize("en-us", "hi", &dir.path().join("1.wav"))
            .unwrap_err();
        assert!(matches!(err, BubblecastError::Tool(_)));
    }
}
