use std::{
    ffi::OsString,
    io::{Read as _, Write as _},
    path::Path,
    process::{Command, Stdio},
};

use tracing::debug;

use crate::{
    audio::AudioPcm,
    foundation::{
        error::{BubblecastError, BubblecastResult},
        fs::ensure_parent_dir,
    },
};

/// Filter graph placing input 1 centered over input 0.
pub const CENTER_OVERLAY_FILTER: &str = "[0:v][1:v] overlay=(W-w)/2:(H-h)/2 [v]";

/// Handle to the system `ffmpeg` program.
///
/// We use the binary rather than linking FFmpeg to avoid native dev header/lib requirements.
#[derive(Clone, Debug)]
pub struct Ffmpeg {
    program: OsString,
}

impl Default for Ffmpeg {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl Ffmpeg {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Return `true` when the program can be invoked.
    pub fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    fn base(&self, overwrite: bool) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd.arg(if overwrite { "-y" } else { "-n" });
        cmd.args(["-loglevel", "error"]);
        cmd
    }

    /// Numbered PNGs (`<dir>/1.png`, `<dir>/2.png`, ...) → VP9 video with alpha.
    ///
    /// Never overwrites: callers remove a stale `out` first.
    pub fn image_sequence_cmd(&self, image_dir: &Path, fps: u32, out: &Path) -> Command {
        let mut cmd = self.base(false);
        cmd.args(["-framerate", &fps.to_string(), "-i"])
            .arg(image_dir.join("%d.png"))
            .args(["-c:v", "libvpx-vp9", "-pix_fmt", "yuva420p"])
            .arg(out);
        cmd
    }

    /// Raw `f32le` PCM on stdin → MP3.
    pub fn pcm_to_mp3_cmd(&self, sample_rate: u32, channels: u16, out: &Path) -> Command {
        let mut cmd = self.base(true);
        cmd.stdin(Stdio::piped());
        cmd.args([
            "-f",
            "f32le",
            "-ar",
            &sample_rate.to_string(),
            "-ac",
            &channels.to_string(),
            "-i",
            "pipe:0",
            "-c:a",
            "libmp3lame",
        ])
        .arg(out);
        cmd
    }

    /// Silent video + audio → one container. Video is copied, audio re-encoded to AAC, and the
    /// output ends with the shorter stream.
    pub fn mux_cmd(&self, video: &Path, audio: &Path, out: &Path) -> Command {
        let mut cmd = self.base(true);
        cmd.arg("-i")
            .arg(video)
            .arg("-i")
            .arg(audio)
            .args(["-c:v", "copy", "-c:a", "aac", "-shortest"])
            .arg(out);
        cmd
    }

    /// Composite `overlay` centered on `background`, keeping only the background audio
    /// (stream-copied).
    pub fn overlay_cmd(&self, background: &Path, overlay: &Path, out: &Path) -> Command {
        let mut cmd = self.base(true);
        cmd.arg("-i")
            .arg(background)
            // The native vp9 decoder drops the alpha plane; libvpx keeps it.
            .args(["-c:v", "libvpx-vp9", "-i"])
            .arg(overlay)
            .args([
                "-filter_complex",
                CENTER_OVERLAY_FILTER,
                "-map",
                "[v]",
                "-map",
                "0:a?",
                "-c:a",
                "copy",
            ])
            .arg(out);
        cmd
    }

    /// Run `cmd` to completion; non-zero exit becomes a tool error carrying stderr.
    pub fn run(&self, mut cmd: Command, what: &str) -> BubblecastResult<()> {
        debug!(?cmd, "running ffmpeg");
        let output = cmd.output().map_err(|e| spawn_error(&self.program, e))?;
        if !output.status.success() {
            return Err(BubblecastError::tool(format!(
                "ffmpeg ({what}) exited with status {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }

    /// Stream `pcm` into ffmpeg stdin and encode it as MP3 at `out`, overwriting.
    pub fn encode_pcm_mp3(&self, pcm: &AudioPcm, out: &Path) -> BubblecastResult<()> {
        if pcm.sample_rate == 0 || pcm.channels == 0 {
            return Err(BubblecastError::validation(
                "audio sample_rate/channels must be non-zero",
            ));
        }
        ensure_parent_dir(out)?;

        let mut cmd = self.pcm_to_mp3_cmd(pcm.sample_rate, pcm.channels, out);
        debug!(?cmd, "running ffmpeg");
        let mut child = cmd.spawn().map_err(|e| spawn_error(&self.program, e))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| BubblecastError::tool("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| BubblecastError::tool("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok::<_, std::io::Error>(stderr_bytes)
        });

        let write_result = stdin.write_all(&pcm.to_f32le_bytes());
        drop(stdin);

        let status = child.wait().map_err(|e| {
            BubblecastError::tool(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        let stderr_bytes = stderr_drain
            .join()
            .map_err(|_| BubblecastError::tool("ffmpeg stderr drain thread panicked"))?
            .map_err(|e| BubblecastError::tool(format!("ffmpeg stderr read failed: {e}")))?;

        if !status.success() {
            return Err(BubblecastError::tool(format!(
                "ffmpeg (audio encode) exited with status {status}: {}",
                String::from_utf8_lossy(&stderr_bytes).trim()
            )));
        }
        write_result.map_err(|e| {
            BubblecastError::tool(format!("failed to write audio to ffmpeg stdin: {e}"))
        })?;
        Ok(())
    }
}

fn spawn_error(program: &OsString, e: std::io::Error) -> BubblecastError {
    BubblecastError::tool(format!(
        "failed to spawn {} (is it installed and on PATH?): {e}",
        program.to_string_lossy()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(cmd: &Command) -> Vec<String> {
        cmd.get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn image_sequence_uses_alpha_codec_and_never_overwrites() {
        let cmd = Ffmpeg::default().image_sequence_cmd(
            Path::new("chat_bubbles"),
            1,
            Path::new("silent.webm"),
        );
        let a = args(&cmd);
        assert_eq!(a[0], "-n");
        let i = a.iter().position(|x| x == "-framerate").unwrap();
        assert_eq!(a[i + 1], "1");
        assert!(a.contains(&"chat_bubbles/%d.png".to_string()));
        assert!(a.windows(2).any(|w| w == ["-c:v", "libvpx-vp9"]));
        assert!(a.windows(2).any(|w| w == ["-pix_fmt", "yuva420p"]));
        assert_eq!(a.last().unwrap(), "silent.webm");
    }

    #[test]
    fn mux_copies_video_and_truncates_to_shortest() {
        let cmd = Ffmpeg::default().mux_cmd(
            Path::new("v.webm"),
            Path::new("a.mp3"),
            Path::new("out.mkv"),
        );
        let a = args(&cmd);
        assert_eq!(a[0], "-y");
        assert!(a.windows(2).any(|w| w == ["-c:v", "copy"]));
        assert!(a.windows(2).any(|w| w == ["-c:a", "aac"]));
        assert!(a.contains(&"-shortest".to_string()));
        assert_eq!(a.last().unwrap(), "out.mkv");
    }

    #[test]
    fn overlay_maps_only_background_audio_and_copies_it() {
        let cmd = Ffmpeg::default().overlay_cmd(
            Path::new("gameplay.mp4"),
            Path::new("conv.mkv"),
            Path::new("final.mp4"),
        );
        let a = args(&cmd);
        let i = a.iter().position(|x| x == "-filter_complex").unwrap();
        assert!(a[i + 1].contains("overlay=(W-w)/2:(H-h)/2"));
        assert!(a.windows(2).any(|w| w == ["-map", "0:a?"]));
        assert!(!a.iter().any(|x| x.starts_with("1:a")));
        assert!(a.windows(2).any(|w| w == ["-c:a", "copy"]));
        // Background is input 0.
        let first_input = a.iter().position(|x| x == "-i").unwrap();
        assert_eq!(a[first_input + 1], "gameplay.mp4");
    }

    #[test]
    fn pcm_encode_declares_raw_input_format() {
        let cmd = Ffmpeg::default().pcm_to_mp3_cmd(22_050, 1, Path::new("c.mp3"));
        let a = args(&cmd);
        assert!(a.windows(2).any(|w| w == ["-f", "f32le"]));
        assert!(a.windows(2).any(|w| w == ["-ar", "22050"]));
        assert!(a.windows(2).any(|w| w == ["-ac", "1"]));
        assert!(a.windows(2).any(|w| w == ["-i", "pipe:0"]));
    }

    #[test]
    fn missing_program_is_a_tool_error() {
        let ff = Ffmpeg::new("bubblecast-no-such-ffmpeg");
        assert!(!ff.is_available());
        let err = ff
            .run(
                ff.mux_cmd(Path::new("a"), Path::new("b"), Path::new("c")),
                "mux",
            )
            .unwrap_err();
        assert!(matches!(err, BubblecastError::Tool(_)));
    }

    #[test]
    fn empty_pcm_layout_is_rejected_before_spawning() {
        let ff = Ffmpeg::new("bubblecast-no-such-ffmpeg");
        let err = ff
            .encode_pcm_mp3(&AudioPcm::empty(0, 1), Path::new("x.mp3"))
            .unwrap_err();
        assert!(matches!(err, BubblecastError::Validation(_)));
    }
}
