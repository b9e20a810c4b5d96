#![allow(dead_code)]

use std::{
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use bubblecast::{BubblecastError, BubblecastResult, SpeechEngine};

pub const CLIP_SAMPLE_RATE: u32 = 22_050;

fn tool_ok(program: &str, arg: &str) -> bool {
    Command::new(program)
        .arg(arg)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// `ffmpeg` and `ffprobe` on PATH, with the encoders the pipeline asks for.
pub fn ffmpeg_tools_available() -> bool {
    if !(tool_ok("ffmpeg", "-version") && tool_ok("ffprobe", "-version")) {
        return false;
    }
    let Ok(out) = Command::new("ffmpeg")
        .args(["-hide_banner", "-encoders"])
        .output()
    else {
        return false;
    };
    let encoders = String::from_utf8_lossy(&out.stdout);
    ["libvpx-vp9", "libmp3lame", "aac", "libx264"]
        .iter()
        .all(|e| encoders.contains(e))
}

pub fn espeak_available() -> bool {
    tool_ok("espeak", "--version")
}

/// A TrueType font from the test environment, if one can be found.
pub fn system_font() -> Option<PathBuf> {
    let mut candidates: Vec<PathBuf> = std::env::var_os("BUBBLECAST_TEST_FONT")
        .map(PathBuf::from)
        .into_iter()
        .collect();
    candidates.extend(
        [
            "OpenSans-Regular.ttf",
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/TTF/DejaVuSans.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
            "/System/Library/Fonts/Supplemental/Arial.ttf",
            "C:\\Windows\\Fonts\\arial.ttf",
        ]
        .map(PathBuf::from),
    );
    candidates.into_iter().find(|p| p.is_file())
}

pub fn write_sine_wav(path: &Path, seconds: f32, freq: f32) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: CLIP_SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut w = hound::WavWriter::create(path, spec).unwrap();
    let n = (seconds * CLIP_SAMPLE_RATE as f32) as u32;
    for i in 0..n {
        let t = i as f32 / CLIP_SAMPLE_RATE as f32;
        let v = (t * freq * std::f32::consts::TAU).sin() * 0.3;
        w.write_sample((v * i16::MAX as f32) as i16).unwrap();
    }
    w.finalize().unwrap();
}

/// Speech engine writing a fixed-length tone per line, pitched by voice.
#[derive(Default)]
pub struct ToneSpeech {
    pub seconds: f32,
    pub calls: Vec<(String, String)>,
}

impl ToneSpeech {
    pub fn new(seconds: f32) -> Self {
        Self {
            seconds,
            calls: Vec::new(),
        }
    }
}

impl SpeechEngine for ToneSpeech {
    fn synthesize(&mut self, voice: &str, text: &str, out: &Path) -> BubblecastResult<()> {
        if text.is_empty() {
            return Err(BubblecastError::tool("empty utterance"));
        }
        let freq = if voice == "en-us" { 440.0 } else { 220.0 };
        write_sine_wav(out, self.seconds, freq);
        self.calls.push((voice.to_string(), text.to_string()));
        Ok(())
    }
}

/// Numbered file stems (`1`, `2`, ...) with `ext` in `dir`, sorted.
pub fn numbered_files(dir: &Path, ext: &str) -> Vec<u64> {
    let mut out: Vec<u64> = std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| {
            let p = e.unwrap().path();
            if p.extension()? != ext {
                return None;
            }
            p.file_stem()?.to_str()?.parse().ok()
        })
        .collect();
    out.sort_unstable();
    out
}

/// Transparent 800x100 PNG with an opaque block, standing in for a rendered bubble.
pub fn write_bubble_png(path: &Path, rgba: [u8; 4]) {
    let mut img = image::RgbaImage::new(800, 100);
    for y in 10..90 {
        for x in 400..790 {
            img.put_pixel(x, y, image::Rgba(rgba));
        }
    }
    img.save(path).unwrap();
}

pub fn run_ffmpeg(args: &[&str]) {
    let status = Command::new("ffmpeg")
        .args(["-v", "error", "-y"])
        .args(args)
        .status()
        .unwrap();
    assert!(status.success(), "ffmpeg {args:?} failed");
}

/// MD5 over the audio packets of `path`, stream-copied (no decode).
pub fn audio_packet_md5(path: &Path) -> String {
    let out = Command::new("ffmpeg")
        .args(["-v", "error", "-i"])
        .arg(path)
        .args(["-map", "0:a", "-c", "copy", "-f", "md5", "-"])
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    String::from_utf8_lossy(&out.stdout).trim().to_string()
}
