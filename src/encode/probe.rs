use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    process::Command,
};

use crate::foundation::error::{BubblecastError, BubblecastResult};

#[derive(Clone, Debug, PartialEq)]
pub struct StreamInfo {
    pub codec_type: String,
    pub codec_name: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub duration_sec: Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MediaInfo {
    pub source_path: PathBuf,
    pub duration_sec: f64,
    pub streams: Vec<StreamInfo>,
}

impl MediaInfo {
    pub fn first_video(&self) -> Option<&StreamInfo> {
        self.streams.iter().find(|s| s.codec_type == "video")
    }

    pub fn first_audio(&self) -> Option<&StreamInfo> {
        self.streams.iter().find(|s| s.codec_type == "audio")
    }

    pub fn audio_stream_count(&self) -> usize {
        self.streams
            .iter()
            .filter(|s| s.codec_type == "audio")
            .count()
    }
}

#[derive(serde::Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
}

#[derive(serde::Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

#[derive(serde::Deserialize)]
struct ProbeOut {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

/// Handle to the system `ffprobe` program.
#[derive(Clone, Debug)]
pub struct Ffprobe {
    program: OsString,
}

impl Default for Ffprobe {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

impl Ffprobe {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn probe(&self, source_path: &Path) -> BubblecastResult<MediaInfo> {
        let out = Command::new(&self.program)
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_streams",
                "-show_format",
            ])
            .arg(source_path)
            .output()
            .map_err(|e| BubblecastError::tool(format!("failed to run ffprobe: {e}")))?;
        if !out.status.success() {
            return Err(BubblecastError::tool(format!(
                "ffprobe failed for '{}': {}",
                source_path.display(),
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }
        parse_probe_json(source_path, &out.stdout)
    }
}

fn parse_probe_json(source_path: &Path, json: &[u8]) -> BubblecastResult<MediaInfo> {
    let parsed: ProbeOut = serde_json::from_slice(json)
        .map_err(|e| BubblecastError::tool(format!("ffprobe json parse failed: {e}")))?;

    let streams = parsed
        .streams
        .into_iter()
        .map(|s| StreamInfo {
            codec_type: s.codec_type.unwrap_or_default(),
            codec_name: s.codec_name,
            width: s.width,
            height: s.height,
            duration_sec: s.duration.as_deref().and_then(|d| d.parse::<f64>().ok()),
        })
        .collect();
    let duration_sec = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_ref())
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.0);

    Ok(MediaInfo {
        source_path: source_path.to_path_buf(),
        duration_sec,
        streams,
    })
}
