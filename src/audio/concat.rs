use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{
    audio::AudioPcm,
    foundation::error::{BubblecastError, BubblecastResult},
};

/// A speech clip found in the audio directory, keyed by the number in its file name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NumberedClip {
    pub number: u64,
    pub path: PathBuf,
}

/// List `*.wav` files in `dir` ordered by the numeric value of their name.
///
/// The number is the part of the file name before the first `.`, so `2.wav` sorts before
/// `10.wav`. A `.wav` file whose name does not start with a number is an error.
pub fn list_numbered_clips(dir: &Path) -> BubblecastResult<Vec<NumberedClip>> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        BubblecastError::resource(format!(
            "failed to read audio directory '{}': {e}",
            dir.display()
        ))
    })?;

    let mut clips = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            BubblecastError::resource(format!(
                "failed to list audio directory '{}': {e}",
                dir.display()
            ))
        })?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if !name.ends_with(".wav") {
            continue;
        }
        let stem = name.split('.').next().unwrap_or_default();
        let number = stem.parse::<u64>().map_err(|_| {
            BubblecastError::audio(format!(
                "audio clip '{name}' is not named after a line number"
            ))
        })?;
        clips.push(NumberedClip {
            number,
            path: entry.path(),
        });
    }

    clips.sort_by_key(|c| c.number);
    Ok(clips)
}

/// Decode a WAV file into interleaved `f32` samples in `[-1, 1]`.
pub fn read_wav(path: &Path) -> BubblecastResult<AudioPcm> {
    let mut reader = hound::WavReader::open(path).map_err(|e| {
        BubblecastError::audio(format!("failed to open wav '{}': {e}", path.display()))
    })?;
    let spec = reader.spec();
    let decode_err = |e: hound::Error| {
        BubblecastError::audio(format!("failed to decode '{}': {e}", path.display()))
    };

    let interleaved_f32: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(decode_err)?,
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1u64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<_, _>>()
                .map_err(decode_err)?
        }
    };

    Ok(AudioPcm {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        interleaved_f32,
    })
}

/// Append clips back to back, in the given order.
///
/// All clips must share sample rate and channel count.
pub fn concat_clips<'a>(paths: impl IntoIterator<Item = &'a Path>) -> BubblecastResult<AudioPcm> {
    let mut out: Option<AudioPcm> = None;
    for path in paths {
        let clip = read_wav(path)?;
        debug!(path = %path.display(), seconds = clip.duration_sec(), "appending clip");
        match out.as_mut() {
            None => out = Some(clip),
            Some(acc) => {
                if acc.sample_rate != clip.sample_rate || acc.channels != clip.channels {
                    return Err(BubblecastError::audio(format!(
                        "clip '{}' is {} Hz/{} ch, expected {} Hz/{} ch",
                        path.display(),
                        clip.sample_rate,
                        clip.channels,
                        acc.sample_rate,
                        acc.channels
                    )));
                }
                acc.interleaved_f32.extend_from_slice(&clip.interleaved_f32);
            }
        }
    }
    out.ok_or_else(|| BubblecastError::audio("no audio clips to concatenate"))
}

/// Concatenate every numbered clip in `dir` in numeric order.
pub fn concat_dir(dir: &Path) -> BubblecastResult<(Vec<NumberedClip>, AudioPcm)> {
    let clips = list_numbered_clips(dir)?;
    let pcm = concat_clips(clips.iter().map(|c| c.path.as_path()))?;
    Ok((clips, pcm))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_wav(path: &Path, sample_rate: u32, channels: u16, samples: &[i16]) {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut w = hound::WavWriter::create(path, spec).unwrap();
        for &s in samples {
            w.write_sample(s).unwrap();
        }
        w.finalize().unwrap();
    }

    #[test]
    fn clips_sort_numerically_not_lexically() {
        let dir = tempfile::tempdir().unwrap();
        for n in [2, 10, 1] {
            write_wav(&dir.path().join(format!("{n}.wav")), 8000, 1, &[n as i16]);
        }
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let clips = list_numbered_clips(dir.path()).unwrap();
        let order: Vec<u64> = clips.iter().map(|c| c.number).collect();
        assert_eq!(order, [1, 2, 10]);

        let (_, pcm) = concat_dir(dir.path()).unwrap();
        let scale = 1.0 / 32768.0;
        assert_eq!(
            pcm.interleaved_f32,
            vec![1.0 * scale, 2.0 * scale, 10.0 * scale]
        );
    }

    #[test]
    fn non_numeric_wav_name_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write_wav(&dir.path().join("intro.wav"), 8000, 1, &[0]);
        assert!(matches!(
            list_numbered_clips(dir.path()),
            Err(BubblecastError::Audio(_))
        ));
    }

    #[test]
    fn concatenation_sums_durations() {
        let dir = tempfile::tempdir().unwrap();
        write_wav(&dir.path().join("1.wav"), 8000, 1, &vec![100; 8000]);
        write_wav(&dir.path().join("2.wav"), 8000, 1, &vec![-100; 4000]);

        let (clips, pcm) = concat_dir(dir.path()).unwrap();
        assert_eq!(clips.len(), 2);
        assert_eq!(pcm.sample_rate, 8000);
        assert_eq!(pcm.channels, 1);
        assert!((pcm.duration_sec() - 1.5).abs() < 1e-9);
        assert!(pcm.interleaved_f32[7999] > 0.0);
        assert!(pcm.interleaved_f32[8000] < 0.0);
    }

    #[test]
    fn mismatched_formats_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_wav(&dir.path().join("1.wav"), 8000, 1, &[0; 10]);
        write_wav(&dir.path().join("2.wav"), 22050, 1, &[0; 10]);
        let err = concat_dir(dir.path()).unwrap_err();
        assert!(err.to_string().contains("expected 8000 Hz/1 ch"));
    }

    #[test]
    fn empty_directory_has_nothing_to_concatenate() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            concat_dir(dir.path()),
            Err(BubblecastError::Audio(_))
        ));
    }

    #[test]
    fn missing_directory_is_a_resource_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            list_numbered_clips(&dir.path().join("audio")),
            Err(BubblecastError::Resource(_))
        ));
    }
}
