//! Speech clip loading and concatenation.

pub mod concat;

/// Decoded PCM audio.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioPcm {
    pub sample_rate: u32,
    pub channels: u16,
    pub interleaved_f32: Vec<f32>,
}

impl AudioPcm {
    pub fn empty(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
            interleaved_f32: Vec::new(),
        }
    }

    /// Number of sample frames (one sample per channel).
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.interleaved_f32.len() / usize::from(self.channels)
        }
    }

    pub fn duration_sec(&self) -> f64 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.frames() as f64 / f64::from(self.sample_rate)
        }
    }

    /// Interleaved samples as raw little-endian `f32le` bytes.
    pub fn to_f32le_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::<u8>::with_capacity(self.interleaved_f32.len() * 4);
        for &sample in &self.interleaved_f32 {
            bytes.extend_from_slice(&sample.to_le_bytes());
        }
        bytes
    }
}
