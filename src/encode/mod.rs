//! External encoder plumbing.
//!
//! All encoding, muxing and compositing goes through the system `ffmpeg` binary, invoked with
//! discrete argument vectors. `ffprobe` is used to read back durations and stream layouts.

/// `ffmpeg` command builders and runners.
pub mod ffmpeg;
/// `ffprobe` stream/duration inspection.
pub mod probe;
