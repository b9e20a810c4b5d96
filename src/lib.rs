//! bubblecast renders a text-conversation video from a `Speaker: text` script.
//!
//! The run is a fixed sequence of file-to-file stages:
//!
//! - [`render::bubble::render_bubbles`]: one chat-bubble PNG per line
//! - [`speech::synthesize_script`]: one speech WAV per line
//! - [`compose::compose_conversation`]: bubbles + concatenated speech → conversation clip
//! - [`overlay::overlay_conversation`]: conversation clip centered over a background video
//!
//! [`pipeline::Pipeline`] runs them in order from a [`PipelineConfig`].
#![forbid(unsafe_code)]

mod foundation;

pub mod audio;
pub mod cast;
pub mod compose;
pub mod config;
pub mod encode;
pub mod overlay;
pub mod pipeline;
pub mod render;
pub mod script;
pub mod speech;

pub use crate::cast::{BubbleSide, BubbleStyle, Cast, RoleProfile, RoleTable, SpeakerRole};
pub use crate::compose::{ComposeOpts, ComposeReport};
pub use crate::config::PipelineConfig;
pub use crate::encode::ffmpeg::Ffmpeg;
pub use crate::encode::probe::{Ffprobe, MediaInfo, StreamInfo};
pub use crate::foundation::error::{BubblecastError, BubblecastResult};
pub use crate::pipeline::{Pipeline, RunReport, Stage};
pub use crate::render::FrameRGBA;
pub use crate::render::bubble::{BubbleOpts, BubbleRenderer};
pub use crate::script::{Script, ScriptLine};
pub use crate::speech::{CommandSpeechEngine, SpeechEngine};
