//! Overlay compositor: conversation clip centered over the background video.

use std::path::Path;

use tracing::info;

use crate::{
    encode::ffmpeg::Ffmpeg,
    foundation::{
        error::BubblecastResult,
        fs::{ensure_parent_dir, require_file},
    },
};

/// Alpha-composite `conversation` centered on `background` into `output`, overwriting it.
///
/// Only the background's audio reaches the output, stream-copied; the conversation's speech
/// track is not mapped.
#[tracing::instrument(skip_all, fields(output = %output.display()))]
pub fn overlay_conversation(
    ffmpeg: &Ffmpeg,
    background: &Path,
    conversation: &Path,
    output: &Path,
) -> BubblecastResult<()> {
    require_file(background, "background video")?;
    require_file(conversation, "conversation video")?;
    ensure_parent_dir(output)?;

    ffmpeg.run(
        ffmpeg.overlay_cmd(background, conversation, output),
        "overlay",
    )?;
    info!(
        background = %background.display(),
        conversation = %conversation.display(),
        "composited final video"
    );
    Ok(())
}
