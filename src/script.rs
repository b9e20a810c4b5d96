//! Conversation script parsing.
//!
//! A script is plain text with one utterance per line, `Speaker: utterance text`. The speaker
//! ends at the first `": "`; everything after it is the utterance, including any further `": "`.

use std::path::Path;

use crate::foundation::error::{BubblecastError, BubblecastResult};

/// Separator between speaker and utterance.
pub const DELIMITER: &str = ": ";

/// One utterance of the conversation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptLine {
    /// 1-based position in playback order. Output files are named after it.
    pub index: usize,
    pub speaker: String,
    pub text: String,
}

/// Ordered utterances of a conversation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Script {
    pub lines: Vec<ScriptLine>,
}

impl Script {
    /// Parse script text. Blank lines are skipped and do not consume an index.
    pub fn parse(src: &str) -> BubblecastResult<Self> {
        let mut lines = Vec::new();
        for (line_no, raw) in src.lines().enumerate() {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            let (speaker, text) = raw.split_once(DELIMITER).ok_or_else(|| {
                BubblecastError::script(
                    line_no + 1,
                    format!("expected `speaker{DELIMITER}text`, got `{raw}`"),
                )
            })?;
            lines.push(ScriptLine {
                index: lines.len() + 1,
                speaker: speaker.to_owned(),
                text: text.to_owned(),
            });
        }
        Ok(Self { lines })
    }

    /// Read and parse a script file.
    pub fn read(path: &Path) -> BubblecastResult<Self> {
        let src = std::fs::read_to_string(path).map_err(|e| {
            BubblecastError::resource(format!("failed to read script '{}': {e}", path.display()))
        })?;
        Self::parse(&src)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ScriptLine> {
        self.lines.iter()
    }
}

impl<'a> IntoIterator for &'a Script {
    type Item = &'a ScriptLine;
    type IntoIter = std::slice::Iter<'a, ScriptLine>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
