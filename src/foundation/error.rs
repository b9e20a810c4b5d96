pub type BubblecastResult<T> = Result<T, BubblecastError>;

#[derive(thiserror::Error, Debug)]
pub enum BubblecastError {
    /// A script line could not be split into `speaker: text`.
    #[error("script error on line {line}: {msg}")]
    Script { line: usize, msg: String },

    #[error("validation error: {0}")]
    Validation(String),

    /// A required input (font, script, directory, media file) is missing or unreadable.
    #[error("resource error: {0}")]
    Resource(String),

    /// An external program could not be spawned or exited non-zero.
    #[error("external tool error: {0}")]
    Tool(String),

    #[error("audio error: {0}")]
    Audio(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BubblecastError {
    pub fn script(line: usize, msg: impl Into<String>) -> Self {
        Self::Script {
            line,
            msg: msg.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn resource(msg: impl Into<String>) -> Self {
        Self::Resource(msg.into())
    }

    pub fn tool(msg: impl Into<String>) -> Self {
        Self::Tool(msg.into())
    }

    pub fn audio(msg: impl Into<String>) -> Self {
        Self::Audio(msg.into())
    }
}
