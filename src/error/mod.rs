use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// A remote call ran past its deadline.
    #[error("Request canceled due to timeout: {0}")]
    Canceled(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid entry type: {0}")]
    InvalidEntry(String),

    #[error("Node has no parent")]
    NoParent,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Launch failed: {0}")]
    Launch(String),
}

impl Error {
    pub fn canceled(msg: impl Into<String>) -> Self {
        Self::Canceled(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn invalid_entry(msg: impl Into<String>) -> Self {
        Self::InvalidEntry(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn launch(msg: impl Into<String>) -> Self {
        Self::Launch(msg.into())
    }

    pub fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled(_))
    }
}
