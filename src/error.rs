// Error types for the store, the request runner and the prompts.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not resolve the home directory")]
    HomeDirUnavailable,
    #[error("failed to access {}: {source}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("API with name {0:?} not found")]
    NotFound(String),
    #[error("failed to serialize saved APIs: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StoreError {
    /// True when the store file simply does not exist yet.
    pub fn is_missing_file(&self) -> bool {
        matches!(
            self,
            StoreError::FileAccess { source, .. } if source.kind() == std::io::ErrorKind::NotFound
        )
    }
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("invalid HTTP method {0:?}")]
    InvalidMethod(String),
    #[error("invalid header value for {0}")]
    InvalidHeader(&'static str),
    #[error("{0}")]
    RequestBuild(#[source] reqwest::Error),
    #[error("{0}")]
    Transport(#[source] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("prompt failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("no scripted answer left for {0:?}")]
    Exhausted(String),
    #[error("choice {0} is out of range")]
    InvalidChoice(usize),
    #[error("{0:?} is not one of the options")]
    UnknownItem(String),
}
