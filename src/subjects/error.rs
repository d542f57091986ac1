use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Subject '{0}' already exists")]
    DuplicateName(String),

    #[error("Invalid subject index {index} (store has {len} subjects)")]
    InvalidIndex { index: usize, len: usize },

    #[error("No subject with id '{0}'")]
    UnknownId(String),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Invalid JSON in {path:?}: {source}")]
    CorruptConfig {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unable to access {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to serialize subjects: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}
