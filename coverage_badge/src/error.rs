use std::{fmt, io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BadgeError {
    #[error("io error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed coverage report {path:?} at byte {position}: {message}")]
    Xml {
        path: PathBuf,
        position: u64,
        message: String,
    },
    #[error("{kind} counter has invalid {attribute} attribute: {value:?}")]
    InvalidCounter {
        kind: String,
        attribute: &'static str,
        value: Option<String>,
    },
    #[error("unknown counter kind: {0}")]
    UnknownCounterKind(String),
    #[error("badge serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type BadgeResult<T> = Result<T, BadgeError>;

impl BadgeError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn xml(path: impl Into<PathBuf>, position: u64, message: impl fmt::Display) -> Self {
        Self::Xml {
            path: path.into(),
            position,
            message: message.to_string(),
        }
    }

    /// Rebinds a parse error raised against an in-memory document to the file it came from.
    pub(crate) fn with_path(self, path: impl Into<PathBuf>) -> Self {
        match self {
            Self::Xml {
                position, message, ..
            } => Self::Xml {
                path: path.into(),
                position,
                message,
            },
            other => other,
        }
    }
}
