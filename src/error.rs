//! Error types for the post-processing core.
//!
//! Only dictionary conflicts are meant to reach callers during normal OCR
//! runs. Capability failures are absorbed by the pipeline, the rest come
//! from configuration and persistence at the edges.

use std::path::PathBuf;

use thiserror::Error;

/// Rejections from the correction dictionary.
#[derive(Debug, Error)]
pub enum DictionaryError {
    /// The pattern already maps to a different replacement.
    #[error("pattern '{pattern}' already maps to '{existing}', refusing '{rejected}'")]
    Conflict {
        pattern: String,
        existing: String,
        rejected: String,
    },

    #[error("correction pattern is empty")]
    EmptyPattern,

    #[error("invalid structural pattern '{pattern}'")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("no active rule for pattern '{0}'")]
    UnknownPattern(String),
}

/// Failure of an optional external capability (segmenter, corrector, normalizer).
#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("{capability} is not available")]
    Unavailable { capability: &'static str },

    #[error("{capability} failed: {message}")]
    Failed {
        capability: &'static str,
        message: String,
    },
}

impl CapabilityError {
    pub fn failed(capability: &'static str, message: impl Into<String>) -> Self {
        Self::Failed {
            capability,
            message: message.into(),
        }
    }
}

/// Errors from the phrase review workflow.
#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("no stored instances for phrase '{0}'")]
    UnknownPhrase(String),

    #[error("phrase '{0}' has no correction suggestion to promote")]
    MissingSuggestion(String),

    #[error("phrase {id}: cannot move from {from} to {to}")]
    InvalidTransition {
        id: i64,
        from: &'static str,
        to: &'static str,
    },

    #[error(transparent)]
    Dictionary(#[from] DictionaryError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in {path}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }
}

/// Crate-level error.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Dictionary(#[from] DictionaryError),

    #[error(transparent)]
    Review(#[from] ReviewError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, Error>;
