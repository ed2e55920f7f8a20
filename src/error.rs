//! Error types for pipeline loading, parsing and evaluation.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by loaders, the DSL and the pipeline evaluator.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The record file could not be read or parsed.
    #[error("failed to load records from '{}': {source}", .path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: Box<StreamError>,
    },

    /// Malformed JSON input.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// DSL syntax error.
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    /// The pipeline has no stages at all.
    #[error("pipeline is empty")]
    EmptyPipeline,

    /// The first stage is not a source.
    #[error("{stage} cannot be the first stage (try CUSTOMERS or HOLE)")]
    SourceRequired { stage: String },

    /// A stage is configured in a way that cannot be evaluated.
    #[error("stage {index} ({stage}): {reason}")]
    InvalidStage {
        index: usize,
        stage: String,
        reason: String,
    },

    /// A sort or sorted-set target has no usable comparator.
    #[error("stage {index} ({stage}): no comparator given and elements have no natural order")]
    InvalidComparator { index: usize, stage: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, StreamError>;

impl StreamError {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        StreamError::Parse {
            line,
            message: message.into(),
        }
    }

    pub(crate) fn invalid_stage(index: usize, stage: &str, reason: impl Into<String>) -> Self {
        StreamError::InvalidStage {
            index,
            stage: stage.to_string(),
            reason: reason.into(),
        }
    }
}
