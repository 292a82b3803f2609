//! Top-level error type.
//!
//! Each stage has its own error enum; [`AnalysisError`] gathers them for
//! callers that drive the whole pipeline.

use std::path::PathBuf;
use thiserror::Error;

use crate::classfile::MalformedClassError;
use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("malformed class file: {0}")]
    Decode(#[from] MalformedClassError),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;
