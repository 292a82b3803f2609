//! Class artifacts read from disk.
//!
//! Positions are input positions: a file that cannot be read keeps its slot,
//! so skip entries from reading and from decoding line up with the paths the
//! caller passed.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::AnalysisError;
use crate::index::SkippedArtifact;

#[derive(Debug, Default)]
pub struct Artifacts {
    /// Contents of every readable input, in input order
    pub buffers: Vec<Vec<u8>>,
    /// Input position and path behind each buffer
    sources: Vec<(usize, PathBuf)>,
    unreadable: Vec<SkippedArtifact>,
}

impl Artifacts {
    /// Reads every path; unreadable ones are logged and skipped.
    pub fn read<P: AsRef<Path>>(paths: &[P]) -> Self {
        let mut artifacts = Self::default();
        for (position, path) in paths.iter().enumerate() {
            let path = path.as_ref().to_path_buf();
            match std::fs::read(&path) {
                Ok(buffer) => {
                    debug!(path = %path.display(), bytes = buffer.len(), "read artifact");
                    artifacts.buffers.push(buffer);
                    artifacts.sources.push((position, path));
                }
                Err(source) => {
                    let err = AnalysisError::Io {
                        path: path.clone(),
                        source,
                    };
                    warn!(position, error = %err, "skipping unreadable artifact");
                    artifacts.unreadable.push(SkippedArtifact {
                        position,
                        path: Some(path),
                        reason: err.to_string(),
                    });
                }
            }
        }
        artifacts
    }

    pub fn unreadable(&self) -> &[SkippedArtifact] {
        &self.unreadable
    }

    /// Unreadable files merged with `decoded`, whose positions index
    /// [`Artifacts::buffers`], all in input order with their paths.
    pub fn skipped(&self, decoded: &[SkippedArtifact]) -> Vec<SkippedArtifact> {
        let mut all = self.unreadable.clone();
        all.extend(decoded.iter().map(|skip| match self.sources.get(skip.position) {
            Some((position, path)) => SkippedArtifact {
                position: *position,
                path: Some(path.clone()),
                reason: skip.reason.clone(),
            },
            None => skip.clone(),
        }));
        all.sort_by_key(|skip| skip.position);
        all
    }
}
