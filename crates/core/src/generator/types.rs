//! Generated artifact types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Reference to a generated media artifact on local disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactRef {
    /// Local path of the downloaded video file.
    pub path: PathBuf,
    /// Upstream URL the file was fetched from, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

impl ArtifactRef {
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            source_url: None,
        }
    }
}
