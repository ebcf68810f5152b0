use std::path::PathBuf;

use crate::coordinate::Coordinate;

/// A locally built artifact that stands in for repository resolution.
///
/// When `descriptor_path` is set, the artifact's dependencies are read from
/// that descriptor; otherwise the artifact is a leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildArtifact {
    pub coordinate: Coordinate,
    pub artifact_path: PathBuf,
    pub descriptor_path: Option<PathBuf>,
}

impl BuildArtifact {
    pub fn new(
        coordinate: Coordinate,
        artifact_path: impl Into<PathBuf>,
        descriptor_path: Option<PathBuf>,
    ) -> Self {
        Self {
            coordinate,
            artifact_path: artifact_path.into(),
            descriptor_path,
        }
    }
}
