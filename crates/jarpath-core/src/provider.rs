//! Capability traits for the collaborators that supply dependency metadata
//! and artifact files. Resolution depends only on these traits, never on a
//! concrete transport.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use jarpath_util::errors::JarpathError;

use crate::coordinate::Coordinate;
use crate::dependency::DependencyEdge;

/// Supplies the declared dependencies of a coordinate.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Declared dependency edges of `coordinate`, in declaration order.
    ///
    /// Fails with [`JarpathError::MissingMetadata`] when no source knows the
    /// coordinate, or [`JarpathError::Transport`] when a source could not be
    /// reached.
    async fn fetch_dependencies(
        &self,
        coordinate: &Coordinate,
    ) -> Result<Vec<DependencyEdge>, JarpathError>;
}

/// Produces a local file for a resolved coordinate, downloading it when it
/// is not cached.
#[async_trait]
pub trait ArtifactMaterializer: Send + Sync {
    async fn materialize(&self, coordinate: &Coordinate) -> Result<PathBuf, JarpathError>;
}

/// Reads declared dependencies from a local descriptor file, used for
/// locally built artifacts.
pub trait DescriptorReader: Send + Sync {
    fn read_dependencies(
        &self,
        coordinate: &Coordinate,
        descriptor: &Path,
    ) -> Result<Vec<DependencyEdge>, JarpathError>;
}
