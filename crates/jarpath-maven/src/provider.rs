//! POM-backed dependency metadata: remote repositories behind a local cache,
//! plus a reader for POM descriptors of locally built artifacts.

use std::path::Path;

use async_trait::async_trait;
use jarpath_core::coordinate::Coordinate;
use jarpath_core::dependency::DependencyEdge;
use jarpath_core::provider::{DescriptorReader, MetadataProvider};
use jarpath_util::errors::JarpathError;
use reqwest::Client;

use crate::cache::LocalCache;
use crate::pom::{self, Pom};
use crate::repository::RemoteRepository;

/// Parent chains longer than this are cut off.
const MAX_PARENT_DEPTH: usize = 16;

/// Reads dependency metadata from POMs found in the configured repositories,
/// queried in registration order. The first repository that has the POM wins.
#[derive(Debug, Clone)]
pub struct PomMetadataProvider {
    client: Client,
    repositories: Vec<RemoteRepository>,
    cache: LocalCache,
}

impl PomMetadataProvider {
    pub fn new(client: Client, repositories: Vec<RemoteRepository>, cache: LocalCache) -> Self {
        Self {
            client,
            repositories,
            cache,
        }
    }

    /// Fetch the raw POM for a coordinate from the cache or the first
    /// repository that has it.
    async fn fetch_pom(&self, coordinate: &Coordinate) -> Result<Pom, JarpathError> {
        if let Some(pom) = self.cache.get_pom(coordinate) {
            return Ok(pom);
        }

        let mut failures = Vec::new();
        for repo in &self.repositories {
            match self.cache.fetch_pom(&self.client, repo, coordinate).await {
                Ok(Some(pom)) => return Ok(pom),
                Ok(None) => continue,
                Err(e) => {
                    tracing::debug!("{} failed for {coordinate}: {e}", repo.id);
                    failures.push(format!("{}: {e}", repo.id));
                }
            }
        }

        if failures.is_empty() {
            Err(JarpathError::MissingMetadata {
                coordinate: coordinate.to_string(),
            })
        } else {
            Err(JarpathError::Transport {
                coordinate: coordinate.to_string(),
                message: failures.join("; "),
            })
        }
    }

    /// The POM for `coordinate` with its parent chain merged in and
    /// properties interpolated.
    pub async fn effective_pom(&self, coordinate: &Coordinate) -> Result<Pom, JarpathError> {
        let pom = self.fetch_pom(coordinate).await?;

        let mut ancestors = Vec::new();
        let mut next = pom.parent_coordinate();
        while let Some(parent) = next.take() {
            if ancestors.len() == MAX_PARENT_DEPTH {
                tracing::warn!("{coordinate}: parent chain deeper than {MAX_PARENT_DEPTH}");
                break;
            }
            match self.fetch_pom(&parent).await {
                Ok(parent_pom) => {
                    next = parent_pom.parent_coordinate();
                    ancestors.push(parent_pom);
                }
                Err(e) => {
                    tracing::warn!("{coordinate}: parent {parent} unavailable: {e}");
                    break;
                }
            }
        }

        // Merge from the root of the chain down so nearer values win.
        let mut merged: Option<Pom> = None;
        for mut ancestor in ancestors.into_iter().rev() {
            if let Some(above) = &merged {
                ancestor.apply_parent(above);
            }
            merged = Some(ancestor);
        }
        let mut pom = pom;
        if let Some(parent) = &merged {
            pom.apply_parent(parent);
        }
        pom.resolve_properties();
        Ok(pom)
    }
}

#[async_trait]
impl MetadataProvider for PomMetadataProvider {
    async fn fetch_dependencies(
        &self,
        coordinate: &Coordinate,
    ) -> Result<Vec<DependencyEdge>, JarpathError> {
        let pom = self.effective_pom(coordinate).await?;
        Ok(pom.dependency_edges(coordinate))
    }
}

/// Reads dependencies from a POM file on disk. Parent POMs are not
/// consulted; only properties declared in the file itself are interpolated.
#[derive(Debug, Clone, Copy, Default)]
pub struct PomDescriptorReader;

impl DescriptorReader for PomDescriptorReader {
    fn read_dependencies(
        &self,
        coordinate: &Coordinate,
        descriptor: &Path,
    ) -> Result<Vec<DependencyEdge>, JarpathError> {
        let xml = std::fs::read_to_string(descriptor).map_err(|e| JarpathError::Descriptor {
            message: format!("Cannot read {}: {e}", descriptor.display()),
        })?;
        let mut pom = pom::parse_pom(&xml)?;
        pom.resolve_properties();
        Ok(pom.dependency_edges(coordinate))
    }
}
