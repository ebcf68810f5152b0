//! Artifact materialization: local cache first, then the configured
//! repositories in order, with checksum verification before caching.

use std::path::PathBuf;

use async_trait::async_trait;
use jarpath_core::coordinate::Coordinate;
use jarpath_core::provider::ArtifactMaterializer;
use jarpath_util::errors::JarpathError;
use reqwest::Client;

use crate::cache::LocalCache;
use crate::repository::RemoteRepository;
use crate::{checksum, download};

#[derive(Debug, Clone)]
pub struct RepositoryMaterializer {
    client: Client,
    repositories: Vec<RemoteRepository>,
    cache: LocalCache,
}

impl RepositoryMaterializer {
    pub fn new(client: Client, repositories: Vec<RemoteRepository>, cache: LocalCache) -> Self {
        Self {
            client,
            repositories,
            cache,
        }
    }

    async fn download(&self, coordinate: &Coordinate) -> Result<PathBuf, JarpathError> {
        let mut failures = Vec::new();
        for repo in &self.repositories {
            let url = repo.artifact_url(coordinate);
            let label = coordinate.file_name();
            let bytes = match download::download_artifact(&self.client, repo, &url, &label).await
            {
                Ok(Some(bytes)) => bytes,
                Ok(None) => continue,
                Err(e) => {
                    failures.push(format!("{}: {e}", repo.id));
                    continue;
                }
            };

            checksum::verify(&self.client, repo, &url, &bytes).await?;
            let path = self.cache.put_artifact(coordinate, &bytes)?;
            tracing::info!("Downloaded {coordinate} from {}", repo.id);
            return Ok(path);
        }

        let message = if failures.is_empty() {
            "not found in any repository".to_string()
        } else {
            failures.join("; ")
        };
        Err(JarpathError::Materialization {
            coordinate: coordinate.to_string(),
            message,
        })
    }
}

#[async_trait]
impl ArtifactMaterializer for RepositoryMaterializer {
    async fn materialize(&self, coordinate: &Coordinate) -> Result<PathBuf, JarpathError> {
        if let Some(path) = self.cache.get_artifact(coordinate) {
            tracing::debug!("Cache hit for {coordinate}");
            return Ok(path);
        }
        self.download(coordinate).await.map_err(|e| match e {
            JarpathError::Materialization { .. } => e,
            other => JarpathError::Materialization {
                coordinate: coordinate.to_string(),
                message: other.to_string(),
            },
        })
    }
}
