//! Local artifact cache laid out like a Maven repository
//! (`<root>/<group path>/<artifact>/<version>/<file>`).

use std::fs;
use std::path::{Path, PathBuf};

use jarpath_core::coordinate::Coordinate;
use jarpath_util::errors::JarpathError;

use crate::pom::{self, Pom};
use crate::repository::RemoteRepository;

#[derive(Debug, Clone)]
pub struct LocalCache {
    root: PathBuf,
}

impl LocalCache {
    /// Create a cache rooted at `root`, usually `~/.m2/repository`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding every file of a coordinate's version.
    pub fn artifact_dir(&self, coordinate: &Coordinate) -> PathBuf {
        self.root
            .join(RemoteRepository::coordinate_path(coordinate))
    }

    fn pom_file_name(coordinate: &Coordinate) -> String {
        format!("{}-{}.pom", coordinate.artifact(), coordinate.version())
    }

    /// Cached artifact file, if present.
    pub fn get_artifact(&self, coordinate: &Coordinate) -> Option<PathBuf> {
        let path = self.artifact_dir(coordinate).join(coordinate.file_name());
        path.is_file().then_some(path)
    }

    /// Cached POM, if present and parseable. A corrupt cached POM is
    /// treated as a miss so it gets fetched again.
    pub fn get_pom(&self, coordinate: &Coordinate) -> Option<Pom> {
        let path = self
            .artifact_dir(coordinate)
            .join(Self::pom_file_name(coordinate));
        let content = fs::read_to_string(&path).ok()?;
        match pom::parse_pom(&content) {
            Ok(pom) => Some(pom),
            Err(e) => {
                tracing::warn!("Ignoring unreadable cached POM {}: {e}", path.display());
                None
            }
        }
    }

    /// Store a file for `coordinate`, replacing any previous copy atomically.
    pub fn put(
        &self,
        coordinate: &Coordinate,
        filename: &str,
        data: &[u8],
    ) -> Result<PathBuf, JarpathError> {
        let path = self.artifact_dir(coordinate).join(filename);
        jarpath_util::fs::write_atomic(&path, data)?;
        Ok(path)
    }

    pub fn put_pom(&self, coordinate: &Coordinate, xml: &str) -> Result<PathBuf, JarpathError> {
        self.put(coordinate, &Self::pom_file_name(coordinate), xml.as_bytes())
    }

    pub fn put_artifact(
        &self,
        coordinate: &Coordinate,
        data: &[u8],
    ) -> Result<PathBuf, JarpathError> {
        self.put(coordinate, &coordinate.file_name(), data)
    }

    /// Fetch a POM from `repo`, using the cache when available.
    ///
    /// Returns `Ok(None)` when the repository does not have it. Only POMs
    /// that parse are written to the cache.
    pub async fn fetch_pom(
        &self,
        client: &reqwest::Client,
        repo: &RemoteRepository,
        coordinate: &Coordinate,
    ) -> Result<Option<Pom>, JarpathError> {
        if let Some(pom) = self.get_pom(coordinate) {
            return Ok(Some(pom));
        }

        let url = repo.pom_url(coordinate);
        let Some(xml) = crate::download::download_text(client, repo, &url).await? else {
            return Ok(None);
        };
        let pom = pom::parse_pom(&xml)?;
        self.put_pom(coordinate, &xml)?;
        tracing::debug!("Cached POM for {coordinate} from {}", repo.id);
        Ok(Some(pom))
    }
}
