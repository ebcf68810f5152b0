//! Operation: download an explicit list of artifacts without collecting
//! their dependencies.

use std::path::PathBuf;
use std::sync::Arc;

use jarpath_core::coordinate::Coordinate;
use jarpath_core::provider::ArtifactMaterializer;
use jarpath_util::errors::JarpathError;
use jarpath_util::progress::{spinner, status};
use tokio_util::sync::CancellationToken;

use crate::session::Session;

impl Session {
    /// Materialize `notations` from the registered repositories, returning
    /// local paths in input order.
    pub async fn download_artifacts(&self, notations: &[&str]) -> miette::Result<Vec<PathBuf>> {
        let materializer = self.collaborators()?.materializer.ok_or_else(|| {
            JarpathError::Config {
                message: "no artifact materializer configured".to_string(),
            }
        })?;
        self.download_artifacts_with(materializer, notations, CancellationToken::new())
            .await
    }

    /// Like [`Session::download_artifacts`] with an explicit materializer.
    ///
    /// Every notation is parsed before anything is downloaded. Concurrent
    /// requests for the same coordinate share one download.
    pub async fn download_artifacts_with(
        &self,
        materializer: Arc<dyn ArtifactMaterializer>,
        notations: &[&str],
        cancel: CancellationToken,
    ) -> miette::Result<Vec<PathBuf>> {
        let coordinates = notations
            .iter()
            .map(|n| self.parse_notation(n))
            .collect::<Result<Vec<Coordinate>, _>>()?;
        if coordinates.is_empty() {
            return Ok(Vec::new());
        }

        let config = self.config();
        let sp = self
            .verbose
            .then(|| spinner(&format!("Downloading {} artifacts...", coordinates.len())));
        let result = self
            .context
            .downloads()
            .materialize_all(
                materializer,
                &coordinates,
                config.fetch_concurrency,
                config.fetch_timeout(),
                &cancel,
            )
            .await;
        if let Some(sp) = sp {
            sp.finish_and_clear();
        }
        let paths = result?;

        if self.verbose {
            status("Downloaded", &format!("{} artifacts", paths.len()));
        }
        Ok(paths)
    }
}
