//! The resolution context: declared dependencies, build artifacts and
//! configuration owned by the caller, plus the last published resolution.

use std::path::PathBuf;
use std::sync::Arc;

use jarpath_core::artifact::BuildArtifact;
use jarpath_core::config::ResolveConfig;
use jarpath_core::coordinate::Coordinate;
use jarpath_core::dependency::DependencyEdge;
use jarpath_core::provider::{ArtifactMaterializer, DescriptorReader, MetadataProvider};
use jarpath_util::errors::JarpathError;
use tokio_util::sync::CancellationToken;

use crate::cache::MetadataCache;
use crate::collector::Collector;
use crate::conflict::{self, ConflictReport, Resolved, ResolvedSet};
use crate::export::{self, DependencyTree};
use crate::graph::DependencyGraph;
use crate::materialize::SingleFlight;
use crate::overlay::BuildArtifactOverlay;

/// The collaborators a resolution talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub metadata: Arc<dyn MetadataProvider>,
    pub materializer: Option<Arc<dyn ArtifactMaterializer>>,
    pub descriptors: Option<Arc<dyn DescriptorReader>>,
}

impl Collaborators {
    pub fn new(metadata: Arc<dyn MetadataProvider>) -> Self {
        Self {
            metadata,
            materializer: None,
            descriptors: None,
        }
    }

    pub fn with_materializer(mut self, materializer: Arc<dyn ArtifactMaterializer>) -> Self {
        self.materializer = Some(materializer);
        self
    }

    pub fn with_descriptor_reader(mut self, reader: Arc<dyn DescriptorReader>) -> Self {
        self.descriptors = Some(reader);
        self
    }
}

/// A completed resolution. Immutable once published.
#[derive(Debug)]
pub struct Resolution {
    pub graph: DependencyGraph,
    pub resolved: ResolvedSet,
    pub conflicts: ConflictReport,
    pub cycles: Vec<Vec<Coordinate>>,
    /// Metadata failures tolerated in lenient mode.
    pub failures: Vec<JarpathError>,
    include_optional: bool,
}

impl Resolution {
    /// Whether lenient mode skipped any coordinate.
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn classpath(&self) -> Vec<PathBuf> {
        export::classpath(&self.resolved, self.include_optional)
    }

    pub fn classpath_string(&self) -> String {
        export::to_classpath_string(&self.classpath())
    }

    pub fn dependency_tree(&self) -> DependencyTree {
        export::structural_graph(&self.graph, &self.resolved)
    }

    /// Notations of the resolved set, in resolution order.
    pub fn notations(&self) -> Vec<String> {
        self.resolved.iter().map(|e| e.coordinate.notation()).collect()
    }

    /// Notation and local file of every entry with a known file.
    pub fn paths(&self) -> Vec<(String, PathBuf)> {
        self.resolved
            .iter()
            .filter_map(|e| e.path.clone().map(|p| (e.coordinate.notation(), p)))
            .collect()
    }
}

/// Explicit state for a sequence of resolutions.
///
/// A new [`Resolution`] replaces the current one only when a resolution
/// succeeds; failures and cancellation leave it untouched.
#[derive(Debug, Default)]
pub struct ResolutionContext {
    config: ResolveConfig,
    roots: Vec<DependencyEdge>,
    overlay: BuildArtifactOverlay,
    metadata_cache: Arc<MetadataCache>,
    downloads: SingleFlight,
    current: Option<Arc<Resolution>>,
}

impl ResolutionContext {
    pub fn new(config: ResolveConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &ResolveConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ResolveConfig {
        &mut self.config
    }

    pub fn add_dependency(&mut self, edge: DependencyEdge) {
        self.roots.push(edge);
    }

    /// Declared dependencies in declaration order.
    pub fn dependencies(&self) -> &[DependencyEdge] {
        &self.roots
    }

    pub fn clear_dependencies(&mut self) {
        self.roots.clear();
    }

    pub fn overlay(&self) -> &BuildArtifactOverlay {
        &self.overlay
    }

    pub fn add_build_artifact(&mut self, artifact: BuildArtifact) {
        self.overlay.add(artifact);
    }

    pub fn clear_build_artifacts(&mut self) {
        self.overlay.clear();
    }

    /// The last successful resolution.
    pub fn current(&self) -> Option<&Arc<Resolution>> {
        self.current.as_ref()
    }

    /// Shared single-flight materialization state.
    pub fn downloads(&self) -> &SingleFlight {
        &self.downloads
    }

    /// Forget cached metadata and materialized paths, e.g. after the
    /// repositories or the local repository changed.
    pub async fn invalidate_caches(&self) {
        self.metadata_cache.clear().await;
        self.downloads.clear().await;
    }

    /// Collect, resolve and (when configured) materialize the declared
    /// dependencies, then publish the result.
    pub async fn resolve(
        &mut self,
        collaborators: &Collaborators,
        cancel: CancellationToken,
    ) -> Result<Arc<Resolution>, JarpathError> {
        let config = self.config.clone();
        self.resolve_with_config(collaborators, &config, cancel).await
    }

    /// Like [`resolve`](Self::resolve), but with settings for this call
    /// only. The context's own configuration is left untouched.
    pub async fn resolve_with_config(
        &mut self,
        collaborators: &Collaborators,
        config: &ResolveConfig,
        cancel: CancellationToken,
    ) -> Result<Arc<Resolution>, JarpathError> {
        let mut collector = Collector::new(collaborators.metadata.clone(), config.clone())
            .with_cache(self.metadata_cache.clone())
            .with_cancellation(cancel.clone());
        if let Some(reader) = &collaborators.descriptors {
            collector = collector.with_descriptor_reader(reader.clone());
        }

        let collected = collector.collect(&self.roots, &self.overlay).await?;
        if cancel.is_cancelled() {
            return Err(JarpathError::Cancelled);
        }

        let Resolved { mut set, conflicts } =
            conflict::resolve(&collected.graph, &self.overlay, config)?;
        for c in &conflicts.conflicts {
            tracing::debug!("{c}");
        }

        if config.download_artifacts {
            if let Some(materializer) = &collaborators.materializer {
                self.materialize(&mut set, materializer.clone(), config, &cancel)
                    .await?;
            }
        }

        let resolution = Arc::new(Resolution {
            graph: collected.graph,
            resolved: set,
            conflicts,
            cycles: collected.cycles,
            failures: collected.failures,
            include_optional: config.include_optional_in_classpath,
        });
        tracing::info!(
            "Resolved {} dependencies ({} conflicts)",
            resolution.resolved.len(),
            resolution.conflicts.len()
        );
        self.current = Some(resolution.clone());
        Ok(resolution)
    }

    async fn materialize(
        &self,
        set: &mut ResolvedSet,
        materializer: Arc<dyn ArtifactMaterializer>,
        config: &ResolveConfig,
        cancel: &CancellationToken,
    ) -> Result<(), JarpathError> {
        let include_optional = config.include_optional_in_classpath;
        let wanted: Vec<Coordinate> = set
            .iter()
            .filter(|e| e.path.is_none() && (include_optional || !e.optional))
            .map(|e| e.coordinate.clone())
            .collect();
        if wanted.is_empty() {
            return Ok(());
        }

        let paths = self
            .downloads
            .materialize_all(
                materializer,
                &wanted,
                config.fetch_concurrency,
                config.fetch_timeout(),
                cancel,
            )
            .await?;
        for (coordinate, path) in wanted.iter().zip(paths) {
            if let Some(entry) = set.get_mut(&coordinate.key()) {
                entry.path = Some(path);
            }
        }
        Ok(())
    }
}
