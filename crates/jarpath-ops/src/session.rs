//! The session: one caller-owned resolution context plus the repositories
//! it resolves against.

use std::path::PathBuf;
use std::sync::Arc;

use jarpath_core::artifact::BuildArtifact;
use jarpath_core::config::ResolveConfig;
use jarpath_core::coordinate::Coordinate;
use jarpath_core::dependency::DependencyEdge;
use jarpath_core::scope::Scope;
use jarpath_maven::cache::LocalCache;
use jarpath_maven::download;
use jarpath_maven::materialize::RepositoryMaterializer;
use jarpath_maven::provider::{PomDescriptorReader, PomMetadataProvider};
use jarpath_maven::repository::RepositoryRegistry;
use jarpath_resolver::context::{Collaborators, ResolutionContext};
use jarpath_util::errors::JarpathError;

/// Declared dependencies, build artifacts, repositories and the last
/// published resolution.
///
/// A fresh session resolves against Maven Central only.
#[derive(Debug)]
pub struct Session {
    pub(crate) context: ResolutionContext,
    pub(crate) registry: RepositoryRegistry,
    pub(crate) verbose: bool,
}

impl Session {
    pub fn new(config: ResolveConfig) -> Self {
        Self {
            context: ResolutionContext::new(config),
            registry: RepositoryRegistry::with_central(),
            verbose: false,
        }
    }

    /// A session configured from `~/.jarpath/config.toml`.
    pub fn from_default_config() -> miette::Result<Self> {
        Ok(Self::new(ResolveConfig::load()?))
    }

    /// Print status lines and a spinner while resolving.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn config(&self) -> &ResolveConfig {
        self.context.config()
    }

    pub fn context(&self) -> &ResolutionContext {
        &self.context
    }

    pub fn registry(&self) -> &RepositoryRegistry {
        &self.registry
    }

    /// Root of the local repository used for cached POMs and artifacts.
    pub fn local_repository(&self) -> PathBuf {
        self.config().local_repository()
    }

    /// Move the local repository. Cached metadata and materialized paths
    /// from the old location are forgotten.
    pub async fn set_local_repository(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        tracing::debug!("Local repository set to {}", path.display());
        self.context.config_mut().local_repository = Some(path);
        self.context.invalidate_caches().await;
    }

    /// Declare a compile-scoped dependency.
    pub fn add_dependency(&mut self, notation: &str) -> miette::Result<()> {
        self.add_dependency_with_scope(notation, Scope::Compile.as_str())
    }

    pub fn add_dependency_with_scope(&mut self, notation: &str, scope: &str) -> miette::Result<()> {
        let coordinate = self.parse_notation(notation)?;
        let scope: Scope = scope.parse()?;
        self.context
            .add_dependency(DependencyEdge::root(coordinate, scope));
        Ok(())
    }

    pub fn clear_dependencies(&mut self) {
        self.context.clear_dependencies();
    }

    /// Register a locally built artifact. Without a descriptor it is
    /// treated as having no dependencies.
    pub fn add_build_artifact(
        &mut self,
        notation: &str,
        artifact_path: impl Into<PathBuf>,
        descriptor_path: Option<PathBuf>,
    ) -> miette::Result<()> {
        let coordinate = self.parse_notation(notation)?;
        self.context.add_build_artifact(BuildArtifact::new(
            coordinate,
            artifact_path,
            descriptor_path,
        ));
        Ok(())
    }

    pub fn clear_build_artifacts(&mut self) {
        self.context.clear_build_artifacts();
    }

    /// Maven-backed collaborators for the registered repositories and the
    /// current local repository.
    pub fn collaborators(&self) -> miette::Result<Collaborators> {
        let config = self.config();
        let client = download::build_client(config.fetch_timeout())?;
        let cache = LocalCache::new(config.local_repository());
        let repositories = self.registry.list().to_vec();

        let metadata = PomMetadataProvider::new(client.clone(), repositories.clone(), cache.clone());
        let materializer = RepositoryMaterializer::new(client, repositories, cache);
        Ok(Collaborators::new(Arc::new(metadata))
            .with_materializer(Arc::new(materializer))
            .with_descriptor_reader(Arc::new(PomDescriptorReader)))
    }

    pub(crate) fn parse_notation(&self, notation: &str) -> Result<Coordinate, JarpathError> {
        Coordinate::parse_with_default(notation, &self.config().default_packaging)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(ResolveConfig::default())
    }
}
