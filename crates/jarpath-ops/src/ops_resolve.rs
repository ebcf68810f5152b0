//! Operation: resolve the declared dependencies and query the result.

use std::path::PathBuf;
use std::sync::Arc;

use jarpath_core::config::ResolveConfig;
use jarpath_resolver::conflict::ConflictReport;
use jarpath_resolver::context::{Collaborators, Resolution};
use jarpath_resolver::export::DependencyTree;
use jarpath_util::progress::{spinner, status, status_warn};
use tokio_util::sync::CancellationToken;

use crate::session::Session;

impl Session {
    /// Resolve against the registered repositories, downloading artifact
    /// files when `download` is set.
    /// The flag applies to this call only; the session configuration keeps
    /// its own `download-artifacts` setting.
    pub async fn resolve_dependencies(&mut self, download: bool) -> miette::Result<Arc<Resolution>> {
        let config = ResolveConfig {
            download_artifacts: download,
            ..self.context.config().clone()
        };
        let collaborators = self.collaborators()?;
        self.run_resolution(&collaborators, &config, CancellationToken::new())
            .await
    }

    /// Resolve with explicit collaborators. On failure or cancellation the
    /// previous resolution stays current.
    pub async fn resolve_dependencies_with(
        &mut self,
        collaborators: &Collaborators,
        cancel: CancellationToken,
    ) -> miette::Result<Arc<Resolution>> {
        let config = self.context.config().clone();
        self.run_resolution(collaborators, &config, cancel).await
    }

    async fn run_resolution(
        &mut self,
        collaborators: &Collaborators,
        config: &ResolveConfig,
        cancel: CancellationToken,
    ) -> miette::Result<Arc<Resolution>> {
        let declared = self.context.dependencies().len();
        let sp = self
            .verbose
            .then(|| spinner(&format!("Resolving {declared} dependencies...")));
        let result = self
            .context
            .resolve_with_config(collaborators, config, cancel)
            .await;
        if let Some(sp) = sp {
            sp.finish_and_clear();
        }
        let resolution = result?;

        if self.verbose {
            if !resolution.conflicts.is_empty() {
                eprint!("{}", resolution.conflicts);
            }
            for failure in &resolution.failures {
                status_warn("Skipped", &failure.to_string());
            }
            status(
                "Resolved",
                &format!("{} dependencies", resolution.resolved.len()),
            );
        }
        Ok(resolution)
    }

    fn resolution(&self) -> Option<&Arc<Resolution>> {
        self.context.current()
    }

    /// Whether a resolution has been published.
    pub fn is_resolved(&self) -> bool {
        self.resolution().is_some()
    }

    /// Classpath of the last resolution joined with the host path-list
    /// separator. Empty before the first resolution.
    pub fn resolved_classpath(&self) -> String {
        self.resolution()
            .map(|r| r.classpath_string())
            .unwrap_or_default()
    }

    /// Files of the last resolution in classpath order.
    pub fn resolved_classpath_entries(&self) -> Vec<PathBuf> {
        self.resolution().map(|r| r.classpath()).unwrap_or_default()
    }

    /// Notations of the resolved set, in resolution order.
    pub fn dependencies_notation(&self) -> Vec<String> {
        self.resolution().map(|r| r.notations()).unwrap_or_default()
    }

    /// Notation and local file of every resolved entry with a file.
    pub fn dependencies_path(&self) -> Vec<(String, PathBuf)> {
        self.resolution().map(|r| r.paths()).unwrap_or_default()
    }

    /// The structural dependency tree with resolved versions.
    pub fn dependencies_graph(&self) -> DependencyTree {
        self.resolution()
            .map(|r| r.dependency_tree())
            .unwrap_or_default()
    }

    /// The resolved notations once resolved, the declared ones before.
    pub fn current_dependencies(&self) -> Vec<String> {
        match self.resolution() {
            Some(r) => r.notations(),
            None => self
                .context
                .dependencies()
                .iter()
                .map(|edge| edge.to.notation())
                .collect(),
        }
    }

    pub fn conflicts(&self) -> Option<&ConflictReport> {
        self.resolution().map(|r| &r.conflicts)
    }
}
