//! In-memory collaborators for resolver tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use jarpath_core::config::ResolveConfig;
use jarpath_core::coordinate::Coordinate;
use jarpath_core::dependency::DependencyEdge;
use jarpath_core::provider::{ArtifactMaterializer, DescriptorReader, MetadataProvider};
use jarpath_core::scope::Scope;
use jarpath_resolver::context::{Collaborators, Resolution, ResolutionContext};
use jarpath_util::errors::JarpathError;
use tokio_util::sync::CancellationToken;

pub fn coord(notation: &str) -> Coordinate {
    Coordinate::parse(notation).unwrap()
}

/// A root declaration.
pub fn declare(notation: &str, scope: Scope) -> DependencyEdge {
    DependencyEdge::root(coord(notation), scope)
}

/// Metadata served from memory, with optional per-coordinate latency.
#[derive(Default)]
pub struct FakeRepository {
    deps: HashMap<Coordinate, Vec<DependencyEdge>>,
    delays: HashMap<Coordinate, Duration>,
    unreachable: HashSet<Coordinate>,
    fetches: Mutex<Vec<Coordinate>>,
}

impl FakeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `from`'s dependencies as `(notation, scope)` pairs.
    pub fn with(mut self, from: &str, deps: &[(&str, Scope)]) -> Self {
        let from_coord = coord(from);
        let edges = deps
            .iter()
            .map(|(to, scope)| DependencyEdge::new(from_coord.clone(), coord(to), *scope))
            .collect();
        self.deps.insert(from_coord, edges);
        self
    }

    /// Declare `from`'s dependencies as prepared edges.
    pub fn with_edges(mut self, from: &str, edges: Vec<DependencyEdge>) -> Self {
        self.deps.insert(coord(from), edges);
        self
    }

    /// A coordinate with no dependencies.
    pub fn leaf(self, notation: &str) -> Self {
        self.with(notation, &[])
    }

    pub fn delay(mut self, notation: &str, millis: u64) -> Self {
        self.delays
            .insert(coord(notation), Duration::from_millis(millis));
        self
    }

    pub fn unreachable(mut self, notation: &str) -> Self {
        self.unreachable.insert(coord(notation));
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.lock().unwrap().len()
    }

    pub fn fetched(&self, notation: &str) -> usize {
        let target = coord(notation);
        self.fetches
            .lock()
            .unwrap()
            .iter()
            .filter(|c| **c == target)
            .count()
    }
}

#[async_trait]
impl MetadataProvider for FakeRepository {
    async fn fetch_dependencies(
        &self,
        coordinate: &Coordinate,
    ) -> Result<Vec<DependencyEdge>, JarpathError> {
        self.fetches.lock().unwrap().push(coordinate.clone());
        if let Some(delay) = self.delays.get(coordinate) {
            tokio::time::sleep(*delay).await;
        }
        if self.unreachable.contains(coordinate) {
            return Err(JarpathError::Network {
                message: "connection refused".to_string(),
            });
        }
        self.deps
            .get(coordinate)
            .cloned()
            .ok_or_else(|| JarpathError::MissingMetadata {
                coordinate: coordinate.to_string(),
            })
    }
}

/// Pretends every artifact lives under `/m2`.
#[derive(Default)]
pub struct FakeMaterializer {
    pub calls: AtomicUsize,
}

impl FakeMaterializer {
    pub fn path_for(coordinate: &Coordinate) -> PathBuf {
        PathBuf::from("/m2").join(coordinate.file_name())
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArtifactMaterializer for FakeMaterializer {
    async fn materialize(&self, coordinate: &Coordinate) -> Result<PathBuf, JarpathError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Self::path_for(coordinate))
    }
}

/// Descriptor reader backed by a fixed table keyed by descriptor path.
#[derive(Default)]
pub struct FakeDescriptors {
    by_path: HashMap<PathBuf, Vec<(String, Scope)>>,
}

impl FakeDescriptors {
    pub fn with(mut self, path: &str, deps: &[(&str, Scope)]) -> Self {
        self.by_path.insert(
            PathBuf::from(path),
            deps.iter().map(|(n, s)| (n.to_string(), *s)).collect(),
        );
        self
    }
}

impl DescriptorReader for FakeDescriptors {
    fn read_dependencies(
        &self,
        coordinate: &Coordinate,
        descriptor: &Path,
    ) -> Result<Vec<DependencyEdge>, JarpathError> {
        let deps = self
            .by_path
            .get(descriptor)
            .ok_or_else(|| JarpathError::Descriptor {
                message: format!("no descriptor at {}", descriptor.display()),
            })?;
        Ok(deps
            .iter()
            .map(|(n, s)| DependencyEdge::new(coordinate.clone(), coord(n), *s))
            .collect())
    }
}

/// A configuration that never materializes.
pub fn offline_config() -> ResolveConfig {
    ResolveConfig {
        download_artifacts: false,
        ..ResolveConfig::default()
    }
}

/// Resolve `roots` against `repo` with a fresh context.
pub async fn resolve_with(
    repo: Arc<FakeRepository>,
    roots: Vec<DependencyEdge>,
    config: ResolveConfig,
) -> Result<Arc<Resolution>, JarpathError> {
    let mut ctx = ResolutionContext::new(config);
    for root in roots {
        ctx.add_dependency(root);
    }
    ctx.resolve(&Collaborators::new(repo), CancellationToken::new())
        .await
}

/// `notation (scope)` for each resolved entry, in resolution order.
pub fn summary(resolution: &Resolution) -> Vec<String> {
    resolution
        .resolved
        .iter()
        .map(|e| format!("{} ({})", e.coordinate, e.scope))
        .collect()
}
