//! Dependency collection: breadth-first expansion of the declared
//! dependencies into the raw graph.
//!
//! Metadata for one BFS level is fetched concurrently, bounded by
//! `fetch-concurrency`. Results are merged back in frontier order, and
//! depth, declaration order and sequence numbers are assigned while
//! merging, so fetch timing never changes the graph.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use jarpath_core::artifact::BuildArtifact;
use jarpath_core::config::ResolveConfig;
use jarpath_core::coordinate::{Coordinate, IdentityKey};
use jarpath_core::dependency::{DependencyEdge, Exclusion};
use jarpath_core::provider::{DescriptorReader, MetadataProvider};
use jarpath_core::scope::Scope;
use jarpath_util::errors::JarpathError;
use petgraph::graph::NodeIndex;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::cache::MetadataCache;
use crate::graph::{DependencyGraph, GraphNode};
use crate::overlay::BuildArtifactOverlay;

type Edges = Arc<Vec<DependencyEdge>>;

/// The raw graph plus what was cut or tolerated while building it.
#[derive(Debug, Default)]
pub struct CollectedGraph {
    pub graph: DependencyGraph,
    /// Cycles cut during expansion, each from the root dependency down to
    /// the repeated coordinate.
    pub cycles: Vec<Vec<Coordinate>>,
    /// Metadata failures tolerated in lenient mode, in frontier order.
    pub failures: Vec<JarpathError>,
}

/// A node waiting for its dependencies to be fetched.
struct Pending {
    node: NodeIndex,
    /// Exclusions inherited from every edge on the path to this node.
    exclusions: Arc<BTreeSet<Exclusion>>,
}

/// Mutable bookkeeping for one collection run.
#[derive(Default)]
struct Walk {
    out: CollectedGraph,
    first_seen: HashMap<IdentityKey, NodeIndex>,
    sequence: usize,
}

impl Walk {
    fn next_sequence(&mut self) -> usize {
        let seq = self.sequence;
        self.sequence += 1;
        seq
    }
}

pub struct Collector {
    provider: Arc<dyn MetadataProvider>,
    descriptors: Option<Arc<dyn DescriptorReader>>,
    cache: Arc<MetadataCache>,
    config: ResolveConfig,
    cancel: CancellationToken,
}

impl Collector {
    pub fn new(provider: Arc<dyn MetadataProvider>, config: ResolveConfig) -> Self {
        Self {
            provider,
            descriptors: None,
            cache: Arc::new(MetadataCache::new()),
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Share a metadata cache with other collections.
    pub fn with_cache(mut self, cache: Arc<MetadataCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Reader for descriptors of build artifacts in the overlay.
    pub fn with_descriptor_reader(mut self, reader: Arc<dyn DescriptorReader>) -> Self {
        self.descriptors = Some(reader);
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Expand `roots` into the full dependency graph.
    pub async fn collect(
        &self,
        roots: &[DependencyEdge],
        overlay: &BuildArtifactOverlay,
    ) -> Result<CollectedGraph, JarpathError> {
        let mut walk = Walk::default();
        let mut frontier = Vec::new();

        for (order, edge) in roots.iter().enumerate() {
            if edge.scope == Scope::Import {
                tracing::debug!("Skipping import-scoped {}", edge.to);
                continue;
            }
            let node = GraphNode {
                coordinate: edge.to.clone(),
                scope: edge.scope,
                declared_scope: edge.scope,
                depth: 1,
                declaration_order: order,
                sequence: walk.next_sequence(),
                optional: edge.optional,
            };
            let idx = walk.out.graph.add_root(node);
            if self.should_expand(&mut walk, idx, overlay) {
                frontier.push(Pending {
                    node: idx,
                    exclusions: Arc::new(edge.exclusions.clone()),
                });
            }
        }

        let semaphore = Arc::new(Semaphore::new(self.config.fetch_concurrency.max(1)));
        while !frontier.is_empty() {
            if self.cancel.is_cancelled() {
                return Err(JarpathError::Cancelled);
            }

            let results = self
                .fetch_level(&walk.out.graph, &frontier, overlay, &semaphore)
                .await;

            let mut next = Vec::new();
            for (pending, result) in frontier.iter().zip(results) {
                let edges = match result {
                    Ok(edges) => edges,
                    Err(JarpathError::Cancelled) => return Err(JarpathError::Cancelled),
                    Err(e) if self.config.lenient_metadata && e.is_metadata_failure() => {
                        tracing::warn!("{e}; continuing without its dependencies");
                        walk.out.failures.push(e);
                        continue;
                    }
                    Err(e) => return Err(e),
                };
                for edge in edges.iter() {
                    if let Some(child) = self.enqueue_child(&mut walk, pending, edge, overlay)? {
                        next.push(child);
                    }
                }
            }
            frontier = next;
        }

        tracing::info!(
            "Collected {} nodes from {} declared dependencies",
            walk.out.graph.len(),
            roots.len()
        );
        Ok(walk.out)
    }

    /// Whether a freshly added node gets its own dependencies expanded.
    ///
    /// Only the first occurrence of an identity key is expanded; later
    /// occurrences stay in the graph as leaf candidates. With
    /// `ignore-optional-subtrees`, optional occurrences are leaves that do
    /// not count as the first occurrence, so a later required one still
    /// gets expanded.
    fn should_expand(
        &self,
        walk: &mut Walk,
        idx: NodeIndex,
        overlay: &BuildArtifactOverlay,
    ) -> bool {
        let node = walk.out.graph.node(idx);
        if node.optional && self.config.ignore_optional_subtrees {
            return false;
        }
        let key = node.key();
        if walk.first_seen.contains_key(&key) {
            return false;
        }
        let expands = node.scope.expands()
            && overlay
                .get(&key)
                .map_or(true, |artifact| artifact.descriptor_path.is_some());
        walk.first_seen.insert(key, idx);
        expands
    }

    fn enqueue_child(
        &self,
        walk: &mut Walk,
        parent: &Pending,
        edge: &DependencyEdge,
        overlay: &BuildArtifactOverlay,
    ) -> Result<Option<Pending>, JarpathError> {
        let graph = &walk.out.graph;
        let (parent_scope, parent_depth, declaration_order, parent_optional) = {
            let p = graph.node(parent.node);
            (p.scope, p.depth, p.declaration_order, p.optional)
        };

        if edge.scope == Scope::Import {
            tracing::debug!("Skipping import-scoped {}", edge.to);
            return Ok(None);
        }
        let Some(scope) = parent_scope.propagate(edge.scope) else {
            tracing::debug!("{} ({}) is not inherited", edge.to, edge.scope);
            return Ok(None);
        };
        if let Some(exclusion) = parent.exclusions.iter().find(|x| x.matches(&edge.to)) {
            tracing::debug!("{} excluded by {exclusion}", edge.to);
            return Ok(None);
        }

        let key = edge.to.key();
        if graph.on_ancestor_chain(parent.node, &key) {
            let mut path: Vec<Coordinate> = graph
                .path_to(parent.node)
                .into_iter()
                .map(|idx| graph.node(idx).coordinate.clone())
                .collect();
            path.push(edge.to.clone());
            if self.config.strict_acyclic {
                return Err(JarpathError::CyclicDependency {
                    path: path.iter().map(ToString::to_string).collect(),
                });
            }
            tracing::debug!("Cycle cut at {}", edge.to);
            walk.out.cycles.push(path);
            return Ok(None);
        }

        let node = GraphNode {
            coordinate: edge.to.clone(),
            scope,
            declared_scope: edge.scope,
            depth: parent_depth + 1,
            declaration_order,
            sequence: walk.next_sequence(),
            optional: parent_optional || edge.optional,
        };
        let idx = walk.out.graph.add_child(parent.node, node);
        if !self.should_expand(walk, idx, overlay) {
            return Ok(None);
        }

        let exclusions = if edge.exclusions.is_empty() {
            parent.exclusions.clone()
        } else {
            Arc::new(
                parent
                    .exclusions
                    .union(&edge.exclusions)
                    .cloned()
                    .collect(),
            )
        };
        Ok(Some(Pending {
            node: idx,
            exclusions,
        }))
    }

    /// Declared dependencies of every frontier node, in frontier order.
    async fn fetch_level(
        &self,
        graph: &DependencyGraph,
        frontier: &[Pending],
        overlay: &BuildArtifactOverlay,
        semaphore: &Arc<Semaphore>,
    ) -> Vec<Result<Edges, JarpathError>> {
        let mut results: Vec<Option<Result<Edges, JarpathError>>> =
            (0..frontier.len()).map(|_| None).collect();
        let mut tasks = JoinSet::new();

        for (slot, pending) in frontier.iter().enumerate() {
            let coordinate = graph.node(pending.node).coordinate.clone();
            if let Some(artifact) = overlay.get(&coordinate.key()) {
                results[slot] = Some(self.read_descriptor(artifact));
                continue;
            }

            let provider = self.provider.clone();
            let cache = self.cache.clone();
            let semaphore = semaphore.clone();
            let cancel = self.cancel.clone();
            let timeout = self.config.fetch_timeout();
            tasks.spawn(async move {
                let result = tokio::select! {
                    _ = cancel.cancelled() => Err(JarpathError::Cancelled),
                    r = fetch_one(provider, cache, semaphore, &coordinate, timeout) => r,
                };
                (slot, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((slot, result)) => results[slot] = Some(result),
                Err(e) => tracing::warn!("Metadata fetch task failed: {e}"),
            }
        }

        results
            .into_iter()
            .zip(frontier)
            .map(|(result, pending)| {
                result.unwrap_or_else(|| {
                    Err(JarpathError::Transport {
                        coordinate: graph.node(pending.node).coordinate.to_string(),
                        message: "metadata fetch task aborted".to_string(),
                    })
                })
            })
            .collect()
    }

    fn read_descriptor(&self, artifact: &BuildArtifact) -> Result<Edges, JarpathError> {
        let coordinate = &artifact.coordinate;
        let (Some(path), Some(reader)) = (&artifact.descriptor_path, &self.descriptors) else {
            tracing::warn!("No descriptor reader for build artifact {coordinate}");
            return Ok(Arc::new(Vec::new()));
        };
        tracing::debug!("Reading {coordinate} dependencies from {}", path.display());
        reader
            .read_dependencies(coordinate, path)
            .map(Arc::new)
            .map_err(|e| attribute(coordinate, e))
    }
}

async fn fetch_one(
    provider: Arc<dyn MetadataProvider>,
    cache: Arc<MetadataCache>,
    semaphore: Arc<Semaphore>,
    coordinate: &Coordinate,
    timeout: Duration,
) -> Result<Edges, JarpathError> {
    cache
        .get_or_fetch(coordinate, || async {
            let _permit = semaphore
                .acquire()
                .await
                .map_err(|_| JarpathError::Cancelled)?;
            tracing::debug!("Fetching metadata for {coordinate}");
            match tokio::time::timeout(timeout, provider.fetch_dependencies(coordinate)).await {
                Ok(result) => result.map_err(|e| attribute(coordinate, e)),
                Err(_) => Err(JarpathError::Transport {
                    coordinate: coordinate.to_string(),
                    message: format!("timed out after {}s", timeout.as_secs()),
                }),
            }
        })
        .await
}

/// Tie a collaborator failure to the coordinate being fetched.
fn attribute(coordinate: &Coordinate, err: JarpathError) -> JarpathError {
    match err {
        JarpathError::MissingMetadata { .. }
        | JarpathError::Transport { .. }
        | JarpathError::Descriptor { .. }
        | JarpathError::Cancelled => err,
        other => JarpathError::Transport {
            coordinate: coordinate.to_string(),
            message: other.to_string(),
        },
    }
}
