//! Conflict resolution: reduces the collected graph to one version per
//! identity key ("nearest wins, first declared wins ties"), then applies the
//! build artifact overlay and the scope filter.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use jarpath_core::config::ResolveConfig;
use jarpath_core::coordinate::{Coordinate, IdentityKey};
use jarpath_core::scope::Scope;
use jarpath_util::errors::JarpathError;
use petgraph::graph::NodeIndex;

use crate::graph::{DependencyGraph, GraphNode};
use crate::overlay::BuildArtifactOverlay;

/// The selected coordinate for one identity key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEntry {
    pub coordinate: Coordinate,
    pub scope: Scope,
    /// True only when every occurrence of the key was optional.
    pub optional: bool,
    /// Depth of the winning occurrence.
    pub depth: usize,
    /// Local file, once known (build artifact or materialized download).
    pub path: Option<PathBuf>,
    pub from_overlay: bool,
}

/// Resolved entries in resolution order, unique by identity key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedSet {
    entries: Vec<ResolvedEntry>,
    index: HashMap<IdentityKey, usize>,
}

impl ResolvedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. A second entry for the same identity key is an
    /// invariant violation.
    pub fn insert(&mut self, entry: ResolvedEntry) -> Result<(), JarpathError> {
        let key = entry.coordinate.key();
        if self.index.contains_key(&key) {
            return Err(JarpathError::ConflictResolution {
                message: format!("{key} resolved twice"),
            });
        }
        self.index.insert(key, self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    pub fn get(&self, key: &IdentityKey) -> Option<&ResolvedEntry> {
        self.index.get(key).map(|&pos| &self.entries[pos])
    }

    pub fn get_mut(&mut self, key: &IdentityKey) -> Option<&mut ResolvedEntry> {
        self.index.get(key).map(|&pos| &mut self.entries[pos])
    }

    pub fn contains(&self, key: &IdentityKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedEntry> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ResolvedEntry> {
        self.entries.iter_mut()
    }

    /// Keep only entries matching `f`, preserving order.
    pub fn retain(&mut self, f: impl FnMut(&ResolvedEntry) -> bool) {
        self.entries.retain(f);
        self.index = self
            .entries
            .iter()
            .enumerate()
            .map(|(pos, e)| (e.coordinate.key(), pos))
            .collect();
    }

    pub fn coordinates(&self) -> Vec<Coordinate> {
        self.entries.iter().map(|e| e.coordinate.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A report of all version conflicts encountered during resolution.
#[derive(Debug, Clone, Default)]
pub struct ConflictReport {
    pub conflicts: Vec<VersionConflict>,
}

/// A requested version that lost to another for the same identity key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionConflict {
    pub key: IdentityKey,
    pub requested: String,
    pub resolved: String,
    pub reason: String,
}

impl ConflictReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a conflict unless the same request was already recorded.
    pub fn add(&mut self, conflict: VersionConflict) {
        let seen = self
            .conflicts
            .iter()
            .any(|c| c.key == conflict.key && c.requested == conflict.requested);
        if !seen {
            self.conflicts.push(conflict);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conflicts.len()
    }
}

impl fmt::Display for ConflictReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.conflicts.is_empty() {
            return write!(f, "No version conflicts.");
        }
        writeln!(f, "Version conflicts ({}):", self.conflicts.len())?;
        for c in &self.conflicts {
            writeln!(f, "  {c}")?;
        }
        Ok(())
    }
}

impl fmt::Display for VersionConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} requested {} but resolved {} ({})",
            self.key, self.requested, self.resolved, self.reason
        )
    }
}

/// Output of conflict resolution.
#[derive(Debug, Clone, Default)]
pub struct Resolved {
    pub set: ResolvedSet,
    pub conflicts: ConflictReport,
}

/// Select one coordinate per identity key.
///
/// Occurrences are considered level by level, following only the children
/// of winners. Within a key the occurrence with the smallest
/// (depth, declaration order, sequence) wins, which does not depend on the
/// order metadata arrived in. With `ignore-optional-subtrees` a required
/// occurrence beats any optional one, since optional occurrences were not
/// expanded.
pub fn resolve(
    graph: &DependencyGraph,
    overlay: &BuildArtifactOverlay,
    config: &ResolveConfig,
) -> Result<Resolved, JarpathError> {
    let mut winners: HashMap<IdentityKey, NodeIndex> = HashMap::new();
    let mut candidates: HashMap<IdentityKey, Vec<NodeIndex>> = HashMap::new();
    let beats = |challenger: &GraphNode, current: &GraphNode| {
        if config.ignore_optional_subtrees && challenger.optional != current.optional {
            return !challenger.optional;
        }
        challenger.rank() < current.rank()
    };

    let mut level: Vec<NodeIndex> = graph.roots().to_vec();
    while !level.is_empty() {
        let mut chosen: Vec<NodeIndex> = Vec::new();
        for &idx in &level {
            let node = graph.node(idx);
            let key = node.key();
            candidates.entry(key.clone()).or_default().push(idx);
            match winners.get(&key).copied() {
                None => {
                    winners.insert(key, idx);
                    chosen.push(idx);
                }
                Some(current) if beats(node, graph.node(current)) => {
                    chosen.retain(|&c| c != current);
                    chosen.push(idx);
                    winners.insert(key, idx);
                }
                Some(_) => {}
            }
        }
        chosen.sort_unstable_by_key(|&idx| graph.node(idx).rank());
        level = chosen
            .into_iter()
            .flat_map(|idx| graph.children(idx))
            .collect();
    }

    let scopes = derive_scopes(graph, &winners, &candidates);

    let mut ordered: Vec<(IdentityKey, NodeIndex)> = winners.into_iter().collect();
    ordered.sort_unstable_by_key(|(_, idx)| graph.node(*idx).rank());

    let mut resolved = Resolved::default();
    for (key, winner_idx) in ordered {
        let winner = graph.node(winner_idx);
        let occurrences = candidates.get(&key).map(Vec::as_slice).unwrap_or_default();
        let scope = scopes.get(&key).copied().unwrap_or(winner.scope);
        let optional = occurrences.iter().all(|&idx| graph.node(idx).optional);

        for &idx in occurrences {
            let loser = graph.node(idx);
            if idx == winner_idx || loser.coordinate.version() == winner.coordinate.version() {
                continue;
            }
            let reason = if loser.depth > winner.depth {
                format!("nearest wins (depth {} vs {})", winner.depth, loser.depth)
            } else if loser.optional && !winner.optional && config.ignore_optional_subtrees {
                format!("optional path ignored at depth {}", loser.depth)
            } else {
                format!("first declared at depth {}", winner.depth)
            };
            resolved.conflicts.add(VersionConflict {
                key: key.clone(),
                requested: loser.coordinate.version().to_string(),
                resolved: winner.coordinate.version().to_string(),
                reason,
            });
        }

        tracing::debug!("Resolved {} ({scope})", winner.coordinate);
        resolved.set.insert(ResolvedEntry {
            coordinate: winner.coordinate.clone(),
            scope,
            optional,
            depth: winner.depth,
            path: None,
            from_overlay: false,
        })?;
    }

    apply_overlay(&mut resolved, overlay);
    resolved.set.retain(|entry| config.retains(entry.scope));
    Ok(resolved)
}

/// Resolved scope of every key.
///
/// A direct winner keeps its declared scope; any other key takes the widest
/// scope among its candidates. A candidate's scope is re-derived from the
/// resolved scope of its parent's key and the scope declared on its edge,
/// so widening a key also widens what it brings in. Scopes only widen, so
/// the iteration reaches a fixed point.
fn derive_scopes(
    graph: &DependencyGraph,
    winners: &HashMap<IdentityKey, NodeIndex>,
    candidates: &HashMap<IdentityKey, Vec<NodeIndex>>,
) -> HashMap<IdentityKey, Scope> {
    let mut effective: HashMap<NodeIndex, Scope> = candidates
        .values()
        .flatten()
        .map(|&idx| (idx, graph.node(idx).scope))
        .collect();

    loop {
        let scopes: HashMap<IdentityKey, Scope> = winners
            .iter()
            .map(|(key, &winner)| {
                let occurrences = candidates.get(key).map(Vec::as_slice).unwrap_or_default();
                (key.clone(), key_scope(graph, winner, occurrences, &effective))
            })
            .collect();

        let mut widened = false;
        for (&idx, scope) in effective.iter_mut() {
            let Some(parent) = graph.parent(idx) else {
                continue;
            };
            let Some(parent_scope) = scopes.get(&graph.node(parent).key()) else {
                continue;
            };
            let Some(derived) = parent_scope.propagate(graph.node(idx).declared_scope) else {
                continue;
            };
            if derived.width() > scope.width() {
                *scope = derived;
                widened = true;
            }
        }
        if !widened {
            return scopes;
        }
    }
}

fn key_scope(
    graph: &DependencyGraph,
    winner: NodeIndex,
    occurrences: &[NodeIndex],
    effective: &HashMap<NodeIndex, Scope>,
) -> Scope {
    let scope_of = |idx: NodeIndex| effective.get(&idx).copied().unwrap_or(graph.node(idx).scope);
    if graph.node(winner).depth == 1 {
        return scope_of(winner);
    }
    occurrences
        .iter()
        .map(|&idx| scope_of(idx))
        .max_by_key(|scope| scope.width())
        .unwrap_or_else(|| scope_of(winner))
}

/// Replace resolved entries with the build artifacts sharing their key.
fn apply_overlay(resolved: &mut Resolved, overlay: &BuildArtifactOverlay) {
    for artifact in overlay.iter() {
        let key = artifact.coordinate.key();
        let Some(entry) = resolved.set.get_mut(&key) else {
            continue;
        };
        if entry.coordinate != artifact.coordinate {
            resolved.conflicts.add(VersionConflict {
                key,
                requested: entry.coordinate.version().to_string(),
                resolved: artifact.coordinate.version().to_string(),
                reason: "build artifact override".to_string(),
            });
        }
        entry.coordinate = artifact.coordinate.clone();
        entry.path = Some(artifact.artifact_path.clone());
        entry.from_overlay = true;
    }
}
