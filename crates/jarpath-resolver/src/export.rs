//! Graph export: ordered classpath and the nested structural view.

use std::fmt;
use std::path::PathBuf;

use petgraph::graph::NodeIndex;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::conflict::{ResolvedEntry, ResolvedSet};
use crate::graph::DependencyGraph;

/// Files of the resolved set in resolution order. Entries without a known
/// file are skipped, as are optional entries unless `include_optional`.
pub fn classpath(set: &ResolvedSet, include_optional: bool) -> Vec<PathBuf> {
    classpath_with(set, include_optional, |entry| entry.path.clone())
}

/// Like [`classpath`], asking `resolve_file` for each entry's file.
pub fn classpath_with(
    set: &ResolvedSet,
    include_optional: bool,
    mut resolve_file: impl FnMut(&ResolvedEntry) -> Option<PathBuf>,
) -> Vec<PathBuf> {
    set.iter()
        .filter(|entry| include_optional || !entry.optional)
        .filter_map(|entry| resolve_file(entry))
        .collect()
}

/// Join paths with the host path-list separator.
pub fn to_classpath_string(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.to_string_lossy().to_string())
        .collect::<Vec<_>>()
        .join(classpath_separator())
}

fn classpath_separator() -> &'static str {
    if cfg!(windows) {
        ";"
    } else {
        ":"
    }
}

/// Nested mapping from coordinate notation to the notations of its
/// children, in declaration order.
///
/// Serializes as a JSON object whose keys keep that order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyTree(Vec<(String, DependencyTree)>);

impl DependencyTree {
    pub fn entries(&self) -> &[(String, DependencyTree)] {
        &self.0
    }

    pub fn get(&self, notation: &str) -> Option<&DependencyTree> {
        self.0
            .iter()
            .find(|(name, _)| name == notation)
            .map(|(_, children)| children)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn write_subtree(&self, f: &mut fmt::Formatter<'_>, prefix: &str) -> fmt::Result {
        let count = self.0.len();
        for (i, (name, children)) in self.0.iter().enumerate() {
            let is_last = i == count - 1;
            let connector = if is_last { "└── " } else { "├── " };
            writeln!(f, "{prefix}{connector}{name}")?;
            let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
            children.write_subtree(f, &child_prefix)?;
        }
        Ok(())
    }
}

impl Serialize for DependencyTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, children) in &self.0 {
            map.serialize_entry(name, children)?;
        }
        map.end()
    }
}

impl fmt::Display for DependencyTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, children) in &self.0 {
            writeln!(f, "{name}")?;
            children.write_subtree(f, "")?;
        }
        Ok(())
    }
}

/// The collected tree shape with resolved versions substituted.
///
/// Occurrences whose identity key is absent from the resolved set (for
/// example filtered by scope) are pruned with their subtrees. Sibling
/// occurrences that resolve to the same notation appear once.
pub fn structural_graph(graph: &DependencyGraph, set: &ResolvedSet) -> DependencyTree {
    build_level(graph, set, graph.roots())
}

fn build_level(graph: &DependencyGraph, set: &ResolvedSet, nodes: &[NodeIndex]) -> DependencyTree {
    let mut level: Vec<(String, DependencyTree)> = Vec::new();
    for &idx in nodes {
        let Some(entry) = set.get(&graph.node(idx).key()) else {
            continue;
        };
        let name = entry.coordinate.notation();
        if level.iter().any(|(existing, _)| *existing == name) {
            continue;
        }
        let children = build_level(graph, set, &graph.children(idx));
        level.push((name, children));
    }
    DependencyTree(level)
}
