//! Locally built artifacts that stand in for repository resolution.

use std::collections::HashMap;

use jarpath_core::artifact::BuildArtifact;
use jarpath_core::coordinate::IdentityKey;

/// Build artifacts keyed by identity key, in registration order.
#[derive(Debug, Clone, Default)]
pub struct BuildArtifactOverlay {
    artifacts: Vec<BuildArtifact>,
    index: HashMap<IdentityKey, usize>,
}

impl BuildArtifactOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an artifact. A later registration for the same identity key
    /// replaces the earlier one.
    pub fn add(&mut self, artifact: BuildArtifact) {
        let key = artifact.coordinate.key();
        match self.index.get(&key) {
            Some(&pos) => self.artifacts[pos] = artifact,
            None => {
                self.index.insert(key, self.artifacts.len());
                self.artifacts.push(artifact);
            }
        }
    }

    pub fn get(&self, key: &IdentityKey) -> Option<&BuildArtifact> {
        self.index.get(key).map(|&pos| &self.artifacts[pos])
    }

    pub fn iter(&self) -> impl Iterator<Item = &BuildArtifact> {
        self.artifacts.iter()
    }

    pub fn clear(&mut self) {
        self.artifacts.clear();
        self.index.clear();
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}
