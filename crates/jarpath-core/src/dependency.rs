use std::collections::BTreeSet;
use std::fmt;

use crate::coordinate::Coordinate;
use crate::scope::Scope;

/// Matches any group or artifact in an [`Exclusion`].
pub const WILDCARD: &str = "*";

/// A declared dependency from one coordinate (or from the synthetic root
/// when `from` is `None`) to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyEdge {
    pub from: Option<Coordinate>,
    pub to: Coordinate,
    pub scope: Scope,
    pub optional: bool,
    pub exclusions: BTreeSet<Exclusion>,
}

/// A transitive dependency to exclude beneath an edge.
///
/// Either field may be [`WILDCARD`]; an exclusion parsed from a bare group
/// excludes every artifact of that group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Exclusion {
    pub group: String,
    pub artifact: String,
}

impl DependencyEdge {
    /// A dependency declared directly by the caller.
    pub fn root(to: Coordinate, scope: Scope) -> Self {
        Self {
            from: None,
            to,
            scope,
            optional: false,
            exclusions: BTreeSet::new(),
        }
    }

    /// A dependency declared in the metadata of `from`.
    pub fn new(from: Coordinate, to: Coordinate, scope: Scope) -> Self {
        Self {
            from: Some(from),
            ..Self::root(to, scope)
        }
    }

    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    pub fn exclude(mut self, exclusion: Exclusion) -> Self {
        self.exclusions.insert(exclusion);
        self
    }
}

impl fmt::Display for DependencyEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.from {
            Some(from) => write!(f, "{from} -> {} ({})", self.to, self.scope)?,
            None => write!(f, "{} ({})", self.to, self.scope)?,
        }
        if self.optional {
            write!(f, " optional")?;
        }
        Ok(())
    }
}

impl Exclusion {
    pub fn new(group: impl Into<String>, artifact: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            artifact: artifact.into(),
        }
    }

    /// Parse `group:artifact` or a bare `group`.
    pub fn parse(s: &str) -> Self {
        match s.split_once(':') {
            Some((group, artifact)) => Self::new(group, artifact),
            None => Self::new(s, WILDCARD),
        }
    }

    /// Whether this exclusion applies to `coordinate`.
    pub fn matches(&self, coordinate: &Coordinate) -> bool {
        (self.group == WILDCARD || self.group == coordinate.group())
            && (self.artifact == WILDCARD || self.artifact == coordinate.artifact())
    }
}

impl fmt::Display for Exclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.artifact)
    }
}
