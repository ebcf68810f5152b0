//! Dependency scopes and the rules for carrying them through transitive edges.

use std::fmt;
use std::str::FromStr;

use jarpath_util::errors::JarpathError;
use serde::{Deserialize, Serialize};

/// Maven-compatible dependency scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Compile,
    Runtime,
    Provided,
    Test,
    System,
    Import,
}

impl Default for Scope {
    fn default() -> Self {
        Self::Compile
    }
}

impl Scope {
    pub const ALL: [Scope; 6] = [
        Scope::Compile,
        Scope::Runtime,
        Scope::Provided,
        Scope::Test,
        Scope::System,
        Scope::Import,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compile => "compile",
            Self::Runtime => "runtime",
            Self::Provided => "provided",
            Self::Test => "test",
            Self::System => "system",
            Self::Import => "import",
        }
    }

    /// Effective scope of a transitive dependency declared with `declared`
    /// beneath a node whose effective scope is `self`.
    ///
    /// Returns `None` when the edge does not propagate: `test`, `provided`,
    /// `system` and `import` dependencies of a dependency stay inside their
    /// own subtree, and nothing is inherited through a `system` node.
    pub fn propagate(self, declared: Scope) -> Option<Scope> {
        match (self, declared) {
            (_, Scope::Test | Scope::Provided | Scope::System | Scope::Import) => None,
            (Scope::Compile, Scope::Compile) => Some(Scope::Compile),
            (Scope::Compile, Scope::Runtime) => Some(Scope::Runtime),
            (Scope::Runtime, _) => Some(Scope::Runtime),
            (Scope::Test, _) => Some(Scope::Test),
            (Scope::Provided, _) => Some(Scope::Provided),
            (Scope::System | Scope::Import, _) => None,
        }
    }

    /// Whether a node with this effective scope has its own dependencies
    /// expanded.
    pub fn expands(self) -> bool {
        !matches!(self, Scope::System | Scope::Import)
    }

    /// Relative breadth used when several candidates for the same artifact
    /// carry different scopes; the widest one is kept.
    pub fn width(self) -> u8 {
        match self {
            Self::Compile => 5,
            Self::Runtime => 4,
            Self::Provided => 3,
            Self::System => 2,
            Self::Test => 1,
            Self::Import => 0,
        }
    }
}

impl FromStr for Scope {
    type Err = JarpathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compile" | "" => Ok(Self::Compile),
            "runtime" => Ok(Self::Runtime),
            "provided" => Ok(Self::Provided),
            "test" => Ok(Self::Test),
            "system" => Ok(Self::System),
            "import" => Ok(Self::Import),
            other => Err(JarpathError::Config {
                message: format!("unknown dependency scope `{other}`"),
            }),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
