use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use jarpath_util::errors::JarpathError;

use crate::scope::Scope;
use crate::DEFAULT_PACKAGING;

/// Options controlling a resolution, loaded from `~/.jarpath/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ResolveConfig {
    /// Materialize artifact files after resolution.
    #[serde(default = "default_true")]
    pub download_artifacts: bool,

    /// Continue past missing metadata, reporting failures alongside a
    /// best-effort graph.
    #[serde(default)]
    pub lenient_metadata: bool,

    /// Treat any dependency cycle as a fatal error.
    #[serde(default)]
    pub strict_acyclic: bool,

    /// Record optional dependencies as leaves instead of expanding them.
    #[serde(default)]
    pub ignore_optional_subtrees: bool,

    /// Maximum number of concurrent metadata fetches and downloads.
    #[serde(default = "default_fetch_concurrency")]
    pub fetch_concurrency: usize,

    /// Scopes kept in the resolved set. Absent means every scope.
    #[serde(default)]
    pub scope_filter: Option<BTreeSet<Scope>>,

    /// Whether optional-only entries appear in the exported classpath.
    #[serde(default = "default_true")]
    pub include_optional_in_classpath: bool,

    /// Timeout applied to every metadata fetch and materialization.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Local repository root. Absent means `~/.m2/repository`.
    #[serde(default)]
    pub local_repository: Option<PathBuf>,

    /// Packaging assumed for `group:artifact:version` notations.
    #[serde(default = "default_packaging")]
    pub default_packaging: String,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            download_artifacts: true,
            lenient_metadata: false,
            strict_acyclic: false,
            ignore_optional_subtrees: false,
            fetch_concurrency: default_fetch_concurrency(),
            scope_filter: None,
            include_optional_in_classpath: true,
            fetch_timeout_secs: default_fetch_timeout_secs(),
            local_repository: None,
            default_packaging: default_packaging(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_fetch_concurrency() -> usize {
    8
}

fn default_fetch_timeout_secs() -> u64 {
    120
}

fn default_packaging() -> String {
    DEFAULT_PACKAGING.to_string()
}

impl ResolveConfig {
    /// Load the configuration from the default path, or return defaults if
    /// the file doesn't exist.
    pub fn load() -> Result<Self, JarpathError> {
        Self::load_from(&Self::default_path())
    }

    /// Load the configuration from `path`, or return defaults if it doesn't
    /// exist.
    pub fn load_from(path: &Path) -> Result<Self, JarpathError> {
        if !path.is_file() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| JarpathError::Config {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        Self::parse_toml(&content)
    }

    /// Parse a TOML document into a configuration.
    pub fn parse_toml(content: &str) -> Result<Self, JarpathError> {
        let config: Self = toml::from_str(content).map_err(|e| JarpathError::Config {
            message: format!("Failed to parse configuration: {e}"),
        })?;
        if config.fetch_concurrency == 0 {
            return Err(JarpathError::Config {
                message: "fetch-concurrency must be at least 1".to_string(),
            });
        }
        Ok(config)
    }

    /// Returns the default path to the configuration file.
    pub fn default_path() -> PathBuf {
        jarpath_util::fs::home_dir()
            .join(".jarpath")
            .join("config.toml")
    }

    /// Whether entries of `scope` are kept in the resolved set.
    pub fn retains(&self, scope: Scope) -> bool {
        self.scope_filter
            .as_ref()
            .map_or(true, |scopes| scopes.contains(&scope))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// The local repository root, defaulting to `~/.m2/repository`.
    pub fn local_repository(&self) -> PathBuf {
        self.local_repository.clone().unwrap_or_else(|| {
            jarpath_util::fs::home_dir()
                .join(".m2")
                .join("repository")
        })
    }
}
