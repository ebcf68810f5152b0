use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for all jarpath operations.
#[derive(Debug, Error, Diagnostic)]
pub enum JarpathError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed coordinate notation.
    #[error("Invalid notation `{notation}`: {reason}")]
    #[diagnostic(help(
        "Use group:artifact:version, group:artifact:type:version or group:artifact:type:classifier:version"
    ))]
    Notation { notation: String, reason: String },

    /// Malformed repository URL or repository configuration.
    #[error("Repository configuration error: {message}")]
    RepositoryConfig { message: String },

    /// No metadata could be found for a coordinate in any repository.
    #[error("Missing metadata for {coordinate}")]
    #[diagnostic(help("Check the coordinate and the configured repositories"))]
    MissingMetadata { coordinate: String },

    /// A dependency cycle was found while acyclicity is enforced.
    #[error("Cyclic dependency: {}", path.join(" -> "))]
    CyclicDependency { path: Vec<String> },

    /// An internal resolver invariant was violated.
    #[error("Conflict resolution invariant violated: {message}")]
    ConflictResolution { message: String },

    /// Downloading or caching an artifact failed.
    #[error("Failed to materialize {coordinate}: {message}")]
    Materialization { coordinate: String, message: String },

    /// A collaborator failed at the transport level for a coordinate.
    #[error("Transport failure for {coordinate}: {message}")]
    Transport { coordinate: String, message: String },

    /// Network request or download failed.
    #[error("Network error: {message}")]
    Network { message: String },

    /// A dependency descriptor (POM) could not be read or parsed.
    #[error("Descriptor error: {message}")]
    Descriptor { message: String },

    /// Invalid or unreadable configuration file.
    #[error("Configuration error: {message}")]
    #[diagnostic(help("Check ~/.jarpath/config.toml for syntax errors"))]
    Config { message: String },

    /// Resolution was cancelled before completion.
    #[error("Resolution cancelled")]
    Cancelled,
}

impl JarpathError {
    /// Whether this is a per-coordinate collection failure that lenient mode
    /// may tolerate.
    pub fn is_metadata_failure(&self) -> bool {
        matches!(
            self,
            Self::MissingMetadata { .. } | Self::Transport { .. } | Self::Descriptor { .. }
        )
    }
}

/// Convenience alias for `miette::Result<T>`.
pub type JarpathResult<T> = miette::Result<T>;
