//! Remote Maven repositories: URL layout, credentials, and the ordered
//! registry consulted during resolution.

use jarpath_core::coordinate::Coordinate;
use jarpath_util::errors::JarpathError;
use reqwest::Url;

/// Maven Central base URL.
pub const MAVEN_CENTRAL_URL: &str = "https://repo1.maven.org/maven2";

/// Repository layout type used for every repository jarpath creates.
pub const DEFAULT_LAYOUT: &str = "default";

/// Basic-auth credentials for a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: Option<String>,
}

/// A configured remote repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRepository {
    pub id: String,
    pub kind: String,
    pub url: String,
    pub credentials: Option<Credentials>,
}

impl RemoteRepository {
    /// Build a repository after validating its URL.
    pub fn new(id: &str, kind: &str, url: &str) -> Result<Self, JarpathError> {
        parse_url(url)?;
        if id.is_empty() {
            return Err(JarpathError::RepositoryConfig {
                message: format!("Repository id for {url} is empty"),
            });
        }
        Ok(Self {
            id: id.to_string(),
            kind: kind.to_string(),
            url: url.trim_end_matches('/').to_string(),
            credentials: None,
        })
    }

    /// Construct the default Maven Central repository.
    pub fn maven_central() -> Self {
        Self {
            id: "central".to_string(),
            kind: DEFAULT_LAYOUT.to_string(),
            url: MAVEN_CENTRAL_URL.to_string(),
            credentials: None,
        }
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Standard Maven layout directory for a coordinate.
    ///
    /// `org.jetbrains.kotlinx:kotlinx-coroutines-core:jar:1.8.0` becomes
    /// `org/jetbrains/kotlinx/kotlinx-coroutines-core/1.8.0`
    pub fn coordinate_path(coordinate: &Coordinate) -> String {
        format!(
            "{}/{}/{}",
            coordinate.group().replace('.', "/"),
            coordinate.artifact(),
            coordinate.version()
        )
    }

    /// Full URL to a specific file within the repository.
    pub fn file_url(&self, coordinate: &Coordinate, filename: &str) -> String {
        format!(
            "{}/{}/{}",
            self.url,
            Self::coordinate_path(coordinate),
            filename
        )
    }

    /// URL to the POM file for a coordinate.
    pub fn pom_url(&self, coordinate: &Coordinate) -> String {
        let filename = format!("{}-{}.pom", coordinate.artifact(), coordinate.version());
        self.file_url(coordinate, &filename)
    }

    /// URL to the artifact file for a coordinate.
    pub fn artifact_url(&self, coordinate: &Coordinate) -> String {
        self.file_url(coordinate, &coordinate.file_name())
    }

    /// Whether this repository has authentication configured.
    pub fn has_auth(&self) -> bool {
        self.credentials.is_some()
    }
}

/// Derive a repository id from a URL: host, then the path with separators
/// replaced by `-`, then an explicit port.
///
/// `https://repo.example.com:8443/maven/releases/` becomes
/// `repo.example.com-maven-releases-8443`.
pub fn derive_id(url: &str) -> Result<String, JarpathError> {
    let parsed = parse_url(url)?;
    let mut id = parsed.host_str().unwrap_or_default().to_string();

    let path = parsed
        .path()
        .trim_matches('/')
        .replace(['/', ':'], "-");
    if !path.is_empty() {
        id.push('-');
        id.push_str(&path);
    }
    if let Some(port) = parsed.port() {
        id.push('-');
        id.push_str(&port.to_string());
    }
    Ok(id)
}

fn parse_url(url: &str) -> Result<Url, JarpathError> {
    let parsed = Url::parse(url).map_err(|e| JarpathError::RepositoryConfig {
        message: format!("Invalid repository URL `{url}`: {e}"),
    })?;
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(JarpathError::RepositoryConfig {
            message: format!("Repository URL `{url}` has no host"),
        });
    }
    Ok(parsed)
}

/// Ordered set of remote repositories with unique ids.
///
/// Registration order is the order in which repositories are queried.
#[derive(Debug, Clone)]
pub struct RepositoryRegistry {
    repositories: Vec<RemoteRepository>,
}

impl RepositoryRegistry {
    /// An empty registry.
    pub fn empty() -> Self {
        Self {
            repositories: Vec::new(),
        }
    }

    /// A registry containing Maven Central.
    pub fn with_central() -> Self {
        Self {
            repositories: vec![RemoteRepository::maven_central()],
        }
    }

    /// Register a repository by URL, deriving its id.
    ///
    /// Returns `false` when a repository with the derived id already exists.
    pub fn add_url(&mut self, url: &str) -> Result<bool, JarpathError> {
        let id = derive_id(url)?;
        self.add(RemoteRepository::new(&id, DEFAULT_LAYOUT, url)?)
    }

    /// Register a repository by URL with basic-auth credentials.
    pub fn add_url_with_credentials(
        &mut self,
        url: &str,
        username: &str,
        password: Option<&str>,
    ) -> Result<bool, JarpathError> {
        let id = derive_id(url)?;
        let repo = RemoteRepository::new(&id, DEFAULT_LAYOUT, url)?.with_credentials(Credentials {
            username: username.to_string(),
            password: password.map(str::to_string),
        });
        self.add(repo)
    }

    /// Register a repository with an explicit id and layout type.
    pub fn add_with_id(&mut self, id: &str, kind: &str, url: &str) -> Result<bool, JarpathError> {
        self.add(RemoteRepository::new(id, kind, url)?)
    }

    /// Register a repository. Returns `false` if its id is already present.
    pub fn add(&mut self, repository: RemoteRepository) -> Result<bool, JarpathError> {
        if self.repositories.iter().any(|r| r.id == repository.id) {
            tracing::debug!("Repository {} already registered", repository.id);
            return Ok(false);
        }
        self.repositories.push(repository);
        Ok(true)
    }

    pub fn clear(&mut self) {
        self.repositories.clear();
    }

    /// Repositories in registration order.
    pub fn list(&self) -> &[RemoteRepository] {
        &self.repositories
    }

    pub fn urls(&self) -> Vec<String> {
        self.repositories.iter().map(|r| r.url.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.repositories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }
}

impl Default for RepositoryRegistry {
    fn default() -> Self {
        Self::with_central()
    }
}
