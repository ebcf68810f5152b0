//! Operation: manage the remote repositories a session resolves against.

use jarpath_maven::repository::RemoteRepository;

use crate::session::Session;

impl Session {
    /// Register a repository by URL; its id is derived from the URL.
    ///
    /// Returns `false` when a repository with that id is already registered.
    pub fn add_remote_repository_by_url(&mut self, url: &str) -> miette::Result<bool> {
        let added = self.registry.add_url(url)?;
        self.log_repository(url, added);
        Ok(added)
    }

    /// Register a repository by URL, authenticating with basic auth.
    pub fn add_remote_repository_with_credentials(
        &mut self,
        url: &str,
        username: &str,
        password: Option<&str>,
    ) -> miette::Result<bool> {
        let added = self
            .registry
            .add_url_with_credentials(url, username, password)?;
        self.log_repository(url, added);
        Ok(added)
    }

    /// Register a repository with an explicit id and layout type.
    pub fn add_remote_repository(&mut self, id: &str, kind: &str, url: &str) -> miette::Result<bool> {
        let added = self.registry.add_with_id(id, kind, url)?;
        self.log_repository(url, added);
        Ok(added)
    }

    /// Remove every repository, Maven Central included.
    pub fn clear_remote_repositories(&mut self) {
        self.registry.clear();
    }

    pub fn remote_repositories(&self) -> &[RemoteRepository] {
        self.registry.list()
    }

    pub fn remote_repository_urls(&self) -> Vec<String> {
        self.registry.urls()
    }

    fn log_repository(&self, url: &str, added: bool) {
        if added {
            tracing::info!("Added repository {url}");
            if self.verbose {
                jarpath_util::progress::status("Added", &format!("repository {url}"));
            }
        } else {
            tracing::debug!("Repository {url} already registered");
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::session::Session;

    #[test]
    fn fresh_session_uses_central() {
        let session = Session::default();
        assert_eq!(
            session.remote_repository_urls(),
            ["https://repo1.maven.org/maven2"]
        );
        assert_eq!(session.remote_repositories()[0].id, "central");
    }

    #[test]
    fn repositories_keep_registration_order() {
        let mut session = Session::default();
        session.clear_remote_repositories();
        assert!(session.remote_repositories().is_empty());

        assert!(session
            .add_remote_repository_by_url("https://repo.example.com/releases/")
            .unwrap());
        assert!(session
            .add_remote_repository("internal", "default", "https://nexus.corp/maven")
            .unwrap());
        assert!(!session
            .add_remote_repository_by_url("https://repo.example.com/releases")
            .unwrap());

        assert_eq!(
            session.remote_repository_urls(),
            ["https://repo.example.com/releases", "https://nexus.corp/maven"]
        );
        assert_eq!(
            session.remote_repositories()[0].id,
            "repo.example.com-releases"
        );
    }

    #[test]
    fn credentials_are_attached() {
        let mut session = Session::default();
        session
            .add_remote_repository_with_credentials(
                "https://private.example.com/maven",
                "deploy",
                Some("s3cret"),
            )
            .unwrap();
        let repo = &session.remote_repositories()[1];
        assert!(repo.has_auth());
        assert_eq!(repo.credentials.as_ref().unwrap().username, "deploy");
    }

    #[test]
    fn malformed_url_is_a_configuration_error() {
        let mut session = Session::default();
        assert!(session.add_remote_repository_by_url("not a url").is_err());
        assert_eq!(session.remote_repositories().len(), 1);
    }
}
