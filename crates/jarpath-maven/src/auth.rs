//! Repository authentication.
//!
//! Credentials are attached per repository when it is registered:
//!
//! ```text
//! registry.add_url_with_credentials("https://nexus.co/maven", "deploy", Some("secret"))
//! ```
//!
//! A username without a password is sent as basic auth with an empty
//! password.

use reqwest::RequestBuilder;

use crate::repository::RemoteRepository;

/// Apply authentication to a request if the repository has credentials.
pub fn apply_auth(request: RequestBuilder, repo: &RemoteRepository) -> RequestBuilder {
    match &repo.credentials {
        Some(creds) => request.basic_auth(&creds.username, creds.password.as_deref()),
        None => request,
    }
}
