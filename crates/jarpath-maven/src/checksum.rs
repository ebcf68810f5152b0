//! Artifact checksum verification against repository sidecar files.

use md5::Md5;
use reqwest::Client;
use sha1::Sha1;
use sha2::{Digest, Sha256};

use jarpath_util::errors::JarpathError;

use crate::download;
use crate::repository::RemoteRepository;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Algorithm {
    Sha256,
    Sha1,
    Md5,
}

impl Algorithm {
    /// Strongest first.
    const PREFERENCE: [Algorithm; 3] = [Algorithm::Sha256, Algorithm::Sha1, Algorithm::Md5];

    fn extension(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Sha1 => "sha1",
            Self::Md5 => "md5",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Sha256 => "SHA-256",
            Self::Sha1 => "SHA-1",
            Self::Md5 => "MD5",
        }
    }

    fn digest(self, data: &[u8]) -> String {
        match self {
            Self::Sha256 => format!("{:x}", Sha256::digest(data)),
            Self::Sha1 => format!("{:x}", Sha1::digest(data)),
            Self::Md5 => format!("{:x}", Md5::digest(data)),
        }
    }
}

/// Verify downloaded data against the strongest checksum sidecar the
/// repository publishes. Missing sidecars are logged, not fatal.
pub async fn verify(
    client: &Client,
    repo: &RemoteRepository,
    file_url: &str,
    data: &[u8],
) -> Result<(), JarpathError> {
    for algo in Algorithm::PREFERENCE {
        let sidecar = format!("{file_url}.{}", algo.extension());
        if let Some(expected) = download::download_text(client, repo, &sidecar).await? {
            return check(algo, data, &extract_hash(&expected), file_url);
        }
    }

    tracing::warn!("No checksum sidecar found for {file_url}");
    Ok(())
}

fn check(algo: Algorithm, data: &[u8], expected: &str, url: &str) -> Result<(), JarpathError> {
    let actual = algo.digest(data);
    if actual.eq_ignore_ascii_case(expected) {
        tracing::debug!("{} ok for {url}", algo.label());
        Ok(())
    } else {
        Err(JarpathError::Network {
            message: format!(
                "{} mismatch for {url}: expected {expected}, got {actual}",
                algo.label()
            ),
        })
    }
}

/// Extract the hex hash from a checksum file.
///
/// Sidecars may contain just the hash, or `hash  filename`.
fn extract_hash(content: &str) -> String {
    content.split_whitespace().next().unwrap_or("").to_string()
}
