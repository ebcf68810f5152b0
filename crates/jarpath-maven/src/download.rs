//! HTTP downloads from remote repositories.

use std::time::Duration;

use jarpath_util::errors::JarpathError;
use reqwest::Client;

use crate::auth;
use crate::repository::RemoteRepository;

const MAX_RETRIES: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_secs(2);

/// Artifacts larger than this get a progress bar.
const PROGRESS_THRESHOLD: u64 = 1_000_000;

/// Build a shared HTTP client whose requests time out after `timeout`.
pub fn build_client(timeout: Duration) -> Result<Client, JarpathError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("jarpath/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| JarpathError::Network {
            message: format!("Failed to create HTTP client: {e}"),
        })
}

/// Download raw bytes from a URL, with authentication and retries.
///
/// Returns `Ok(None)` for 404 (not present in this repository). Server
/// errors, timeouts and connection failures are retried.
pub async fn download_bytes(
    client: &Client,
    repo: &RemoteRepository,
    url: &str,
) -> Result<Option<Vec<u8>>, JarpathError> {
    let mut last_err = String::new();

    for attempt in 0..MAX_RETRIES {
        if attempt > 0 {
            tokio::time::sleep(RETRY_DELAY * attempt).await;
        }

        let req = auth::apply_auth(client.get(url), repo);

        match req.send().await {
            Ok(resp) => {
                let status = resp.status();
                if status == reqwest::StatusCode::NOT_FOUND {
                    return Ok(None);
                }
                if status.is_server_error() {
                    last_err = format!("HTTP {status} from {url}");
                    continue;
                }
                if !status.is_success() {
                    return Err(JarpathError::Network {
                        message: format!("HTTP {status} fetching {url}"),
                    });
                }

                let bytes = resp.bytes().await.map_err(|e| JarpathError::Network {
                    message: format!("Failed to read response from {url}: {e}"),
                })?;
                return Ok(Some(bytes.to_vec()));
            }
            Err(e) if e.is_timeout() || e.is_connect() => {
                last_err = format!("{e}");
                continue;
            }
            Err(e) => {
                return Err(JarpathError::Network {
                    message: format!("Request to {url} failed: {e}"),
                });
            }
        }
    }

    Err(JarpathError::Network {
        message: format!("Failed after {MAX_RETRIES} retries for {url}: {last_err}"),
    })
}

/// Download an artifact file, showing a progress bar for large files.
pub async fn download_artifact(
    client: &Client,
    repo: &RemoteRepository,
    url: &str,
    label: &str,
) -> Result<Option<Vec<u8>>, JarpathError> {
    let req = auth::apply_auth(client.get(url), repo);

    let resp = req.send().await.map_err(|e| JarpathError::Network {
        message: format!("Request to {url} failed: {e}"),
    })?;

    if resp.status() == reqwest::StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !resp.status().is_success() {
        return Err(JarpathError::Network {
            message: format!("HTTP {} fetching {url}", resp.status()),
        });
    }

    let total = resp.content_length().unwrap_or(0);
    let pb = (total > PROGRESS_THRESHOLD)
        .then(|| jarpath_util::progress::download_bar(total, label));

    let bytes = resp.bytes().await.map_err(|e| JarpathError::Network {
        message: format!("Failed to read {url}: {e}"),
    })?;

    if let Some(pb) = pb {
        pb.set_position(bytes.len() as u64);
        pb.finish_and_clear();
    }

    Ok(Some(bytes.to_vec()))
}

/// Download a text file (POM, checksum sidecar).
pub async fn download_text(
    client: &Client,
    repo: &RemoteRepository,
    url: &str,
) -> Result<Option<String>, JarpathError> {
    Ok(download_bytes(client, repo, url)
        .await?
        .map(|bytes| String::from_utf8_lossy(&bytes).to_string()))
}
