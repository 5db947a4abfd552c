//! Dropbox remote storage client.
//!
//! Authenticates with the OAuth2 refresh-token flow and exposes the small
//! slice of the API the automation pipeline needs: folder listing, file
//! download/upload and shared links. Behind the [`RemoteStorage`] trait so
//! the watcher can run against a fake in tests.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::config::DropboxConfig;
use crate::errors::{QrGenError, Result};

const API_BASE: &str = "https://api.dropboxapi.com";
const CONTENT_BASE: &str = "https://content.dropboxapi.com";
const HTTP_TIMEOUT: Duration = Duration::from_secs(60);
/// Refresh the access token this long before Dropbox expires it.
const TOKEN_SLACK_SECS: i64 = 120;

/// A file entry as seen in the remote folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    /// Lowercased canonical path, used as the ledger key.
    pub path: String,
    pub name: String,
    /// Dropbox content hash; changes whenever the bytes change.
    pub content_hash: String,
}

/// Remote file store the watcher talks to.
#[async_trait]
pub trait RemoteStorage: Send + Sync {
    /// All files under `folder`, recursively, across result pages.
    async fn list_folder(&self, folder: &str) -> Result<Vec<RemoteFile>>;
    /// Locate a file by name: indexed search first, full listing of the
    /// folder (then the storage root) when the index misses.
    async fn find_by_name(&self, folder: &str, name: &str) -> Result<Option<RemoteFile>>;
    async fn download(&self, path: &str) -> Result<Vec<u8>>;
    /// Upload `data` to `path`, overwriting any existing file.
    async fn upload(&self, path: &str, data: Vec<u8>) -> Result<()>;
    /// A public, directly-downloadable link for `path`.
    async fn shared_link(&self, path: &str) -> Result<String>;
}

struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

pub struct DropboxClient {
    http: reqwest::Client,
    app_key: String,
    app_secret: String,
    refresh_token: String,
    token: Mutex<Option<CachedToken>>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Deserialize)]
struct ListFolderResponse {
    entries: Vec<ListEntry>,
    cursor: String,
    has_more: bool,
}

#[derive(Deserialize)]
struct ListEntry {
    #[serde(rename = ".tag")]
    tag: String,
    name: String,
    path_lower: Option<String>,
    content_hash: Option<String>,
}

#[derive(Deserialize)]
struct SearchResponse {
    matches: Vec<SearchMatch>,
}

#[derive(Deserialize)]
struct SearchMatch {
    metadata: SearchMetadataWrapper,
}

#[derive(Deserialize)]
struct SearchMetadataWrapper {
    metadata: ListEntry,
}

#[derive(Deserialize)]
struct SharedLink {
    url: String,
}

#[derive(Deserialize)]
struct ListSharedLinksResponse {
    links: Vec<SharedLink>,
}

impl DropboxClient {
    pub fn new(config: &DropboxConfig) -> Result<Self> {
        if !config.is_configured() {
            return Err(QrGenError::configuration(
                "Dropbox credentials are not configured",
            ));
        }
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| QrGenError::configuration(format!("HTTP client init failed: {}", e)))?;
        Ok(DropboxClient {
            http,
            app_key: config.app_key.clone(),
            app_secret: config.app_secret.clone(),
            refresh_token: config.refresh_token.clone(),
            token: Mutex::new(None),
        })
    }

    /// Current access token, refreshed through the OAuth2 refresh-token
    /// grant when missing or near expiry.
    async fn access_token(&self) -> Result<String> {
        let mut guard = self.token.lock().await;
        if let Some(cached) = guard.as_ref() {
            if cached.expires_at - chrono::Duration::seconds(TOKEN_SLACK_SECS) > Utc::now() {
                return Ok(cached.access_token.clone());
            }
        }

        debug!("Refreshing Dropbox access token");
        let resp = self
            .http
            .post(format!("{}/oauth2/token", API_BASE))
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", self.refresh_token.as_str()),
                ("client_id", self.app_key.as_str()),
                ("client_secret", self.app_secret.as_str()),
            ])
            .send()
            .await?;
        let resp = check_status(resp, "oauth2/token").await?;
        let token: TokenResponse = resp.json().await?;

        let access = token.access_token.clone();
        *guard = Some(CachedToken {
            access_token: token.access_token,
            expires_at: Utc::now() + chrono::Duration::seconds(token.expires_in),
        });
        Ok(access)
    }

    async fn rpc(&self, endpoint: &str, body: serde_json::Value) -> Result<reqwest::Response> {
        let token = self.access_token().await?;
        let resp = self
            .http
            .post(format!("{}/2/{}", API_BASE, endpoint))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        check_status(resp, endpoint).await
    }
}

/// Turn a non-2xx response into a RemoteStorage error carrying the body,
/// which is where Dropbox puts its error summary.
async fn check_status(resp: reqwest::Response, endpoint: &str) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    warn!("Dropbox {} failed: {} {}", endpoint, status, body);
    Err(QrGenError::remote_storage(format!(
        "{} returned {}: {}",
        endpoint, status, body
    )))
}

impl DropboxClient {
    /// Indexed lookup via the search endpoint; the index may lag behind
    /// real storage state, so a miss here is not authoritative.
    async fn search_file(&self, folder: &str, name: &str) -> Result<Option<RemoteFile>> {
        let resp = self
            .rpc(
                "files/search_v2",
                json!({
                    "query": name,
                    "options": { "path": folder, "filename_only": true },
                }),
            )
            .await?;
        let found: SearchResponse = resp.json().await?;

        for hit in found.matches {
            let entry = hit.metadata.metadata;
            if entry.tag == "file" && entry.name.eq_ignore_ascii_case(name) {
                let Some(path) = entry.path_lower else { continue };
                return Ok(Some(RemoteFile {
                    path,
                    name: entry.name,
                    content_hash: entry.content_hash.unwrap_or_default(),
                }));
            }
        }
        Ok(None)
    }

    async fn list_folder_raw(&self, folder: &str) -> Result<Vec<RemoteFile>> {
        let mut files = Vec::new();

        let resp = self
            .rpc(
                "files/list_folder",
                json!({ "path": folder, "recursive": true }),
            )
            .await?;
        let mut page: ListFolderResponse = resp.json().await?;

        loop {
            for entry in page.entries.drain(..) {
                if entry.tag != "file" {
                    continue;
                }
                let Some(path) = entry.path_lower else { continue };
                files.push(RemoteFile {
                    path,
                    name: entry.name,
                    content_hash: entry.content_hash.unwrap_or_default(),
                });
            }
            if !page.has_more {
                break;
            }
            let resp = self
                .rpc(
                    "files/list_folder/continue",
                    json!({ "cursor": page.cursor }),
                )
                .await?;
            page = resp.json().await?;
        }

        debug!("Listed {} file(s) under {}", files.len(), folder);
        Ok(files)
    }
}

#[async_trait]
impl RemoteStorage for DropboxClient {
    async fn list_folder(&self, folder: &str) -> Result<Vec<RemoteFile>> {
        match self.list_folder_raw(folder).await {
            Ok(files) => Ok(files),
            // The configured folder may not exist yet; the storage root
            // always does.
            Err(e) if !folder.is_empty() && e.to_string().contains("not_found") => {
                warn!("Folder {} not found, listing storage root instead", folder);
                self.list_folder_raw("").await
            }
            Err(e) => Err(e),
        }
    }

    async fn find_by_name(&self, folder: &str, name: &str) -> Result<Option<RemoteFile>> {
        match self.search_file(folder, name).await {
            Ok(Some(file)) => return Ok(Some(file)),
            Ok(None) => debug!("Search index has no hit for {}", name),
            Err(e) => warn!("Search for {} failed, falling back to listing: {}", name, e),
        }

        for scope in [folder, ""] {
            let files = self.list_folder(scope).await?;
            if let Some(file) = files
                .into_iter()
                .find(|f| f.name.eq_ignore_ascii_case(name))
            {
                return Ok(Some(file));
            }
            if scope.is_empty() {
                break;
            }
        }
        Ok(None)
    }

    async fn download(&self, path: &str) -> Result<Vec<u8>> {
        let token = self.access_token().await?;
        let arg = json!({ "path": path }).to_string();
        let resp = self
            .http
            .post(format!("{}/2/files/download", CONTENT_BASE))
            .bearer_auth(token)
            .header("Dropbox-API-Arg", arg)
            .send()
            .await?;
        let resp = check_status(resp, "files/download").await?;
        Ok(resp.bytes().await?.to_vec())
    }

    async fn upload(&self, path: &str, data: Vec<u8>) -> Result<()> {
        let token = self.access_token().await?;
        let arg = json!({
            "path": path,
            "mode": { ".tag": "overwrite" },
            "mute": true,
        })
        .to_string();
        let resp = self
            .http
            .post(format!("{}/2/files/upload", CONTENT_BASE))
            .bearer_auth(token)
            .header("Dropbox-API-Arg", arg)
            .header("Content-Type", "application/octet-stream")
            .body(data)
            .send()
            .await?;
        check_status(resp, "files/upload").await?;
        Ok(())
    }

    async fn shared_link(&self, path: &str) -> Result<String> {
        // Reuse an existing link if one was already created for this path.
        let resp = self
            .rpc(
                "sharing/list_shared_links",
                json!({ "path": path, "direct_only": true }),
            )
            .await?;
        let existing: ListSharedLinksResponse = resp.json().await?;
        if let Some(link) = existing.links.into_iter().next() {
            return Ok(direct_download_url(&link.url));
        }

        let resp = self
            .rpc(
                "sharing/create_shared_link_with_settings",
                json!({ "path": path }),
            )
            .await?;
        let created: SharedLink = resp.json().await?;
        Ok(direct_download_url(&created.url))
    }
}

/// Dropbox hands out preview links (`?dl=0`); flip them to direct download.
fn direct_download_url(url: &str) -> String {
    if let Some(stripped) = url.strip_suffix("?dl=0") {
        format!("{}?dl=1", stripped)
    } else if url.contains('?') {
        url.to_string()
    } else {
        format!("{}?dl=1", url)
    }
}
