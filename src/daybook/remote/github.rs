//! Remote store over the GitHub contents API.
//!
//! One journal repository, one branch; entry documents live under
//! `entries/`. The contents API transports file bodies as base64 of the
//! UTF-8 bytes and identifies revisions by blob SHA, which serves as the
//! version token for conditional writes.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use reqwest::{Method, RequestBuilder};
use serde::{Deserialize, Serialize};

use super::{classify, with_retry, RemoteEntry, RemoteFile, RemoteStore, RetryPolicy};
use crate::error::{DaybookError, Result};

const DEFAULT_API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = concat!("daybook/", env!("CARGO_PKG_VERSION"));

pub struct GitHubStore {
    client: reqwest::Client,
    api_base: String,
    owner: String,
    repo: String,
    branch: String,
    token: Option<String>,
    retry: RetryPolicy,
}

impl GitHubStore {
    pub fn new(owner: &str, repo: &str, branch: &str, token: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(DaybookError::Http)?;
        Ok(Self {
            client,
            api_base: DEFAULT_API_BASE.to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
            branch: branch.to_string(),
            token,
            retry: RetryPolicy::default(),
        })
    }

    /// Point at a different API host (GitHub Enterprise, test server).
    pub fn with_api_base(mut self, base: &str) -> Self {
        self.api_base = base.trim_end_matches('/').to_string();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base, self.owner, self.repo, path
        )
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let mut builder = self
            .client
            .request(method, url)
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    async fn read_once(&self, path: &str) -> Result<Option<RemoteFile>> {
        let url = format!("{}?ref={}", self.contents_url(path), self.branch);
        let response = self.request(Method::GET, &url).send().await?;

        match response.status().as_u16() {
            200 => {
                let file: ContentResponse = response.json().await?;
                let content = decode_transport(&file.content.unwrap_or_default(), path)?;
                Ok(Some(RemoteFile {
                    content,
                    version_token: file.sha,
                }))
            }
            404 => Ok(None),
            401 | 403 => Err(auth_error(response.status().as_u16(), path)),
            status => Err(status_error(status, path)),
        }
    }

    async fn write_once(
        &self,
        path: &str,
        content: &str,
        version_token: Option<&str>,
        message: &str,
    ) -> Result<String> {
        let body = WriteRequest {
            message,
            content: BASE64.encode(content.as_bytes()),
            branch: &self.branch,
            sha: version_token,
        };
        let response = self
            .request(Method::PUT, &self.contents_url(path))
            .json(&body)
            .send()
            .await?;

        match response.status().as_u16() {
            200 | 201 => {
                let written: WriteResponse = response.json().await?;
                Ok(written.content.sha)
            }
            401 | 403 | 404 => Err(auth_error(response.status().as_u16(), path)),
            // 409/422 is the contents API's token mismatch.
            409 | 422 => Err(DaybookError::Conflict { path: path.into() }),
            status => Err(status_error(status, path)),
        }
    }

    async fn delete_once(&self, path: &str, version_token: &str, message: &str) -> Result<()> {
        let body = DeleteRequest {
            message,
            sha: version_token,
            branch: &self.branch,
        };
        let response = self
            .request(Method::DELETE, &self.contents_url(path))
            .json(&body)
            .send()
            .await?;

        match response.status().as_u16() {
            200 => Ok(()),
            401 | 403 | 404 => Err(auth_error(response.status().as_u16(), path)),
            409 | 422 => Err(DaybookError::Conflict { path: path.into() }),
            status => Err(status_error(status, path)),
        }
    }

    async fn list_once(&self, path: &str) -> Result<Vec<RemoteEntry>> {
        let url = format!("{}?ref={}", self.contents_url(path), self.branch);
        let response = self.request(Method::GET, &url).send().await?;

        match response.status().as_u16() {
            200 => {
                let items: Vec<ListItem> = response.json().await?;
                Ok(items
                    .into_iter()
                    .filter(|item| item.kind == "file")
                    .map(|item| RemoteEntry {
                        name: item.name,
                        path: item.path,
                    })
                    .collect())
            }
            404 => Ok(Vec::new()),
            401 | 403 => Err(auth_error(response.status().as_u16(), path)),
            status => Err(status_error(status, path)),
        }
    }
}

fn auth_error(status: u16, path: &str) -> DaybookError {
    DaybookError::Authorization {
        status,
        path: path.into(),
    }
}

fn status_error(status: u16, path: &str) -> DaybookError {
    DaybookError::RemoteStatus {
        status,
        path: path.into(),
    }
}

/// The API returns base64 with embedded newlines; strip whitespace before
/// decoding, then require valid UTF-8.
fn decode_transport(encoded: &str, path: &str) -> Result<String> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = BASE64
        .decode(compact.as_bytes())
        .map_err(|e| DaybookError::Store(format!("invalid base64 content at {}: {}", path, e)))?;
    String::from_utf8(bytes)
        .map_err(|e| DaybookError::Store(format!("non-UTF-8 content at {}: {}", path, e)))
}

#[async_trait]
impl RemoteStore for GitHubStore {
    async fn read(&self, path: &str) -> Result<Option<RemoteFile>> {
        with_retry(&self.retry, classify, || self.read_once(path)).await
    }

    async fn write(
        &self,
        path: &str,
        content: &str,
        version_token: Option<&str>,
        message: &str,
    ) -> Result<String> {
        with_retry(&self.retry, classify, || {
            self.write_once(path, content, version_token, message)
        })
        .await
    }

    async fn delete(&self, path: &str, version_token: &str, message: &str) -> Result<()> {
        with_retry(&self.retry, classify, || {
            self.delete_once(path, version_token, message)
        })
        .await
    }

    async fn list_dir(&self, path: &str) -> Result<Vec<RemoteEntry>> {
        with_retry(&self.retry, classify, || self.list_once(path)).await
    }
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    sha: String,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListItem {
    name: String,
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Serialize)]
struct WriteRequest<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct DeleteRequest<'a> {
    message: &'a str,
    sha: &'a str,
    branch: &'a str,
}

#[derive(Debug, Deserialize)]
struct WriteResponse {
    content: WriteContent,
}

#[derive(Debug, Deserialize)]
struct WriteContent {
    sha: String,
}
