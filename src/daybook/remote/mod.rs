//! # Remote Storage Layer
//!
//! Thin protocol client over a versioned remote file store addressed by
//! path. Every file carries an opaque version token (the blob SHA on
//! GitHub); writes are conditioned on the token the caller last saw, so a
//! concurrent change surfaces as a distinct `Conflict` instead of silently
//! clobbering the remote copy.
//!
//! - [`github::GitHubStore`]: production client over the GitHub contents API
//! - [`memory::InMemoryRemote`]: deterministic test double
//! - [`retry`]: pure retry/backoff wrapper, independent of the transport

use async_trait::async_trait;

use crate::error::Result;

pub mod github;
pub mod memory;
pub mod retry;

pub use retry::{classify, with_retry, Disposition, RetryPolicy};

/// A remote file plus the version token proving which revision was read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub content: String,
    pub version_token: String,
}

/// One file in a remote directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub name: String,
    pub path: String,
}

/// Contract per operation:
///
/// - `read`: absent is `Ok(None)`, a non-error outcome distinct from
///   transport failure.
/// - `write`: `None` token asserts the path does not exist yet; `Some`
///   asserts the remote is still at that token. A mismatch is
///   [`crate::error::DaybookError::Conflict`] and must not be retried.
/// - `list_dir`: an absent directory is an empty listing, not an error.
///
/// Authorization/not-found class failures are fatal (no retry); transient
/// transport failures are retried with exponential backoff by the
/// implementations.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn read(&self, path: &str) -> Result<Option<RemoteFile>>;

    /// Returns the new version token on success.
    async fn write(
        &self,
        path: &str,
        content: &str,
        version_token: Option<&str>,
        message: &str,
    ) -> Result<String>;

    async fn delete(&self, path: &str, version_token: &str, message: &str) -> Result<()>;

    async fn list_dir(&self, path: &str) -> Result<Vec<RemoteEntry>>;
}

#[async_trait]
impl<T: RemoteStore + ?Sized> RemoteStore for std::sync::Arc<T> {
    async fn read(&self, path: &str) -> Result<Option<RemoteFile>> {
        (**self).read(path).await
    }

    async fn write(
        &self,
        path: &str,
        content: &str,
        version_token: Option<&str>,
        message: &str,
    ) -> Result<String> {
        (**self).write(path, content, version_token, message).await
    }

    async fn delete(&self, path: &str, version_token: &str, message: &str) -> Result<()> {
        (**self).delete(path, version_token, message).await
    }

    async fn list_dir(&self, path: &str) -> Result<Vec<RemoteEntry>> {
        (**self).list_dir(path).await
    }
}
