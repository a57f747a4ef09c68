use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use super::{RemoteEntry, RemoteFile, RemoteStore};
use crate::error::{DaybookError, Result};

/// In-memory remote store for tests: deterministic version tokens, full
/// conflict semantics, and scriptable transient failures.
#[derive(Default)]
pub struct InMemoryRemote {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    files: HashMap<String, StoredFile>,
    next_token: u64,
    fail_reads: u32,
    fail_writes: u32,
    fail_lists: u32,
    write_attempts: u32,
}

#[derive(Clone)]
struct StoredFile {
    content: String,
    token: String,
}

impl Inner {
    fn mint_token(&mut self) -> String {
        self.next_token += 1;
        format!("v{}", self.next_token)
    }
}

fn transient(path: &str) -> DaybookError {
    DaybookError::RemoteStatus {
        status: 503,
        path: path.into(),
    }
}

impl InMemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a file directly, bypassing conflict checks. Returns its token.
    pub fn seed(&self, path: &str, content: &str) -> String {
        let mut inner = self.inner.lock().unwrap();
        let token = inner.mint_token();
        inner.files.insert(
            path.to_string(),
            StoredFile {
                content: content.to_string(),
                token: token.clone(),
            },
        );
        token
    }

    pub fn token_of(&self, path: &str) -> Option<String> {
        let inner = self.inner.lock().unwrap();
        inner.files.get(path).map(|f| f.token.clone())
    }

    pub fn content_of(&self, path: &str) -> Option<String> {
        let inner = self.inner.lock().unwrap();
        inner.files.get(path).map(|f| f.content.clone())
    }

    /// Make the next `n` write attempts fail with a 503-class error.
    pub fn fail_next_writes(&self, n: u32) {
        self.inner.lock().unwrap().fail_writes = n;
    }

    pub fn fail_next_reads(&self, n: u32) {
        self.inner.lock().unwrap().fail_reads = n;
    }

    pub fn fail_next_lists(&self, n: u32) {
        self.inner.lock().unwrap().fail_lists = n;
    }

    /// Write attempts seen, including scripted failures and conflicts.
    pub fn write_attempts(&self) -> u32 {
        self.inner.lock().unwrap().write_attempts
    }
}

#[async_trait]
impl RemoteStore for InMemoryRemote {
    async fn read(&self, path: &str) -> Result<Option<RemoteFile>> {
        // Real remote calls suspend; yielding here lets tests exercise the
        // interleavings the coordinator's guards exist for.
        tokio::task::yield_now().await;
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_reads > 0 {
            inner.fail_reads -= 1;
            return Err(transient(path));
        }
        Ok(inner.files.get(path).map(|f| RemoteFile {
            content: f.content.clone(),
            version_token: f.token.clone(),
        }))
    }

    async fn write(
        &self,
        path: &str,
        content: &str,
        version_token: Option<&str>,
        _message: &str,
    ) -> Result<String> {
        tokio::task::yield_now().await;
        let mut inner = self.inner.lock().unwrap();
        inner.write_attempts += 1;
        if inner.fail_writes > 0 {
            inner.fail_writes -= 1;
            return Err(transient(path));
        }

        let current = inner.files.get(path).map(|f| f.token.clone());
        let conflicted = match (version_token, &current) {
            // A no-token write asserts the path does not exist yet.
            (None, Some(_)) => true,
            // A supplied token must match the stored revision exactly.
            (Some(expected), Some(actual)) => expected != actual,
            (Some(_), None) => true,
            (None, None) => false,
        };
        if conflicted {
            return Err(DaybookError::Conflict { path: path.into() });
        }

        let token = inner.mint_token();
        inner.files.insert(
            path.to_string(),
            StoredFile {
                content: content.to_string(),
                token: token.clone(),
            },
        );
        Ok(token)
    }

    async fn delete(&self, path: &str, version_token: &str, _message: &str) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let Some(file) = inner.files.get(path) else {
            return Err(DaybookError::Authorization {
                status: 404,
                path: path.into(),
            });
        };
        if file.token != version_token {
            return Err(DaybookError::Conflict { path: path.into() });
        }
        inner.files.remove(path);
        Ok(())
    }

    async fn list_dir(&self, path: &str) -> Result<Vec<RemoteEntry>> {
        tokio::task::yield_now().await;
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_lists > 0 {
            inner.fail_lists -= 1;
            return Err(transient(path));
        }

        let prefix = format!("{}/", path.trim_end_matches('/'));
        let mut entries: Vec<RemoteEntry> = inner
            .files
            .keys()
            .filter_map(|file_path| {
                let name = file_path.strip_prefix(&prefix)?;
                // Direct children only.
                if name.is_empty() || name.contains('/') {
                    return None;
                }
                Some(RemoteEntry {
                    name: name.to_string(),
                    path: file_path.clone(),
                })
            })
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}
