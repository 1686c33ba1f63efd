use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use super::{ContentStore, PutRequest, PutResponse, StoreError, StoredObject, VersionToken};

const MEMORY_URL_PREFIX: &str = "memory://";

/// One accepted write, as recorded by [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteLogEntry {
    pub path: String,
    pub message: String,
    /// Token the writer presented.
    pub presented: Option<VersionToken>,
    /// Token assigned to the new revision.
    pub assigned: VersionToken,
}

#[derive(Debug, Default)]
struct Inner {
    objects: HashMap<String, StoredObject>,
    next_version: u64,
    writes: Vec<WriteLogEntry>,
    failing_reads: HashSet<String>,
    failing_writes: HashSet<String>,
}

/// In-process content store with the same version rules as the GitHub
/// Contents API.
///
/// Writing an existing object requires its current token, and creating an
/// object must not present one. Violations fail with
/// [`StoreError::Conflict`]. Individual paths can be set to fail on read or
/// write to exercise error paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `content` at `path` directly, bypassing version checks.
    pub async fn seed(&self, path: &str, content: impl Into<Vec<u8>>) -> VersionToken {
        let mut inner = self.inner.lock().await;
        let version = inner.assign_version();
        inner.objects.insert(path.to_string(), StoredObject { content: content.into(), version: version.clone() });
        version
    }

    /// Makes every subsequent read of `path` fail with an API error.
    pub async fn fail_reads_on(&self, path: &str) {
        self.inner.lock().await.failing_reads.insert(path.to_string());
    }

    /// Makes every subsequent write to `path` fail with an API error.
    pub async fn fail_writes_on(&self, path: &str) {
        self.inner.lock().await.failing_writes.insert(path.to_string());
    }

    pub async fn object(&self, path: &str) -> Option<StoredObject> {
        self.inner.lock().await.objects.get(path).cloned()
    }

    pub async fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.inner.lock().await.objects.keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Accepted writes, oldest first.
    pub async fn writes(&self) -> Vec<WriteLogEntry> {
        self.inner.lock().await.writes.clone()
    }
}

impl Inner {
    fn assign_version(&mut self) -> VersionToken {
        self.next_version += 1;
        VersionToken::new(format!("v{}", self.next_version))
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    #[instrument(skip(self))]
    async fn get(&self, path: &str) -> Result<Option<StoredObject>, StoreError> {
        let inner = self.inner.lock().await;
        if inner.failing_reads.contains(path) {
            return Err(StoreError::Api { status: 500, message: format!("injected read failure for '{}'", path) });
        }
        Ok(inner.objects.get(path).cloned())
    }

    #[instrument(skip(self, request), fields(presented = ?request.version))]
    async fn put(&self, path: &str, request: PutRequest) -> Result<PutResponse, StoreError> {
        let mut inner = self.inner.lock().await;
        if inner.failing_writes.contains(path) {
            return Err(StoreError::Api { status: 500, message: format!("injected write failure for '{}'", path) });
        }

        let current = inner.objects.get(path).map(|obj| obj.version.clone());
        match (&current, &request.version) {
            (None, None) => {}
            (Some(current), Some(presented)) if current == presented => {}
            (Some(_), None) => {
                return Err(StoreError::Conflict {
                    path: path.to_string(),
                    message: "\"sha\" wasn't supplied.".to_string(),
                });
            }
            (_, Some(presented)) => {
                return Err(StoreError::Conflict {
                    path: path.to_string(),
                    message: format!("{} does not match current revision", presented),
                });
            }
        }

        let version = inner.assign_version();
        inner.objects.insert(path.to_string(), StoredObject { content: request.content, version: version.clone() });
        inner.writes.push(WriteLogEntry {
            path: path.to_string(),
            message: request.message,
            presented: request.version,
            assigned: version.clone(),
        });
        debug!(%version, "Stored object");

        Ok(PutResponse {
            url: Some(format!("{}{}", MEMORY_URL_PREFIX, path)),
            version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_then_update_with_token() {
        let store = MemoryStore::new();
        let created = store.put("a", PutRequest::new("create", b"1".to_vec(), None)).await.unwrap();
        let updated = store.put("a", PutRequest::new("update", b"2".to_vec(), Some(created.version.clone()))).await.unwrap();

        assert_ne!(created.version, updated.version);
        assert_eq!(store.object("a").await.unwrap().content, b"2");
        assert_eq!(created.url.as_deref(), Some("memory://a"));
    }

    #[tokio::test]
    async fn rejects_blind_overwrite_and_stale_token() {
        let store = MemoryStore::new();
        let first = store.seed("a", "1").await;
        store.put("a", PutRequest::new("update", b"2".to_vec(), Some(first.clone()))).await.unwrap();

        let blind = store.put("a", PutRequest::new("blind", b"3".to_vec(), None)).await;
        assert!(matches!(blind, Err(StoreError::Conflict { .. })));

        let stale = store.put("a", PutRequest::new("stale", b"3".to_vec(), Some(first))).await;
        assert!(stale.unwrap_err().is_conflict());
    }

    #[tokio::test]
    async fn missing_object_reads_as_none() {
        let store = MemoryStore::new();
        assert!(store.get("nope").await.unwrap().is_none());
    }
}
