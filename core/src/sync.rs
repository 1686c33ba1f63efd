use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use crate::config::RepoConfig;
use crate::document::DocumentRecord;
use crate::index::{DocumentIndex, UpsertOutcome};
use crate::store::{ContentStore, PutRequest, StoreError, VersionToken};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Unable to fetch document index. Please verify your token and repository settings: {0}")]
    Read(#[source] StoreError),

    #[error("Document index is not a valid JSON list of documents: {0}")]
    InvalidIndex(#[source] serde_json::Error),

    #[error("Failed to serialize document index: {0}")]
    Serialize(#[source] serde_json::Error),

    /// The index changed since it was read. Nothing was written.
    #[error("Document index was modified concurrently: {0}")]
    Conflict(#[source] StoreError),

    #[error("Failed to update document index: {0}")]
    Write(#[source] StoreError),
}

/// Keeps the index blob in the store in step with uploaded documents.
///
/// Every mutation reads the whole index, merges one record by title, and
/// writes the whole index back with the version token of the revision it
/// read. Two concurrent upserts race: the loser gets [`SyncError::Conflict`]
/// if the store checks tokens, and is silently overwritten otherwise.
pub struct IndexSynchronizer {
    store: Arc<dyn ContentStore>,
    index_path: String,
}

impl IndexSynchronizer {
    pub fn new(store: Arc<dyn ContentStore>, config: &RepoConfig) -> Self {
        Self::with_index_path(store, config.index_path())
    }

    pub fn with_index_path(store: Arc<dyn ContentStore>, index_path: impl Into<String>) -> Self {
        IndexSynchronizer { store, index_path: index_path.into() }
    }

    pub fn index_path(&self) -> &str {
        &self.index_path
    }

    /// Reads the current index. A missing index is an empty one; every other
    /// failure is reported.
    #[instrument(skip(self), fields(path = %self.index_path))]
    pub async fn fetch(&self) -> Result<DocumentIndex, SyncError> {
        match self.store.get(&self.index_path).await {
            Ok(Some(object)) => DocumentIndex::from_json(&object.content).map_err(|e| {
                error!(target: "gitdocs::sync", error = %e, "Index content is not valid JSON");
                SyncError::InvalidIndex(e)
            }),
            Ok(None) => {
                debug!(target: "gitdocs::sync", "No index yet");
                Ok(DocumentIndex::new())
            }
            Err(e) => {
                error!(target: "gitdocs::sync", error = %e, "Failed to fetch index");
                Err(SyncError::Read(e))
            }
        }
    }

    /// Inserts or replaces `document` in the stored index, stamped with the current time.
    pub async fn upsert(&self, document: DocumentRecord) -> Result<DocumentIndex, SyncError> {
        self.upsert_at(document, Utc::now()).await
    }

    /// Inserts or replaces `document` in the stored index, using `now` as its
    /// `last_updated` time. Returns the index as written.
    #[instrument(skip(self, document), fields(path = %self.index_path, title = %document.title))]
    pub async fn upsert_at(&self, document: DocumentRecord, now: DateTime<Utc>) -> Result<DocumentIndex, SyncError> {
        let title = document.title.clone();
        let (mut index, version) = self.read_for_update().await;

        match index.upsert(document, now) {
            UpsertOutcome::Inserted(pos) => debug!(target: "gitdocs::sync", pos, "Appending new document"),
            UpsertOutcome::Replaced(pos) => debug!(target: "gitdocs::sync", pos, "Replacing existing document"),
        }

        let content = index.to_json_pretty().map_err(SyncError::Serialize)?;
        let creating = version.is_none();
        let request = PutRequest::new(format!("Update index.json with {}", title), content, version);

        match self.store.put(&self.index_path, request).await {
            Ok(response) => {
                info!(target: "gitdocs::sync", version = %response.version, creating, entries = index.len(), "Index written");
                Ok(index)
            }
            Err(e) if e.is_conflict() => {
                warn!(target: "gitdocs::sync", error = %e, "Index changed since it was read");
                Err(SyncError::Conflict(e))
            }
            Err(e) => {
                error!(target: "gitdocs::sync", error = %e, "Error updating index");
                Err(SyncError::Write(e))
            }
        }
    }

    /// Best-effort read: anything but a decodable index is treated as "no index yet".
    async fn read_for_update(&self) -> (DocumentIndex, Option<VersionToken>) {
        match self.store.get(&self.index_path).await {
            Ok(Some(object)) => match DocumentIndex::from_json(&object.content) {
                Ok(index) => (index, Some(object.version)),
                Err(e) => {
                    warn!(target: "gitdocs::sync", error = %e, "index.json is not valid JSON; the write will be refused until it is repaired or deleted");
                    (DocumentIndex::new(), None)
                }
            },
            Ok(None) => (DocumentIndex::new(), None),
            Err(e) => {
                warn!(target: "gitdocs::sync", error = %e, "Could not fetch index.json, will create a new one");
                (DocumentIndex::new(), None)
            }
        }
    }
}
