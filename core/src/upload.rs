use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, instrument};

use crate::config::RepoConfig;
use crate::index::INDEX_FILE_NAME;
use crate::store::{encode_segment, join_path, ContentStore, PutRequest, StoreError};

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Document title cannot be empty")]
    InvalidTitle,

    /// The title maps onto the index file itself.
    #[error("Document title '{0}' is reserved for the document index")]
    ReservedTitle(String),

    #[error("Error checking file existence at '{path}': {source}")]
    ExistenceCheck {
        path: String,
        #[source]
        source: StoreError,
    },

    #[error("Error uploading file to '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: StoreError,
    },

    #[error("Store accepted '{0}' but returned no retrieval URL")]
    MissingUrl(String),
}

/// Stores document files at a path derived from their title.
pub struct DocumentUploader {
    store: Arc<dyn ContentStore>,
    base_path: String,
    index_path: String,
}

impl DocumentUploader {
    pub fn new(store: Arc<dyn ContentStore>, config: &RepoConfig) -> Self {
        Self::with_base_path(store, config.store_base_path())
    }

    /// `base_path` must already be URL-safe.
    pub fn with_base_path(store: Arc<dyn ContentStore>, base_path: impl Into<String>) -> Self {
        let base_path = base_path.into();
        let index_path = join_path(&base_path, INDEX_FILE_NAME);
        DocumentUploader { store, base_path, index_path }
    }

    /// Store path for `title`.
    pub fn path_for(&self, title: &str) -> String {
        join_path(&self.base_path, &encode_segment(title))
    }

    /// Writes `content` under `title`, replacing any previous upload with the
    /// same title, and returns the retrieval URL reported by the store.
    #[instrument(skip(self, content), fields(title = %title, bytes = content.len()))]
    pub async fn upload(&self, content: &[u8], title: &str) -> Result<String, UploadError> {
        if title.trim().is_empty() {
            return Err(UploadError::InvalidTitle);
        }
        let path = self.path_for(title);
        if path == self.index_path {
            error!(target: "gitdocs::upload", path = %path, "Title collides with the index file");
            return Err(UploadError::ReservedTitle(title.to_string()));
        }

        let existing = self.store.get(&path).await.map_err(|source| {
            error!(target: "gitdocs::upload", path = %path, error = %source, "Error checking file");
            UploadError::ExistenceCheck { path: path.clone(), source }
        })?;
        let version = existing.map(|object| object.version);
        debug!(target: "gitdocs::upload", path = %path, replacing = version.is_some(), "Uploading document");

        let request = PutRequest::new(format!("Upload document: {}", title), content.to_vec(), version);
        let response = self.store.put(&path, request).await.map_err(|source| {
            error!(target: "gitdocs::upload", path = %path, error = %source, "Error uploading file");
            UploadError::Write { path: path.clone(), source }
        })?;

        response.url.ok_or(UploadError::MissingUrl(path))
    }
}
