//! The upload flow: collect a file and its metadata, confirm overwrites, store
//! the file, and record it in the index.
//!
//! An [`UploadSession`] owns the in-memory document list shown to the user.
//! Changes to that list are published through a [`tokio::sync::watch`]
//! channel; front ends call [`UploadSession::subscribe`] to follow them.

use std::error::Error as StdError;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, instrument, warn};

use crate::config::RepoConfig;
use crate::document::{DocumentRecord, DocumentStatus};
use crate::index::DocumentIndex;
use crate::store::ContentStore;
use crate::sync::{IndexSynchronizer, SyncError};
use crate::upload::{DocumentUploader, UploadError};

pub const OVERWRITE_PROMPT: &str = "A document with this title already exists. Upload a new version?";

/// Asks the user a yes/no question.
#[async_trait]
pub trait Confirm: Send + Sync {
    async fn confirm(&self, message: &str) -> Result<bool, Box<dyn StdError + Send + Sync>>;
}

/// Answers yes to everything. For non-interactive use.
pub struct AlwaysConfirm;

#[async_trait]
impl Confirm for AlwaysConfirm {
    async fn confirm(&self, _message: &str) -> Result<bool, Box<dyn StdError + Send + Sync>> {
        Ok(true)
    }
}

/// Answers no to everything.
pub struct NeverConfirm;

#[async_trait]
impl Confirm for NeverConfirm {
    async fn confirm(&self, _message: &str) -> Result<bool, Box<dyn StdError + Send + Sync>> {
        Ok(false)
    }
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("A save is already in progress")]
    Busy,

    #[error("Document title cannot be empty")]
    EmptyTitle,

    #[error("Confirmation prompt failed: {0}")]
    Prompt(#[source] Box<dyn StdError + Send + Sync>),

    #[error("Error uploading document: {0}")]
    Upload(#[from] UploadError),

    /// The file was stored at `url` but is not listed in the index.
    #[error("Document was uploaded to {url} but the index update failed: {source}")]
    IndexUpdate {
        url: String,
        #[source]
        source: SyncError,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Saved { record: DocumentRecord, replaced: bool },
    /// The user declined to overwrite an existing document.
    Cancelled,
}

/// Contents of the upload form.
#[derive(Debug, Clone)]
pub struct UploadForm {
    pub file_name: String,
    pub content: Vec<u8>,
    pub title: String,
    pub status: DocumentStatus,
    pub category: String,
    pub meta: String,
}

impl UploadForm {
    /// Creates a form for `content`, titled after the file name.
    pub fn new(file_name: impl Into<String>, content: Vec<u8>) -> Self {
        let file_name = file_name.into();
        UploadForm {
            title: file_name.clone(),
            file_name,
            content,
            status: DocumentStatus::default(),
            category: String::new(),
            meta: String::new(),
        }
    }

    /// Reads the file at `path` into a new form.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.to_string())
            .ok_or_else(|| std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Path has no usable file name: {}", path.display()),
            ))?;
        let content = tokio::fs::read(path).await?;
        Ok(Self::new(file_name, content))
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_status(mut self, status: DocumentStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_meta(mut self, meta: impl Into<String>) -> Self {
        self.meta = meta.into();
        self
    }
}

/// Resets the busy flag when a save ends, however it ends.
struct SavingGuard<'a>(&'a AtomicBool);

impl Drop for SavingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct UploadSession {
    uploader: DocumentUploader,
    synchronizer: IndexSynchronizer,
    confirm: Box<dyn Confirm>,
    documents: watch::Sender<Vec<DocumentRecord>>,
    saving: AtomicBool,
}

impl UploadSession {
    pub fn new(store: Arc<dyn ContentStore>, config: &RepoConfig, confirm: Box<dyn Confirm>) -> Self {
        Self::from_parts(
            DocumentUploader::new(store.clone(), config),
            IndexSynchronizer::new(store, config),
            confirm,
        )
    }

    pub fn from_parts(uploader: DocumentUploader, synchronizer: IndexSynchronizer, confirm: Box<dyn Confirm>) -> Self {
        UploadSession {
            uploader,
            synchronizer,
            confirm,
            documents: watch::Sender::new(Vec::new()),
            saving: AtomicBool::new(false),
        }
    }

    /// Receives the document list every time it changes.
    pub fn subscribe(&self) -> watch::Receiver<Vec<DocumentRecord>> {
        self.documents.subscribe()
    }

    pub fn documents(&self) -> Vec<DocumentRecord> {
        self.documents.borrow().clone()
    }

    pub fn known_categories(&self) -> Vec<String> {
        let index = DocumentIndex::from_records(self.documents());
        index.categories().into_iter().map(str::to_string).collect()
    }

    pub fn is_saving(&self) -> bool {
        self.saving.load(Ordering::Acquire)
    }

    /// Replaces the document list with the stored index. Returns the number of documents.
    pub async fn load(&self) -> Result<usize, SyncError> {
        let index = self.synchronizer.fetch().await?;
        let count = index.len();
        self.documents.send_replace(index.into_records());
        Ok(count)
    }

    pub async fn save(&self, form: UploadForm) -> Result<SaveOutcome, SaveError> {
        self.save_at(form, Utc::now()).await
    }

    /// Runs the save flow with `now` as the write time.
    #[instrument(skip(self, form), fields(title = %form.title, file = %form.file_name))]
    pub async fn save_at(&self, form: UploadForm, now: DateTime<Utc>) -> Result<SaveOutcome, SaveError> {
        if self.saving.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_err() {
            return Err(SaveError::Busy);
        }
        let _guard = SavingGuard(&self.saving);

        let title = form.title.trim().to_string();
        if title.is_empty() {
            return Err(SaveError::EmptyTitle);
        }
        // Also catches a synchronizer configured with a custom index path
        if self.uploader.path_for(&title) == self.synchronizer.index_path() {
            return Err(SaveError::Upload(UploadError::ReservedTitle(title)));
        }

        let existing = self.documents.borrow().iter().find(|doc| doc.title == title).cloned();
        if existing.is_some() {
            let confirmed = self.confirm.confirm(OVERWRITE_PROMPT).await.map_err(SaveError::Prompt)?;
            if !confirmed {
                info!(target: "gitdocs::session", "Overwrite declined");
                return Ok(SaveOutcome::Cancelled);
            }
        }

        let created_at = existing.as_ref().map_or(now, |doc| doc.created_at);
        let mut record = DocumentRecord::new(title.clone(), created_at)
            .with_status(form.status)
            .with_category(form.category.trim())
            .with_meta(form.meta)
            .with_filename(form.file_name);
        record.last_updated = now;

        let url = self.uploader.upload(&form.content, &title).await?;
        record.url = Some(url.clone());

        let index = match self.synchronizer.upsert_at(record.clone(), now).await {
            Ok(index) => index,
            Err(source) => {
                warn!(target: "gitdocs::session", url = %url, error = %source, "File stored but not indexed");
                return Err(SaveError::IndexUpdate { url, source });
            }
        };

        // The stored record may carry an older created_at than the local list knew about
        let saved = index.get(&title).cloned().unwrap_or(record);
        self.documents.send_replace(index.into_records());

        info!(target: "gitdocs::session", replaced = existing.is_some(), "Document saved");
        Ok(SaveOutcome::Saved { record: saved, replaced: existing.is_some() })
    }
}
