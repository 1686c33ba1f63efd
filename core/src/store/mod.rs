//! Abstraction over the remote content store that holds documents and the index.
//!
//! A store is addressed by slash-separated paths. Every stored object carries an
//! opaque [`VersionToken`]. Writing without a token creates an object; writing
//! with the token of the current revision replaces it. Stores are expected to
//! reject writes that present a stale token, or none at all for an existing
//! object, with [`StoreError::Conflict`].
//!
//! Paths handed to a store are already URL-safe: title-derived segments are
//! produced by [`encode_segment`], so backends can splice them into request
//! URLs verbatim.

use std::error::Error as StdError;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod memory;
mod path;

pub use memory::{MemoryStore, WriteLogEntry};
pub use path::{encode_segment, join_path};

/// Opaque revision identifier returned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionToken(String);

impl VersionToken {
    pub fn new(token: impl Into<String>) -> Self {
        VersionToken(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An object read from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Decoded content bytes.
    pub content: Vec<u8>,
    pub version: VersionToken,
}

/// A write request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutRequest {
    /// Commit message recorded by stores that keep history.
    pub message: String,
    /// Raw content bytes. The backend applies its own transfer encoding.
    pub content: Vec<u8>,
    /// Token of the revision being replaced; `None` creates a new object.
    pub version: Option<VersionToken>,
}

impl PutRequest {
    pub fn new(message: impl Into<String>, content: Vec<u8>, version: Option<VersionToken>) -> Self {
        PutRequest { message: message.into(), content, version }
    }
}

/// Result of a successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutResponse {
    /// Retrieval URL of the written object, if the store provides one.
    pub url: Option<String>,
    /// Token of the revision that was just written.
    pub version: VersionToken,
}

#[derive(Error, Debug)]
pub enum StoreError {
    /// Transport failure (connection refused, DNS, broken response body).
    #[error("Network error: {0}")]
    Network(#[source] Box<dyn StdError + Send + Sync>),

    /// The request did not complete within the configured timeout.
    #[error("Request timed out")]
    Timeout,

    /// The credential was rejected or lacks permission.
    #[error("Authentication failed (status {status}): {message}")]
    Authentication { status: u16, message: String },

    /// The write presented a missing or stale version token.
    #[error("Version conflict at '{path}': {message}")]
    Conflict { path: String, message: String },

    /// Any other non-success response.
    #[error("API error: status={status}, message='{message}'")]
    Api { status: u16, message: String },

    /// A success response whose body could not be decoded.
    #[error("Failed to decode store response: {0}")]
    Decode(#[source] Box<dyn StdError + Send + Sync>),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}

/// Versioned key/value content store.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Reads the object at `path`. Returns `Ok(None)` if it does not exist.
    async fn get(&self, path: &str) -> Result<Option<StoredObject>, StoreError>;

    /// Writes the object at `path`.
    async fn put(&self, path: &str, request: PutRequest) -> Result<PutResponse, StoreError>;
}
