pub mod config;
pub mod document;
pub mod index;
pub mod session;
pub mod store;
pub mod sync;
pub mod upload;

pub use config::{ConfigError, RepoConfig};
pub use document::{DocumentRecord, DocumentStatus};
pub use index::{DocumentIndex, UpsertOutcome};
pub use session::{Confirm, SaveError, SaveOutcome, UploadForm, UploadSession};
pub use store::{ContentStore, PutRequest, PutResponse, StoreError, StoredObject, VersionToken};
pub use sync::{IndexSynchronizer, SyncError};
pub use upload::{DocumentUploader, UploadError};

