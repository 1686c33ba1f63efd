//! GitHub Contents API backend.

mod client;
mod error;
mod helpers;

pub use client::GitHubStore;
pub use error::{GitHubError, GitHubErrorResponse};
pub use helpers::decode_wrapped_base64;
