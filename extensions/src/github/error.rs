use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use gitdocs_core::StoreError;

// ============== GitHub API Error Structures ==============

/// Error body returned by the GitHub REST API.
#[derive(Deserialize, Debug, Clone)]
pub struct GitHubErrorResponse {
    pub message: String,
    #[serde(default)]
    pub documentation_url: Option<String>,
}

// ============== Internal GitHub Client Error Enum ==============

/// Internal error type of the GitHub client.
///
/// Converted into [`StoreError`] at the `ContentStore` boundary.
#[derive(Error, Debug)]
pub enum GitHubError {
    /// Error during network communication (sending request, reading response).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Error parsing a *successful* response body.
    #[error("Failed to parse successful response body ({context}): {source}")]
    ResponseParsing {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Content of a successful read was not valid base64.
    #[error("Failed to decode file content of '{path}': {source}")]
    ContentDecoding {
        path: String,
        #[source]
        source: base64::DecodeError,
    },

    /// Non-success status code.
    #[error("GitHub API error: status={status}, message='{message}'")]
    ApiError {
        status: StatusCode,
        /// Message from the error body, or the raw body if it was not JSON.
        message: String,
        path: String,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The API answered with something other than a file (e.g. a directory listing).
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

// ============== Shared Error Mapping Logic ==============

/// Turns a non-success response into [`GitHubError::ApiError`].
///
/// Falls back to the raw body text when the body is not the usual
/// `{ "message": ... }` shape.
pub(crate) async fn map_response_error(response: reqwest::Response, path: &str) -> GitHubError {
    let status = response.status();
    debug_assert!(!status.is_success(), "map_response_error called with success status");

    match response.text().await {
        Ok(body_text) => {
            let message = match serde_json::from_str::<GitHubErrorResponse>(&body_text) {
                Ok(parsed) => parsed.message,
                Err(parse_err) => {
                    warn!(
                        status = %status,
                        error = %parse_err,
                        "Failed to parse GitHub error response JSON, returning raw body."
                    );
                    if body_text.is_empty() {
                        status.canonical_reason().unwrap_or("Request failed").to_string()
                    } else {
                        body_text
                    }
                }
            };
            GitHubError::ApiError { status, message, path: path.to_string() }
        }
        Err(e) => {
            warn!(status = %status, error = %e, "Failed to read GitHub error response body text.");
            GitHubError::Network(e)
        }
    }
}

/// True if a write was refused because of the `sha` it did or did not carry.
fn is_version_mismatch(status: StatusCode, message: &str) -> bool {
    match status {
        StatusCode::CONFLICT => true,
        // GitHub reports a missing sha for an existing file as 422
        StatusCode::UNPROCESSABLE_ENTITY => message.contains("sha"),
        _ => false,
    }
}

// ============== From<GitHubError> for StoreError ==============

impl From<GitHubError> for StoreError {
    fn from(err: GitHubError) -> Self {
        match err {
            GitHubError::Network(source) => {
                if source.is_timeout() {
                    StoreError::Timeout
                } else {
                    StoreError::Network(Box::new(source))
                }
            }
            GitHubError::ResponseParsing { .. } | GitHubError::ContentDecoding { .. } => {
                StoreError::Decode(Box::new(err))
            }
            GitHubError::ApiError { status, message, path } => {
                if is_version_mismatch(status, &message) {
                    return StoreError::Conflict { path, message };
                }
                match status {
                    StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                        StoreError::Authentication { status: status.as_u16(), message }
                    }
                    _ => StoreError::Api { status: status.as_u16(), message },
                }
            }
            GitHubError::InvalidConfiguration(msg) => StoreError::InvalidConfiguration(msg),
            GitHubError::UnexpectedResponse(_) => StoreError::Decode(Box::new(err)),
        }
    }
}
