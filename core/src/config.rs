use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

use crate::index::INDEX_FILE_NAME;
use crate::store::{encode_segment, join_path};

const DEFAULT_API_BASE_URL: &str = "https://api.github.com/";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Repository owner cannot be empty")]
    EmptyOwner,

    #[error("Repository name cannot be empty")]
    EmptyRepo,

    #[error("Invalid repository {field} '{value}': must not contain '/'")]
    InvalidName { field: &'static str, value: String },

    #[error("Access token cannot be empty")]
    EmptyToken,

    #[error("Invalid API base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

/// Connection settings for one repository-backed document collection.
///
/// Passed explicitly to the store, synchronizer, and uploader. Its lifetime
/// is that of the session using it.
#[derive(Clone, Debug)]
pub struct RepoConfig {
    owner: String,
    repo: String,
    base_path: String,
    branch: Option<String>,
    token: SecretString,
    api_base_url: Url,
    timeout: Duration,
}

impl RepoConfig {
    /// Creates a configuration for `owner/repo` with the documents stored at
    /// the repository root.
    ///
    /// # Errors
    /// Fails if any argument is empty or if owner/repo contain a slash.
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let owner = owner.into().trim().to_string();
        let repo = repo.into().trim().to_string();
        let token = token.into();

        if owner.is_empty() {
            return Err(ConfigError::EmptyOwner);
        }
        if repo.is_empty() {
            return Err(ConfigError::EmptyRepo);
        }
        if owner.contains('/') {
            return Err(ConfigError::InvalidName { field: "owner", value: owner });
        }
        if repo.contains('/') {
            return Err(ConfigError::InvalidName { field: "name", value: repo });
        }
        if token.trim().is_empty() {
            return Err(ConfigError::EmptyToken);
        }

        let api_base_url = Url::parse(DEFAULT_API_BASE_URL)
            .map_err(|e| ConfigError::InvalidBaseUrl { url: DEFAULT_API_BASE_URL.to_string(), reason: e.to_string() })?;

        Ok(Self {
            owner,
            repo,
            base_path: String::new(),
            branch: None,
            token: token.trim().to_string().into(),
            api_base_url,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Sets the directory inside the repository that holds the documents.
    #[must_use]
    pub fn base_path(mut self, path: impl AsRef<str>) -> Self {
        self.base_path = path.as_ref().trim().trim_matches('/').to_string();
        self
    }

    /// Sets the branch to read from and commit to. The default branch is used otherwise.
    #[must_use]
    pub fn branch(mut self, branch: Option<String>) -> Self {
        self.branch = branch.filter(|b| !b.trim().is_empty());
        self
    }

    /// Points the client at a different API host (GitHub Enterprise, test servers).
    pub fn api_base_url(mut self, url: &str) -> Result<Self, ConfigError> {
        let mut parsed = Url::parse(url)
            .map_err(|e| ConfigError::InvalidBaseUrl { url: url.to_string(), reason: e.to_string() })?;
        if parsed.cannot_be_a_base() {
            return Err(ConfigError::InvalidBaseUrl { url: url.to_string(), reason: "cannot be a base URL".to_string() });
        }
        // Url::join treats the last segment as a file unless the path ends in '/'
        if !parsed.path().ends_with('/') {
            let path = format!("{}/", parsed.path());
            parsed.set_path(&path);
        }
        self.api_base_url = parsed;
        Ok(self)
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    pub fn documents_path(&self) -> &str {
        &self.base_path
    }

    pub fn branch_name(&self) -> Option<&str> {
        self.branch.as_deref()
    }

    pub fn token(&self) -> &SecretString {
        &self.token
    }

    pub fn api_url(&self) -> &Url {
        &self.api_base_url
    }

    pub fn request_timeout(&self) -> Duration {
        self.timeout
    }

    /// Store path of the index blob.
    pub fn index_path(&self) -> String {
        join_path(&self.store_base_path(), INDEX_FILE_NAME)
    }

    /// Store path of the file uploaded under `title`.
    pub fn document_path(&self, title: &str) -> String {
        join_path(&self.store_base_path(), &encode_segment(title))
    }

    /// The base path with each segment percent-encoded.
    pub fn store_base_path(&self) -> String {
        self.base_path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(encode_segment)
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Returns true if the token looks like one of GitHub's token formats.
    /// Only used to warn about likely copy/paste mistakes.
    pub fn token_looks_valid(&self) -> bool {
        let token = self.token.expose_secret();
        ["ghp_", "gho_", "ghu_", "ghs_", "github_pat_"].iter().any(|prefix| token.starts_with(prefix))
            || token.len() == 40 && token.chars().all(|c| c.is_ascii_hexdigit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RepoConfig {
        RepoConfig::new("octo", "docs-store", "ghp_abc").unwrap()
    }

    #[test]
    fn rejects_empty_and_slashed_names() {
        assert_eq!(RepoConfig::new("", "r", "t").unwrap_err(), ConfigError::EmptyOwner);
        assert_eq!(RepoConfig::new("o", " ", "t").unwrap_err(), ConfigError::EmptyRepo);
        assert_eq!(RepoConfig::new("o", "r", "").unwrap_err(), ConfigError::EmptyToken);
        assert!(matches!(RepoConfig::new("o/x", "r", "t"), Err(ConfigError::InvalidName { field: "owner", .. })));
    }

    #[test]
    fn paths_derive_from_base_path() {
        let root = config();
        assert_eq!(root.index_path(), "index.json");
        assert_eq!(root.document_path("Report v1"), "Report%20v1");

        let nested = config().base_path("/team docs/2024/");
        assert_eq!(nested.documents_path(), "team docs/2024");
        assert_eq!(nested.index_path(), "team%20docs/2024/index.json");
        assert_eq!(nested.document_path("a/b"), "team%20docs/2024/a%2Fb");
    }

    #[test]
    fn base_url_gets_trailing_slash() {
        let cfg = config().api_base_url("https://ghe.example.com/api/v3").unwrap();
        assert_eq!(cfg.api_url().as_str(), "https://ghe.example.com/api/v3/");
        assert!(config().api_base_url("not a url").is_err());
    }

    #[test]
    fn debug_output_redacts_token() {
        let printed = format!("{:?}", config());
        assert!(!printed.contains("ghp_abc"));
    }

    #[test]
    fn empty_branch_means_default() {
        assert_eq!(config().branch(Some(" ".into())).branch_name(), None);
        assert_eq!(config().branch(Some("main".into())).branch_name(), Some("main"));
    }
}
