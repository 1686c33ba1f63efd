use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use secrecy::ExposeSecret;
use tracing::{debug, error, instrument, trace};
use url::Url;

use gitdocs_core::store::encode_segment;
use gitdocs_core::{ContentStore, PutRequest, PutResponse, RepoConfig, StoreError, StoredObject, VersionToken};

use super::error::{map_response_error, GitHubError};
use super::helpers::{ContentsResponse, PutContentsRequest, PutContentsResponse};

const GITHUB_API_VERSION_HEADER: &str = "X-GitHub-Api-Version";
const GITHUB_API_VERSION: &str = "2022-11-28";
const ACCEPT_JSON: &str = "application/vnd.github+json";
const ACCEPT_RAW: &str = "application/vnd.github.raw";
const CLIENT_USER_AGENT: &str = concat!("gitdocs/", env!("CARGO_PKG_VERSION"));

/// Content store backed by the GitHub Contents API.
///
/// Blob shas serve as version tokens. Every request carries the configured
/// timeout.
#[derive(Clone, Debug)]
pub struct GitHubStore {
    config: RepoConfig,
    http_client: Client,
}

impl GitHubStore {
    pub fn new(config: RepoConfig) -> Result<Self, GitHubError> {
        Self::new_with_client(config, None)
    }

    /// Creates the store, building a default HTTP client if one is not provided.
    #[instrument(name = "github_store_new", skip(config, client_override), fields(repo = %format!("{}/{}", config.owner(), config.repo())))]
    pub fn new_with_client(config: RepoConfig, client_override: Option<Client>) -> Result<Self, GitHubError> {
        let http_client = match client_override {
            Some(client) => {
                debug!("Using provided HTTP client.");
                client
            }
            None => {
                debug!(timeout = ?config.request_timeout(), "Building default HTTP client.");
                Client::builder()
                    .timeout(config.request_timeout())
                    .user_agent(CLIENT_USER_AGENT)
                    .build()
                    .map_err(|e| GitHubError::InvalidConfiguration(
                        format!("Failed to build default HTTP client: {}", e)
                    ))?
            }
        };

        // Log base URL without the token
        debug!(base_url = %config.api_url(), "GitHub store initialized.");
        Ok(Self { config, http_client })
    }

    pub fn config(&self) -> &RepoConfig {
        &self.config
    }

    /// Builds `{api}/repos/{owner}/{repo}/contents/{path}`. `path` is spliced in as-is.
    pub(crate) fn contents_url(&self, path: &str) -> Result<Url, GitHubError> {
        let relative = format!(
            "repos/{}/{}/contents/{}",
            encode_segment(self.config.owner()),
            encode_segment(self.config.repo()),
            path.trim_start_matches('/'),
        );
        let url = self.config.api_url().join(&relative)
            .map_err(|e| GitHubError::InvalidConfiguration(format!("Cannot build contents URL for '{}': {}", path, e)))?;
        trace!(built_url = %url, "Built GitHub contents URL");
        Ok(url)
    }

    fn request(&self, method: Method, url: Url, accept: &str) -> RequestBuilder {
        self.http_client
            .request(method, url)
            .header(AUTHORIZATION, format!("Bearer {}", self.config.token().expose_secret()))
            .header(ACCEPT, accept)
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .header(GITHUB_API_VERSION_HEADER, GITHUB_API_VERSION)
    }

    fn read_url(&self, path: &str) -> Result<Url, GitHubError> {
        let mut url = self.contents_url(path)?;
        if let Some(branch) = self.config.branch_name() {
            url.query_pairs_mut().append_pair("ref", branch);
        }
        Ok(url)
    }

    /// Reads a file. Returns `Ok(None)` on 404.
    #[instrument(skip(self), fields(path = %path))]
    pub async fn get_contents(&self, path: &str) -> Result<Option<StoredObject>, GitHubError> {
        let url = self.read_url(path)?;
        debug!(target: "github_api::contents", url = %url, "Fetching contents");

        let response = self.request(Method::GET, url, ACCEPT_JSON).send().await.map_err(|e| {
            error!(target: "github_api::contents", error = %e, "Contents request failed");
            GitHubError::Network(e)
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!(target: "github_api::contents", "Not found");
            return Ok(None);
        }
        if !status.is_success() {
            error!(target: "github_api::contents", %status, "Contents request returned error status");
            return Err(map_response_error(response, path).await);
        }

        let body = response.bytes().await?;
        if body.first() == Some(&b'[') {
            return Err(GitHubError::UnexpectedResponse(format!("'{}' is a directory, not a file", path)));
        }
        let contents: ContentsResponse = serde_json::from_slice(&body).map_err(|source| GitHubError::ResponseParsing {
            context: "contents response".to_string(),
            source,
        })?;
        if contents.kind != "file" {
            return Err(GitHubError::UnexpectedResponse(format!("'{}' is a {}, not a file", path, contents.kind)));
        }

        let content = if contents.content_omitted() {
            debug!(target: "github_api::contents", size = contents.size, "Content not inlined, fetching raw");
            self.get_raw(path).await?
        } else {
            contents.decode_content().map_err(|source| GitHubError::ContentDecoding { path: path.to_string(), source })?
        };

        Ok(Some(StoredObject { content, version: VersionToken::new(contents.sha) }))
    }

    /// Fetches file bytes through the raw media type (files over 1 MB).
    async fn get_raw(&self, path: &str) -> Result<Vec<u8>, GitHubError> {
        let url = self.read_url(path)?;
        let response = self.request(Method::GET, url, ACCEPT_RAW).send().await?;
        if !response.status().is_success() {
            error!(target: "github_api::contents", status = %response.status(), "Raw contents request returned error status");
            return Err(map_response_error(response, path).await);
        }
        Ok(response.bytes().await?.to_vec())
    }

    /// Creates or updates a file. A `version` in the request selects update.
    #[instrument(skip(self, request), fields(path = %path, bytes = request.content.len(), update = request.version.is_some()))]
    pub async fn put_contents(&self, path: &str, request: PutRequest) -> Result<PutResponse, GitHubError> {
        let url = self.contents_url(path)?;
        let body = PutContentsRequest::new(
            &request.message,
            &request.content,
            request.version.as_ref().map(VersionToken::as_str),
            self.config.branch_name(),
        );
        debug!(target: "github_api::contents", url = %url, "Sending PUT contents request");

        let response = self.request(Method::PUT, url, ACCEPT_JSON).json(&body).send().await.map_err(|e| {
            error!(target: "github_api::contents", error = %e, "PUT contents request failed");
            GitHubError::Network(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            error!(target: "github_api::contents", %status, "PUT contents returned error status");
            return Err(map_response_error(response, path).await);
        }

        let body = response.bytes().await?;
        let written: PutContentsResponse = serde_json::from_slice(&body).map_err(|source| GitHubError::ResponseParsing {
            context: "PUT contents response".to_string(),
            source,
        })?;
        let content = written.content.ok_or_else(|| {
            GitHubError::UnexpectedResponse("PUT contents response has no content".to_string())
        })?;
        debug!(target: "github_api::contents", sha = %content.sha, commit = %written.commit.sha, "File written");

        Ok(PutResponse {
            url: content.retrieval_url(),
            version: VersionToken::new(content.sha),
        })
    }
}

#[async_trait]
impl ContentStore for GitHubStore {
    async fn get(&self, path: &str) -> Result<Option<StoredObject>, StoreError> {
        Ok(self.get_contents(path).await?)
    }

    async fn put(&self, path: &str, request: PutRequest) -> Result<PutResponse, StoreError> {
        Ok(self.put_contents(path, request).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(config: RepoConfig) -> GitHubStore {
        GitHubStore::new(config).unwrap()
    }

    #[test]
    fn contents_url_keeps_encoded_path() {
        let config = RepoConfig::new("octo", "docs", "ghp_x").unwrap().base_path("team docs");
        let store = store(config.clone());

        let url = store.contents_url(&config.document_path("Report v1")).unwrap();
        assert_eq!(url.as_str(), "https://api.github.com/repos/octo/docs/contents/team%20docs/Report%20v1");
    }

    #[test]
    fn read_url_selects_branch() {
        let config = RepoConfig::new("octo", "docs", "ghp_x").unwrap().branch(Some("archive".into()));
        let store = store(config.clone());

        let url = store.read_url(&config.index_path()).unwrap();
        assert_eq!(url.as_str(), "https://api.github.com/repos/octo/docs/contents/index.json?ref=archive");
    }

    #[test]
    fn enterprise_base_url_is_respected() {
        let config = RepoConfig::new("octo", "docs", "ghp_x").unwrap()
            .api_base_url("https://ghe.example.com/api/v3").unwrap();
        let url = store(config).contents_url("index.json").unwrap();
        assert_eq!(url.as_str(), "https://ghe.example.com/api/v3/repos/octo/docs/contents/index.json");
    }
}
