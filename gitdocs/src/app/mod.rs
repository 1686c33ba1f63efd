use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use gitdocs_core::session::AlwaysConfirm;
use gitdocs_core::{Confirm, ContentStore, IndexSynchronizer, RepoConfig, UploadSession};
use gitdocs_extensions::github::GitHubStore;
use tracing::{debug, warn};

use crate::cli::RepoArgs;

mod prompt;
pub use prompt::TerminalConfirm;

/// Everything a command needs to talk to the backing repository.
pub struct Gitdocs {
    pub config: RepoConfig,
    pub store: Arc<dyn ContentStore>,
}

impl Gitdocs {
    /// Builds the configuration from command line arguments and connects the
    /// GitHub store.
    pub fn from_args(args: &RepoArgs) -> Result<Self> {
        let config = repo_config(args)?;
        if !config.token_looks_valid() {
            warn!("The configured token does not look like a GitHub token");
        }
        debug!(owner = config.owner(), repo = config.repo(), path = config.documents_path(), "Using repository");

        let store = GitHubStore::new(config.clone()).context("Failed to create GitHub client")?;
        Ok(Self::with_store(config, Arc::new(store)))
    }

    pub fn with_store(config: RepoConfig, store: Arc<dyn ContentStore>) -> Self {
        Gitdocs { config, store }
    }

    pub fn synchronizer(&self) -> IndexSynchronizer {
        IndexSynchronizer::new(self.store.clone(), &self.config)
    }

    /// Starts an upload session. With `assume_yes`, overwrites are confirmed
    /// without asking.
    pub fn session(&self, assume_yes: bool) -> UploadSession {
        let confirm: Box<dyn Confirm> = if assume_yes {
            Box::new(AlwaysConfirm)
        } else {
            Box::new(TerminalConfirm)
        };
        UploadSession::new(self.store.clone(), &self.config, confirm)
    }
}

pub fn repo_config(args: &RepoArgs) -> Result<RepoConfig> {
    let owner = args.owner.clone().context("Repository owner not set (use --owner or GITDOCS_OWNER)")?;
    let repo = args.repo.clone().context("Repository name not set (use --repo or GITDOCS_REPO)")?;
    let token = args.token.clone().context("Access token not set (use --token or GITHUB_TOKEN)")?;

    let mut config = RepoConfig::new(owner, repo, token)?
        .base_path(&args.path)
        .branch(args.branch.clone())
        .timeout(Duration::from_secs(args.timeout));
    if let Some(url) = &args.api_url {
        config = config.api_base_url(url)?;
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> RepoArgs {
        RepoArgs {
            owner: Some("octo".to_string()),
            repo: Some("docs-store".to_string()),
            path: "/library/".to_string(),
            branch: Some("main".to_string()),
            token: Some("ghp_abc".to_string()),
            api_url: None,
            timeout: 5,
        }
    }

    #[test]
    fn builds_config_from_args() {
        let config = repo_config(&args()).unwrap();
        assert_eq!(config.owner(), "octo");
        assert_eq!(config.documents_path(), "library");
        assert_eq!(config.branch_name(), Some("main"));
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.api_url().as_str(), "https://api.github.com/");
    }

    #[test]
    fn custom_api_url_is_applied() {
        let mut args = args();
        args.api_url = Some("https://github.example.com/api/v3".to_string());
        let config = repo_config(&args).unwrap();
        assert_eq!(config.api_url().as_str(), "https://github.example.com/api/v3/");
    }

    #[test]
    fn missing_token_is_reported() {
        let mut args = args();
        args.token = None;
        let err = repo_config(&args).unwrap_err();
        assert!(err.to_string().contains("GITHUB_TOKEN"));
    }
}
