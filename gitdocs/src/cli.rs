use clap::{Args, Parser, Subcommand};
use gitdocs_core::DocumentStatus;
use std::fmt;
use std::path::PathBuf;

/// gitdocs: Manage documents stored in a GitHub repository.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub repo: RepoArgs,

    /// Increase verbosity (use multiple times for more).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Repository connection settings. Each flag falls back to an environment variable.
#[derive(Args, Clone)]
pub struct RepoArgs {
    /// Owner (user or organization) of the backing repository.
    #[arg(long, env = "GITDOCS_OWNER", global = true)]
    pub owner: Option<String>,

    /// Name of the backing repository.
    #[arg(long, env = "GITDOCS_REPO", global = true)]
    pub repo: Option<String>,

    /// Directory inside the repository that holds documents and index.json.
    #[arg(long, env = "GITDOCS_PATH", default_value = "", global = true)]
    pub path: String,

    /// Branch to read from and commit to (default branch if omitted).
    #[arg(long, env = "GITDOCS_BRANCH", global = true)]
    pub branch: Option<String>,

    /// Personal access token with contents read/write permission.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,

    /// Base URL of the GitHub REST API (for GitHub Enterprise).
    #[arg(long, env = "GITDOCS_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Request timeout in seconds.
    #[arg(long, env = "GITDOCS_TIMEOUT", default_value_t = 30, global = true)]
    pub timeout: u64,
}

// Hand-written so the token never ends up in debug output.
impl fmt::Debug for RepoArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepoArgs")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("path", &self.path)
            .field("branch", &self.branch)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("api_url", &self.api_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the documents in the index.
    List(ListArgs),
    /// Show the details of one document.
    Show(ShowArgs),
    /// Upload a file and record it in the index.
    Upload(UploadArgs),
    /// List the categories in use.
    Categories,
}

// --- Argument Structs for each Subcommand ---

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only show documents with this status.
    #[arg(long, short, value_parser = parse_status)]
    pub status: Option<DocumentStatus>,

    /// Only show documents in this category (case-insensitive).
    #[arg(long, short)]
    pub category: Option<String>,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Title of the document.
    #[arg(required = true)]
    pub title: String,
}

#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Path of the file to upload.
    #[arg(required = true)]
    pub file: PathBuf,

    /// Document title. Defaults to the file name.
    #[arg(long, short)]
    pub title: Option<String>,

    /// Review status: draft, under review, approved, final, archived.
    #[arg(long, short, value_parser = parse_status, default_value = "draft")]
    pub status: DocumentStatus,

    /// Category of the document.
    #[arg(long, short, default_value = "")]
    pub category: String,

    /// Free-text metadata.
    #[arg(long, short, default_value = "")]
    pub meta: String,

    /// Overwrite an existing document with the same title without asking.
    #[arg(long, short)]
    pub yes: bool,
}

fn parse_status(s: &str) -> Result<DocumentStatus, String> {
    s.parse().map_err(|e: gitdocs_core::document::ParseStatusError| e.to_string())
}
