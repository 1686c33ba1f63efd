use base64::{engine::general_purpose::STANDARD as Base64Standard, Engine};
use serde::{Deserialize, Serialize};

// --- Request Structures ---

/// Body of `PUT /repos/{owner}/{repo}/contents/{path}`.
#[derive(Debug, Clone, Serialize)]
pub struct PutContentsRequest<'a> {
    /// Commit message.
    pub message: &'a str,
    /// Base64 encoded file content.
    pub content: String,
    /// Blob sha of the file being replaced. Omitted when creating a file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<&'a str>,
    /// Branch to commit to. Omitted for the default branch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<&'a str>,
}

impl<'a> PutContentsRequest<'a> {
    pub fn new(message: &'a str, content: &[u8], sha: Option<&'a str>, branch: Option<&'a str>) -> Self {
        Self {
            message,
            content: Base64Standard.encode(content),
            sha,
            branch,
        }
    }
}

// --- Response Structures ---

/// Metadata and content of a single file, as returned by `GET .../contents/{path}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentsResponse {
    /// "file", "dir", "symlink" or "submodule". Directory listings come back as arrays instead.
    #[serde(rename = "type")]
    pub kind: String,
    pub path: String,
    /// Blob sha, used as the version token.
    pub sha: String,
    #[serde(default)]
    pub size: u64,
    /// Base64 content, wrapped at 60 columns. Empty for files over 1 MB.
    #[serde(default)]
    pub content: Option<String>,
    /// "base64", or "none" when the file is too large to inline.
    #[serde(default)]
    pub encoding: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
}

impl ContentsResponse {
    /// True if the content must be fetched separately through the raw media type.
    pub fn content_omitted(&self) -> bool {
        match self.encoding.as_deref() {
            Some("base64") => false,
            Some(_) => true,
            None => self.content.is_none() && self.size > 0,
        }
    }

    pub fn decode_content(&self) -> Result<Vec<u8>, base64::DecodeError> {
        decode_wrapped_base64(self.content.as_deref().unwrap_or_default())
    }
}

/// Response of `PUT .../contents/{path}`.
#[derive(Debug, Clone, Deserialize)]
pub struct PutContentsResponse {
    pub content: Option<WrittenContent>,
    pub commit: CommitInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WrittenContent {
    pub path: String,
    pub sha: String,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
}

impl WrittenContent {
    /// URL the file can be retrieved from: the raw download URL if there is one.
    pub fn retrieval_url(&self) -> Option<String> {
        self.download_url.clone().or_else(|| self.html_url.clone())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitInfo {
    pub sha: String,
}

/// Decodes base64 that may contain line breaks, as GitHub sends it.
pub fn decode_wrapped_base64(text: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    Base64Standard.decode(compact)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_wrapped_content() {
        let response: ContentsResponse = serde_json::from_str(r#"{
            "type": "file",
            "path": "docs/index.json",
            "sha": "3d21ec53a331a6f037a91c368710b99387d012c1",
            "size": 19,
            "encoding": "base64",
            "content": "W3sidGl0bGUiOiJB\nIn1dCg==\n",
            "download_url": "https://raw.githubusercontent.com/octo/docs/main/docs/index.json"
        }"#).unwrap();

        assert!(!response.content_omitted());
        assert_eq!(response.decode_content().unwrap(), b"[{\"title\":\"A\"}]\n");
    }

    #[test]
    fn large_files_report_omitted_content() {
        let response: ContentsResponse = serde_json::from_str(r#"{
            "type": "file",
            "path": "docs/big.pdf",
            "sha": "abc",
            "size": 5242880,
            "encoding": "none",
            "content": ""
        }"#).unwrap();

        assert!(response.content_omitted());
    }

    #[test]
    fn put_body_omits_sha_when_creating() {
        let create = serde_json::to_value(PutContentsRequest::new("Upload document: A", b"hi", None, None)).unwrap();
        assert_eq!(create["content"], "aGk=");
        assert!(create.get("sha").is_none());
        assert!(create.get("branch").is_none());

        let update = serde_json::to_value(PutContentsRequest::new("m", b"hi", Some("abc"), Some("main"))).unwrap();
        assert_eq!(update["sha"], "abc");
        assert_eq!(update["branch"], "main");
    }

    #[test]
    fn retrieval_url_prefers_download_url() {
        let written: PutContentsResponse = serde_json::from_str(r#"{
            "content": {
                "path": "docs/Report%20v1",
                "sha": "95b966ae1c166bd92f8ae7d1c313e738c731dfc3",
                "download_url": "https://raw.githubusercontent.com/octo/docs/main/docs/Report%20v1",
                "html_url": "https://github.com/octo/docs/blob/main/docs/Report%20v1"
            },
            "commit": { "sha": "7638417db6d59f3c431d3e1f261cc637155684cd" }
        }"#).unwrap();

        let content = written.content.unwrap();
        assert_eq!(content.retrieval_url().unwrap(), "https://raw.githubusercontent.com/octo/docs/main/docs/Report%20v1");
    }
}
