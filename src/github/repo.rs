//! Repository coordinates and URL helpers.

use std::fmt;
use std::sync::LazyLock;

use reqwest::Url;

use crate::error::ConfigError;

const GITHUB_WEB: &str = "https://github.com";

/// Base used only to percent-encode API route segments.
static ROUTE_BASE: LazyLock<Url> =
    LazyLock::new(|| Url::parse("https://api.github.com/").expect("Invalid URL"));

/// `owner/repo` coordinates of a GitHub repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSlug {
    pub owner: String,
    pub repo: String,
}

impl RepoSlug {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// Parse `owner/repo`, or a GitHub remote URL in SSH or HTTPS form.
    pub fn parse(input: &str) -> Result<Self, ConfigError> {
        let input = input.trim();
        let invalid = || ConfigError::InvalidRepository(input.to_string());

        // Handle SSH format: git@github.com:owner/repo.git
        if let Some(path) = input.strip_prefix("git@github.com:") {
            return parse_owner_repo_path(path).ok_or_else(invalid);
        }

        // Handle HTTPS format: https://github.com/owner/repo.git
        if input.contains("github.com/") {
            let path = input.split("github.com/").nth(1).ok_or_else(invalid)?;
            return parse_owner_repo_path(path).ok_or_else(invalid);
        }

        if input.contains("://") {
            return Err(invalid());
        }

        if input.matches('/').count() != 1 {
            return Err(invalid());
        }

        parse_owner_repo_path(input).ok_or_else(invalid)
    }

    /// API route of the release for `tag`. The tag is a single path segment,
    /// so `/`, `#` and `?` inside it are percent-encoded.
    pub fn release_by_tag_route(&self, tag: &str) -> String {
        let mut url = ROUTE_BASE.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend([
                "repos",
                self.owner.as_str(),
                self.repo.as_str(),
                "releases",
                "tags",
                tag,
            ]);
        }
        url.path().to_string()
    }

    /// Web URL of issue `number` in this repository.
    pub fn issue_url(&self, number: &str) -> String {
        format!("{}/{}/{}/issues/{}", GITHUB_WEB, self.owner, self.repo, number)
    }
}

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

fn parse_owner_repo_path(path: &str) -> Option<RepoSlug> {
    let path = path.trim_end_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    let mut parts = path.split('/');
    let owner = parts.next().filter(|p| !p.is_empty())?;
    let repo = parts.next().filter(|p| !p.is_empty())?;
    Some(RepoSlug::new(owner, repo))
}

/// Strip the RFC 6570 template suffix from a release `upload_url`.
///
/// `https://uploads.github.com/repos/o/r/releases/1/assets{?name,label}`
/// becomes `https://uploads.github.com/repos/o/r/releases/1/assets`.
pub fn upload_endpoint(upload_url: &str) -> &str {
    match upload_url.find('{') {
        Some(pos) => &upload_url[..pos],
        None => upload_url,
    }
}
