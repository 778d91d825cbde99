//! Wire shapes for the GitHub REST endpoints hoist talks to.
//!
//! Only the fields the release pipeline reads are modelled; everything else in
//! the API responses is ignored by serde.

use serde::{Deserialize, Serialize};

/// A tag as returned by `GET /repos/{owner}/{repo}/tags` (newest first).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub commit: TagCommit,
}

/// The commit a tag points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCommit {
    pub sha: String,
    #[serde(default)]
    pub url: String,
}

/// A commit as returned by `GET /repos/{owner}/{repo}/commits`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub sha: String,
    pub html_url: String,
    pub commit: CommitDetail,
    /// Platform user the committer identity resolved to, if any.
    #[serde(default)]
    pub committer: Option<UserRef>,
}

impl Commit {
    /// Raw commit message, empty when the API omitted it.
    pub fn message(&self) -> &str {
        self.commit.message.as_deref().unwrap_or("")
    }

    /// Platform login of the committer, when GitHub could resolve one.
    pub fn committer_login(&self) -> Option<&str> {
        self.committer.as_ref().map(|u| u.login.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitDetail {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub login: String,
}

/// One page of commit history.
#[derive(Debug, Clone, Default)]
pub struct CommitPage {
    pub commits: Vec<Commit>,
    /// Whether the API advertised a next page (`Link: rel="next"`).
    pub has_next: bool,
}

/// Fields submitted to create or update a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseDraft {
    pub tag_name: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    pub draft: bool,
    pub prerelease: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_commitish: Option<String>,
    pub generate_release_notes: bool,
}

/// A release record as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub id: u64,
    pub upload_url: String,
    pub html_url: String,
    pub tag_name: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub target_commitish: Option<String>,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub assets: Vec<AssetRef>,
}

/// An asset already attached to a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRef {
    pub id: u64,
    pub name: String,
}

/// Query for one page of commit history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitQuery {
    /// Branch, tag or sha to start listing from; default branch when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
    pub per_page: u8,
    pub page: u32,
}

/// A local file prepared for upload as a release asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseAsset {
    pub name: String,
    pub mime: String,
    pub size: u64,
    pub data: Vec<u8>,
}
