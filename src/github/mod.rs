//! GitHub API operations using octocrab.

pub mod auth;
pub mod client;
pub mod models;
pub mod repo;

pub use auth::resolve_github_token;
pub use client::{GitHubApi, OctocrabApi};
pub use models::{Commit, CommitPage, CommitQuery, Release, ReleaseAsset, ReleaseDraft, Tag};
pub use repo::RepoSlug;
