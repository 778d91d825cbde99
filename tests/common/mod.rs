//! Shared test utilities for integration tests.
//!
//! Not all functions are used by every test file, but they're shared across tests.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use hoist::github::OctocrabApi;
use octocrab::Octocrab;
use octocrab::service::middleware::retry::RetryConfig;
use serde_json::{Value, json};
use wiremock::MockServer;

pub const TEST_TOKEN: &str = "test-token";
pub const OWNER: &str = "acme";
pub const REPO: &str = "widgets";

/// Helper to create an octocrab client pointing to a mock server.
///
/// Built like the production client, without octocrab's own retries.
pub fn mock_octocrab(server: &MockServer) -> Octocrab {
    Octocrab::builder()
        .base_uri(server.uri())
        .expect("Failed to set base URI")
        .add_retry_config(RetryConfig::None)
        .build()
        .expect("Failed to build octocrab")
}

/// A [`OctocrabApi`] talking to the mock server.
pub fn mock_api(server: &MockServer) -> OctocrabApi {
    mock_api_with_timeout(server, Duration::from_secs(5))
}

pub fn mock_api_with_timeout(server: &MockServer, timeout: Duration) -> OctocrabApi {
    OctocrabApi::with_client(mock_octocrab(server), TEST_TOKEN, timeout)
        .expect("Failed to build API client")
}

/// Route under the test repository, e.g. `repo_path("/tags")`.
pub fn repo_path(suffix: &str) -> String {
    format!("/repos/{}/{}{}", OWNER, REPO, suffix)
}

/// A tag object as `GET /repos/{o}/{r}/tags` returns it.
pub fn tag_json(name: &str, sha: &str) -> Value {
    json!({
        "name": name,
        "commit": {
            "sha": sha,
            "url": format!("https://api.github.com/repos/acme/widgets/commits/{}", sha)
        },
        "zipball_url": format!("https://api.github.com/repos/acme/widgets/zipball/{}", name),
        "tarball_url": format!("https://api.github.com/repos/acme/widgets/tarball/{}", name),
        "node_id": "MDM6UmVmMTpyZWZzL3RhZ3MvdjEuMC4w"
    })
}

/// A commit object as `GET /repos/{o}/{r}/commits` returns it.
pub fn commit_json(sha: &str, message: &str, login: Option<&str>) -> Value {
    json!({
        "sha": sha,
        "node_id": format!("C_{}", sha),
        "html_url": format!("https://github.com/acme/widgets/commit/{}", sha),
        "commit": {
            "message": message,
            "author": {
                "name": "Test User",
                "email": "test@example.com",
                "date": "2024-01-15T10:00:00Z"
            },
            "committer": {
                "name": "Test User",
                "email": "test@example.com",
                "date": "2024-01-15T10:00:00Z"
            }
        },
        "committer": login.map(|l| json!({ "login": l, "id": 1, "type": "User" })),
        "parents": []
    })
}

/// A release object whose upload URL points back at the mock server.
pub fn release_json(server: &MockServer, id: u64, tag: &str, assets: Value) -> Value {
    json!({
        "id": id,
        "node_id": format!("RE_{}", id),
        "url": format!("{}/repos/acme/widgets/releases/{}", server.uri(), id),
        "html_url": format!("https://github.com/acme/widgets/releases/tag/{}", tag),
        "upload_url": format!(
            "{}/uploads/repos/acme/widgets/releases/{}/assets{{?name,label}}",
            server.uri(),
            id
        ),
        "tag_name": tag,
        "target_commitish": "main",
        "name": tag,
        "body": null,
        "draft": false,
        "prerelease": false,
        "created_at": "2024-01-15T10:00:00Z",
        "published_at": "2024-01-15T10:00:00Z",
        "assets": assets
    })
}

/// Path of the mock upload endpoint for release `id`.
pub fn upload_path(id: u64) -> String {
    format!("/uploads/repos/acme/widgets/releases/{}/assets", id)
}

/// An API error body.
pub fn error_json(message: &str) -> Value {
    json!({
        "message": message,
        "documentation_url": "https://docs.github.com/rest"
    })
}

/// Create a temporary directory for test output.
pub fn temp_test_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

/// Write `content` to `dir/name` and return the path.
pub fn write_asset(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("Failed to write asset file");
    path
}
