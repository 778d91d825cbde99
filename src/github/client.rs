//! GitHub REST access used by the release pipeline.
//!
//! [`GitHubApi`] is the seam between the pipeline and the platform: the
//! pipeline only ever sees this trait, so tests substitute a mock. The
//! production [`OctocrabApi`] uses octocrab for REST calls and a plain
//! reqwest client for the raw asset upload against `uploads.github.com`.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use octocrab::service::middleware::retry::RetryConfig;
use octocrab::{Octocrab, Page};
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::GitHubError;

use super::models::{Commit, CommitPage, CommitQuery, Release, ReleaseAsset, ReleaseDraft, Tag};
use super::repo::{RepoSlug, upload_endpoint};

/// Tags are fetched 100 at a time, up to this many pages.
const TAG_PAGE_LIMIT: u32 = 10;

/// Wait before the single retry of a request that exhausted the quota.
const RATE_LIMIT_WAIT_SECS: u64 = 60;

/// Operations the release pipeline needs from the hosting platform.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GitHubApi: Send + Sync {
    /// List tags, newest first.
    async fn list_tags(&self, repo: &RepoSlug) -> Result<Vec<Tag>, GitHubError>;

    /// List one page of commits in reverse-chronological order.
    async fn list_commits(
        &self,
        repo: &RepoSlug,
        query: &CommitQuery,
    ) -> Result<CommitPage, GitHubError>;

    /// Look up the release for `tag`; `None` when there is none.
    async fn get_release_by_tag(
        &self,
        repo: &RepoSlug,
        tag: &str,
    ) -> Result<Option<Release>, GitHubError>;

    /// Create a release. Fails on a tag/name conflict.
    async fn create_release(
        &self,
        repo: &RepoSlug,
        draft: &ReleaseDraft,
    ) -> Result<Release, GitHubError>;

    /// Overwrite an existing release with the fields of `draft`.
    async fn update_release(
        &self,
        repo: &RepoSlug,
        release_id: u64,
        draft: &ReleaseDraft,
    ) -> Result<Release, GitHubError>;

    async fn delete_release_asset(&self, repo: &RepoSlug, asset_id: u64)
    -> Result<(), GitHubError>;

    /// Upload raw bytes against a release's `upload_url`.
    ///
    /// Returns the created asset record exactly as the server sent it.
    async fn upload_release_asset(
        &self,
        upload_url: &str,
        asset: &ReleaseAsset,
    ) -> Result<serde_json::Value, GitHubError>;
}

/// [`GitHubApi`] backed by octocrab and reqwest.
pub struct OctocrabApi {
    octocrab: Octocrab,
    http: reqwest::Client,
    token: String,
    timeout: Duration,
    rate_limit_wait: Duration,
}

#[derive(Serialize)]
struct TagQuery {
    per_page: u8,
    page: u32,
}

impl OctocrabApi {
    /// Build a client authenticated with `token` against api.github.com.
    ///
    /// octocrab's own retry layer is disabled; callers decide what to retry.
    pub fn new(token: &str, timeout: Duration) -> Result<Self, GitHubError> {
        let octocrab = Octocrab::builder()
            .personal_token(token.to_string())
            .add_retry_config(RetryConfig::None)
            .build()
            .map_err(|e| GitHubError::Api(Box::new(e)))?;

        Self::with_client(octocrab, token, timeout)
    }

    /// Wrap a pre-configured octocrab client.
    ///
    /// This allows dependency injection for testing with mock servers.
    pub fn with_client(
        octocrab: Octocrab,
        token: &str,
        timeout: Duration,
    ) -> Result<Self, GitHubError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("hoist/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(GitHubError::Http)?;

        Ok(Self {
            octocrab,
            http,
            token: token.to_string(),
            timeout,
            rate_limit_wait: Duration::from_secs(RATE_LIMIT_WAIT_SECS),
        })
    }

    /// Override how long to wait before retrying a rate-limited request.
    pub fn with_rate_limit_wait(mut self, wait: Duration) -> Self {
        self.rate_limit_wait = wait;
        self
    }

    /// Issue `call`, retrying once if the request quota was exhausted.
    ///
    /// Secondary (abuse) limits are logged and returned as-is.
    async fn throttled<T, F, Fut>(
        &self,
        operation: &'static str,
        mut call: F,
    ) -> Result<T, GitHubError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, GitHubError>>,
    {
        match call().await {
            Err(e) if e.is_abuse_limited() => {
                warn!("Abuse detected for request '{}': {}", operation, e);
                Err(e)
            }
            Err(e) if e.is_rate_limited() => {
                warn!("Request quota exhausted for request '{}'", operation);
                debug!(
                    "Retrying '{}' after {}s",
                    operation,
                    self.rate_limit_wait.as_secs()
                );
                tokio::time::sleep(self.rate_limit_wait).await;
                call().await
            }
            result => result,
        }
    }

    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> Result<T, GitHubError>
    where
        F: Future<Output = Result<T, octocrab::Error>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result.map_err(GitHubError::from),
            Err(_) => Err(GitHubError::Timeout {
                operation,
                seconds: self.timeout.as_secs(),
            }),
        }
    }

    async fn upload_once(
        &self,
        upload_url: &str,
        asset: &ReleaseAsset,
    ) -> Result<serde_json::Value, GitHubError> {
        let mut endpoint = reqwest::Url::parse(upload_endpoint(upload_url)).map_err(|e| {
            GitHubError::InvalidResponse(format!("invalid upload url '{}': {}", upload_url, e))
        })?;
        endpoint.query_pairs_mut().append_pair("name", &asset.name);

        let response = self
            .http
            .post(endpoint)
            .header(CONTENT_LENGTH, asset.size)
            .header(CONTENT_TYPE, asset.mime.as_str())
            .header(ACCEPT, "application/vnd.github+json")
            .header(AUTHORIZATION, format!("token {}", self.token))
            .body(asset.data.clone())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GitHubError::Timeout {
                        operation: "upload release asset",
                        seconds: self.timeout.as_secs(),
                    }
                } else {
                    GitHubError::Http(e)
                }
            })?;

        let status = response.status();
        let text = response.text().await.map_err(GitHubError::Http)?;
        let json = serde_json::from_str::<serde_json::Value>(&text)
            .unwrap_or_else(|_| serde_json::json!({ "message": text }));

        if status != StatusCode::CREATED {
            return Err(GitHubError::Status {
                status: status.as_u16(),
                message: json
                    .get("message")
                    .and_then(|m| m.as_str())
                    .unwrap_or_default()
                    .to_string(),
                errors: json.get("errors").cloned(),
            });
        }

        Ok(json)
    }
}

#[async_trait]
impl GitHubApi for OctocrabApi {
    async fn list_tags(&self, repo: &RepoSlug) -> Result<Vec<Tag>, GitHubError> {
        let route = format!("/repos/{}/{}/tags", repo.owner, repo.repo);
        let mut tags = Vec::new();
        let mut page = 1u32;

        loop {
            let query = TagQuery { per_page: 100, page };
            let result: Page<Tag> = self
                .throttled("list tags", || {
                    self.bounded("list tags", self.octocrab.get(&route, Some(&query)))
                })
                .await?;

            let has_next = result.next.is_some();
            tags.extend(result.items);

            if !has_next || page >= TAG_PAGE_LIMIT {
                break;
            }
            page += 1;
        }

        debug!("Fetched {} tags for {}", tags.len(), repo);
        Ok(tags)
    }

    async fn list_commits(
        &self,
        repo: &RepoSlug,
        query: &CommitQuery,
    ) -> Result<CommitPage, GitHubError> {
        let route = format!("/repos/{}/{}/commits", repo.owner, repo.repo);
        let result: Page<Commit> = self
            .throttled("list commits", || {
                self.bounded("list commits", self.octocrab.get(&route, Some(query)))
            })
            .await?;

        Ok(CommitPage {
            has_next: result.next.is_some(),
            commits: result.items,
        })
    }

    async fn get_release_by_tag(
        &self,
        repo: &RepoSlug,
        tag: &str,
    ) -> Result<Option<Release>, GitHubError> {
        let route = repo.release_by_tag_route(tag);
        let result: Result<Release, GitHubError> = self
            .throttled("get release by tag", || {
                self.bounded("get release by tag", self.octocrab.get(&route, None::<&()>))
            })
            .await;

        match result {
            Ok(release) => Ok(Some(release)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn create_release(
        &self,
        repo: &RepoSlug,
        draft: &ReleaseDraft,
    ) -> Result<Release, GitHubError> {
        let route = format!("/repos/{}/{}/releases", repo.owner, repo.repo);
        self.throttled("create release", || {
            self.bounded("create release", self.octocrab.post(&route, Some(draft)))
        })
        .await
    }

    async fn update_release(
        &self,
        repo: &RepoSlug,
        release_id: u64,
        draft: &ReleaseDraft,
    ) -> Result<Release, GitHubError> {
        let route = format!("/repos/{}/{}/releases/{}", repo.owner, repo.repo, release_id);
        self.throttled("update release", || {
            self.bounded("update release", self.octocrab.patch(&route, Some(draft)))
        })
        .await
    }

    async fn delete_release_asset(
        &self,
        repo: &RepoSlug,
        asset_id: u64,
    ) -> Result<(), GitHubError> {
        self.throttled("delete release asset", || async {
            self.bounded(
                "delete release asset",
                self.octocrab
                    .repos(&repo.owner, &repo.repo)
                    .release_assets()
                    .delete(asset_id),
            )
            .await
        })
        .await
    }

    async fn upload_release_asset(
        &self,
        upload_url: &str,
        asset: &ReleaseAsset,
    ) -> Result<serde_json::Value, GitHubError> {
        self.throttled("upload release asset", || self.upload_once(upload_url, asset))
            .await
    }
}
