//! Release creation: resolve the body, then find-or-create under retry.

use tracing::debug;

use crate::config::Config;
use crate::error::{GitHubError, ReleaseError};
use crate::github::{GitHubApi, Release, ReleaseDraft, RepoSlug};
use crate::notes::generate_release_notes;
use crate::progress::{ProgressEvent, Reporter};

use super::retry::retry_with_backoff;

/// Create the release described by `config`, or update the one already
/// attached to its tag.
///
/// The body is resolved once before the first attempt, so every retry submits
/// an identical request. Each attempt looks the tag up again; a release that
/// appeared after a failed create is updated rather than duplicated.
pub async fn create_release<A: GitHubApi + ?Sized>(
    config: &Config,
    api: &A,
    reporter: &dyn Reporter,
) -> Result<Release, ReleaseError> {
    if config.tag.is_empty() && !config.draft {
        return Err(ReleaseError::MissingTag);
    }

    let body = resolve_body(config, api, reporter).await?;
    let draft = build_draft(config, body);

    reporter.report(&ProgressEvent::CreatingRelease {
        tag: draft.tag_name.clone(),
        target_commitish: draft.target_commitish.clone(),
    });

    let max_attempts = config.retry.max_attempts.max(1);
    let release = retry_with_backoff(
        &config.retry,
        || publish_once(api, &config.repo, &draft, reporter),
        |attempt, error: &GitHubError| {
            reporter.report(&ProgressEvent::CreateRetrying {
                attempt,
                remaining: max_attempts - attempt,
                error: error.to_string(),
            });
        },
        |attempts, source| ReleaseError::RetriesExhausted { attempts, source },
    )
    .await?;

    debug!("Release {} ready at {}", release.id, release.html_url);
    Ok(release)
}

/// The release body: explicit text wins, otherwise notes derived from commits
/// when enabled.
pub async fn resolve_body<A: GitHubApi + ?Sized>(
    config: &Config,
    api: &A,
    reporter: &dyn Reporter,
) -> Result<Option<String>, ReleaseError> {
    if let Some(body) = &config.body {
        return Ok(Some(body.clone()));
    }
    if !config.generate_by_commit {
        return Ok(None);
    }

    generate_release_notes(api, &config.repo, &config.rules, &config.range, reporter)
        .await
        .map_err(ReleaseError::NotesFailed)
}

/// Request fields for `config` with the resolved `body`.
pub fn build_draft(config: &Config, body: Option<String>) -> ReleaseDraft {
    ReleaseDraft {
        tag_name: config.tag.clone(),
        name: config.name.clone(),
        body,
        draft: config.draft,
        prerelease: config.prerelease,
        target_commitish: config.target_commitish.clone(),
        generate_release_notes: config.generate_release_notes,
    }
}

async fn publish_once<A: GitHubApi + ?Sized>(
    api: &A,
    repo: &RepoSlug,
    draft: &ReleaseDraft,
    reporter: &dyn Reporter,
) -> Result<Release, GitHubError> {
    if !draft.tag_name.is_empty() {
        if let Some(existing) = api.get_release_by_tag(repo, &draft.tag_name).await? {
            reporter.report(&ProgressEvent::UpdatingRelease {
                tag: draft.tag_name.clone(),
                id: existing.id,
            });
            return api.update_release(repo, existing.id, draft).await;
        }
    }

    api.create_release(repo, draft).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NotesError;
    use crate::github::client::MockGitHubApi;
    use crate::github::models::{Commit, CommitDetail, CommitPage, Tag, TagCommit};
    use crate::progress::CollectingReporter;
    use std::sync::Arc;
    use std::sync::Mutex;

    fn config() -> Config {
        Config::new(RepoSlug::new("acme", "widgets"), "v1.1.0")
    }

    fn release(id: u64) -> Release {
        Release {
            id,
            upload_url: format!(
                "https://uploads.github.com/repos/acme/widgets/releases/{id}/assets{{?name,label}}"
            ),
            html_url: "https://github.com/acme/widgets/releases/tag/v1.1.0".to_string(),
            tag_name: "v1.1.0".to_string(),
            name: Some("v1.1.0".to_string()),
            body: None,
            target_commitish: None,
            draft: false,
            prerelease: false,
            assets: vec![],
        }
    }

    fn server_error() -> GitHubError {
        GitHubError::Status {
            status: 502,
            message: "Bad Gateway".to_string(),
            errors: None,
        }
    }

    fn tag(name: &str, sha: &str) -> Tag {
        Tag {
            name: name.to_string(),
            commit: TagCommit {
                sha: sha.to_string(),
                url: String::new(),
            },
        }
    }

    fn commit(sha: &str, message: &str) -> Commit {
        Commit {
            sha: sha.to_string(),
            html_url: format!("https://github.com/acme/widgets/commit/{sha}"),
            commit: CommitDetail {
                message: Some(message.to_string()),
            },
            committer: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_succeeds_after_two_failures() {
        let mut mock = MockGitHubApi::new();
        mock.expect_get_release_by_tag()
            .times(3)
            .returning(|_, _| Ok(None));

        let mut calls = 0;
        mock.expect_create_release().times(3).returning(move |_, _| {
            calls += 1;
            if calls < 3 {
                Err(server_error())
            } else {
                Ok(release(42))
            }
        });

        let reporter = CollectingReporter::default();
        let created = create_release(&config(), &mock, &reporter).await.unwrap();
        assert_eq!(created.id, 42);

        let retries: Vec<_> = reporter
            .events()
            .into_iter()
            .filter_map(|e| match e {
                ProgressEvent::CreateRetrying {
                    attempt, remaining, ..
                } => Some((attempt, remaining)),
                _ => None,
            })
            .collect();
        assert_eq!(retries, vec![(1, 2), (2, 1)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_exhausts_attempt_budget() {
        let mut mock = MockGitHubApi::new();
        mock.expect_get_release_by_tag().returning(|_, _| Ok(None));
        mock.expect_create_release()
            .times(3)
            .returning(|_, _| Err(server_error()));

        let err = create_release(&config(), &mock, &CollectingReporter::default())
            .await
            .unwrap_err();

        match err {
            ReleaseError::RetriesExhausted { attempts, source } => {
                assert_eq!(attempts, 3);
                assert_eq!(source.status(), Some(502));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_draft_is_identical_across_attempts() {
        let seen: Arc<Mutex<Vec<ReleaseDraft>>> = Arc::default();
        let seen_clone = Arc::clone(&seen);

        let mut mock = MockGitHubApi::new();
        mock.expect_get_release_by_tag().returning(|_, _| Ok(None));
        mock.expect_create_release().returning(move |_, draft| {
            let mut seen = seen_clone.lock().unwrap();
            seen.push(draft.clone());
            if seen.len() < 2 {
                Err(server_error())
            } else {
                Ok(release(1))
            }
        });

        let mut config = config();
        config.body = Some("hand written".to_string());
        config.prerelease = true;
        config.target_commitish = Some("main".to_string());

        create_release(&config, &mock, &CollectingReporter::default())
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], seen[1]);
        assert_eq!(seen[0].body.as_deref(), Some("hand written"));
        assert_eq!(seen[0].target_commitish.as_deref(), Some("main"));
        assert!(seen[0].prerelease);
    }

    #[tokio::test]
    async fn test_existing_release_is_updated() {
        let mut mock = MockGitHubApi::new();
        mock.expect_get_release_by_tag()
            .withf(|_, tag| tag == "v1.1.0")
            .returning(|_, _| Ok(Some(release(7))));
        mock.expect_create_release().never();
        mock.expect_update_release()
            .withf(|_, id, _| *id == 7)
            .times(1)
            .returning(|_, _, _| Ok(release(7)));

        let reporter = CollectingReporter::default();
        let updated = create_release(&config(), &mock, &reporter).await.unwrap();
        assert_eq!(updated.id, 7);
        assert!(reporter.events().contains(&ProgressEvent::UpdatingRelease {
            tag: "v1.1.0".to_string(),
            id: 7
        }));
    }

    #[tokio::test]
    async fn test_explicit_body_skips_history() {
        let mut mock = MockGitHubApi::new();
        mock.expect_list_tags().never();
        mock.expect_list_commits().never();
        mock.expect_get_release_by_tag().returning(|_, _| Ok(None));
        mock.expect_create_release()
            .withf(|_, draft| draft.body.as_deref() == Some("explicit"))
            .times(1)
            .returning(|_, _| Ok(release(1)));

        let mut config = config();
        config.body = Some("explicit".to_string());
        config.generate_by_commit = true;

        create_release(&config, &mock, &CollectingReporter::default())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_generated_notes_become_body() {
        let mut mock = MockGitHubApi::new();
        mock.expect_list_tags()
            .returning(|_| Ok(vec![tag("v1.1.0", "A"), tag("v1.0.0", "B")]));
        mock.expect_list_commits().returning(|_, _| {
            Ok(CommitPage {
                commits: vec![
                    commit("A", "perf: faster startup"),
                    commit("B", "feat: initial"),
                ],
                has_next: false,
            })
        });
        mock.expect_get_release_by_tag().returning(|_, _| Ok(None));
        mock.expect_create_release()
            .withf(|_, draft| draft.body.as_deref() == Some("### Performance\n- faster startup"))
            .times(1)
            .returning(|_, _| Ok(release(1)));

        let mut config = config();
        config.generate_by_commit = true;

        create_release(&config, &mock, &CollectingReporter::default())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_notes_failure_stops_before_create() {
        let mut mock = MockGitHubApi::new();
        mock.expect_list_tags().returning(|_| Err(server_error()));
        mock.expect_create_release().never();

        let mut config = config();
        config.generate_by_commit = true;

        let err = create_release(&config, &mock, &CollectingReporter::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ReleaseError::NotesFailed(NotesError::ListTags(_))
        ));
    }

    #[tokio::test]
    async fn test_untagged_draft_skips_lookup() {
        let mut mock = MockGitHubApi::new();
        mock.expect_get_release_by_tag().never();
        mock.expect_create_release()
            .withf(|_, draft| draft.draft && draft.tag_name.is_empty())
            .times(1)
            .returning(|_, _| Ok(release(3)));

        let mut config = config();
        config.tag = String::new();
        config.draft = true;

        create_release(&config, &mock, &CollectingReporter::default())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_missing_tag_rejected() {
        let mock = MockGitHubApi::new();
        let mut config = config();
        config.tag = String::new();

        let err = create_release(&config, &mock, &CollectingReporter::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ReleaseError::MissingTag));
    }
}
