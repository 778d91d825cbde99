//! Asset publishing: replace-then-upload for each local file.
//!
//! An asset name is unique within a release. A file whose name is already
//! attached has the old asset deleted before the new bytes are uploaded.
//! Files are independent, so uploads fan out concurrently; the first failure
//! aborts the uploads still in flight and is returned.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::debug;

use crate::error::{AssetError, ConfigError, GitHubError};
use crate::github::models::AssetRef;
use crate::github::{GitHubApi, Release, ReleaseAsset, RepoSlug};
use crate::progress::{ProgressEvent, Reporter};

/// Result of expanding asset patterns against the local filesystem.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternMatches {
    /// Matched regular files, in pattern order, each listed once.
    pub files: Vec<PathBuf>,
    /// Patterns that matched no regular file.
    pub unmatched: Vec<String>,
}

/// Expand glob `patterns` to regular files.
pub fn expand_patterns(patterns: &[String]) -> Result<PatternMatches, ConfigError> {
    let mut seen = HashSet::new();
    let mut matches = PatternMatches::default();

    for pattern in patterns {
        let paths = glob::glob(pattern).map_err(|source| ConfigError::InvalidFilePattern {
            pattern: pattern.clone(),
            source,
        })?;

        let files: Vec<PathBuf> = paths
            .filter_map(Result::ok)
            .filter(|path| path.is_file())
            .collect();

        if files.is_empty() {
            matches.unmatched.push(pattern.clone());
        }
        for file in files {
            if seen.insert(file.clone()) {
                matches.files.push(file);
            }
        }
    }

    Ok(matches)
}

/// Content type for `path`, inferred from its extension.
/// Unknown extensions upload as `application/octet-stream`.
pub fn mime_or_default(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Read `path` into an uploadable asset.
pub async fn read_asset(path: &Path) -> Result<ReleaseAsset, AssetError> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| AssetError::NoFileName(path.to_path_buf()))?
        .to_string();

    let read_failed = |source| AssetError::ReadFailed {
        path: path.to_path_buf(),
        source,
    };
    let size = tokio::fs::metadata(path).await.map_err(read_failed)?.len();
    let data = tokio::fs::read(path).await.map_err(read_failed)?;

    Ok(ReleaseAsset {
        name,
        mime: mime_or_default(path),
        size,
        data,
    })
}

/// Publish one file: delete a same-named asset if present, then upload.
///
/// Returns the created asset record with the `uploader` field removed.
pub async fn upload_asset<A: GitHubApi + ?Sized>(
    api: &A,
    repo: &RepoSlug,
    upload_url: &str,
    path: &Path,
    current_assets: &[AssetRef],
    reporter: &dyn Reporter,
) -> Result<serde_json::Value, AssetError> {
    let asset = read_asset(path).await?;

    if let Some(existing) = current_assets.iter().find(|a| a.name == asset.name) {
        reporter.report(&ProgressEvent::DeletingAsset {
            name: asset.name.clone(),
        });
        api.delete_release_asset(repo, existing.id)
            .await
            .map_err(|source| AssetError::DeleteFailed {
                name: asset.name.clone(),
                source,
            })?;
    }

    reporter.report(&ProgressEvent::UploadingAsset {
        name: asset.name.clone(),
        size: asset.size,
    });

    let mut record = api
        .upload_release_asset(upload_url, &asset)
        .await
        .map_err(|e| match e {
            GitHubError::Status {
                status,
                message,
                errors,
            } => AssetError::UploadRejected {
                name: asset.name.clone(),
                status,
                message,
                errors,
            },
            source => AssetError::UploadFailed {
                name: asset.name.clone(),
                source,
            },
        })?;

    if let Some(fields) = record.as_object_mut() {
        fields.remove("uploader");
    }
    debug!("Uploaded {}", asset.name);

    Ok(record)
}

/// Upload every file in `paths` to `release`, concurrently.
///
/// Records come back in the order of `paths`. On the first failure, uploads
/// still running are aborted and that failure is returned; the release itself
/// is left in place.
pub async fn publish_assets<A>(
    api: Arc<A>,
    repo: &RepoSlug,
    release: &Release,
    paths: Vec<PathBuf>,
    reporter: Arc<dyn Reporter>,
) -> Result<Vec<serde_json::Value>, AssetError>
where
    A: GitHubApi + ?Sized + 'static,
{
    let current_assets = Arc::new(release.assets.clone());
    let mut uploads = JoinSet::new();
    let mut names = Vec::with_capacity(paths.len());

    for (index, path) in paths.into_iter().enumerate() {
        names.push(path.display().to_string());

        let api = Arc::clone(&api);
        let repo = repo.clone();
        let upload_url = release.upload_url.clone();
        let current_assets = Arc::clone(&current_assets);
        let reporter = Arc::clone(&reporter);

        uploads.spawn(async move {
            let record = upload_asset(
                &*api,
                &repo,
                &upload_url,
                &path,
                &current_assets,
                &*reporter,
            )
            .await?;
            Ok::<_, AssetError>((index, record))
        });
    }

    let mut records = Vec::with_capacity(names.len());
    while let Some(joined) = uploads.join_next().await {
        match joined {
            Ok(Ok(record)) => records.push(record),
            Ok(Err(e)) => {
                uploads.abort_all();
                return Err(e);
            }
            Err(join_error) => {
                uploads.abort_all();
                return Err(AssetError::TaskFailed {
                    name: names.join(", "),
                    message: join_error.to_string(),
                });
            }
        }
    }

    records.sort_by_key(|(index, _)| *index);
    Ok(records.into_iter().map(|(_, record)| record).collect())
}
