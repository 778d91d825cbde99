//! Progress reporting for the release pipeline.
//!
//! The pipeline never prints. It emits [`ProgressEvent`]s to a [`Reporter`]
//! supplied by the caller; the binary uses [`TracingReporter`].

use std::sync::Mutex;

/// Events emitted while a release is being prepared and published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Fewer than two tags exist, so there is no range to describe.
    NotEnoughTags { found: usize },
    /// Commit history is being read from `git_ref` (default branch if `None`).
    FetchingHistory { git_ref: Option<String> },
    /// A page of history was scanned.
    PageScanned { page: u32, commits: usize },
    /// The previous tag was not seen; the range runs to the end of what was read.
    BoundaryNotFound { pages: u32, limit_reached: bool },
    /// Commits were classified into note sections.
    Classified { commits: usize, groups: usize },
    /// A release is about to be created (or updated) for `tag`.
    CreatingRelease {
        tag: String,
        target_commitish: Option<String>,
    },
    /// An existing release for the tag was found and will be updated.
    UpdatingRelease { tag: String, id: u64 },
    /// A create attempt failed and will be retried.
    CreateRetrying {
        attempt: u32,
        remaining: u32,
        error: String,
    },
    /// A previously uploaded asset with the same name is being removed.
    DeletingAsset { name: String },
    /// An asset upload is starting.
    UploadingAsset { name: String, size: u64 },
}

/// Receives progress events.
pub trait Reporter: Send + Sync {
    fn report(&self, event: &ProgressEvent);
}

/// Reporter that logs to tracing.
#[derive(Debug, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::NotEnoughTags { found } => {
                tracing::info!("Found {} tag(s); need two to derive release notes", found);
            }
            ProgressEvent::FetchingHistory { git_ref } => {
                tracing::info!(
                    "Pulling commit history of {}...",
                    git_ref.as_deref().unwrap_or("the default branch")
                );
            }
            ProgressEvent::PageScanned { page, commits } => {
                tracing::debug!("Scanned commit page {} ({} commits)", page, commits);
            }
            ProgressEvent::BoundaryNotFound {
                pages,
                limit_reached,
            } => {
                if *limit_reached {
                    tracing::warn!(
                        "Previous tag not found within {} pages of history; notes cover everything read",
                        pages
                    );
                } else {
                    tracing::warn!(
                        "Previous tag not found before history ended ({} pages); notes cover the whole history",
                        pages
                    );
                }
            }
            ProgressEvent::Classified { commits, groups } => {
                tracing::info!("Classified {} commits into {} section(s)", commits, groups);
            }
            ProgressEvent::CreatingRelease {
                tag,
                target_commitish,
            } => match target_commitish {
                Some(target) => tracing::info!(
                    "Creating new GitHub release for tag {} using commit \"{}\"...",
                    tag,
                    target
                ),
                None => tracing::info!("Creating new GitHub release for tag {}...", tag),
            },
            ProgressEvent::UpdatingRelease { tag, id } => {
                tracing::info!("Updating existing GitHub release {} for tag {}...", id, tag);
            }
            ProgressEvent::CreateRetrying {
                attempt,
                remaining,
                error,
            } => {
                tracing::warn!(
                    "GitHub release attempt {} failed: {}. Retrying... ({} retries remaining)",
                    attempt,
                    error,
                    remaining
                );
            }
            ProgressEvent::DeletingAsset { name } => {
                tracing::info!("Deleting previously uploaded asset {}...", name);
            }
            ProgressEvent::UploadingAsset { name, size } => {
                tracing::info!("Uploading {} ({} bytes)...", name, size);
            }
        }
    }
}

/// Reporter that collects events for later inspection.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    events: Mutex<Vec<ProgressEvent>>,
}

impl CollectingReporter {
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl Reporter for CollectingReporter {
    fn report(&self, event: &ProgressEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
