//! Release notes derived from the commits between the two newest tags.

pub mod classify;
pub mod range;
pub mod render;
pub mod rules;

pub use classify::{NoteItem, NotesGroup, classify};
pub use range::{Boundary, RangeOptions, ResolvedRange, resolve_range};
pub use render::{link_issues, render_markdown};
pub use rules::{ClassificationRule, RuleSet, default_rules};

use crate::error::NotesError;
use crate::github::{GitHubApi, RepoSlug};
use crate::progress::{ProgressEvent, Reporter};

/// Build a Markdown release body from commit history.
///
/// Returns `Ok(None)` when there are fewer than two tags or no commit in the
/// range matches any rule.
pub async fn generate_release_notes<A: GitHubApi + ?Sized>(
    api: &A,
    repo: &RepoSlug,
    rules: &RuleSet,
    options: &RangeOptions,
    reporter: &dyn Reporter,
) -> Result<Option<String>, NotesError> {
    let tags = api.list_tags(repo).await.map_err(NotesError::ListTags)?;
    let range = resolve_range(api, repo, &tags, options, reporter).await?;

    if range.commits.is_empty() {
        return Ok(None);
    }

    let groups = classify(&range.commits, rules);
    reporter.report(&ProgressEvent::Classified {
        commits: range.commits.len(),
        groups: groups.len(),
    });

    Ok(render_markdown(&groups, repo))
}
