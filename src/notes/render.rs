//! Markdown rendering of classified notes.

use std::sync::LazyLock;

use regex_lite::{Captures, Regex};

use crate::github::RepoSlug;

use super::classify::NotesGroup;

/// `#123` not glued to a preceding word character (`C#42`) or entity (`&#42;`),
/// and not followed by more word characters (`#4a2`).
static ISSUE_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|[^\w&])#(\d+)\b").expect("Invalid regex"));

/// Render groups as Markdown: a `###` heading per group, one bullet per item.
///
/// Returns `None` when there is nothing to render, so callers can tell "no
/// notes" apart from an empty body.
pub fn render_markdown(groups: &[NotesGroup], repo: &RepoSlug) -> Option<String> {
    let mut lines = Vec::new();

    for group in groups.iter().filter(|g| !g.list.is_empty()) {
        lines.push(format!("### {}", group.title));
        for item in &group.list {
            let message = link_issues(&item.message, repo);
            match &item.committer {
                Some(login) => lines.push(format!("- {}  @{}", message, login)),
                None => lines.push(format!("- {}", message)),
            }
        }
    }

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

/// Rewrite `#<digits>` references into links to the repository's issues.
pub fn link_issues(message: &str, repo: &RepoSlug) -> String {
    ISSUE_REF
        .replace_all(message, |caps: &Captures| {
            format!("{}[#{}]({})", &caps[1], &caps[2], repo.issue_url(&caps[2]))
        })
        .into_owned()
}
