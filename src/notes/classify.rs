//! Sorting commits into note sections by rule.

use serde::{Deserialize, Serialize};

use crate::github::Commit;

use super::rules::RuleSet;

/// One bullet of release notes, derived from one commit matching one rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteItem {
    /// Permalink of the originating commit.
    pub url: String,
    pub committer: Option<String>,
    pub message: String,
}

/// A titled section of release notes. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotesGroup {
    pub title: String,
    pub list: Vec<NoteItem>,
}

/// Classify `commits` against `rules`.
///
/// Groups follow rule order, items follow commit order. A commit that matches
/// several rules appears in each of their groups; one that matches none is
/// dropped. Rules that match nothing produce no group.
pub fn classify(commits: &[Commit], rules: &RuleSet) -> Vec<NotesGroup> {
    rules
        .iter()
        .filter_map(|rule| {
            let list: Vec<NoteItem> = commits
                .iter()
                .filter(|commit| rule.is_match(commit.message()))
                .map(|commit| NoteItem {
                    url: commit.html_url.clone(),
                    committer: commit.committer_login().map(str::to_string),
                    message: rule.note_text(commit.message()),
                })
                .collect();

            (!list.is_empty()).then(|| NotesGroup {
                title: rule.title.clone(),
                list,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::models::{CommitDetail, UserRef};
    use crate::notes::rules::ClassificationRule;

    fn commit(sha: &str, message: &str, login: Option<&str>) -> Commit {
        Commit {
            sha: sha.to_string(),
            html_url: format!("https://github.com/acme/widgets/commit/{sha}"),
            commit: CommitDetail {
                message: Some(message.to_string()),
            },
            committer: login.map(|l| UserRef {
                login: l.to_string(),
            }),
        }
    }

    #[test]
    fn test_feat_commit_becomes_note() {
        let commits = vec![commit("a1", "feat: add login", Some("octocat"))];
        let groups = classify(&commits, &RuleSet::defaults());

        assert_eq!(
            groups,
            vec![NotesGroup {
                title: "Features".to_string(),
                list: vec![NoteItem {
                    url: "https://github.com/acme/widgets/commit/a1".to_string(),
                    committer: Some("octocat".to_string()),
                    message: "add login".to_string(),
                }],
            }]
        );
    }

    #[test]
    fn test_unmatched_commit_is_dropped() {
        let commits = vec![commit("a1", "chore: bump deps", None)];
        assert!(classify(&commits, &RuleSet::defaults()).is_empty());
    }

    #[test]
    fn test_commit_matching_two_rules_lands_in_both_groups() {
        let rules = RuleSet::compile(vec![
            ClassificationRule::new("Features", "feat:"),
            ClassificationRule::new("UI", "ui"),
        ])
        .unwrap();
        let commits = vec![commit("a1", "feat: new ui theme", None)];

        let groups = classify(&commits, &rules);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].title, "Features");
        assert_eq!(groups[0].list[0].message, "new ui theme");
        assert_eq!(groups[1].title, "UI");
        assert_eq!(groups[1].list[0].message, "theme");
    }

    #[test]
    fn test_group_order_follows_rules_not_commits() {
        let commits = vec![
            commit("a1", "fix: crash on start", None),
            commit("a2", "feat: dark mode", None),
            commit("a3", "fix: typo", None),
        ];

        let groups = classify(&commits, &RuleSet::defaults());

        let titles: Vec<&str> = groups.iter().map(|g| g.title.as_str()).collect();
        assert_eq!(titles, vec!["Features", "Bug Fixes"]);
        let fixes: Vec<&str> = groups[1].list.iter().map(|i| i.message.as_str()).collect();
        assert_eq!(fixes, vec!["crash on start", "typo"]);
    }

    #[test]
    fn test_missing_message_never_matches() {
        let mut c = commit("a1", "", None);
        c.commit.message = None;
        assert!(classify(&[c], &RuleSet::defaults()).is_empty());
    }
}
