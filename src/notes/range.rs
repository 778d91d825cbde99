//! Commit range resolution over paginated history.
//!
//! History is read newest first, one page at a time. The newest tag's commit
//! opens the range (and belongs to it); the previous tag's commit closes it
//! (and does not). Scanning state is carried across pages explicitly, so a range
//! that straddles a page boundary resolves the same as one that doesn't.

use crate::error::NotesError;
use crate::github::{Commit, CommitQuery, GitHubApi, RepoSlug, Tag};
use crate::progress::{ProgressEvent, Reporter};

/// Default commits per page.
pub const DEFAULT_PER_PAGE: u8 = 50;

/// Default ceiling on pages read before giving up on the closing tag.
pub const DEFAULT_MAX_PAGES: u32 = 300;

/// Where and how far to read history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeOptions {
    /// Branch or ref to read from; the default branch when `None`.
    pub git_ref: Option<String>,
    pub per_page: u8,
    pub max_pages: u32,
}

impl Default for RangeOptions {
    fn default() -> Self {
        Self {
            git_ref: None,
            per_page: DEFAULT_PER_PAGE,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

/// How the scan ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// Fewer than two tags exist; nothing was read.
    NotEnoughTags,
    /// The closing tag was reached.
    Found,
    /// History ran out before the closing tag was seen.
    HistoryExhausted,
    /// `max_pages` pages were read without seeing the closing tag.
    PageLimitReached,
}

impl Boundary {
    /// True when the walk stopped without observing the closing tag.
    pub fn is_unbounded(self) -> bool {
        matches!(self, Boundary::HistoryExhausted | Boundary::PageLimitReached)
    }
}

/// Commits of the newest release, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRange {
    pub commits: Vec<Commit>,
    pub boundary: Boundary,
    pub pages_read: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    BeforeStart,
    InRange,
    Done,
}

/// Incremental scanner fed one page at a time.
///
/// Only the two newest tags matter: `start` opens the range, `end` closes it.
/// Other tagged commits are ordinary history.
struct RangeScanner<'a> {
    start: &'a str,
    end: &'a str,
    state: ScanState,
    commits: Vec<Commit>,
}

impl<'a> RangeScanner<'a> {
    fn new(newest: &'a Tag, previous: &'a Tag) -> Self {
        Self {
            start: newest.commit.sha.as_str(),
            end: previous.commit.sha.as_str(),
            state: ScanState::BeforeStart,
            commits: Vec::new(),
        }
    }

    fn scan(&mut self, page: Vec<Commit>) -> ScanState {
        for commit in page {
            self.state = match self.state {
                ScanState::BeforeStart if commit.sha == self.start => {
                    self.commits.push(commit);
                    // Both tags on one commit: nothing lies between them.
                    if self.start == self.end {
                        ScanState::Done
                    } else {
                        ScanState::InRange
                    }
                }
                ScanState::BeforeStart => ScanState::BeforeStart,
                ScanState::InRange if commit.sha == self.end => ScanState::Done,
                ScanState::InRange => {
                    self.commits.push(commit);
                    ScanState::InRange
                }
                ScanState::Done => ScanState::Done,
            };
            if self.state == ScanState::Done {
                break;
            }
        }
        self.state
    }
}

/// Resolve the commits between the two most recent tags.
///
/// `tags` must be newest first. With fewer than two tags the result is empty
/// and nothing is fetched.
pub async fn resolve_range<A: GitHubApi + ?Sized>(
    api: &A,
    repo: &RepoSlug,
    tags: &[Tag],
    options: &RangeOptions,
    reporter: &dyn Reporter,
) -> Result<ResolvedRange, NotesError> {
    let [newest, previous, ..] = tags else {
        reporter.report(&ProgressEvent::NotEnoughTags { found: tags.len() });
        return Ok(ResolvedRange {
            commits: Vec::new(),
            boundary: Boundary::NotEnoughTags,
            pages_read: 0,
        });
    };

    reporter.report(&ProgressEvent::FetchingHistory {
        git_ref: options.git_ref.clone(),
    });

    let mut scanner = RangeScanner::new(newest, previous);
    let mut page = 1u32;

    let boundary = loop {
        let query = CommitQuery {
            sha: options.git_ref.clone(),
            per_page: options.per_page,
            page,
        };
        let result = api
            .list_commits(repo, &query)
            .await
            .map_err(|source| NotesError::ListCommits { page, source })?;

        let fetched = result.commits.len();
        reporter.report(&ProgressEvent::PageScanned {
            page,
            commits: fetched,
        });

        if scanner.scan(result.commits) == ScanState::Done {
            break Boundary::Found;
        }
        if fetched < usize::from(options.per_page) || !result.has_next {
            break Boundary::HistoryExhausted;
        }
        if page >= options.max_pages {
            break Boundary::PageLimitReached;
        }
        page += 1;
    };

    if boundary.is_unbounded() {
        reporter.report(&ProgressEvent::BoundaryNotFound {
            pages: page,
            limit_reached: boundary == Boundary::PageLimitReached,
        });
    }

    Ok(ResolvedRange {
        commits: scanner.commits,
        boundary,
        pages_read: page,
    })
}
