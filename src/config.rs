//! Run configuration.
//!
//! Every input is a CLI flag and an environment variable named after the
//! GitHub Action input (`INPUT_*`), so the binary runs unchanged as an action
//! step or from a terminal. [`Inputs`] is the raw form; [`Config`] is the
//! validated, immutable record the pipeline reads.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use clap::builder::FalseyValueParser;

use crate::error::ConfigError;
use crate::github::RepoSlug;
use crate::notes::RuleSet;
use crate::notes::range::{DEFAULT_MAX_PAGES, DEFAULT_PER_PAGE, RangeOptions};
use crate::release::retry::{DEFAULT_MAX_ATTEMPTS, RetryPolicy};

const TAG_REF_PREFIX: &str = "refs/tags/";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Create a GitHub release, upload assets, and derive notes from commits.
#[derive(Parser, Debug, Clone)]
#[command(name = "hoist")]
#[command(about = "Create a GitHub release, upload assets, and derive notes from commits")]
#[command(version)]
pub struct Inputs {
    /// GitHub token (falls back to GITHUB_TOKEN, GH_TOKEN, then `gh auth token`)
    #[arg(long, env = "INPUT_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Repository as owner/repo (defaults to GITHUB_REPOSITORY)
    #[arg(long, env = "INPUT_REPOSITORY")]
    pub repository: Option<String>,

    #[arg(long, env = "GITHUB_REPOSITORY", hide = true)]
    pub github_repository: Option<String>,

    /// Git ref of the triggering event; a refs/tags/* ref supplies the tag
    #[arg(long, env = "GITHUB_REF", default_value = "")]
    pub github_ref: String,

    /// Tag to release (defaults to the tag in GITHUB_REF)
    #[arg(long, env = "INPUT_TAG_NAME")]
    pub tag_name: Option<String>,

    /// Release name (defaults to the tag)
    #[arg(long, env = "INPUT_NAME")]
    pub name: Option<String>,

    /// Release body text
    #[arg(long, env = "INPUT_BODY")]
    pub body: Option<String>,

    /// File whose contents become the release body (wins over --body)
    #[arg(long, env = "INPUT_BODY_PATH")]
    pub body_path: Option<PathBuf>,

    /// Asset file patterns, separated by newlines or commas
    #[arg(long, env = "INPUT_FILES", default_value = "")]
    pub files: String,

    /// Create the release as a draft
    #[arg(long, env = "INPUT_DRAFT", value_parser = FalseyValueParser::new())]
    pub draft: bool,

    /// Mark the release as a prerelease
    #[arg(long, env = "INPUT_PRERELEASE", value_parser = FalseyValueParser::new())]
    pub prerelease: bool,

    /// Commitish the tag is created from, when the tag doesn't exist yet
    #[arg(long, env = "INPUT_TARGET_COMMITISH")]
    pub target_commitish: Option<String>,

    /// Ask GitHub to generate its own release notes
    #[arg(long, env = "INPUT_GENERATE_RELEASE_NOTES", value_parser = FalseyValueParser::new())]
    pub generate_release_notes: bool,

    /// Derive the body from commits between the two newest tags
    #[arg(long, env = "INPUT_GENERATE_BY_COMMIT", value_parser = FalseyValueParser::new())]
    pub generate_by_commit: bool,

    /// Branch or ref to read commit history from (default branch if unset)
    #[arg(long, env = "INPUT_BRANCH")]
    pub branch: Option<String>,

    /// JSON array of {"title", "rule"} objects; rules are regular expressions
    #[arg(long, env = "INPUT_COMMIT_RULES", default_value = "")]
    pub commit_rules: String,

    /// Commits fetched per history page
    #[arg(
        long,
        env = "INPUT_PER_PAGE",
        default_value_t = DEFAULT_PER_PAGE,
        value_parser = clap::value_parser!(u8).range(1..=100)
    )]
    pub per_page: u8,

    /// Pages of history to read before giving up on the previous tag
    #[arg(long, env = "INPUT_MAX_PAGES", default_value_t = DEFAULT_MAX_PAGES)]
    pub max_pages: u32,

    /// Attempts at creating the release
    #[arg(long, env = "INPUT_MAX_RETRIES", default_value_t = DEFAULT_MAX_ATTEMPTS)]
    pub max_retries: u32,

    /// Timeout for each GitHub request, in seconds
    #[arg(long, env = "INPUT_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Fail when a file pattern matches nothing
    #[arg(
        long,
        env = "INPUT_FAIL_ON_UNMATCHED_FILES",
        action = clap::ArgAction::Set,
        default_value_t = true,
        value_parser = FalseyValueParser::new()
    )]
    pub fail_on_unmatched_files: bool,
}

/// Resolved settings for one run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Explicit token, if one was given; see [`crate::github::resolve_github_token`].
    pub token: Option<String>,
    pub repo: RepoSlug,
    /// Tag to release. Empty only for drafts.
    pub tag: String,
    pub name: String,
    /// Explicit body (from text or file). Wins over generated notes.
    pub body: Option<String>,
    pub files: Vec<String>,
    pub draft: bool,
    pub prerelease: bool,
    pub target_commitish: Option<String>,
    pub generate_release_notes: bool,
    pub generate_by_commit: bool,
    pub rules: RuleSet,
    pub range: RangeOptions,
    pub retry: RetryPolicy,
    pub timeout: Duration,
    pub fail_on_unmatched_files: bool,
}

impl Config {
    /// A config for releasing `tag` with every option at its default.
    pub fn new(repo: RepoSlug, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        Self {
            token: None,
            repo,
            name: tag.clone(),
            tag,
            body: None,
            files: Vec::new(),
            draft: false,
            prerelease: false,
            target_commitish: None,
            generate_release_notes: false,
            generate_by_commit: false,
            rules: RuleSet::defaults(),
            range: RangeOptions::default(),
            retry: RetryPolicy::default(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            fail_on_unmatched_files: true,
        }
    }

    /// Validate raw inputs. Rule patterns are compiled here so that a bad
    /// pattern fails before any request is made.
    pub fn from_inputs(inputs: Inputs) -> Result<Self, ConfigError> {
        let repository = non_empty(inputs.repository)
            .or_else(|| non_empty(inputs.github_repository))
            .ok_or(ConfigError::MissingRepository)?;
        let repo = RepoSlug::parse(&repository)?;

        let tag = non_empty(inputs.tag_name.map(|t| t.trim().to_string()))
            .or_else(|| tag_from_ref(&inputs.github_ref).map(str::to_string))
            .unwrap_or_default();
        if tag.is_empty() && !inputs.draft {
            return Err(ConfigError::MissingTag);
        }

        if inputs.max_pages == 0 {
            return Err(ConfigError::ZeroLimit("max pages"));
        }
        if inputs.max_retries == 0 {
            return Err(ConfigError::ZeroLimit("max retries"));
        }
        if inputs.timeout_secs == 0 {
            return Err(ConfigError::ZeroLimit("timeout"));
        }

        let body = release_body(inputs.body_path.as_deref(), inputs.body)?;
        let rules = RuleSet::from_json(&inputs.commit_rules)?;

        Ok(Self {
            token: non_empty(inputs.token),
            name: non_empty(inputs.name).unwrap_or_else(|| tag.clone()),
            repo,
            tag,
            body,
            files: parse_input_files(&inputs.files),
            draft: inputs.draft,
            prerelease: inputs.prerelease,
            target_commitish: non_empty(inputs.target_commitish),
            generate_release_notes: inputs.generate_release_notes,
            generate_by_commit: inputs.generate_by_commit,
            rules,
            range: RangeOptions {
                git_ref: non_empty(inputs.branch),
                per_page: inputs.per_page,
                max_pages: inputs.max_pages,
            },
            retry: RetryPolicy::with_attempts(inputs.max_retries),
            timeout: Duration::from_secs(inputs.timeout_secs),
            fail_on_unmatched_files: inputs.fail_on_unmatched_files,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Split a file-pattern list on newlines and commas, dropping blanks.
pub fn parse_input_files(files: &str) -> Vec<String> {
    files
        .lines()
        .flat_map(|line| line.split(','))
        .map(str::trim)
        .filter(|pattern| !pattern.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn is_tag(git_ref: &str) -> bool {
    git_ref.starts_with(TAG_REF_PREFIX)
}

/// The tag name of a `refs/tags/*` ref.
pub fn tag_from_ref(git_ref: &str) -> Option<&str> {
    git_ref
        .strip_prefix(TAG_REF_PREFIX)
        .filter(|tag| !tag.is_empty())
}

/// The explicit release body: the body file when it has content, else `body`.
fn release_body(
    body_path: Option<&Path>,
    body: Option<String>,
) -> Result<Option<String>, ConfigError> {
    if let Some(path) = body_path.filter(|p| !p.as_os_str().is_empty()) {
        let content =
            std::fs::read_to_string(path).map_err(|source| ConfigError::BodyFileUnreadable {
                path: path.to_path_buf(),
                source,
            })?;
        if !content.is_empty() {
            return Ok(Some(content));
        }
    }
    Ok(body.filter(|b| !b.is_empty()))
}
