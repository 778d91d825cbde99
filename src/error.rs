//! Error types for hoist modules using thiserror.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from resolving inputs into a [`Config`](crate::config::Config).
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("No repository given. Set INPUT_REPOSITORY or GITHUB_REPOSITORY (owner/repo)")]
    MissingRepository,

    #[error("Invalid repository '{0}': expected owner/repo")]
    InvalidRepository(String),

    #[error("GitHub Releases requires a tag. Set INPUT_TAG_NAME or run on a refs/tags/* ref")]
    MissingTag,

    #[error("Failed to parse commit rules: {0}")]
    InvalidRuleList(#[source] serde_json::Error),

    #[error("Commit rule #{index} ('{title}') has an invalid pattern '{rule}': {source}")]
    InvalidRulePattern {
        index: usize,
        title: String,
        rule: String,
        #[source]
        source: regex_lite::Error,
    },

    #[error("Commit rule #{index} has an empty pattern")]
    EmptyRulePattern { index: usize },

    #[error("Failed to read release body from {path}: {source}")]
    BodyFileUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid file pattern '{pattern}': {source}")]
    InvalidFilePattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("There were unmatched files: {}", .0.join(", "))]
    UnmatchedFiles(Vec<String>),

    #[error("{0} must be greater than zero")]
    ZeroLimit(&'static str),
}

/// Errors from GitHub API operations.
#[derive(Error, Debug)]
pub enum GitHubError {
    #[error(
        "GitHub authentication failed: no valid auth found. Set INPUT_TOKEN or GITHUB_TOKEN, or run 'gh auth login'"
    )]
    AuthenticationFailed,

    #[error("GitHub API request failed: {0}")]
    Api(#[source] Box<octocrab::Error>),

    #[error("HTTP request failed: {0}")]
    Http(#[source] reqwest::Error),

    #[error("GitHub returned status {status}: {message}")]
    Status {
        status: u16,
        message: String,
        errors: Option<serde_json::Value>,
    },

    #[error("GitHub request '{operation}' timed out after {seconds}s")]
    Timeout { operation: &'static str, seconds: u64 },

    #[error("Unexpected response from GitHub: {0}")]
    InvalidResponse(String),
}

impl From<octocrab::Error> for GitHubError {
    fn from(err: octocrab::Error) -> Self {
        match err {
            octocrab::Error::GitHub { source, .. } => GitHubError::Status {
                status: source.status_code.as_u16(),
                message: source.message,
                errors: source.errors.map(serde_json::Value::Array),
            },
            other => GitHubError::Api(Box::new(other)),
        }
    }
}

impl GitHubError {
    /// HTTP status of a failed API call, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            GitHubError::Status { status, .. } => Some(*status),
            GitHubError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether this is a 404 from the API.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Whether the request quota was exhausted (primary rate limit).
    pub fn is_rate_limited(&self) -> bool {
        match self {
            GitHubError::Status {
                status: 429, ..
            } => !self.is_abuse_limited(),
            GitHubError::Status {
                status: 403,
                message,
                ..
            } => message.to_lowercase().contains("rate limit") && !self.is_abuse_limited(),
            _ => false,
        }
    }

    /// Whether GitHub flagged the request under its secondary (abuse) limits.
    pub fn is_abuse_limited(&self) -> bool {
        match self {
            GitHubError::Status {
                status: 403 | 429,
                message,
                ..
            } => {
                let message = message.to_lowercase();
                message.contains("secondary rate limit") || message.contains("abuse")
            }
            _ => false,
        }
    }
}

/// Errors from deriving release notes out of commit history.
#[derive(Error, Debug)]
pub enum NotesError {
    #[error("Failed to list tags: {0}")]
    ListTags(#[source] GitHubError),

    #[error("Failed to list commits (page {page}): {source}")]
    ListCommits {
        page: u32,
        #[source]
        source: GitHubError,
    },
}

/// Errors from creating or updating a release.
#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("GitHub Releases requires a tag")]
    MissingTag,

    #[error("Failed to generate release notes: {0}")]
    NotesFailed(#[source] NotesError),

    #[error("Release creation failed after {attempts} attempt(s): {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: GitHubError,
    },
}

/// Errors from publishing release assets.
#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Failed to read asset {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Asset path {0} has no file name")]
    NoFileName(PathBuf),

    #[error("Failed to delete previously uploaded asset {name}: {source}")]
    DeleteFailed {
        name: String,
        #[source]
        source: GitHubError,
    },

    #[error(
        "Failed to upload release asset {name}. received status code {status}\n{message}\n{}",
        .errors.as_ref().map(|e| e.to_string()).unwrap_or_default()
    )]
    UploadRejected {
        name: String,
        status: u16,
        message: String,
        errors: Option<serde_json::Value>,
    },

    #[error("Failed to upload release asset {name}: {source}")]
    UploadFailed {
        name: String,
        #[source]
        source: GitHubError,
    },

    #[error("Upload task for {name} did not complete: {message}")]
    TaskFailed { name: String, message: String },
}

/// Errors from writing run outputs.
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write outputs to {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize output '{key}': {source}")]
    Serialize {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
