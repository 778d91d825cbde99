//! hoist - Create GitHub releases, upload their assets, and derive release
//! notes from commit history.
//!
//! # Overview
//!
//! hoist resolves the commits between the two newest tags, sorts them into
//! note sections by configurable rules, and renders Markdown. It then creates
//! (or updates) the release for a tag with bounded retry and publishes local
//! files as release assets, replacing same-named assets.

pub mod config;
pub mod error;
pub mod github;
pub mod notes;
pub mod outputs;
pub mod progress;
pub mod release;

// Re-export commonly used types
pub use config::{Config, Inputs};
pub use error::{AssetError, ConfigError, GitHubError, NotesError, OutputError, ReleaseError};
pub use github::{GitHubApi, OctocrabApi, Release, RepoSlug};
pub use notes::{ClassificationRule, NotesGroup, RuleSet, generate_release_notes};
pub use progress::{ProgressEvent, Reporter, TracingReporter};
pub use release::{RetryPolicy, create_release, publish_assets};
