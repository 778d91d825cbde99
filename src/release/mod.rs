//! Publishing: create or update the release, then attach its assets.

pub mod assets;
pub mod create;
pub mod retry;

pub use assets::{PatternMatches, expand_patterns, publish_assets, upload_asset};
pub use create::create_release;
pub use retry::{RetryPolicy, retry_with_backoff};
