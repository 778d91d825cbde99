//! Run outputs for the GitHub Actions step that invoked hoist.
//!
//! Outputs are appended to the file named by `GITHUB_OUTPUT` using the
//! `key=value` form, or a heredoc block for values spanning several lines.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use crate::error::OutputError;
use crate::github::Release;

const OUTPUT_ENV: &str = "GITHUB_OUTPUT";
const DELIMITER: &str = "HOIST_OUTPUT_EOF";

/// What a finished run hands to later workflow steps.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutputs {
    pub url: String,
    pub id: u64,
    pub upload_url: String,
    /// Uploaded asset records, `uploader` already removed.
    pub assets: Vec<serde_json::Value>,
}

impl RunOutputs {
    pub fn new(release: &Release, assets: Vec<serde_json::Value>) -> Self {
        Self {
            url: release.html_url.clone(),
            id: release.id,
            upload_url: release.upload_url.clone(),
            assets,
        }
    }

    /// Output pairs in the order they are written.
    pub fn entries(&self) -> Result<Vec<(&'static str, String)>, OutputError> {
        let assets = serde_json::to_string(&self.assets).map_err(|source| {
            OutputError::Serialize {
                key: "assets",
                source,
            }
        })?;

        Ok(vec![
            ("url", self.url.clone()),
            ("id", self.id.to_string()),
            ("upload_url", self.upload_url.clone()),
            ("assets", assets),
        ])
    }
}

/// Format one output entry.
pub fn format_output(key: &str, value: &str) -> String {
    if !value.contains('\n') && !value.contains('\r') {
        return format!("{key}={value}\n");
    }

    let mut delimiter = DELIMITER.to_string();
    while value.contains(&delimiter) {
        delimiter.push('_');
    }
    format!("{key}<<{delimiter}\n{value}\n{delimiter}\n")
}

/// Append `outputs` to the file at `path`.
pub fn write_outputs(path: &Path, outputs: &RunOutputs) -> Result<(), OutputError> {
    let write_failed = |source| OutputError::WriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let mut content = String::new();
    for (key, value) in outputs.entries()? {
        content.push_str(&format_output(key, &value));
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(write_failed)?;
    file.write_all(content.as_bytes()).map_err(write_failed)
}

/// Write `outputs` to `GITHUB_OUTPUT` when it is set.
///
/// Returns whether anything was written.
pub fn write_github_outputs(outputs: &RunOutputs) -> Result<bool, OutputError> {
    match std::env::var_os(OUTPUT_ENV).filter(|p| !p.is_empty()) {
        Some(path) => {
            write_outputs(Path::new(&path), outputs)?;
            Ok(true)
        }
        None => Ok(false),
    }
}
