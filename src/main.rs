//! hoist - CLI entry point.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use hoist::config::{Config, Inputs};
use hoist::error::ConfigError;
use hoist::github::{OctocrabApi, resolve_github_token};
use hoist::outputs::{RunOutputs, write_github_outputs};
use hoist::progress::{Reporter, TracingReporter};
use hoist::release::{create_release, expand_patterns, publish_assets};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    match run(Inputs::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(inputs: Inputs) -> Result<()> {
    // Step 1: Validate inputs before touching the network
    let config = Config::from_inputs(inputs).context("Invalid configuration")?;

    // Step 2: Expand asset patterns
    let matches = expand_patterns(&config.files).context("Invalid asset pattern")?;
    if !matches.unmatched.is_empty() {
        for pattern in &matches.unmatched {
            warn!("Pattern '{}' does not match any files.", pattern);
        }
        if config.fail_on_unmatched_files {
            return Err(ConfigError::UnmatchedFiles(matches.unmatched).into());
        }
    }
    if !config.files.is_empty() && matches.files.is_empty() {
        warn!("{} does not include a valid file.", config.files.join(", "));
    }

    // Step 3: Connect
    let token = resolve_github_token(config.token.as_deref())
        .context("GitHub authentication required")?;
    let api = Arc::new(
        OctocrabApi::new(&token, config.timeout).context("Failed to build GitHub client")?,
    );
    let reporter: Arc<dyn Reporter> = Arc::new(TracingReporter);

    // Step 4: Create or update the release
    let release = create_release(&config, api.as_ref(), reporter.as_ref())
        .await
        .context("Failed to create release")?;

    // Step 5: Publish assets
    let assets = if matches.files.is_empty() {
        Vec::new()
    } else {
        publish_assets(
            Arc::clone(&api),
            &config.repo,
            &release,
            matches.files,
            Arc::clone(&reporter),
        )
        .await
        .context("Failed to publish release assets")?
    };

    // Step 6: Hand results to later workflow steps
    let outputs = RunOutputs::new(&release, assets);
    if write_github_outputs(&outputs).context("Failed to write step outputs")? {
        info!("Wrote release outputs to GITHUB_OUTPUT");
    }

    info!("Release ready at {}", release.html_url);
    Ok(())
}
