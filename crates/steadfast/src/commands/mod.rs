//! Command implementations

pub mod config;
pub mod fetch;
pub mod schedule;

use anyhow::{Context, Result};
use camino::Utf8Path;
use steadfast_core::types::{RetryPoliciesConfig, RetryPolicy};
use steadfast_core::RetryConfigLoader;

use crate::cli::PolicyArgs;

/// Load retry configuration from an explicit file or the standard location
pub fn load_config(config_path: Option<&Utf8Path>) -> Result<RetryPoliciesConfig> {
    let loader = match config_path {
        Some(path) => RetryConfigLoader::with_file(path.to_path_buf()),
        None => RetryConfigLoader::new().context("Failed to locate retry configuration")?,
    };

    loader
        .load()
        .with_context(|| format!("Failed to load {}", loader.config_path()))
}

/// Resolve the policy for a command: configured operation policy, then flags
pub fn resolve_policy(config_path: Option<&Utf8Path>, args: &PolicyArgs) -> Result<RetryPolicy> {
    let config = load_config(config_path)?;
    let policy = args.apply(config.for_operation(&args.operation));
    policy
        .validate()
        .context("Invalid retry flags")?;
    Ok(policy)
}
