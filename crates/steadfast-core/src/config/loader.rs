//! Hierarchical retry configuration loader
//!
//! Loads retry policies from multiple sources with the following precedence
//! (low to high):
//! 1. Built-in defaults
//! 2. Config file (~/.steadfast/retry.yaml, or an explicit path)
//! 3. Environment variables (STEADFAST_* prefix), applied to the default policy
//! 4. CLI flags (handled by caller)

use crate::error::{Error, Result};
use crate::types::{RetryPoliciesConfig, RetryPolicy};
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::env;
use std::fs;
use tracing::debug;

/// Name of the retry configuration file inside the config directory
pub const CONFIG_FILE_NAME: &str = "retry.yaml";

/// On-disk shape of the retry configuration. Every section is optional so
/// a file that only tunes one operation leaves the default policy intact.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RetryPoliciesFile {
    #[serde(default)]
    default: Option<RetryPolicy>,

    #[serde(default)]
    operations: HashMap<String, RetryPolicy>,
}

/// Retry configuration loader
pub struct RetryConfigLoader {
    /// Path of the config file to read
    config_path: Utf8PathBuf,

    /// Whether a missing config file is an error
    required: bool,
}

impl RetryConfigLoader {
    /// Create a loader for the standard config location (~/.steadfast/retry.yaml)
    pub fn new() -> Result<Self> {
        let config_dir = Self::get_config_dir()?;
        Ok(Self::with_dir(config_dir))
    }

    /// Create a loader that reads `retry.yaml` from a custom directory
    pub fn with_dir(config_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            config_path: config_dir.into().join(CONFIG_FILE_NAME),
            required: false,
        }
    }

    /// Create a loader for an explicit config file, which must exist
    pub fn with_file(config_path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            required: true,
        }
    }

    /// Get the standard config directory (~/.steadfast)
    fn get_config_dir() -> Result<Utf8PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::invalid_config("Could not determine home directory"))?;

        let home = Utf8PathBuf::from_path_buf(home)
            .map_err(|p| Error::invalid_config(format!("Home directory is not UTF-8: {:?}", p)))?;

        Ok(home.join(".steadfast"))
    }

    /// Load retry policies with hierarchical precedence
    ///
    /// Environment overrides apply to the default policy and to every
    /// built-in operation the file does not configure explicitly.
    pub fn load(&self) -> Result<RetryPoliciesConfig> {
        let mut config = RetryPoliciesConfig::default();
        let mut configured = HashSet::new();

        if self.config_path.exists() {
            debug!(path = %self.config_path, "loading retry configuration");
            let file_config = self.load_yaml_file(&self.config_path)?;
            configured.extend(file_config.operations.keys().cloned());
            config = Self::merge(config, file_config);
        } else if self.required {
            return Err(Error::config_not_found(self.config_path.as_str()));
        }

        let overrides = EnvOverrides::from_env()?;
        overrides.apply(&mut config.default);
        for (name, policy) in config.operations.iter_mut() {
            if !configured.contains(name) {
                overrides.apply(policy);
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Load the effective policy for one named operation
    pub fn load_policy(&self, operation: &str) -> Result<RetryPolicy> {
        let config = self.load()?;
        Ok(config.for_operation(operation).clone())
    }

    /// Load a YAML file and parse it
    fn load_yaml_file(&self, path: &Utf8Path) -> Result<RetryPoliciesFile> {
        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(RetryPoliciesFile::default());
        }
        debug!(path = %path, bytes = content.len(), "parsing retry configuration");
        Ok(serde_yaml_ng::from_str(&content)?)
    }

    /// Merge a parsed file over the base config (file wins)
    fn merge(mut base: RetryPoliciesConfig, overlay: RetryPoliciesFile) -> RetryPoliciesConfig {
        if let Some(default) = overlay.default {
            base.default = default;
        }
        for (key, policy) in overlay.operations {
            base.operations.insert(key, policy);
        }
        base
    }

    /// Get the config file path
    pub fn config_path(&self) -> &Utf8Path {
        &self.config_path
    }
}

/// Policy fields set through `STEADFAST_*` environment variables
#[derive(Debug, Default)]
struct EnvOverrides {
    max_attempts: Option<u32>,
    initial_delay_ms: Option<u64>,
    max_delay_ms: Option<u64>,
    backoff_multiplier: Option<f64>,
}

impl EnvOverrides {
    fn from_env() -> Result<Self> {
        Ok(Self {
            max_attempts: read_env("STEADFAST_MAX_ATTEMPTS")?,
            initial_delay_ms: read_env("STEADFAST_INITIAL_DELAY_MS")?,
            max_delay_ms: read_env("STEADFAST_MAX_DELAY_MS")?,
            backoff_multiplier: read_env("STEADFAST_BACKOFF_MULTIPLIER")?,
        })
    }

    fn apply(&self, policy: &mut RetryPolicy) {
        if let Some(val) = self.max_attempts {
            policy.max_attempts = val;
        }
        if let Some(val) = self.initial_delay_ms {
            policy.initial_delay_ms = val;
        }
        if let Some(val) = self.max_delay_ms {
            policy.max_delay_ms = val;
        }
        if let Some(val) = self.backoff_multiplier {
            policy.backoff_multiplier = val;
        }
    }
}

fn read_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(val) => val
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::invalid_config(format!("{} must be a valid number", name))),
        Err(_) => Ok(None),
    }
}
