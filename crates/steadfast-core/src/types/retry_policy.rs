//! Retry policy configuration types
//!
//! A `RetryPolicy` carries the numeric part of a retry configuration: how
//! many attempts to make and how the delay between them grows. Policies are
//! plain data, loaded from YAML or built in code, and never mutated by the
//! retry executor.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::error::{Error, Result};

/// Name of the built-in per-operation policy used for content fetching
pub const CONTENT_FETCH_OPERATION: &str = "content-fetch";

/// Retry policies configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RetryPoliciesConfig {
    /// Default retry policy
    #[serde(default)]
    pub default: RetryPolicy,

    /// Per-operation retry policies
    #[serde(default)]
    pub operations: HashMap<String, RetryPolicy>,
}

impl Default for RetryPoliciesConfig {
    fn default() -> Self {
        let mut operations = HashMap::new();

        operations.insert(CONTENT_FETCH_OPERATION.to_string(), RetryPolicy::default());

        Self {
            default: RetryPolicy::default(),
            operations,
        }
    }
}

impl RetryPoliciesConfig {
    /// Get the policy for a named operation, falling back to the default
    pub fn for_operation(&self, operation: &str) -> &RetryPolicy {
        self.operations.get(operation).unwrap_or(&self.default)
    }

    /// Validate every policy in the configuration
    pub fn validate(&self) -> Result<()> {
        self.default.validate()?;
        for (name, policy) in &self.operations {
            policy.validate().map_err(|e| {
                Error::invalid_config(format!("operation '{}': {}", name, e))
            })?;
        }
        Ok(())
    }
}

/// Retry policy for an operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry in milliseconds
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,

    /// Upper bound for the un-jittered delay in milliseconds
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,

    /// Factor applied to the delay after each failed attempt
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay(),
            max_delay_ms: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

impl RetryPolicy {
    /// Delay before the first retry
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    /// Cap applied to the un-jittered delay
    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    /// Check that the policy describes a usable schedule
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(Error::invalid_config("max-attempts must be at least 1"));
        }

        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 0.0 {
            return Err(Error::invalid_config(format!(
                "backoff-multiplier must be a non-negative number, got {}",
                self.backoff_multiplier
            )));
        }

        if self.initial_delay_ms > self.max_delay_ms {
            return Err(Error::invalid_config(format!(
                "initial-delay-ms ({}) exceeds max-delay-ms ({})",
                self.initial_delay_ms, self.max_delay_ms
            )));
        }

        Ok(())
    }
}

fn default_max_attempts() -> u32 {
    3
}
fn default_initial_delay() -> u64 {
    1000
}
fn default_max_delay() -> u64 {
    10000
}
fn default_backoff_multiplier() -> f64 {
    2.0
}
