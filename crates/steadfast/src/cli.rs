//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use steadfast_core::types::{RetryPolicy, CONTENT_FETCH_OPERATION};

/// Steadfast - retrying HTTP requests with exponential backoff
#[derive(Parser, Debug)]
#[command(name = "steadfast")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a retry.yaml config file
    #[arg(short, long, global = true, env = "STEADFAST_CONFIG")]
    pub config: Option<Utf8PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send an HTTP request, retrying rate limits and server errors
    Fetch(FetchArgs),

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Show the backoff delay before each retry
    Schedule(ScheduleArgs),
}

/// Overrides applied on top of the configured policy
#[derive(Args, Debug, Clone, Default)]
pub struct PolicyArgs {
    /// Named operation whose configured policy is used
    #[arg(long, default_value = CONTENT_FETCH_OPERATION)]
    pub operation: String,

    /// Maximum number of attempts, including the first
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Delay before the first retry in milliseconds
    #[arg(long)]
    pub initial_delay_ms: Option<u64>,

    /// Upper bound for the delay in milliseconds
    #[arg(long)]
    pub max_delay_ms: Option<u64>,

    /// Factor applied to the delay after each failure
    #[arg(long)]
    pub backoff_multiplier: Option<f64>,
}

impl PolicyArgs {
    /// Apply the flags that were given over `base`
    pub fn apply(&self, base: &RetryPolicy) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.unwrap_or(base.max_attempts),
            initial_delay_ms: self.initial_delay_ms.unwrap_or(base.initial_delay_ms),
            max_delay_ms: self.max_delay_ms.unwrap_or(base.max_delay_ms),
            backoff_multiplier: self.backoff_multiplier.unwrap_or(base.backoff_multiplier),
        }
    }
}

// Fetch command
#[derive(Args, Debug)]
pub struct FetchArgs {
    /// URL to request
    pub url: String,

    /// HTTP method
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: String,

    /// Request header as 'Name: value' (repeatable)
    #[arg(short = 'H', long = "header")]
    pub headers: Vec<String>,

    /// Request body
    #[arg(short, long)]
    pub data: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    #[command(flatten)]
    pub policy: PolicyArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// Config commands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the effective retry configuration
    Show(ConfigShowArgs),
}

#[derive(Args, Debug)]
pub struct ConfigShowArgs {
    /// Only show the policy for this operation
    #[arg(long)]
    pub operation: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// Schedule command
#[derive(Args, Debug)]
pub struct ScheduleArgs {
    #[command(flatten)]
    pub policy: PolicyArgs,

    /// Sample jitter instead of showing base delays
    #[arg(long)]
    pub jitter: bool,
}
