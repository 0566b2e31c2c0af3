//! Schedule command

use anyhow::Result;
use camino::Utf8Path;
use steadfast_core::retry::{backoff_delay, calculate_delay};

use crate::cli::ScheduleArgs;
use crate::output;

pub fn run(args: ScheduleArgs, config_path: Option<&Utf8Path>) -> Result<()> {
    let policy = super::resolve_policy(config_path, &args.policy)?;

    output::header(&format!("Backoff schedule: {}", args.policy.operation));
    output::kv("max attempts", &policy.max_attempts.to_string());

    if policy.max_attempts <= 1 {
        output::info("No retries: the operation runs once");
        return Ok(());
    }

    for attempt in 1..policy.max_attempts {
        let delay = if args.jitter {
            calculate_delay(&policy, attempt, true)
        } else {
            backoff_delay(&policy, attempt)
        };
        output::kv(
            &format!("before attempt {}", attempt + 1),
            &format!("{}ms", delay.as_millis()),
        );
    }

    Ok(())
}
