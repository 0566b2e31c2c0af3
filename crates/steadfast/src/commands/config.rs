//! Config command

use anyhow::Result;
use camino::Utf8Path;

use crate::cli::{ConfigCommands, ConfigShowArgs};
use crate::output;

pub fn run(cmd: ConfigCommands, config_path: Option<&Utf8Path>) -> Result<()> {
    match cmd {
        ConfigCommands::Show(args) => show(args, config_path),
    }
}

fn show(args: ConfigShowArgs, config_path: Option<&Utf8Path>) -> Result<()> {
    let config = super::load_config(config_path)?;

    if let Some(operation) = &args.operation {
        let policy = config.for_operation(operation);

        if args.json {
            println!("{}", serde_json::to_string_pretty(policy)?);
        } else {
            output::header(&format!("Retry policy: {}", operation));
            if !config.operations.contains_key(operation) {
                output::info("Not configured, using the default policy");
            }
            print!("{}", serde_yaml_ng::to_string(policy)?);
        }
        return Ok(());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        output::header("Retry configuration");
        print!("{}", serde_yaml_ng::to_string(&config)?);
    }

    Ok(())
}
