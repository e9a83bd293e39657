use serde_json::json;

use tally_config::ADMIN_SECRET_ENV;

use crate::{
    cli::{AppContext, ConfigCommands},
    errors::CliError,
};

pub fn run(context: &AppContext, command: ConfigCommands) -> Result<(), CliError> {
    let manager = context.config_manager();
    match command {
        ConfigCommands::Show => show(context)?,
        ConfigCommands::SetSecret { secret } => {
            manager.update(|config| config.admin_secret = Some(secret))?;
            println!("Admin secret stored in {}", manager.config_path().display());
            if std::env::var_os(ADMIN_SECRET_ENV).is_some() {
                println!("Note: {ADMIN_SECRET_ENV} is set and takes precedence.");
            }
        }
        ConfigCommands::ClearSecret => {
            manager.update(|config| config.admin_secret = None)?;
            println!("Admin secret removed from {}", manager.config_path().display());
        }
        ConfigCommands::SetSchedule {
            run_at,
            utc_offset_minutes,
        } => {
            let config = manager.update(|config| {
                if let Some(run_at) = run_at {
                    config.schedule.run_at = run_at;
                }
                if let Some(offset) = utc_offset_minutes {
                    config.schedule.utc_offset_minutes = offset;
                }
            })?;
            tracing::info!(
                run_at = %config.schedule.run_at,
                offset = config.schedule.utc_offset_minutes,
                "daily schedule updated"
            );
            println!(
                "Daily pass runs at {} (UTC offset {} minutes)",
                config.schedule.run_at, config.schedule.utc_offset_minutes
            );
        }
    }
    Ok(())
}

/// Effective configuration with the admin secret redacted.
fn show(context: &AppContext) -> Result<(), CliError> {
    let config = context.config();
    let summary = json!({
        "baseDir": context.base_dir().display().to_string(),
        "configFile": context.config_manager().config_path().display().to_string(),
        "dataDir": context.store().root().display().to_string(),
        "adminSecret": if config.admin_secret.is_some() { "set" } else { "unset" },
        "schedule": {
            "runAt": config.schedule.run_at,
            "utcOffsetMinutes": config.schedule.utc_offset_minutes,
        },
        "runCeilingSecs": config.run_ceiling_secs,
        "listenAddr": config.listen_addr,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
