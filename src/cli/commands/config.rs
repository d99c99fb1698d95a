//! Config command - show or edit configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{problems, Config, ConfigManager};
use crate::error::{ShelterError, ShelterResult};
use crate::ui::{self, UiContext};
use std::path::PathBuf;

/// Keys accepted by `config set`
const VALID_KEYS: [&str; 13] = [
    "general.log_format",
    "cache.prefix",
    "cache.version",
    "cache.manifest",
    "cache.offline_url",
    "cache.skip_waiting",
    "origin.base_url",
    "origin.site_dir",
    "notifications.title",
    "notifications.default_body",
    "notifications.icon",
    "notifications.vibrate",
    "notifications.open_url",
];

/// Execute the config command
pub async fn execute(args: ConfigArgs, config: &Config, manager: &ConfigManager) -> ShelterResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config)?,
        Some(ConfigAction::Path) => println!("{}", manager.path().display()),
        Some(ConfigAction::Init { force }) => init_config(manager, force).await?,
        Some(ConfigAction::Set { key, value }) => {
            let ctx = UiContext::detect();
            let mut config = config.clone();
            apply(&mut config, &key, &value)?;
            let found = problems(&config);
            if !found.is_empty() {
                return Err(ShelterError::User(found.join("; ")));
            }
            manager.save(&config).await?;
            ui::step_ok(&ctx, &format!("Set {} = {}", key, value));
        }
    }

    Ok(())
}

fn show_config(config: &Config) -> ShelterResult<()> {
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

async fn init_config(manager: &ConfigManager, force: bool) -> ShelterResult<()> {
    let ctx = UiContext::detect();
    let path = manager.path();

    if path.exists() && !force {
        ui::step_warn_hint(
            &ctx,
            &format!("Config already exists at {}", path.display()),
            "Use --force to overwrite",
        );
        return Ok(());
    }

    manager.save(&Config::default()).await?;
    ui::step_ok_detail(&ctx, "Configuration initialized", &path.display().to_string());
    Ok(())
}

/// Set one dot-separated key on `config`
fn apply(config: &mut Config, key: &str, value: &str) -> ShelterResult<()> {
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["general", "log_format"] => match value {
            "text" | "json" => config.general.log_format = value.to_string(),
            _ => {
                return Err(ShelterError::User(format!(
                    "Invalid log format: {}. Use text or json",
                    value
                )))
            }
        },

        ["cache", "prefix"] => config.cache.prefix = non_empty(key, value)?,
        ["cache", "version"] => config.cache.version = non_empty(key, value)?,
        ["cache", "manifest"] => config.cache.manifest = parse_list(value),
        ["cache", "offline_url"] => config.cache.offline_url = value.to_string(),
        ["cache", "skip_waiting"] => config.cache.skip_waiting = parse_bool(value)?,

        ["origin", "base_url"] => config.origin.base_url = value.to_string(),
        ["origin", "site_dir"] => {
            config.origin.site_dir = (!value.is_empty()).then(|| PathBuf::from(value))
        }

        ["notifications", "title"] => config.notifications.title = value.to_string(),
        ["notifications", "default_body"] => config.notifications.default_body = value.to_string(),
        ["notifications", "icon"] => config.notifications.icon = value.to_string(),
        ["notifications", "vibrate"] => {
            config.notifications.vibrate = parse_list(value)
                .iter()
                .map(|n| parse_u32(n))
                .collect::<ShelterResult<_>>()?
        }
        ["notifications", "open_url"] => config.notifications.open_url = value.to_string(),

        _ => {
            return Err(ShelterError::User(format!(
                "Unknown config key: {}. Valid keys: {}",
                key,
                VALID_KEYS.join(", ")
            )))
        }
    }

    Ok(())
}

fn non_empty(key: &str, value: &str) -> ShelterResult<String> {
    if value.trim().is_empty() {
        return Err(ShelterError::User(format!("{} cannot be empty", key)));
    }
    Ok(value.to_string())
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_bool(value: &str) -> ShelterResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ShelterError::User(format!(
            "Invalid boolean value: {}. Use true/false",
            value
        ))),
    }
}

fn parse_u32(value: &str) -> ShelterResult<u32> {
    value
        .parse()
        .map_err(|_| ShelterError::User(format!("Invalid number: {}", value)))
}
