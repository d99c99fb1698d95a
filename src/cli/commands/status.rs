//! Status command - registration, lifecycle and partitions at a glance

use super::{open_registration, open_store};
use crate::config::{Config, ConfigManager};
use crate::error::ShelterResult;
use crate::ui::{self, UiContext};
use crate::worker::{CacheNames, LifecycleState};
use console::style;

/// Execute the status command
pub async fn execute(config: &Config) -> ShelterResult<()> {
    let ctx = UiContext::detect();
    let registration = open_registration(config, false).await?;
    let record = registration.record();

    println!("{}", style("Shelter Status").bold().cyan());

    ui::section(&ctx, "Registration");
    ui::key_value(&ctx, "id", &record.id.to_string());
    ui::key_value(&ctx, "state", &ConfigManager::state_dir().display().to_string());
    ui::key_value_status(
        &ctx,
        "active",
        registration.active_version().unwrap_or("none"),
        registration.active_version().is_some(),
    );
    if let Some(waiting) = registration.waiting_version() {
        ui::key_value_status(&ctx, "waiting", waiting, false);
    }
    ui::key_value(&ctx, "configured", &config.cache.version);

    if !record.versions.is_empty() {
        ui::section(&ctx, "Versions");
        for lifecycle in &record.versions {
            let ok = matches!(
                lifecycle.state(),
                LifecycleState::Active | LifecycleState::Waiting
            );
            ui::key_value_status(
                &ctx,
                &lifecycle.version,
                &format!(
                    "{} (since {})",
                    lifecycle.state(),
                    lifecycle.updated_at.format("%Y-%m-%d %H:%M")
                ),
                ok,
            );
        }
    }

    ui::section(&ctx, "Partitions");
    let names = open_store().keys().await?;
    let current = registration
        .active_version()
        .map(|version| CacheNames::new(&config.cache.prefix, version));
    if names.is_empty() {
        ui::remark(&ctx, "No cache partitions");
    }
    for name in &names {
        let live = current.as_ref().is_some_and(|c| c.is_current(name));
        ui::key_value_status(&ctx, name, if live { "current" } else { "stale" }, live);
    }

    if registration.active_version().is_none() {
        println!();
        ui::remark(&ctx, "Run: shelter install");
    }

    Ok(())
}
