//! Install command - register a controller version and precache its manifest

use super::open_registration;
use crate::cli::args::InstallArgs;
use crate::config::Config;
use crate::error::ShelterResult;
use crate::ui::{self, PrecacheProgress, UiContext};
use crate::worker::policy::precache_set;
use crate::worker::Registered;

/// Execute the install command
pub async fn execute(args: InstallArgs, config: &Config) -> ShelterResult<()> {
    let ctx = UiContext::detect();
    let version = args
        .cache_version
        .unwrap_or_else(|| config.cache.version.clone());

    let mut registration = open_registration(config, false).await?;
    let total = precache_set(&config.cache.manifest, &config.cache.offline_url).len();
    let progress = PrecacheProgress::new(&ctx, &version, total);
    let result = registration
        .register_with_progress(&version, &|url, ok| progress.on_asset(url, ok))
        .await;
    progress.finish();

    report(&ctx, result?);
    Ok(())
}

pub(crate) fn report(ctx: &UiContext, registered: Registered) {
    match registered {
        Registered::Activated {
            version,
            precached,
            deleted,
        } => {
            if precached > 0 {
                ui::step_ok_detail(ctx, &format!("Installed {}", version), &format!("{} precached", precached));
            }
            for name in &deleted {
                ui::step_info(ctx, &format!("Deleted stale partition {}", name));
            }
            ui::outro_success(ctx, &format!("{} is active", version));
        }
        Registered::Waiting { version, precached } => {
            if precached > 0 {
                ui::step_ok_detail(ctx, &format!("Installed {}", version), &format!("{} precached", precached));
            }
            ui::step_warn_hint(
                ctx,
                &format!("{} is waiting for older pages to close", version),
                "Run: shelter activate or shelter message skip-waiting",
            );
        }
        Registered::AlreadyActive { version } => {
            ui::step_ok(ctx, &format!("{} is already active", version));
        }
    }
}
