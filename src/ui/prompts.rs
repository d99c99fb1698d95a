//! Confirmation prompt with non-interactive fallback

use super::context::UiContext;
use crate::error::{ShelterError, ShelterResult};

/// Ask a yes/no question; non-interactive runs get `default`
pub async fn confirm(ctx: &UiContext, message: &str, default: bool) -> ShelterResult<bool> {
    if ctx.auto_yes() {
        return Ok(true);
    }

    if !ctx.is_interactive() {
        return Ok(default);
    }

    let message = message.to_string();
    tokio::task::spawn_blocking(move || {
        cliclack::confirm(&message)
            .initial_value(default)
            .interact()
    })
    .await
    .map_err(|e| ShelterError::Internal(format!("prompt task failed: {}", e)))?
    .map_err(|e| ShelterError::User(format!("Prompt failed: {}", e)))
}
