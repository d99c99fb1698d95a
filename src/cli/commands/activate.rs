//! Activate command - promote the waiting version

use super::install::report;
use super::open_registration;
use crate::cli::args::ActivateArgs;
use crate::config::Config;
use crate::error::ShelterResult;
use crate::ui::{TaskSpinner, UiContext};

/// Execute the activate command
pub async fn execute(args: ActivateArgs, config: &Config) -> ShelterResult<()> {
    let ctx = UiContext::detect();
    let mut registration = open_registration(config, false).await?;

    let mut spinner = TaskSpinner::new(&ctx);
    spinner.start("Activating waiting version...");
    match registration
        .activate_waiting(args.previous_holds_clients)
        .await
    {
        Ok(registered) => {
            spinner.stop("Activation finished");
            report(&ctx, registered);
            Ok(())
        }
        Err(e) => {
            spinner.stop_error("Activation failed");
            Err(e)
        }
    }
}
