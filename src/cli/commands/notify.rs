//! Push, click and message commands - deliver page and push events

use super::install::report;
use super::open_registration;
use crate::cli::args::{ClickArgs, MessageArgs, MessageKind, PushArgs};
use crate::config::Config;
use crate::error::{ShelterError, ShelterResult};
use crate::ui::{self, UiContext};
use crate::worker::{ControlMessage, DispatchOutcome, LifecycleEvent, Registration};

/// Execute the push command, printing the notification as JSON
pub async fn push(args: PushArgs, config: &Config) -> ShelterResult<()> {
    let registration = open_registration(config, false).await?;
    let outcome = dispatch(&registration, LifecycleEvent::Push(args.payload)).await?;
    print_outcome(outcome)
}

/// Execute the click command, printing the click response as JSON
pub async fn click(args: ClickArgs, config: &Config) -> ShelterResult<()> {
    let registration = open_registration(config, false).await?;
    let event = LifecycleEvent::NotificationClick {
        action: args.action,
    };
    let outcome = dispatch(&registration, event).await?;
    print_outcome(outcome)
}

/// Execute the message command
pub async fn message(args: MessageArgs, config: &Config) -> ShelterResult<()> {
    let ctx = UiContext::detect();
    let mut registration = open_registration(config, false).await?;

    let message = match args.kind {
        MessageKind::SkipWaiting => ControlMessage::SkipWaiting,
        MessageKind::CheckForUpdate => ControlMessage::CheckForUpdate,
        MessageKind::Raw { json } => {
            let value: serde_json::Value = serde_json::from_str(&json)
                .map_err(|e| ShelterError::User(format!("Invalid JSON message: {}", e)))?;
            ControlMessage::from_json(value)
        }
    };

    match message {
        ControlMessage::SkipWaiting => {
            let registered = registration.skip_waiting().await?;
            report(&ctx, registered);
        }
        ControlMessage::CheckForUpdate => match registration.check_for_update().await? {
            Some(registered) => report(&ctx, registered),
            None => ui::step_ok(&ctx, "Already up to date"),
        },
        other => {
            let outcome = dispatch(&registration, LifecycleEvent::Message(other)).await?;
            if matches!(outcome, DispatchOutcome::Ignored) {
                ui::remark(&ctx, "Message ignored");
            }
        }
    }

    Ok(())
}

/// Events are delivered to the active version only
async fn dispatch(
    registration: &Registration,
    event: LifecycleEvent,
) -> ShelterResult<DispatchOutcome> {
    let mut controller = registration.controller()?;
    controller.dispatch(event).await
}

fn print_outcome(outcome: DispatchOutcome) -> ShelterResult<()> {
    let json = match outcome {
        DispatchOutcome::Notification(notification) => serde_json::to_string_pretty(&notification)?,
        DispatchOutcome::NotificationClosed(click) => serde_json::to_string_pretty(&click)?,
        other => {
            return Err(ShelterError::Internal(format!(
                "unexpected outcome {:?}",
                other
            )))
        }
    };
    println!("{}", json);
    Ok(())
}
