//! Push and notification-click handling
//!
//! Lives beside the cache controller on the same lifecycle object but shares
//! no state with it: each event maps straight to one action.

use crate::config::schema::NotificationConfig;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

/// Action id that opens the site
pub const ACTION_EXPLORE: &str = "explore";
/// Action id that only dismisses
pub const ACTION_CLOSE: &str = "close";
/// Sync tag with a registered handler
pub const BACKGROUND_SYNC_TAG: &str = "background-sync";

/// A button shown on a notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
    pub icon: String,
}

/// Data attached to a notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationData {
    pub date_of_arrival: DateTime<Utc>,
    pub primary_key: u32,
}

/// A notification to display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    pub data: NotificationData,
    pub actions: Vec<NotificationAction>,
}

/// What to do after a notification was clicked
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClickResponse {
    /// The notification is always closed
    pub close: bool,
    /// Window to open, if any
    pub open_window: Option<String>,
}

/// Maps push/click/sync events to notification actions
#[derive(Debug, Clone)]
pub struct NotificationHandler {
    config: NotificationConfig,
}

impl NotificationHandler {
    pub fn new(config: NotificationConfig) -> Self {
        Self { config }
    }

    /// Build the notification for a push message
    pub fn on_push(&self, payload: Option<&str>) -> Notification {
        let body = payload
            .unwrap_or(self.config.default_body.as_str())
            .to_string();

        debug!("Push received, showing notification: {}", body);
        Notification {
            title: self.config.title.clone(),
            body,
            icon: self.config.icon.clone(),
            badge: self.config.icon.clone(),
            vibrate: self.config.vibrate.clone(),
            data: NotificationData {
                date_of_arrival: Utc::now(),
                primary_key: 1,
            },
            actions: vec![
                NotificationAction {
                    action: ACTION_EXPLORE.to_string(),
                    title: "View Portfolio".to_string(),
                    icon: self.config.icon.clone(),
                },
                NotificationAction {
                    action: ACTION_CLOSE.to_string(),
                    title: "Close".to_string(),
                    icon: self.config.icon.clone(),
                },
            ],
        }
    }

    /// Close the notification; `explore` also opens the site
    pub fn on_click(&self, action: Option<&str>) -> ClickResponse {
        let open_window = match action {
            Some(ACTION_EXPLORE) => Some(self.config.open_url.clone()),
            _ => None,
        };

        ClickResponse {
            close: true,
            open_window,
        }
    }

    /// Returns whether the sync tag has a handler
    pub fn on_sync(&self, tag: &str) -> bool {
        if tag == BACKGROUND_SYNC_TAG {
            info!("Background sync triggered");
            true
        } else {
            debug!("No handler for sync tag {}", tag);
            false
        }
    }
}

impl Default for NotificationHandler {
    fn default() -> Self {
        Self::new(NotificationConfig::default())
    }
}
