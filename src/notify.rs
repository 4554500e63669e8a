use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationVariant {
    Success,
    Error,
}

/// A toast shown to the admin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub variant: NotificationVariant,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Notification {
    pub fn success(title: impl Into<String>) -> Self {
        Self {
            variant: NotificationVariant::Success,
            title: title.into(),
            description: None,
        }
    }

    pub fn error(title: impl Into<String>) -> Self {
        Self {
            variant: NotificationVariant::Error,
            title: title.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Surface that displays notifications
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the log; for hosts without a toast surface
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        let description = notification.description.as_deref().unwrap_or("");
        match notification.variant {
            NotificationVariant::Success => {
                info!(title = %notification.title, description, "Notification")
            }
            NotificationVariant::Error => {
                error!(title = %notification.title, description, "Notification")
            }
        }
    }
}

/// Keeps every notification in memory, oldest first
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    received: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.received
            .lock()
            .map(|received| received.clone())
            .unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        if let Ok(mut received) = self.received.lock() {
            received.push(notification);
        }
    }
}
