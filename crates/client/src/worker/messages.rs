//! Background sync and push notification handling.

use leaflet_core::Error;
use serde::{Deserialize, Serialize};
use url::Url;

/// Sync tag registered by the reader page when progress changes offline.
pub const SYNC_READING_PROGRESS: &str = "sync-reading-progress";

/// Vibration pattern for push notifications, in milliseconds.
pub const VIBRATE_PATTERN: [u32; 3] = [100, 50, 100];

/// Where a notification leads when none is given.
const DEFAULT_NOTIFICATION_URL: &str = "/";

/// Result of a background sync event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    Synced,
    /// Tag not handled by this worker.
    Ignored,
}

/// JSON body of a push message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PushPayload {
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl PushPayload {
    pub fn parse(data: &str) -> Result<Self, Error> {
        serde_json::from_str(data).map_err(|e| Error::InvalidPayload(e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationData {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationOptions {
    pub body: Option<String>,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    pub data: NotificationData,
}

/// A notification shown on behalf of the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: u64,
    pub title: String,
    pub options: NotificationOptions,
}

impl Notification {
    /// Build the notification for a push payload. The site logo doubles as badge.
    /// A missing or blank `url` leads to the site root.
    pub fn from_push(id: u64, payload: PushPayload, icon: &Url) -> Self {
        Self {
            id,
            title: payload.title,
            options: NotificationOptions {
                body: payload.body,
                icon: icon.to_string(),
                badge: icon.to_string(),
                vibrate: VIBRATE_PATTERN.to_vec(),
                data: NotificationData {
                    url: payload
                        .url
                        .filter(|url| !url.trim().is_empty())
                        .unwrap_or_else(|| DEFAULT_NOTIFICATION_URL.to_string()),
                },
            },
        }
    }

    /// Target opened when the notification is clicked.
    pub fn target(&self) -> &str {
        &self.options.data.url
    }
}

/// Push reading progress to the server.
///
/// There is no progress endpoint yet; the hook only records that it ran.
pub(crate) async fn sync_reading_progress() {
    tracing::info!("syncing reading progress");
}
