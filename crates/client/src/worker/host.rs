//! Platform services the worker calls back into.

use std::collections::BTreeMap;

use async_trait::async_trait;
use leaflet_core::Error;
use tokio::sync::Mutex;
use url::Url;

use super::messages::Notification;

/// The environment that runs the worker: activation control, client pages,
/// notifications and windows.
#[async_trait]
pub trait WorkerHost: Send + Sync {
    /// Activate as soon as install finishes instead of waiting for old clients to close.
    async fn skip_waiting(&self);

    /// Take control of every open client page without a reload.
    async fn claim_clients(&self) -> Result<(), Error>;

    async fn show_notification(&self, notification: &Notification) -> Result<(), Error>;

    async fn close_notification(&self, id: u64);

    async fn open_window(&self, url: &Url) -> Result<(), Error>;
}

/// Everything a [`RecordingHost`] has been asked to do.
#[derive(Debug, Clone, Default)]
pub struct HostLog {
    pub skipped_waiting: bool,
    pub clients_claimed: bool,
    /// Notifications currently shown, by id.
    pub notifications: BTreeMap<u64, Notification>,
    pub opened_windows: Vec<Url>,
}

/// Host that logs each call and keeps the resulting state in memory.
#[derive(Debug, Default)]
pub struct RecordingHost {
    log: Mutex<HostLog>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn log(&self) -> HostLog {
        self.log.lock().await.clone()
    }

    /// A notification that is still open.
    pub async fn notification(&self, id: u64) -> Option<Notification> {
        self.log.lock().await.notifications.get(&id).cloned()
    }
}

#[async_trait]
impl WorkerHost for RecordingHost {
    async fn skip_waiting(&self) {
        tracing::debug!("skip waiting");
        self.log.lock().await.skipped_waiting = true;
    }

    async fn claim_clients(&self) -> Result<(), Error> {
        tracing::debug!("claiming clients");
        self.log.lock().await.clients_claimed = true;
        Ok(())
    }

    async fn show_notification(&self, notification: &Notification) -> Result<(), Error> {
        tracing::info!(id = notification.id, title = %notification.title, "showing notification");
        self.log
            .lock()
            .await
            .notifications
            .insert(notification.id, notification.clone());
        Ok(())
    }

    async fn close_notification(&self, id: u64) {
        self.log.lock().await.notifications.remove(&id);
    }

    async fn open_window(&self, url: &Url) -> Result<(), Error> {
        tracing::info!(%url, "opening window");
        self.log.lock().await.opened_windows.push(url.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::messages::PushPayload;

    #[tokio::test]
    async fn test_recording_host_tracks_notifications() {
        let host = RecordingHost::new();
        let icon = Url::parse("https://docs.bccsw.cn/logo.png").unwrap();
        let notification =
            Notification::from_push(3, PushPayload { title: "t".into(), body: None, url: None }, &icon);

        host.show_notification(&notification).await.unwrap();
        assert_eq!(host.notification(3).await, Some(notification));

        host.close_notification(3).await;
        assert!(host.notification(3).await.is_none());
    }

    #[tokio::test]
    async fn test_recording_host_lifecycle_flags() {
        let host = RecordingHost::new();
        host.skip_waiting().await;
        host.claim_clients().await.unwrap();

        let log = host.log().await;
        assert!(log.skipped_waiting);
        assert!(log.clients_claimed);
        assert!(log.opened_windows.is_empty());
    }
}
