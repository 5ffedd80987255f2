//! Offline cache worker.
//!
//! ### Event dispatch
//! A [`Worker`] is built from explicit configuration plus three seams: a
//! [`Fetcher`] for the network, a [`CacheStorage`] for cache generations and
//! a [`WorkerHost`] for platform callbacks. Events arrive through
//! [`Worker::dispatch`] or the per-event methods.
//!
//! ### Lifecycle
//! `Parsed -> Installing -> Installed -> Activating -> Activated`. A failed
//! install leaves the worker `Redundant`; a redundant worker declines every
//! fetch and may be installed again.
//!
//! ### Fetch
//! [`router::route`] picks a policy from method, scheme and path;
//! [`Strategies`] applies it against the current generation.

pub mod host;
pub mod lifecycle;
pub mod messages;
pub mod router;
pub mod strategy;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use leaflet_core::{AppConfig, CacheStorage, Error, Request, Response};
use serde::Serialize;
use tokio::sync::RwLock;
use url::Url;

pub use host::{HostLog, RecordingHost, WorkerHost};
pub use lifecycle::{ActivateReport, ContentReport, InstallReport, Lifecycle};
pub use messages::{Notification, PushPayload, SYNC_READING_PROGRESS, SyncOutcome};
pub use router::{Bypass, ResourceKind, Route, Strategy, route};
pub use strategy::Strategies;

use crate::fetch::{Fetcher, resolve};

/// Resolved worker configuration. All URLs are absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    pub cache_name: String,
    pub origin: Url,
    pub offline_url: Url,
    pub precache: Vec<Url>,
    pub content: Vec<Url>,
    pub notification_icon: Url,
}

impl WorkerConfig {
    /// Resolve every configured path against the site origin.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, Error> {
        let origin = Url::parse(&config.origin).map_err(|e| Error::InvalidUrl(format!("{}: {e}", config.origin)))?;
        let resolve_one = |input: &String| {
            resolve(&origin, input).map_err(|e| Error::InvalidUrl(format!("{input}: {e}")))
        };

        Ok(Self {
            cache_name: config.cache_name.clone(),
            offline_url: resolve_one(&config.offline_url)?,
            precache: config.precache_urls.iter().map(resolve_one).collect::<Result<_, _>>()?,
            content: config.content_urls.iter().map(resolve_one).collect::<Result<_, _>>()?,
            notification_icon: resolve_one(&config.notification_icon)?,
            origin,
        })
    }
}

/// Where the worker is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    #[default]
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    /// Install failed; the previous worker stays in charge.
    Redundant,
}

/// Events delivered by the host.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    Install,
    Activate,
    Fetch(Request),
    Sync { tag: String },
    Push { data: Option<String> },
    NotificationClick(Notification),
}

/// What handling a fetch event produced.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// Left to the platform's default network behaviour.
    Declined(Decline),
    Responded { kind: ResourceKind, strategy: Strategy, response: Response },
}

/// Why a fetch was not intercepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decline {
    Bypass(Bypass),
    /// The worker failed to install and handles nothing.
    Redundant,
}

/// Result of [`Worker::dispatch`], one variant per event.
#[derive(Debug)]
pub enum EventOutcome {
    Installed(InstallReport),
    Activated(ActivateReport),
    Fetched(FetchOutcome),
    Synced(SyncOutcome),
    Pushed(Option<Notification>),
    Clicked(Url),
}

/// The offline cache worker.
pub struct Worker {
    config: Arc<WorkerConfig>,
    lifecycle: Lifecycle,
    strategies: Strategies,
    host: Arc<dyn WorkerHost>,
    state: RwLock<WorkerState>,
    next_notification: AtomicU64,
}

impl Worker {
    pub fn new(
        config: WorkerConfig, fetcher: Arc<dyn Fetcher>, cache: Arc<dyn CacheStorage>, host: Arc<dyn WorkerHost>,
    ) -> Self {
        let config = Arc::new(config);
        let strategies = Strategies::new(
            fetcher.clone(),
            cache.clone(),
            config.cache_name.as_str(),
            config.offline_url.clone(),
        );
        let lifecycle = Lifecycle::new(fetcher, cache, config.clone(), host.clone());

        Self {
            config,
            lifecycle,
            strategies,
            host,
            state: RwLock::new(WorkerState::Parsed),
            next_notification: AtomicU64::new(1),
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    /// Handle any event.
    pub async fn dispatch(&self, event: WorkerEvent) -> Result<EventOutcome, Error> {
        match event {
            WorkerEvent::Install => self.install().await.map(EventOutcome::Installed),
            WorkerEvent::Activate => self.activate().await.map(EventOutcome::Activated),
            WorkerEvent::Fetch(request) => self.handle_fetch(&request).await.map(EventOutcome::Fetched),
            WorkerEvent::Sync { tag } => Ok(EventOutcome::Synced(self.sync(&tag).await)),
            WorkerEvent::Push { data } => self.push(data.as_deref()).await.map(EventOutcome::Pushed),
            WorkerEvent::NotificationClick(notification) => {
                self.notification_click(&notification).await.map(EventOutcome::Clicked)
            }
        }
    }

    /// Populate the current generation. See [`Lifecycle::install`].
    pub async fn install(&self) -> Result<InstallReport, Error> {
        self.enter(&[WorkerState::Parsed, WorkerState::Redundant], WorkerState::Installing)
            .await?;

        match self.lifecycle.install().await {
            Ok(report) => {
                *self.state.write().await = WorkerState::Installed;
                tracing::info!(cache = %report.cache_name, precached = report.precached, "worker installed");
                Ok(report)
            }
            Err(e) => {
                *self.state.write().await = WorkerState::Redundant;
                tracing::error!(error = %e, "install failed");
                Err(e)
            }
        }
    }

    /// Remove superseded generations and take over clients.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidState` unless install has succeeded.
    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        self.enter(&[WorkerState::Installed], WorkerState::Activating).await?;

        match self.lifecycle.activate().await {
            Ok(report) => {
                *self.state.write().await = WorkerState::Activated;
                tracing::info!(cache = %report.cache_name, deleted = report.deleted.len(), "worker activated");
                Ok(report)
            }
            Err(e) => {
                *self.state.write().await = WorkerState::Installed;
                Err(e)
            }
        }
    }

    async fn enter(&self, from: &[WorkerState], to: WorkerState) -> Result<(), Error> {
        let mut state = self.state.write().await;
        if !from.contains(&*state) {
            return Err(Error::InvalidState(format!("cannot move from {:?} to {:?}", *state, to)));
        }
        *state = to;
        Ok(())
    }

    /// Route a request and, unless it is declined, serve it.
    ///
    /// # Errors
    ///
    /// Only a stale-while-revalidate miss with the network down fails.
    pub async fn handle_fetch(&self, request: &Request) -> Result<FetchOutcome, Error> {
        if self.state().await == WorkerState::Redundant {
            return Ok(FetchOutcome::Declined(Decline::Redundant));
        }

        match route(request) {
            Route::Bypass(bypass) => {
                tracing::debug!(url = %request.url, ?bypass, "not intercepting");
                Ok(FetchOutcome::Declined(Decline::Bypass(bypass)))
            }
            Route::Handle(kind, strategy) => {
                tracing::debug!(url = %request.url, ?kind, ?strategy, "intercepting");
                let response = self.strategies.serve(strategy, request).await?;
                Ok(FetchOutcome::Responded { kind, strategy, response })
            }
        }
    }

    /// Handle a background sync event.
    pub async fn sync(&self, tag: &str) -> SyncOutcome {
        if tag == SYNC_READING_PROGRESS {
            messages::sync_reading_progress().await;
            SyncOutcome::Synced
        } else {
            tracing::debug!(tag, "ignoring sync tag");
            SyncOutcome::Ignored
        }
    }

    /// Show a notification for a push message. Messages without data show nothing.
    pub async fn push(&self, data: Option<&str>) -> Result<Option<Notification>, Error> {
        let Some(data) = data else {
            return Ok(None);
        };

        let payload = PushPayload::parse(data)?;
        let id = self.next_notification.fetch_add(1, Ordering::Relaxed);
        let notification = Notification::from_push(id, payload, &self.config.notification_icon);
        self.host.show_notification(&notification).await?;
        Ok(Some(notification))
    }

    /// Close the notification and open its target. Returns the opened URL.
    pub async fn notification_click(&self, notification: &Notification) -> Result<Url, Error> {
        self.host.close_notification(notification.id).await;

        let target = resolve(&self.config.origin, notification.target())
            .map_err(|e| Error::InvalidUrl(format!("{}: {e}", notification.target())))?;
        self.host.open_window(&target).await?;
        Ok(target)
    }
}
