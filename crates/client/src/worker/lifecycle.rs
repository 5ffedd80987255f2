//! Install and activate: populating the current cache generation and
//! removing superseded ones.
//!
//! ### Install
//! - Fetch the whole precache manifest concurrently. Any transport failure
//!   or non-ok status aborts install before anything is written.
//! - Store the manifest in one transaction, then mark the generation ready.
//! - Spawn best-effort population of the content documents; the install
//!   result does not wait for it.
//! - Ask the host to skip waiting.
//!
//! ### Activate
//! - Delete every generation other than the current one. A failed delete is
//!   logged and activation carries on.
//! - Claim open clients.

use std::sync::Arc;

use futures_util::future::{join_all, try_join_all};
use leaflet_core::{CacheStorage, Error, Request, Response};
use serde::Serialize;
use tokio::task::JoinHandle;
use url::Url;

use super::WorkerConfig;
use super::host::WorkerHost;
use crate::fetch::Fetcher;

/// Outcome of background content population.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContentReport {
    pub stored: Vec<Url>,
    pub failed: Vec<Url>,
}

/// Outcome of a successful install.
#[derive(Debug)]
pub struct InstallReport {
    pub cache_name: String,
    /// Number of manifest entries stored.
    pub precached: usize,
    /// Background content population. Nothing in the worker awaits it.
    pub content: JoinHandle<ContentReport>,
}

/// Outcome of activation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActivateReport {
    pub cache_name: String,
    pub deleted: Vec<String>,
    /// Stale generations that could not be deleted.
    pub failed: Vec<String>,
}

/// Drives cache population and cleanup across install and activate.
#[derive(Clone)]
pub struct Lifecycle {
    fetcher: Arc<dyn Fetcher>,
    cache: Arc<dyn CacheStorage>,
    config: Arc<WorkerConfig>,
    host: Arc<dyn WorkerHost>,
}

impl Lifecycle {
    pub fn new(
        fetcher: Arc<dyn Fetcher>, cache: Arc<dyn CacheStorage>, config: Arc<WorkerConfig>, host: Arc<dyn WorkerHost>,
    ) -> Self {
        Self { fetcher, cache, config, host }
    }

    /// Populate the current generation.
    ///
    /// # Errors
    ///
    /// Returns `Error::PrecacheFailed` if any manifest entry cannot be
    /// fetched, or a storage error if the manifest cannot be written. In
    /// both cases the generation is left unready.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        let name = self.config.cache_name.as_str();
        self.cache.open(name).await?;

        tracing::info!(cache = name, count = self.config.precache.len(), "pre-caching essential resources");
        let entries = try_join_all(self.config.precache.iter().map(|url| self.precache_one(url))).await?;

        self.cache.put_all(name, &entries).await?;
        self.cache.mark_ready(name).await?;

        let content = self.spawn_content_population();
        self.host.skip_waiting().await;

        Ok(InstallReport { cache_name: name.to_string(), precached: entries.len(), content })
    }

    async fn precache_one(&self, url: &Url) -> Result<(Url, Response), Error> {
        let response = self
            .fetcher
            .fetch(&Request::get(url.clone()))
            .await
            .map_err(|e| Error::PrecacheFailed { url: url.to_string(), reason: e.to_string() })?;

        if !response.ok() {
            return Err(Error::PrecacheFailed { url: url.to_string(), reason: format!("status {}", response.status) });
        }

        Ok((url.clone(), response))
    }

    fn spawn_content_population(&self) -> JoinHandle<ContentReport> {
        let this = self.clone();
        tokio::spawn(async move {
            let results = join_all(this.config.content.iter().map(|url| this.store_content(url))).await;

            let mut report = ContentReport::default();
            for (url, stored) in this.config.content.iter().zip(results) {
                if stored {
                    report.stored.push(url.clone());
                } else {
                    report.failed.push(url.clone());
                }
            }
            tracing::info!(stored = report.stored.len(), failed = report.failed.len(), "content documents cached");
            report
        })
    }

    async fn store_content(&self, url: &Url) -> bool {
        let response = match self.fetcher.fetch(&Request::get(url.clone())).await {
            Ok(response) if response.ok() => response,
            Ok(response) => {
                tracing::warn!(%url, status = response.status, "failed to cache content document");
                return false;
            }
            Err(e) => {
                tracing::warn!(%url, error = %e, "failed to cache content document");
                return false;
            }
        };

        match self.cache.put(&self.config.cache_name, url, &response).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(%url, error = %e, "failed to store content document");
                false
            }
        }
    }

    /// Drop superseded generations and claim clients.
    ///
    /// # Errors
    ///
    /// Fails only if generations cannot be listed or clients cannot be claimed.
    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        let current = self.config.cache_name.as_str();
        let stale: Vec<String> = self.cache.keys().await?.into_iter().filter(|n| n != current).collect();

        let results = join_all(stale.iter().map(|name| async move {
            tracing::info!(cache = %name, "deleting old cache");
            self.cache.delete(name).await
        }))
        .await;

        let mut report = ActivateReport { cache_name: current.to_string(), ..Default::default() };
        for (name, result) in stale.into_iter().zip(results) {
            match result {
                Ok(_) => report.deleted.push(name),
                Err(e) => {
                    tracing::warn!(cache = %name, error = %e, "failed to delete old cache");
                    report.failed.push(name);
                }
            }
        }

        self.host.claim_clients().await?;
        Ok(report)
    }
}
