//! Cache-first, network-first and stale-while-revalidate policies.
//!
//! Every policy reads and writes the current generation only. Cache errors
//! are logged and treated as a miss (reads) or dropped (writes) so a broken
//! store degrades to network-only behaviour instead of failing requests.

use std::sync::Arc;

use leaflet_core::{CacheStorage, Error, Request, Response};
use tokio::task::JoinHandle;
use url::Url;

use super::router::Strategy;
use crate::fetch::Fetcher;

/// Background refresh started by stale-while-revalidate.
pub type Refresh = JoinHandle<Result<Response, Error>>;

/// The three caching policies bound to one cache generation.
#[derive(Clone)]
pub struct Strategies {
    fetcher: Arc<dyn Fetcher>,
    cache: Arc<dyn CacheStorage>,
    cache_name: Arc<str>,
    offline_url: Url,
}

impl Strategies {
    pub fn new(
        fetcher: Arc<dyn Fetcher>, cache: Arc<dyn CacheStorage>, cache_name: impl Into<Arc<str>>, offline_url: Url,
    ) -> Self {
        Self { fetcher, cache, cache_name: cache_name.into(), offline_url }
    }

    /// Serve a request with the given policy.
    ///
    /// Only stale-while-revalidate can fail: when nothing is cached and the
    /// network is down, there is nothing to answer with.
    pub async fn serve(&self, strategy: Strategy, request: &Request) -> Result<Response, Error> {
        match strategy {
            Strategy::CacheFirst => Ok(self.cache_first(request).await),
            Strategy::NetworkFirst => Ok(self.network_first(request).await),
            Strategy::StaleWhileRevalidate => self.stale_while_revalidate(request).await,
        }
    }

    /// Cached copy if present; otherwise the network, storing ok responses.
    ///
    /// Any fetch error counts as offline, including `FetchTooLarge`: a
    /// completed response over the body cap is answered with 503 `Offline`.
    pub async fn cache_first(&self, request: &Request) -> Response {
        if let Some(cached) = self.lookup(&request.url).await {
            tracing::debug!(url = %request.url, "cache-first hit");
            return cached;
        }

        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if response.ok() {
                    self.store(&request.url, &response).await;
                }
                response
            }
            Err(e) => {
                tracing::info!(url = %request.url, error = %e, "cache-first miss while offline");
                Response::offline()
            }
        }
    }

    /// Network if reachable (refreshing the cache); otherwise the cached copy,
    /// the offline page for navigations, or the 503 response.
    ///
    /// A response over the body cap is a fetch error too, so it falls back
    /// to the cached copy like a dropped connection would.
    pub async fn network_first(&self, request: &Request) -> Response {
        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if response.ok() {
                    self.store(&request.url, &response).await;
                }
                response
            }
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "network-first falling back to cache");
                if let Some(cached) = self.lookup(&request.url).await {
                    return cached;
                }
                if request.is_navigation()
                    && let Some(page) = self.lookup(&self.offline_url).await
                {
                    return page;
                }
                Response::offline()
            }
        }
    }

    /// Cached copy immediately if present, refreshed in the background;
    /// otherwise wait for the network.
    pub async fn stale_while_revalidate(&self, request: &Request) -> Result<Response, Error> {
        let (response, _refresh) = self.serve_stale(request).await?;
        Ok(response)
    }

    /// Stale-while-revalidate that also hands back the pending refresh when a
    /// cached copy was served. Dropping the handle does not cancel the refresh.
    pub async fn serve_stale(&self, request: &Request) -> Result<(Response, Option<Refresh>), Error> {
        let refresh = self.spawn_refresh(request.clone());

        match self.lookup(&request.url).await {
            Some(cached) => {
                tracing::debug!(url = %request.url, "serving stale copy while revalidating");
                Ok((cached, Some(refresh)))
            }
            None => {
                let response = refresh.await.map_err(|e| Error::Task(e.to_string()))??;
                Ok((response, None))
            }
        }
    }

    fn spawn_refresh(&self, request: Request) -> Refresh {
        let this = self.clone();
        tokio::spawn(async move {
            let response = this.fetcher.fetch(&request).await.inspect_err(|e| {
                tracing::debug!(url = %request.url, error = %e, "revalidation failed");
            })?;
            if response.ok() {
                this.store(&request.url, &response).await;
            }
            Ok(response)
        })
    }

    async fn lookup(&self, url: &Url) -> Option<Response> {
        match self.cache.lookup(&self.cache_name, url).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(%url, error = %e, "cache read failed; treating as miss");
                None
            }
        }
    }

    async fn store(&self, url: &Url, response: &Response) {
        if let Err(e) = self.cache.put(&self.cache_name, url, response).await {
            tracing::warn!(%url, error = %e, "cache write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::worker::testing::{FailingStorage, StubFetcher, url};
    use leaflet_core::CacheDb;
    use tokio::time::timeout;

    const CACHE: &str = "beautifulmind-v1";

    async fn setup(fetcher: StubFetcher) -> (Strategies, Arc<StubFetcher>, CacheDb) {
        let db = CacheDb::open_in_memory().await.unwrap();
        let fetcher = Arc::new(fetcher);
        let strategies =
            Strategies::new(fetcher.clone(), Arc::new(db.clone()), CACHE, url("https://read.example.com/offline.html"));
        (strategies, fetcher, db)
    }

    #[tokio::test]
    async fn test_cache_first_hit_skips_network() {
        let (strategies, fetcher, db) = setup(StubFetcher::new()).await;
        let css = url("https://read.example.com/css/common.css");
        let png = url("https://read.example.com/img/cover.png");
        db.put_entry(CACHE, &css, &Response::new(200, "cached css")).await.unwrap();
        db.put_entry(CACHE, &png, &Response::new(200, "cached png")).await.unwrap();

        let response = strategies.cache_first(&Request::get(css.clone())).await;
        assert_eq!(response.text(), "cached css");
        let response = strategies.cache_first(&Request::get(png.clone())).await;
        assert_eq!(response.text(), "cached png");

        assert_eq!(fetcher.calls(&css), 0);
        assert_eq!(fetcher.calls(&png), 0);
    }

    #[tokio::test]
    async fn test_cache_first_miss_stores_ok_response() {
        let js = url("https://read.example.com/js/common.js");
        let (strategies, fetcher, db) = setup(StubFetcher::new().ok(&js, "network js")).await;

        let response = strategies.cache_first(&Request::get(js.clone())).await;
        assert_eq!(response.text(), "network js");
        assert_eq!(fetcher.calls(&js), 1);

        let stored = db.get_entry(CACHE, &js).await.unwrap().unwrap();
        assert_eq!(stored.into_response().text(), "network js");
    }

    #[tokio::test]
    async fn test_cache_first_does_not_store_errors() {
        let gif = url("https://read.example.com/img/missing.gif");
        let (strategies, _fetcher, db) = setup(StubFetcher::new().status(&gif, 404, "not found")).await;

        let response = strategies.cache_first(&Request::get(gif.clone())).await;
        assert_eq!(response.status, 404);
        assert!(db.get_entry(CACHE, &gif).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cache_first_offline() {
        let (strategies, _fetcher, _db) = setup(StubFetcher::new()).await;

        let response = strategies.cache_first(&Request::get(url("https://read.example.com/a.css"))).await;
        assert_eq!(response.status, 503);
        assert_eq!(response.text(), "Offline");
    }

    #[tokio::test]
    async fn test_network_first_populates_cache() {
        let page = url("https://read.example.com/reader.html");
        let (strategies, fetcher, db) = setup(StubFetcher::new().ok(&page, "fresh page")).await;
        db.put_entry(CACHE, &page, &Response::new(200, "old page")).await.unwrap();

        let response = strategies.network_first(&Request::navigate(page.clone())).await;
        assert_eq!(response.text(), "fresh page");
        assert_eq!(fetcher.calls(&page), 1);

        let stored = db.get_entry(CACHE, &page).await.unwrap().unwrap();
        assert_eq!(stored.into_response().text(), "fresh page");
    }

    #[tokio::test]
    async fn test_network_first_returns_non_ok_unstored() {
        let page = url("https://read.example.com/gone.html");
        let (strategies, _fetcher, db) = setup(StubFetcher::new().status(&page, 500, "boom")).await;
        db.put_entry(CACHE, &page, &Response::new(200, "cached")).await.unwrap();

        let response = strategies.network_first(&Request::get(page.clone())).await;
        assert_eq!(response.status, 500);
        let stored = db.get_entry(CACHE, &page).await.unwrap().unwrap();
        assert_eq!(stored.into_response().text(), "cached");
    }

    #[tokio::test]
    async fn test_network_first_falls_back_to_cache() {
        let root = url("https://read.example.com/");
        let (strategies, fetcher, db) = setup(StubFetcher::new()).await;
        db.put_entry(CACHE, &root, &Response::new(200, "cached root")).await.unwrap();

        let response = strategies.network_first(&Request::navigate(root.clone())).await;
        assert_eq!(response.text(), "cached root");
        assert_eq!(fetcher.calls(&root), 1);
    }

    #[tokio::test]
    async fn test_network_first_navigation_gets_offline_page() {
        let (strategies, _fetcher, db) = setup(StubFetcher::new()).await;
        db.put_entry(CACHE, &url("https://read.example.com/offline.html"), &Response::new(200, "you are offline"))
            .await
            .unwrap();

        let response = strategies
            .network_first(&Request::navigate(url("https://read.example.com/md/07-happiness.md")))
            .await;
        assert_eq!(response.text(), "you are offline");
    }

    #[tokio::test]
    async fn test_network_first_navigation_without_offline_page() {
        let (strategies, _fetcher, _db) = setup(StubFetcher::new()).await;

        let response = strategies
            .network_first(&Request::navigate(url("https://read.example.com/index.html")))
            .await;
        assert_eq!(response.status, 503);
        assert_eq!(response.text(), "Offline");
    }

    #[tokio::test]
    async fn test_network_first_subresource_never_gets_offline_page() {
        let (strategies, _fetcher, db) = setup(StubFetcher::new()).await;
        db.put_entry(CACHE, &url("https://read.example.com/offline.html"), &Response::new(200, "you are offline"))
            .await
            .unwrap();

        let response = strategies
            .network_first(&Request::get(url("https://read.example.com/md/06-communication.md")))
            .await;
        assert_eq!(response.status, 503);
    }

    #[tokio::test]
    async fn test_stale_while_revalidate_serves_cache_without_waiting() {
        let manifest = url("https://read.example.com/manifest.json");
        let gate = Arc::new(tokio::sync::Notify::new());
        let (strategies, _fetcher, db) =
            setup(StubFetcher::new().gated(&manifest, "fresh manifest", gate.clone())).await;
        db.put_entry(CACHE, &manifest, &Response::new(200, "stale manifest")).await.unwrap();

        let (response, refresh) = timeout(Duration::from_secs(5), strategies.serve_stale(&Request::get(manifest.clone())))
            .await
            .expect("stale copy must not wait on the network")
            .unwrap();
        assert_eq!(response.text(), "stale manifest");

        let stored = db.get_entry(CACHE, &manifest).await.unwrap().unwrap();
        assert_eq!(stored.into_response().text(), "stale manifest");

        gate.notify_one();
        let refreshed = refresh.expect("refresh handle").await.unwrap().unwrap();
        assert_eq!(refreshed.text(), "fresh manifest");

        let stored = db.get_entry(CACHE, &manifest).await.unwrap().unwrap();
        assert_eq!(stored.into_response().text(), "fresh manifest");
    }

    #[tokio::test]
    async fn test_stale_while_revalidate_miss_waits_for_network() {
        let api = url("https://read.example.com/api/toc");
        let (strategies, _fetcher, db) = setup(StubFetcher::new().ok(&api, "toc")).await;

        let (response, refresh) = strategies.serve_stale(&Request::get(api.clone())).await.unwrap();
        assert_eq!(response.text(), "toc");
        assert!(refresh.is_none());
        assert!(db.get_entry(CACHE, &api).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_stale_while_revalidate_miss_offline_propagates() {
        let (strategies, _fetcher, _db) = setup(StubFetcher::new()).await;

        let result = strategies
            .stale_while_revalidate(&Request::get(url("https://read.example.com/api/toc")))
            .await;
        assert!(matches!(result, Err(Error::Network(_))));
    }

    #[tokio::test]
    async fn test_stale_while_revalidate_offline_keeps_cached_copy() {
        let api = url("https://read.example.com/api/toc");
        let (strategies, _fetcher, db) = setup(StubFetcher::new()).await;
        db.put_entry(CACHE, &api, &Response::new(200, "cached toc")).await.unwrap();

        let (response, refresh) = strategies.serve_stale(&Request::get(api.clone())).await.unwrap();
        assert_eq!(response.text(), "cached toc");
        assert!(refresh.unwrap().await.unwrap().is_err());

        let stored = db.get_entry(CACHE, &api).await.unwrap().unwrap();
        assert_eq!(stored.into_response().text(), "cached toc");
    }

    #[tokio::test]
    async fn test_broken_cache_degrades_to_network() {
        let css = url("https://read.example.com/css/common.css");
        let fetcher = Arc::new(StubFetcher::new().ok(&css, "network css"));
        let strategies = Strategies::new(
            fetcher.clone(),
            Arc::new(FailingStorage),
            CACHE,
            url("https://read.example.com/offline.html"),
        );

        let response = strategies.cache_first(&Request::get(css.clone())).await;
        assert_eq!(response.text(), "network css");
        assert_eq!(fetcher.calls(&css), 1);
    }
}
