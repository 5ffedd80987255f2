//! Worker fixtures for the tool tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use leaflet_client::{Fetcher, RecordingHost, Worker, WorkerConfig};
use leaflet_core::{AppConfig, CacheDb, Error, Request, Response};
use rmcp::model::CallToolResult;

pub const ORIGIN: &str = "https://read.example.com";

/// Fetcher serving a fixed set of bodies; everything else is unreachable.
#[derive(Default)]
pub struct SiteFetcher {
    pages: HashMap<String, String>,
}

impl SiteFetcher {
    pub fn page(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(url.to_string(), body.to_string());
        self
    }
}

#[async_trait]
impl Fetcher for SiteFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        match self.pages.get(request.url.as_str()) {
            Some(body) => Ok(Response::new(200, body.clone()).with_header("content-type", "text/plain")),
            None => Err(Error::Network(format!("{}: unreachable", request.url))),
        }
    }
}

/// A site whose manifest is `/` and `/offline.html`, plus one chapter.
pub fn site() -> SiteFetcher {
    SiteFetcher::default()
        .page("https://read.example.com/", "home")
        .page("https://read.example.com/offline.html", "offline page")
        .page("https://read.example.com/md/10-preface.md", "# Preface")
}

pub struct Fixture {
    pub worker: Arc<Worker>,
    pub host: Arc<RecordingHost>,
    pub cache: CacheDb,
}

pub async fn fixture(fetcher: SiteFetcher) -> Fixture {
    let app = AppConfig {
        origin: ORIGIN.into(),
        precache_urls: vec!["/".into(), "/offline.html".into()],
        content_urls: vec!["/md/10-preface.md".into()],
        ..Default::default()
    };
    let config = WorkerConfig::from_app_config(&app).unwrap();
    let cache = CacheDb::open_in_memory().await.unwrap();
    let host = Arc::new(RecordingHost::new());
    let worker = Worker::new(config, Arc::new(fetcher), Arc::new(cache.clone()), host.clone());
    Fixture { worker: Arc::new(worker), host, cache }
}

/// Parse the JSON text content of a tool result.
pub fn output(result: &CallToolResult) -> serde_json::Value {
    let text = result.content[0].as_text().unwrap();
    serde_json::from_str(&text.text).unwrap()
}
