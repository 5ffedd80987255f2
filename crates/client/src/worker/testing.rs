//! Test doubles shared by the worker tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use leaflet_core::{CacheDb, CacheStorage, Error, Request, Response};
use tokio::sync::Notify;
use url::Url;

use crate::fetch::Fetcher;

pub fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
}

enum Reply {
    Status(u16, String),
    Gated(String, Arc<Notify>),
}

/// Fetcher answering from a fixed table. Unknown URLs fail like a dropped connection.
#[derive(Default)]
pub struct StubFetcher {
    replies: HashMap<String, Reply>,
    calls: Mutex<HashMap<String, usize>>,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ok(self, target: &Url, body: &str) -> Self {
        self.status(target, 200, body)
    }

    pub fn status(mut self, target: &Url, status: u16, body: &str) -> Self {
        self.replies.insert(target.to_string(), Reply::Status(status, body.to_string()));
        self
    }

    /// Reply 200 with `body` only once `gate` is notified.
    pub fn gated(mut self, target: &Url, body: &str, gate: Arc<Notify>) -> Self {
        self.replies.insert(target.to_string(), Reply::Gated(body.to_string(), gate));
        self
    }

    pub fn calls(&self, target: &Url) -> usize {
        self.calls.lock().unwrap().get(target.as_str()).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let key = request.url.to_string();
        *self.calls.lock().unwrap().entry(key.clone()).or_default() += 1;

        match self.replies.get(&key) {
            Some(Reply::Status(status, body)) => Ok(Response::new(*status, body.clone()).with_url(request.url.clone())),
            Some(Reply::Gated(body, gate)) => {
                gate.notified().await;
                Ok(Response::new(200, body.clone()).with_url(request.url.clone()))
            }
            None => Err(Error::Network(format!("{key}: connection refused"))),
        }
    }
}

/// Storage whose every operation fails.
pub struct FailingStorage;

fn unavailable() -> Error {
    Error::CorruptEntry("storage unavailable".into())
}

#[async_trait]
impl CacheStorage for FailingStorage {
    async fn open(&self, _name: &str) -> Result<(), Error> {
        Err(unavailable())
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        Err(unavailable())
    }

    async fn delete(&self, _name: &str) -> Result<bool, Error> {
        Err(unavailable())
    }

    async fn lookup(&self, _name: &str, _url: &Url) -> Result<Option<Response>, Error> {
        Err(unavailable())
    }

    async fn put(&self, _name: &str, _url: &Url, _response: &Response) -> Result<(), Error> {
        Err(unavailable())
    }

    async fn put_all(&self, _name: &str, _entries: &[(Url, Response)]) -> Result<(), Error> {
        Err(unavailable())
    }

    async fn mark_ready(&self, _name: &str) -> Result<(), Error> {
        Err(unavailable())
    }
}

/// SQLite storage that refuses to delete one named generation.
pub struct StuckGeneration {
    pub inner: CacheDb,
    pub stuck: String,
}

#[async_trait]
impl CacheStorage for StuckGeneration {
    async fn open(&self, name: &str) -> Result<(), Error> {
        self.inner.open(name).await
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        self.inner.keys().await
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        if name == self.stuck {
            return Err(unavailable());
        }
        self.inner.delete(name).await
    }

    async fn lookup(&self, name: &str, url: &Url) -> Result<Option<Response>, Error> {
        self.inner.lookup(name, url).await
    }

    async fn put(&self, name: &str, url: &Url, response: &Response) -> Result<(), Error> {
        self.inner.put(name, url, response).await
    }

    async fn put_all(&self, name: &str, entries: &[(Url, Response)]) -> Result<(), Error> {
        self.inner.put_all(name, entries).await
    }

    async fn mark_ready(&self, name: &str) -> Result<(), Error> {
        self.inner.mark_ready(name).await
    }
}
