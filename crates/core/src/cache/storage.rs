//! Storage seam used by the worker.
//!
//! The worker only needs a handful of bucket operations; keeping them behind
//! a trait lets tests wrap or replace the SQLite backend.

use async_trait::async_trait;
use url::Url;

use super::connection::CacheDb;
use crate::Error;
use crate::http::Response;

/// Named cache generations holding request/response pairs.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Create the generation if absent.
    async fn open(&self, name: &str) -> Result<(), Error>;

    /// Names of all existing generations.
    async fn keys(&self) -> Result<Vec<String>, Error>;

    /// Delete a generation with all its entries. Returns false if it didn't exist.
    async fn delete(&self, name: &str) -> Result<bool, Error>;

    /// Look up a stored response in one generation.
    async fn lookup(&self, name: &str, url: &Url) -> Result<Option<Response>, Error>;

    /// Store a response, replacing any prior entry for the same URL.
    async fn put(&self, name: &str, url: &Url, response: &Response) -> Result<(), Error>;

    /// Store every response or none of them.
    async fn put_all(&self, name: &str, entries: &[(Url, Response)]) -> Result<(), Error>;

    /// Flag a generation as fully populated.
    async fn mark_ready(&self, name: &str) -> Result<(), Error>;
}

#[async_trait]
impl CacheStorage for CacheDb {
    async fn open(&self, name: &str) -> Result<(), Error> {
        if self.open_generation(name).await? {
            tracing::debug!(generation = name, "created cache generation");
        }
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        self.generation_names().await
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        self.delete_generation(name).await
    }

    async fn lookup(&self, name: &str, url: &Url) -> Result<Option<Response>, Error> {
        Ok(self.get_entry(name, url).await?.map(|entry| entry.into_response()))
    }

    async fn put(&self, name: &str, url: &Url, response: &Response) -> Result<(), Error> {
        self.put_entry(name, url, response).await
    }

    async fn put_all(&self, name: &str, entries: &[(Url, Response)]) -> Result<(), Error> {
        self.put_entries(name, entries).await
    }

    async fn mark_ready(&self, name: &str) -> Result<(), Error> {
        self.mark_generation_ready(name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trait_object_roundtrip() {
        let storage: Box<dyn CacheStorage> = Box::new(CacheDb::open_in_memory().await.unwrap());
        let target = Url::parse("https://example.com/manifest.json").unwrap();

        storage.open("v1").await.unwrap();
        storage.put("v1", &target, &Response::new(200, "{}")).await.unwrap();

        let hit = storage.lookup("v1", &target).await.unwrap().unwrap();
        assert_eq!(hit.text(), "{}");
        assert_eq!(storage.keys().await.unwrap(), vec!["v1".to_string()]);
    }
}
