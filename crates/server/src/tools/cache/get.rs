//! cache_get tool implementation.
//!
//! Retrieves a cached response by URL.

use std::collections::BTreeMap;

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use leaflet_client::WorkerConfig;
use leaflet_client::fetch::resolve;
use leaflet_core::{CacheDb, Error};

use crate::tools::json_result;

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// URL of the cached request. Relative URLs resolve against the site origin.
    pub url: String,

    /// Generation to read from (default: the current one).
    #[serde(default)]
    pub generation: Option<String>,

    /// Search every generation, oldest first, instead of a single one.
    #[serde(default)]
    pub search_all: bool,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize)]
pub struct CacheGetOutput {
    pub generation: String,
    pub url: String,
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
    pub response_url: Option<String>,
    pub stored_at: String,
}

/// Implementation of the cache_get tool.
pub async fn get_impl(cache: &CacheDb, config: &WorkerConfig, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let url = resolve(&config.origin, &params.url).map_err(|e| Error::InvalidUrl(format!("{}: {e}", params.url)))?;
    let entry = if params.search_all {
        cache
            .find_entry(&url)
            .await?
            .ok_or_else(|| Error::CacheMiss(url.to_string()))?
    } else {
        let generation = params.generation.as_deref().unwrap_or(&config.cache_name);
        if !cache.has_generation(generation).await? {
            return Err(Error::CacheMiss(format!("no cache generation named {generation}")).into());
        }
        cache
            .get_entry(generation, &url)
            .await?
            .ok_or_else(|| Error::CacheMiss(format!("{url} in {generation}")))?
    };

    let output = CacheGetOutput {
        body: String::from_utf8_lossy(&entry.body).into_owned(),
        generation: entry.generation,
        url: entry.url,
        status: entry.status,
        headers: entry.headers,
        response_url: entry.response_url,
        stored_at: entry.stored_at,
    };
    json_result(&output)
}
