//! cache_list tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use serde::Serialize;

use leaflet_core::{CacheDb, Generation};

use crate::tools::json_result;

/// Output from the cache_list tool.
#[derive(Debug, Clone, Serialize)]
pub struct CacheListOutput {
    /// Generation the worker reads and writes.
    pub current: String,
    pub generations: Vec<Generation>,
}

pub async fn list_impl(cache: &CacheDb, current: &str) -> Result<CallToolResult, McpError> {
    let generations = cache.list_generations().await?;
    json_result(&CacheListOutput { current: current.to_string(), generations })
}
