//! MCP tool implementations.
//!
//! This module contains all tools exposed by the leaflet server.

pub mod cache;
pub mod lifecycle;
pub mod messages;
pub mod worker_fetch;

#[cfg(test)]
pub(crate) mod testing;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

use leaflet_core::Error;

/// Pretty-print a tool output as the single text content of a result.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
