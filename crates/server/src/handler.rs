//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the worker events and cache inspection tools.
use std::sync::Arc;

use crate::tools::cache::{CacheGetParams, get_impl, list_impl};
use crate::tools::lifecycle::{activate_impl, install_impl};
use crate::tools::messages::{
    NotificationClickParams, WorkerPushParams, WorkerSyncParams, notification_click_impl, push_impl, sync_impl,
};
use crate::tools::worker_fetch::{WorkerFetchParams, fetch_impl};

use leaflet_client::{RecordingHost, Worker};
use leaflet_core::CacheDb;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for leaflet.
#[derive(Clone)]
pub struct LeafletServer {
    worker: Arc<Worker>,
    host: Arc<RecordingHost>,
    cache: CacheDb,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl LeafletServer {
    /// Create a new server handler around a worker and the host it reports to.
    pub fn new(worker: Arc<Worker>, host: Arc<RecordingHost>, cache: CacheDb) -> Self {
        Self { worker, host, cache, tool_router: Self::tool_router() }
    }

    #[tool(
        description = "Deliver the install event: precache the manifest into the current cache generation and start caching content documents in the background."
    )]
    async fn worker_install(&self) -> Result<CallToolResult, McpError> {
        install_impl(&self.worker).await
    }

    #[tool(description = "Deliver the activate event: delete superseded cache generations and claim clients.")]
    async fn worker_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.worker).await
    }

    /// Route a request through the worker.
    ///
    /// Relative URLs resolve against the configured site origin.
    #[tool(
        description = "Deliver a fetch event. Returns whether the worker intercepted the request, the caching strategy used, and the response."
    )]
    async fn worker_fetch(&self, params: Parameters<WorkerFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.worker, params.0).await
    }

    #[tool(description = "Deliver a background sync event with the given tag.")]
    async fn worker_sync(&self, params: Parameters<WorkerSyncParams>) -> Result<CallToolResult, McpError> {
        sync_impl(&self.worker, params.0).await
    }

    #[tool(description = "Deliver a push message. The data is a JSON object with title, and optional body and url.")]
    async fn worker_push(&self, params: Parameters<WorkerPushParams>) -> Result<CallToolResult, McpError> {
        push_impl(&self.worker, params.0).await
    }

    #[tool(description = "Click an open notification by id: closes it and opens its target URL.")]
    async fn worker_notification_click(
        &self, params: Parameters<NotificationClickParams>,
    ) -> Result<CallToolResult, McpError> {
        notification_click_impl(&self.worker, &self.host, params.0).await
    }

    #[tool(description = "List cache generations with their entry counts and readiness.")]
    async fn cache_list(&self) -> Result<CallToolResult, McpError> {
        list_impl(&self.cache, &self.worker.config().cache_name).await
    }

    #[tool(description = "Read a cached response by URL from the current or a named cache generation.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(&self.cache, self.worker.config(), params.0).await
    }
}

impl ServerHandler for LeafletServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "leaflet".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
