//! worker_install and worker_activate tool implementations.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use serde::Serialize;

use leaflet_client::{Worker, WorkerState};

use super::json_result;

/// Output from the worker_install tool.
#[derive(Debug, Clone, Serialize)]
pub struct InstallOutput {
    pub cache_name: String,
    /// Manifest entries stored.
    pub precached: usize,
    /// Content documents still being cached in the background.
    pub content_pending: usize,
    pub state: WorkerState,
}

/// Output from the worker_activate tool.
#[derive(Debug, Clone, Serialize)]
pub struct ActivateOutput {
    pub cache_name: String,
    pub deleted: Vec<String>,
    pub failed: Vec<String>,
    pub state: WorkerState,
}

/// Implementation of the worker_install tool.
///
/// Content population keeps running after the result is returned.
pub async fn install_impl(worker: &Worker) -> Result<CallToolResult, McpError> {
    let report = worker.install().await?;

    let output = InstallOutput {
        cache_name: report.cache_name,
        precached: report.precached,
        content_pending: worker.config().content.len(),
        state: worker.state().await,
    };
    json_result(&output)
}

/// Implementation of the worker_activate tool.
pub async fn activate_impl(worker: &Worker) -> Result<CallToolResult, McpError> {
    let report = worker.activate().await?;

    let output = ActivateOutput {
        cache_name: report.cache_name,
        deleted: report.deleted,
        failed: report.failed,
        state: worker.state().await,
    };
    json_result(&output)
}
