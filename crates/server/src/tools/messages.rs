//! worker_sync, worker_push and worker_notification_click tool implementations.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use leaflet_client::worker::{Notification, SyncOutcome};
use leaflet_client::{RecordingHost, Worker};
use leaflet_core::Error;

use super::json_result;

/// Parameters for the worker_sync tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerSyncParams {
    /// Sync tag, e.g. "sync-reading-progress".
    pub tag: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkerSyncOutput {
    pub tag: String,
    pub outcome: SyncOutcome,
}

/// Parameters for the worker_push tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerPushParams {
    /// Push message data as sent by the push service. Omit for an empty push.
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkerPushOutput {
    /// The notification shown, if any.
    pub notification: Option<Notification>,
}

/// Parameters for the worker_notification_click tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NotificationClickParams {
    /// Id returned by worker_push.
    pub id: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct NotificationClickOutput {
    pub id: u64,
    pub opened: String,
}

pub async fn sync_impl(worker: &Worker, params: WorkerSyncParams) -> Result<CallToolResult, McpError> {
    let outcome = worker.sync(&params.tag).await;
    json_result(&WorkerSyncOutput { tag: params.tag, outcome })
}

pub async fn push_impl(worker: &Worker, params: WorkerPushParams) -> Result<CallToolResult, McpError> {
    let notification = worker.push(params.data.as_deref()).await?;
    json_result(&WorkerPushOutput { notification })
}

/// Click a notification the host is still showing.
pub async fn notification_click_impl(
    worker: &Worker, host: &RecordingHost, params: NotificationClickParams,
) -> Result<CallToolResult, McpError> {
    let notification = host
        .notification(params.id)
        .await
        .ok_or_else(|| Error::InvalidInput(format!("no open notification with id {}", params.id)))?;

    let opened = worker.notification_click(&notification).await?;
    json_result(&NotificationClickOutput { id: params.id, opened: opened.to_string() })
}
