//! worker_fetch tool implementation.
//!
//! Delivers one fetch event to the worker and reports what it did with it.

use std::collections::BTreeMap;

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use leaflet_client::fetch::resolve;
use leaflet_client::{Decline, FetchOutcome, ResourceKind, Strategy, Worker};
use leaflet_core::{Error, Request, RequestMode};

use super::json_result;

/// Input parameters for worker_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerFetchParams {
    /// URL to request. Relative URLs resolve against the site origin.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default)]
    pub method: Option<String>,

    /// Request mode: "navigate", "same-origin", "no-cors" or "cors" (default).
    #[serde(default)]
    pub mode: Option<RequestMode>,
}

/// Output structure for worker_fetch tool.
#[derive(Debug, Clone, Serialize)]
pub struct WorkerFetchOutput {
    pub url: String,
    /// False when the request was left to the platform.
    pub intercepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declined: Option<Decline>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ResourceKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<Strategy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<ResponseOutput>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseOutput {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    /// Body decoded as UTF-8, lossily.
    pub body: String,
}

/// Implementation of the worker_fetch tool.
pub async fn fetch_impl(worker: &Worker, params: WorkerFetchParams) -> Result<CallToolResult, McpError> {
    if params.url.trim().is_empty() {
        return Err(Error::InvalidInput("url cannot be empty".into()).into());
    }

    let url = resolve(&worker.config().origin, &params.url)
        .map_err(|e| Error::InvalidUrl(format!("{}: {e}", params.url)))?;
    let method = params.method.as_deref().unwrap_or("GET");
    let request = Request::new(url, method, params.mode.unwrap_or_default());

    let output = match worker.handle_fetch(&request).await? {
        FetchOutcome::Declined(decline) => WorkerFetchOutput {
            url: request.url.to_string(),
            intercepted: false,
            declined: Some(decline),
            kind: None,
            strategy: None,
            response: None,
        },
        FetchOutcome::Responded { kind, strategy, response } => WorkerFetchOutput {
            url: request.url.to_string(),
            intercepted: true,
            declined: None,
            kind: Some(kind),
            strategy: Some(strategy),
            response: Some(ResponseOutput { status: response.status, body: response.text(), headers: response.headers }),
        },
    };

    json_result(&output)
}
