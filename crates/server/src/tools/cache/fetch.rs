//! cache_fetch tool implementation.
//!
//! Routes a request through the cache controller, as a page fetch would be.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use showroom_client::fetch::{Destination, Method, RequestMode, header, resolve};
use showroom_client::{Request, ResourceClass, ServedFrom};

use crate::error::ToolError;
use crate::state::AppState;
use crate::tools::json_result;

/// Longest body returned inline, in bytes.
const MAX_BODY_PREVIEW: usize = 64 * 1024;

/// Parameters for the cache_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheFetchParams {
    /// Absolute URL, or a path resolved against the site origin (e.g. `/models/suv`).
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Request mode: `navigate`, `same-origin`, `no-cors` or `cors` (default).
    #[serde(default)]
    pub mode: Option<String>,

    /// Request destination: `document`, `script`, `style`, `image`, `font`, `manifest` or empty.
    #[serde(default)]
    pub destination: Option<String>,

    /// JSON body for non-GET requests.
    #[serde(default)]
    pub body: Option<String>,
}

fn default_method() -> String {
    "GET".into()
}

/// Output from the cache_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheFetchOutput {
    pub url: String,
    pub status: u16,
    pub served_from: ServedFrom,
    /// Resource class, when the controller intercepted the request.
    pub resource_class: Option<ResourceClass>,
    /// Cache backing the class, when intercepted.
    pub cache: Option<String>,
    pub content_type: Option<String>,
    pub cache_control: Option<String>,
    /// Body as text, cut to 64 KiB.
    pub body: String,
    pub body_truncated: bool,
}

fn parse_label<T: DeserializeOwned>(field: &str, value: &str) -> Result<T, ToolError> {
    serde_json::from_value(serde_json::Value::String(value.to_string()))
        .map_err(|_| ToolError::InvalidInput(format!("unknown {field}: {value}")))
}

fn build_request(state: &AppState, params: CacheFetchParams) -> Result<Request, ToolError> {
    if params.url.trim().is_empty() {
        return Err(ToolError::InvalidInput("url cannot be empty".into()));
    }

    let url = resolve(&state.controller.config().origin, &params.url)
        .map_err(|e| ToolError::InvalidInput(format!("{}: {e}", params.url)))?;
    let method = Method::from_bytes(params.method.to_ascii_uppercase().as_bytes())
        .map_err(|_| ToolError::InvalidInput(format!("invalid method: {}", params.method)))?;

    let mut request = match params.body {
        Some(body) => Request::post_json(url, body.into_bytes()),
        None => Request::get(url),
    };
    request.method = method;

    if let Some(mode) = params.mode.as_deref() {
        request = request.with_mode(parse_label::<RequestMode>("mode", mode)?);
    }
    if let Some(destination) = params.destination.as_deref() {
        request = request.with_destination(parse_label::<Destination>("destination", destination)?);
    }

    Ok(request)
}

/// Implementation of the cache_fetch tool.
pub async fn fetch_impl(state: &AppState, params: CacheFetchParams) -> Result<CallToolResult, McpError> {
    let request = build_request(state, params)?;
    let controller = &state.controller;

    let (resource_class, cache) = if controller.intercepts(&request).await {
        let class = controller.classifier().classify(&request);
        (Some(class), Some(controller.cache_name(class.cache_kind())))
    } else {
        (None, None)
    };

    let response = controller.handle_fetch(&request).await?;

    let body_truncated = response.body.len() > MAX_BODY_PREVIEW;
    let end = response.body.len().min(MAX_BODY_PREVIEW);
    let output = CacheFetchOutput {
        url: response.url.to_string(),
        status: response.status.as_u16(),
        served_from: response.served_from,
        resource_class,
        cache,
        content_type: response.header(header::CONTENT_TYPE).map(String::from),
        cache_control: response.header(header::CACHE_CONTROL).map(String::from),
        body: String::from_utf8_lossy(&response.body[..end]).into_owned(),
        body_truncated,
    };

    json_result(&output)
}
