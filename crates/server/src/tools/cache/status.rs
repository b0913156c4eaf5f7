//! cache_status tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use serde::{Deserialize, Serialize};
use showroom_client::controller::Lifecycle;
use showroom_compute::Capability;
use showroom_core::CacheSummary;

use crate::state::AppState;
use crate::tools::json_result;

/// Output from the cache_status tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStatusOutput {
    pub version: String,
    pub state: Lifecycle,
    pub controls_clients: bool,
    pub caches: Vec<CacheSummary>,
    pub queued_favorites: usize,
    pub compute: ComputeStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputeStatus {
    pub capability: Capability,
    pub ready: bool,
    pub pending_tasks: usize,
}

/// Implementation of the cache_status tool.
pub async fn status_impl(state: &AppState) -> Result<CallToolResult, McpError> {
    let controller = &state.controller;
    let dispatcher = state.compute.dispatcher();

    let output = CacheStatusOutput {
        version: controller.config().version.clone(),
        state: controller.state().await,
        controls_clients: controller.controls_clients(),
        caches: controller.cache_summary().await?,
        queued_favorites: controller.queued_favorites().await?.len(),
        compute: ComputeStatus {
            capability: state.compute.capability(),
            ready: dispatcher.is_some_and(|d| d.is_ready()),
            pending_tasks: dispatcher.map_or(0, |d| d.pending_count()),
        },
    };

    json_result(&output)
}
