//! cache_activate tool implementation.
//!
//! Moves the controller to the active state and prunes stale cache versions.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use serde::{Deserialize, Serialize};
use showroom_client::controller::{ControllerMessage, Lifecycle};
use showroom_core::CacheSummary;

use crate::state::AppState;
use crate::tools::json_result;

/// Output from the cache_activate tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheActivateOutput {
    pub state: Lifecycle,
    /// Caches deleted because they carry another version tag.
    pub deleted_caches: Vec<String>,
    pub caches: Vec<CacheSummary>,
}

/// Implementation of the cache_activate tool.
///
/// A fresh or redundant controller is installed first; an installed one is
/// told to skip waiting; an active one re-runs stale cache cleanup.
pub async fn activate_impl(state: &AppState) -> Result<CallToolResult, McpError> {
    let controller = &state.controller;

    let deleted_caches = match controller.state().await {
        Lifecycle::Installed => {
            controller.handle_message(ControllerMessage::SkipWaiting).await?;
            Vec::new()
        }
        Lifecycle::Activated => controller.activate().await?,
        _ => controller.start().await?,
    };

    let output =
        CacheActivateOutput { state: controller.state().await, deleted_caches, caches: controller.cache_summary().await? };
    json_result(&output)
}
