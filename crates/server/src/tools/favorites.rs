//! Favorites queue MCP tools.
//!
//! `favorites_queue` edits the offline favorites queue; `favorites_sync`
//! fires the background sync event that pushes it to the sync endpoint.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use showroom_client::controller::{FAVORITES_SYNC_TAG, SyncOutcome};

use crate::error::ToolError;
use crate::state::AppState;
use crate::tools::json_result;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum QueueAction {
    /// Queue a vehicle id for sync.
    Add,
    /// Remove a queued vehicle id.
    Remove,
    #[default]
    List,
}

/// Parameters for the favorites_queue tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FavoritesQueueParams {
    /// `add`, `remove` or `list` (default).
    #[serde(default)]
    pub action: QueueAction,

    /// Vehicle id, required for `add` and `remove`.
    #[serde(default)]
    pub vehicle_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FavoritesQueueOutput {
    pub queued: Vec<String>,
}

/// Implementation of the favorites_queue tool.
pub async fn queue_impl(state: &AppState, params: FavoritesQueueParams) -> Result<CallToolResult, McpError> {
    let controller = &state.controller;
    let vehicle_id = || {
        params
            .vehicle_id
            .as_deref()
            .ok_or_else(|| ToolError::InvalidInput("vehicle_id is required for add and remove".into()))
    };

    let queued = match params.action {
        QueueAction::Add => controller.queue_favorite(vehicle_id()?).await?,
        QueueAction::Remove => controller.dequeue_favorite(vehicle_id()?).await?,
        QueueAction::List => controller.queued_favorites().await?,
    };

    json_result(&FavoritesQueueOutput { queued })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FavoritesSyncOutput {
    #[serde(flatten)]
    pub outcome: SyncOutcome,
    /// Ids still queued after the attempt.
    pub remaining: Vec<String>,
}

/// Implementation of the favorites_sync tool.
pub async fn sync_impl(state: &AppState) -> Result<CallToolResult, McpError> {
    let controller = &state.controller;
    let outcome = controller.handle_sync(FAVORITES_SYNC_TAG).await?.unwrap_or(SyncOutcome::Idle);
    let remaining = controller.queued_favorites().await?;

    json_result(&FavoritesSyncOutput { outcome, remaining })
}
