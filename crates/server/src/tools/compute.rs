//! Compute catalog MCP tools.
//!
//! Each tool runs one catalog task through the [`Compute`](showroom_compute::Compute)
//! facade and reports whether it ran in the background or inline.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use showroom_compute::tasks::{AggregateInput, CompareInput, OptimizeInput, RecommendInput};

use crate::state::AppState;
use crate::tools::json_result;

pub async fn compare_impl(state: &AppState, input: CompareInput) -> Result<CallToolResult, McpError> {
    json_result(&state.compute.compare_vehicles(input).await)
}

pub async fn optimize_images_impl(state: &AppState, input: OptimizeInput) -> Result<CallToolResult, McpError> {
    json_result(&state.compute.optimize_images(input).await)
}

pub async fn recommend_impl(state: &AppState, input: RecommendInput) -> Result<CallToolResult, McpError> {
    json_result(&state.compute.recommend_vehicles(input).await)
}

pub async fn aggregate_impl(state: &AppState, input: AggregateInput) -> Result<CallToolResult, McpError> {
    json_result(&state.compute.aggregate_analytics(input).await)
}
