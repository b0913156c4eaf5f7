//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use crate::state::AppState;
use crate::tools::cache::{CacheFetchParams, activate_impl, fetch_impl, status_impl};
use crate::tools::compute::{aggregate_impl, compare_impl, optimize_images_impl, recommend_impl};
use crate::tools::favorites::{FavoritesQueueParams, queue_impl, sync_impl};

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
use showroom_compute::tasks::{AggregateInput, CompareInput, OptimizeInput, RecommendInput};

/// The main MCP server handler for showroom.
#[derive(Clone)]
pub struct ShowroomServer {
    state: Arc<AppState>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl ShowroomServer {
    /// Create a new server handler.
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state, tool_router: Self::tool_router() }
    }

    #[tool(
        description = "Request a URL or site path through the offline cache controller. Reports status, whether it was served from network, cache or an offline placeholder, and the resource class and cache used."
    )]
    async fn cache_fetch(&self, params: Parameters<CacheFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.state, params.0).await
    }

    #[tool(description = "Install and activate the cache controller, deleting caches from other versions.")]
    async fn cache_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.state).await
    }

    #[tool(description = "Show controller state, named caches with entry counts, queued favorites and compute status.")]
    async fn cache_status(&self) -> Result<CallToolResult, McpError> {
        status_impl(&self.state).await
    }

    #[tool(description = "Add, remove or list vehicle ids in the offline favorites queue.")]
    async fn favorites_queue(&self, params: Parameters<FavoritesQueueParams>) -> Result<CallToolResult, McpError> {
        queue_impl(&self.state, params.0).await
    }

    #[tool(description = "Push queued favorites to the sync endpoint. The queue is kept when the push fails.")]
    async fn favorites_sync(&self) -> Result<CallToolResult, McpError> {
        sync_impl(&self.state).await
    }

    #[tool(description = "Score vehicles from 0 to 100 on price, fuel efficiency, performance, safety and technology.")]
    async fn compare_vehicles(&self, params: Parameters<CompareInput>) -> Result<CallToolResult, McpError> {
        compare_impl(&self.state, params.0).await
    }

    #[tool(description = "Pick image quality and width for a network speed and placement, and rewrite image URLs.")]
    async fn optimize_images(&self, params: Parameters<OptimizeInput>) -> Result<CallToolResult, McpError> {
        optimize_images_impl(&self.state, params.0).await
    }

    #[tool(description = "Rank vehicles within a budget by preference matches. Returns the top six with reasons.")]
    async fn recommend_vehicles(&self, params: Parameters<RecommendInput>) -> Result<CallToolResult, McpError> {
        recommend_impl(&self.state, params.0).await
    }

    #[tool(description = "Aggregate analytics events into page views, interactions, a conversion funnel and popularity.")]
    async fn aggregate_analytics(&self, params: Parameters<AggregateInput>) -> Result<CallToolResult, McpError> {
        aggregate_impl(&self.state, params.0).await
    }
}

impl ServerHandler for ShowroomServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "showroom".into(),
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
