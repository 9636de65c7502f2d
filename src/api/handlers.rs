//! API Handlers
//!
//! HTTP request handlers for each tool server endpoint.

use std::sync::Arc;

use axum::{extract::State, Json};
use tracing::debug;

use crate::config::Config;
use crate::error::{Result, ToolError};
use crate::models::{ClearResponse, HealthResponse, StatsResponse, ToolCallRequest};
use crate::tools::{DataProvider, ToolRequest, ToolService};

/// Application state shared across all handlers.
///
/// Holds the tool service; its cache is shared by every clone.
#[derive(Clone)]
pub struct AppState {
    pub service: ToolService,
}

impl AppState {
    /// Creates a new AppState around the given service.
    pub fn new(service: ToolService) -> Self {
        Self { service }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Builds the shared cache and paginator from the Config.
    pub fn from_config(config: &Config, provider: Arc<dyn DataProvider>) -> Self {
        Self::new(ToolService::from_config(config, provider))
    }
}

/// Handler for POST /tools/call
///
/// Runs a tool call and returns the rendered page (or export confirmation)
/// as plain text.
pub async fn tool_call_handler(
    State(state): State<AppState>,
    Json(req): Json<ToolCallRequest>,
) -> Result<String> {
    if let Some(error_msg) = req.validate() {
        return Err(ToolError::InvalidArgument(error_msg));
    }

    debug!(tool = req.call.operation(), page = req.page, "tool call received");
    state.service.call(&ToolRequest::from(req)).await
}

/// Handler for GET /stats
///
/// Returns current cache statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.service.cache().stats().await))
}

/// Handler for DELETE /cache
///
/// Drops every cached dataset and resets the counters.
pub async fn clear_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    state.service.cache().clear().await;
    Json(ClearResponse::new())
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
