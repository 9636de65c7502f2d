//! fin_pager - Cached, token-bounded financial data tools
//!
//! Fetches financial datasets through a pluggable provider, caches them with
//! TTL expiration and LRU eviction, and renders them as pages of plain text
//! that fit a language model's token budget.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod pagination;
pub mod tools;

pub use api::{create_router, AppState};
pub use config::Config;
pub use error::{Result, ToolError};
pub use tools::{ToolCall, ToolRequest, ToolService};
