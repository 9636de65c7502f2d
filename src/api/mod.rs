//! API Module
//!
//! HTTP handlers and routing for the tool server REST API.
//!
//! # Endpoints
//! - `POST /tools/call` - Run a tool call
//! - `GET /stats` - Get cache statistics
//! - `DELETE /cache` - Clear the cache
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
