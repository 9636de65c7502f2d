//! Request DTOs for the tool server API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

use crate::tools::{ToolCall, ToolRequest};

fn first_page() -> usize {
    1
}

/// Request body for `POST /tools/call`
///
/// # Fields
/// - `call`: The tool and its arguments, tagged by `"tool"`
/// - `page`: 1-based page to render (default 1)
/// - `export_path`: Write the full dataset to this file instead
/// - `max_tokens`: Override the server's page budget
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallRequest {
    pub call: ToolCall,
    #[serde(default = "first_page")]
    pub page: usize,
    #[serde(default)]
    pub export_path: Option<String>,
    #[serde(default)]
    pub max_tokens: Option<usize>,
}

impl ToolCallRequest {
    /// Validates the presentation arguments
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.max_tokens == Some(0) {
            return Some("max_tokens must be positive".to_string());
        }
        if self
            .export_path
            .as_deref()
            .is_some_and(|path| path.trim().is_empty())
        {
            return Some("export_path must not be empty".to_string());
        }
        None
    }
}

impl From<ToolCallRequest> for ToolRequest {
    fn from(request: ToolCallRequest) -> Self {
        Self {
            call: request.call,
            page: request.page,
            export_path: request.export_path,
            max_tokens: request.max_tokens,
        }
    }
}
