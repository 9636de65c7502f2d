//! Tools Module
//!
//! Financial-data tool calls, the providers that answer them and the service
//! tying provider, cache and paginator together.

pub mod call;
mod export;
mod provider;
mod service;

pub use call::{FinancialType, HolderType, OptionType, RecommendationType, ToolCall};
pub use export::{export_json, DEFAULT_EXPORT_DIR};
pub use provider::{DataProvider, FetchError, FixtureProvider, StaticProvider};
pub use service::{CachedDataset, ToolRequest, ToolService};
