//! Pagination Module
//!
//! Fits a dataset of any size into pages of bounded token count and renders
//! each page as plain text with paging metadata and navigation hints.

mod dataset;
pub mod format;
mod paginator;
mod sizing;


// Re-export public types
pub use dataset::{DataKind, Dataset, Table, VALUE_COLUMN};
pub use paginator::{PageRequest, PaginationResult, Paginator};
pub use sizing::{PageMeasure, SizingStrategy, DEFAULT_OVERHEAD_TOKENS};

// == Public Constants ==
/// Default token budget for one page
pub const DEFAULT_MAX_TOKENS: usize = 6000;
/// Default cap on table column width, in characters
pub const DEFAULT_MAX_COLUMN_WIDTH: usize = 15;
/// Smallest usable column width: one character plus the ellipsis
pub const MIN_COLUMN_WIDTH: usize = 4;
/// Width of the horizontal rules framing every page
pub const RULE_WIDTH: usize = 70;

/// Rough token count of `text`: one token per four characters.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / 4
}

pub(crate) fn heavy_rule() -> String {
    "═".repeat(RULE_WIDTH)
}

pub(crate) fn light_rule() -> String {
    "─".repeat(RULE_WIDTH)
}
