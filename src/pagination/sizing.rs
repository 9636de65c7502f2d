//! Page Sizing Module
//!
//! Decides how many items go on one page so the rendered text stays within a
//! token budget.

use std::fmt;
use std::str::FromStr;

/// Tokens reserved for the page envelope by the fixed-estimate strategy
pub const DEFAULT_OVERHEAD_TOKENS: usize = 500;

/// The adaptive strategy keeps a page at or below 4/5 of the budget.
const SAFETY_NUMERATOR: usize = 4;
const SAFETY_DENOMINATOR: usize = 5;

// == Page Measure ==
/// Measures candidate pages for a sizing strategy.
pub trait PageMeasure {
    /// Number of items in the whole dataset
    fn total_items(&self) -> usize;

    /// Estimated tokens of the content block alone holding the first `items`
    /// items.
    fn content_tokens(&self, items: usize) -> usize;

    /// Estimated tokens of complete page `page` (1-based) when every page
    /// holds `items` items, envelope included.
    fn page_tokens(&self, items: usize, page: usize) -> usize;
}

/// True when every page of `items` items passes `within`. Stops at the first
/// page that does not.
fn every_page(measure: &impl PageMeasure, items: usize, within: impl Fn(usize) -> bool) -> bool {
    let pages = measure.total_items().div_ceil(items.max(1));
    (1..=pages).all(|page| within(measure.page_tokens(items, page)))
}

// == Sizing Strategy ==
/// How items per page is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizingStrategy {
    /// Divide the budget left after a fixed overhead by the cost of one item,
    /// then halve while some page still exceeds the budget.
    FixedEstimate { overhead_tokens: usize },
    /// Start from the whole dataset and halve until every page fits in 80% of
    /// the budget.
    AdaptiveHalving,
}

impl Default for SizingStrategy {
    fn default() -> Self {
        SizingStrategy::AdaptiveHalving
    }
}

impl SizingStrategy {
    pub fn fixed() -> Self {
        SizingStrategy::FixedEstimate {
            overhead_tokens: DEFAULT_OVERHEAD_TOKENS,
        }
    }

    /// Items per page for the measured dataset. Always at least 1 and never
    /// more than the dataset holds, unless the dataset is empty.
    pub fn items_per_page(&self, measure: &impl PageMeasure, max_tokens: usize) -> usize {
        let total = measure.total_items();
        if total == 0 {
            return 1;
        }

        match *self {
            SizingStrategy::FixedEstimate { overhead_tokens } => {
                let per_item = measure.content_tokens(1).max(1);
                let available = max_tokens.saturating_sub(overhead_tokens);
                let estimate = (available / per_item).clamp(1, total);
                halve_until(measure, estimate, |tokens| tokens <= max_tokens)
            }
            SizingStrategy::AdaptiveHalving => {
                halve_until(measure, total, |tokens| within_safety_margin(tokens, max_tokens))
            }
        }
    }
}

fn halve_until(measure: &impl PageMeasure, start: usize, within: impl Fn(usize) -> bool) -> usize {
    let mut items = start;
    while items > 1 && !every_page(measure, items, &within) {
        items /= 2;
    }
    items
}

fn within_safety_margin(tokens: usize, max_tokens: usize) -> bool {
    tokens.saturating_mul(SAFETY_DENOMINATOR) <= max_tokens.saturating_mul(SAFETY_NUMERATOR)
}

impl fmt::Display for SizingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizingStrategy::FixedEstimate { .. } => f.write_str("fixed"),
            SizingStrategy::AdaptiveHalving => f.write_str("adaptive"),
        }
    }
}

impl FromStr for SizingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "adaptive" => Ok(SizingStrategy::AdaptiveHalving),
            "fixed" => Ok(SizingStrategy::fixed()),
            other => Err(format!("unknown page sizing strategy '{}'", other)),
        }
    }
}
