//! Paginator Module
//!
//! Chooses a page size, slices the dataset and wraps the page in its
//! envelope.

use std::ops::Range;
use std::time::Duration;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use super::format::{column_widths, format_key_value, format_table, group_digits};
use super::{
    estimate_tokens, heavy_rule, light_rule, Dataset, PageMeasure, SizingStrategy, Table,
    DEFAULT_MAX_COLUMN_WIDTH, DEFAULT_MAX_TOKENS, MIN_COLUMN_WIDTH,
};
use crate::error::{Result, ToolError};

const NO_DATA: &str = "No data available";
/// Upper bound on re-renders while settling the token line
const MAX_TOKEN_PASSES: usize = 4;

// == Page Request ==
/// What to render: which page, under which budget, with which header.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    /// 1-based page number; out-of-range values are clamped
    pub page: usize,
    pub max_tokens: usize,
    pub title: String,
    /// Age of the cached dataset, `None` when freshly fetched
    pub cache_age: Option<Duration>,
}

impl PageRequest {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            page: 1,
            max_tokens: DEFAULT_MAX_TOKENS,
            title: title.into(),
            cache_age: None,
        }
    }

    pub fn with_page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_cache_age(mut self, cache_age: Option<Duration>) -> Self {
        self.cache_age = cache_age;
        self
    }
}

// == Pagination Result ==
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaginationResult {
    pub text: String,
    /// Page actually rendered, after clamping
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub items_on_page: usize,
    /// Always `estimate_tokens(&text)`
    pub estimated_tokens: usize,
}

// == Paginator ==
/// Turns a dataset and a page request into one rendered page.
///
/// Pure and synchronous: the same inputs always give the same text.
#[derive(Debug, Clone)]
pub struct Paginator {
    max_column_width: usize,
    strategy: SizingStrategy,
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_COLUMN_WIDTH, SizingStrategy::default())
    }
}

impl Paginator {
    /// # Arguments
    /// * `max_column_width` - Cap on table column width, raised to 4 if lower
    /// * `strategy` - How items per page is chosen
    pub fn new(max_column_width: usize, strategy: SizingStrategy) -> Self {
        Self {
            max_column_width: max_column_width.max(MIN_COLUMN_WIDTH),
            strategy,
        }
    }

    pub fn max_column_width(&self) -> usize {
        self.max_column_width
    }

    pub fn strategy(&self) -> SizingStrategy {
        self.strategy
    }

    /// Renders the requested page of `dataset`.
    ///
    /// Fails with [`ToolError::InvalidArgument`] when `max_tokens` is zero.
    pub fn paginate(&self, dataset: &Dataset, request: &PageRequest) -> Result<PaginationResult> {
        if request.max_tokens == 0 {
            return Err(ToolError::InvalidArgument(
                "max_tokens must be positive".to_string(),
            ));
        }

        if dataset.is_empty() {
            return Ok(empty_page(&request.title));
        }

        let source = PageSource::new(dataset, self.max_column_width);
        let measure = EnvelopeMeasure {
            source: &source,
            request,
        };
        let per_page = self.strategy.items_per_page(&measure, request.max_tokens);
        let layout = PageLayout::new(source.len(), per_page, request.page);

        debug!(
            strategy = %self.strategy,
            per_page,
            total_items = layout.total_items,
            page = layout.page,
            "sized page"
        );

        let text = render_page(&source, &layout, request);
        let estimated_tokens = estimate_tokens(&text);

        Ok(PaginationResult {
            text,
            page: layout.page,
            total_pages: layout.total_pages,
            total_items: layout.total_items,
            items_on_page: layout.end - layout.start,
            estimated_tokens,
        })
    }
}

// == Page Source ==
/// A dataset ready to render, with column widths measured once.
enum PageSource<'a> {
    Table { table: &'a Table, widths: Vec<usize> },
    KeyValue(&'a Map<String, Value>),
}

impl<'a> PageSource<'a> {
    fn new(dataset: &'a Dataset, max_column_width: usize) -> Self {
        match dataset {
            Dataset::Table(table) => PageSource::Table {
                table,
                widths: column_widths(table, max_column_width),
            },
            Dataset::KeyValue(map) => PageSource::KeyValue(map),
        }
    }

    fn len(&self) -> usize {
        match self {
            PageSource::Table { table, .. } => table.len(),
            PageSource::KeyValue(map) => map.len(),
        }
    }

    fn render(&self, range: Range<usize>) -> String {
        match self {
            PageSource::Table { table, widths } => format_table(table, range, widths),
            PageSource::KeyValue(map) => {
                format_key_value(map.iter().skip(range.start).take(range.len()))
            }
        }
    }
}

struct EnvelopeMeasure<'a> {
    source: &'a PageSource<'a>,
    request: &'a PageRequest,
}

impl PageMeasure for EnvelopeMeasure<'_> {
    fn total_items(&self) -> usize {
        self.source.len()
    }

    fn content_tokens(&self, items: usize) -> usize {
        estimate_tokens(&self.source.render(0..items.min(self.source.len())))
    }

    fn page_tokens(&self, items: usize, page: usize) -> usize {
        let layout = PageLayout::new(self.source.len(), items, page);
        estimate_tokens(&render_page(self.source, &layout, self.request))
    }
}

// == Page Layout ==
/// Paging arithmetic for one rendered page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PageLayout {
    page: usize,
    total_pages: usize,
    total_items: usize,
    per_page: usize,
    start: usize,
    end: usize,
}

impl PageLayout {
    fn new(total_items: usize, per_page: usize, requested_page: usize) -> Self {
        let per_page = per_page.max(1);
        let total_pages = total_items.div_ceil(per_page).max(1);
        let page = requested_page.clamp(1, total_pages);
        let start = (page - 1) * per_page;
        let end = (start + per_page).min(total_items);

        Self {
            page,
            total_pages,
            total_items,
            per_page,
            start,
            end,
        }
    }
}

// == Rendering ==
/// Renders the page, re-rendering until the reported token count matches
/// the text it appears in.
fn render_page(source: &PageSource<'_>, layout: &PageLayout, request: &PageRequest) -> String {
    let content = source.render(layout.start..layout.end);

    let mut reported = 0;
    let mut text = compose(&content, layout, request, reported);
    for _ in 0..MAX_TOKEN_PASSES {
        let measured = estimate_tokens(&text);
        if measured == reported {
            break;
        }
        reported = measured;
        text = compose(&content, layout, request, reported);
    }
    text
}

fn compose(content: &str, layout: &PageLayout, request: &PageRequest, tokens: usize) -> String {
    let heavy = heavy_rule();
    let light = light_rule();

    let mut lines = vec![
        heavy.clone(),
        format!("📊 {}", request.title),
        heavy.clone(),
        String::new(),
        content.to_string(),
        String::new(),
        light.clone(),
        format!(
            "📄 PAGE {} of {} | Showing items {}-{} of {} total",
            layout.page,
            layout.total_pages,
            layout.start + 1,
            layout.end,
            layout.total_items
        ),
        format!(
            "📊 Estimated tokens: {} / {} max",
            group_digits(tokens),
            group_digits(request.max_tokens)
        ),
        light,
        String::new(),
        "🔍 NAVIGATION:".to_string(),
    ];

    if layout.page < layout.total_pages {
        let next_end = (layout.end + layout.per_page).min(layout.total_items);
        lines.push(format!(
            "  • Next page: Use page={} to see items {}-{}",
            layout.page + 1,
            layout.end + 1,
            next_end
        ));
    }
    if layout.page > 1 {
        lines.push(format!(
            "  • Previous page: Use page={} to see items {}-{}",
            layout.page - 1,
            layout.start - layout.per_page + 1,
            layout.start
        ));
    }
    lines.push("  • Export all data: Add export_path=\"./data.json\"".to_string());
    lines.push(String::new());
    lines.push(cache_line(request.cache_age));
    lines.push(heavy);

    lines.join("\n")
}

fn cache_line(cache_age: Option<Duration>) -> String {
    match cache_age {
        Some(age) => format!(
            "💾 CACHE: Data cached (age: {:.1} seconds)",
            age.as_secs_f64()
        ),
        None => "💾 CACHE: Fresh data (not cached)".to_string(),
    }
}

fn empty_page(title: &str) -> PaginationResult {
    let heavy = heavy_rule();
    let text = [
        heavy.clone(),
        format!("📊 {}", title),
        heavy.clone(),
        String::new(),
        NO_DATA.to_string(),
        String::new(),
        heavy,
    ]
    .join("\n");
    let estimated_tokens = estimate_tokens(&text);

    PaginationResult {
        text,
        page: 1,
        total_pages: 1,
        total_items: 0,
        items_on_page: 0,
        estimated_tokens,
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::DataKind;
    use serde_json::json;

    /// `rows` rows of `columns` cells, every cell exactly 15 characters.
    fn wide_table(rows: usize, columns: usize) -> Dataset {
        let names = (0..columns).map(|c| format!("column_{:08}", c)).collect();
        let data = (0..rows)
            .map(|r| {
                (0..columns)
                    .map(|c| json!(format!("r{:06}c{:07}", r, c)))
                    .collect()
            })
            .collect();
        Dataset::Table(Table::new(names, data).unwrap())
    }

    fn prices(rows: usize) -> Dataset {
        let records: Vec<Value> = (0..rows)
            .map(|i| json!({"Date": format!("2024-01-{:02}", i % 28 + 1), "Close": 100.0 + i as f64}))
            .collect();
        Dataset::from_json(Value::Array(records), DataKind::Table).unwrap()
    }

    #[test]
    fn test_small_table_fits_one_page() {
        let result = Paginator::default()
            .paginate(&prices(5), &PageRequest::new("PRICES - AAPL"))
            .unwrap();

        assert_eq!(result.page, 1);
        assert_eq!(result.total_pages, 1);
        assert_eq!(result.total_items, 5);
        assert_eq!(result.items_on_page, 5);
        assert!(result.text.contains("📊 PRICES - AAPL"));
        assert!(result.text.contains("📄 PAGE 1 of 1 | Showing items 1-5 of 5 total"));
        assert!(!result.text.contains("Next page"));
        assert!(!result.text.contains("Previous page"));
        assert!(result.text.contains("Export all data"));
        assert!(result.text.contains("💾 CACHE: Fresh data (not cached)"));
    }

    #[test]
    fn test_250_rows_page_two() {
        let dataset = wide_table(250, 10);
        let request = PageRequest::new("WIDE").with_page(2);

        let result = Paginator::default().paginate(&dataset, &request).unwrap();

        assert_eq!(result.items_on_page, 62);
        assert_eq!(result.total_pages, 5);
        assert!(result.text.contains("Showing items 63-124 of 250 total"));
        assert!(result.text.contains("Next page: Use page=3 to see items 125-186"));
        assert!(result.text.contains("Previous page: Use page=1 to see items 1-62"));
        assert!(result.estimated_tokens <= 6000);
    }

    #[test]
    fn test_last_page_is_partial() {
        let dataset = wide_table(250, 10);
        let result = Paginator::default()
            .paginate(&dataset, &PageRequest::new("WIDE").with_page(5))
            .unwrap();

        assert_eq!(result.items_on_page, 2);
        assert!(result.text.contains("Showing items 249-250 of 250 total"));
        assert!(!result.text.contains("Next page"));
    }

    #[test]
    fn test_page_clamping() {
        let dataset = wide_table(250, 10);
        let paginator = Paginator::default();

        let low = paginator.paginate(&dataset, &PageRequest::new("WIDE").with_page(0)).unwrap();
        assert_eq!(low.page, 1);

        let high = paginator
            .paginate(&dataset, &PageRequest::new("WIDE").with_page(1_000_000))
            .unwrap();
        assert_eq!(high.page, high.total_pages);
        assert_eq!(
            high,
            paginator.paginate(&dataset, &PageRequest::new("WIDE").with_page(5)).unwrap()
        );
    }

    #[test]
    fn test_empty_dataset() {
        let empty = Dataset::from_json(json!([]), DataKind::Table).unwrap();
        let result = Paginator::default()
            .paginate(&empty, &PageRequest::new("NEWS - AAPL").with_page(3))
            .unwrap();

        assert_eq!(result.page, 1);
        assert_eq!(result.total_pages, 1);
        assert_eq!(result.total_items, 0);
        assert_eq!(result.items_on_page, 0);
        assert!(result.text.contains("No data available"));
        assert!(result.text.contains("📊 NEWS - AAPL"));
        assert!(!result.text.contains("NAVIGATION"));
    }

    #[test]
    fn test_zero_budget_rejected() {
        let result = Paginator::default()
            .paginate(&prices(3), &PageRequest::new("X").with_max_tokens(0));
        assert!(matches!(result, Err(ToolError::InvalidArgument(_))));
    }

    #[test]
    fn test_token_line_matches_text() {
        let result = Paginator::default()
            .paginate(&wide_table(40, 6), &PageRequest::new("WIDE"))
            .unwrap();

        assert_eq!(result.estimated_tokens, estimate_tokens(&result.text));
        let expected = format!(
            "📊 Estimated tokens: {} / 6,000 max",
            group_digits(result.estimated_tokens)
        );
        assert!(result.text.contains(&expected), "missing {:?}", expected);
    }

    #[test]
    fn test_cache_age_line() {
        let result = Paginator::default()
            .paginate(
                &prices(2),
                &PageRequest::new("X").with_cache_age(Some(Duration::from_millis(12_340))),
            )
            .unwrap();
        assert!(result.text.contains("💾 CACHE: Data cached (age: 12.3 seconds)"));
    }

    #[test]
    fn test_key_value_pages_top_level_keys() {
        let mut map = Map::new();
        for i in 0..300 {
            map.insert(format!("field_{:03}", i), json!("x".repeat(60)));
        }
        let dataset = Dataset::KeyValue(map);

        let first = Paginator::default()
            .paginate(&dataset, &PageRequest::new("INFO").with_max_tokens(1000))
            .unwrap();

        assert!(first.total_pages > 1);
        assert!(first.estimated_tokens <= 1000);
        assert!(first.text.contains("field_000: "));

        let second = Paginator::default()
            .paginate(&dataset, &PageRequest::new("INFO").with_max_tokens(1000).with_page(2))
            .unwrap();
        assert!(!second.text.contains("field_000: "));
        assert!(second.text.contains(&format!("field_{:03}: ", first.items_on_page)));
    }

    #[test]
    fn test_uneven_key_values_stay_within_budget() {
        let dataset = Dataset::from_json(
            json!({
                "a": "x",
                "b": "y",
                "c": "z".repeat(16_000),
                "d": "w".repeat(16_000)
            }),
            DataKind::KeyValue,
        )
        .unwrap();

        for strategy in [SizingStrategy::AdaptiveHalving, SizingStrategy::fixed()] {
            let paginator = Paginator::new(15, strategy);
            let first = paginator.paginate(&dataset, &PageRequest::new("INFO")).unwrap();
            assert_eq!(first.total_pages, 4, "{}", strategy);

            for page in 1..=first.total_pages {
                let result = paginator
                    .paginate(&dataset, &PageRequest::new("INFO").with_page(page))
                    .unwrap();
                assert!(
                    result.estimated_tokens <= 6000 || result.items_on_page == 1,
                    "{} page {}: {} tokens with {} items",
                    strategy,
                    page,
                    result.estimated_tokens,
                    result.items_on_page
                );
            }
        }
    }

    #[test]
    fn test_fixed_strategy_budget() {
        let paginator = Paginator::new(15, SizingStrategy::fixed());
        let result = paginator
            .paginate(&wide_table(250, 10), &PageRequest::new("WIDE"))
            .unwrap();

        assert!(result.items_on_page >= 1);
        assert!(result.items_on_page < 250);
        assert!(result.estimated_tokens <= 6000);
    }

    #[test]
    fn test_column_width_floor() {
        let paginator = Paginator::new(1, SizingStrategy::default());
        assert_eq!(paginator.max_column_width(), MIN_COLUMN_WIDTH);
    }

    #[test]
    fn test_layout_arithmetic() {
        let layout = PageLayout::new(250, 62, 2);
        assert_eq!(layout.total_pages, 5);
        assert_eq!((layout.start, layout.end), (62, 124));

        let only = PageLayout::new(0, 10, 4);
        assert_eq!((only.page, only.total_pages, only.start, only.end), (1, 1, 0, 0));
    }
}
