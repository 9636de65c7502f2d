//! Text rendering for tables and key-value mappings.

use std::borrow::Cow;
use std::ops::Range;

use serde_json::{Map, Value};

use super::dataset::Table;

/// Marker appended to truncated cells
pub const ELLIPSIS: &str = "...";
/// Text shown for null cells
pub const MISSING_CELL: &str = "N/A";
const COLUMN_SEPARATOR: &str = " | ";
const INDENT: &str = "  ";

// == Cells ==
/// Display text for a single value.
///
/// Strings render verbatim with line breaks flattened, `null` renders as
/// `N/A` and nested values as compact JSON.
pub fn cell_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::Null => Cow::Borrowed(MISSING_CELL),
        Value::String(text) if text.contains(&['\n', '\r'][..]) => {
            Cow::Owned(text.replace(&['\n', '\r'][..], " "))
        }
        Value::String(text) => Cow::Borrowed(text),
        Value::Bool(_) | Value::Number(_) | Value::Array(_) | Value::Object(_) => {
            Cow::Owned(value.to_string())
        }
    }
}

/// Shortens `text` to at most `width` characters, ending in `...` when cut.
pub fn truncate(text: &str, width: usize) -> Cow<'_, str> {
    if text.chars().count() <= width {
        return Cow::Borrowed(text);
    }
    let keep = width.saturating_sub(ELLIPSIS.len());
    let mut shortened: String = text.chars().take(keep).collect();
    shortened.push_str(ELLIPSIS);
    Cow::Owned(shortened)
}

/// Width of each column over the whole table, header included, capped at
/// `max_width`.
///
/// Widths are measured once for the full dataset so every page lines up the
/// same way.
pub fn column_widths(table: &Table, max_width: usize) -> Vec<usize> {
    table
        .columns()
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let widest_cell = table
                .rows()
                .iter()
                .map(|row| cell_text(&row[index]).chars().count())
                .max()
                .unwrap_or(0);
            widest_cell.max(name.chars().count()).min(max_width)
        })
        .collect()
}

// == Tables ==
/// Renders the header, a dashed separator and the rows in `range`.
///
/// Cells are cut to their column width; headers are padded but never cut.
pub fn format_table(table: &Table, range: Range<usize>, widths: &[usize]) -> String {
    let mut lines = Vec::with_capacity(range.len() + 2);

    lines.push(
        table
            .columns()
            .iter()
            .zip(widths)
            .map(|(name, &width)| pad(name, width))
            .collect::<Vec<_>>()
            .join(COLUMN_SEPARATOR),
    );
    lines.push(
        widths
            .iter()
            .map(|&width| "-".repeat(width))
            .collect::<Vec<_>>()
            .join(COLUMN_SEPARATOR),
    );

    for row in &table.rows()[range] {
        lines.push(format_row(row.iter().map(cell_text), widths));
    }

    lines.join("\n")
}

fn format_row<'a>(cells: impl Iterator<Item = Cow<'a, str>>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, &width)| pad(&truncate(&cell, width), width))
        .collect::<Vec<_>>()
        .join(COLUMN_SEPARATOR)
}

fn pad(text: &str, width: usize) -> String {
    format!("{:<width$}", text, width = width)
}

// == Key-Value ==
/// Renders `key: value` lines, recursing into nested objects with two spaces
/// of indentation per level. Arrays are summarized by length.
pub fn format_key_value<'a>(entries: impl IntoIterator<Item = (&'a String, &'a Value)>) -> String {
    let mut lines = Vec::new();
    push_key_value_lines(&mut lines, entries, 0);
    lines.join("\n")
}

fn push_key_value_lines<'a>(
    lines: &mut Vec<String>,
    entries: impl IntoIterator<Item = (&'a String, &'a Value)>,
    depth: usize,
) {
    let prefix = INDENT.repeat(depth);
    for (key, value) in entries {
        match value {
            Value::Object(nested) => {
                lines.push(format!("{}{}:", prefix, key));
                push_nested(lines, nested, depth + 1);
            }
            Value::Array(items) => {
                lines.push(format!("{}{}: [{} items]", prefix, key, items.len()));
            }
            scalar => lines.push(format!("{}{}: {}", prefix, key, cell_text(scalar))),
        }
    }
}

fn push_nested(lines: &mut Vec<String>, nested: &Map<String, Value>, depth: usize) {
    push_key_value_lines(lines, nested.iter(), depth);
}

// == Numbers ==
/// Formats `n` with comma thousands separators.
pub fn group_digits(n: usize) -> String {
    let digits = n.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
