//! Cache Key Module
//!
//! Deterministic cache keys built from an operation name and its arguments.
//!
//! Keys have the shape `operation:name=value|name=value`, with arguments
//! sorted by name. Two argument sets that differ only in insertion order map
//! to the same key. Values are compared through their `Display` text, so two
//! distinct values with the same text (or text containing `|` or `=`)
//! produce the same key.

use std::collections::BTreeMap;
use std::fmt::Display;

/// Separates the operation name from the argument list.
pub const OPERATION_SEPARATOR: char = ':';

/// Separates `name=value` pairs.
pub const PAIR_SEPARATOR: char = '|';

// == Key Builder ==
/// Accumulates named arguments for one operation.
#[derive(Debug, Clone, Default)]
pub struct KeyBuilder {
    operation: String,
    args: BTreeMap<String, String>,
}

impl KeyBuilder {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            args: BTreeMap::new(),
        }
    }

    /// Adds an argument. A repeated name replaces the earlier value.
    pub fn arg(mut self, name: impl Into<String>, value: impl Display) -> Self {
        self.args.insert(name.into(), value.to_string());
        self
    }

    /// Adds an argument only when it is present.
    pub fn opt_arg(self, name: impl Into<String>, value: Option<impl Display>) -> Self {
        match value {
            Some(value) => self.arg(name, value),
            None => self,
        }
    }

    pub fn build(&self) -> String {
        let mut key = String::with_capacity(self.operation.len() + 1 + self.args.len() * 16);
        key.push_str(&self.operation);
        key.push(OPERATION_SEPARATOR);

        for (index, (name, value)) in self.args.iter().enumerate() {
            if index > 0 {
                key.push(PAIR_SEPARATOR);
            }
            key.push_str(name);
            key.push('=');
            key.push_str(value);
        }
        key
    }
}

/// Builds a key from any collection of `(name, value)` pairs.
pub fn build_key<I, K, V>(operation: &str, args: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Display,
{
    args.into_iter()
        .fold(KeyBuilder::new(operation), |builder, (name, value)| {
            builder.arg(name, value)
        })
        .build()
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_key_shape() {
        let key = KeyBuilder::new("historical_prices")
            .arg("ticker", "AAPL")
            .arg("period", "1mo")
            .arg("interval", "1d")
            .build();

        assert_eq!(key, "historical_prices:interval=1d|period=1mo|ticker=AAPL");
    }

    #[test]
    fn test_key_without_arguments() {
        assert_eq!(KeyBuilder::new("ping").build(), "ping:");
    }

    #[test]
    fn test_insertion_order_does_not_matter() {
        let first = build_key("op", [("b", 2), ("a", 1), ("c", 3)]);
        let second = build_key("op", [("c", 3), ("a", 1), ("b", 2)]);

        assert_eq!(first, second);
    }

    #[test]
    fn test_hash_map_arguments() {
        let mut args = HashMap::new();
        args.insert("ticker".to_string(), "MSFT");
        args.insert("kind".to_string(), "calls");

        assert_eq!(build_key("option_chain", args), "option_chain:kind=calls|ticker=MSFT");
    }

    #[test]
    fn test_different_values_give_different_keys() {
        let aapl = build_key("stock_info", [("ticker", "AAPL")]);
        let msft = build_key("stock_info", [("ticker", "MSFT")]);
        let other_op = build_key("news", [("ticker", "AAPL")]);

        assert_ne!(aapl, msft);
        assert_ne!(aapl, other_op);
    }

    #[test]
    fn test_repeated_name_keeps_last_value() {
        let key = KeyBuilder::new("op").arg("a", 1).arg("a", 2).build();
        assert_eq!(key, "op:a=2");
    }

    #[test]
    fn test_optional_arguments() {
        let with = KeyBuilder::new("op").opt_arg("limit", Some(5)).build();
        let without = KeyBuilder::new("op").opt_arg("limit", None::<u32>).build();

        assert_eq!(with, "op:limit=5");
        assert_eq!(without, "op:");
    }

    #[test]
    fn test_same_text_values_collide() {
        // Documented limitation: keys compare the displayed text only
        let number = build_key("op", [("n", 1)]);
        let text = build_key("op", [("n", "1")]);
        assert_eq!(number, text);
    }
}
