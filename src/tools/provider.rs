//! Data Provider Module
//!
//! The seam between tool calls and wherever market data comes from.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Months, NaiveDate, Utc};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use super::call::{RecommendationType, ToolCall};

// == Fetch Error ==
/// Why a provider could not produce a payload. Never cached.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("No data found for ticker {0}")]
    NotFound(String),

    #[error("Provider {provider} failed: {message}")]
    Upstream { provider: String, message: String },

    #[error("Provider {provider} timed out")]
    Timeout { provider: String },

    #[error("Malformed provider payload: {0}")]
    Malformed(String),
}

// == Data Provider Trait ==
/// Source of raw JSON payloads for tool calls.
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Short identifier used in logs and errors
    fn name(&self) -> &'static str;

    /// Fetches the full, unpaginated payload for `call`.
    async fn fetch(&self, call: &ToolCall) -> Result<Value, FetchError>;
}

// == Static Provider ==
/// In-memory provider keyed by operation and ticker. Used by tests and demos.
#[derive(Debug, Default)]
pub struct StaticProvider {
    responses: HashMap<(String, String), Result<Value, FetchError>>,
    latency: Option<Duration>,
    fetches: AtomicUsize,
}

impl StaticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `payload` for `operation` on `ticker`.
    pub fn with_response(mut self, operation: &str, ticker: &str, payload: Value) -> Self {
        self.responses
            .insert(Self::slot(operation, ticker), Ok(payload));
        self
    }

    /// Fails every `operation` call on `ticker` with `error`.
    pub fn with_error(mut self, operation: &str, ticker: &str, error: FetchError) -> Self {
        self.responses
            .insert(Self::slot(operation, ticker), Err(error));
        self
    }

    /// Delays every fetch by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of fetches served so far, failures included.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn slot(operation: &str, ticker: &str) -> (String, String) {
        (operation.to_string(), ticker.trim().to_uppercase())
    }
}

#[async_trait]
impl DataProvider for StaticProvider {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn fetch(&self, call: &ToolCall) -> Result<Value, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let ticker = call.ticker();
        self.responses
            .get(&(call.operation().to_string(), ticker.clone()))
            .cloned()
            .unwrap_or_else(|| Err(FetchError::NotFound(ticker)))
    }
}

// == Fixture Provider ==
/// Serves JSON files from a directory tree.
///
/// Layout: `<root>/<operation>/<TICKER>.json`, or
/// `<root>/<operation>/<TICKER>/<variant>.json` for operations with
/// sub-datasets (statement, holder type, recommendation kind, and
/// `<expiration>_<calls|puts>` for option chains).
#[derive(Debug, Clone)]
pub struct FixtureProvider {
    root: PathBuf,
    timeout: Option<Duration>,
}

impl FixtureProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            timeout: None,
        }
    }

    /// Fails reads that take longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File serving `call`.
    pub fn fixture_path(&self, call: &ToolCall) -> PathBuf {
        let dir = self.root.join(call.operation());
        match call.variant() {
            Some(variant) => dir.join(call.ticker()).join(format!("{}.json", variant)),
            None => dir.join(format!("{}.json", call.ticker())),
        }
    }

    async fn read(&self, path: &Path, ticker: String) -> Result<String, FetchError> {
        let read = tokio::fs::read_to_string(path);
        let outcome = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, read)
                .await
                .map_err(|_| FetchError::Timeout {
                    provider: self.name().to_string(),
                })?,
            None => read.await,
        };

        outcome.map_err(|err| match err.kind() {
            ErrorKind::NotFound => FetchError::NotFound(ticker),
            _ => FetchError::Upstream {
                provider: self.name().to_string(),
                message: format!("{}: {}", path.display(), err),
            },
        })
    }
}

#[async_trait]
impl DataProvider for FixtureProvider {
    fn name(&self) -> &'static str {
        "fixtures"
    }

    async fn fetch(&self, call: &ToolCall) -> Result<Value, FetchError> {
        // Only validated calls are turned into paths
        if call.validate().is_err() {
            return Err(FetchError::NotFound(call.ticker()));
        }
        let path = self.fixture_path(call);
        debug!(path = %path.display(), "reading fixture");

        let raw = self.read(&path, call.ticker()).await?;
        let payload: Value = serde_json::from_str(&raw)
            .map_err(|err| FetchError::Malformed(format!("{}: {}", path.display(), err)))?;

        match call {
            ToolCall::Recommendations {
                kind: RecommendationType::UpgradesDowngrades,
                months_back,
                ..
            } => Ok(within_months(payload, *months_back)),
            _ => Ok(payload),
        }
    }
}

/// Field holding the rating change date in upgrade/downgrade records
const GRADE_DATE_FIELD: &str = "GradeDate";

/// Drops upgrade/downgrade records older than `months` months. Records
/// without a readable date are kept.
fn within_months(payload: Value, months: u32) -> Value {
    let Some(cutoff) = Utc::now().date_naive().checked_sub_months(Months::new(months)) else {
        return payload;
    };

    match payload {
        Value::Array(records) => Value::Array(
            records
                .into_iter()
                .filter(|record| record_date(record).map_or(true, |date| date >= cutoff))
                .collect(),
        ),
        other => other,
    }
}

fn record_date(record: &Value) -> Option<NaiveDate> {
    let text = record.get(GRADE_DATE_FIELD)?.as_str()?;
    let day = text.get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::call::FinancialType;
    use serde_json::json;
    use tempfile::tempdir;

    fn news(ticker: &str) -> ToolCall {
        ToolCall::News {
            ticker: ticker.to_string(),
        }
    }

    #[tokio::test]
    async fn test_static_provider_serves_and_counts() {
        let provider = StaticProvider::new().with_response("news", "AAPL", json!([{"title": "t"}]));

        assert_eq!(provider.fetch(&news("aapl")).await.unwrap(), json!([{"title": "t"}]));
        assert_eq!(
            provider.fetch(&news("MSFT")).await,
            Err(FetchError::NotFound("MSFT".into()))
        );
        assert_eq!(provider.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_static_provider_errors() {
        let provider = StaticProvider::new().with_error(
            "news",
            "AAPL",
            FetchError::Timeout {
                provider: "static".into(),
            },
        );
        assert!(matches!(
            provider.fetch(&news("AAPL")).await,
            Err(FetchError::Timeout { .. })
        ));
    }

    #[tokio::test]
    async fn test_fixture_provider_reads_files() {
        let root = tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("news")).unwrap();
        std::fs::write(root.path().join("news/AAPL.json"), r#"[{"title": "Apple"}]"#).unwrap();

        let provider = FixtureProvider::new(root.path()).with_timeout(Duration::from_secs(5));
        assert_eq!(provider.fetch(&news(" aapl")).await.unwrap(), json!([{"title": "Apple"}]));
        assert_eq!(
            provider.fetch(&news("MSFT")).await,
            Err(FetchError::NotFound("MSFT".into()))
        );
    }

    #[tokio::test]
    async fn test_fixture_provider_stays_inside_root() {
        let workspace = tempdir().unwrap();
        let root = workspace.path().join("root");
        std::fs::create_dir_all(root.join("news")).unwrap();
        std::fs::create_dir_all(workspace.path().join("OUTSIDE")).unwrap();
        std::fs::write(workspace.path().join("OUTSIDE/SECRET.json"), r#"{"leak": true}"#).unwrap();

        let result = FixtureProvider::new(&root)
            .fetch(&news("../../outside/secret"))
            .await;
        assert!(matches!(result, Err(FetchError::NotFound(_))));
    }

    #[test]
    fn test_fixture_provider_variant_path() {
        let provider = FixtureProvider::new("/data");
        let call = ToolCall::FinancialStatement {
            ticker: "aapl".into(),
            statement: FinancialType::Cashflow,
        };
        assert_eq!(
            provider.fixture_path(&call),
            PathBuf::from("/data/financial_statement/AAPL/cashflow.json")
        );
    }

    #[tokio::test]
    async fn test_fixture_provider_malformed() {
        let root = tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("news")).unwrap();
        std::fs::write(root.path().join("news/AAPL.json"), "{not json").unwrap();

        let result = FixtureProvider::new(root.path()).fetch(&news("AAPL")).await;
        assert!(matches!(result, Err(FetchError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_upgrades_filtered_by_window() {
        let root = tempdir().unwrap();
        let dir = root.path().join("recommendations/AAPL");
        std::fs::create_dir_all(&dir).unwrap();

        let recent = Utc::now().date_naive().format("%Y-%m-%d").to_string();
        let payload = json!([
            {"GradeDate": recent, "Firm": "Recent"},
            {"GradeDate": "2001-01-01T00:00:00", "Firm": "Ancient"},
            {"Firm": "Undated"}
        ]);
        std::fs::write(dir.join("upgrades_downgrades.json"), payload.to_string()).unwrap();

        let call = ToolCall::Recommendations {
            ticker: "AAPL".into(),
            kind: RecommendationType::UpgradesDowngrades,
            months_back: 12,
        };
        let fetched = FixtureProvider::new(root.path()).fetch(&call).await.unwrap();
        let firms: Vec<&str> = fetched
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|record| record["Firm"].as_str())
            .collect();
        assert_eq!(firms, ["Recent", "Undated"]);
    }
}
