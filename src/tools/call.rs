//! Tool Call Module
//!
//! Typed tool operations. Each call knows its cache key, TTL, page title and
//! how its provider payload is rendered.

use std::fmt;
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::cache::KeyBuilder;
use crate::error::{Result, ToolError};
use crate::pagination::DataKind;

/// TTL for quotes, news and option data
pub const SHORT_TTL: Duration = Duration::from_secs(300);
/// TTL for slowly changing data: statements, holders, actions, analyst views
pub const LONG_TTL: Duration = Duration::from_secs(3600);

pub const DEFAULT_PERIOD: &str = "1mo";
pub const DEFAULT_INTERVAL: &str = "1d";
pub const DEFAULT_MONTHS_BACK: u32 = 12;
/// Longest accepted ticker symbol
pub const MAX_TICKER_LEN: usize = 16;

/// Ticker symbols are 1-16 ASCII letters, digits or `.^=-`, as in `BRK.B`,
/// `^GSPC`, `EURUSD=X` or `BTC-USD`.
pub fn is_valid_ticker(ticker: &str) -> bool {
    !ticker.is_empty()
        && ticker.len() <= MAX_TICKER_LEN
        && ticker
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '^' | '=' | '-'))
}

fn default_period() -> String {
    DEFAULT_PERIOD.to_string()
}

fn default_interval() -> String {
    DEFAULT_INTERVAL.to_string()
}

fn default_months_back() -> u32 {
    DEFAULT_MONTHS_BACK
}

// == Argument Enums ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinancialType {
    IncomeStmt,
    QuarterlyIncomeStmt,
    BalanceSheet,
    QuarterlyBalanceSheet,
    Cashflow,
    QuarterlyCashflow,
}

impl FinancialType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FinancialType::IncomeStmt => "income_stmt",
            FinancialType::QuarterlyIncomeStmt => "quarterly_income_stmt",
            FinancialType::BalanceSheet => "balance_sheet",
            FinancialType::QuarterlyBalanceSheet => "quarterly_balance_sheet",
            FinancialType::Cashflow => "cashflow",
            FinancialType::QuarterlyCashflow => "quarterly_cashflow",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HolderType {
    MajorHolders,
    InstitutionalHolders,
    MutualfundHolders,
    InsiderTransactions,
    InsiderPurchases,
    InsiderRosterHolders,
}

impl HolderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            HolderType::MajorHolders => "major_holders",
            HolderType::InstitutionalHolders => "institutional_holders",
            HolderType::MutualfundHolders => "mutualfund_holders",
            HolderType::InsiderTransactions => "insider_transactions",
            HolderType::InsiderPurchases => "insider_purchases",
            HolderType::InsiderRosterHolders => "insider_roster_holders",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionType {
    Calls,
    Puts,
}

impl OptionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptionType::Calls => "calls",
            OptionType::Puts => "puts",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationType {
    Recommendations,
    UpgradesDowngrades,
}

impl RecommendationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationType::Recommendations => "recommendations",
            RecommendationType::UpgradesDowngrades => "upgrades_downgrades",
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),+) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })+
    };
}

display_as_str!(FinancialType, HolderType, OptionType, RecommendationType);

// == Tool Call ==
/// One financial-data operation with its arguments.
///
/// Serialized with a `"tool"` tag, e.g.
/// `{"tool": "historical_prices", "ticker": "AAPL", "period": "1y"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tool", rename_all = "snake_case")]
pub enum ToolCall {
    HistoricalPrices {
        ticker: String,
        #[serde(default = "default_period")]
        period: String,
        #[serde(default = "default_interval")]
        interval: String,
    },
    StockInfo {
        ticker: String,
        /// Keys to keep, in order. Applied after the cache lookup.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fields: Option<Vec<String>>,
    },
    News {
        ticker: String,
    },
    StockActions {
        ticker: String,
    },
    FinancialStatement {
        ticker: String,
        statement: FinancialType,
    },
    HolderInfo {
        ticker: String,
        holder: HolderType,
    },
    OptionExpirationDates {
        ticker: String,
    },
    OptionChain {
        ticker: String,
        expiration_date: String,
        option_type: OptionType,
    },
    Recommendations {
        ticker: String,
        kind: RecommendationType,
        #[serde(default = "default_months_back")]
        months_back: u32,
    },
}

impl ToolCall {
    /// Operation name, also the cache key prefix.
    pub fn operation(&self) -> &'static str {
        match self {
            ToolCall::HistoricalPrices { .. } => "historical_prices",
            ToolCall::StockInfo { .. } => "stock_info",
            ToolCall::News { .. } => "news",
            ToolCall::StockActions { .. } => "stock_actions",
            ToolCall::FinancialStatement { .. } => "financial_statement",
            ToolCall::HolderInfo { .. } => "holder_info",
            ToolCall::OptionExpirationDates { .. } => "option_expiration_dates",
            ToolCall::OptionChain { .. } => "option_chain",
            ToolCall::Recommendations { .. } => "recommendations",
        }
    }

    /// Ticker as given by the caller.
    pub fn raw_ticker(&self) -> &str {
        match self {
            ToolCall::HistoricalPrices { ticker, .. }
            | ToolCall::StockInfo { ticker, .. }
            | ToolCall::News { ticker }
            | ToolCall::StockActions { ticker }
            | ToolCall::FinancialStatement { ticker, .. }
            | ToolCall::HolderInfo { ticker, .. }
            | ToolCall::OptionExpirationDates { ticker }
            | ToolCall::OptionChain { ticker, .. }
            | ToolCall::Recommendations { ticker, .. } => ticker,
        }
    }

    /// Trimmed, upper-cased ticker.
    pub fn ticker(&self) -> String {
        self.raw_ticker().trim().to_uppercase()
    }

    /// Sub-dataset selector for operations that expose several datasets per
    /// ticker.
    pub fn variant(&self) -> Option<String> {
        match self {
            ToolCall::FinancialStatement { statement, .. } => Some(statement.to_string()),
            ToolCall::HolderInfo { holder, .. } => Some(holder.to_string()),
            ToolCall::OptionChain {
                expiration_date,
                option_type,
                ..
            } => Some(format!("{}_{}", expiration_date.trim(), option_type)),
            ToolCall::Recommendations { kind, .. } => Some(kind.to_string()),
            _ => None,
        }
    }

    pub fn ttl(&self) -> Duration {
        match self {
            ToolCall::HistoricalPrices { .. }
            | ToolCall::StockInfo { .. }
            | ToolCall::News { .. }
            | ToolCall::OptionExpirationDates { .. }
            | ToolCall::OptionChain { .. } => SHORT_TTL,
            ToolCall::StockActions { .. }
            | ToolCall::FinancialStatement { .. }
            | ToolCall::HolderInfo { .. }
            | ToolCall::Recommendations { .. } => LONG_TTL,
        }
    }

    pub fn data_kind(&self) -> DataKind {
        match self {
            ToolCall::StockInfo { .. } => DataKind::KeyValue,
            _ => DataKind::Table,
        }
    }

    /// Field selection for stock info calls.
    pub fn fields(&self) -> Option<&[String]> {
        match self {
            ToolCall::StockInfo {
                fields: Some(fields),
                ..
            } => Some(fields),
            _ => None,
        }
    }

    /// Page header.
    pub fn title(&self) -> String {
        let ticker = self.ticker();
        match self {
            ToolCall::HistoricalPrices {
                period, interval, ..
            } => format!("HISTORICAL STOCK PRICES - {} ({}, {})", ticker, period, interval),
            ToolCall::StockInfo { fields, .. } => match fields {
                Some(fields) => format!(
                    "STOCK INFORMATION - {} (Filtered: {} fields)",
                    ticker,
                    fields.len()
                ),
                None => format!("STOCK INFORMATION - {}", ticker),
            },
            ToolCall::News { .. } => format!("NEWS - {}", ticker),
            ToolCall::StockActions { .. } => format!("STOCK ACTIONS - {}", ticker),
            ToolCall::FinancialStatement { statement, .. } => {
                format!("FINANCIAL STATEMENT - {} ({})", ticker, statement)
            }
            ToolCall::HolderInfo { holder, .. } => {
                format!("{} - {}", headline(holder.as_str()), ticker)
            }
            ToolCall::OptionExpirationDates { .. } => {
                format!("OPTION EXPIRATION DATES - {}", ticker)
            }
            ToolCall::OptionChain {
                expiration_date,
                option_type,
                ..
            } => format!(
                "OPTION CHAIN - {} {} (Exp: {})",
                ticker,
                headline(option_type.as_str()),
                expiration_date.trim()
            ),
            ToolCall::Recommendations {
                kind, months_back, ..
            } => match kind {
                RecommendationType::UpgradesDowngrades => format!(
                    "{} - {} (Last {} months)",
                    headline(kind.as_str()),
                    ticker,
                    months_back
                ),
                RecommendationType::Recommendations => {
                    format!("{} - {}", headline(kind.as_str()), ticker)
                }
            },
        }
    }

    /// Cache key over the dataset-defining arguments only. Field selection
    /// and paging never change it.
    pub fn cache_key(&self) -> String {
        let builder = KeyBuilder::new(self.operation()).arg("ticker", self.ticker());
        let builder = match self {
            ToolCall::HistoricalPrices {
                period, interval, ..
            } => builder
                .arg("period", period.trim())
                .arg("interval", interval.trim()),
            ToolCall::FinancialStatement { statement, .. } => builder.arg("statement", statement),
            ToolCall::HolderInfo { holder, .. } => builder.arg("holder", holder),
            ToolCall::OptionChain {
                expiration_date,
                option_type,
                ..
            } => builder
                .arg("expiration_date", expiration_date.trim())
                .arg("option_type", option_type),
            ToolCall::Recommendations {
                kind, months_back, ..
            } => builder.arg("kind", kind).arg("months_back", months_back),
            ToolCall::StockInfo { .. }
            | ToolCall::News { .. }
            | ToolCall::StockActions { .. }
            | ToolCall::OptionExpirationDates { .. } => builder,
        };
        builder.build()
    }

    /// Rejects arguments no provider could answer.
    pub fn validate(&self) -> Result<()> {
        let ticker = self.raw_ticker().trim();
        if ticker.is_empty() {
            return Err(ToolError::InvalidArgument(
                "ticker must not be empty".to_string(),
            ));
        }
        if !is_valid_ticker(ticker) {
            return Err(ToolError::InvalidArgument(format!(
                "ticker '{}' is not a valid symbol",
                ticker
            )));
        }

        match self {
            ToolCall::HistoricalPrices {
                period, interval, ..
            } if period.trim().is_empty() || interval.trim().is_empty() => Err(
                ToolError::InvalidArgument("period and interval must not be empty".to_string()),
            ),
            ToolCall::OptionChain {
                expiration_date, ..
            } => NaiveDate::parse_from_str(expiration_date.trim(), "%Y-%m-%d")
                .map(|_| ())
                .map_err(|_| {
                    ToolError::InvalidArgument(format!(
                        "expiration_date '{}' is not a YYYY-MM-DD date",
                        expiration_date
                    ))
                }),
            ToolCall::Recommendations { months_back: 0, .. } => Err(ToolError::InvalidArgument(
                "months_back must be positive".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

/// `insider_roster_holders` -> `INSIDER ROSTER HOLDERS`
fn headline(name: &str) -> String {
    name.replace('_', " ").to_uppercase()
}
