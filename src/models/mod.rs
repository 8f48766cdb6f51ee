use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Inclusive date range for data requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn days_count(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// Quarterly fiscal period reported by SimFin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FiscalPeriod {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl FromStr for FiscalPeriod {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Q1" => Ok(FiscalPeriod::Q1),
            "Q2" => Ok(FiscalPeriod::Q2),
            "Q3" => Ok(FiscalPeriod::Q3),
            "Q4" => Ok(FiscalPeriod::Q4),
            _ => Err(()),
        }
    }
}

impl fmt::Display for FiscalPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FiscalPeriod::Q1 => "Q1",
            FiscalPeriod::Q2 => "Q2",
            FiscalPeriod::Q3 => "Q3",
            FiscalPeriod::Q4 => "Q4",
        };
        f.write_str(s)
    }
}

/// Record type that belongs to a fixed tabular schema.
///
/// `COLUMNS` is the kind's column-name schema; it is available even from an
/// empty table so callers can inspect the shape before checking row counts.
pub trait TableRecord {
    const COLUMNS: &'static [&'static str];

    fn date(&self) -> NaiveDate;
}

/// Daily closing price for one ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub date: NaiveDate,
    pub ticker: String,
    pub close: f64,
}

impl TableRecord for PriceRecord {
    const COLUMNS: &'static [&'static str] = &["date", "ticker", "close"];

    fn date(&self) -> NaiveDate {
        self.date
    }
}

/// One quarterly profit-and-loss report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeRecord {
    pub ticker: String,
    pub date: NaiveDate,
    pub fiscal_period: FiscalPeriod,
    pub fiscal_year: i32,
    pub revenue: f64,
    pub net_income: f64,
}

impl TableRecord for IncomeRecord {
    const COLUMNS: &'static [&'static str] = &[
        "ticker",
        "date",
        "fiscal_period",
        "fiscal_year",
        "revenue",
        "net_income",
    ];

    fn date(&self) -> NaiveDate {
        self.date
    }
}

/// One balance-sheet report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSheetRecord {
    pub date: NaiveDate,
    pub ticker: String,
    pub total_liabilities: f64,
    pub total_equity: f64,
    pub share_capital: f64,
}

impl TableRecord for BalanceSheetRecord {
    // Column names kept as the downstream CSV join expects them
    const COLUMNS: &'static [&'static str] = &[
        "date",
        "ticker",
        "totalLiabilities",
        "totalEquity",
        "share_capital",
    ];

    fn date(&self) -> NaiveDate {
        self.date
    }
}

/// Ordered result of one fetch operation, ascending by date.
///
/// A failed or empty fetch still yields a table whose `columns()` describe
/// the kind's full schema; callers never see a null result or an exception.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable<R: TableRecord> {
    rows: Vec<R>,
}

impl<R: TableRecord> ResultTable<R> {
    /// Empty table that still carries the kind's column schema
    pub fn empty() -> Self {
        Self { rows: Vec::new() }
    }

    /// Build a table from unordered rows, sorting ascending by date.
    /// The sort is stable, so rows sharing a date keep insertion order.
    pub fn from_rows(mut rows: Vec<R>) -> Self {
        rows.sort_by_key(|r| r.date());
        Self { rows }
    }

    pub fn columns(&self) -> &'static [&'static str] {
        R::COLUMNS
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, R> {
        self.rows.iter()
    }

    pub fn into_rows(self) -> Vec<R> {
        self.rows
    }
}

impl<R: TableRecord> Default for ResultTable<R> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<R: TableRecord> IntoIterator for ResultTable<R> {
    type Item = R;
    type IntoIter = std::vec::IntoIter<R>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

/// Configuration for the application
#[derive(Debug, Clone)]
pub struct Config {
    pub simfin_api_key: String,
    pub simfin_base_url: String,
    pub rate_limit_per_second: u32,
}

pub const DEFAULT_BASE_URL: &str = "https://backend.simfin.com/api/v3/";

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        Ok(Config {
            simfin_api_key: std::env::var("SIMFIN_API_KEY")
                .map_err(|_| anyhow::anyhow!("SIMFIN_API_KEY environment variable required"))?,
            simfin_base_url: std::env::var("SIMFIN_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            rate_limit_per_second: std::env::var("SIMFIN_RATE_LIMIT_PER_SECOND")
                .unwrap_or_else(|_| "2".to_string())
                .parse()
                .unwrap_or(2),
        })
    }
}
