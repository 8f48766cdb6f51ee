use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::models::{BalanceSheetRecord, Config, IncomeRecord, PriceRecord, ResultTable, TableRecord};
use super::normalize::{normalize_balance_sheet, normalize_income, normalize_prices};
use super::schema::resolve_columns;
use super::{ApiRateLimiter, FinancialDataProvider};

const PRICES_ENDPOINT: &str = "companies/prices/compact";
const STATEMENTS_ENDPOINT: &str = "companies/statements/compact";

const PRICE_COLUMNS: [&str; 2] = ["Date", "Last Closing Price"];
const INCOME_COLUMNS: [&str; 5] = [
    "Fiscal Period",
    "Fiscal Year",
    "Report Date",
    "Revenue",
    "Net Income",
];
const BALANCE_SHEET_COLUMNS: [&str; 4] = [
    "Report Date",
    "Total Liabilities",
    "Total Equity",
    "Share Capital & Additional Paid-In Capital",
];

/// SimFin v3 API client
pub struct SimFinClient {
    client: Client,
    api_key: String,
    base_url: String,
    rate_limiter: ApiRateLimiter,
}

impl SimFinClient {
    /// Create a new SimFin client. The API key always comes from
    /// configuration; there is no built-in default.
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("simfin-stocks/0.1")
            .build()?;

        Ok(Self {
            client,
            api_key: config.simfin_api_key.clone(),
            base_url: config.simfin_base_url.trim_end_matches('/').to_string(),
            rate_limiter: ApiRateLimiter::new(config.rate_limit_per_second),
        })
    }

    /// Make a rate-limited, authenticated GET request.
    ///
    /// This is the only failure boundary: non-2xx statuses, transport
    /// faults and undecodable bodies are all logged and collapsed into
    /// `None` so callers have a single failure path. Never retries.
    async fn request(&self, path: &str, params: &[(&str, &str)]) -> Option<Value> {
        self.rate_limiter.wait().await;

        let url = format!("{}/{}", self.base_url, path);
        debug!("Making request to: {}", url);

        let response = match self
            .client
            .get(&url)
            .header("Authorization", &self.api_key)
            .header("accept", "application/json")
            .query(params)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!("Request error for {}: {}", url, e);
                return None;
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("HTTP Error {} from {}: {}", status, url, body);
            return None;
        }

        match response.json::<Value>().await {
            Ok(json) => Some(json),
            Err(e) => {
                warn!("Failed to decode response from {}: {}", url, e);
                None
            }
        }
    }

    /// Fetch one statement kind and unwrap its first statement block.
    /// A missing or empty `statements` list is an empty result, not a fault.
    async fn fetch_statement_block(
        &self,
        ticker: &str,
        statement_kind: &str,
        period: Option<&str>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Option<Value> {
        let start = start_date.to_string();
        let end = end_date.to_string();
        let mut params = vec![
            ("ticker", ticker),
            ("statements", statement_kind),
            ("start", start.as_str()),
            ("end", end.as_str()),
        ];
        if let Some(period) = period {
            params.push(("period", period));
        }

        let data = self.request(STATEMENTS_ENDPOINT, &params).await?;
        let company = data.as_array()?.first()?;

        match company.get("statements").and_then(Value::as_array) {
            Some(statements) if !statements.is_empty() => Some(statements[0].clone()),
            _ => {
                debug!(
                    "No {} statements for {} between {} and {}",
                    statement_kind, ticker, start_date, end_date
                );
                None
            }
        }
    }
}

/// Resolve a block's columns and normalize its rows into a sorted table.
/// Any schema mismatch rejects the whole block and yields an empty table.
fn normalize_block<R, F>(block: &Value, required: &[&str], normalize: F) -> ResultTable<R>
where
    R: TableRecord,
    F: FnOnce(&[Value], &[usize]) -> Vec<R>,
{
    let empty = Vec::new();
    let headers = block
        .get("columns")
        .and_then(Value::as_array)
        .unwrap_or(&empty);

    let indices = match resolve_columns(headers, required) {
        Ok(indices) => indices,
        Err(e) => {
            warn!("{}", e);
            return ResultTable::empty();
        }
    };

    let rows = block
        .get("data")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    ResultTable::from_rows(normalize(rows, &indices))
}

#[async_trait]
impl FinancialDataProvider for SimFinClient {
    /// Fetch daily share prices for a ticker
    async fn fetch_prices(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> ResultTable<PriceRecord> {
        let ticker = ticker.to_ascii_uppercase();
        let start = start_date.to_string();
        let end = end_date.to_string();
        let params = [
            ("ticker", ticker.as_str()),
            ("start", start.as_str()),
            ("end", end.as_str()),
        ];

        let Some(data) = self.request(PRICES_ENDPOINT, &params).await else {
            return ResultTable::empty();
        };
        let Some(block) = data.as_array().and_then(|companies| companies.first()) else {
            info!("No price data for {} between {} and {}", ticker, start_date, end_date);
            return ResultTable::empty();
        };

        let table = normalize_block(block, &PRICE_COLUMNS, |rows, indices| {
            normalize_prices(rows, indices, &ticker)
        });
        debug!("Retrieved {} price rows for {}", table.len(), ticker);
        table
    }

    /// Fetch quarterly profit-and-loss statements for a ticker
    async fn fetch_income_statement(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> ResultTable<IncomeRecord> {
        let ticker = ticker.to_ascii_uppercase();

        let Some(block) = self
            .fetch_statement_block(&ticker, "PL", Some("Q1,Q2,Q3,Q4"), start_date, end_date)
            .await
        else {
            info!("No income data for {} between {} and {}", ticker, start_date, end_date);
            return ResultTable::empty();
        };

        let table = normalize_block(&block, &INCOME_COLUMNS, |rows, indices| {
            normalize_income(rows, indices, &ticker)
        });
        debug!("Retrieved {} income rows for {}", table.len(), ticker);
        table
    }

    /// Fetch balance-sheet statements for a ticker
    async fn fetch_balance_sheet(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> ResultTable<BalanceSheetRecord> {
        let ticker = ticker.to_ascii_uppercase();

        let Some(block) = self
            .fetch_statement_block(&ticker, "BS", None, start_date, end_date)
            .await
        else {
            info!(
                "No balance sheet data for {} between {} and {}",
                ticker, start_date, end_date
            );
            return ResultTable::empty();
        };

        let table = normalize_block(&block, &BALANCE_SHEET_COLUMNS, |rows, indices| {
            normalize_balance_sheet(rows, indices, &ticker)
        });
        debug!("Retrieved {} balance sheet rows for {}", table.len(), ticker);
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_block_rejects_missing_column() {
        let block = json!({
            "columns": ["Date", "Open Price"],
            "data": [["2024-01-02", 150.0]],
        });
        let table = normalize_block(&block, &PRICE_COLUMNS, |rows, indices| {
            normalize_prices(rows, indices, "AAPL")
        });
        assert!(table.is_empty());
        assert_eq!(table.columns(), &["date", "ticker", "close"]);
    }

    #[test]
    fn test_normalize_block_handles_missing_data_list() {
        let block = json!({ "columns": ["Date", "Last Closing Price"] });
        let table = normalize_block(&block, &PRICE_COLUMNS, |rows, indices| {
            normalize_prices(rows, indices, "AAPL")
        });
        assert!(table.is_empty());
    }

    #[test]
    fn test_normalize_block_sorts_rows() {
        let block = json!({
            "columns": ["Date", "Last Closing Price"],
            "data": [["2024-01-05", 153.0], ["2024-01-02", 150.0]],
        });
        let table = normalize_block(&block, &PRICE_COLUMNS, |rows, indices| {
            normalize_prices(rows, indices, "AAPL")
        });
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0].close, 150.0);
        assert_eq!(table.rows()[1].close, 153.0);
    }
}
