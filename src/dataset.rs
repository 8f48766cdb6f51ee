//! Builds the joined training CSV consumed by the downstream model.
//!
//! One row per ticker per trading day: the close price, a 50-day simple
//! moving average, debt-to-equity from the most recent balance-sheet report
//! on or before that day, and a binary next-day-direction label. Rows
//! missing any of those are dropped, matching the fetch layer's
//! whole-row-or-nothing policy.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use crate::api::FinancialDataProvider;
use crate::models::{BalanceSheetRecord, DateRange, PriceRecord};

const SMA_WINDOW: usize = 50;

/// One labeled row of the training dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetRow {
    pub ticker: String,
    pub date: NaiveDate,
    pub close: f64,
    pub sma_50: f64,
    pub debt_to_equity: f64,
    pub next_day_direction: u8,
}

/// Assembles the per-ticker training dataset through a data provider
pub struct TrainingSetBuilder<'a, P: FinancialDataProvider> {
    provider: &'a P,
}

impl<'a, P: FinancialDataProvider> TrainingSetBuilder<'a, P> {
    pub fn new(provider: &'a P) -> Self {
        Self { provider }
    }

    /// Fetch and join data for every ticker, then write the CSV.
    /// A ticker that comes back empty is logged and skipped; it never
    /// fails the whole run. Returns the number of rows written.
    pub async fn build(
        &self,
        tickers: &[String],
        range: DateRange,
        output: &Path,
    ) -> Result<usize> {
        let mut all_rows = Vec::new();

        for ticker in tickers {
            info!("📊 Collecting {} for {}", ticker, range);

            let prices = self
                .provider
                .fetch_prices(ticker, range.start, range.end)
                .await;
            if prices.is_empty() {
                warn!("No prices for {}, skipping ticker", ticker);
                continue;
            }

            let balance_sheets = self
                .provider
                .fetch_balance_sheet(ticker, range.start, range.end)
                .await;

            let rows = join_ticker_rows(prices.rows(), balance_sheets.rows());
            info!("✅ {}: {} labeled rows", ticker, rows.len());
            all_rows.extend(rows);
        }

        write_csv(&all_rows, output)?;
        info!("💾 Wrote {} rows to {}", all_rows.len(), output.display());
        Ok(all_rows.len())
    }
}

/// Join one ticker's price history with its balance-sheet reports and
/// label each day with the next day's price direction.
///
/// Both inputs are already sorted ascending by date. The last price day
/// has no label and is dropped; days without a full SMA window or without
/// a prior balance-sheet report are dropped too.
pub fn join_ticker_rows(
    prices: &[PriceRecord],
    balance_sheets: &[BalanceSheetRecord],
) -> Vec<DatasetRow> {
    let mut rows = Vec::new();

    for (i, price) in prices.iter().enumerate() {
        let Some(next) = prices.get(i + 1) else {
            break; // no next day to label
        };
        let Some(sma_50) = sma(prices, i) else {
            continue;
        };
        let Some(debt_to_equity) = debt_to_equity_at(balance_sheets, price.date) else {
            continue;
        };

        rows.push(DatasetRow {
            ticker: price.ticker.clone(),
            date: price.date,
            close: price.close,
            sma_50,
            debt_to_equity,
            next_day_direction: u8::from(next.close > price.close),
        });
    }

    rows
}

/// Simple moving average over the `SMA_WINDOW` closes ending at `i`
fn sma(prices: &[PriceRecord], i: usize) -> Option<f64> {
    let start = (i + 1).checked_sub(SMA_WINDOW)?;
    let window = &prices[start..=i];
    Some(window.iter().map(|p| p.close).sum::<f64>() / window.len() as f64)
}

/// Debt-to-equity from the latest report dated on or before `date`
fn debt_to_equity_at(balance_sheets: &[BalanceSheetRecord], date: NaiveDate) -> Option<f64> {
    let report = balance_sheets.iter().rev().find(|b| b.date <= date)?;
    if report.total_equity == 0.0 {
        return None;
    }
    Some(report.total_liabilities / report.total_equity)
}

fn write_csv(rows: &[DatasetRow], output: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(output)
        .with_context(|| format!("failed to create {}", output.display()))?;

    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
