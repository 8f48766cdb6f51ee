//! Row normalization for SimFin's positional row-arrays.
//!
//! Rows arrive as JSON arrays aligned to a response-specific column header.
//! Coercion is best effort and per field; a record is atomic across its
//! fields, so a row with any failed coercion is dropped rather than emitted
//! partially populated. Truncated rows are skipped without affecting their
//! neighbors.

use chrono::NaiveDate;
use serde_json::Value;
use tracing::trace;

use crate::models::{BalanceSheetRecord, FiscalPeriod, IncomeRecord, PriceRecord};

/// Best-effort date coercion; `None` on any failure, never an error
pub(crate) fn coerce_date(value: &Value) -> Option<NaiveDate> {
    let s = value.as_str()?;
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Best-effort numeric coercion, accepting JSON numbers or numeric strings
pub(crate) fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Fiscal years arrive as integers or strings depending on provider version
pub(crate) fn coerce_year(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
        Value::String(s) => s.trim().parse::<i32>().ok(),
        _ => None,
    }
}

pub(crate) fn coerce_fiscal_period(value: &Value) -> Option<FiscalPeriod> {
    value.as_str()?.parse().ok()
}

/// Row long enough to cover every resolved index?
fn covers(row: &[Value], indices: &[usize]) -> bool {
    let max_idx = indices.iter().copied().max().unwrap_or(0);
    row.len() > max_idx
}

fn row_arrays(rows: &[Value]) -> impl Iterator<Item = &Vec<Value>> {
    rows.iter().filter_map(|row| row.as_array())
}

/// Normalize raw price rows. `indices` are `[Date, Last Closing Price]`.
pub fn normalize_prices(rows: &[Value], indices: &[usize], ticker: &str) -> Vec<PriceRecord> {
    let &[date_idx, close_idx] = indices else {
        return Vec::new();
    };
    row_arrays(rows)
        .filter_map(|row| {
            if !covers(row, indices) {
                trace!("skipping truncated price row ({} fields)", row.len());
                return None;
            }
            Some(PriceRecord {
                date: coerce_date(&row[date_idx])?,
                ticker: ticker.to_string(),
                close: coerce_number(&row[close_idx])?,
            })
        })
        .collect()
}

/// Normalize raw profit-and-loss rows. `indices` are
/// `[Fiscal Period, Fiscal Year, Report Date, Revenue, Net Income]`.
pub fn normalize_income(rows: &[Value], indices: &[usize], ticker: &str) -> Vec<IncomeRecord> {
    let &[period_idx, year_idx, date_idx, revenue_idx, net_income_idx] = indices else {
        return Vec::new();
    };
    row_arrays(rows)
        .filter_map(|row| {
            if !covers(row, indices) {
                trace!("skipping truncated income row ({} fields)", row.len());
                return None;
            }
            Some(IncomeRecord {
                ticker: ticker.to_string(),
                date: coerce_date(&row[date_idx])?,
                fiscal_period: coerce_fiscal_period(&row[period_idx])?,
                fiscal_year: coerce_year(&row[year_idx])?,
                revenue: coerce_number(&row[revenue_idx])?,
                net_income: coerce_number(&row[net_income_idx])?,
            })
        })
        .collect()
}

/// Normalize raw balance-sheet rows. `indices` are
/// `[Report Date, Total Liabilities, Total Equity, Share Capital]`.
pub fn normalize_balance_sheet(
    rows: &[Value],
    indices: &[usize],
    ticker: &str,
) -> Vec<BalanceSheetRecord> {
    let &[date_idx, liabilities_idx, equity_idx, share_capital_idx] = indices else {
        return Vec::new();
    };
    row_arrays(rows)
        .filter_map(|row| {
            if !covers(row, indices) {
                trace!("skipping truncated balance-sheet row ({} fields)", row.len());
                return None;
            }
            Some(BalanceSheetRecord {
                date: coerce_date(&row[date_idx])?,
                ticker: ticker.to_string(),
                total_liabilities: coerce_number(&row[liabilities_idx])?,
                total_equity: coerce_number(&row[equity_idx])?,
                share_capital: coerce_number(&row[share_capital_idx])?,
            })
        })
        .collect()
}
